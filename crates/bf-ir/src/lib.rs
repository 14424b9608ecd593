//! Core IR types for the blockflow renderer.
//!
//! This crate defines the intermediate representation shared by the
//! scheduling engine and the format parsers: timed performance events,
//! the tempo map that converts musical ticks into sample-accurate frame
//! times, timeline containers, and the planar render scratch buffer.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod block;
mod event;
mod tempo;
mod timeline;

pub use block::{BlockBuffer, DEFAULT_BLOCK_SIZE};
pub use event::{ChannelMessage, TimedEvent};
pub use tempo::{TempoChange, TempoMap, DEFAULT_MICROS_PER_QUARTER};
pub use timeline::{Timeline, TimelineFormat};
