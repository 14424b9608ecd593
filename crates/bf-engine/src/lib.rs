//! Block scheduling and mixing engine for the blockflow renderer.
//!
//! Drives an opaque block synthesizer (see [`BlockSynth`]) in two modes:
//! a drift-compensated real-time stream against an independent playback
//! clock, and an offline block-by-block render of a sorted event timeline.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod mixer;
mod offline;
mod pulse;
mod router;
mod stream;
mod synth;

#[cfg(test)]
mod testutil;

pub use mixer::BlockMixer;
pub use offline::{render_events, render_timeline, RenderedTrack};
pub use pulse::{PulseLoader, PulseSynth};
pub use router::{ChannelRack, InstrumentAssignment, SlotState};
pub use stream::{EventFeed, PlaybackSink, StreamConfig, StreamDriver, TickReport};
pub use synth::{BlockSynth, InstrumentLoader};
