//! Channel-to-instrument routing with lazy, sticky-failure loading.

use alloc::string::String;
use alloc::vec::Vec;
use tracing::warn;

use crate::synth::{BlockSynth, InstrumentLoader};

/// Which instrument source serves which channel.
#[derive(Clone, Debug)]
pub enum InstrumentAssignment {
    /// One instrument serves every channel through a single shared slot.
    Single(String),
    /// One source per channel index; channels beyond the list are unmapped.
    PerChannel(Vec<String>),
}

impl InstrumentAssignment {
    /// Number of rack slots this assignment needs.
    pub fn slot_count(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::PerChannel(sources) => sources.len(),
        }
    }

    /// Slot index serving `channel`, or `None` if unmapped.
    fn slot_for_channel(&self, channel: u8) -> Option<usize> {
        match self {
            Self::Single(_) => Some(0),
            Self::PerChannel(sources) => {
                let idx = channel as usize;
                (idx < sources.len()).then_some(idx)
            }
        }
    }

    /// Instrument source for a slot.
    fn source(&self, slot: usize) -> &str {
        match self {
            Self::Single(source) => source,
            Self::PerChannel(sources) => &sources[slot],
        }
    }
}

/// Lifecycle of one rack slot.
///
/// `Unresolved -> Loaded` and `Unresolved -> Failed` are the only
/// transitions, both terminal for the life of the rack: a failed load is
/// never retried within a session.
#[derive(Debug)]
pub enum SlotState<S> {
    Unresolved,
    Loaded(S),
    Failed,
}

/// Maps channel indices to lazily-loaded synthesizer instances.
///
/// Owned by exactly one session (a streaming player or one offline
/// render); all handles drop with the rack.
pub struct ChannelRack<L: InstrumentLoader> {
    loader: L,
    assignment: InstrumentAssignment,
    slots: Vec<SlotState<L::Synth>>,
    sample_rate: u32,
    max_block: usize,
}

impl<L: InstrumentLoader> ChannelRack<L> {
    /// Create a rack for one session.
    ///
    /// No instrument is loaded here; slots resolve on first use so a
    /// session only pays for the channels it actually plays.
    pub fn new(
        loader: L,
        assignment: InstrumentAssignment,
        sample_rate: u32,
        max_block: usize,
    ) -> Self {
        debug_assert!(sample_rate > 0);
        debug_assert!(max_block > 0);
        let slots = (0..assignment.slot_count())
            .map(|_| SlotState::Unresolved)
            .collect();
        Self {
            loader,
            assignment,
            slots,
            sample_rate,
            max_block,
        }
    }

    /// Session sample rate every loaded instrument is configured with.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Session maximum block size, in frames.
    pub fn max_block(&self) -> usize {
        self.max_block
    }

    /// Number of slots (1 for a `Single` assignment).
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Resolve the instrument serving `channel`, loading it on first use.
    ///
    /// Returns the same handle for every resolve of the same slot. A
    /// channel that is unmapped, or whose load failed earlier, yields
    /// `None` with a diagnostic — the caller is expected to drop the
    /// event it wanted to dispatch.
    pub fn resolve(&mut self, channel: u8) -> Option<&mut L::Synth> {
        let Some(slot) = self.assignment.slot_for_channel(channel) else {
            warn!(channel, "event on unmapped channel; dropping");
            return None;
        };

        if let SlotState::Unresolved = self.slots[slot] {
            let source = self.assignment.source(slot);
            match self.loader.load(source) {
                Some(mut synth) => {
                    synth.set_sample_rate(self.sample_rate);
                    synth.set_samples_per_block(self.max_block);
                    self.slots[slot] = SlotState::Loaded(synth);
                }
                None => {
                    warn!(channel, source, "instrument failed to load; channel stays silent");
                    self.slots[slot] = SlotState::Failed;
                }
            }
        }

        match &mut self.slots[slot] {
            SlotState::Loaded(synth) => Some(synth),
            _ => {
                warn!(channel, "no instrument resolves for channel; event dropped");
                None
            }
        }
    }

    /// Iterate the already-loaded instruments.
    ///
    /// Never triggers a load: block rendering only voices instruments
    /// some event has touched before.
    pub(crate) fn loaded_mut(&mut self) -> impl Iterator<Item = &mut L::Synth> {
        self.slots.iter_mut().filter_map(|slot| match slot {
            SlotState::Loaded(synth) => Some(synth),
            _ => None,
        })
    }

    /// True if any slot holds a loaded instrument.
    pub fn any_loaded(&self) -> bool {
        self.slots
            .iter()
            .any(|slot| matches!(slot, SlotState::Loaded(_)))
    }
}
