//! Tick-to-time conversion.
//!
//! A `TempoMap` turns absolute timeline ticks into microseconds and
//! sample-accurate frame positions. All arithmetic is integer; frame
//! conversion uses ceiling rounding so a block render never comes up a
//! frame short of an event's true time.

use alloc::vec::Vec;

/// SMF default tempo: 500 000 µs per quarter note (120 BPM).
pub const DEFAULT_MICROS_PER_QUARTER: u32 = 500_000;

/// A tempo change at an absolute tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TempoChange {
    /// Tick the new tempo takes effect
    pub tick: u64,
    /// Microseconds per quarter note from `tick` onwards
    pub micros_per_quarter: u32,
}

/// Piecewise-constant tempo segment with precomputed start time.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Segment {
    tick: u64,
    micros_at: u64,
    micros_per_quarter: u32,
}

/// Maps absolute ticks to microseconds and frames.
#[derive(Clone, Debug, PartialEq)]
pub struct TempoMap {
    ticks_per_quarter: u16,
    /// Non-empty, ascending by tick; segments[0].tick == 0.
    segments: Vec<Segment>,
}

impl TempoMap {
    /// Create a map with the default tempo throughout.
    pub fn new(ticks_per_quarter: u16) -> Self {
        Self::with_changes(ticks_per_quarter, [])
    }

    /// Create a map from a list of tempo changes.
    ///
    /// Changes are sorted by tick (stable); a later change at the same
    /// tick wins. Until the first change the default tempo applies.
    pub fn with_changes(
        ticks_per_quarter: u16,
        changes: impl IntoIterator<Item = TempoChange>,
    ) -> Self {
        debug_assert!(ticks_per_quarter > 0);
        let mut changes: Vec<TempoChange> = changes.into_iter().collect();
        changes.sort_by_key(|c| c.tick);

        let mut segments = Vec::with_capacity(changes.len() + 1);
        segments.push(Segment {
            tick: 0,
            micros_at: 0,
            micros_per_quarter: DEFAULT_MICROS_PER_QUARTER,
        });

        for change in changes {
            let last = *segments.last().expect("segments start non-empty");
            if change.tick == last.tick {
                // Same-tick change replaces the previous one
                let seg = segments.last_mut().expect("segments start non-empty");
                seg.micros_per_quarter = change.micros_per_quarter;
                continue;
            }
            let micros_at = last.micros_at
                + span_micros(change.tick - last.tick, last.micros_per_quarter, ticks_per_quarter);
            segments.push(Segment {
                tick: change.tick,
                micros_at,
                micros_per_quarter: change.micros_per_quarter,
            });
        }

        Self {
            ticks_per_quarter,
            segments,
        }
    }

    /// Timeline resolution in ticks per quarter note.
    pub fn ticks_per_quarter(&self) -> u16 {
        self.ticks_per_quarter
    }

    /// Absolute time of `tick` in microseconds.
    pub fn micros_at_tick(&self, tick: u64) -> u64 {
        let idx = self
            .segments
            .partition_point(|s| s.tick <= tick)
            .saturating_sub(1);
        let seg = self.segments[idx];
        seg.micros_at + span_micros(tick - seg.tick, seg.micros_per_quarter, self.ticks_per_quarter)
    }

    /// Absolute time of `tick` in output frames, ceiling-rounded.
    pub fn frames_at_tick(&self, tick: u64, sample_rate: u32) -> u64 {
        let micros = self.micros_at_tick(tick);
        (micros * sample_rate as u64).div_ceil(1_000_000)
    }
}

impl Default for TempoMap {
    fn default() -> Self {
        Self::new(480)
    }
}

/// Duration of `ticks` ticks at a fixed tempo, in microseconds (truncating).
fn span_micros(ticks: u64, micros_per_quarter: u32, ticks_per_quarter: u16) -> u64 {
    ticks * micros_per_quarter as u64 / ticks_per_quarter as u64
}
