//! Timeline containers.

use alloc::vec::Vec;

use crate::event::TimedEvent;
use crate::tempo::TempoMap;

/// How a timeline's tracks relate to each other.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimelineFormat {
    /// One track (SMF format 0)
    Single,
    /// Simultaneous tracks mixed into one performance (SMF format 1)
    Parallel,
    /// Independent tracks rendered separately (SMF format 2)
    Sequential,
}

/// A parsed multi-track performance description.
///
/// Each track is sorted ascending by tick, ties in encounter order.
#[derive(Clone, Debug, PartialEq)]
pub struct Timeline {
    pub format: TimelineFormat,
    pub tracks: Vec<Vec<TimedEvent>>,
    pub tempo: TempoMap,
}

impl Timeline {
    /// Create an empty timeline.
    pub fn new(format: TimelineFormat, tempo: TempoMap) -> Self {
        Self {
            format,
            tracks: Vec::new(),
            tempo,
        }
    }

    /// Total event count across all tracks.
    pub fn event_count(&self) -> usize {
        self.tracks.iter().map(Vec::len).sum()
    }

    /// All tracks merged into one sequence, stably ordered by tick.
    ///
    /// Equal-tick events keep track order first, in-track order second —
    /// the dispatch order for Single/Parallel rendering.
    pub fn merged_events(&self) -> Vec<TimedEvent> {
        let mut merged: Vec<TimedEvent> = Vec::with_capacity(self.event_count());
        for track in &self.tracks {
            merged.extend_from_slice(track);
        }
        merged.sort_by_key(|e| e.tick);
        merged
    }

    /// Duration in microseconds: time of the latest event on any track.
    pub fn duration_micros(&self) -> u64 {
        self.tracks
            .iter()
            .filter_map(|t| t.last())
            .map(|e| self.tempo.micros_at_tick(e.tick))
            .max()
            .unwrap_or(0)
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(TimelineFormat::Single, TempoMap::default())
    }
}
