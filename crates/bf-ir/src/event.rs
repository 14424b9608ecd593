//! Timed performance events.

/// A channel voice message, one variant per injection primitive of the
/// underlying block synthesizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelMessage {
    /// Trigger a note
    NoteOn { key: u8, velocity: u8 },
    /// Release a note
    NoteOff { key: u8, velocity: u8 },
    /// Continuous controller change
    ControlChange { controller: u8, value: u8 },
    /// Program (patch) selection
    ProgramChange { program: u8 },
    /// 14-bit pitch wheel position, 8192 = center
    PitchBend { value: u16 },
    /// Channel-wide pressure
    ChannelAftertouch { pressure: u8 },
    /// Per-key pressure
    PolyAftertouch { key: u8, pressure: u8 },
}

/// A single scheduled performance instruction.
///
/// Events are immutable once produced and are consumed in non-decreasing
/// tick order; events at equal ticks keep their encounter order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimedEvent {
    /// Absolute musical time in timeline ticks
    pub tick: u64,
    /// Channel the event is routed to (0-15 for SMF input)
    pub channel: u8,
    /// What the event does
    pub message: ChannelMessage,
}

impl TimedEvent {
    /// Create a new event.
    pub const fn new(tick: u64, channel: u8, message: ChannelMessage) -> Self {
        Self {
            tick,
            channel,
            message,
        }
    }

    /// Shorthand for a note-on event.
    pub const fn note_on(tick: u64, channel: u8, key: u8, velocity: u8) -> Self {
        Self::new(tick, channel, ChannelMessage::NoteOn { key, velocity })
    }

    /// Shorthand for a note-off event.
    pub const fn note_off(tick: u64, channel: u8, key: u8) -> Self {
        Self::new(
            tick,
            channel,
            ChannelMessage::NoteOff { key, velocity: 64 },
        )
    }
}
