//! Real-time streaming driver.
//!
//! Each tick the driver converts elapsed wall-clock time into a frame
//! budget (ceiling-rounded, with a fractional drift accumulator so the
//! rounding bias never compounds), renders that many frames through the
//! mixer, and writes them into a circular playback buffer. The playback
//! clock advances independently; when the measured latency between the
//! write cursor and the playback cursor leaves the configured window the
//! driver forces a hard resync rather than smoothing — tick cadence and
//! render cadence are not phase-aligned, so per-tick smoothing stutters.

use alloc::vec;
use alloc::vec::Vec;
use libm::ceilf;
use tracing::trace;

use bf_ir::{ChannelMessage, TempoMap, TimedEvent};

use crate::mixer::BlockMixer;
use crate::router::ChannelRack;
use crate::synth::{BlockSynth, InstrumentLoader};

/// The playback side of the stream: a fixed-capacity circular buffer
/// played continuously by some device, plus its read cursor.
///
/// This seam decouples the driver from any audio API: the read cursor is
/// a plain value read each tick, and a hard resync is a plain store.
pub trait PlaybackSink {
    /// Ring capacity in frames.
    fn capacity(&self) -> usize;

    /// Current playback read cursor, in frames from the ring start.
    fn playhead(&self) -> usize;

    /// Copy interleaved stereo samples into the ring starting at
    /// `offset` frames, wrapping at capacity.
    fn write_at(&mut self, offset: usize, samples: &[f32]);

    /// Force the playback cursor to `offset` frames (hard resync).
    fn seek(&mut self, offset: usize);
}

/// Streaming session parameters.
#[derive(Clone, Copy, Debug)]
pub struct StreamConfig {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Ring capacity in frames. Must hold at least one maximum tick's
    /// render; should vastly exceed the expected latency so the
    /// wraparound heuristic stays unambiguous.
    pub capacity: usize,
    /// Elapsed time per tick is clamped to this, guarding against
    /// large pauses and scheduler hitches.
    pub max_tick_seconds: f32,
    /// Hard resync once latency exceeds this.
    pub latency_threshold_ms: f32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            capacity: 44100,
            max_tick_seconds: 0.25,
            latency_threshold_ms: 100.0,
        }
    }
}

/// What one tick did.
#[derive(Clone, Copy, Debug)]
pub struct TickReport {
    /// Frames rendered and written this tick.
    pub frames_rendered: usize,
    /// Latency between write cursor and playback cursor, after
    /// wraparound correction, in milliseconds.
    pub latency_ms: f32,
    /// True if the playback cursor was forced to the write cursor.
    pub resynced: bool,
}

/// Per-tick controller for the streaming session.
///
/// Owns the monotonic write cursor and the drift accumulator; the read
/// cursor belongs to the sink and is only ever read or force-set.
pub struct StreamDriver {
    sample_rate: u32,
    capacity: usize,
    max_tick_seconds: f32,
    latency_threshold_ms: f32,
    write_offset: usize,
    drift_error: f32,
    /// Total frames rendered since the session started.
    clock: u64,
    mixer: BlockMixer,
    scratch: Vec<f32>,
}

impl StreamDriver {
    /// Create a driver for one streaming session.
    ///
    /// The rack used with this driver must be configured with a max
    /// block size of at least one maximum tick's render,
    /// `ceil(sample_rate * max_tick_seconds)` frames.
    ///
    /// # Panics
    ///
    /// Panics if the capacity cannot hold one maximum tick's render.
    pub fn new(config: StreamConfig) -> Self {
        assert!(config.sample_rate > 0);
        assert!(config.max_tick_seconds > 0.0);
        let max_frames = ceilf(config.sample_rate as f32 * config.max_tick_seconds) as usize;
        assert!(
            config.capacity >= max_frames,
            "ring capacity {} cannot hold one maximum tick of {} frames",
            config.capacity,
            max_frames
        );
        Self {
            sample_rate: config.sample_rate,
            capacity: config.capacity,
            max_tick_seconds: config.max_tick_seconds,
            latency_threshold_ms: config.latency_threshold_ms,
            write_offset: 0,
            drift_error: 0.0,
            clock: 0,
            mixer: BlockMixer::new(max_frames),
            scratch: vec![0.0; max_frames * 2],
        }
    }

    /// Current write cursor, in frames from the ring start.
    pub fn write_offset(&self) -> usize {
        self.write_offset
    }

    /// Total frames rendered since the session started.
    pub fn frames_rendered(&self) -> u64 {
        self.clock
    }

    /// Advance the stream by `dt` seconds of wall-clock time.
    pub fn tick<L: InstrumentLoader, S: PlaybackSink>(
        &mut self,
        dt: f32,
        rack: &mut ChannelRack<L>,
        sink: &mut S,
    ) -> TickReport {
        self.advance(dt, rack, None, sink)
    }

    /// Advance the stream, dispatching any events from `feed` that fall
    /// due within this tick's render span.
    pub fn tick_with_feed<L: InstrumentLoader, S: PlaybackSink>(
        &mut self,
        dt: f32,
        rack: &mut ChannelRack<L>,
        feed: &mut EventFeed,
        sink: &mut S,
    ) -> TickReport {
        self.advance(dt, rack, Some(feed), sink)
    }

    fn advance<L: InstrumentLoader, S: PlaybackSink>(
        &mut self,
        dt: f32,
        rack: &mut ChannelRack<L>,
        mut feed: Option<&mut EventFeed>,
        sink: &mut S,
    ) -> TickReport {
        debug_assert_eq!(sink.capacity(), self.capacity);

        // Frame budget: enough to cover the elapsed time, minus the
        // fraction of a frame the previous tick over-rendered.
        let target = dt.clamp(0.0, self.max_tick_seconds) - self.drift_error;
        let frames = ceilf(self.sample_rate as f32 * target).max(0.0) as usize;
        self.drift_error = frames as f32 / self.sample_rate as f32 - target;

        if let Some(feed) = feed.as_deref_mut() {
            feed.dispatch_due(rack, self.clock, frames as u64);
        }

        if frames > 0 {
            let out = &mut self.scratch[..frames * 2];
            self.mixer.render_into(rack, out);
            sink.write_at(self.write_offset, out);
        }

        // The playback cursor may be on the other side of the wrap
        // point; the wrapped estimate is the true latency whenever the
        // direct one is a larger backwards jump than the ring allows.
        let playhead = sink.playhead();
        let mut latency = self.write_offset as f32 - playhead as f32;
        if latency < 0.0 {
            let wrapped = (self.capacity - playhead + self.write_offset) as f32;
            if -latency > wrapped {
                latency = wrapped;
            }
        }

        let latency_ms = 1000.0 * latency / self.sample_rate as f32;
        let resynced = latency_ms > self.latency_threshold_ms || latency_ms < 0.0;
        if resynced {
            sink.seek(self.write_offset);
        }

        trace!(
            frames,
            drift = self.drift_error,
            latency_ms,
            resynced,
            "stream tick"
        );

        self.write_offset = (self.write_offset + frames) % self.capacity;
        self.clock += frames as u64;

        TickReport {
            frames_rendered: frames,
            latency_ms,
            resynced,
        }
    }
}

/// A frame-timed event queue for streaming a prepared timeline.
///
/// The driver consumes it through a forward-only cursor, sending each
/// event to its channel's instrument at the right intra-tick delay.
/// Events the clock has already passed (after a clamped hitch) are sent
/// immediately at delay zero.
pub struct EventFeed {
    events: Vec<FrameEvent>,
    next: usize,
}

#[derive(Clone, Copy, Debug)]
struct FrameEvent {
    frame: u64,
    channel: u8,
    message: ChannelMessage,
}

impl EventFeed {
    /// Convert a tick-sorted event sequence into frame times.
    pub fn from_events(events: &[TimedEvent], tempo: &TempoMap, sample_rate: u32) -> Self {
        let events = events
            .iter()
            .map(|e| FrameEvent {
                frame: tempo.frames_at_tick(e.tick, sample_rate),
                channel: e.channel,
                message: e.message,
            })
            .collect();
        Self { events, next: 0 }
    }

    /// An empty feed.
    pub fn empty() -> Self {
        Self {
            events: Vec::new(),
            next: 0,
        }
    }

    /// True once every event has been dispatched.
    pub fn is_finished(&self) -> bool {
        self.next >= self.events.len()
    }

    /// Events not yet dispatched.
    pub fn remaining(&self) -> usize {
        self.events.len() - self.next
    }

    /// Send every event due before `start + frames` to its instrument.
    fn dispatch_due<L: InstrumentLoader>(
        &mut self,
        rack: &mut ChannelRack<L>,
        start: u64,
        frames: u64,
    ) {
        let end = start + frames;
        while let Some(event) = self.events.get(self.next) {
            if event.frame >= end {
                break;
            }
            let delay = event.frame.saturating_sub(start) as usize;
            if let Some(synth) = rack.resolve(event.channel) {
                synth.send(delay, event.message);
            }
            self.next += 1;
        }
    }
}
