//! Headless controller for the blockflow renderer.
//!
//! Provides a unified API for loading MIDI files, live playback, and
//! offline rendering that the CLI and embedding code can share.

mod wav;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::warn;

use bf_audio::CpalPlayer;
use bf_engine::{
    render_timeline, ChannelRack, EventFeed, InstrumentAssignment, InstrumentLoader, PlaybackSink,
    RenderedTrack, StreamConfig, StreamDriver,
};
use bf_ir::{Timeline, DEFAULT_BLOCK_SIZE};

// Re-export common types so callers don't need the inner crates directly.
pub use bf_engine::{PulseLoader, PulseSynth};
pub use bf_formats::FormatError;
pub use bf_ir::{TimedEvent, TimelineFormat};

pub use wav::{samples_to_wav, write_wav};

/// Cadence of the streaming tick loop.
const TICK_INTERVAL: Duration = Duration::from_millis(10);

/// How long playback keeps running after the last event, so release
/// tails can ring out.
const RELEASE_TAIL: Duration = Duration::from_secs(1);

/// Headless playback controller — owns a timeline and an instrument
/// assignment, and manages one live playback session at a time.
pub struct Controller<L> {
    loader: L,
    assignment: InstrumentAssignment,
    timeline: Timeline,
    playback: Option<PlaybackHandle>,
}

struct PlaybackHandle {
    stop_signal: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl<L> Controller<L>
where
    L: InstrumentLoader + Clone + Send + 'static,
{
    pub fn new(loader: L, assignment: InstrumentAssignment) -> Self {
        Self {
            loader,
            assignment,
            timeline: Timeline::default(),
            playback: None,
        }
    }

    // --- Timeline management ---

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn load_midi(&mut self, data: &[u8]) -> Result<(), FormatError> {
        self.stop();
        self.timeline = bf_formats::parse_midi(data)?;
        Ok(())
    }

    // --- Real-time playback ---

    pub fn play(&mut self) {
        self.stop();

        let timeline = self.timeline.clone();
        let loader = self.loader.clone();
        let assignment = self.assignment.clone();
        let stop_signal = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));

        let stop = stop_signal.clone();
        let done = finished.clone();

        let thread = std::thread::spawn(move || {
            audio_thread(timeline, loader, assignment, stop, done);
        });

        self.playback = Some(PlaybackHandle {
            stop_signal,
            finished,
            thread: Some(thread),
        });
    }

    pub fn stop(&mut self) {
        if let Some(mut pb) = self.playback.take() {
            pb.stop_signal.store(true, Ordering::Relaxed);
            if let Some(handle) = pb.thread.take() {
                let _ = handle.join();
            }
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| !p.finished.load(Ordering::Relaxed))
    }

    pub fn is_finished(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| p.finished.load(Ordering::Relaxed))
    }

    // --- Offline rendering ---

    /// Render the loaded timeline through a fresh rack, one buffer per
    /// logical track.
    pub fn render(&self, sample_rate: u32) -> Vec<RenderedTrack> {
        let mut rack = ChannelRack::new(
            self.loader.clone(),
            self.assignment.clone(),
            sample_rate,
            DEFAULT_BLOCK_SIZE,
        );
        render_timeline(&mut rack, &self.timeline)
    }

    /// Render and encode the first logical track as a 16-bit WAV.
    pub fn render_to_wav(&self, sample_rate: u32) -> Vec<u8> {
        let tracks = self.render(sample_rate);
        let samples = tracks
            .first()
            .map(|track| track.samples.as_slice())
            .unwrap_or(&[]);
        wav::samples_to_wav(samples, sample_rate)
    }
}

impl Default for Controller<PulseLoader> {
    /// A controller wired to the diagnostic pulse synth on all channels.
    fn default() -> Self {
        Self::new(
            PulseLoader,
            InstrumentAssignment::Single("pulse".to_string()),
        )
    }
}

fn audio_thread<L: InstrumentLoader>(
    timeline: Timeline,
    loader: L,
    assignment: InstrumentAssignment,
    stop_signal: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
) {
    let Ok(mut player) = CpalPlayer::new() else {
        warn!("no audio output available; playback aborted");
        finished.store(true, Ordering::Relaxed);
        return;
    };

    let sample_rate = player.sample_rate();
    let capacity = player.capacity();
    let mut rack = ChannelRack::new(loader, assignment, sample_rate, capacity);
    let mut driver = StreamDriver::new(StreamConfig {
        sample_rate,
        capacity,
        ..StreamConfig::default()
    });

    let merged = timeline.merged_events();
    let mut feed = EventFeed::from_events(&merged, &timeline.tempo, sample_rate);

    if player.start().is_err() {
        finished.store(true, Ordering::Relaxed);
        return;
    }

    let mut tail_deadline: Option<Instant> = None;
    let mut last = Instant::now();

    while !stop_signal.load(Ordering::Relaxed) {
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32();
        last = now;

        driver.tick_with_feed(dt, &mut rack, &mut feed, &mut player);

        if feed.is_finished() {
            let deadline = *tail_deadline.get_or_insert(now + RELEASE_TAIL);
            if now >= deadline {
                break;
            }
        }

        std::thread::sleep(TICK_INTERVAL);
    }

    let _ = player.stop();
    finished.store(true, Ordering::Relaxed);
}
