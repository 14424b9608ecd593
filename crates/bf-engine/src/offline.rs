//! Offline timeline rendering.
//!
//! Segments a sorted event timeline into fixed-size render blocks,
//! dispatching each event to its channel's instrument at the right
//! intra-block delay and mixing every loaded instrument once per block.
//! A finalized block is never revisited.

use alloc::vec;
use alloc::vec::Vec;
use tracing::debug;

use bf_ir::{TempoMap, Timeline, TimelineFormat, TimedEvent};

use crate::mixer::BlockMixer;
use crate::router::ChannelRack;
use crate::synth::{BlockSynth, InstrumentLoader};

/// One rendered logical track: interleaved stereo samples.
#[derive(Clone, Debug, Default)]
pub struct RenderedTrack {
    pub samples: Vec<f32>,
}

impl RenderedTrack {
    /// Length in frames.
    pub fn frames(&self) -> usize {
        self.samples.len() / 2
    }
}

/// Render one sorted event sequence to completion.
///
/// `events` must be ascending by tick (ties stable). The output length
/// is the ceiling-rounded frame time of the last event; an empty
/// sequence yields an empty buffer. Events on channels that resolve to
/// no instrument are dropped with a diagnostic.
pub fn render_events<L: InstrumentLoader>(
    rack: &mut ChannelRack<L>,
    events: &[TimedEvent],
    tempo: &TempoMap,
) -> Vec<f32> {
    let Some(last) = events.last() else {
        return Vec::new();
    };

    let sample_rate = rack.sample_rate();
    let block = rack.max_block();
    let total = tempo.frames_at_tick(last.tick, sample_rate) as usize;
    let mut out = vec![0.0; total * 2];
    let mut mixer = BlockMixer::new(block);

    // Frames already finalized into `out`.
    let mut offset = 0usize;

    for event in events {
        let time = tempo.frames_at_tick(event.tick, sample_rate) as usize;

        if time < offset {
            // Sorted input should make this impossible; tolerate
            // tempo-mapping rounding anomalies rather than corrupting
            // the finalized prefix.
            debug!(time, offset, "event time before finalized offset; dropping");
            continue;
        }

        // Render the blocks between the cursor and the event. Required
        // even with no event in the span: an already-sounding note must
        // keep producing audio.
        while time > offset + block {
            let end = offset + block;
            mixer.render_into(rack, &mut out[offset * 2..end * 2]);
            offset = end;
        }

        // `time` is now within [offset, offset + block]; the delay may
        // equal the block size, which the synthesizer's inclusive delay
        // domain allows.
        if let Some(synth) = rack.resolve(event.channel) {
            synth.send(time - offset, event.message);
        }
    }

    // Flush the partial tail, skipping a degenerate zero-frame call.
    if total > offset {
        mixer.render_into(rack, &mut out[offset * 2..]);
    }

    out
}

/// Render a full timeline, one output buffer per logical track.
///
/// Single/Parallel timelines merge all tracks into one performance and
/// produce one buffer; Sequential timelines render each track on its
/// own buffer. All tracks share the rack, and with it the loaded
/// instruments and their playing state.
pub fn render_timeline<L: InstrumentLoader>(
    rack: &mut ChannelRack<L>,
    timeline: &Timeline,
) -> Vec<RenderedTrack> {
    match timeline.format {
        TimelineFormat::Single | TimelineFormat::Parallel => {
            let merged = timeline.merged_events();
            vec![RenderedTrack {
                samples: render_events(rack, &merged, &timeline.tempo),
            }]
        }
        TimelineFormat::Sequential => timeline
            .tracks
            .iter()
            .map(|track| RenderedTrack {
                samples: render_events(rack, track, &timeline.tempo),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::InstrumentAssignment;
    use crate::testutil::TestLoader;
    use alloc::string::ToString;
    use bf_ir::ChannelMessage;

    const BLOCK: usize = 1024;

    fn rack(sources: &[&str]) -> ChannelRack<TestLoader> {
        ChannelRack::new(
            TestLoader::default(),
            InstrumentAssignment::PerChannel(sources.iter().map(|s| s.to_string()).collect()),
            44100,
            BLOCK,
        )
    }

    /// 44100 ticks per quarter at the default tempo: one quarter is
    /// 0.5 s, so a tick maps to roughly half a frame at 44.1 kHz.
    fn frame_tempo() -> TempoMap {
        TempoMap::new(44100)
    }

    fn frames_at(tempo: &TempoMap, tick: u64) -> usize {
        tempo.frames_at_tick(tick, 44100) as usize
    }

    #[test]
    fn empty_timeline_renders_empty_buffer() {
        let mut rack = rack(&["a"]);
        let out = render_events(&mut rack, &[], &frame_tempo());
        assert!(out.is_empty());
    }

    #[test]
    fn block_sizes_sum_exactly_to_total_duration() {
        let tempo = frame_tempo();
        let mut rack = rack(&["a"]);
        let events = [
            TimedEvent::note_on(0, 0, 60, 100),
            TimedEvent::note_off(44100, 0, 60),
        ];
        let out = render_events(&mut rack, &events, &tempo);

        let total = frames_at(&tempo, 44100);
        assert_eq!(out.len(), total * 2);

        let synth = rack.resolve(0).unwrap();
        let rendered: usize = synth.render_calls.iter().sum();
        assert_eq!(rendered, total);
        // No render call exceeds the block size, none is empty
        assert!(synth.render_calls.iter().all(|&n| n > 0 && n <= BLOCK));
    }

    #[test]
    fn note_off_scenario_block_arithmetic() {
        // NoteOn at frame 0, NoteOff at frame 22050, block 1024:
        // 21 full blocks cover frames 0..21504, the NoteOff lands at
        // intra-block delay 546, and the tail flushes 546 frames.
        let tempo = frame_tempo();
        let mut rack = rack(&["a"]);
        let events = [
            TimedEvent::note_on(0, 0, 60, 100),
            TimedEvent::note_off(44100, 0, 60),
        ];
        render_events(&mut rack, &events, &tempo);
        assert_eq!(frames_at(&tempo, 44100), 22050);

        let synth = rack.resolve(0).unwrap();
        let full_blocks = synth.render_calls.iter().filter(|&&n| n == BLOCK).count();
        assert_eq!(full_blocks, 21);
        assert_eq!(*synth.render_calls.last().unwrap(), 22050 - 21 * BLOCK);

        assert_eq!(synth.sent.len(), 2);
        assert_eq!(synth.sent[0].0, 0);
        assert_eq!(synth.sent[1].0, 22050 % BLOCK);
    }

    #[test]
    fn event_on_block_boundary_keeps_inclusive_delay() {
        let tempo = frame_tempo();
        let mut rack = rack(&["a"]);
        // Frame 1024 exactly: one block span, delay == block size
        let events = [
            TimedEvent::note_on(0, 0, 60, 100),
            TimedEvent::note_off(2 * 1024, 0, 60),
        ];
        render_events(&mut rack, &events, &tempo);

        let synth = rack.resolve(0).unwrap();
        assert_eq!(synth.sent[1].0, BLOCK);
        // No block was rendered before the boundary event arrived
        assert_eq!(synth.render_calls.len(), 1);
        assert_eq!(synth.render_calls[0], BLOCK);
    }

    #[test]
    fn zero_duration_timeline_dispatches_but_never_renders() {
        let tempo = frame_tempo();
        let mut rack = rack(&["a"]);
        let events = [TimedEvent::note_on(0, 0, 60, 100)];
        let out = render_events(&mut rack, &events, &tempo);
        assert!(out.is_empty());

        // The event was dispatched, but no zero-frame render happened
        let synth = rack.resolve(0).unwrap();
        assert_eq!(synth.sent.len(), 1);
        assert!(synth.render_calls.is_empty());
    }

    #[test]
    fn events_at_equal_time_dispatch_in_input_order() {
        let tempo = frame_tempo();
        let mut rack = rack(&["a"]);
        let events = [
            TimedEvent::new(0, 0, ChannelMessage::ControlChange { controller: 1, value: 10 }),
            TimedEvent::new(0, 0, ChannelMessage::ControlChange { controller: 1, value: 20 }),
            TimedEvent::note_off(200, 0, 60),
        ];
        render_events(&mut rack, &events, &tempo);

        let synth = rack.resolve(0).unwrap();
        assert_eq!(
            synth.sent[0].1,
            ChannelMessage::ControlChange { controller: 1, value: 10 }
        );
        assert_eq!(
            synth.sent[1].1,
            ChannelMessage::ControlChange { controller: 1, value: 20 }
        );
    }

    #[test]
    fn unresolved_channel_drops_event_without_abort() {
        let tempo = frame_tempo();
        let mut rack = rack(&["missing", "b"]);
        let events = [
            TimedEvent::note_on(0, 0, 60, 100),
            TimedEvent::note_on(0, 1, 64, 100),
            TimedEvent::note_off(2000, 1, 64),
        ];
        let out = render_events(&mut rack, &events, &tempo);
        assert_eq!(out.len(), frames_at(&tempo, 2000) * 2);

        let synth = rack.resolve(1).unwrap();
        assert_eq!(synth.sent.len(), 2);
    }

    #[test]
    fn two_channels_sum_to_independent_renders() {
        let tempo = frame_tempo();

        // Joint render: two channels, each filling a constant
        let loader = TestLoader { fill: 0.25, ..TestLoader::default() };
        let mut joint = ChannelRack::new(
            loader,
            InstrumentAssignment::PerChannel(vec!["a".to_string(), "b".to_string()]),
            44100,
            BLOCK,
        );
        let events = [
            TimedEvent::note_on(0, 0, 60, 100),
            TimedEvent::note_on(0, 1, 64, 100),
            TimedEvent::note_off(3000, 0, 60),
        ];
        let sum = render_events(&mut joint, &events, &tempo);

        // Independent single-channel renders of the same span
        let mut solo = |ch: u8| {
            let loader = TestLoader { fill: 0.25, ..TestLoader::default() };
            let mut rack = ChannelRack::new(
                loader,
                InstrumentAssignment::PerChannel(vec!["a".to_string(), "b".to_string()]),
                44100,
                BLOCK,
            );
            let events = [
                TimedEvent::note_on(0, ch, 60, 100),
                TimedEvent::note_off(3000, ch, 60),
            ];
            render_events(&mut rack, &events, &tempo)
        };
        let first = solo(0);
        let second = solo(1);

        for i in 0..sum.len() {
            let expected = first[i] + second[i];
            assert!((sum[i] - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn sequential_timeline_renders_tracks_separately() {
        let tempo = frame_tempo();
        let mut timeline = Timeline::new(TimelineFormat::Sequential, tempo);
        timeline.tracks.push(vec![
            TimedEvent::note_on(0, 0, 60, 100),
            TimedEvent::note_off(2000, 0, 60),
        ]);
        timeline.tracks.push(vec![
            TimedEvent::note_on(0, 0, 72, 100),
            TimedEvent::note_off(4000, 0, 72),
        ]);

        let mut rack = rack(&["a"]);
        let tracks = render_timeline(&mut rack, &timeline);
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].frames(), frames_at(&timeline.tempo, 2000));
        assert_eq!(tracks[1].frames(), frames_at(&timeline.tempo, 4000));
    }

    #[test]
    fn parallel_timeline_renders_one_merged_buffer() {
        let tempo = frame_tempo();
        let mut timeline = Timeline::new(TimelineFormat::Parallel, tempo);
        timeline.tracks.push(vec![TimedEvent::note_on(0, 0, 60, 100)]);
        timeline.tracks.push(vec![TimedEvent::note_off(2000, 0, 60)]);

        let mut rack = rack(&["a"]);
        let tracks = render_timeline(&mut rack, &timeline);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].frames(), frames_at(&timeline.tempo, 2000));
    }
}
