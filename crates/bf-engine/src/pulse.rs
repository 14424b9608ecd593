//! Diagnostic impulse synthesizer.
//!
//! Emits a single-frame impulse at each note-on's delay offset and
//! nothing else. Not an instrument: it exists to make block-boundary
//! and delay arithmetic audible and testable without a native
//! synthesizer behind the [`BlockSynth`] seam.

use alloc::vec::Vec;

use bf_ir::ChannelMessage;

use crate::synth::{BlockSynth, InstrumentLoader};

/// A timing-probe synthesizer: one impulse per note-on.
#[derive(Debug)]
pub struct PulseSynth {
    sample_rate: u32,
    max_block: usize,
    /// Impulses not yet rendered: delay in frames from the next
    /// render's first frame, plus amplitude.
    pending: Vec<(usize, f32)>,
}

impl PulseSynth {
    pub fn new() -> Self {
        Self {
            sample_rate: 44100,
            max_block: bf_ir::DEFAULT_BLOCK_SIZE,
            pending: Vec::new(),
        }
    }

    /// Configured sample rate (the pulse shape does not depend on it).
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl Default for PulseSynth {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockSynth for PulseSynth {
    fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
    }

    fn set_samples_per_block(&mut self, max_block: usize) {
        self.max_block = max_block;
    }

    fn send(&mut self, delay: usize, message: ChannelMessage) {
        debug_assert!(delay <= self.max_block);
        if let ChannelMessage::NoteOn { velocity, .. } = message {
            self.pending.push((delay, velocity as f32 / 127.0));
        }
    }

    fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len());
        debug_assert!(!left.is_empty());
        debug_assert!(left.len() <= self.max_block);

        left.fill(0.0);
        right.fill(0.0);

        let frames = left.len();
        self.pending.retain_mut(|(delay, amplitude)| {
            if *delay < frames {
                left[*delay] += *amplitude;
                right[*delay] += *amplitude;
                false
            } else {
                // Lands beyond this block; carry into the next one
                *delay -= frames;
                true
            }
        });
    }
}

/// Loads a fresh [`PulseSynth`] for any source string.
#[derive(Clone, Copy, Debug, Default)]
pub struct PulseLoader;

impl InstrumentLoader for PulseLoader {
    type Synth = PulseSynth;

    fn load(&mut self, _source: &str) -> Option<PulseSynth> {
        Some(PulseSynth::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn render(synth: &mut PulseSynth, frames: usize) -> Vec<f32> {
        let mut left = vec![0.0; frames];
        let mut right = vec![0.0; frames];
        synth.render(&mut left, &mut right);
        assert_eq!(left, right);
        left
    }

    #[test]
    fn impulse_lands_at_its_delay() {
        let mut synth = PulseSynth::new();
        synth.set_samples_per_block(64);
        synth.send(5, ChannelMessage::NoteOn { key: 60, velocity: 127 });

        let out = render(&mut synth, 64);
        assert_eq!(out[5], 1.0);
        assert_eq!(out.iter().filter(|&&s| s != 0.0).count(), 1);
    }

    #[test]
    fn velocity_scales_amplitude() {
        let mut synth = PulseSynth::new();
        synth.set_samples_per_block(16);
        synth.send(0, ChannelMessage::NoteOn { key: 60, velocity: 64 });

        let out = render(&mut synth, 16);
        assert!((out[0] - 64.0 / 127.0).abs() < 1e-6);
    }

    #[test]
    fn delay_beyond_rendered_frames_carries_over() {
        let mut synth = PulseSynth::new();
        synth.set_samples_per_block(64);
        // Inclusive upper bound of the delay domain
        synth.send(64, ChannelMessage::NoteOn { key: 60, velocity: 127 });

        let first = render(&mut synth, 64);
        assert!(first.iter().all(|&s| s == 0.0));

        // Carried impulse lands on the first frame of the next block
        let second = render(&mut synth, 64);
        assert_eq!(second[0], 1.0);
    }

    #[test]
    fn non_note_messages_are_silent() {
        let mut synth = PulseSynth::new();
        synth.set_samples_per_block(16);
        synth.send(0, ChannelMessage::NoteOff { key: 60, velocity: 0 });
        synth.send(1, ChannelMessage::ControlChange { controller: 7, value: 100 });
        synth.send(2, ChannelMessage::PitchBend { value: 8192 });

        let out = render(&mut synth, 16);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn coincident_impulses_sum() {
        let mut synth = PulseSynth::new();
        synth.set_samples_per_block(16);
        synth.send(3, ChannelMessage::NoteOn { key: 60, velocity: 127 });
        synth.send(3, ChannelMessage::NoteOn { key: 64, velocity: 127 });

        let out = render(&mut synth, 16);
        assert!((out[3] - 2.0).abs() < 1e-6);
    }
}
