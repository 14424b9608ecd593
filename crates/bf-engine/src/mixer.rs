//! Accumulating block mixer.

use bf_ir::BlockBuffer;

use crate::router::ChannelRack;
use crate::synth::{BlockSynth, InstrumentLoader};

/// Renders one block from every loaded instrument and sums the planar
/// outputs into a single interleaved stereo buffer.
///
/// No clipping or normalization is applied; summed amplitude may exceed
/// unit range.
pub struct BlockMixer {
    scratch: BlockBuffer,
}

impl BlockMixer {
    /// Create a mixer able to render up to `max_block` frames per call.
    pub fn new(max_block: usize) -> Self {
        Self {
            scratch: BlockBuffer::new(max_block),
        }
    }

    /// Maximum frames one `render_into` call may request.
    pub fn max_block(&self) -> usize {
        self.scratch.max_block()
    }

    /// Render `out.len() / 2` frames into `out`, overwriting it.
    ///
    /// Instruments nothing has loaded contribute silence by omission;
    /// the accumulator starts at zero. Requesting more frames than the
    /// mixer or the rack was sized for is a caller bug.
    pub fn render_into<L: InstrumentLoader>(&mut self, rack: &mut ChannelRack<L>, out: &mut [f32]) {
        debug_assert!(out.len() % 2 == 0);
        let frames = out.len() / 2;
        debug_assert!(frames <= self.scratch.max_block());
        debug_assert!(frames <= rack.max_block());

        out.fill(0.0);
        if frames == 0 {
            return;
        }

        for synth in rack.loaded_mut() {
            let (left, right) = self.scratch.planes_mut(frames);
            synth.render(left, right);
            self.scratch.accumulate_into(out, frames);
        }
    }
}
