//! Contracts with the opaque synthesis engine.

use bf_ir::ChannelMessage;

/// One loaded instrument instance of the underlying block synthesizer.
///
/// The engine only ever drives a synthesizer through this surface:
/// configure it, queue timed events, render blocks. Dropping the value
/// releases the instrument and everything it preloaded.
///
/// Instances are not thread-safe; the engine guarantees single-threaded
/// access by construction (one rack per session, one session per thread).
pub trait BlockSynth {
    /// Set the output sample rate. Fixed for the life of a rack slot.
    fn set_sample_rate(&mut self, sample_rate: u32);

    /// Set the maximum frames a single `render` call may request.
    fn set_samples_per_block(&mut self, max_block: usize);

    /// Queue a message `delay` frames into the next rendered block.
    ///
    /// Fire-and-forget; `delay` must be in `[0, max_block]`. A delay
    /// beyond the frames actually rendered next carries into the block
    /// after it.
    fn send(&mut self, delay: usize, message: ChannelMessage);

    /// Render one block into planar stereo planes.
    ///
    /// `left` and `right` are the same length, in `(0, max_block]`.
    /// Requesting more frames than configured is a caller contract
    /// violation, not a recoverable error.
    fn render(&mut self, left: &mut [f32], right: &mut [f32]);
}

/// Creates synthesizer instances from an instrument source string.
///
/// Loading is synchronous and may be slow (sample preloading); the
/// router therefore calls it lazily, once per channel slot at most.
pub trait InstrumentLoader {
    type Synth: BlockSynth;

    /// Load the instrument at `source`, or `None` if it cannot be
    /// loaded. Partial resources must be released before returning.
    fn load(&mut self, source: &str) -> Option<Self::Synth>;
}
