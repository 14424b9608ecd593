//! Lock-free stereo ring shared with the device callback.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

/// A fixed-capacity interleaved stereo ring the device callback plays
/// continuously, wrapping at capacity — the software analogue of a
/// looping audio clip.
///
/// Samples are stored as `f32` bit patterns in atomic cells so the
/// driver thread can overwrite audio the callback is concurrently
/// reading without a lock. The callback owns the read cursor; the
/// driver only reads it, except for a hard resync.
pub struct SharedRing {
    cells: Vec<AtomicU32>,
    playhead: AtomicUsize,
    running: AtomicBool,
}

impl SharedRing {
    /// Create a silent ring of `capacity` frames.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0);
        let cells = (0..capacity * 2)
            .map(|_| AtomicU32::new(0.0_f32.to_bits()))
            .collect();
        Self {
            cells,
            playhead: AtomicUsize::new(0),
            running: AtomicBool::new(false),
        }
    }

    /// Capacity in frames.
    pub fn capacity(&self) -> usize {
        self.cells.len() / 2
    }

    /// Current read cursor in frames.
    pub fn playhead(&self) -> usize {
        self.playhead.load(Ordering::Relaxed)
    }

    /// Force the read cursor to `frame`.
    pub fn set_playhead(&self, frame: usize) {
        self.playhead.store(frame % self.capacity(), Ordering::Relaxed);
    }

    /// Whether the callback should produce audio or silence.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Relaxed);
    }

    /// Read one frame.
    pub fn frame(&self, index: usize) -> (f32, f32) {
        let base = (index % self.capacity()) * 2;
        let left = f32::from_bits(self.cells[base].load(Ordering::Relaxed));
        let right = f32::from_bits(self.cells[base + 1].load(Ordering::Relaxed));
        (left, right)
    }

    /// Read one frame and advance the read cursor.
    pub fn advance(&self) -> (f32, f32) {
        let pos = self.playhead.load(Ordering::Relaxed);
        let frame = self.frame(pos);
        self.playhead
            .store((pos + 1) % self.capacity(), Ordering::Relaxed);
        frame
    }

    /// Copy interleaved stereo samples in starting at `offset` frames,
    /// wrapping at capacity.
    pub fn write_at(&self, offset: usize, samples: &[f32]) {
        debug_assert!(samples.len() % 2 == 0);
        let capacity = self.capacity();
        for (i, frame) in samples.chunks_exact(2).enumerate() {
            let base = ((offset + i) % capacity) * 2;
            self.cells[base].store(frame[0].to_bits(), Ordering::Relaxed);
            self.cells[base + 1].store(frame[1].to_bits(), Ordering::Relaxed);
        }
    }
}
