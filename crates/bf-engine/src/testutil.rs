//! Test doubles shared by the engine's unit tests.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;

use bf_ir::ChannelMessage;

use crate::synth::{BlockSynth, InstrumentLoader};

/// Records configuration, sent messages, and render calls; renders a
/// constant fill value so mixing sums are easy to predict.
#[derive(Debug)]
pub struct TestSynth {
    pub sample_rate: u32,
    pub max_block: usize,
    pub fill: f32,
    pub sent: Vec<(usize, ChannelMessage)>,
    pub render_calls: Vec<usize>,
}

impl TestSynth {
    pub fn with_fill(fill: f32) -> Self {
        Self {
            sample_rate: 0,
            max_block: 0,
            fill,
            sent: Vec::new(),
            render_calls: Vec::new(),
        }
    }
}

impl BlockSynth for TestSynth {
    fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
    }

    fn set_samples_per_block(&mut self, max_block: usize) {
        self.max_block = max_block;
    }

    fn send(&mut self, delay: usize, message: ChannelMessage) {
        self.sent.push((delay, message));
    }

    fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        assert_eq!(left.len(), right.len());
        assert!(!left.is_empty());
        assert!(left.len() <= self.max_block, "render exceeded configured block");
        self.render_calls.push(left.len());
        left.fill(self.fill);
        right.fill(self.fill);
    }
}

/// Loads a [`TestSynth`] for any source except the literal `"missing"`.
#[derive(Debug)]
pub struct TestLoader {
    pub fill: f32,
    pub calls: Rc<Cell<usize>>,
}

impl Default for TestLoader {
    fn default() -> Self {
        Self {
            fill: 1.0,
            calls: Rc::new(Cell::new(0)),
        }
    }
}

impl InstrumentLoader for TestLoader {
    type Synth = TestSynth;

    fn load(&mut self, source: &str) -> Option<TestSynth> {
        self.calls.set(self.calls.get() + 1);
        (source != "missing").then(|| TestSynth::with_fill(self.fill))
    }
}

/// A loader plus a handle to its call counter.
pub fn counting_loader() -> (TestLoader, Rc<Cell<usize>>) {
    let loader = TestLoader::default();
    let calls = loader.calls.clone();
    (loader, calls)
}
