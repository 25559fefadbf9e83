//! Block framing: slices a channel into overlapping, windowed analysis blocks.
//!
//! Windowing is an analysis-only transformation. Each block therefore carries
//! two views of the signal: the windowed samples handed to the spectral
//! estimator, and the unwindowed raw *advance segment*: the hop-length run of
//! samples that this block (and no other) requantizes. Consecutive analysis
//! windows overlap; advance segments tile the channel exactly once.

use crate::core::dsp::windows::{create_window, WindowType};

/// One analysis step: a windowed excerpt plus the raw samples it advances over.
pub struct AnalysisBlock<'a> {
    /// Block index within the channel, starting at 0.
    pub index: usize,
    /// Windowed samples, always `block_length` long; the final block is
    /// zero-padded.
    pub windowed: Vec<f64>,
    /// Unwindowed raw samples covered by this block's advance. At most
    /// `hop` long; shorter for the final block (no padding ever lands here).
    pub raw: &'a [i32],
}

/// Lazy, restartable sequence of analysis blocks over one channel.
pub struct BlockFramer<'a> {
    samples: &'a [i32],
    window: Vec<f64>,
    block_length: usize,
    hop: usize,
    position: usize,
    index: usize,
}

impl<'a> BlockFramer<'a> {
    /// `block_length` must be a power of two and `overlap_fraction` in
    /// [0, 1); both are enforced by configuration validation before any
    /// framer is constructed.
    pub fn new(samples: &'a [i32], block_length: usize, overlap_fraction: f64) -> Self {
        let hop = hop_length(block_length, overlap_fraction);
        Self {
            samples,
            window: create_window(block_length, WindowType::Hann),
            block_length,
            hop,
            position: 0,
            index: 0,
        }
    }

    /// Samples each block advances past its predecessor.
    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Number of blocks this framer will yield.
    pub fn block_count(&self) -> usize {
        self.samples.len().div_ceil(self.hop)
    }

    /// Restart iteration from the beginning of the channel.
    pub fn reset(&mut self) {
        self.position = 0;
        self.index = 0;
    }
}

/// Advance in samples for a given block length and overlap fraction.
pub fn hop_length(block_length: usize, overlap_fraction: f64) -> usize {
    let hop = (block_length as f64 * (1.0 - overlap_fraction)).round() as usize;
    hop.max(1)
}

impl<'a> Iterator for BlockFramer<'a> {
    type Item = AnalysisBlock<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.position;
        if start >= self.samples.len() {
            return None;
        }

        let mut windowed = vec![0.0f64; self.block_length];
        let available = (self.samples.len() - start).min(self.block_length);
        for i in 0..available {
            windowed[i] = self.samples[start + i] as f64 * self.window[i];
        }

        let advance_end = (start + self.hop).min(self.samples.len());
        let block = AnalysisBlock {
            index: self.index,
            windowed,
            raw: &self.samples[start..advance_end],
        };

        self.position += self.hop;
        self.index += 1;
        Some(block)
    }
}
