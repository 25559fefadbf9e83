//! Pipeline orchestration: framer → spectrum → masking → decision →
//! quantizer → merger, per channel.
//!
//! Channels are mutually independent and processed in parallel; within one
//! channel blocks run strictly in time order because the decision history and
//! the shaping filter state are causal. Results are collected by channel
//! index, so output is byte-identical regardless of worker scheduling.

use std::sync::Arc;

use log::debug;
use rayon::prelude::*;
use serde::Serialize;

use crate::config::ReducerConfig;
use crate::core::decision::DecisionEngine;
use crate::core::dsp::transform::TransformAdapter;
use crate::core::dsp::windows::{coherent_gain, create_window, WindowType};
use crate::core::error::ReduceError;
use crate::core::framer::BlockFramer;
use crate::core::masking::MaskingModel;
use crate::core::merger::{BlockMerger, ChannelOutput};
use crate::core::quantizer::{reconstruct_sample, NoiseShapingQuantizer};
use crate::core::spectrum::SpectralEstimator;

/// Per-channel reduction statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelStats {
    pub blocks: usize,
    /// Sample-weighted average of `bits_to_remove`.
    pub mean_bits_removed: f64,
    pub min_bits_removed: u32,
    pub max_bits_removed: u32,
}

/// One channel's merged output plus its statistics.
#[derive(Debug, Clone)]
pub struct ChannelResult {
    pub output: ChannelOutput,
    pub stats: ChannelStats,
}

/// The reduction pipeline for one stream format (sample rate + bit depth).
///
/// Immutable after construction and shared across channel workers; all
/// per-channel mutable state (decision history, shaping filter) lives inside
/// `process_channel`.
pub struct BitReducer {
    config: ReducerConfig,
    source_bits: u32,
    estimator: SpectralEstimator,
    masking: MaskingModel,
}

impl BitReducer {
    /// Validates the full configuration surface before any sample is
    /// processed.
    pub fn new(config: ReducerConfig, sample_rate: u32, source_bits: u32) -> Result<Self, ReduceError> {
        config.validate()?;
        if !(8..=32).contains(&source_bits) {
            return Err(ReduceError::InvalidConfiguration(format!(
                "source bit depth {source_bits} outside 8..=32"
            )));
        }
        if sample_rate == 0 {
            return Err(ReduceError::InvalidConfiguration(
                "sample rate must be non-zero".to_string(),
            ));
        }
        // Fail shaping problems here, not mid-stream.
        NoiseShapingQuantizer::new(source_bits, &config.shaping)?;

        let transform = Arc::new(TransformAdapter::new(&[config.block_length])?);
        let window = create_window(config.block_length, WindowType::Hann);
        let estimator = SpectralEstimator::new(
            transform,
            config.block_length,
            coherent_gain(&window),
            source_bits,
        );
        let masking = MaskingModel::new(
            config.block_length / 2 + 1,
            config.block_length,
            sample_rate,
            config.silence_floor_db,
        );

        Ok(Self {
            config,
            source_bits,
            estimator,
            masking,
        })
    }

    pub fn config(&self) -> &ReducerConfig {
        &self.config
    }

    /// Process every channel, in parallel, preserving channel order.
    pub fn process(&self, channels: &[Vec<i32>]) -> Result<Vec<ChannelResult>, ReduceError> {
        channels
            .par_iter()
            .map(|samples| self.process_channel(samples))
            .collect()
    }

    /// Run the full pipeline over one channel, blocks in strict time order.
    pub fn process_channel(&self, samples: &[i32]) -> Result<ChannelResult, ReduceError> {
        let framer = BlockFramer::new(samples, self.config.block_length, self.config.overlap_fraction);
        let mut engine = DecisionEngine::new(self.source_bits, self.config.block_length, &self.config);
        let mut quantizer = NoiseShapingQuantizer::new(self.source_bits, &self.config.shaping)?;
        let mut merger = BlockMerger::new(samples.len(), self.config.correction_enabled);

        let mut blocks = 0usize;
        let mut weighted_bits = 0u64;
        let mut min_bits = u32::MAX;
        let mut max_bits = 0u32;

        let mut reduced_seg: Vec<i32> = Vec::with_capacity(framer.hop());
        let mut corr_seg: Vec<i32> = Vec::with_capacity(framer.hop());

        for block in framer {
            let magnitudes = self.estimator.magnitude_spectrum(&block.windowed)?;
            let curve = self.masking.masking_curve(&magnitudes);
            let decision = engine.decide(block.index, &curve);

            reduced_seg.clear();
            corr_seg.clear();
            let corr_out = self.config.correction_enabled.then_some(&mut corr_seg);
            quantizer.quantize_segment(block.raw, decision.bits_to_remove, &mut reduced_seg, corr_out);

            merger.push_block(
                block.index,
                &reduced_seg,
                self.config.correction_enabled.then_some(corr_seg.as_slice()),
            );

            blocks += 1;
            weighted_bits += decision.bits_to_remove as u64 * block.raw.len() as u64;
            min_bits = min_bits.min(decision.bits_to_remove);
            max_bits = max_bits.max(decision.bits_to_remove);
        }

        let stats = ChannelStats {
            blocks,
            mean_bits_removed: if samples.is_empty() {
                0.0
            } else {
                weighted_bits as f64 / samples.len() as f64
            },
            min_bits_removed: if blocks == 0 { 0 } else { min_bits },
            max_bits_removed: max_bits,
        };
        debug!(
            "channel done: {} blocks, mean {:.2} bits removed",
            stats.blocks, stats.mean_bits_removed
        );

        Ok(ChannelResult {
            output: merger.finish(),
            stats,
        })
    }
}

/// Recombine a reduced stream with its correction stream. Exact per sample,
/// mod the output encoding's range.
pub fn reconstruct(reduced: &[i32], correction: &[i32]) -> Vec<i32> {
    reduced
        .iter()
        .zip(correction)
        .map(|(&r, &c)| reconstruct_sample(r, c))
        .collect()
}
