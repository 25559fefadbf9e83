//! Bit-budget decision engine: masking curve in, `bits_to_remove` out.
//!
//! The raw decision is a monotone search: removing one more bit raises the
//! injected noise floor by ~6 dB, so a single ascending scan finds the largest
//! removal whose projected noise stays under the masking curve with the
//! configured safety margin. Raw decisions are then smoothed against a sliding
//! window of recent history so the emitted value cannot jump abruptly between
//! adjacent blocks; abrupt changes are themselves audible as modulation
//! noise.

use std::collections::VecDeque;

use log::debug;

use crate::config::{ReducerConfig, SmoothingRule};

/// 20·log10(2): noise floor shift per removed bit.
pub const DB_PER_BIT: f64 = 6.020599913279624;

/// dB equivalent of the uniform-error RMS factor 1/sqrt(12).
const ROUND_ERROR_RMS_DB: f64 = -10.791812460476249;

/// Outcome of one block's decision, retained only as history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitDecision {
    /// Unsmoothed per-block result.
    pub raw: u32,
    /// After the sliding-window smoothing rule.
    pub smoothed: u32,
    /// Final value handed to the quantizer (after the upward slew limit).
    pub bits_to_remove: u32,
}

/// Per-channel decision state. Blocks must be fed in strict time order.
pub struct DecisionEngine {
    source_bits: u32,
    margin_db: f64,
    max_remove: u32,
    max_step: u32,
    /// Last K raw decisions, pre-padded with the most conservative value (0)
    /// until K real blocks have been observed.
    history: VecDeque<u32>,
    rule: SmoothingRule,
    last_emitted: u32,
    /// Folds the rounding-error RMS and the per-bin density across `N/2` bins
    /// so projections are comparable across block lengths.
    noise_offset_db: f64,
}

impl DecisionEngine {
    pub fn new(source_bits: u32, block_length: usize, config: &ReducerConfig) -> Self {
        let max_remove = (source_bits - 1).min(source_bits.saturating_sub(config.min_bits_to_keep));
        let noise_offset_db = ROUND_ERROR_RMS_DB - 10.0 * (block_length as f64 / 2.0).log10();

        let mut history = VecDeque::with_capacity(config.smoothing_window);
        history.extend(std::iter::repeat(0u32).take(config.smoothing_window));

        Self {
            source_bits,
            margin_db: config.safety_margin_bits * DB_PER_BIT,
            max_remove,
            max_step: config.max_step_bits,
            history,
            rule: config.smoothing_rule,
            last_emitted: 0,
            noise_offset_db,
        }
    }

    /// Projected per-bin noise floor (dBFS) if `bits` low-order bits are
    /// rounded away. Strictly increasing in `bits`.
    fn projected_noise_db(&self, bits: u32) -> f64 {
        DB_PER_BIT * (bits as f64 - (self.source_bits as f64 - 1.0)) + self.noise_offset_db
    }

    /// Largest removal whose projected noise, plus the safety margin, lies at
    /// or below every bin of the masking curve. Pure; no state is touched.
    pub fn raw_decision(&self, masking_curve: &[f64]) -> u32 {
        let curve_min = masking_curve
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min);

        let mut best = 0u32;
        for bits in 1..=self.max_remove {
            if self.projected_noise_db(bits) + self.margin_db <= curve_min {
                best = bits;
            } else {
                break;
            }
        }
        best
    }

    /// Collapse the history window per the configured rule. Pure function of
    /// the window contents: identical history yields identical output.
    fn smooth(&self) -> u32 {
        match self.rule {
            SmoothingRule::Minimum => *self.history.iter().min().unwrap_or(&0),
            SmoothingRule::WeightedAverage => {
                // Linearly increasing weight toward the most recent decision,
                // rounded down (the conservative side).
                let mut acc = 0u64;
                let mut total = 0u64;
                for (i, &d) in self.history.iter().enumerate() {
                    let w = (i + 1) as u64;
                    acc += w * d as u64;
                    total += w;
                }
                if total == 0 {
                    0
                } else {
                    (acc / total) as u32
                }
            }
        }
    }

    /// Decide for the next block in time order and update history.
    ///
    /// The raw decision enters the window, the window collapses per the
    /// smoothing rule, and the result is slew-limited upward by
    /// `max_step_bits` against the previously emitted value. Downward moves
    /// are never limited; lowering the removal is the conservative direction.
    pub fn decide(&mut self, block_index: usize, masking_curve: &[f64]) -> BitDecision {
        let raw = self.raw_decision(masking_curve);

        self.history.pop_front();
        self.history.push_back(raw);
        let smoothed = self.smooth();

        let bits_to_remove = smoothed.min(self.last_emitted + self.max_step);
        self.last_emitted = bits_to_remove;

        debug!(
            "block {}: raw={} smoothed={} emitted={}",
            block_index, raw, smoothed, bits_to_remove
        );

        BitDecision {
            raw,
            smoothed,
            bits_to_remove,
        }
    }

    /// Upper bound on any decision this engine can emit.
    pub fn max_removable(&self) -> u32 {
        self.max_remove
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with_margin(margin_bits: f64) -> DecisionEngine {
        let mut config = ReducerConfig::default();
        config.safety_margin_bits = margin_bits;
        config.smoothing_window = 3;
        config.max_step_bits = 2;
        DecisionEngine::new(16, 2048, &config)
    }

    #[test]
    fn test_bounded_by_source_depth() {
        let mut config = ReducerConfig::default();
        config.min_bits_to_keep = 1;
        let engine = DecisionEngine::new(16, 2048, &config);
        assert!(engine.max_removable() <= 15);

        // Generous curve cannot push the decision past the bound.
        let curve = vec![0.0f64; 1025];
        assert!(engine.raw_decision(&curve) <= 15);
    }

    #[test]
    fn test_min_bits_to_keep_caps_decision() {
        let mut config = ReducerConfig::default();
        config.min_bits_to_keep = 10;
        let engine = DecisionEngine::new(16, 2048, &config);
        assert_eq!(engine.max_removable(), 6);
    }

    #[test]
    fn test_margin_monotonicity() {
        let curve = vec![-80.0f64; 1025];
        let mut previous = u32::MAX;
        for margin in [0.0, 0.5, 1.0, 2.0, 4.0] {
            let engine = engine_with_margin(margin);
            let raw = engine.raw_decision(&curve);
            assert!(raw <= previous, "margin {margin} raised the decision");
            previous = raw;
        }
    }

    #[test]
    fn test_quiet_curve_allows_nothing() {
        let engine = engine_with_margin(0.0);
        // Curve at the projected floor of even a single removed bit.
        let floor = engine.projected_noise_db(1) - 1.0;
        let curve = vec![floor; 1025];
        assert_eq!(engine.raw_decision(&curve), 0);
    }

    #[test]
    fn test_history_padding_at_start() {
        let mut engine = engine_with_margin(0.0);
        let curve = vec![-60.0f64; 1025];
        assert!(engine.raw_decision(&curve) > 0);

        // Zeros pre-fill the window, so the first K-1 emitted values stay 0.
        let first = engine.decide(0, &curve);
        let second = engine.decide(1, &curve);
        assert_eq!(first.bits_to_remove, 0);
        assert_eq!(second.bits_to_remove, 0);

        let third = engine.decide(2, &curve);
        assert!(third.bits_to_remove > 0);
    }

    #[test]
    fn test_upward_slew_limit() {
        let mut engine = engine_with_margin(0.0);
        let loud = vec![-20.0f64; 1025];

        let mut last = 0u32;
        for i in 0..10 {
            let d = engine.decide(i, &loud);
            assert!(
                d.bits_to_remove <= last + 2,
                "block {i} jumped {last} -> {}",
                d.bits_to_remove
            );
            last = d.bits_to_remove;
        }
    }

    #[test]
    fn test_downward_moves_unrestricted() {
        let mut engine = engine_with_margin(0.0);
        let loud = vec![-20.0f64; 1025];
        let quiet = vec![-200.0f64; 1025];

        for i in 0..12 {
            engine.decide(i, &loud);
        }
        let drop = engine.decide(12, &quiet);
        assert_eq!(drop.bits_to_remove, 0);
    }

    #[test]
    fn test_weighted_average_never_exceeds_window_maximum() {
        let mut config = ReducerConfig::default();
        config.smoothing_rule = SmoothingRule::WeightedAverage;
        config.smoothing_window = 4;
        config.max_step_bits = 8;
        let mut engine = DecisionEngine::new(16, 2048, &config);

        let loud = vec![-20.0f64; 1025];
        let mut max_raw = 0u32;
        for i in 0..16 {
            let d = engine.decide(i, &loud);
            max_raw = max_raw.max(d.raw);
            assert!(d.smoothed <= max_raw);
        }
    }

    #[test]
    fn test_weighted_average_tracks_faster_than_minimum() {
        // After one loud block amid quiet ones, the minimum rule stays at 0
        // while the weighted average can already move.
        let loud = vec![-20.0f64; 1025];

        let smoothed_after = |rule: SmoothingRule| {
            let mut config = ReducerConfig::default();
            config.smoothing_rule = rule;
            config.smoothing_window = 4;
            config.max_step_bits = 8;
            let mut engine = DecisionEngine::new(16, 2048, &config);
            let mut last = 0u32;
            for i in 0..3 {
                last = engine.decide(i, &loud).smoothed;
            }
            last
        };

        let min = smoothed_after(SmoothingRule::Minimum);
        let avg = smoothed_after(SmoothingRule::WeightedAverage);
        assert_eq!(min, 0);
        assert!(avg > 0);
    }

    #[test]
    fn test_deterministic_for_identical_history() {
        let curve_a = vec![-50.0f64; 1025];
        let curve_b = vec![-70.0f64; 1025];

        let run = || {
            let mut engine = engine_with_margin(1.0);
            let mut out = Vec::new();
            for i in 0..6 {
                let curve = if i % 2 == 0 { &curve_a } else { &curve_b };
                out.push(engine.decide(i, curve).bits_to_remove);
            }
            out
        };
        assert_eq!(run(), run());
    }
}
