//! Noise-shaping requantizer.
//!
//! Each sample is rounded to a multiple of `2^bits_to_remove`, and the
//! rounding error is fed back through a fixed-order FIR filter so the next
//! sample's target is pre-compensated: `shaped = x − Σ c_k·e_{n−k}`,
//! `q = round(shaped / step) · step`, `e_n = q − shaped`. The error memory is
//! per-channel persistent state and carries across block boundaries without
//! reset; resetting at block edges would reintroduce boundary artifacts.
//!
//! Accumulation is in f64; final rounding resolves ties toward even to avoid
//! DC bias over long runs. The reduced range is narrowed at the top by the
//! quantization step so rounding can never overflow the sample width, and the
//! post-clamp value is what feeds the error filter.

use crate::config::ShapingCoefficients;
use crate::core::error::ReduceError;

/// Per-channel quantizer with persistent error-feedback state.
pub struct NoiseShapingQuantizer {
    coeffs: Vec<f64>,
    /// Ring of the last `order` errors; `errors[head]` is the most recent.
    errors: Vec<f64>,
    head: usize,
    source_bits: u32,
    min_sample: i64,
    full_max: i64,
}

impl NoiseShapingQuantizer {
    /// Fails fast with `InvalidShapingConfig` if the filter is unstable.
    pub fn new(source_bits: u32, shaping: &ShapingCoefficients) -> Result<Self, ReduceError> {
        shaping.validate()?;
        if !(8..=32).contains(&source_bits) {
            return Err(ReduceError::InvalidConfiguration(format!(
                "source bit depth {source_bits} outside 8..=32"
            )));
        }

        let order = shaping.order();
        Ok(Self {
            coeffs: shaping.coeffs().to_vec(),
            errors: vec![0.0; order],
            head: 0,
            source_bits,
            min_sample: -(1i64 << (source_bits - 1)),
            full_max: (1i64 << (source_bits - 1)) - 1,
        })
    }

    /// Weighted sum of the last `order` errors, newest first.
    fn feedback(&self) -> f64 {
        let order = self.errors.len();
        let mut acc = 0.0f64;
        for (k, &c) in self.coeffs.iter().enumerate() {
            acc += c * self.errors[(self.head + k) % order];
        }
        acc
    }

    fn push_error(&mut self, error: f64) {
        if self.errors.is_empty() {
            return;
        }
        self.head = (self.head + self.errors.len() - 1) % self.errors.len();
        self.errors[self.head] = error;
    }

    /// Requantize one block segment in time order.
    ///
    /// Appends reduced samples to `reduced`, and, when `correction` is given,
    /// the per-sample residual `original − reduced` (wrapping i32, so
    /// `reduced.wrapping_add(correction)` reconstructs the original exactly).
    pub fn quantize_segment(
        &mut self,
        raw: &[i32],
        bits_to_remove: u32,
        reduced: &mut Vec<i32>,
        mut correction: Option<&mut Vec<i32>>,
    ) {
        debug_assert!(bits_to_remove < self.source_bits);

        if bits_to_remove == 0 {
            // Exact passthrough: no error is injected, but the filter memory
            // still advances causally.
            for &s in raw {
                reduced.push(s);
                if let Some(corr) = correction.as_mut() {
                    corr.push(0);
                }
                self.push_error(0.0);
            }
            return;
        }

        let step = (1i64 << bits_to_remove) as f64;
        // Top of range shrinks by a full step so rounding up cannot clip.
        let max_sample = self.full_max - ((1i64 << bits_to_remove) - 1);

        for &s in raw {
            let x = s as f64;
            let shaped = if self.errors.is_empty() {
                x
            } else {
                x - self.feedback()
            };

            let mut q = (shaped / step).round_ties_even() as i64 * (step as i64);
            q = q.clamp(self.min_sample, max_sample);

            self.push_error(q as f64 - shaped);

            reduced.push(q as i32);
            if let Some(corr) = correction.as_mut() {
                corr.push((s as i64).wrapping_sub(q) as i32);
            }
        }
    }

    /// Current error memory, newest first. Fixed length (the filter order).
    pub fn error_state(&self) -> Vec<f64> {
        let order = self.errors.len();
        (0..order)
            .map(|k| self.errors[(self.head + k) % order])
            .collect()
    }

    pub fn order(&self) -> usize {
        self.errors.len()
    }
}

/// Recombination rule for correction data: exact mod the output encoding.
pub fn reconstruct_sample(reduced: i32, correction: i32) -> i32 {
    reduced.wrapping_add(correction)
}
