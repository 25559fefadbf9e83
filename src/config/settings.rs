// src/config/settings.rs
//
// Reduction configuration: validated settings, noise-shaping coefficient
// tables, and named quality presets mapping to margin/floor combinations.

use serde::Serialize;

use crate::core::error::ReduceError;

/// Largest coefficient magnitude the shaping filter accepts.
const SHAPING_MAX_COEFF: f64 = 4.0;
/// Largest absolute coefficient sum the shaping filter accepts.
const SHAPING_MAX_COEFF_SUM: f64 = 8.0;
/// Largest supported filter order.
const SHAPING_MAX_ORDER: usize = 16;

/// Error-feedback filter coefficients for the noise-shaping quantizer.
///
/// The noise transfer function is `1 − Σ c_k·z^−k`; an empty table means flat
/// (unshaped) rounding. The defaults are a replaceable tuning, not part of
/// the algorithm contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapingCoefficients {
    coeffs: Vec<f64>,
}

impl ShapingCoefficients {
    /// Flat quantization noise: no error feedback.
    pub fn flat() -> Self {
        Self { coeffs: Vec::new() }
    }

    /// First-order high-pass shaping, the simplest useful curve.
    pub fn first_order() -> Self {
        Self { coeffs: vec![1.0] }
    }

    /// Third-order high-frequency-biased table. Pushes roughly 12 dB of the
    /// error out of the low-frequency region at 44.1/48 kHz rates.
    pub fn default_weighted() -> Self {
        Self {
            coeffs: vec![1.623, -0.982, 0.109],
        }
    }

    /// A caller-supplied table, validated when the quantizer is built.
    pub fn custom(coeffs: Vec<f64>) -> Self {
        Self { coeffs }
    }

    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    /// Filter order (number of past errors fed back).
    pub fn order(&self) -> usize {
        self.coeffs.len()
    }

    /// Stability check: bounded order, finite coefficients, bounded magnitudes
    /// and bounded absolute sum. Violations fail fast before any sample is
    /// processed.
    pub fn validate(&self) -> Result<(), ReduceError> {
        if self.coeffs.len() > SHAPING_MAX_ORDER {
            return Err(ReduceError::InvalidShapingConfig(format!(
                "filter order {} exceeds maximum {}",
                self.coeffs.len(),
                SHAPING_MAX_ORDER
            )));
        }
        let mut sum = 0.0f64;
        for (k, &c) in self.coeffs.iter().enumerate() {
            if !c.is_finite() {
                return Err(ReduceError::InvalidShapingConfig(format!(
                    "coefficient {k} is not finite"
                )));
            }
            if c.abs() > SHAPING_MAX_COEFF {
                return Err(ReduceError::InvalidShapingConfig(format!(
                    "coefficient {k} magnitude {:.3} exceeds bound {SHAPING_MAX_COEFF}",
                    c.abs()
                )));
            }
            sum += c.abs();
        }
        if sum > SHAPING_MAX_COEFF_SUM {
            return Err(ReduceError::InvalidShapingConfig(format!(
                "coefficient sum {sum:.3} exceeds bound {SHAPING_MAX_COEFF_SUM}"
            )));
        }
        Ok(())
    }
}

impl Default for ShapingCoefficients {
    fn default() -> Self {
        Self::default_weighted()
    }
}

/// How the sliding window of raw decisions is collapsed into one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SmoothingRule {
    /// Most conservative: the minimum of the last K raw decisions.
    Minimum,
    /// Recency-weighted average of the last K raw decisions, rounded down.
    WeightedAverage,
}

impl SmoothingRule {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "min" | "minimum" => Some(Self::Minimum),
            "avg" | "average" | "weighted" => Some(Self::WeightedAverage),
            _ => None,
        }
    }
}

/// Quality presets, most to least conservative. Each maps to a safety margin,
/// absolute-silence floor, and minimum-bits-to-keep combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QualityPreset {
    Insane,
    Extreme,
    High,
    Standard,
    Economic,
    Portable,
}

impl QualityPreset {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "insane" => Some(Self::Insane),
            "extreme" => Some(Self::Extreme),
            "high" => Some(Self::High),
            "standard" => Some(Self::Standard),
            "economic" => Some(Self::Economic),
            "portable" => Some(Self::Portable),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Insane => "insane",
            Self::Extreme => "extreme",
            Self::High => "high",
            Self::Standard => "standard",
            Self::Economic => "economic",
            Self::Portable => "portable",
        }
    }

    pub fn all() -> &'static [QualityPreset] {
        &[
            Self::Insane,
            Self::Extreme,
            Self::High,
            Self::Standard,
            Self::Economic,
            Self::Portable,
        ]
    }

    /// (safety_margin_bits, silence_floor_db, min_bits_to_keep)
    fn tuning(&self) -> (f64, f64, u32) {
        match self {
            Self::Insane => (3.0, -132.0, 8),
            Self::Extreme => (2.0, -126.0, 7),
            Self::High => (1.5, -120.0, 7),
            Self::Standard => (1.0, -114.0, 6),
            Self::Economic => (0.5, -108.0, 6),
            Self::Portable => (0.25, -102.0, 5),
        }
    }
}

/// Validated configuration surface for the whole pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct ReducerConfig {
    /// Analysis block length in samples; power of two.
    pub block_length: usize,
    /// Fraction of each block shared with its successor; [0, 1).
    pub overlap_fraction: f64,
    /// Extra headroom (in bits, 6.02 dB each) kept between the injected noise
    /// and the masking curve.
    pub safety_margin_bits: f64,
    /// Sliding window length K for decision smoothing; >= 1.
    pub smoothing_window: usize,
    /// How the decision window is collapsed.
    pub smoothing_rule: SmoothingRule,
    /// Largest upward step of `bits_to_remove` between adjacent blocks.
    pub max_step_bits: u32,
    /// Absolute-silence floor in dBFS; noise below it is never audible.
    pub silence_floor_db: f64,
    /// `bits_to_remove` is capped at `source_bits - min_bits_to_keep`.
    pub min_bits_to_keep: u32,
    /// Error-feedback filter for the quantizer.
    pub shaping: ShapingCoefficients,
    /// Emit a correction stream enabling exact reconstruction.
    pub correction_enabled: bool,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self::from_preset(QualityPreset::Standard)
    }
}

impl ReducerConfig {
    pub fn from_preset(preset: QualityPreset) -> Self {
        let (safety_margin_bits, silence_floor_db, min_bits_to_keep) = preset.tuning();
        Self {
            block_length: 2048,
            overlap_fraction: 0.5,
            safety_margin_bits,
            smoothing_window: 4,
            smoothing_rule: SmoothingRule::Minimum,
            max_step_bits: 2,
            silence_floor_db,
            min_bits_to_keep,
            shaping: ShapingCoefficients::default(),
            correction_enabled: false,
        }
    }

    /// Validate every field; invalid combinations fail before any sample is
    /// processed.
    pub fn validate(&self) -> Result<(), ReduceError> {
        if self.block_length < 256
            || self.block_length > 32768
            || !self.block_length.is_power_of_two()
        {
            return Err(ReduceError::InvalidConfiguration(format!(
                "block_length {} must be a power of two in 256..=32768",
                self.block_length
            )));
        }
        if !self.overlap_fraction.is_finite()
            || self.overlap_fraction < 0.0
            || self.overlap_fraction >= 1.0
        {
            return Err(ReduceError::InvalidConfiguration(format!(
                "overlap_fraction {} must lie in [0, 1)",
                self.overlap_fraction
            )));
        }
        if !self.safety_margin_bits.is_finite() || self.safety_margin_bits < 0.0 {
            return Err(ReduceError::InvalidConfiguration(format!(
                "safety_margin_bits {} must be >= 0",
                self.safety_margin_bits
            )));
        }
        if self.smoothing_window == 0 {
            return Err(ReduceError::InvalidConfiguration(
                "smoothing_window must be >= 1".to_string(),
            ));
        }
        if self.max_step_bits == 0 {
            return Err(ReduceError::InvalidConfiguration(
                "max_step_bits must be >= 1".to_string(),
            ));
        }
        if !self.silence_floor_db.is_finite() || self.silence_floor_db >= 0.0 {
            return Err(ReduceError::InvalidConfiguration(format!(
                "silence_floor_db {} must be finite and negative",
                self.silence_floor_db
            )));
        }
        if self.min_bits_to_keep == 0 {
            return Err(ReduceError::InvalidConfiguration(
                "min_bits_to_keep must be >= 1".to_string(),
            ));
        }
        self.shaping.validate()
    }
}
