//! wavreduce - Perceptually-guided reversible bit-depth reduction
//!
//! Estimates, per analysis block, how many low-order bits of each PCM sample
//! can be discarded without the quantization noise becoming audible, then
//! requantizes with an error-feedback noise-shaping filter. Optionally emits
//! a correction stream so the original samples can be reconstructed exactly.
//!
//! ## Pipeline
//!
//! Block Framer → Spectral Estimator → Spreading/Masking Model →
//! Bit-Budget Decision Engine → Noise-Shaping Quantizer → Block Merger
//!
//! Channels are independent and processed in parallel; within a channel,
//! blocks run strictly in time order because the decision history and the
//! shaping filter state are causal.
//!
//! ## Module Structure
//!
//! - `core` - Analysis, decision, and requantization pipeline
//! - `config` - Validated settings, quality presets, shaping tables
//! - `wav` - WAV container boundary (read/write/merge)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wavreduce::config::{QualityPreset, ReducerConfig};
//! use wavreduce::core::BitReducer;
//!
//! let mut config = ReducerConfig::from_preset(QualityPreset::Standard);
//! config.correction_enabled = true;
//!
//! let reducer = BitReducer::new(config, 44100, 16)?;
//! let results = reducer.process(&channels)?;
//! ```
//!
//! ## Quality Presets
//!
//! | Preset   | Margin (bits) | Use case                          |
//! |----------|---------------|-----------------------------------|
//! | insane   | 3.0           | Paranoid archival                 |
//! | extreme  | 2.0           | Transparent with wide headroom    |
//! | high     | 1.5           | Transparent                       |
//! | standard | 1.0           | Default                           |
//! | economic | 0.5           | Smaller output, mild risk         |
//! | portable | 0.25          | Maximum reduction                 |

// Reduction pipeline
pub mod core;

// Configuration and presets
pub mod config;

// WAV container boundary
pub mod wav;

// Re-export commonly used types at crate root for convenience
pub use config::{QualityPreset, ReducerConfig, ShapingCoefficients, SmoothingRule};
pub use core::{
    reconstruct, BitDecision, BitReducer, ChannelOutput, ChannelResult, ChannelStats,
    DecisionEngine, MaskingModel, NoiseShapingQuantizer, ReduceError, SpectralEstimator,
};
pub use wav::{merge_wavs, read_wav, write_wav, AudioData};
