//! Error taxonomy for the reduction core.
//!
//! Every failure here reflects a missing capability or a configuration
//! contract violation, detected before or at the start of stream processing.
//! There are no retryable errors inside the core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReduceError {
    /// No forward transform could be provided for the requested block length.
    /// Fatal for the whole run; there is no fallback spectral method.
    #[error("transform capability unavailable for block length {length}")]
    TransformUnavailable { length: usize },

    /// The noise-shaping filter failed its stability check at initialization.
    #[error("invalid noise shaping configuration: {0}")]
    InvalidShapingConfig(String),

    /// A configuration contract violation (non-power-of-two block length,
    /// overlap outside [0, 1), etc.), caught before any sample is processed.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}
