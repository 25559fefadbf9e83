//! Reduction core: analysis, decision, and requantization modules

pub mod decision;
pub mod dsp;
pub mod error;
pub mod framer;
pub mod masking;
pub mod merger;
pub mod quantizer;
pub mod reducer;
pub mod spectrum;

pub use decision::{BitDecision, DecisionEngine};
pub use error::ReduceError;
pub use framer::BlockFramer;
pub use masking::MaskingModel;
pub use merger::{BlockMerger, ChannelOutput};
pub use quantizer::NoiseShapingQuantizer;
pub use reducer::{reconstruct, BitReducer, ChannelResult, ChannelStats};
pub use spectrum::SpectralEstimator;
