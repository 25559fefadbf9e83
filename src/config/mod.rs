//! Configuration module for wavreduce

mod settings;

pub use settings::{QualityPreset, ReducerConfig, ShapingCoefficients, SmoothingRule};
