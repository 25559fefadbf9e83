//! Window function implementations

use std::f64::consts::PI;

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowType {
    Hann,
    Hamming,
    BlackmanHarris,
}

/// Create window function
pub fn create_window(size: usize, window_type: WindowType) -> Vec<f64> {
    let n = size as f64;
    (0..size)
        .map(|i| {
            let x = i as f64;
            match window_type {
                WindowType::Hann => 0.5 * (1.0 - (2.0 * PI * x / n).cos()),
                WindowType::Hamming => 0.54 - 0.46 * (2.0 * PI * x / n).cos(),
                WindowType::BlackmanHarris => {
                    0.35875 - 0.48829 * (2.0 * PI * x / n).cos()
                        + 0.14128 * (4.0 * PI * x / n).cos()
                        - 0.01168 * (6.0 * PI * x / n).cos()
                }
            }
        })
        .collect()
}

/// Coherent gain of a window (mean of its coefficients). Used to normalize
/// spectral magnitudes so results are comparable across window choices.
pub fn coherent_gain(window: &[f64]) -> f64 {
    if window.is_empty() {
        return 1.0;
    }
    window.iter().sum::<f64>() / window.len() as f64
}
