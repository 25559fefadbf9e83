//! Spectral estimation: windowed block in, scaled magnitude spectrum out.

use std::sync::Arc;

use crate::core::dsp::transform::TransformAdapter;
use crate::core::error::ReduceError;

/// Computes `N/2 + 1` magnitudes per analysis block.
///
/// Magnitudes are scaled so that a full-scale sine of the source bit depth
/// peaks near 1.0 (0 dBFS) regardless of block length or window choice, which
/// keeps masking decisions comparable across configurations.
pub struct SpectralEstimator {
    transform: Arc<TransformAdapter>,
    block_length: usize,
    scale: f64,
}

impl SpectralEstimator {
    pub fn new(
        transform: Arc<TransformAdapter>,
        block_length: usize,
        window_coherent_gain: f64,
        source_bits: u32,
    ) -> Self {
        let full_scale = (1i64 << (source_bits - 1)) as f64;
        // A coherent sine of amplitude A lands N * gain * A/2 in its bin.
        let scale = 2.0 / (block_length as f64 * window_coherent_gain * full_scale);
        Self {
            transform,
            block_length,
            scale,
        }
    }

    /// Magnitude spectrum of one windowed block.
    pub fn magnitude_spectrum(&self, windowed: &[f64]) -> Result<Vec<f64>, ReduceError> {
        debug_assert_eq!(windowed.len(), self.block_length);
        let spectrum = self.transform.forward_real(windowed)?;
        Ok(spectrum.iter().map(|c| c.norm() * self.scale).collect())
    }

    pub fn num_bins(&self) -> usize {
        self.block_length / 2 + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dsp::windows::{coherent_gain, create_window, WindowType};
    use std::f64::consts::PI;

    fn estimator(n: usize, bits: u32) -> SpectralEstimator {
        let transform = Arc::new(TransformAdapter::new(&[n]).unwrap());
        let window = create_window(n, WindowType::Hann);
        SpectralEstimator::new(transform, n, coherent_gain(&window), bits)
    }

    fn windowed_sine(n: usize, bin: usize, amplitude: f64) -> Vec<f64> {
        let window = create_window(n, WindowType::Hann);
        (0..n)
            .map(|i| amplitude * (2.0 * PI * bin as f64 * i as f64 / n as f64).sin() * window[i])
            .collect()
    }

    #[test]
    fn test_full_scale_sine_peaks_near_unity() {
        let n = 2048;
        let est = estimator(n, 16);
        let block = windowed_sine(n, 64, 32768.0);
        let mags = est.magnitude_spectrum(&block).unwrap();

        let peak = mags.iter().cloned().fold(0.0f64, f64::max);
        assert!((peak - 1.0).abs() < 0.05, "peak magnitude {peak}");
        assert_eq!(mags.len(), n / 2 + 1);
    }

    #[test]
    fn test_normalization_comparable_across_lengths() {
        let peak_of = |n: usize| {
            let est = estimator(n, 16);
            let mags = est.magnitude_spectrum(&windowed_sine(n, n / 32, 32768.0)).unwrap();
            mags.iter().cloned().fold(0.0f64, f64::max)
        };
        let p1 = peak_of(1024);
        let p2 = peak_of(4096);
        assert!((p1 - p2).abs() < 0.02, "{p1} vs {p2}");
    }

    #[test]
    fn test_silence_is_silent() {
        let est = estimator(1024, 16);
        let mags = est.magnitude_spectrum(&vec![0.0; 1024]).unwrap();
        assert!(mags.iter().all(|&m| m == 0.0));
    }
}
