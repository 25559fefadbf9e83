//! Forward transform capability with a plan cache keyed by block length.
//!
//! The reduction core never knows which FFT backend sits behind this type; it
//! only relies on the capability contract: plans exist for the lengths named
//! at construction, and any request outside that set is
//! [`ReduceError::TransformUnavailable`]. Plans are `Arc`-shared and safe for
//! concurrent use by per-channel workers.

use std::collections::HashMap;
use std::sync::Arc;

use num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};

use crate::core::error::ReduceError;

/// Real-to-complex transform adapter with one cached plan per block length.
pub struct TransformAdapter {
    plans: HashMap<usize, Arc<dyn RealToComplex<f64>>>,
}

impl TransformAdapter {
    /// Plan forward transforms for the given block lengths.
    ///
    /// Lengths must be non-zero powers of two; anything else cannot be
    /// analyzed and is reported as the capability being unavailable.
    pub fn new(lengths: &[usize]) -> Result<Self, ReduceError> {
        let mut planner = RealFftPlanner::<f64>::new();
        let mut plans = HashMap::new();

        for &length in lengths {
            if length == 0 || !length.is_power_of_two() {
                return Err(ReduceError::TransformUnavailable { length });
            }
            plans.insert(length, planner.plan_fft_forward(length));
        }

        Ok(Self { plans })
    }

    /// Execute the forward real-to-complex transform for one block.
    ///
    /// Returns `input.len() / 2 + 1` complex bins. Fails with
    /// `TransformUnavailable` if no plan was made for this length.
    pub fn forward_real(&self, input: &[f64]) -> Result<Vec<Complex<f64>>, ReduceError> {
        let length = input.len();
        let plan = self
            .plans
            .get(&length)
            .ok_or(ReduceError::TransformUnavailable { length })?;

        let mut buffer = input.to_vec();
        let mut spectrum = plan.make_output_vec();
        plan.process(&mut buffer, &mut spectrum)
            .map_err(|_| ReduceError::TransformUnavailable { length })?;

        Ok(spectrum)
    }

    /// Block lengths this adapter can transform.
    pub fn planned_lengths(&self) -> Vec<usize> {
        let mut lengths: Vec<usize> = self.plans.keys().copied().collect();
        lengths.sort_unstable();
        lengths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_power_of_two() {
        assert!(matches!(
            TransformAdapter::new(&[1000]),
            Err(ReduceError::TransformUnavailable { length: 1000 })
        ));
    }

    #[test]
    fn test_unplanned_length_is_unavailable() {
        let adapter = TransformAdapter::new(&[1024]).unwrap();
        let err = adapter.forward_real(&vec![0.0; 512]).unwrap_err();
        assert!(matches!(err, ReduceError::TransformUnavailable { length: 512 }));
    }

    #[test]
    fn test_forward_real_bin_count() {
        let adapter = TransformAdapter::new(&[256]).unwrap();
        let spectrum = adapter.forward_real(&vec![0.0; 256]).unwrap();
        assert_eq!(spectrum.len(), 129);
    }

    #[test]
    fn test_dc_bin() {
        let adapter = TransformAdapter::new(&[64]).unwrap();
        let spectrum = adapter.forward_real(&vec![1.0; 64]).unwrap();
        assert!((spectrum[0].re - 64.0).abs() < 1e-9);
        assert!(spectrum[1].norm() < 1e-9);
    }
}
