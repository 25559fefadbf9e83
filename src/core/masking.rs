//! Spreading/masking model: magnitude spectrum in, masking curve out.
//!
//! Energy at one frequency raises the effective noise floor at nearby
//! frequencies. The spread is asymmetric in the critical-band (Bark) domain:
//! masking extends further toward higher frequencies (shallow upward slope)
//! than toward lower ones (steep downward slope). The model is pure per
//! block; no history is carried.

/// Upward masking slope (toward higher frequencies), dB per Bark.
/// Classic critical-band value; replaceable tuning, not a magic constant.
pub const UPWARD_SLOPE_DB_PER_BARK: f64 = 12.0;

/// Downward masking slope (toward lower frequencies), dB per Bark.
pub const DOWNWARD_SLOPE_DB_PER_BARK: f64 = 27.0;

/// Converts a magnitude spectrum into a per-bin noise-floor estimate in dBFS.
pub struct MaskingModel {
    /// Multiplicative energy decay applied when spreading from bin `i-1` into
    /// bin `i` (forward pass).
    upward_decay: Vec<f64>,
    /// Decay when spreading from bin `i+1` into bin `i` (backward pass).
    downward_decay: Vec<f64>,
    /// Absolute-silence floor as bin energy.
    floor_energy: f64,
    floor_db: f64,
}

impl MaskingModel {
    /// `num_bins` is `block_length / 2 + 1`; `silence_floor_db` is the
    /// absolute threshold (dBFS) below which noise is never audible.
    pub fn new(num_bins: usize, block_length: usize, sample_rate: u32, silence_floor_db: f64) -> Self {
        let bin_hz = sample_rate as f64 / block_length as f64;
        let bark: Vec<f64> = (0..num_bins).map(|i| bark_of(i as f64 * bin_hz)).collect();

        let mut upward_decay = vec![1.0f64; num_bins];
        let mut downward_decay = vec![1.0f64; num_bins];
        for i in 1..num_bins {
            let dbark = bark[i] - bark[i - 1];
            upward_decay[i] = db_to_energy(-UPWARD_SLOPE_DB_PER_BARK * dbark);
            downward_decay[i - 1] = db_to_energy(-DOWNWARD_SLOPE_DB_PER_BARK * dbark);
        }

        Self {
            upward_decay,
            downward_decay,
            floor_energy: db_to_energy(silence_floor_db),
            floor_db: silence_floor_db,
        }
    }

    /// Masking curve in dBFS, one value per spectrum bin.
    ///
    /// Each bin's floor is at least its own energy (masking cannot be
    /// negative) and at least the absolute-silence floor, so fully silent
    /// blocks still yield a bounded minimum rather than an unbounded one.
    pub fn masking_curve(&self, magnitudes: &[f64]) -> Vec<f64> {
        let n = magnitudes.len();
        debug_assert_eq!(n, self.upward_decay.len());

        let energy: Vec<f64> = magnitudes.iter().map(|m| m * m).collect();
        let mut floor = energy.clone();

        // Forward pass: energy masks upward in frequency.
        let mut carry = 0.0f64;
        for i in 0..n {
            carry = (carry * self.upward_decay[i]).max(energy[i]);
            floor[i] = floor[i].max(carry);
        }

        // Backward pass: energy masks downward, more narrowly.
        carry = 0.0;
        for i in (0..n).rev() {
            carry = (carry * self.downward_decay[i]).max(energy[i]);
            floor[i] = floor[i].max(carry);
        }

        floor
            .iter()
            .map(|&e| energy_to_db(e.max(self.floor_energy)))
            .collect()
    }

    /// The configured absolute-silence floor in dBFS.
    pub fn silence_floor_db(&self) -> f64 {
        self.floor_db
    }
}

/// Frequency (Hz) to critical-band rate (Bark), Zwicker approximation.
fn bark_of(hz: f64) -> f64 {
    13.0 * (0.00076 * hz).atan() + 3.5 * ((hz / 7500.0) * (hz / 7500.0)).atan()
}

fn db_to_energy(db: f64) -> f64 {
    10.0f64.powf(db / 10.0)
}

fn energy_to_db(energy: f64) -> f64 {
    10.0 * energy.max(1e-30).log10()
}
