// tests/properties_test.rs
//
// Contract properties: margin monotonicity, boundedness, smoothness of the
// decision sequence, and shaping-filter stability over long streams.

use std::f64::consts::PI;

use wavreduce::config::{QualityPreset, ReducerConfig, ShapingCoefficients};
use wavreduce::core::{reconstruct, BitReducer, NoiseShapingQuantizer};

const SAMPLE_RATE: u32 = 44100;

fn base_config() -> ReducerConfig {
    let mut config = ReducerConfig::from_preset(QualityPreset::Standard);
    config.block_length = 1024;
    config.correction_enabled = true;
    config
}

fn xorshift_noise(len: usize, shift: u32, scale: i32) -> Vec<i32> {
    let mut state = 0x9E3779B9u32;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            ((state >> shift) as i32 - scale) % scale
        })
        .collect()
}

#[test]
fn test_increasing_margin_never_increases_reduction() {
    let samples: Vec<i32> = (0..40_000)
        .map(|i| (12000.0 * (2.0 * PI * 700.0 * i as f64 / SAMPLE_RATE as f64).sin()) as i32)
        .collect();

    let mut previous = f64::INFINITY;
    for margin in [0.0, 0.5, 1.0, 2.0, 3.0] {
        let mut config = base_config();
        config.safety_margin_bits = margin;

        let reducer = BitReducer::new(config, SAMPLE_RATE, 16).unwrap();
        let result = reducer.process_channel(&samples).unwrap();
        assert!(
            result.stats.mean_bits_removed <= previous + 1e-12,
            "margin {margin} increased reduction"
        );
        previous = result.stats.mean_bits_removed;
    }
}

#[test]
fn test_bits_removed_always_bounded() {
    for (bits, scale) in [(16u32, 20_000i32), (24, 4_000_000)] {
        let samples = xorshift_noise(50_000, 4, scale);
        let mut config = base_config();
        config.min_bits_to_keep = 1; // loosest cap: the invariant must hold alone

        let reducer = BitReducer::new(config, SAMPLE_RATE, bits).unwrap();
        let result = reducer.process_channel(&samples).unwrap();

        assert!(result.stats.max_bits_removed <= bits - 1);
        let restored = reconstruct(
            &result.output.reduced,
            result.output.correction.as_ref().unwrap(),
        );
        assert_eq!(restored, samples);
    }
}

#[test]
fn test_adjacent_decisions_respect_step_policy() {
    use std::sync::Arc;
    use wavreduce::core::dsp::transform::TransformAdapter;
    use wavreduce::core::dsp::windows::{coherent_gain, create_window, WindowType};
    use wavreduce::core::framer::BlockFramer;
    use wavreduce::core::{DecisionEngine, MaskingModel, SpectralEstimator};

    // Loud tone alternating with hard silence: upward steps must respect the
    // slew limit; downward steps are free (the conservative direction).
    let mut samples: Vec<i32> = Vec::new();
    for segment in 0..6 {
        let loud = segment % 2 == 0;
        for i in 0..8192usize {
            let v = if loud {
                (24000.0 * (2.0 * PI * 500.0 * i as f64 / SAMPLE_RATE as f64).sin()) as i32
            } else {
                0
            };
            samples.push(v);
        }
    }

    let config = base_config();
    let max_step = config.max_step_bits;

    let transform = Arc::new(TransformAdapter::new(&[config.block_length]).unwrap());
    let window = create_window(config.block_length, WindowType::Hann);
    let estimator = SpectralEstimator::new(transform, config.block_length, coherent_gain(&window), 16);
    let masking = MaskingModel::new(
        config.block_length / 2 + 1,
        config.block_length,
        SAMPLE_RATE,
        config.silence_floor_db,
    );
    let mut engine = DecisionEngine::new(16, config.block_length, &config);

    let mut last: Option<u32> = None;
    for block in BlockFramer::new(&samples, config.block_length, config.overlap_fraction) {
        let mags = estimator.magnitude_spectrum(&block.windowed).unwrap();
        let curve = masking.masking_curve(&mags);
        let bits = engine.decide(block.index, &curve).bits_to_remove;

        if let Some(prev) = last {
            assert!(
                bits <= prev + max_step,
                "block {}: decision jumped {prev} -> {bits}",
                block.index
            );
        }
        last = Some(bits);
    }
}

#[test]
fn test_shaping_state_bounded_on_long_constant_input() {
    let mut quantizer = NoiseShapingQuantizer::new(16, &ShapingCoefficients::default_weighted()).unwrap();
    let raw = vec![-20_001i32; 500_000];
    let mut reduced = Vec::with_capacity(raw.len());
    quantizer.quantize_segment(&raw, 9, &mut reduced, None);

    for e in quantizer.error_state() {
        assert!(e.is_finite(), "filter state diverged");
        assert!(e.abs() < 512.0 * 16.0, "filter state grew unbounded: {e}");
    }
    // Output stays within one step of the input throughout.
    for &r in reduced.iter().skip(10) {
        assert!((r - -20_001).abs() <= 1024, "divergent output {r}");
    }
}

#[test]
fn test_flat_and_shaped_round_trip_identically() {
    let samples = xorshift_noise(30_000, 5, 15_000);

    for shaping in [
        ShapingCoefficients::flat(),
        ShapingCoefficients::first_order(),
        ShapingCoefficients::default_weighted(),
    ] {
        let mut config = base_config();
        config.shaping = shaping;

        let reducer = BitReducer::new(config, SAMPLE_RATE, 16).unwrap();
        let result = reducer.process_channel(&samples).unwrap();
        let restored = reconstruct(
            &result.output.reduced,
            result.output.correction.as_ref().unwrap(),
        );
        assert_eq!(restored, samples);
    }
}
