//! End-to-end pipeline tests on synthetic signals

use ndarray::{ArrayD, IxDyn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use rustyfsc::synth::{fourier_downsample, fourier_upsample, generate_noisy_data, low_pass_filter};
use rustyfsc::tracing_init::init_test_tracing;
use rustyfsc::{single_signal_curve, CurveConfig, SplitScheme, DEFAULT_THRESHOLD};

/// Band-limited random image: seeded white noise low-passed to the given
/// resolution (in pixels).
fn band_limited_image(side: usize, resolution_px: f64, seed: u64) -> ArrayD<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let white = rustyfsc::synth::generate_noise(1.0, &[side, side], 1.0, None, &mut rng).unwrap();
    low_pass_filter(&white, 1.0, resolution_px).unwrap()
}

#[test]
fn noisy_band_limited_image_resolves_below_band_edge() {
    init_test_tracing();

    // signal band-limited to 8 px, buried in white noise at SNR = 1
    let clean = band_limited_image(64, 8.0, 101);
    let mut rng = StdRng::seed_from_u64(202);
    let noisy = generate_noisy_data(&clean, 1.0, 1.0, None, None, &mut rng).unwrap();

    let config = CurveConfig {
        voxel_size: 1.0,
        scheme: SplitScheme::AxisEvenOdd,
        whiten_bias: None,
    };
    let curve = single_signal_curve(&noisy, &config, &mut rng).unwrap();

    assert_eq!(curve.len(), 32);
    assert_eq!(curve.frequencies.len(), curve.correlations.len());

    // starts near 1 in the signal band
    assert!(
        curve.correlations[1] > 0.6,
        "low-frequency shell too low: {}",
        curve.correlations[1]
    );

    // decays in trend: the signal band beats the noise-only tail
    let head: f64 = curve.correlations[1..7].iter().sum::<f64>() / 6.0;
    let tail: f64 = curve.correlations[22..32].iter().sum::<f64>() / 10.0;
    assert!(head > 0.5, "head mean {}", head);
    assert!(tail < 0.3, "tail mean {}", tail);
    assert!(head > tail + 0.3);

    // threshold crossing exists and lies between Nyquist and the box size
    let res = curve.resolution(DEFAULT_THRESHOLD).expect("finite resolution");
    assert!(res > 2.0, "resolution {} finer than Nyquist", res);
    assert!(res < 64.0, "resolution {} coarser than the field", res);
}

#[test]
fn interleaved_split_agrees_on_clean_signal() {
    init_test_tracing();

    let clean = band_limited_image(64, 8.0, 7);
    let config = CurveConfig {
        voxel_size: 1.0,
        scheme: SplitScheme::Interleaved,
        whiten_bias: None,
    };
    let mut rng = StdRng::seed_from_u64(0);
    let curve = single_signal_curve(&clean, &config, &mut rng).unwrap();

    // 64 -> 32-px sub-arrays -> 16 shells on the decimated grid
    assert_eq!(curve.len(), 16);
    // a noise-free signal correlates with itself in its band
    assert!(curve.correlations[1] > 0.9, "{}", curve.correlations[1]);
    assert!(curve.correlations[2] > 0.9, "{}", curve.correlations[2]);
}

#[test]
fn zero_volume_curves_are_all_nan() {
    init_test_tracing();

    let zeros = ArrayD::from_elem(IxDyn(&[32, 32, 32]), 0.0);
    for scheme in [
        SplitScheme::AxisEvenOdd,
        SplitScheme::Interleaved,
        SplitScheme::Chessboard,
        SplitScheme::RandomMask { draws: 2 },
    ] {
        let config = CurveConfig {
            voxel_size: 1.0,
            scheme,
            whiten_bias: None,
        };
        let mut rng = StdRng::seed_from_u64(1);
        let curve = single_signal_curve(&zeros, &config, &mut rng).unwrap();
        assert!(!curve.is_empty());
        assert!(
            curve.correlations.iter().all(|c| c.is_nan()),
            "scheme {:?} produced non-NaN values",
            scheme
        );
    }
}

#[test]
fn fourier_resampling_roundtrip_is_shape_exact() {
    init_test_tracing();

    let x = band_limited_image(32, 6.0, 33);
    let up = fourier_upsample(&x, 2, true).unwrap();
    assert_eq!(up.shape(), &[64, 64]);
    let down = fourier_downsample(&up, 2, true).unwrap();
    assert_eq!(down.shape(), x.shape());

    let max_diff = x
        .iter()
        .zip(down.iter())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0f64, f64::max);
    assert!(max_diff < 1e-9, "roundtrip deviates by {}", max_diff);
}
