//! Curve aggregation
//!
//! Drives a decimation strategy through the transform and correlation
//! kernels: split the input, transform each sub-signal, phase-align the
//! second member of every pair, correlate shell-wise, and average the
//! per-pair curves into one correlation-versus-frequency curve.
//!
//! Pair correlations are independent and run in parallel; results are
//! merged by pair index, so the average is deterministic regardless of
//! completion order.

use ndarray::ArrayD;
use rand::{Rng, RngCore};
use rayon::prelude::*;
use tracing::debug;

use crate::correlation::compute_shell_correlation;
use crate::error::{FscError, Result};
use crate::fft::{forward_transform, phase_shift};
use crate::resolution::estimate_resolution;
use crate::split::{
    split_pairs, ChessboardInterpolator, RandomizedProjector, SplitPair, SplitScheme,
};

/// A correlation-versus-spatial-frequency curve.
///
/// `frequencies` and `correlations` always have equal length; values are
/// nominally in `[-1, 1]` except where a whitening bias shifts the
/// baseline, and may be `NaN` at boundary shells.
#[derive(Debug, Clone)]
pub struct CorrelationCurve {
    pub frequencies: Vec<f64>,
    pub correlations: Vec<f64>,
}

impl CorrelationCurve {
    pub fn len(&self) -> usize {
        self.correlations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.correlations.is_empty()
    }

    /// Resolution at the first crossing of `threshold`; `None` when the
    /// curve never crosses (see [`estimate_resolution`]).
    pub fn resolution(&self, threshold: f64) -> Option<f64> {
        estimate_resolution(&self.correlations, &self.frequencies, threshold)
    }
}

/// Configuration for a single-signal correlation curve.
#[derive(Debug, Clone)]
pub struct CurveConfig {
    /// Physical size of one voxel/pixel (positive).
    pub voxel_size: f64,
    /// Decimation strategy generating the independent half-signals.
    pub scheme: SplitScheme,
    /// Bias subtracted from the cross term for pre-whitened, upsampled
    /// inputs; `None` for plain inputs.
    pub whiten_bias: Option<f64>,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            voxel_size: 1.0,
            scheme: SplitScheme::AxisEvenOdd,
            whiten_bias: None,
        }
    }
}

/// Physical spatial frequency per shell index: `k / (n * voxel)` for
/// `k = 0..n/2`.
pub fn radial_spatial_frequencies(n: usize, voxel_size: f64) -> Vec<f64> {
    (0..n / 2)
        .map(|k| k as f64 / (n as f64 * voxel_size))
        .collect()
}

/// Rescale a half-signal correlation to the full-signal estimate,
/// `c' = 2c / (1 + c)`.
///
/// Valid when each sub-signal carries half the total information (even/odd
/// and interleaved decimations). Not applied to the mask- and
/// collaborator-based schemes, whose pairs already represent
/// full-information signals.
pub fn full_signal_correction(c: f64) -> f64 {
    2.0 * c / (1.0 + c)
}

fn correlate_pair(pair: &SplitPair, rmax: usize, whiten_bias: Option<f64>) -> Result<Vec<f64>> {
    let y1 = forward_transform(&pair.first);
    let mut y2 = forward_transform(&pair.second);
    if pair.needs_alignment() {
        y2 = phase_shift(&y2, &pair.shift)?;
    }
    compute_shell_correlation(&y1, &y2, rmax, whiten_bias)
}

/// Element-wise arithmetic mean of equally long curves. `NaN` at any pair
/// propagates to the average; boundary shells stay `NaN` by design.
fn average_curves(curves: &[Vec<f64>]) -> Vec<f64> {
    let Some(first) = curves.first() else {
        return Vec::new();
    };
    let k = curves.len() as f64;
    (0..first.len())
        .map(|i| curves.iter().map(|c| c[i]).sum::<f64>() / k)
        .collect()
}

/// Compute the self-correlation curve of one signal under the configured
/// decimation scheme.
///
/// `rng` feeds the random-mask scheme only; the structured schemes are
/// deterministic and leave it untouched. A zero-draw random mask yields an
/// empty curve.
pub fn single_signal_curve<R: Rng + ?Sized>(
    array: &ArrayD<f64>,
    config: &CurveConfig,
    rng: &mut R,
) -> Result<CorrelationCurve> {
    let pairs = split_pairs(array, config.scheme, rng)?;

    let side = array
        .shape()
        .iter()
        .copied()
        .min()
        .ok_or(FscError::EmptyInput)?;

    // Shell count and frequency mapping depend on whether the pairs live on
    // the original sampling grid or on the 2x-decimated one.
    let (rmax, frequencies) = match config.scheme {
        SplitScheme::AxisEvenOdd => {
            let n = side - side % 2;
            (n / 2, radial_spatial_frequencies(n, config.voxel_size))
        }
        SplitScheme::Interleaved | SplitScheme::SubsampledChessboard => {
            let m = pairs
                .first()
                .map(|p| p.first.shape()[0])
                .unwrap_or(side / 2);
            (m / 2, radial_spatial_frequencies(m, 2.0 * config.voxel_size))
        }
        SplitScheme::RandomMask { .. } | SplitScheme::Chessboard => {
            (side / 2, radial_spatial_frequencies(side, config.voxel_size))
        }
    };

    debug!(
        scheme = ?config.scheme,
        pairs = pairs.len(),
        rmax,
        "aggregating correlation curve"
    );

    let curves: Vec<Vec<f64>> = pairs
        .par_iter()
        .map(|p| correlate_pair(p, rmax, config.whiten_bias))
        .collect::<Result<_>>()?;

    let mut averaged = average_curves(&curves);
    if matches!(
        config.scheme,
        SplitScheme::AxisEvenOdd | SplitScheme::Interleaved
    ) {
        for c in averaged.iter_mut() {
            *c = full_signal_correction(*c);
        }
    }

    let len = averaged.len().min(frequencies.len());
    Ok(CorrelationCurve {
        frequencies: frequencies[..len].to_vec(),
        correlations: averaged[..len].to_vec(),
    })
}

/// Correlation curve between two independently acquired signals (the
/// two-image FRC / two-volume FSC).
pub fn two_signal_curve(
    a: &ArrayD<f64>,
    b: &ArrayD<f64>,
    voxel_size: f64,
) -> Result<CorrelationCurve> {
    if a.shape() != b.shape() {
        return Err(FscError::ShapeMismatch {
            shape_a: a.shape().to_vec(),
            shape_b: b.shape().to_vec(),
        });
    }
    let side_min = a.shape().iter().copied().min().ok_or(FscError::EmptyInput)?;
    let side_max = a.shape().iter().copied().max().unwrap_or(side_min);

    let corr = compute_shell_correlation(
        &forward_transform(a),
        &forward_transform(b),
        side_min / 2,
        None,
    )?;
    let frequencies = radial_spatial_frequencies(side_max, voxel_size);

    let len = corr.len().min(frequencies.len());
    Ok(CorrelationCurve {
        frequencies: frequencies[..len].to_vec(),
        correlations: corr[..len].to_vec(),
    })
}

/// Curve from interpolation-filled chessboard halves supplied by an
/// external resampling provider. The two filled images live on the full
/// grid, so no shift correction and no full-signal rescaling apply.
pub fn interpolated_chessboard_curve(
    array: &ArrayD<f64>,
    interpolator: &dyn ChessboardInterpolator,
    voxel_size: f64,
) -> Result<CorrelationCurve> {
    let whites = interpolator.interpolate_whites(array);
    let blacks = interpolator.interpolate_blacks(array);
    two_signal_curve(&whites, &blacks, voxel_size)
}

/// Structure-preserving random shuffling: correlate `trials` independent
/// pairs of randomized projections and average the curves. No shift
/// correction and no full-signal rescaling; a zero trial count yields an
/// empty curve.
pub fn sprs_curve<R: Rng>(
    array: &ArrayD<f64>,
    projector: &dyn RandomizedProjector,
    trials: usize,
    voxel_size: f64,
    rng: &mut R,
) -> Result<CorrelationCurve> {
    let rng: &mut dyn RngCore = rng;

    // Projections consume the rng sequentially so runs are reproducible for
    // a given seed; only the correlations fan out.
    let pairs: Vec<(ArrayD<f64>, ArrayD<f64>)> = (0..trials)
        .map(|_| {
            (
                projector.randomize_and_project(array, rng),
                projector.randomize_and_project(array, rng),
            )
        })
        .collect();

    let side_min = array
        .shape()
        .iter()
        .copied()
        .min()
        .ok_or(FscError::EmptyInput)?;
    let side_max = array.shape().iter().copied().max().unwrap_or(side_min);
    let rmax = side_min / 2;

    let curves: Vec<Vec<f64>> = pairs
        .par_iter()
        .map(|(a, b)| {
            compute_shell_correlation(&forward_transform(a), &forward_transform(b), rmax, None)
        })
        .collect::<Result<_>>()?;

    let averaged = average_curves(&curves);
    let frequencies = radial_spatial_frequencies(side_max, voxel_size);
    let len = averaged.len().min(frequencies.len());
    Ok(CorrelationCurve {
        frequencies: frequencies[..len].to_vec(),
        correlations: averaged[..len].to_vec(),
    })
}
