//! Centered N-dimensional Fourier transforms
//!
//! The whole pipeline works on centered spectra: the zero-frequency
//! component sits at `floor(n/2)` on every axis. N-d transforms are composed
//! from 1-d FFTs applied lane-wise along each axis in turn, then rolled into
//! the centered layout.
//!
//! `phase_shift` is the Fourier-domain equivalent of a sub-pixel spatial
//! translation; it is what re-aligns two decimated sub-grids whose sampling
//! points are offset by a fraction of a pixel.

use ndarray::{ArrayD, Axis, IxDyn};
use num_complex::Complex64;
use rustfft::FftPlanner;
use std::f64::consts::PI;

use crate::error::{FscError, Result};

/// Run forward or inverse 1-d FFTs along every axis of `data`.
///
/// RustFFT does not normalize the inverse transform, so the 1/N factor is
/// applied here once over the full element count.
fn fft_all_axes(data: &mut ArrayD<Complex64>, inverse: bool) {
    let mut planner = FftPlanner::new();

    for axis in 0..data.ndim() {
        let len = data.len_of(Axis(axis));
        if len < 2 {
            continue;
        }
        let fft = if inverse {
            planner.plan_fft_inverse(len)
        } else {
            planner.plan_fft_forward(len)
        };

        // Lanes along an inner axis are strided; go through a scratch buffer.
        let mut scratch = vec![Complex64::default(); len];
        for mut lane in data.lanes_mut(Axis(axis)) {
            for (s, &v) in scratch.iter_mut().zip(lane.iter()) {
                *s = v;
            }
            fft.process(&mut scratch);
            for (v, &s) in lane.iter_mut().zip(scratch.iter()) {
                *v = s;
            }
        }
    }

    if inverse {
        let scale = 1.0 / data.len() as f64;
        data.mapv_inplace(|v| v * scale);
    }
}

/// Roll every axis so that `out[(i + amount) % n] = in[i]`.
fn roll<F>(data: &ArrayD<Complex64>, amount: F) -> ArrayD<Complex64>
where
    F: Fn(usize) -> usize,
{
    let shape: Vec<usize> = data.shape().to_vec();
    ArrayD::from_shape_fn(IxDyn(&shape), |idx| {
        let mut src = idx.clone();
        for (a, &n) in shape.iter().enumerate() {
            src[a] = (idx[a] + n - amount(n)) % n;
        }
        data[src]
    })
}

/// Move the zero-frequency component to the array center.
fn fftshift(data: &ArrayD<Complex64>) -> ArrayD<Complex64> {
    roll(data, |n| n / 2)
}

/// Undo [`fftshift`]; identical for even axis lengths.
fn ifftshift(data: &ArrayD<Complex64>) -> ArrayD<Complex64> {
    roll(data, |n| n - n / 2)
}

/// N-dimensional Fourier transform with a centered spectrum.
pub fn forward_transform(array: &ArrayD<f64>) -> ArrayD<Complex64> {
    let mut data = array.mapv(|v| Complex64::new(v, 0.0));
    fft_all_axes(&mut data, false);
    fftshift(&data)
}

/// Inverse of [`forward_transform`], keeping only the real component.
///
/// Callers are responsible for ensuring the imaginary residue is negligible
/// (it is, whenever the spectrum came from a real array and any phase shifts
/// applied were consistent with a real-valued translation).
pub fn inverse_transform(spectrum: &ArrayD<Complex64>) -> ArrayD<f64> {
    let mut data = ifftshift(spectrum);
    fft_all_axes(&mut data, true);
    data.mapv(|v| v.re)
}

/// Apply a sub-pixel translation to a centered spectrum.
///
/// Multiplies by `exp(-2*pi*i * k * s / N)` per axis, with `k` running over
/// the centered integer frequencies `[-N/2, N/2)` and `s` the matching
/// component of `shift` in fractions of a pixel.
///
/// Every axis length must be even: the centered index range is only
/// symmetric for even `N`, and all decimated sub-arrays in this crate are
/// even-sized by construction.
pub fn phase_shift(spectrum: &ArrayD<Complex64>, shift: &[f64]) -> Result<ArrayD<Complex64>> {
    let shape = spectrum.shape().to_vec();

    if shift.len() != shape.len() {
        return Err(FscError::ShiftDimensionMismatch {
            got: shift.len(),
            want: shape.len(),
        });
    }
    for (axis, &len) in shape.iter().enumerate() {
        if len % 2 != 0 {
            return Err(FscError::OddDimension { axis, len });
        }
    }

    // One phase ramp per axis; the full factor is their product.
    let ramps: Vec<Vec<Complex64>> = shape
        .iter()
        .zip(shift.iter())
        .map(|(&n, &s)| {
            (0..n)
                .map(|i| {
                    let k = i as f64 - (n / 2) as f64;
                    Complex64::from_polar(1.0, -2.0 * PI * s * k / n as f64)
                })
                .collect()
        })
        .collect();

    let shifted = ArrayD::from_shape_fn(IxDyn(&shape), |idx| {
        let mut w = Complex64::new(1.0, 0.0);
        for (a, ramp) in ramps.iter().enumerate() {
            w *= ramp[idx[a]];
        }
        w * spectrum[idx]
    });

    Ok(shifted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    fn test_image(shape: &[usize]) -> ArrayD<f64> {
        ArrayD::from_shape_fn(IxDyn(shape), |idx| {
            let mut v = 0.3;
            for a in 0..shape.len() {
                v += ((idx[a] * (a + 2)) as f64 * 0.37).sin();
            }
            v
        })
    }

    fn max_abs_diff(a: &ArrayD<f64>, b: &ArrayD<f64>) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).abs())
            .fold(0.0, f64::max)
    }

    #[test]
    fn roundtrip_recovers_input_2d() {
        let x = test_image(&[16, 16]);
        let y = inverse_transform(&forward_transform(&x));
        assert!(max_abs_diff(&x, &y) < 1e-10, "diff {}", max_abs_diff(&x, &y));
    }

    #[test]
    fn roundtrip_recovers_input_3d() {
        let x = test_image(&[8, 8, 8]);
        let y = inverse_transform(&forward_transform(&x));
        assert!(max_abs_diff(&x, &y) < 1e-10);
    }

    #[test]
    fn dc_component_lands_at_center() {
        let x = ArrayD::from_elem(IxDyn(&[8, 8]), 1.0);
        let f = forward_transform(&x);
        assert!((f[[4, 4]].re - 64.0).abs() < 1e-9);
        // everything else is zero for a constant input
        let off_center: f64 = f
            .indexed_iter()
            .filter(|(idx, _)| !(idx[0] == 4 && idx[1] == 4))
            .map(|(_, v)| v.norm())
            .fold(0.0, f64::max);
        assert!(off_center < 1e-9);
    }

    #[test]
    fn zero_shift_is_identity() {
        let f = forward_transform(&test_image(&[12, 12]));
        let g = phase_shift(&f, &[0.0, 0.0]).unwrap();
        let diff = f
            .iter()
            .zip(g.iter())
            .map(|(a, b)| (a - b).norm())
            .fold(0.0, f64::max);
        assert!(diff < 1e-12);
    }

    #[test]
    fn shifts_compose_additively() {
        let f = forward_transform(&test_image(&[12, 8]));
        let twice = phase_shift(&phase_shift(&f, &[0.5, -0.25]).unwrap(), &[0.25, 0.75]).unwrap();
        let once = phase_shift(&f, &[0.75, 0.5]).unwrap();
        let diff = twice
            .iter()
            .zip(once.iter())
            .map(|(a, b)| (a - b).norm())
            .fold(0.0, f64::max);
        assert!(diff < 1e-9, "diff {}", diff);
    }

    #[test]
    fn integer_shift_translates_samples() {
        // shifting by a whole pixel must reproduce a circular delay:
        // multiplying by exp(-2*pi*i*k*s/N) sends x[t] to x[t - s]
        let x = test_image(&[16, 16]);
        let shifted = inverse_transform(&phase_shift(&forward_transform(&x), &[1.0, 0.0]).unwrap());
        for i in 0..16 {
            for j in 0..16 {
                let expect = x[[(i + 15) % 16, j]];
                assert!((shifted[[i, j]] - expect).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn odd_dimension_is_rejected() {
        let f = forward_transform(&test_image(&[9, 8]));
        let err = phase_shift(&f, &[0.5, 0.0]).unwrap_err();
        assert_eq!(err, FscError::OddDimension { axis: 0, len: 9 });
    }

    #[test]
    fn shift_length_mismatch_is_rejected() {
        let f = forward_transform(&test_image(&[8, 8]));
        let err = phase_shift(&f, &[0.5]).unwrap_err();
        assert_eq!(err, FscError::ShiftDimensionMismatch { got: 1, want: 2 });
    }
}
