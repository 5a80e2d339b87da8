//! Synthetic signal utilities
//!
//! Noise generation, B-factor decay, whitening, Fourier resampling and
//! low-pass filtering. Used to build synthetic test signals with known
//! SNR and to pre/post-process measured ones before correlation.
//!
//! Every randomized routine takes the caller's generator; there is no
//! ambient RNG state, so a seeded `StdRng` reproduces a run exactly.

use ndarray::{ArrayD, IxDyn, Slice};
use num_complex::Complex64;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;

use crate::correlation::radial_power_spectrum;
use crate::curve::radial_spatial_frequencies;
use crate::error::{FscError, Result};
use crate::fft::{forward_transform, inverse_transform};
use crate::grid::{radial_distance_grid, shell_mask, sphere_mask};

/// Standard deviation of white Gaussian noise that hits the requested SNR
/// for the given signal: `sqrt(sum(x^2) / (snr * N))`.
pub fn sigma_for_snr(x: &ArrayD<f64>, snr: f64) -> f64 {
    let signal: f64 = x.iter().map(|v| v * v).sum();
    (signal / (snr * x.len() as f64)).sqrt()
}

/// Centered spatial frequencies of one axis, ascending: `(k - n/2) / (n*d)`.
fn centered_frequencies(n: usize, voxel_size: f64) -> Vec<f64> {
    (0..n)
        .map(|k| (k as f64 - (n / 2) as f64) / (n as f64 * voxel_size))
        .collect()
}

/// B-factor decay envelope over the centered frequency grid:
/// `exp(-|s|^2 * B/4)` with `|s|^2` the squared spatial frequency radius.
pub fn b_factor_envelope(shape: &[usize], voxel_size: f64, b: f64) -> ArrayD<f64> {
    let sq_freqs: Vec<Vec<f64>> = shape
        .iter()
        .map(|&n| {
            centered_frequencies(n, voxel_size)
                .into_iter()
                .map(|f| f * f)
                .collect()
        })
        .collect();

    ArrayD::from_shape_fn(IxDyn(shape), |idx| {
        let sq: f64 = sq_freqs.iter().enumerate().map(|(a, f)| f[idx[a]]).sum();
        (-sq * b / 4.0).exp()
    })
}

/// Apply B-factor decay to a real-space array in the frequency domain.
pub fn apply_b_factor(v: &ArrayD<f64>, voxel_size: f64, b: f64) -> ArrayD<f64> {
    let envelope = b_factor_envelope(v.shape(), voxel_size, b);
    let spectrum = forward_transform(v) * envelope.mapv(|g| Complex64::new(g, 0.0));
    inverse_transform(&spectrum)
}

/// Generate white Gaussian noise, optionally colored by a B-factor decay
/// (`b_noise`).
pub fn generate_noise<R: Rng + ?Sized>(
    sigma: f64,
    shape: &[usize],
    voxel_size: f64,
    b_noise: Option<f64>,
    rng: &mut R,
) -> Result<ArrayD<f64>> {
    let normal = Normal::new(0.0, sigma).map_err(|_| FscError::InvalidSigma { sigma })?;
    let eps = ArrayD::from_shape_simple_fn(IxDyn(shape), || normal.sample(rng));

    match b_noise {
        Some(b) => Ok(apply_b_factor(&eps, voxel_size, b)),
        None => Ok(eps),
    }
}

/// Synthetic measurement model: signal (optionally B-factor decayed) plus
/// Gaussian noise at the requested SNR, optionally colored.
///
/// The noise level is computed from the signal before any decay is
/// applied, matching how SNR is quoted for the undamped signal.
pub fn generate_noisy_data<R: Rng + ?Sized>(
    v: &ArrayD<f64>,
    voxel_size: f64,
    snr: f64,
    b_signal: Option<f64>,
    b_noise: Option<f64>,
    rng: &mut R,
) -> Result<ArrayD<f64>> {
    let sigma = sigma_for_snr(v, snr);
    let eps = generate_noise(sigma, v.shape(), voxel_size, b_noise, rng)?;

    let signal = match b_signal {
        Some(b) => apply_b_factor(v, voxel_size, b),
        None => v.clone(),
    };

    Ok(signal + eps)
}

/// Whiten `y` against a measured noise array: each frequency shell is
/// scaled by the inverse square root of the noise shell power.
///
/// `ratio` rescales the noise power when it was estimated from an array of
/// different size. The input is not mutated; the scaling happens on an
/// internal spectrum buffer.
pub fn whitening_transform(
    y: &ArrayD<f64>,
    noise: &ArrayD<f64>,
    rmax: usize,
    ratio: f64,
) -> ArrayD<f64> {
    let grid = radial_distance_grid(y.shape());
    let noise_raps: Vec<f64> = radial_power_spectrum(noise, rmax)
        .into_iter()
        .map(|p| p / ratio)
        .collect();

    let mut spectrum = forward_transform(y);
    for (ri, &raps) in noise_raps.iter().enumerate() {
        let scale = 1.0 / raps.sqrt();
        let mask = shell_mask(&grid, ri as f64, 1.0);
        for (w, &m) in spectrum.iter_mut().zip(mask.iter()) {
            if m {
                *w *= scale;
            }
        }
    }

    inverse_transform(&spectrum)
}

/// Upsample by zero-padding the centered spectrum (factor 2 turns 100px
/// into 200px). `rescale` renormalizes so intensities keep their scale.
pub fn fourier_upsample(array: &ArrayD<f64>, factor: usize, rescale: bool) -> Result<ArrayD<f64>> {
    if factor < 1 {
        return Err(FscError::InvalidFactor { factor });
    }

    let spectrum = forward_transform(array);
    let pad: Vec<usize> = array.shape().iter().map(|&n| n * (factor - 1) / 2).collect();
    let new_shape: Vec<usize> = array
        .shape()
        .iter()
        .zip(pad.iter())
        .map(|(&n, &p)| n + 2 * p)
        .collect();

    let mut padded = ArrayD::from_elem(IxDyn(&new_shape), Complex64::default());
    padded
        .slice_each_axis_mut(|ax| {
            let a = ax.axis.index();
            Slice::new(
                pad[a] as isize,
                Some((pad[a] + array.shape()[a]) as isize),
                1,
            )
        })
        .assign(&spectrum);

    if rescale {
        let gain = new_shape.iter().product::<usize>() as f64 / array.len() as f64;
        padded.mapv_inplace(|v| v * gain);
    }

    Ok(inverse_transform(&padded))
}

/// Downsample by cropping the centered spectrum (factor 2 turns 100px into
/// 50px). `rescale` renormalizes so intensities keep their scale.
pub fn fourier_downsample(
    array: &ArrayD<f64>,
    factor: usize,
    rescale: bool,
) -> Result<ArrayD<f64>> {
    if factor < 1 {
        return Err(FscError::InvalidFactor { factor });
    }

    let spectrum = forward_transform(array);
    let new_shape: Vec<usize> = array.shape().iter().map(|&n| n / factor).collect();

    let mut cropped = spectrum
        .slice_each_axis(|ax| {
            let a = ax.axis.index();
            let lo = (ax.len / 2 - new_shape[a] / 2) as isize;
            Slice::new(lo, Some(lo + new_shape[a] as isize), 1)
        })
        .to_owned();

    if rescale {
        let gain = new_shape.iter().product::<usize>() as f64 / array.len() as f64;
        cropped.mapv_inplace(|v| v * gain);
    }

    Ok(inverse_transform(&cropped))
}

/// Low-pass filter to the requested resolution by masking the spectrum
/// with the matching sphere.
///
/// Fails with [`FscError::BeyondNyquist`] when the requested resolution is
/// finer than the sampling supports.
pub fn low_pass_filter(
    array: &ArrayD<f64>,
    voxel_size: f64,
    resolution: f64,
) -> Result<ArrayD<f64>> {
    let n = array.shape()[0];
    let nyquist = (2.0 * n as f64 * voxel_size) / (n as f64 - 2.0);
    if resolution < nyquist {
        return Err(FscError::BeyondNyquist {
            requested: resolution,
            nyquist,
        });
    }

    let freqs = radial_spatial_frequencies(n, voxel_size);
    let radius = (1..freqs.len())
        .find(|&k| 1.0 / freqs[k] <= resolution)
        .ok_or(FscError::BeyondNyquist {
            requested: resolution,
            nyquist,
        })?;

    let grid = radial_distance_grid(array.shape());
    let mask = sphere_mask(&grid, Some(radius as f64));

    let mut spectrum = forward_transform(array);
    for (w, &m) in spectrum.iter_mut().zip(mask.iter()) {
        if !m {
            *w = Complex64::default();
        }
    }

    Ok(inverse_transform(&spectrum))
}

/// Theoretical correlation envelope of a decimation offset: the zero-order
/// Bessel function `J0(2*pi * p * |shift| * f)`, with the pixel size `p`
/// doubled for curves computed on 2x-decimated grids (`split`).
pub fn decimation_envelope(
    frequencies: &[f64],
    shift: &[f64],
    pixel_size: f64,
    split: bool,
) -> Vec<f64> {
    let norm = shift.iter().map(|s| s * s).sum::<f64>().sqrt();
    let pixel = if split { 2.0 * pixel_size } else { pixel_size };
    let scale = pixel * 2.0 * PI * norm;
    frequencies.iter().map(|&f| libm::j0(scale * f)).collect()
}
