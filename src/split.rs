//! Decimation strategies
//!
//! A strategy turns one array into two or more statistically independent
//! sub-signals, each tagged with the fractional-pixel offset its sampling
//! grid carries relative to the original. Structured decimations (even/odd,
//! interleaved) introduce half-pixel offsets that must be undone in the
//! Fourier domain before correlating; the mask-based policies (random,
//! chessboard) keep the original grid and carry a zero shift.
//!
//! Example of a 2-d interleaved split, sub-array membership by number:
//! ```text
//!  ___ ___ ___ ___
//! |_0_|_1_|_0_|_1_|
//! |_2_|_3_|_2_|_3_|
//! |_0_|_1_|_0_|_1_|
//! |_2_|_3_|_2_|_3_|
//! ```

use ndarray::{ArrayD, Axis, Slice};
use rand::{Rng, RngCore};

use crate::error::{FscError, Result};

/// Splitting policy used by the curve aggregator.
///
/// Replaces the original tool's `n_splits`/mode parameters with one tagged
/// choice; every variant produces pairs through [`split_pairs`] under the
/// same contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitScheme {
    /// Even/odd slices along one axis at a time; `d` pairs for a `d`-d
    /// array, each with a half-pixel shift along its axis.
    AxisEvenOdd,
    /// Even/odd decimation of every axis at once: `2^d` sub-arrays, every
    /// unordered pair correlated after shift alignment.
    Interleaved,
    /// Bernoulli(0.5) assignment of each element to one of two zero-filled
    /// halves, repeated `draws` times. No sub-pixel shift, but the zero
    /// filling biases the correlation floor; that bias is not corrected
    /// here.
    RandomMask { draws: usize },
    /// Partition by parity of the index sum into two zero-filled halves,
    /// correlated directly with no shift correction.
    Chessboard,
    /// Diagonal pairs of the interleaved split (offset-complementary
    /// sub-arrays), correlated directly with no shift correction.
    SubsampledChessboard,
}

/// One comparison unit: two sub-signals and the sub-pixel offset to apply
/// to `second`'s spectrum before correlating. Components are in axis order;
/// all-zero means the pair is correlated as-is.
#[derive(Debug, Clone)]
pub struct SplitPair {
    pub first: ArrayD<f64>,
    pub second: ArrayD<f64>,
    pub shift: Vec<f64>,
}

impl SplitPair {
    pub fn needs_alignment(&self) -> bool {
        self.shift.iter().any(|&s| s != 0.0)
    }
}

/// Supplies chessboard-parity images with the missing set filled by local
/// interpolation. Implemented by an external image-resampling provider.
pub trait ChessboardInterpolator {
    fn interpolate_blacks(&self, array: &ArrayD<f64>) -> ArrayD<f64>;
    fn interpolate_whites(&self, array: &ArrayD<f64>) -> ArrayD<f64>;
}

/// Supplies structure-preserving randomly shuffled copies of an input.
/// Implemented by an external randomized-projection provider.
pub trait RandomizedProjector {
    fn randomize_and_project(&self, array: &ArrayD<f64>, rng: &mut dyn RngCore) -> ArrayD<f64>;
}

fn isotropic_side(shape: &[usize]) -> Result<usize> {
    let Some(&first) = shape.first() else {
        return Err(FscError::EmptyInput);
    };
    if shape.iter().any(|&n| n != first) {
        return Err(FscError::AnisotropicShape {
            shape: shape.to_vec(),
        });
    }
    Ok(first)
}

/// Trim the length of every axis by one.
pub fn trim_edges(array: &ArrayD<f64>) -> ArrayD<f64> {
    array
        .slice_each_axis(|ax| Slice::new(0, Some(ax.len as isize - 1), 1))
        .to_owned()
}

/// Split into even- and odd-indexed slices along `axis`.
///
/// An odd-length axis loses its last index first so both halves match. The
/// odd half samples half a pixel later than the even half along `axis`.
pub fn split_even_odd(array: &ArrayD<f64>, axis: usize) -> (ArrayD<f64>, ArrayD<f64>) {
    let len = array.len_of(Axis(axis));
    let trimmed;
    let view = if len % 2 != 0 {
        trimmed = array.slice_axis(Axis(axis), Slice::new(0, Some(len as isize - 1), 1));
        trimmed
    } else {
        array.view()
    };

    let even = view
        .slice_axis(Axis(axis), Slice::new(0, None, 2))
        .to_owned();
    let odd = view
        .slice_axis(Axis(axis), Slice::new(1, None, 2))
        .to_owned();
    (even, odd)
}

/// Per-axis start offsets of sub-array `i` in the interleaved enumeration.
///
/// Axis `a` of sub-array `i` starts at bit `d-1-a` of `i`, matching the
/// row-major order in which [`split_interleaved`] emits sub-arrays.
pub fn interleave_offset(i: usize, d: usize) -> Vec<usize> {
    (0..d).map(|a| (i >> (d - 1 - a)) & 1).collect()
}

/// Sub-pixel shift between interleaved sub-arrays `i` and `j`, in fractions
/// of a decimated pixel, components in axis order.
///
/// Each unit of start-offset difference on the original grid is half a
/// pixel on the decimated grid. Antisymmetric by construction:
/// `pair_shift(i, j, d)[a] == -pair_shift(j, i, d)[a]`.
pub fn pair_shift(i: usize, j: usize, d: usize) -> Vec<f64> {
    let oi = interleave_offset(i, d);
    let oj = interleave_offset(j, d);
    oi.iter()
        .zip(oj.iter())
        .map(|(&a, &b)| (b as f64 - a as f64) * 0.5)
        .collect()
}

fn decimate(array: &ArrayD<f64>, offsets: &[usize]) -> ArrayD<f64> {
    let mut view = array.view();
    for (a, &off) in offsets.iter().enumerate() {
        view = view.slice_axis_move(Axis(a), Slice::new(off as isize, None, 2));
    }
    view.to_owned()
}

/// Decimate every axis into even/odd combinations, yielding `2^d`
/// sub-arrays of half the side length.
///
/// Requires equal-length axes. Odd side lengths are trimmed by one before
/// splitting, and the sub-arrays are trimmed again if a non-power-of-two
/// side leaves them odd; both trims keep the later phase-shift precondition
/// (even dimensions) satisfied.
pub fn split_interleaved(array: &ArrayD<f64>) -> Result<Vec<ArrayD<f64>>> {
    let side = isotropic_side(array.shape())?;

    let trimmed;
    let array = if side % 2 != 0 {
        trimmed = trim_edges(array);
        &trimmed
    } else {
        array
    };

    let d = array.ndim();
    let mut subs: Vec<ArrayD<f64>> = (0..1usize << d)
        .map(|i| decimate(array, &interleave_offset(i, d)))
        .collect();

    if subs[0].len_of(Axis(0)) % 2 != 0 {
        subs = subs.iter().map(trim_edges).collect();
    }

    Ok(subs)
}

/// Split into two zero-filled halves by an independent Bernoulli(0.5) mask.
pub fn random_split<R: Rng + ?Sized>(
    array: &ArrayD<f64>,
    rng: &mut R,
) -> (ArrayD<f64>, ArrayD<f64>) {
    let mut s1 = ArrayD::zeros(array.raw_dim());
    let mut s2 = ArrayD::zeros(array.raw_dim());
    for ((a, b), &v) in s1.iter_mut().zip(s2.iter_mut()).zip(array.iter()) {
        if rng.random::<bool>() {
            *a = v;
        } else {
            *b = v;
        }
    }
    (s1, s2)
}

/// Split into two zero-filled halves by parity of the index sum
/// (whites first, blacks second).
pub fn chessboard_split(array: &ArrayD<f64>) -> (ArrayD<f64>, ArrayD<f64>) {
    let mut whites = ArrayD::zeros(array.raw_dim());
    let mut blacks = ArrayD::zeros(array.raw_dim());
    let d = array.ndim();
    for (idx, &v) in array.indexed_iter() {
        let sum: usize = (0..d).map(|a| idx[a]).sum();
        if sum % 2 == 0 {
            whites[idx] = v;
        } else {
            blacks[idx] = v;
        }
    }
    (whites, blacks)
}

/// Produce the comparison pairs for a scheme.
///
/// `rng` is consumed only by [`SplitScheme::RandomMask`]; the other schemes
/// are deterministic. Pairs come out in a fixed canonical order
/// (`(0,1), (0,2), ...` for interleaved sub-arrays), which is the order the
/// aggregator averages in.
pub fn split_pairs<R: Rng + ?Sized>(
    array: &ArrayD<f64>,
    scheme: SplitScheme,
    rng: &mut R,
) -> Result<Vec<SplitPair>> {
    let d = array.ndim();
    if d == 0 || array.is_empty() {
        return Err(FscError::EmptyInput);
    }

    let pairs = match scheme {
        SplitScheme::AxisEvenOdd => {
            let side = isotropic_side(array.shape())?;
            // keep every axis even so the odd member can be phase-aligned
            let trimmed;
            let array = if side % 2 != 0 {
                trimmed = trim_edges(array);
                &trimmed
            } else {
                array
            };
            (0..d)
                .map(|axis| {
                    let (even, odd) = split_even_odd(array, axis);
                    let mut shift = vec![0.0; d];
                    shift[axis] = 0.5;
                    SplitPair {
                        first: even,
                        second: odd,
                        shift,
                    }
                })
                .collect()
        }
        SplitScheme::Interleaved => {
            let subs = split_interleaved(array)?;
            let m = subs.len();
            let mut pairs = Vec::with_capacity(m * (m - 1) / 2);
            for i in 0..m {
                for j in i + 1..m {
                    pairs.push(SplitPair {
                        first: subs[i].clone(),
                        second: subs[j].clone(),
                        shift: pair_shift(i, j, d),
                    });
                }
            }
            pairs
        }
        SplitScheme::RandomMask { draws } => (0..draws)
            .map(|_| {
                let (s1, s2) = random_split(array, rng);
                SplitPair {
                    first: s1,
                    second: s2,
                    shift: vec![0.0; d],
                }
            })
            .collect(),
        SplitScheme::Chessboard => {
            let (whites, blacks) = chessboard_split(array);
            vec![SplitPair {
                first: whites,
                second: blacks,
                shift: vec![0.0; d],
            }]
        }
        SplitScheme::SubsampledChessboard => {
            let subs = split_interleaved(array)?;
            let m = subs.len();
            (0..m / 2)
                .map(|i| SplitPair {
                    first: subs[i].clone(),
                    second: subs[m - 1 - i].clone(),
                    shift: vec![0.0; d],
                })
                .collect()
        }
    };

    Ok(pairs)
}
