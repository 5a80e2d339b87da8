use snafu::Snafu;

/// Errors raised by the correlation pipeline.
///
/// Every variant is a precondition violation; numeric boundary outcomes
/// (empty shells, missing threshold crossings) are reported as `NaN` or
/// `None` by the routines that produce them, not as errors.
#[derive(Debug, Snafu, PartialEq)]
pub enum FscError {
    /// Two arrays that must be correlated have different shapes
    #[snafu(display("arrays must have the same shape, got {shape_a:?} and {shape_b:?}"))]
    ShapeMismatch {
        shape_a: Vec<usize>,
        shape_b: Vec<usize>,
    },

    /// Phase shifting requires every axis length to be even
    #[snafu(display("axis {axis} has odd length {len}, phase shift requires even dimensions"))]
    OddDimension { axis: usize, len: usize },

    /// A routine requiring equal-length axes was given an anisotropic array
    #[snafu(display("input must have equal size dimensions, got {shape:?}"))]
    AnisotropicShape { shape: Vec<usize> },

    /// Shift vector component count does not match the array dimensionality
    #[snafu(display("shift vector has {got} components, array has {want} axes"))]
    ShiftDimensionMismatch { got: usize, want: usize },

    /// Requested resolution is finer than the sampling allows
    #[snafu(display("specified resolution {requested} is greater than Nyquist {nyquist}"))]
    BeyondNyquist { requested: f64, nyquist: f64 },

    /// Fourier resampling factor must be at least 1
    #[snafu(display("scale factor must be at least 1, got {factor}"))]
    InvalidFactor { factor: usize },

    /// Noise standard deviation must be finite and non-negative
    #[snafu(display("invalid noise standard deviation {sigma}"))]
    InvalidSigma { sigma: f64 },

    /// An operation was given a zero-length array
    #[snafu(display("input array is empty"))]
    EmptyInput,
}

pub type Result<T, E = FscError> = std::result::Result<T, E>;
