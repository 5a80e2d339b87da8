//! Fourier Shell/Ring Correlation (FSC/FRC)
//!
//! Estimates the spatial resolution of a 2-d image or 3-d volume by
//! splitting it into statistically independent halves, correlating their
//! spectra shell by shell, and locating the frequency where the averaged
//! correlation drops below a threshold.
//!
//! Pipeline: decimation strategy -> centered Fourier transforms (plus a
//! sub-pixel phase alignment for structured decimations) -> shell-wise
//! normalized cross-correlation -> averaged curve -> resolution estimate.

pub mod correlation;
pub mod curve;
pub mod error;
pub mod fft;
pub mod grid;
pub mod resolution;
pub mod split;
pub mod synth;
pub mod tracing_init;

pub use correlation::{compute_shell_correlation, radial_power_spectrum, WHITEN_UPSAMPLE_BIAS};
pub use curve::{
    interpolated_chessboard_curve, radial_spatial_frequencies, single_signal_curve, sprs_curve,
    two_signal_curve, CorrelationCurve, CurveConfig,
};
pub use error::{FscError, Result};
pub use resolution::{estimate_resolution, DEFAULT_THRESHOLD};
pub use split::{ChessboardInterpolator, RandomizedProjector, SplitScheme};
