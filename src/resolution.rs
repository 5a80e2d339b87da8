//! Resolution estimation from a correlation curve
//!
//! Finds the first threshold crossing of the averaged curve by linear
//! interpolation and reports its reciprocal as the resolution.

pub const DEFAULT_THRESHOLD: f64 = 1.0 / 7.0;

/// Estimate the resolution at the first crossing of `threshold`.
///
/// Scans the curve in ascending frequency order for the first value at or
/// below the threshold, interpolates linearly between that sample and its
/// predecessor to locate the crossing frequency `f*`, and returns `1/f*`
/// rounded to two decimals.
///
/// Returns `None` when the crossing is undefined:
/// - the curve never drops to the threshold, or
/// - the very first sample is already at or below it (no bracketing
///   segment exists, and there is no frequency band above threshold), or
/// - the interpolated crossing is not a positive finite frequency.
///
/// `NaN` samples (empty boundary shells) never compare at-or-below and are
/// skipped.
pub fn estimate_resolution(
    correlations: &[f64],
    frequencies: &[f64],
    threshold: f64,
) -> Option<f64> {
    let len = correlations.len().min(frequencies.len());
    let i = (0..len).find(|&i| correlations[i] <= threshold)?;
    if i == 0 {
        return None;
    }

    let (x1, x2) = (frequencies[i], frequencies[i - 1]);
    let (y1, y2) = (correlations[i], correlations[i - 1]);

    let m = (y2 - y1) / (x2 - x1);
    let b = y1 - m * x1;
    let crossing = (threshold - b) / m;
    if !crossing.is_finite() || crossing <= 0.0 {
        return None;
    }

    Some(((1.0 / crossing) * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolates_the_crossing() {
        let freq = [0.0, 0.1, 0.2, 0.3];
        let corr = [1.0, 0.8, 0.1, 0.0];
        // crossing of 1/7 lies between 0.1 and 0.2; 1/f* = 5.1578... -> 5.16
        let res = estimate_resolution(&corr, &freq, DEFAULT_THRESHOLD).unwrap();
        assert_eq!(res, 5.16);
    }

    #[test]
    fn no_crossing_is_undefined() {
        let freq = [0.0, 0.1, 0.2];
        let corr = [1.0, 0.9, 0.8];
        assert_eq!(estimate_resolution(&corr, &freq, DEFAULT_THRESHOLD), None);
    }

    #[test]
    fn crossing_at_first_sample_is_undefined() {
        let freq = [0.0, 0.1, 0.2];
        let corr = [0.05, 0.9, 0.8];
        assert_eq!(estimate_resolution(&corr, &freq, DEFAULT_THRESHOLD), None);
    }

    #[test]
    fn nan_boundary_shells_are_skipped() {
        let freq = [0.0, 0.1, 0.2];
        let corr = [f64::NAN, 0.9, 0.05];
        let res = estimate_resolution(&corr, &freq, DEFAULT_THRESHOLD);
        assert!(res.is_some());
    }

    #[test]
    fn exact_threshold_sample_counts_as_crossing() {
        let freq = [0.0, 0.1, 0.2];
        let corr = [1.0, DEFAULT_THRESHOLD, 0.0];
        let res = estimate_resolution(&corr, &freq, DEFAULT_THRESHOLD).unwrap();
        // crossing exactly at 0.1
        assert_eq!(res, 10.0);
    }

    #[test]
    fn empty_curve_is_undefined() {
        assert_eq!(estimate_resolution(&[], &[], DEFAULT_THRESHOLD), None);
    }
}
