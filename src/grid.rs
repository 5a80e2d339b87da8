//! Radial geometry over frequency grids
//!
//! Distance grids and shell/sphere masks are pure functions of an array
//! shape. The centered spectrum convention puts the zero-frequency cell at
//! `floor(n/2)` on every axis, so distances are measured from that index.

use ndarray::{ArrayD, IxDyn};

/// Grid of rounded Euclidean distances from the array center.
///
/// Each cell holds `round(sqrt(sum((i - floor(n/2))^2)))`. Rounding to whole
/// pixels is what groups frequency cells into discrete shells; all shell
/// statistics downstream rely on it.
pub fn radial_distance_grid(shape: &[usize]) -> ArrayD<f64> {
    let center: Vec<isize> = shape.iter().map(|&n| (n / 2) as isize).collect();

    ArrayD::from_shape_fn(IxDyn(shape), |idx| {
        let mut sq = 0i64;
        for (a, &c) in center.iter().enumerate() {
            let d = idx[a] as isize - c;
            sq += (d * d) as i64;
        }
        (sq as f64).sqrt().round()
    })
}

/// Boolean mask of the shell `r - dr < distance <= r`.
///
/// Built as the XOR of two sphere fills, so consecutive integer radii with
/// `dr = 1` tile the grid without overlap or gap. Negative `r` yields an
/// empty mask.
pub fn shell_mask(grid: &ArrayD<f64>, r: f64, dr: f64) -> ArrayD<bool> {
    grid.mapv(|d| (d <= r) ^ (d <= r - dr))
}

/// Boolean mask of the solid sphere `distance <= radius`.
///
/// With `radius = None` the radius defaults to `min(shape) / 2`, the largest
/// sphere that fits the grid.
pub fn sphere_mask(grid: &ArrayD<f64>, radius: Option<f64>) -> ArrayD<bool> {
    let radius = radius.unwrap_or_else(|| {
        grid.shape()
            .iter()
            .map(|&n| (n / 2) as f64)
            .fold(f64::INFINITY, f64::min)
    });
    grid.mapv(|d| d <= radius)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_grid_center_is_zero() {
        let g = radial_distance_grid(&[8, 8]);
        assert_eq!(g[[4, 4]], 0.0);
        assert_eq!(g[[4, 5]], 1.0);
        assert_eq!(g[[5, 4]], 1.0);
        // corner of an 8x8: sqrt(16 + 16) ~ 5.66 -> 6
        assert_eq!(g[[0, 0]], 6.0);
    }

    #[test]
    fn distance_grid_reflection_symmetric_odd() {
        // odd axis length has an exact center, so reflection is exact
        let n = 9;
        let g = radial_distance_grid(&[n, n]);
        for i in 0..n {
            for j in 0..n {
                assert_eq!(g[[i, j]], g[[n - 1 - i, j]]);
                assert_eq!(g[[i, j]], g[[i, n - 1 - j]]);
            }
        }
    }

    #[test]
    fn shells_partition_the_grid() {
        let g = radial_distance_grid(&[6, 7, 6]);
        let rmax = g.iter().cloned().fold(0.0f64, f64::max) as usize;

        let mut covered = ArrayD::from_elem(g.raw_dim(), false);
        for r in 0..=rmax {
            let m = shell_mask(&g, r as f64, 1.0);
            for (c, &s) in covered.iter_mut().zip(m.iter()) {
                if s {
                    assert!(!*c, "shells overlap at r={}", r);
                    *c = true;
                }
            }
        }
        assert!(covered.iter().all(|&c| c), "shells leave gaps");
    }

    #[test]
    fn negative_radius_shell_is_empty() {
        let g = radial_distance_grid(&[4, 4]);
        let m = shell_mask(&g, -1.0, 1.0);
        assert!(m.iter().all(|&s| !s));
    }

    #[test]
    fn sphere_mask_default_radius() {
        let g = radial_distance_grid(&[8, 8]);
        let m = sphere_mask(&g, None);
        // default radius 4: center row spans the full width up to the edge
        assert!(m[[4, 4]]);
        assert!(m[[4, 0]]);
        assert!(!m[[0, 0]]);
        assert_eq!(
            m.iter().filter(|&&s| s).count(),
            g.iter().filter(|&&d| d <= 4.0).count()
        );
    }
}
