//! Windowed statistics over node neighbourhoods, and local relief.
//!
//! The window at a node is every non-closed node within `radius` metres
//! (circular, centre included). With the `threading` feature the per-node
//! sweep runs on rayon.

use crate::grid::{NodeStatus, RasterGrid};

#[cfg(feature = "threading")]
use rayon::prelude::*;

/// Apply `stat` to the windowed values around every node.
///
/// Closed nodes yield NaN and are excluded from neighbouring windows.
/// `values` must hold one value per grid node.
pub fn window_statistic<F>(grid: &RasterGrid, values: &[f64], radius: f64, stat: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64 + Sync,
{
    assert_eq!(values.len(), grid.node_count(), "one value per node");
    let reach = (radius / grid.spacing()).floor().max(0.0) as isize;
    let r2 = radius * radius;
    let dx2 = grid.spacing() * grid.spacing();

    let one = |i: usize| -> f64 {
        if grid.status(i) == NodeStatus::Closed {
            return f64::NAN;
        }
        let mut window = Vec::with_capacity(((2 * reach + 1) * (2 * reach + 1)) as usize);
        for dr in -reach..=reach {
            for dc in -reach..=reach {
                if ((dr * dr + dc * dc) as f64) * dx2 > r2 {
                    continue;
                }
                let Some(j) = grid.offset(i, dr, dc) else {
                    continue;
                };
                if grid.status(j) == NodeStatus::Closed {
                    continue;
                }
                window.push(values[j]);
            }
        }
        stat(&window)
    };

    #[cfg(feature = "threading")]
    {
        (0..grid.node_count()).into_par_iter().map(one).collect()
    }
    #[cfg(not(feature = "threading"))]
    {
        (0..grid.node_count()).map(one).collect()
    }
}

/// Local relief: windowed (max − min) of elevation within `radius` metres.
pub fn local_relief(grid: &RasterGrid, elevation: &[f64], radius: f64) -> Vec<f64> {
    window_statistic(grid, elevation, radius, |w| {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &v in w {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        hi - lo
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::BoundaryConfig;
    use approx::assert_relative_eq;

    #[test]
    fn uniform_field_has_zero_relief() {
        let grid = RasterGrid::new(7, 7, 10.0, BoundaryConfig::all_open()).unwrap();
        let z = vec![3.0; grid.node_count()];
        let relief = local_relief(&grid, &z, 25.0);
        for (i, v) in relief.iter().enumerate() {
            assert_eq!(*v, 0.0, "node {i}");
        }
    }

    #[test]
    fn spike_dominates_windows_within_radius() {
        let grid = RasterGrid::new(9, 9, 10.0, BoundaryConfig::all_open()).unwrap();
        let mut z = vec![0.0; grid.node_count()];
        let c = grid.node_id(4, 4);
        z[c] = 7.0;

        let relief = local_relief(&grid, &z, 20.0);
        assert_relative_eq!(relief[c], 7.0);
        assert_relative_eq!(relief[grid.node_id(4, 6)], 7.0); // 20 m away
        assert_relative_eq!(relief[grid.node_id(4, 7)], 0.0); // 30 m away
    }

    #[test]
    fn window_mean_of_uniform_field_is_the_value() {
        let grid = RasterGrid::new(6, 6, 5.0, BoundaryConfig::all_open()).unwrap();
        let z = vec![2.5; grid.node_count()];
        let mean = window_statistic(&grid, &z, 12.0, |w| {
            w.iter().sum::<f64>() / w.len() as f64
        });
        for i in 0..grid.node_count() {
            assert_relative_eq!(mean[i], 2.5);
        }
    }

    #[test]
    fn closed_nodes_are_nan_and_excluded() {
        let grid = RasterGrid::new(6, 6, 10.0, BoundaryConfig::all_closed()).unwrap();
        let mut z = vec![0.0; grid.node_count()];
        // Raise the closed ring; it must not leak into interior windows.
        for i in 0..grid.node_count() {
            if grid.status(i) == NodeStatus::Closed {
                z[i] = 100.0;
            }
        }
        let relief = local_relief(&grid, &z, 10.0);
        assert!(relief[grid.node_id(0, 0)].is_nan());
        assert_eq!(relief[grid.node_id(2, 2)], 0.0);
    }
}
