//! Linear hillslope diffusion: dz/dt = D ∇²z, explicit in time.
//!
//! Flux is evaluated on the links between 4-connected node pairs,
//! `q = -D (z_b - z_a) / dx`, and the divergence accumulated per node in one
//! sweep before any elevation changes, so the update is a plain FTCS step.
//! Only core nodes are advanced. Closed nodes exchange no flux; fixed-value
//! nodes receive flux that thereby leaves the domain. Mass is conserved
//! except at open boundaries.

use crate::grid::{NodeStatus, RasterGrid};

pub struct LinearDiffuser {
    diffusivity: f64,
}

impl LinearDiffuser {
    /// `diffusivity` in m²/yr.
    pub fn new(diffusivity: f64) -> Self {
        Self { diffusivity }
    }

    pub fn diffusivity(&self) -> f64 {
        self.diffusivity
    }

    /// Von Neumann stability limit for the explicit 5-point stencil:
    /// `dt_max = dx² / (4 D)`. Infinite for zero diffusivity.
    pub fn stable_dt(&self, grid: &RasterGrid) -> f64 {
        if self.diffusivity <= 0.0 {
            return f64::INFINITY;
        }
        grid.spacing() * grid.spacing() / (4.0 * self.diffusivity)
    }

    /// Advance `z` by one explicit step of length `dt` years.
    ///
    /// The stability limit is deliberately not enforced here; that decision
    /// belongs to the driver.
    pub fn run_one_step(&self, grid: &RasterGrid, z: &mut [f64], dt: f64) {
        if self.diffusivity == 0.0 {
            return;
        }
        let dx = grid.spacing();
        let mut net = vec![0.0f64; grid.node_count()];

        // East and south links only, so each pair is visited once.
        for i in 0..grid.node_count() {
            if grid.status(i) == NodeStatus::Closed {
                continue;
            }
            for (dr, dc) in [(0isize, 1isize), (1, 0)] {
                let Some(j) = grid.offset(i, dr, dc) else {
                    continue;
                };
                if grid.status(j) == NodeStatus::Closed {
                    continue;
                }
                // q > 0 means flux from i toward j.
                let q = self.diffusivity * (z[i] - z[j]) / dx;
                net[i] -= q / dx;
                net[j] += q / dx;
            }
        }

        for i in grid.core_nodes() {
            z[i] += net[i] * dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::BoundaryConfig;
    use approx::assert_relative_eq;

    fn spike_field(grid: &RasterGrid, height: f64) -> Vec<f64> {
        let mut z = vec![0.0; grid.node_count()];
        z[grid.node_id(grid.rows() / 2, grid.cols() / 2)] = height;
        z
    }

    #[test]
    fn stable_dt_matches_ftcs_limit() {
        let grid = RasterGrid::new(5, 5, 10.0, BoundaryConfig::all_open()).unwrap();
        let d = LinearDiffuser::new(0.5);
        assert_relative_eq!(d.stable_dt(&grid), 100.0 / 2.0);
        assert_eq!(LinearDiffuser::new(0.0).stable_dt(&grid), f64::INFINITY);
    }

    #[test]
    fn closed_domain_conserves_mass() {
        let grid = RasterGrid::new(9, 9, 2.0, BoundaryConfig::all_closed()).unwrap();
        let d = LinearDiffuser::new(0.1);
        let mut z = spike_field(&grid, 100.0);
        let before: f64 = z.iter().sum();
        let dt = 0.5 * d.stable_dt(&grid);
        for _ in 0..200 {
            d.run_one_step(&grid, &mut z, dt);
        }
        let after: f64 = z.iter().sum();
        assert_relative_eq!(after, before, max_relative = 1e-12);
    }

    #[test]
    fn spike_spreads_symmetrically() {
        let grid = RasterGrid::new(9, 9, 1.0, BoundaryConfig::all_closed()).unwrap();
        let d = LinearDiffuser::new(0.2);
        let mut z = spike_field(&grid, 10.0);
        let dt = 0.5 * d.stable_dt(&grid);
        for _ in 0..20 {
            d.run_one_step(&grid, &mut z, dt);
        }
        let c = grid.node_id(4, 4);
        assert!(z[c] < 10.0, "peak must decay");
        // 4-fold symmetry around the centre (sweep order varies rounding).
        assert_relative_eq!(
            z[grid.node_id(3, 4)],
            z[grid.node_id(5, 4)],
            max_relative = 1e-12
        );
        assert_relative_eq!(
            z[grid.node_id(4, 3)],
            z[grid.node_id(4, 5)],
            max_relative = 1e-12
        );
        assert_relative_eq!(
            z[grid.node_id(3, 4)],
            z[grid.node_id(4, 3)],
            max_relative = 1e-12
        );
    }

    #[test]
    fn open_boundaries_drain_mass() {
        let grid = RasterGrid::new(7, 7, 1.0, BoundaryConfig::all_open()).unwrap();
        let d = LinearDiffuser::new(0.2);
        let mut z = spike_field(&grid, 10.0);
        let before: f64 = z.iter().sum();
        let dt = 0.5 * d.stable_dt(&grid);
        for _ in 0..500 {
            d.run_one_step(&grid, &mut z, dt);
        }
        let after: f64 = z.iter().sum();
        assert!(
            after < before * 0.1,
            "open boundaries should drain the spike: {before} -> {after}"
        );
        // Fixed-value nodes themselves never move.
        assert_eq!(z[0], 0.0);
    }
}
