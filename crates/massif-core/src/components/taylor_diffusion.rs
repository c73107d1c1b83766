//! Nonlinear hillslope diffusion with a truncated Taylor flux expansion.
//!
//! The nonlinear transport law `q = D S / (1 - (S/Sc)²)` is expanded as
//!
//! ```text
//! q = D · S · (1 + (S/Sc)² + (S/Sc)⁴ + …)     n_terms terms
//! ```
//!
//! with `Sc` the critical slope. With `n_terms = 1` this degenerates to the
//! linear law. Because the effective diffusivity grows with slope, a single
//! caller timestep is subdivided internally into sub-steps that each respect
//! the stability limit for the current steepest link.

use crate::grid::{NodeStatus, RasterGrid};

pub struct TaylorDiffuser {
    diffusivity: f64,
    critical_slope: f64,
    n_terms: u32,
}

impl TaylorDiffuser {
    /// `diffusivity` in m²/yr; `critical_slope` is a positive gradient
    /// (rise/run); `n_terms >= 1` is the number of Taylor terms kept.
    pub fn new(diffusivity: f64, critical_slope: f64, n_terms: u32) -> Self {
        Self {
            diffusivity,
            critical_slope,
            n_terms: n_terms.max(1),
        }
    }

    /// Advance `z` by `dt` years, internally sub-stepping for stability.
    pub fn run_one_step(&self, grid: &RasterGrid, z: &mut [f64], dt: f64) {
        if self.diffusivity == 0.0 {
            return;
        }
        let mut remaining = dt;
        while remaining > 0.0 {
            let sub = self.one_substep(grid, z, remaining);
            remaining -= sub;
        }
    }

    /// Run a single explicit sub-step of at most `max_dt`, sized by the
    /// stability limit for the current slopes. Returns the sub-step taken.
    fn one_substep(&self, grid: &RasterGrid, z: &mut [f64], max_dt: f64) -> f64 {
        let dx = grid.spacing();
        let n = grid.node_count();
        let mut net = vec![0.0f64; n];
        let mut max_eff_d = self.diffusivity;

        for i in 0..n {
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
                let s = (z[i] - z[j]) / dx;
                let ratio2 = (s / self.critical_slope) * (s / self.critical_slope);

                // Flux magnitude series and its slope derivative in one pass:
                //   q     = D·S·Σ r^(2k)
                //   dq/dS = D·Σ (2k+1)·r^(2k)
                let mut series = 0.0;
                let mut deriv = 0.0;
                let mut pow = 1.0;
                for k in 0..self.n_terms {
                    series += pow;
                    deriv += (2 * k + 1) as f64 * pow;
                    pow *= ratio2;
                }

                let q = self.diffusivity * s * series;
                net[i] -= q / dx;
                net[j] += q / dx;
                max_eff_d = max_eff_d.max(self.diffusivity * deriv);
            }
        }

        let stable = dx * dx / (4.0 * max_eff_d);
        let sub = max_dt.min(stable);
        for i in grid.core_nodes() {
            z[i] += net[i] * sub;
        }
        sub
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::linear_diffusion::LinearDiffuser;
    use crate::grid::BoundaryConfig;
    use approx::assert_relative_eq;

    fn ramp(grid: &RasterGrid, rise_per_row: f64) -> Vec<f64> {
        (0..grid.node_count())
            .map(|i| grid.row_col(i).0 as f64 * rise_per_row)
            .collect()
    }

    #[test]
    fn one_term_matches_linear_law() {
        let grid = RasterGrid::new(8, 8, 2.0, BoundaryConfig::all_open()).unwrap();
        let linear = LinearDiffuser::new(0.05);
        let taylor = TaylorDiffuser::new(0.05, 0.8, 1);

        let mut za = ramp(&grid, 1.0);
        za[grid.node_id(4, 4)] += 3.0;
        let mut zb = za.clone();

        let dt = 0.5 * linear.stable_dt(&grid);
        linear.run_one_step(&grid, &mut za, dt);
        taylor.run_one_step(&grid, &mut zb, dt);

        for (a, b) in za.iter().zip(zb.iter()) {
            assert_relative_eq!(*a, *b, max_relative = 1e-12);
        }
    }

    #[test]
    fn steep_spike_decays_faster_than_linear() {
        // A 5 m spike over 1 m spacing gives link slopes of 5 with Sc = 1:
        // the higher-order terms multiply the flux, so the Taylor spike must
        // decay faster than the linear one over the same simulated time.
        let grid = RasterGrid::new(9, 9, 1.0, BoundaryConfig::all_closed()).unwrap();
        let linear = LinearDiffuser::new(0.02);
        let taylor = TaylorDiffuser::new(0.02, 1.0, 3);

        let c = grid.node_id(4, 4);
        let mut za = vec![0.0; grid.node_count()];
        za[c] = 5.0;
        let mut zb = za.clone();

        let dt = 0.5 * linear.stable_dt(&grid);
        for _ in 0..5 {
            linear.run_one_step(&grid, &mut za, dt);
            taylor.run_one_step(&grid, &mut zb, dt);
        }

        assert!(
            zb[c] < za[c],
            "nonlinear spike should decay faster: linear {} taylor {}",
            za[c],
            zb[c]
        );
    }

    #[test]
    fn substeps_conserve_mass_in_closed_domain() {
        let grid = RasterGrid::new(9, 9, 1.0, BoundaryConfig::all_closed()).unwrap();
        let taylor = TaylorDiffuser::new(0.1, 0.5, 4);
        let mut z = vec![0.0; grid.node_count()];
        z[grid.node_id(4, 4)] = 50.0; // steep spike, forces sub-stepping
        let before: f64 = z.iter().sum();
        taylor.run_one_step(&grid, &mut z, 20.0);
        let after: f64 = z.iter().sum();
        assert_relative_eq!(after, before, max_relative = 1e-12);
    }
}
