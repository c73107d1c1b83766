//! Chi index: drainage-area-normalized upstream distance.
//!
//! ```text
//! χ(x) = ∫ (A₀ / A(x'))^θ dx'
//! ```
//!
//! integrated upstream from base level along flow paths, with reference area
//! `A₀` and concavity `θ`. Profiles of z against χ are linear for channels in
//! steady state under uniform uplift and erodibility, which is what makes χ a
//! useful channel diagnostic.

use crate::components::FlowAccumulator;
use crate::error::ModelError;
use crate::fields::{FieldStore, CHI_INDEX, DRAINAGE_AREA};
use crate::grid::RasterGrid;

/// Integrate χ upstream along the routing stack and write `chi_index`.
///
/// Base-level nodes and pits anchor at χ = 0. `concavity` is typically
/// m/n ≈ 0.45; `reference_area` is commonly one cell area.
pub fn compute_chi(
    grid: &RasterGrid,
    flow: &FlowAccumulator,
    fields: &mut FieldStore,
    reference_area: f64,
    concavity: f64,
) -> Result<(), ModelError> {
    let mut chi = vec![0.0f64; grid.node_count()];
    {
        let area = fields.get(DRAINAGE_AREA)?;
        // Stack order guarantees the receiver's chi is final before any donor.
        for &i in flow.stack() {
            let r = flow.receivers()[i];
            if r == i {
                continue;
            }
            let d = flow.receiver_distance()[i];
            chi[i] = chi[r] + d * (reference_area / area[i]).powf(concavity);
        }
    }
    fields.add_field(CHI_INDEX, 0.0).copy_from_slice(&chi);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::FlowAccumulator;
    use crate::fields::{ELEVATION, STEEPEST_SLOPE};
    use crate::grid::{BoundaryConfig, EdgeStatus};
    use approx::assert_relative_eq;

    /// One active south-draining column between closed walls.
    fn channel(rows: usize, dx: f64) -> (RasterGrid, FieldStore, FlowAccumulator) {
        let b = BoundaryConfig {
            north: EdgeStatus::Closed,
            south: EdgeStatus::Open,
            east: EdgeStatus::Closed,
            west: EdgeStatus::Closed,
        };
        let grid = RasterGrid::new(rows, 3, dx, b).unwrap();
        let mut fields = FieldStore::new(grid.node_count());
        fields.add_field(ELEVATION, 0.0);
        fields.add_field(DRAINAGE_AREA, 0.0);
        fields.add_field(STEEPEST_SLOPE, 0.0);
        {
            let z = fields.get_mut(ELEVATION).unwrap();
            for i in 0..grid.node_count() {
                let (r, _) = grid.row_col(i);
                z[i] = (rows - 1 - r) as f64;
            }
        }
        let mut flow = FlowAccumulator::new(&grid);
        flow.run_one_step(&grid, &mut fields).unwrap();
        (grid, fields, flow)
    }

    #[test]
    fn chain_integrates_exactly() {
        let dx = 10.0;
        let (grid, mut fields, flow) = channel(5, dx);
        let cell = grid.cell_area();
        compute_chi(&grid, &flow, &mut fields, cell, 0.5).unwrap();

        let chi = fields.get(CHI_INDEX).unwrap();
        // Column areas from the outlet up: 4, 3, 2, 1 cells.
        let outlet = grid.node_id(4, 1);
        assert_eq!(chi[outlet], 0.0);

        let c3 = dx * (1.0f64 / 3.0).sqrt();
        let c2 = c3 + dx * (1.0f64 / 2.0).sqrt();
        let c1 = c2 + dx;
        assert_relative_eq!(chi[grid.node_id(3, 1)], c3, max_relative = 1e-12);
        assert_relative_eq!(chi[grid.node_id(2, 1)], c2, max_relative = 1e-12);
        assert_relative_eq!(chi[grid.node_id(1, 1)], c1, max_relative = 1e-12);
    }

    #[test]
    fn chi_grows_monotonically_upstream() {
        let (grid, mut fields, flow) = channel(12, 5.0);
        compute_chi(&grid, &flow, &mut fields, grid.cell_area(), 0.45).unwrap();
        let chi = fields.get(CHI_INDEX).unwrap();
        for &i in flow.stack() {
            let r = flow.receivers()[i];
            assert!(chi[i] >= chi[r], "chi must not decrease downstream");
        }
    }
}
