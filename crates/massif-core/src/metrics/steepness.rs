//! Channel steepness index: ksn = S · A^θ.
//!
//! Slope-area scaling collapses to a constant ksn for graded channels, so
//! departures flag lithology or uplift contrasts.

use crate::error::ModelError;
use crate::fields::{FieldStore, DRAINAGE_AREA, STEEPEST_SLOPE, STEEPNESS_INDEX};
use crate::grid::RasterGrid;

/// Compute ksn from the current `steepest_slope` and `drainage_area` fields
/// (so flow routing must have run first) and write `steepness_index`.
/// Boundary nodes get 0.
pub fn compute_steepness(
    grid: &RasterGrid,
    fields: &mut FieldStore,
    concavity: f64,
) -> Result<(), ModelError> {
    let mut ksn = vec![0.0f64; grid.node_count()];
    {
        let slope = fields.get(STEEPEST_SLOPE)?;
        let area = fields.get(DRAINAGE_AREA)?;
        for i in grid.core_nodes() {
            ksn[i] = slope[i] * area[i].powf(concavity);
        }
    }
    fields.add_field(STEEPNESS_INDEX, 0.0).copy_from_slice(&ksn);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::FlowAccumulator;
    use crate::fields::ELEVATION;
    use crate::grid::{BoundaryConfig, EdgeStatus};
    use approx::assert_relative_eq;

    #[test]
    fn ksn_matches_slope_times_area_power() {
        let b = BoundaryConfig {
            north: EdgeStatus::Closed,
            south: EdgeStatus::Open,
            east: EdgeStatus::Closed,
            west: EdgeStatus::Closed,
        };
        let grid = RasterGrid::new(6, 3, 10.0, b).unwrap();
        let mut fields = FieldStore::new(grid.node_count());
        fields.add_field(ELEVATION, 0.0);
        fields.add_field(DRAINAGE_AREA, 0.0);
        fields.add_field(STEEPEST_SLOPE, 0.0);
        {
            let z = fields.get_mut(ELEVATION).unwrap();
            for i in 0..grid.node_count() {
                let (r, _) = grid.row_col(i);
                z[i] = (5 - r) as f64 * 2.0; // slope 0.2 toward the outlet
            }
        }
        let mut flow = FlowAccumulator::new(&grid);
        flow.run_one_step(&grid, &mut fields).unwrap();

        compute_steepness(&grid, &mut fields, 0.45).unwrap();
        let ksn = fields.get(STEEPNESS_INDEX).unwrap();
        let area = fields.get(DRAINAGE_AREA).unwrap();

        // Row 2 node: slope 0.2, area 2 cells.
        let i = grid.node_id(2, 1);
        assert_relative_eq!(area[i], 200.0);
        assert_relative_eq!(ksn[i], 0.2 * 200.0f64.powf(0.45), max_relative = 1e-12);

        // Boundary nodes carry no steepness.
        assert_eq!(ksn[grid.node_id(5, 1)], 0.0);
    }
}
