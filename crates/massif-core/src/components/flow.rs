//! D8 flow routing and O(N) drainage-area accumulation.
//!
//! Each core node drains to its steepest-descent D8 neighbour
//! (drop = Δz / link distance). Fixed-value boundary nodes are base-level
//! outlets and pits are their own receivers; closed nodes take no part.
//! A topological stack (every node after its receiver) then lets drainage
//! area accumulate in a single upstream-to-downstream sweep.
//!
//! Writes `drainage_area` [m²] and `steepest_slope` [-] back into the field
//! store after each step.

use crate::error::ModelError;
use crate::fields::{FieldStore, DRAINAGE_AREA, ELEVATION, STEEPEST_SLOPE};
use crate::grid::{NodeStatus, RasterGrid, D8_OFFSETS};

pub struct FlowAccumulator {
    receiver: Vec<usize>,
    receiver_dist: Vec<f64>,
    slope: Vec<f64>,
    area: Vec<f64>,
    /// Topological order, receivers before donors.
    stack: Vec<usize>,
    // Donor adjacency in CSR form, rebuilt each step.
    donor_ptr: Vec<usize>,
    donors: Vec<usize>,
}

impl FlowAccumulator {
    pub fn new(grid: &RasterGrid) -> Self {
        let n = grid.node_count();
        Self {
            receiver: vec![0; n],
            receiver_dist: vec![0.0; n],
            slope: vec![0.0; n],
            area: vec![0.0; n],
            stack: Vec::with_capacity(n),
            donor_ptr: vec![0; n + 1],
            donors: vec![0; n],
        }
    }

    /// Route flow on the current elevation field and refresh the
    /// `drainage_area` and `steepest_slope` fields.
    pub fn run_one_step(
        &mut self,
        grid: &RasterGrid,
        fields: &mut FieldStore,
    ) -> Result<(), ModelError> {
        {
            let z = fields.get(ELEVATION)?;
            self.route(grid, z);
        }
        self.build_stack(grid);
        self.accumulate(grid);

        fields.get_mut(DRAINAGE_AREA)?.copy_from_slice(&self.area);
        fields.get_mut(STEEPEST_SLOPE)?.copy_from_slice(&self.slope);
        Ok(())
    }

    /// Receiver node id per node; self for outlets, pits, and closed nodes.
    pub fn receivers(&self) -> &[usize] {
        &self.receiver
    }

    /// Link distance to the receiver in metres (0 for self-receivers).
    pub fn receiver_distance(&self) -> &[f64] {
        &self.receiver_dist
    }

    /// Node ids in topological order, base level first.
    pub fn stack(&self) -> &[usize] {
        &self.stack
    }

    fn route(&mut self, grid: &RasterGrid, z: &[f64]) {
        for i in 0..grid.node_count() {
            self.receiver[i] = i;
            self.receiver_dist[i] = 0.0;
            self.slope[i] = 0.0;
            if !grid.is_core(i) {
                continue;
            }
            let mut best_drop = 0.0f64;
            for (k, &(dr, dc)) in D8_OFFSETS.iter().enumerate() {
                let Some(j) = grid.offset(i, dr, dc) else {
                    continue;
                };
                if grid.status(j) == NodeStatus::Closed {
                    continue;
                }
                let dist = grid.d8_distance(k);
                let drop = (z[i] - z[j]) / dist;
                if drop > best_drop {
                    best_drop = drop;
                    self.receiver[i] = j;
                    self.receiver_dist[i] = dist;
                }
            }
            self.slope[i] = best_drop;
        }
    }

    /// Breadth-first sweep from the base-level roots along donor links.
    /// Every node lands after its receiver, which is all accumulation needs.
    fn build_stack(&mut self, grid: &RasterGrid) {
        let n = grid.node_count();

        // Donor CSR: count, prefix-sum, fill.
        let counts = &mut self.donor_ptr;
        counts.iter_mut().for_each(|c| *c = 0);
        for i in 0..n {
            let r = self.receiver[i];
            if r != i {
                counts[r + 1] += 1;
            }
        }
        for i in 1..=n {
            let prev = counts[i - 1];
            counts[i] += prev;
        }
        let mut cursor: Vec<usize> = self.donor_ptr[..n].to_vec();
        for i in 0..n {
            let r = self.receiver[i];
            if r != i {
                self.donors[cursor[r]] = i;
                cursor[r] += 1;
            }
        }

        self.stack.clear();
        for i in 0..n {
            if self.receiver[i] == i && grid.status(i) != NodeStatus::Closed {
                self.stack.push(i);
            }
        }
        let mut head = 0;
        while head < self.stack.len() {
            let node = self.stack[head];
            head += 1;
            let (lo, hi) = (self.donor_ptr[node], self.donor_ptr[node + 1]);
            for k in lo..hi {
                self.stack.push(self.donors[k]);
            }
        }
    }

    fn accumulate(&mut self, grid: &RasterGrid) {
        let cell = grid.cell_area();
        for i in 0..grid.node_count() {
            self.area[i] = if grid.status(i) == NodeStatus::Closed {
                0.0
            } else {
                cell
            };
        }
        for k in (0..self.stack.len()).rev() {
            let i = self.stack[k];
            let r = self.receiver[i];
            if r != i {
                let upstream = self.area[i];
                self.area[r] += upstream;
            }
        }
    }
}
