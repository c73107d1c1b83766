//! Diagnostics derived from the current elevation and routing state.
//! Pure functions of (grid, fields); results are written back into node
//! fields and go stale as soon as the surface evolves further.

pub mod chi;
pub mod relief;
pub mod steepness;

pub use chi::compute_chi;
pub use relief::{local_relief, window_statistic};
pub use steepness::compute_steepness;
