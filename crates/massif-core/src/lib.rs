//! massif-core: raster landscape-evolution modeling.
//!
//! A small toolkit for uplift / hillslope-diffusion / stream-power
//! experiments on rectangular grids:
//! - raster grid with per-node boundary status (grid module)
//! - named per-node scalar fields mutated in place (fields module)
//! - process components, each a single advance-by-dt operation: linear and
//!   Taylor nonlinear diffusion, D8 flow accumulation, implicit stream power
//!   (components module)
//! - an explicit, resumable time-stepping driver with validated
//!   configuration (driver module)
//! - channel and terrain diagnostics: chi, steepness, local relief
//!   (metrics module)
//! - ESRI ASCII grid export (export module)
//!
//! The loop is strictly sequential: each iteration's uplift and transport
//! read the previous iteration's elevation, and the elevation field has a
//! single writer throughout.

pub mod components;
pub mod driver;
pub mod error;
pub mod export;
pub mod fields;
pub mod grid;
pub mod metrics;

pub use components::{FlowAccumulator, LinearDiffuser, StreamPowerEroder, TaylorDiffuser};
pub use driver::{FluvialConfig, HillslopeConfig, LandscapeModel, RunConfig};
pub use error::ModelError;
pub use export::{export_esri_ascii, write_esri_ascii};
pub use fields::FieldStore;
pub use grid::{BoundaryConfig, EdgeStatus, NodeStatus, RasterGrid};
