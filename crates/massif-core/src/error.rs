//! Crate-wide error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid grid: {0}")]
    BadGrid(String),

    #[error("invalid configuration: {0}")]
    BadConfig(String),

    #[error("unknown field {0:?}")]
    UnknownField(String),

    #[error("field {name:?} has {got} values but the grid has {want} nodes")]
    FieldLength {
        name: String,
        got: usize,
        want: usize,
    },

    /// The supplied timestep exceeds the explicit-diffusion stability limit.
    /// Opt out with `RunConfig::enforce_stable_dt = false`.
    #[error("timestep {dt} yr exceeds the diffusive stability limit of {limit} yr")]
    UnstableTimestep { dt: f64, limit: f64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
