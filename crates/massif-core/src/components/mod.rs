//! Process components. Each exposes a single advance-by-a-timestep
//! operation that mutates node fields in place; composition and ordering
//! belong to the driver.

pub mod flow;
pub mod linear_diffusion;
pub mod stream_power;
pub mod taylor_diffusion;

pub use flow::FlowAccumulator;
pub use linear_diffusion::LinearDiffuser;
pub use stream_power::StreamPowerEroder;
pub use taylor_diffusion::TaylorDiffuser;
