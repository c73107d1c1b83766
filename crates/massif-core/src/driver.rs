//! Run configuration and the time-stepping driver.
//!
//! `RunConfig` gathers every knob the loop body reads (grid shape, timestep,
//! uplift, hillslope and fluvial process parameters) so nothing is ambient.
//! `LandscapeModel` is the explicit simulation state: it owns the grid, the
//! field store, the component instances and the run clock, and it separates
//! *continuing* a run (`run`) from *starting over* (`reset`).
//!
//! Step order, fixed (no feedback within an iteration beyond elevation):
//!   1. uplift:    add U·dt to every core node
//!   2. hillslope: linear or Taylor diffusion step
//!   3. routing:   D8 receivers + drainage area (fluvial runs only)
//!   4. incision:  implicit stream power (unless route_only)
//!   5. clock:     advance by dt

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::components::{FlowAccumulator, LinearDiffuser, StreamPowerEroder, TaylorDiffuser};
use crate::error::ModelError;
use crate::fields::{FieldStore, DRAINAGE_AREA, ELEVATION, STEEPEST_SLOPE};
use crate::grid::{BoundaryConfig, RasterGrid};

// ── Configuration ─────────────────────────────────────────────────────────────

/// Hillslope transport law.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "law", rename_all = "snake_case")]
pub enum HillslopeConfig {
    /// Linear diffusion, `q = -D S`.
    Linear { diffusivity: f64 },
    /// Taylor-expanded nonlinear diffusion, `q = -D S Σ (S/Sc)^2k`.
    Taylor {
        diffusivity: f64,
        critical_slope: f64,
        n_terms: u32,
    },
}

impl HillslopeConfig {
    fn diffusivity(&self) -> f64 {
        match *self {
            HillslopeConfig::Linear { diffusivity } => diffusivity,
            HillslopeConfig::Taylor { diffusivity, .. } => diffusivity,
        }
    }
}

/// Fluvial process parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluvialConfig {
    /// Erodibility K [yr⁻¹·m^(1−2m)].
    pub erodibility: f64,
    /// Drainage-area exponent.
    pub m: f64,
    /// Slope exponent.
    pub n: f64,
    /// Route flow and refresh derived fields without eroding.
    pub route_only: bool,
}

impl Default for FluvialConfig {
    fn default() -> Self {
        Self {
            erodibility: 1e-5,
            m: 0.5,
            n: 1.0,
            route_only: false,
        }
    }
}

/// Full run configuration.
///
/// Defaults describe the classic uplifting hillslope strip: a 41×5 grid at
/// 5 m spacing with open north/south outlets, linear diffusion and uniform
/// uplift, which reaches the parabolic steady-state profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub rows: usize,
    pub cols: usize,
    /// Node spacing [m].
    pub spacing: f64,
    pub boundaries: BoundaryConfig,
    /// Timestep [yr]. None selects the diffusive stability limit.
    pub dt: Option<f64>,
    /// Uniform uplift rate applied to core nodes [m/yr].
    pub uplift_rate: f64,
    pub hillslope: Option<HillslopeConfig>,
    pub fluvial: Option<FluvialConfig>,
    /// Amplitude [m] of the seeded random perturbation added to the initial
    /// (zero) surface on core nodes. Zero disables it.
    pub perturbation_amplitude: f64,
    pub seed: u64,
    /// Validate `dt` against the explicit-diffusion stability limit and
    /// refuse to build an unstable model. Disabling this reproduces the
    /// classic blow-up instead of an error.
    pub enforce_stable_dt: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            rows: 41,
            cols: 5,
            spacing: 5.0,
            boundaries: BoundaryConfig::open_north_south(),
            dt: None,
            uplift_rate: 1e-4,
            hillslope: Some(HillslopeConfig::Linear { diffusivity: 0.01 }),
            fluvial: None,
            perturbation_amplitude: 0.0,
            seed: 42,
            enforce_stable_dt: true,
        }
    }
}

// ── Model ─────────────────────────────────────────────────────────────────────

enum Hillslope {
    Linear(LinearDiffuser),
    Taylor(TaylorDiffuser),
}

/// Resumable simulation state: grid, fields, components and the run clock.
pub struct LandscapeModel {
    config: RunConfig,
    grid: RasterGrid,
    fields: FieldStore,
    hillslope: Option<Hillslope>,
    flow: Option<FlowAccumulator>,
    eroder: Option<StreamPowerEroder>,
    dt: f64,
    time: f64,
    steps_run: u64,
    /// Snapshot of the (possibly perturbed) initial surface, for `reset`.
    initial_elevation: Vec<f64>,
}

impl LandscapeModel {
    /// Validate `config` and build a model positioned at t = 0.
    pub fn new(config: RunConfig) -> Result<Self, ModelError> {
        let grid = RasterGrid::new(config.rows, config.cols, config.spacing, config.boundaries)?;

        if !(config.uplift_rate.is_finite() && config.uplift_rate >= 0.0) {
            return Err(ModelError::BadConfig(format!(
                "uplift rate must be finite and non-negative, got {}",
                config.uplift_rate
            )));
        }

        let hillslope = match config.hillslope {
            None => None,
            Some(h) => {
                if !(h.diffusivity().is_finite() && h.diffusivity() > 0.0) {
                    return Err(ModelError::BadConfig(format!(
                        "diffusivity must be positive, got {}",
                        h.diffusivity()
                    )));
                }
                Some(match h {
                    HillslopeConfig::Linear { diffusivity } => {
                        Hillslope::Linear(LinearDiffuser::new(diffusivity))
                    }
                    HillslopeConfig::Taylor {
                        diffusivity,
                        critical_slope,
                        n_terms,
                    } => {
                        if !(critical_slope.is_finite() && critical_slope > 0.0) {
                            return Err(ModelError::BadConfig(format!(
                                "critical slope must be positive, got {critical_slope}"
                            )));
                        }
                        Hillslope::Taylor(TaylorDiffuser::new(diffusivity, critical_slope, n_terms))
                    }
                })
            }
        };

        let (flow, eroder) = match config.fluvial {
            None => (None, None),
            Some(f) => {
                if !(f.erodibility.is_finite() && f.erodibility >= 0.0) || f.n <= 0.0 || f.m < 0.0 {
                    return Err(ModelError::BadConfig(format!(
                        "fluvial parameters out of range: K = {}, m = {}, n = {}",
                        f.erodibility, f.m, f.n
                    )));
                }
                let eroder = if f.route_only {
                    None
                } else {
                    Some(StreamPowerEroder::new(f.erodibility, f.m, f.n))
                };
                (Some(FlowAccumulator::new(&grid)), eroder)
            }
        };

        // dt: explicit value, validated; otherwise the stability limit.
        // The Taylor diffuser sub-steps internally, so only the linear law
        // constrains the caller's dt.
        let limit = match &hillslope {
            Some(Hillslope::Linear(d)) => d.stable_dt(&grid),
            _ => f64::INFINITY,
        };
        let dt = match config.dt {
            Some(v) => {
                if !(v.is_finite() && v > 0.0) {
                    return Err(ModelError::BadConfig(format!(
                        "timestep must be positive and finite, got {v}"
                    )));
                }
                if config.enforce_stable_dt && v > limit {
                    return Err(ModelError::UnstableTimestep { dt: v, limit });
                }
                v
            }
            None => {
                let fallback = match &hillslope {
                    Some(Hillslope::Linear(d)) => d.stable_dt(&grid),
                    Some(Hillslope::Taylor(_)) => {
                        let d = config.hillslope.map(|h| h.diffusivity()).unwrap_or(1.0);
                        grid.spacing() * grid.spacing() / (4.0 * d)
                    }
                    None => f64::INFINITY,
                };
                if !fallback.is_finite() {
                    return Err(ModelError::BadConfig(
                        "dt must be given when no diffusive stability limit exists".into(),
                    ));
                }
                fallback
            }
        };

        let mut fields = FieldStore::new(grid.node_count());
        fields.add_field(ELEVATION, 0.0);
        fields.add_field(DRAINAGE_AREA, 0.0);
        fields.add_field(STEEPEST_SLOPE, 0.0);

        if config.perturbation_amplitude > 0.0 {
            let mut rng = StdRng::seed_from_u64(config.seed);
            let z = fields.get_mut(ELEVATION)?;
            for i in grid.core_nodes() {
                z[i] += config.perturbation_amplitude * rng.gen::<f64>();
            }
        }
        let initial_elevation = fields.get(ELEVATION)?.to_vec();

        Ok(Self {
            config,
            grid,
            fields,
            hillslope,
            flow,
            eroder,
            dt,
            time: 0.0,
            steps_run: 0,
            initial_elevation,
        })
    }

    /// One iteration of the loop (uplift, hillslope, routing, incision, clock).
    pub fn run_one_step(&mut self) -> Result<(), ModelError> {
        let dt = self.dt;

        let uplift = self.config.uplift_rate * dt;
        if uplift > 0.0 {
            let z = self.fields.get_mut(ELEVATION)?;
            for i in self.grid.core_nodes() {
                z[i] += uplift;
            }
        }

        if let Some(h) = &self.hillslope {
            let z = self.fields.get_mut(ELEVATION)?;
            match h {
                Hillslope::Linear(d) => d.run_one_step(&self.grid, z, dt),
                Hillslope::Taylor(d) => d.run_one_step(&self.grid, z, dt),
            }
        }

        if let Some(flow) = &mut self.flow {
            flow.run_one_step(&self.grid, &mut self.fields)?;
            if let Some(eroder) = &self.eroder {
                let (z, area) = self.fields.pair_mut(ELEVATION, DRAINAGE_AREA)?;
                eroder.run_one_step(&self.grid, flow, area, z, dt);
            }
        }

        self.time += dt;
        self.steps_run += 1;
        Ok(())
    }

    /// Continue the run for `steps` iterations from the current state.
    pub fn run(&mut self, steps: u64) -> Result<(), ModelError> {
        let report = (steps / 10).max(1);
        for s in 0..steps {
            self.run_one_step()?;
            if (s + 1) % report == 0 {
                log::debug!(
                    "step {}/{steps}, t = {:.1} yr",
                    s + 1,
                    self.time
                );
            }
        }
        log::info!(
            "ran {steps} steps to t = {:.1} yr ({} steps total)",
            self.time,
            self.steps_run
        );
        Ok(())
    }

    /// Start over: restore the initial surface, zero the derived fields and
    /// the clock. The alternative to continuing with `run`.
    pub fn reset(&mut self) {
        // Fields created at construction; the unwraps cannot fire.
        self.fields
            .get_mut(ELEVATION)
            .expect("elevation field exists")
            .copy_from_slice(&self.initial_elevation);
        for name in [DRAINAGE_AREA, STEEPEST_SLOPE] {
            self.fields
                .get_mut(name)
                .expect("derived field exists")
                .fill(0.0);
        }
        self.time = 0.0;
        self.steps_run = 0;
    }

    /// Elapsed simulated time [yr].
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn steps_run(&self) -> u64 {
        self.steps_run
    }

    /// The resolved timestep [yr].
    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn grid(&self) -> &RasterGrid {
        &self.grid
    }

    pub fn fields(&self) -> &FieldStore {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut FieldStore {
        &mut self.fields
    }

    /// Routing state from the most recent step, if this run routes flow.
    pub fn flow(&self) -> Option<&FlowAccumulator> {
        self.flow.as_ref()
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Current elevation values.
    pub fn elevation(&self) -> &[f64] {
        self.fields.get(ELEVATION).expect("elevation field exists")
    }

    /// Recompute chi and steepness from the current routing state.
    /// Returns false (and computes nothing) when this run routes no flow.
    pub fn refresh_channel_metrics(
        &mut self,
        reference_area: f64,
        concavity: f64,
    ) -> Result<bool, ModelError> {
        let Some(flow) = &self.flow else {
            return Ok(false);
        };
        crate::metrics::compute_chi(&self.grid, flow, &mut self.fields, reference_area, concavity)?;
        crate::metrics::compute_steepness(&self.grid, &mut self.fields, concavity)?;
        Ok(true)
    }
}

// ── Unit tests ────────────────────────────────────────────────────────────────
