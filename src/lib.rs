//! RSF - Rate-and-State Friction simulator
//!
//! Integrates a small rate-and-state friction system forward in time and
//! produces the friction coefficient (mu), the state variable (theta), the
//! slip velocity and a finite-difference acceleration series, then injects
//! multiplicative Gaussian observation noise into the acceleration.
//!
//! Two physics paths are provided and kept separate:
//! - [`integrator`]: the fast time-marching recurrence that [`Simulator::evaluate`] runs.
//! - [`friction`]: a solver-agnostic right-hand side for pluggable ODE solvers,
//!   driven by the reference RK4 in [`solver`] via [`Simulator::evaluate_ode`].

pub mod friction;
pub mod integrator;
pub mod noise;
pub mod output;
pub mod params;
pub mod sim;
pub mod solver;
pub mod state;
pub mod sweep;

use thiserror::Error;

// Re-export main types
pub use friction::{friction_rhs, FrictionLaw, FrictionParams, OdeStatus, OdeSystem};
pub use integrator::RecurrenceIntegrator;
pub use noise::{GaussianNoise, NoiseInjector, NoiseSource, ZeroNoise};
pub use params::{ModelConfig, ModelConfigBuilder};
pub use sim::{Simulator, Trajectory};
pub use solver::Rk4;
pub use state::FrictionState;
pub use sweep::{run_sweep, Scheme, SweepConfig, SweepRun};

#[derive(Debug, Error)]
pub enum RsfError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("numerical instability at step {step}: {quantity} = {value}")]
    NumericalInstability {
        step: usize,
        quantity: &'static str,
        value: f64,
    },
    #[error("right-hand side failed at t = {t} (step {step})")]
    SolverFailure { t: f64, step: usize },
    #[error("{context} length mismatch: expected {expected}, got {got}")]
    LengthMismatch {
        context: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl RsfError {
    pub fn is_numerical(&self) -> bool {
        matches!(
            self,
            RsfError::NumericalInstability { .. } | RsfError::SolverFailure { .. }
        )
    }
}
