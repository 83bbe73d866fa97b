//! Friction state representation
//!
//! The state consists of three components:
//! - mu: friction coefficient
//! - theta: state variable (contact aging/healing)
//! - velocity: slip velocity

use crate::params::ModelConfig;

/// State of the rate-and-state system at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrictionState {
    /// Friction coefficient
    pub mu: f64,
    /// State variable
    pub theta: f64,
    /// Slip velocity
    pub velocity: f64,
}

impl FrictionState {
    /// Create a new friction state
    pub fn new(mu: f64, theta: f64, velocity: f64) -> Self {
        Self {
            mu,
            theta,
            velocity,
        }
    }

    /// Steady sliding at the reference point: mu = mu_ref, theta = Dc/V_ref, v = V_ref
    pub fn initial(config: &ModelConfig) -> Self {
        Self {
            mu: config.mu_ref(),
            theta: config.dc() / config.v_ref(),
            velocity: config.v_ref(),
        }
    }

    /// Pack as `[mu, theta, velocity]` for array-based solvers
    pub fn to_array(self) -> [f64; 3] {
        [self.mu, self.theta, self.velocity]
    }

    pub fn from_array(y: &[f64; 3]) -> Self {
        Self::new(y[0], y[1], y[2])
    }
}
