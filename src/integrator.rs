//! Time-marching recurrence
//!
//! Advances `(mu, theta, velocity)` one step at a time. Only `mu` receives
//! an explicit Euler update; `theta` and `velocity` are assigned algebraic
//! expressions of the previous step instead of being integrated. This is
//! the behavioral reference for [`crate::Simulator::evaluate`] and differs
//! from integrating [`crate::friction::friction_rhs`].

use crate::friction::{
    effective_stiffness, loading_velocity, log_argument, slip_velocity_from_ratio, FrictionParams,
};
use crate::params::ModelConfig;
use crate::state::FrictionState;
use crate::RsfError;

/// Stepper for the executed recurrence
#[derive(Debug, Clone, Copy)]
pub struct RecurrenceIntegrator {
    params: FrictionParams,
    delta_t: f64,
}

impl RecurrenceIntegrator {
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            params: FrictionParams::from(config),
            delta_t: config.delta_t(),
        }
    }

    pub fn delta_t(&self) -> f64 {
        self.delta_t
    }

    /// Compute the state at `step` from the state at `step - 1`, which was
    /// reached at time `t_prev`.
    ///
    /// # Errors
    /// [`RsfError::NumericalInstability`] when the previous theta is outside
    /// the domain of the logarithm, or when the new state is not finite.
    pub fn step(
        &self,
        step: usize,
        t_prev: f64,
        prev: &FrictionState,
    ) -> Result<FrictionState, RsfError> {
        let p = &self.params;

        let ratio = log_argument(p, prev.theta).map_err(|(quantity, value)| {
            RsfError::NumericalInstability {
                step,
                quantity,
                value,
            }
        })?;

        let v = slip_velocity_from_ratio(p, prev.mu, ratio);

        // Direct assignment, not theta + dt * dtheta/dt
        let theta = 1.0 - v * prev.theta / p.dc;

        let v_l = loading_velocity(p.v_ref, t_prev);
        let kprime = effective_stiffness(p.dc);
        let mut dmu = kprime * (v_l - v);

        if p.radiation_damping {
            let dv = v / p.a * (dmu - p.b / prev.theta * theta);
            dmu -= p.k1 * dv;
        }

        let mu = prev.mu + self.delta_t * dmu;
        let velocity = v / p.a * (dmu - p.b / prev.theta * theta);

        for (quantity, value) in [("mu", mu), ("theta", theta), ("velocity", velocity)] {
            if !value.is_finite() {
                return Err(RsfError::NumericalInstability {
                    step,
                    quantity,
                    value,
                });
            }
        }

        Ok(FrictionState::new(mu, theta, velocity))
    }
}
