//! Reference fixed-step solver
//!
//! Classical fourth-order Runge-Kutta over any [`OdeSystem`]. It exists to
//! drive the solver-agnostic friction law; the recurrence in
//! [`crate::integrator`] stays the default path of the simulator.

use tracing::{debug, warn};

use crate::friction::{FrictionLaw, OdeStatus, OdeSystem};
use crate::noise::NoiseSource;
use crate::sim::{finite_sample, Simulator, Trajectory};
use crate::state::FrictionState;
use crate::RsfError;

/// Fixed-step RK4
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rk4 {
    h: f64,
}

impl Rk4 {
    pub fn new(h: f64) -> Self {
        Self { h }
    }

    /// Advance `y` from `t` to `t + h`.
    ///
    /// Returns [`OdeStatus::Failure`] if any stage evaluation fails.
    pub fn step<const N: usize, F: OdeSystem<N>>(
        &self,
        system: &F,
        t: f64,
        y: &[f64; N],
    ) -> Result<[f64; N], OdeStatus> {
        let h = self.h;
        let mut k1 = [0.0; N];
        let mut k2 = [0.0; N];
        let mut k3 = [0.0; N];
        let mut k4 = [0.0; N];
        let mut stage = [0.0; N];

        check(system.rhs(t, y, &mut k1))?;

        for i in 0..N {
            stage[i] = y[i] + 0.5 * h * k1[i];
        }
        check(system.rhs(t + 0.5 * h, &stage, &mut k2))?;

        for i in 0..N {
            stage[i] = y[i] + 0.5 * h * k2[i];
        }
        check(system.rhs(t + 0.5 * h, &stage, &mut k3))?;

        for i in 0..N {
            stage[i] = y[i] + h * k3[i];
        }
        check(system.rhs(t + h, &stage, &mut k4))?;

        let mut next = [0.0; N];
        for i in 0..N {
            next[i] = y[i] + h / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
        }

        if next.iter().all(|v| v.is_finite()) {
            Ok(next)
        } else {
            Err(OdeStatus::Failure)
        }
    }

    /// Take `steps` steps from `(t0, y0)`, calling `observe(k, t, y)` after each.
    pub fn integrate<const N: usize, F: OdeSystem<N>>(
        &self,
        system: &F,
        t0: f64,
        y0: &[f64; N],
        steps: usize,
        mut observe: impl FnMut(usize, f64, &[f64; N]),
    ) -> Result<[f64; N], RsfError> {
        let mut t = t0;
        let mut y = *y0;
        for k in 1..=steps {
            y = self
                .step(system, t, &y)
                .map_err(|_| RsfError::SolverFailure { t, step: k })?;
            t += self.h;
            observe(k, t, &y);
        }
        Ok(y)
    }
}

fn check(status: OdeStatus) -> Result<(), OdeStatus> {
    match status {
        OdeStatus::Success => Ok(()),
        OdeStatus::Failure => Err(OdeStatus::Failure),
    }
}

impl<S: NoiseSource> Simulator<S> {
    /// Integrate the friction law with RK4 on the same time grid as
    /// [`Simulator::evaluate`].
    ///
    /// `velocity` is the integrated state, `acc` its backward difference,
    /// and noise is injected exactly as in the recurrence.
    pub fn evaluate_ode(&mut self) -> Result<Trajectory, RsfError> {
        let config = self.config;
        let steps = config.num_steps();
        let dt = config.delta_t();
        let law = FrictionLaw::from_config(&config);
        let rk4 = Rk4::new(dt);

        debug!(dc = config.dc(), steps, "evaluating friction ODE with RK4");

        let mut trajectory = Trajectory::with_capacity(steps);
        let mut t = config.t_start();
        let mut state = FrictionState::initial(&config);
        trajectory.push(t, &state, 0.0, 0.0);

        for k in 1..steps {
            let y = rk4.step(&law, t, &state.to_array()).map_err(|_| {
                warn!(dc = config.dc(), step = k, t, "RK4 step failed");
                RsfError::SolverFailure { t, step: k }
            })?;
            let next = FrictionState::from_array(&y);

            let acc = finite_sample(k, "acc", (next.velocity - state.velocity) / dt)?;
            let acc_noise = finite_sample(k, "acc_noise", self.noise.apply(acc))?;
            t += dt;

            trajectory.push(t, &next, acc, acc_noise);
            state = next;
        }

        Ok(trajectory)
    }
}
