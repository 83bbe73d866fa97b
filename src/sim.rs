//! Simulation harness
//!
//! Runs one rate-and-state configuration through the time-marching
//! recurrence and injects observation noise into the acceleration.

use tracing::{debug, warn};

use crate::integrator::RecurrenceIntegrator;
use crate::noise::{GaussianNoise, NoiseInjector, NoiseSource};
use crate::params::ModelConfig;
use crate::state::FrictionState;
use crate::RsfError;

/// Full output of one run; every series has `num_steps` entries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    pub t: Vec<f64>,
    pub mu: Vec<f64>,
    pub theta: Vec<f64>,
    pub velocity: Vec<f64>,
    /// True acceleration, backward difference of velocity
    pub acc: Vec<f64>,
    /// Acceleration with multiplicative observation noise
    pub acc_noise: Vec<f64>,
}

impl Trajectory {
    pub(crate) fn with_capacity(steps: usize) -> Self {
        Self {
            t: Vec::with_capacity(steps),
            mu: Vec::with_capacity(steps),
            theta: Vec::with_capacity(steps),
            velocity: Vec::with_capacity(steps),
            acc: Vec::with_capacity(steps),
            acc_noise: Vec::with_capacity(steps),
        }
    }

    pub(crate) fn push(&mut self, t: f64, state: &FrictionState, acc: f64, acc_noise: f64) {
        self.t.push(t);
        self.mu.push(state.mu);
        self.theta.push(state.theta);
        self.velocity.push(state.velocity);
        self.acc.push(acc);
        self.acc_noise.push(acc_noise);
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// The three series handed to plotting: `(t, acc, acc_noise)`
    pub fn outputs(&self) -> (&[f64], &[f64], &[f64]) {
        (&self.t, &self.acc, &self.acc_noise)
    }

    /// Largest |acc|
    pub fn peak_abs_acc(&self) -> f64 {
        self.acc.iter().map(|a| a.abs()).fold(0.0f64, f64::max)
    }

    /// RMS of the true acceleration
    pub fn rms_acc(&self) -> f64 {
        if self.acc.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = self.acc.iter().map(|&a| a * a).sum();
        (sum_sq / self.acc.len() as f64).sqrt()
    }
}

/// One-run simulator: configuration plus an injectable noise source
pub struct Simulator<S = GaussianNoise> {
    pub(crate) config: ModelConfig,
    pub(crate) noise: NoiseInjector<S>,
}

impl Simulator<GaussianNoise> {
    /// Simulator using the default seeded Gaussian generator.
    ///
    /// Every simulator built this way starts the same
    /// [`DEFAULT_NOISE_SEED`](crate::noise::DEFAULT_NOISE_SEED) stream, so two
    /// default runs of one configuration produce identical `acc_noise`. Pass a
    /// differently seeded generator to [`Simulator::with_noise`] for
    /// independent noise draws.
    pub fn new(config: ModelConfig) -> Self {
        Self::with_noise(config, GaussianNoise::default())
    }
}

impl<S: NoiseSource> Simulator<S> {
    pub fn with_noise(config: ModelConfig, source: S) -> Self {
        Self {
            config,
            noise: NoiseInjector::new(source),
        }
    }

    /// Relative noise amplitude (1.0 by default)
    pub fn with_noise_scale(mut self, scale: f64) -> Self {
        self.noise = self.noise.with_scale(scale);
        self
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Run the time-marching recurrence over the full time window.
    ///
    /// # Errors
    /// [`RsfError::NumericalInstability`] if a step leaves the domain of the
    /// friction law; no partial trajectory is returned.
    pub fn evaluate(&mut self) -> Result<Trajectory, RsfError> {
        let config = self.config;
        let steps = config.num_steps();
        let integrator = RecurrenceIntegrator::new(&config);
        let dt = integrator.delta_t();

        debug!(
            dc = config.dc(),
            steps,
            radiation_damping = config.radiation_damping(),
            "evaluating recurrence"
        );

        let mut trajectory = Trajectory::with_capacity(steps);
        let mut t = config.t_start();
        let mut state = FrictionState::initial(&config);
        trajectory.push(t, &state, 0.0, 0.0);

        for k in 1..steps {
            let next = integrator.step(k, t, &state).map_err(|err| {
                warn!(dc = config.dc(), step = k, %err, "recurrence aborted");
                err
            })?;

            let acc = finite_sample(k, "acc", (next.velocity - state.velocity) / dt)?;
            let acc_noise = finite_sample(k, "acc_noise", self.noise.apply(acc))?;
            t += dt;

            trajectory.push(t, &next, acc, acc_noise);
            state = next;
        }

        debug!(dc = config.dc(), steps = trajectory.len(), "recurrence complete");
        Ok(trajectory)
    }
}

/// Acceleration samples must stay finite even when the state does
pub(crate) fn finite_sample(
    step: usize,
    quantity: &'static str,
    value: f64,
) -> Result<f64, RsfError> {
    if value.is_finite() {
        return Ok(value);
    }

    warn!(step, quantity, value, "non-finite acceleration sample");
    Err(RsfError::NumericalInstability {
        step,
        quantity,
        value,
    })
}

/// Evaluate `config` once with the given noise source
pub fn evaluate<S: NoiseSource>(config: &ModelConfig, source: S) -> Result<Trajectory, RsfError> {
    Simulator::with_noise(*config, source).evaluate()
}
