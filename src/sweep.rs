//! Critical slip distance sweep
//!
//! Runs one independent simulation per Dc value. A numerical failure in one
//! run is recorded and the sweep moves on to the next value; configuration
//! errors abort the whole sweep before any run starts.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::noise::{GaussianNoise, NoiseSource, ZeroNoise};
use crate::params::{ModelConfig, ModelConfigBuilder};
use crate::sim::{Simulator, Trajectory};
use crate::RsfError;

/// Which physics path produces the trajectory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scheme {
    /// The time-marching recurrence
    #[default]
    Recurrence,
    /// RK4 over the friction law
    Rk4,
}

impl FromStr for Scheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "recurrence" => Ok(Scheme::Recurrence),
            "rk4" | "ode" => Ok(Scheme::Rk4),
            other => Err(format!("unknown scheme '{other}' (expected recurrence or rk4)")),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Recurrence => f.write_str("recurrence"),
            Scheme::Rk4 => f.write_str("rk4"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseKind {
    #[default]
    Gaussian,
    Zero,
}

/// Sweep configuration, loadable from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Model parameters shared by every run; its Dc is ignored
    pub model: ModelConfigBuilder,
    pub dc_min: f64,
    pub dc_max: f64,
    pub num_dc: usize,
    /// Run `i` draws noise from a generator seeded with `seed + i`
    pub seed: u64,
    pub scheme: Scheme,
    pub noise: NoiseKind,
    pub noise_scale: f64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            model: ModelConfigBuilder::default(),
            dc_min: 10.0,
            dc_max: 1000.0,
            num_dc: 5,
            seed: 42,
            scheme: Scheme::Recurrence,
            noise: NoiseKind::Gaussian,
            noise_scale: 1.0,
        }
    }
}

impl SweepConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, RsfError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_path(path: &Path) -> Result<Self, RsfError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), RsfError> {
        if self.num_dc == 0 {
            return Err(RsfError::InvalidConfig(
                "num_dc must be greater than zero".to_string(),
            ));
        }

        if !self.dc_min.is_finite() || !self.dc_max.is_finite() {
            return Err(RsfError::InvalidConfig(
                "dc_min and dc_max must be finite".to_string(),
            ));
        }

        if self.dc_max < self.dc_min {
            return Err(RsfError::InvalidConfig(
                "dc_max must be greater than or equal to dc_min".to_string(),
            ));
        }

        if !self.noise_scale.is_finite() || self.noise_scale < 0.0 {
            return Err(RsfError::InvalidConfig(
                "noise_scale must be finite and non-negative".to_string(),
            ));
        }

        // Every grid point must yield a valid model
        self.model_configs().map(|_| ())
    }

    /// Linearly spaced Dc values from `dc_min` to `dc_max` inclusive
    pub fn dc_grid(&self) -> Vec<f64> {
        if self.num_dc == 1 {
            return vec![self.dc_min];
        }

        let step = (self.dc_max - self.dc_min) / (self.num_dc - 1) as f64;
        (0..self.num_dc)
            .map(|idx| self.dc_min + idx as f64 * step)
            .collect()
    }

    pub fn model_configs(&self) -> Result<Vec<ModelConfig>, RsfError> {
        self.dc_grid()
            .into_iter()
            .map(|dc| self.model.dc(dc).build())
            .collect()
    }

    fn noise_source(&self, index: usize) -> Box<dyn NoiseSource> {
        match self.noise {
            NoiseKind::Gaussian => Box::new(GaussianNoise::seeded(
                self.seed.wrapping_add(index as u64),
            )),
            NoiseKind::Zero => Box::new(ZeroNoise),
        }
    }
}

/// Outcome of one Dc value
#[derive(Debug)]
pub struct SweepRun {
    pub index: usize,
    pub dc: f64,
    pub outcome: Result<Trajectory, RsfError>,
}

impl SweepRun {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn trajectory(&self) -> Option<&Trajectory> {
        self.outcome.as_ref().ok()
    }

    pub fn status(&self) -> &'static str {
        if self.is_ok() {
            "ok"
        } else {
            "failed"
        }
    }
}

/// Run every Dc value of the sweep in order.
///
/// # Errors
/// Only configuration errors are returned; per-run numerical failures are
/// stored in [`SweepRun::outcome`].
pub fn run_sweep(config: &SweepConfig) -> Result<Vec<SweepRun>, RsfError> {
    config.validate()?;
    let models = config.model_configs()?;

    info!(
        runs = models.len(),
        scheme = %config.scheme,
        "starting Dc sweep"
    );

    let runs = models
        .into_iter()
        .enumerate()
        .map(|(index, model)| {
            let mut simulator = Simulator::with_noise(model, config.noise_source(index))
                .with_noise_scale(config.noise_scale);
            let outcome = match config.scheme {
                Scheme::Recurrence => simulator.evaluate(),
                Scheme::Rk4 => simulator.evaluate_ode(),
            };
            if let Err(err) = &outcome {
                warn!(index, dc = model.dc(), %err, "skipping Dc value");
            }
            SweepRun {
                index,
                dc: model.dc(),
                outcome,
            }
        })
        .collect();

    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid_matches_reference_driver() {
        let config = SweepConfig::default();
        assert_eq!(config.dc_grid(), vec![10.0, 257.5, 505.0, 752.5, 1000.0]);
    }

    #[test]
    fn test_single_point_grid() {
        let config = SweepConfig {
            num_dc: 1,
            dc_min: 30.0,
            dc_max: 30.0,
            ..Default::default()
        };
        assert_eq!(config.dc_grid(), vec![30.0]);
    }

    #[test]
    fn test_validate_rejects_bad_grid() {
        let empty = SweepConfig {
            num_dc: 0,
            ..Default::default()
        };
        assert!(matches!(empty.validate(), Err(RsfError::InvalidConfig(_))));

        let reversed = SweepConfig {
            dc_min: 5.0,
            dc_max: 1.0,
            ..Default::default()
        };
        assert!(reversed.validate().is_err());

        let through_zero = SweepConfig {
            dc_min: -1.0,
            dc_max: 1.0,
            num_dc: 3,
            ..Default::default()
        };
        assert!(through_zero.validate().is_err());

        let bad_model = SweepConfig {
            model: ModelConfigBuilder::default().num_steps(0),
            ..Default::default()
        };
        assert!(bad_model.validate().is_err());
    }

    #[test]
    fn test_toml_config() {
        let text = r#"
            num_dc = 3
            dc_min = 10.0
            dc_max = 30.0
            scheme = "rk4"
            noise = "zero"

            [model]
            num_steps = 50
            radiation_damping = false
        "#;
        let config = SweepConfig::from_toml_str(text).unwrap();
        assert_eq!(config.dc_grid(), vec![10.0, 20.0, 30.0]);
        assert_eq!(config.scheme, Scheme::Rk4);
        assert_eq!(config.noise, NoiseKind::Zero);
        assert_eq!(config.model.num_steps, 50);
        assert!(!config.model.radiation_damping);
        assert_eq!(config.model.a, 0.011);
    }

    #[test]
    fn test_scheme_parsing() {
        assert_eq!("RK4".parse::<Scheme>().unwrap(), Scheme::Rk4);
        assert_eq!("recurrence".parse::<Scheme>().unwrap(), Scheme::Recurrence);
        assert!("euler".parse::<Scheme>().is_err());
        assert_eq!(Scheme::Rk4.to_string(), "rk4");
    }

    #[test]
    fn test_recurrence_sweep_records_failures() {
        let runs = run_sweep(&SweepConfig::default()).unwrap();
        assert_eq!(runs.len(), 5);
        for run in &runs {
            assert!(!run.is_ok());
            assert_eq!(run.status(), "failed");
            assert!(run.outcome.as_ref().unwrap_err().is_numerical());
        }
    }

    #[test]
    fn test_rk4_sweep_completes() {
        let config = SweepConfig {
            scheme: Scheme::Rk4,
            num_dc: 3,
            model: ModelConfigBuilder::default().num_steps(200),
            ..Default::default()
        };
        let runs = run_sweep(&config).unwrap();
        assert_eq!(runs.len(), 3);
        for (idx, run) in runs.iter().enumerate() {
            assert_eq!(run.index, idx);
            let trajectory = run.trajectory().unwrap();
            assert_eq!(trajectory.len(), 200);
        }
        assert_eq!(runs[1].dc, 505.0);
    }

    #[test]
    fn test_runs_use_distinct_seeds() {
        let config = SweepConfig {
            num_dc: 2,
            dc_min: 10.0,
            dc_max: 10.0,
            model: ModelConfigBuilder::default()
                .t_start(1.0)
                .t_final(3.0)
                .num_steps(2),
            ..Default::default()
        };
        let runs = run_sweep(&config).unwrap();
        let first = runs[0].trajectory().unwrap();
        let second = runs[1].trajectory().unwrap();
        assert_eq!(first.acc, second.acc);
        assert_ne!(first.acc_noise, second.acc_noise);
    }
}
