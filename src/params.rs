//! Model parameters
//!
//! Physical and simulation parameters for one rate-and-state run. A
//! [`ModelConfig`] is validated once when it is built and never mutated
//! afterwards; partially configured values only exist as a
//! [`ModelConfigBuilder`].

use serde::{Deserialize, Serialize};

use crate::RsfError;

/// Validated, immutable parameters for one simulation run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ModelConfigBuilder", into = "ModelConfigBuilder")]
pub struct ModelConfig {
    a: f64,
    b: f64,
    mu_ref: f64,
    v_ref: f64,
    k1: f64,
    dc: f64,
    radiation_damping: bool,
    t_start: f64,
    t_final: f64,
    num_steps: usize,
}

impl ModelConfig {
    /// Start a builder with the reference-run defaults and the given
    /// critical slip distance.
    pub fn builder(dc: f64) -> ModelConfigBuilder {
        ModelConfigBuilder::default().dc(dc)
    }

    /// Create a validated configuration from every field at once
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        a: f64,
        b: f64,
        mu_ref: f64,
        v_ref: f64,
        k1: f64,
        dc: f64,
        radiation_damping: bool,
        t_start: f64,
        t_final: f64,
        num_steps: usize,
    ) -> Result<Self, RsfError> {
        let config = Self {
            a,
            b,
            mu_ref,
            v_ref,
            k1,
            dc,
            radiation_damping,
            t_start,
            t_final,
            num_steps,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), RsfError> {
        let finite = [
            ("a", self.a),
            ("b", self.b),
            ("mu_ref", self.mu_ref),
            ("V_ref", self.v_ref),
            ("k1", self.k1),
            ("Dc", self.dc),
            ("t_start", self.t_start),
            ("t_final", self.t_final),
        ];
        if let Some((name, value)) = finite.iter().find(|(_, value)| !value.is_finite()) {
            return Err(RsfError::InvalidConfig(format!(
                "{name} must be finite, got {value}"
            )));
        }

        if self.dc == 0.0 {
            return Err(RsfError::InvalidConfig("Dc must be non-zero".to_string()));
        }

        if self.a == 0.0 {
            return Err(RsfError::InvalidConfig("a must be non-zero".to_string()));
        }

        if self.v_ref == 0.0 {
            return Err(RsfError::InvalidConfig("V_ref must be non-zero".to_string()));
        }

        if self.num_steps < 1 {
            return Err(RsfError::InvalidConfig(
                "num_steps must be at least 1".to_string(),
            ));
        }

        if self.t_final <= self.t_start {
            return Err(RsfError::InvalidConfig(format!(
                "t_final ({}) must be greater than t_start ({})",
                self.t_final, self.t_start
            )));
        }

        let dt = self.delta_t();
        if !dt.is_finite() || dt <= 0.0 {
            return Err(RsfError::InvalidConfig(format!(
                "time step (t_final - t_start) / num_steps must be finite and positive, got {dt}"
            )));
        }

        Ok(())
    }

    pub fn a(&self) -> f64 {
        self.a
    }

    pub fn b(&self) -> f64 {
        self.b
    }

    pub fn mu_ref(&self) -> f64 {
        self.mu_ref
    }

    pub fn v_ref(&self) -> f64 {
        self.v_ref
    }

    pub fn k1(&self) -> f64 {
        self.k1
    }

    pub fn dc(&self) -> f64 {
        self.dc
    }

    pub fn radiation_damping(&self) -> bool {
        self.radiation_damping
    }

    pub fn t_start(&self) -> f64 {
        self.t_start
    }

    pub fn t_final(&self) -> f64 {
        self.t_final
    }

    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    /// Time step: (t_final - t_start) / num_steps
    pub fn delta_t(&self) -> f64 {
        (self.t_final - self.t_start) / self.num_steps as f64
    }

    /// Copy this configuration into a builder, e.g. to vary Dc across a sweep
    pub fn to_builder(&self) -> ModelConfigBuilder {
        ModelConfigBuilder::from(*self)
    }
}

/// Builder for [`ModelConfig`]
///
/// Defaults mirror the reference run. `dc` has no safe default and must be
/// supplied before [`build`](ModelConfigBuilder::build).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfigBuilder {
    pub a: f64,
    pub b: f64,
    pub mu_ref: f64,
    #[serde(rename = "V_ref", alias = "v_ref")]
    pub v_ref: f64,
    pub k1: f64,
    #[serde(rename = "Dc", alias = "dc")]
    pub dc: Option<f64>,
    pub radiation_damping: bool,
    pub t_start: f64,
    pub t_final: f64,
    pub num_steps: usize,
}

impl Default for ModelConfigBuilder {
    fn default() -> Self {
        Self {
            a: 0.011,
            b: 0.014,
            mu_ref: 0.6,
            v_ref: 1.0,
            k1: 1e-7,
            dc: None,
            radiation_damping: true,
            t_start: 0.0,
            t_final: 50.0,
            num_steps: 500,
        }
    }
}

impl ModelConfigBuilder {
    pub fn a(mut self, value: f64) -> Self {
        self.a = value;
        self
    }

    pub fn b(mut self, value: f64) -> Self {
        self.b = value;
        self
    }

    pub fn mu_ref(mut self, value: f64) -> Self {
        self.mu_ref = value;
        self
    }

    pub fn v_ref(mut self, value: f64) -> Self {
        self.v_ref = value;
        self
    }

    pub fn k1(mut self, value: f64) -> Self {
        self.k1 = value;
        self
    }

    pub fn dc(mut self, value: f64) -> Self {
        self.dc = Some(value);
        self
    }

    pub fn radiation_damping(mut self, value: bool) -> Self {
        self.radiation_damping = value;
        self
    }

    pub fn t_start(mut self, value: f64) -> Self {
        self.t_start = value;
        self
    }

    pub fn t_final(mut self, value: f64) -> Self {
        self.t_final = value;
        self
    }

    pub fn num_steps(mut self, value: usize) -> Self {
        self.num_steps = value;
        self
    }

    /// Validate and freeze the configuration
    pub fn build(self) -> Result<ModelConfig, RsfError> {
        let dc = self
            .dc
            .ok_or_else(|| RsfError::InvalidConfig("Dc must be supplied".to_string()))?;

        ModelConfig::new(
            self.a,
            self.b,
            self.mu_ref,
            self.v_ref,
            self.k1,
            dc,
            self.radiation_damping,
            self.t_start,
            self.t_final,
            self.num_steps,
        )
    }
}

impl From<ModelConfig> for ModelConfigBuilder {
    fn from(config: ModelConfig) -> Self {
        Self {
            a: config.a,
            b: config.b,
            mu_ref: config.mu_ref,
            v_ref: config.v_ref,
            k1: config.k1,
            dc: Some(config.dc),
            radiation_damping: config.radiation_damping,
            t_start: config.t_start,
            t_final: config.t_final,
            num_steps: config.num_steps,
        }
    }
}

impl TryFrom<ModelConfigBuilder> for ModelConfig {
    type Error = RsfError;

    fn try_from(builder: ModelConfigBuilder) -> Result<Self, Self::Error> {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_run() {
        let config = ModelConfig::builder(10.0).build().unwrap();
        assert_eq!(config.a(), 0.011);
        assert_eq!(config.b(), 0.014);
        assert_eq!(config.mu_ref(), 0.6);
        assert_eq!(config.v_ref(), 1.0);
        assert_eq!(config.k1(), 1e-7);
        assert_eq!(config.t_start(), 0.0);
        assert_eq!(config.t_final(), 50.0);
        assert_eq!(config.num_steps(), 500);
        assert!(config.radiation_damping());
        assert!((config.delta_t() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_missing_dc_rejected() {
        let result = ModelConfigBuilder::default().build();
        assert!(matches!(result, Err(RsfError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_dc_rejected() {
        let result = ModelConfig::builder(0.0).build();
        assert!(matches!(result, Err(RsfError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_a_rejected() {
        let result = ModelConfig::builder(10.0).a(0.0).build();
        assert!(matches!(result, Err(RsfError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_steps_rejected() {
        let result = ModelConfig::builder(10.0).num_steps(0).build();
        assert!(matches!(result, Err(RsfError::InvalidConfig(_))));
    }

    #[test]
    fn test_empty_time_window_rejected() {
        let equal = ModelConfig::builder(10.0).t_start(5.0).t_final(5.0).build();
        assert!(matches!(equal, Err(RsfError::InvalidConfig(_))));

        let reversed = ModelConfig::builder(10.0).t_start(5.0).t_final(1.0).build();
        assert!(matches!(reversed, Err(RsfError::InvalidConfig(_))));
    }

    #[test]
    fn test_degenerate_time_step_rejected() {
        // 5e-324 / 4 rounds to zero
        let underflow = ModelConfig::builder(10.0)
            .t_start(0.0)
            .t_final(5e-324)
            .num_steps(4)
            .build();
        assert!(matches!(underflow, Err(RsfError::InvalidConfig(_))));

        let overflow = ModelConfig::builder(10.0)
            .t_start(-1e308)
            .t_final(1e308)
            .build();
        assert!(matches!(overflow, Err(RsfError::InvalidConfig(_))));

        let tiny = ModelConfig::builder(10.0)
            .t_start(0.0)
            .t_final(1e-310)
            .num_steps(2)
            .build()
            .unwrap();
        assert!(tiny.delta_t() > 0.0);
    }

    #[test]
    fn test_non_finite_rejected() {
        let result = ModelConfig::builder(10.0).b(f64::NAN).build();
        assert!(matches!(result, Err(RsfError::InvalidConfig(_))));

        let result = ModelConfig::builder(f64::INFINITY).build();
        assert!(matches!(result, Err(RsfError::InvalidConfig(_))));
    }

    #[test]
    fn test_builder_round_trip() {
        let config = ModelConfig::builder(250.0).k1(0.0).num_steps(20).build().unwrap();
        let rebuilt = config.to_builder().build().unwrap();
        assert_eq!(config, rebuilt);
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: ModelConfig = toml::from_str("Dc = 100.0\nnum_steps = 10\n").unwrap();
        assert_eq!(ok.dc(), 100.0);
        assert_eq!(ok.num_steps(), 10);
        assert_eq!(ok.a(), 0.011);

        let bad: Result<ModelConfig, _> = toml::from_str("Dc = 0.0\n");
        assert!(bad.is_err());
    }
}
