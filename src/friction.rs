//! Rate-and-state friction law
//!
//! Instantaneous derivatives of `(mu, theta, velocity)` in a solver-agnostic
//! shape. This is the textbook ODE form of the model; the executed
//! recurrence in [`crate::integrator`] substitutes algebraic values for some
//! of these quantities and is deliberately kept separate.

use crate::params::ModelConfig;

/// Decay time of the loading perturbation [s]
pub const LOADING_DECAY: f64 = 20.0;
/// Angular frequency of the loading perturbation [rad/s]
pub const LOADING_FREQUENCY: f64 = 10.0;
/// Numerator of the effective stiffness, kprime = STIFFNESS_SCALE / Dc
pub const STIFFNESS_SCALE: f64 = 1e-2 * 10.0;

/// Outcome of one right-hand-side evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OdeStatus {
    Success,
    /// The state left the domain of the law (non-positive theta or log
    /// argument) or produced a non-finite derivative
    Failure,
}

impl OdeStatus {
    pub fn is_success(self) -> bool {
        self == OdeStatus::Success
    }
}

/// Right-hand side `dy/dt = f(t, y)` usable by any step-based or adaptive solver
pub trait OdeSystem<const N: usize> {
    fn rhs(&self, t: f64, y: &[f64; N], dydt: &mut [f64; N]) -> OdeStatus;
}

/// Parameters consumed by the friction law
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrictionParams {
    pub v_ref: f64,
    pub a: f64,
    pub b: f64,
    pub dc: f64,
    pub mu_ref: f64,
    pub radiation_damping: bool,
    pub k1: f64,
}

impl FrictionParams {
    /// Pack as `[V_ref, a, b, Dc, mu_ref, radiation_damping, k1]`, with the
    /// flag encoded as 0.0 / 1.0. This is the layout external ODE callbacks
    /// receive as their opaque parameter block.
    pub fn to_array(&self) -> [f64; 7] {
        [
            self.v_ref,
            self.a,
            self.b,
            self.dc,
            self.mu_ref,
            if self.radiation_damping { 1.0 } else { 0.0 },
            self.k1,
        ]
    }

    /// Unpack the layout produced by [`to_array`](Self::to_array); any
    /// non-zero flag enables radiation damping.
    pub fn from_array(params: &[f64; 7]) -> Self {
        Self {
            v_ref: params[0],
            a: params[1],
            b: params[2],
            dc: params[3],
            mu_ref: params[4],
            radiation_damping: params[5] != 0.0,
            k1: params[6],
        }
    }
}

impl From<&ModelConfig> for FrictionParams {
    fn from(config: &ModelConfig) -> Self {
        Self {
            v_ref: config.v_ref(),
            a: config.a(),
            b: config.b(),
            dc: config.dc(),
            mu_ref: config.mu_ref(),
            radiation_damping: config.radiation_damping(),
            k1: config.k1(),
        }
    }
}

/// Imposed loading velocity: V_ref * (1 + exp(-t/20) * sin(10 t))
pub fn loading_velocity(v_ref: f64, t: f64) -> f64 {
    v_ref * (1.0 + (-t / LOADING_DECAY).exp() * (LOADING_FREQUENCY * t).sin())
}

/// Effective spring stiffness
pub fn effective_stiffness(dc: f64) -> f64 {
    STIFFNESS_SCALE / dc
}

/// Validate theta ahead of `ln(V_ref * theta / Dc)` and `b / theta`.
///
/// Returns the log argument, or the offending quantity and its value.
pub(crate) fn log_argument(
    params: &FrictionParams,
    theta: f64,
) -> Result<f64, (&'static str, f64)> {
    if !(theta > 0.0) {
        return Err(("theta", theta));
    }
    let ratio = params.v_ref * theta / params.dc;
    if !(ratio > 0.0) || !ratio.is_finite() {
        return Err(("V_ref*theta/Dc", ratio));
    }
    Ok(ratio)
}

/// Slip velocity from the rate-state law given an already validated log argument
pub(crate) fn slip_velocity_from_ratio(params: &FrictionParams, mu: f64, ratio: f64) -> f64 {
    let exponent = (mu - params.mu_ref - params.b * ratio.ln()) / params.a;
    params.v_ref * exponent.exp()
}

/// Slip velocity v = V_ref * exp((mu - mu_ref - b ln(V_ref theta / Dc)) / a).
///
/// Returns `None` when theta is outside the domain of the law.
pub fn slip_velocity(params: &FrictionParams, mu: f64, theta: f64) -> Option<f64> {
    let ratio = log_argument(params, theta).ok()?;
    Some(slip_velocity_from_ratio(params, mu, ratio))
}

/// Derivatives of `[mu, theta, velocity]` at time `t`.
///
/// With radiation damping, exactly one correction pass is applied:
/// `dmu -= k1 * dv`, then `dv` is recomputed once from the corrected `dmu`.
pub fn friction_rhs(t: f64, y: &[f64; 3], params: &FrictionParams) -> ([f64; 3], OdeStatus) {
    let [mu, theta, _] = *y;
    let mut dydt = [0.0; 3];

    let ratio = match log_argument(params, theta) {
        Ok(ratio) => ratio,
        Err(_) => return (dydt, OdeStatus::Failure),
    };

    let kprime = effective_stiffness(params.dc);
    let v_l = loading_velocity(params.v_ref, t);
    let v = slip_velocity_from_ratio(params, mu, ratio);

    let dtheta = 1.0 - v * theta / params.dc;
    let mut dmu = kprime * (v_l - v);
    let mut dv = v / params.a * (dmu - params.b / theta * dtheta);

    if params.radiation_damping {
        dmu -= params.k1 * dv;
        dv = v / params.a * (dmu - params.b / theta * dtheta);
    }

    dydt[0] = dmu;
    dydt[1] = dtheta;
    dydt[2] = dv;

    if dydt.iter().all(|d| d.is_finite()) {
        (dydt, OdeStatus::Success)
    } else {
        (dydt, OdeStatus::Failure)
    }
}

/// The friction law bound to a parameter set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrictionLaw {
    params: FrictionParams,
}

impl FrictionLaw {
    pub fn new(params: FrictionParams) -> Self {
        Self { params }
    }

    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(FrictionParams::from(config))
    }

    pub fn params(&self) -> &FrictionParams {
        &self.params
    }
}

impl OdeSystem<3> for FrictionLaw {
    fn rhs(&self, t: f64, y: &[f64; 3], dydt: &mut [f64; 3]) -> OdeStatus {
        let (derivatives, status) = friction_rhs(t, y, &self.params);
        *dydt = derivatives;
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn params(radiation_damping: bool, k1: f64) -> FrictionParams {
        FrictionParams {
            v_ref: 1.0,
            a: 0.011,
            b: 0.014,
            dc: 10.0,
            mu_ref: 0.6,
            radiation_damping,
            k1,
        }
    }

    #[test]
    fn test_loading_velocity_shape() {
        assert_eq!(loading_velocity(2.0, 0.0), 2.0);
        let t = 0.3;
        let expected = 2.0 * (1.0 + (-t / 20.0_f64).exp() * (10.0 * t).sin());
        assert_relative_eq!(loading_velocity(2.0, t), expected);
    }

    #[test]
    fn test_steady_state_is_stationary() {
        let p = params(true, 1e-7);
        let (dydt, status) = friction_rhs(0.0, &[0.6, 10.0, 1.0], &p);
        assert_eq!(status, OdeStatus::Success);
        assert_relative_eq!(dydt[0], 0.0, epsilon = 1e-15);
        assert_relative_eq!(dydt[1], 0.0, epsilon = 1e-15);
        assert_relative_eq!(dydt[2], 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_slip_velocity_at_reference() {
        let p = params(false, 0.0);
        assert_relative_eq!(slip_velocity(&p, 0.6, 10.0).unwrap(), 1.0);
        assert!(slip_velocity(&p, 0.6, 0.0).is_none());
        assert!(slip_velocity(&p, 0.6, -1.0).is_none());
    }

    #[test]
    fn test_derivatives_without_damping() {
        let p = params(false, 0.0);
        let y = [0.605, 8.0, 1.0];
        let t = 0.7;
        let (dydt, status) = friction_rhs(t, &y, &p);
        assert!(status.is_success());

        let v = (((0.605 - 0.6) - 0.014 * (8.0_f64 / 10.0).ln()) / 0.011).exp();
        let dtheta = 1.0 - v * 8.0 / 10.0;
        let dmu = 0.01 * (loading_velocity(1.0, t) - v);
        let dv = v / 0.011 * (dmu - 0.014 / 8.0 * dtheta);
        assert_relative_eq!(dydt[0], dmu, max_relative = 1e-12);
        assert_relative_eq!(dydt[1], dtheta, max_relative = 1e-12);
        assert_relative_eq!(dydt[2], dv, max_relative = 1e-12);
    }

    #[test]
    fn test_damping_is_single_pass() {
        let p = params(true, 0.5);
        let y = [0.605, 8.0, 1.0];
        let t = 0.7;
        let (dydt, status) = friction_rhs(t, &y, &p);
        assert!(status.is_success());

        let v = slip_velocity(&p, y[0], y[1]).unwrap();
        let dtheta = 1.0 - v * y[1] / p.dc;
        let dmu0 = 0.01 * (loading_velocity(1.0, t) - v);
        let dv0 = v / p.a * (dmu0 - p.b / y[1] * dtheta);
        let dmu1 = dmu0 - p.k1 * dv0;
        let dv1 = v / p.a * (dmu1 - p.b / y[1] * dtheta);
        assert_relative_eq!(dydt[0], dmu1, max_relative = 1e-12);
        assert_relative_eq!(dydt[2], dv1, max_relative = 1e-12);

        // a second correction would move the result
        let dmu2 = dmu0 - p.k1 * dv1;
        assert!((dmu2 - dydt[0]).abs() > 1e-9);
    }

    #[test]
    fn test_damping_off_matches_zero_k1() {
        let y = [0.61, 4.0, 1.3];
        let (off, _) = friction_rhs(1.2, &y, &params(false, 3.0));
        let (zero, _) = friction_rhs(1.2, &y, &params(true, 0.0));
        assert_eq!(off, zero);
    }

    #[test]
    fn test_invalid_theta_fails() {
        let p = params(true, 1e-7);
        assert_eq!(friction_rhs(0.0, &[0.6, 0.0, 1.0], &p).1, OdeStatus::Failure);
        assert_eq!(friction_rhs(0.0, &[0.6, -2.0, 1.0], &p).1, OdeStatus::Failure);
        assert_eq!(
            friction_rhs(0.0, &[0.6, f64::NAN, 1.0], &p).1,
            OdeStatus::Failure
        );
    }

    #[test]
    fn test_param_array_layout() {
        let p = params(true, 1e-7);
        let packed = p.to_array();
        assert_eq!(packed, [1.0, 0.011, 0.014, 10.0, 0.6, 1.0, 1e-7]);
        assert_eq!(FrictionParams::from_array(&packed), p);

        let mut raw = packed;
        raw[5] = 0.0;
        assert!(!FrictionParams::from_array(&raw).radiation_damping);
    }

    #[test]
    fn test_ode_system_matches_free_function() {
        let law = FrictionLaw::new(params(true, 1e-3));
        let y = [0.602, 9.0, 1.1];
        let mut dydt = [0.0; 3];
        let status = law.rhs(0.4, &y, &mut dydt);
        let (expected, expected_status) = friction_rhs(0.4, &y, law.params());
        assert_eq!(status, expected_status);
        assert_eq!(dydt, expected);
    }
}
