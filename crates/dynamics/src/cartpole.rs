//! Cartpole transition model
//!
//! One explicit Euler step of the standard inverted-pendulum-on-cart
//! equations. Positions and the angle advance with the velocities from the
//! start of the step; velocities advance with the freshly computed
//! accelerations.

use serde::{Deserialize, Serialize};

/// Full mechanical state of the cart and pole.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CartState {
    /// Cart position along the track in meters.
    pub x: f32,
    /// Cart velocity in m/s.
    pub x_dot: f32,
    /// Pole angle from vertical in radians.
    pub theta: f32,
    /// Pole angular velocity in rad/s.
    pub theta_dot: f32,
}

impl CartState {
    /// State with all four variables zeroed, the unstable equilibrium.
    pub const ZERO: Self = Self {
        x: 0.0,
        x_dot: 0.0,
        theta: 0.0,
        theta_dot: 0.0,
    };
}

/// A discrete push applied to the cart for one step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Push toward negative x.
    Negative,
    /// Push toward positive x.
    Positive,
}

impl Action {
    /// Sign of the applied force.
    #[must_use]
    pub const fn sign(self) -> f32 {
        match self {
            Self::Negative => -1.0,
            Self::Positive => 1.0,
        }
    }

    /// Code used when the action crosses the model boundary: 0 or 1.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Negative => 0,
            Self::Positive => 1,
        }
    }
}

/// Physical constants for one cartpole system.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartPoleParams {
    /// Gravitational acceleration in m/s².
    pub gravity: f32,
    /// Cart mass in kg.
    pub cart_mass: f32,
    /// Pole mass in kg.
    pub pole_mass: f32,
    /// Half the pole length in meters.
    pub half_length: f32,
    /// Magnitude of the applied force in N.
    pub force_mag: f32,
    /// Integration time step in seconds.
    pub tau: f32,
}

impl Default for CartPoleParams {
    fn default() -> Self {
        Self {
            gravity: 9.8,
            cart_mass: 1.0,
            pole_mass: 0.1,
            half_length: 0.5,
            force_mag: 10.0,
            tau: 0.02,
        }
    }
}

impl CartPoleParams {
    /// Constants recovered by fitting the transition to rollout data.
    ///
    /// Close to the ground truth but not equal to it, so trajectories
    /// driven by these values drift away from the reference over repeated
    /// steps.
    #[must_use]
    pub fn learned() -> Self {
        Self {
            cart_mass: 1.017,
            pole_mass: 0.103,
            force_mag: 11.26,
            ..Self::default()
        }
    }
}

/// Advance `state` by one step under `action` using the ground-truth
/// constants.
#[must_use]
pub fn advance(state: CartState, action: Action) -> CartState {
    advance_with(&CartPoleParams::default(), state, action)
}

/// Advance `state` by one step under `action` using the supplied constants.
///
/// Pure and deterministic: identical inputs produce bit-identical outputs.
#[must_use]
pub fn advance_with(params: &CartPoleParams, state: CartState, action: Action) -> CartState {
    let force = action.sign() * params.force_mag;
    let total_mass = params.cart_mass + params.pole_mass;
    let polemass_length = params.pole_mass * params.half_length;

    let cos_theta = state.theta.cos();
    let sin_theta = state.theta.sin();

    let temp =
        (force + polemass_length * state.theta_dot * state.theta_dot * sin_theta) / total_mass;
    let theta_acc = (params.gravity * sin_theta - cos_theta * temp)
        / (params.half_length
            * (4.0 / 3.0 - params.pole_mass * cos_theta * cos_theta / total_mass));
    let x_acc = temp - polemass_length * theta_acc * cos_theta / total_mass;

    CartState {
        x: state.x + params.tau * state.x_dot,
        x_dot: state.x_dot + params.tau * x_acc,
        theta: state.theta + params.tau * state.theta_dot,
        theta_dot: state.theta_dot + params.tau * theta_acc,
    }
}
