//! Multi-step behavior of the cartpole transition.

use approx::assert_relative_eq;
use dynamics::{advance, Action, CartState};

#[test]
fn repeated_pushes_move_position_and_angle_off_zero() {
    let mut state = CartState::ZERO;
    for _ in 0..10 {
        state = advance(state, Action::Positive);
    }
    // After the first step velocities are nonzero, so position and angle
    // must have moved by the second step onward.
    assert!(state.x > 0.0, "x = {}", state.x);
    assert!(state.theta < 0.0, "theta = {}", state.theta);
}

#[test]
fn mirrored_action_sequences_produce_mirrored_trajectories() {
    let mut right = CartState::ZERO;
    let mut left = CartState::ZERO;
    for _ in 0..50 {
        right = advance(right, Action::Positive);
        left = advance(left, Action::Negative);
    }
    assert_relative_eq!(right.x, -left.x, epsilon = 1e-6);
    assert_relative_eq!(right.x_dot, -left.x_dot, epsilon = 1e-6);
    assert_relative_eq!(right.theta, -left.theta, epsilon = 1e-6);
    assert_relative_eq!(right.theta_dot, -left.theta_dot, epsilon = 1e-6);
}

#[test]
fn trajectory_is_reproducible_across_runs() {
    let run = || {
        let mut state = CartState {
            x: -0.4,
            x_dot: 0.1,
            theta: 0.05,
            theta_dot: -0.3,
        };
        for _ in 0..200 {
            state = advance(state, Action::Negative);
        }
        state
    };
    assert_eq!(run(), run());
}
