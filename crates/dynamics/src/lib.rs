#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # Cartpole Dynamics
//!
//! Closed-form rigid-body equations for a pole balanced on a cart, advanced
//! one fixed time step at a time. The transition is a pure function of the
//! current state and a discrete push direction, which makes it the reference
//! that every learned approximation in the workspace is judged against.
//!
//! Two constant sets are provided: [`CartPoleParams::default`] holds the
//! ground-truth values, and [`CartPoleParams::learned`] holds the calibrated
//! values recovered by system identification, used to drive the
//! reduced-state representation with deliberately imperfect physics.

pub mod cartpole;

pub use cartpole::{advance, advance_with, Action, CartPoleParams, CartState};
