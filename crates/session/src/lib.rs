#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # Multi-Representation Session
//!
//! Holds three parallel representations of one cartpole environment — the
//! ground-truth mechanical state, a recurrent latent track, and a learned
//! reduced-state track — and exposes the two operations that drive them:
//! [`Session::sync`] re-initializes the learned tracks from one
//! ground-truth observation, and [`Session::step`] advances every track by
//! exactly one discrete action. The tracks agree right after a sync and
//! drift apart under repeated steps; that drift is what the session exists
//! to expose.
//!
//! All model calls go through one [`model::queue::RunQueue`]; decoded
//! display frames are guarded by [`model::stale::Generation`] counters so
//! an out-of-date decode never overwrites a newer one.

pub mod config;
pub mod error;
pub mod session;

pub use config::SessionConfig;
pub use error::SessionError;
pub use session::{RecurrentMemory, ReducedState, Session, Snapshot};
