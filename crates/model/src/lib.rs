#![deny(clippy::all, clippy::pedantic)]
//! # Model Boundary
//!
//! Everything needed to talk to the external inference runtime: dense
//! [`Tensor`]s, raster ↔ tensor [`marshal`]ing, the [`ModelRuntime`] trait
//! the runtime implements, the single-flight [`queue::RunQueue`] every call
//! is funneled through, and the [`stale::Generation`] counters that discard
//! superseded results.
//!
//! The runtime itself is an opaque collaborator: it accepts named tensors
//! with fixed shapes and returns named tensors, and any call may fail. A
//! deterministic [`MockRuntime`] behind the `mock` feature stands in for it
//! in tests and demos.

use std::collections::HashMap;
use thiserror::Error;

pub mod marshal;
pub mod queue;
pub mod stale;
pub mod tensor;

pub use tensor::Tensor;

/// Width of the latent vector produced by the latent encoder.
pub const LATENT_DIM: usize = 16;
/// Recurrent layers in the transition model.
pub const NUM_LAYERS: usize = 2;
/// Hidden width per recurrent layer.
pub const HIDDEN_DIM: usize = 128;

/// Named tensors passed into and out of a model call.
pub type TensorMap = HashMap<String, Tensor>;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("missing input tensor `{0}`")]
    MissingInput(&'static str),
    #[error("model returned no tensor named `{0}`")]
    MissingOutput(&'static str),
    #[error("tensor `{name}` has shape {got:?}, expected {want:?}")]
    ShapeMismatch {
        name: &'static str,
        got: Vec<usize>,
        want: Vec<usize>,
    },
    #[error("model runtime failure: {0}")]
    Runtime(String),
}

/// The five models the session drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    /// Image (1,3,96,96) → latent mean `mu` (1,16).
    LatentEncoder,
    /// Latent `z` (1,16) → reconstruction `x_recon` (1,3,96,96).
    LatentDecoder,
    /// Latent, action and recurrent memory → next latent and memory.
    RecurrentStep,
    /// Image (1,3,96,96) → reduced `state` (1,2).
    StateEncoder,
    /// Reduced `state` (1,2) → `image` (1,3,96,96).
    StateDecoder,
}

/// An inference runtime hosting all five models.
///
/// Implementations are not required to tolerate concurrent calls; every
/// invocation in this workspace goes through [`queue::RunQueue`], which
/// guarantees at most one call in flight.
pub trait ModelRuntime: Send + Sync + 'static {
    /// Runs one model on named inputs, returning named outputs.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] when an input is missing or misshapen or
    /// when the underlying runtime faults. A failed call must leave the
    /// runtime usable for subsequent calls.
    fn run(&self, model: ModelKind, inputs: &TensorMap) -> Result<TensorMap, ModelError>;
}

/// Looks up a named input and checks its shape.
///
/// # Errors
///
/// Returns [`ModelError::MissingInput`] or [`ModelError::ShapeMismatch`].
pub fn expect_input<'a>(
    inputs: &'a TensorMap,
    name: &'static str,
    want: &[usize],
) -> Result<&'a Tensor, ModelError> {
    let t = inputs
        .get(name)
        .ok_or(ModelError::MissingInput(name))?;
    if t.shape() != want {
        return Err(ModelError::ShapeMismatch {
            name,
            got: t.shape().to_vec(),
            want: want.to_vec(),
        });
    }
    Ok(t)
}

/// Looks up a named output and checks its shape.
///
/// # Errors
///
/// Returns [`ModelError::MissingOutput`] or [`ModelError::ShapeMismatch`].
pub fn expect_output(
    outputs: &mut TensorMap,
    name: &'static str,
    want: &[usize],
) -> Result<Tensor, ModelError> {
    let t = outputs
        .remove(name)
        .ok_or(ModelError::MissingOutput(name))?;
    if t.shape() != want {
        return Err(ModelError::ShapeMismatch {
            name,
            got: t.shape().to_vec(),
            want: want.to_vec(),
        });
    }
    Ok(t)
}

#[cfg(feature = "mock")]
mod mock;
#[cfg(feature = "mock")]
pub use mock::MockRuntime;
