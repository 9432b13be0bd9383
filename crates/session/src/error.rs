//! Session error types.

use model::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    /// The warmup model call at connect time failed; no session exists.
    #[error("model load check failed: {0}")]
    LoadFailed(#[from] ModelError),
    /// The inference queue shut down before a required call could run.
    #[error("inference queue shut down")]
    QueueClosed,
}
