//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
///
/// Fallible functions return [`anyhow::Result`]. Errors of this type are either
/// returned directly or attached as context, so callers can always inspect them
/// with `err.downcast_ref::<StrataError>()`.
#[derive(Error, Debug)]
pub enum StrataError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// Lengths or widths of arrays are not consistent.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// An environment failed while a rollout was collected.
    #[error("Environment {env_ix} failed at step {step} of the rollout")]
    Runner {
        /// Index of the environment slot.
        env_ix: usize,

        /// Step within the rollout.
        step: usize,
    },

    /// A loss or an estimate became NaN or infinite.
    #[error("Non-finite value in {0}")]
    NumericalInstability(String),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No problem is registered with the given name.
    #[error("Unknown problem: {0}")]
    UnknownProblem(String),

    /// No set of hyperparameters is registered with the given name.
    #[error("Unknown hyperparameter set: {0}")]
    UnknownHParamSet(String),
}
