//! Error taxonomy for the C4 engine (spec §7).
//!
//! Score-below-threshold is deliberately *not* a variant here: per §7 it is a
//! recoverable outcome represented by an absent result, never an `Error`.

use thiserror::Error;

/// Errors surfaced by the core engine.
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration value violates a documented constraint (e.g. a
    /// penalty that must be negative was given as non-negative).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A `Model` failed a structural check, either during mutation or at
    /// `close()` (unreachable state, dangling transition reference, cyclic
    /// silent transitions, span/shadow referencing an unknown state).
    #[error("invalid model: {0}")]
    InvalidModel(String),

    /// Sequence or annotation input violates an alphabet or format
    /// constraint (illegal symbol, strand/annotation inconsistency, empty
    /// sequence where one is required).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A DP task could not proceed within its memory budget and no
    /// reduced-space path was available (a global model whose region is too
    /// large for quadratic space and cannot be narrowed).
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// The caller misused the API: mutating a closed model, calling
    /// `simulate` before `prepare`, an unterminated or nested RYO `{…}`
    /// block, adding an experiment after `prepare`.
    #[error("usage error: {0}")]
    Usage(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
