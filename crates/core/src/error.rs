use thiserror::Error;

use crate::shape::Shape;

/// Failure reported by a native entry point.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("entry point `{entry}` failed: {reason}")]
pub struct KernelError {
    pub entry: String,
    pub reason: String,
}

impl KernelError {
    pub fn new(entry: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            entry: entry.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ExecError {
    /// Caller or compiler bug detected before any kernel call.
    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("Kernel has no entry point named `{0}`")]
    MissingEntryPoint(String),

    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: Shape, actual: Shape },

    #[error("Rank mismatch: {0} vs {1}")]
    RankMismatch(usize, usize),

    #[error("Allocation failed: {0}")]
    Allocation(String),

    #[error("Worker pool error: {0}")]
    Pool(String),

    #[error("Config error: {0}")]
    Config(String),
}

pub type ExecResult<T> = Result<T, ExecError>;
