//! Error types of the alignment pipeline.
//!
//! Only [AlignError::SingularApproximation] is recoverable: the landmark embedder answers it
//! with a ridge regularized factorization. All other variants abort the run.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlignError {
    /// malformed or inconsistent graph input
    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    /// landmark similarity matrix too ill-conditioned for a plain pseudo-inverse
    #[error("singular landmark matrix, numerical rank {rank} for {nb_landmarks} landmarks")]
    SingularApproximation { rank: usize, nb_landmarks: usize },

    /// a matrix or a partition inconsistent with the node count
    #[error("dimension mismatch for {what}: expected {expected}, got {got}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    /// parameter outside of its domain
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl AlignError {
    /// true if the pipeline can continue after this error with a local fallback
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AlignError::SingularApproximation { .. })
    }
} // end of impl AlignError

pub type Result<T> = std::result::Result<T, AlignError>;
