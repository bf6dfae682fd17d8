//! Error types for the AMG core.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AmgError>;

/// Errors surfaced by setup and solve.
///
/// Running out of iterations is not an error: solvers report it through
/// `SolveReport` and the caller decides what to do with the iterate.
#[derive(Error, Debug)]
pub enum AmgError {
    /// Matrix/vector dimensions disagree. Fatal to the call.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// The CRS structure handed to us violates the storage invariants
    /// (non-monotone row pointers, unsorted or out-of-range columns).
    #[error("invalid matrix structure: {0}")]
    InvalidMatrix(String),

    /// A relaxation that requires `a_ii != 0` found a zero diagonal.
    /// Fatal to setup.
    #[error("zero diagonal at row {0}")]
    SingularDiagonal(usize),

    /// The coarsest-level operator has no LU factorization.
    #[error("coarse-level operator is singular")]
    SingularCoarse,

    /// An inner product the iteration divides by collapsed to zero.
    #[error("Krylov breakdown: {0}")]
    KrylovBreakdown(String),
}
