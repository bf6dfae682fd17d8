//! Data model for the AMG solver stack.
//!
//! This crate holds the pieces shared by every backend and strategy:
//! - **CRS matrices** and the triplet interchange format used to assemble
//!   them (`matrix`);
//! - **parameters** selecting and tuning coarsening, relaxation and the
//!   outer Krylov solver (`params`);
//! - **error types** (`error`).
//!
//! All numerics live in the companion `amg-solver` crate.

pub mod error;
pub mod matrix;
pub mod params;

pub use error::{AmgError, Result};
pub use matrix::{CrsMatrix, SparseTriplets};
pub use params::{AmgParams, CoarseningKind, RelaxationKind, SolverKind, SolverParams};
