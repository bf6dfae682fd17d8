//! Krylov iterations driving the AMG preconditioner.
//!
//! Every solver takes the top operator, a preconditioner, the right-hand
//! side and an initial iterate, and returns the iteration count together
//! with the final relative residual. Running out of iterations is a normal
//! result; only breakdowns and shape errors are raised. Workspace vectors
//! are created per call, so concurrent solves on different hierarchies
//! never share state.

use amg_core::{AmgError, Result, SolverKind, SolverParams};
use serde::{Deserialize, Serialize};

use crate::backend::{Backend, VectorAccess};
use crate::hierarchy::Hierarchy;

pub mod bicgstab;
pub mod cg;
pub mod gmres;

/// Inner products below this magnitude count as a breakdown.
pub(crate) const BREAKDOWN_EPS: f64 = 1e-32;

/// Iteration count and relative residual of a finished solve.
///
/// `residual > tol` after `iterations == maxiter` means the solver ran out
/// of iterations; the iterate still holds the last computed approximation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    pub iterations: usize,
    pub residual: f64,
}

/// Preconditioner operator `z <- M r`; `z` is overwritten.
pub trait Precond<B: Backend> {
    fn precond(&mut self, r: &B::Vector, z: &mut B::Vector) -> Result<()>;
}

impl<B: Backend> Precond<B> for Hierarchy<B> {
    fn precond(&mut self, r: &B::Vector, z: &mut B::Vector) -> Result<()> {
        self.apply(r, z)
    }
}

impl<'a, B: Backend> Precond<B> for crate::hierarchy::CyclePrecond<'a, B> {
    fn precond(&mut self, r: &B::Vector, z: &mut B::Vector) -> Result<()> {
        self.apply(r, z)
    }
}

/// Solve `A x = b` with the hierarchy as preconditioner, dispatching on
/// the configured Krylov method.
pub fn solve<B: Backend>(
    prm: &SolverParams,
    hierarchy: &mut Hierarchy<B>,
    b: &B::Vector,
    x: &mut B::Vector,
) -> Result<SolveReport> {
    let n = hierarchy.nrows();
    if b.len() != n || x.len() != n {
        return Err(AmgError::ShapeMismatch(format!(
            "hierarchy is {n}x{n}, rhs has {} entries, x has {}",
            b.len(),
            x.len()
        )));
    }
    let (bk, a, mut pre) = hierarchy.parts();
    match prm.solver {
        SolverKind::Cg => cg::solve(bk, a, &mut pre, b, x, prm),
        SolverKind::BiCgStab => bicgstab::solve(bk, a, &mut pre, b, x, prm),
        SolverKind::Gmres => gmres::solve(bk, a, &mut pre, b, x, prm),
    }
}

/// The backend matrix type is opaque, so the system size comes from the
/// right-hand side; the iterate must match it.
pub(crate) fn check_shapes<B: Backend>(b: &B::Vector, x: &B::Vector) -> Result<usize> {
    if x.len() != b.len() {
        return Err(AmgError::ShapeMismatch(format!(
            "rhs has {} entries, x has {}",
            b.len(),
            x.len()
        )));
    }
    Ok(b.len())
}
