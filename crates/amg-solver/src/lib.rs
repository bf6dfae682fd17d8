//! Algebraic multigrid preconditioning with Krylov solvers.
//!
//! The crate builds a hierarchy of coarse operators from a single sparse
//! matrix (no grid information needed) and applies it as a V-cycle or
//! K-cycle preconditioner inside CG, BiCGStab or GMRES:
//!
//! 1. **coarsening** turns `A_k` into transfer operators `(P_k, R_k)` and
//!    the Galerkin coarse operator `A_{k+1} = R_k A_k P_k`;
//! 2. **relaxation** smooths high-frequency error on every level;
//! 3. the **hierarchy** descends through the levels per application;
//! 4. a **Krylov** iteration drives the preconditioner to the requested
//!    tolerance.
//!
//! Everything is generic over a [`backend::Backend`] providing vectors,
//! SpMV and BLAS-1 kernels; [`backend::NativeBackend`] is the host
//! implementation.
//!
//! # Example
//!
//! ```
//! use amg_core::{AmgParams, CrsMatrix, SolverParams, SparseTriplets};
//! use amg_solver::backend::{Backend, NativeBackend};
//! use amg_solver::{build, krylov};
//!
//! // 1D Poisson matrix
//! let n = 64;
//! let mut t = SparseTriplets::new(n, n);
//! for i in 0..n {
//!     if i > 0 {
//!         t.push(i, i - 1, -1.0);
//!     }
//!     t.push(i, i, 2.0);
//!     if i + 1 < n {
//!         t.push(i, i + 1, -1.0);
//!     }
//! }
//! let a = CrsMatrix::from_triplets(&t).unwrap();
//!
//! let mut hierarchy = build(a, AmgParams::default()).unwrap();
//!
//! let bk = NativeBackend;
//! let b = bk.vector_from(&vec![1.0; n]);
//! let mut x = bk.create_vector(n);
//! let report = krylov::solve(&SolverParams::default(), &mut hierarchy, &b, &mut x).unwrap();
//! assert!(report.residual <= 1e-8);
//! ```
//!
//! # Concurrency
//!
//! A hierarchy owns per-level scratch vectors, so `apply` and `solve` take
//! it by `&mut`: one hierarchy serves one solve at a time. Concurrent
//! solves need one hierarchy each (the input matrix may be shared during
//! setup).

pub mod backend;
pub mod coarsening;
pub mod hierarchy;
pub mod krylov;
pub mod relaxation;

pub use amg_core::{
    AmgError, AmgParams, CoarseningKind, CrsMatrix, RelaxationKind, Result, SolverKind,
    SolverParams, SparseTriplets,
};
pub use backend::{Backend, NativeBackend, VectorAccess, crs_from_csr};
pub use hierarchy::{Hierarchy, LevelInfo};
pub use krylov::{Precond, SolveReport, solve};
pub use relaxation::Smoother;

/// Build an AMG hierarchy over the native backend.
pub fn build(a: CrsMatrix, params: AmgParams) -> Result<Hierarchy<NativeBackend>> {
    Hierarchy::build(NativeBackend, a, params)
}
