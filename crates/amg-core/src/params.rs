//! Setup and solve parameters.
//!
//! Strategy selection is one tagged enum per axis (coarsening, relaxation,
//! solver); the numeric knobs live in flat config structs with `Default`
//! impls carrying the documented defaults.

use serde::{Deserialize, Serialize};

/// Coarsening strategy producing the transfer operators of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoarseningKind {
    /// Classical Ruge-Stuben C/F splitting with direct interpolation
    RugeStuben,
    /// Plain (unsmoothed) greedy aggregation
    Aggregation,
    /// Aggregation with Jacobi-smoothed prolongation
    SmoothedAggregation,
    /// Smoothed aggregation with per-column energy minimization
    SmoothedAggrEmin,
}

/// Per-level smoother applied before and after the coarse correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelaxationKind {
    DampedJacobi,
    GaussSeidel,
    Spai0,
    Ilu0,
    Chebyshev,
}

/// Outer Krylov iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverKind {
    /// Conjugate gradients (SPD systems)
    Cg,
    /// Stabilized bi-conjugate gradients (general nonsymmetric)
    BiCgStab,
    /// Restarted GMRES (nonsymmetric, right-preconditioned)
    Gmres,
}

/// Hierarchy setup configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmgParams {
    /// Coarsening strategy
    pub coarsening: CoarseningKind,
    /// Relaxation strategy
    pub relaxation: RelaxationKind,
    /// Strength threshold for the Ruge-Stuben coupling test
    pub eps_strong: f64,
    /// Strength threshold for the aggregation coupling test (also used to
    /// filter the matrix before prolongation smoothing)
    pub aggr_eps_strong: f64,
    /// Damping factor of the Jacobi smoother
    pub jacobi_damping: f64,
    /// Degree of the Chebyshev smoothing polynomial
    pub chebyshev_degree: usize,
    /// Power iterations used for spectral-radius estimates
    pub chebyshev_power_iters: usize,
    /// Pre-smoothing sweeps per level
    pub npre: usize,
    /// Post-smoothing sweeps per level
    pub npost: usize,
    /// Levels above which the coarse correction is Krylov-accelerated
    /// (0 disables the K-cycle)
    pub kcycle: usize,
    /// Maximum number of levels in the hierarchy
    pub max_levels: usize,
    /// Matrices at or below this size are solved directly
    pub ncoarse: usize,
}

impl Default for AmgParams {
    fn default() -> Self {
        Self {
            coarsening: CoarseningKind::SmoothedAggregation,
            relaxation: RelaxationKind::DampedJacobi,
            eps_strong: 0.25,
            aggr_eps_strong: 0.08,
            jacobi_damping: 0.72,
            chebyshev_degree: 5,
            chebyshev_power_iters: 10,
            npre: 1,
            npost: 1,
            kcycle: 0,
            max_levels: 10,
            ncoarse: 500,
        }
    }
}

/// Outer solver configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverParams {
    /// Krylov method
    pub solver: SolverKind,
    /// Relative residual target
    pub tol: f64,
    /// Iteration bound; hitting it is reported, not raised
    pub maxiter: usize,
    /// GMRES restart length
    pub gmres_restart: usize,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            solver: SolverKind::Cg,
            tol: 1e-8,
            maxiter: 100,
            gmres_restart: 30,
        }
    }
}
