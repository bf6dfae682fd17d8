//! Coarsening strategies: from a level operator `A` to the transfer pair
//! `(P, R)` and the Galerkin coarse operator `A_c = R A P`.
//!
//! Every strategy shipped here is symmetric in the sense `R = P^T`; an
//! asymmetric variant would have to build its own restriction.

use amg_core::{AmgParams, CoarseningKind, CrsMatrix, Result};

pub mod aggregation;
pub mod energy;
pub mod galerkin;
pub mod ruge_stuben;
pub mod smoothed;
pub mod strength;

/// One coarsening step. Returns `None` when the strategy cannot produce a
/// coarse space (no strong connections anywhere); the caller then treats
/// the level as coarsest.
pub fn coarsen(
    a: &CrsMatrix,
    prm: &AmgParams,
) -> Result<Option<(CrsMatrix, CrsMatrix, CrsMatrix)>> {
    let p = match prm.coarsening {
        CoarseningKind::RugeStuben => ruge_stuben::prolongation(a, prm)?,
        CoarseningKind::Aggregation => aggregation::prolongation(a, prm),
        CoarseningKind::SmoothedAggregation => smoothed::prolongation(a, prm),
        CoarseningKind::SmoothedAggrEmin => energy::prolongation(a, prm),
    };
    let Some(p) = p else {
        return Ok(None);
    };
    let r = p.transpose();
    let ac = galerkin::triple_product(&r, a, &p);
    Ok(Some((p, r, ac)))
}
