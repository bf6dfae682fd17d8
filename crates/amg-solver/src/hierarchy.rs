//! The AMG hierarchy: recursive coarsening at setup, V-/K-cycles at apply.
//!
//! A hierarchy exclusively owns the operators, smoother states and scratch
//! vectors of all its levels. The per-level scratch makes `apply` take
//! `&mut self`, so one hierarchy cannot serve concurrent solves; build one
//! hierarchy per solving thread (the setup input matrix can be shared).

use std::fmt;
use std::mem;

use amg_core::{AmgError, AmgParams, CrsMatrix, Result};
use nalgebra::{DMatrix, DVector, Dyn};

use crate::backend::{Backend, VectorAccess};
use crate::coarsening;
use crate::relaxation::Smoother;

/// Coarsening is abandoned when a step retains at least this fraction of
/// the rows.
const STALL_RATIO: f64 = 0.9;

/// Dense LU factorization of the coarsest-level operator.
pub struct DenseLu {
    n: usize,
    lu: nalgebra::LU<f64, Dyn, Dyn>,
}

impl DenseLu {
    pub fn factor(a: &CrsMatrix) -> Result<Self> {
        let n = a.nrows();
        let mut dense = DMatrix::zeros(n, n);
        for i in 0..n {
            let (cols, vals) = a.row(i);
            for (&j, &v) in cols.iter().zip(vals) {
                dense[(i, j)] = v;
            }
        }
        let lu = dense.lu();
        if !lu.is_invertible() {
            return Err(AmgError::SingularCoarse);
        }
        Ok(Self { n, lu })
    }

    pub fn solve(&self, f: &[f64], u: &mut [f64]) -> Result<()> {
        let rhs = DVector::from_column_slice(f);
        let sol = self.lu.solve(&rhs).ok_or(AmgError::SingularCoarse)?;
        u.copy_from_slice(sol.as_slice());
        Ok(())
    }

    pub fn n(&self) -> usize {
        self.n
    }
}

enum LevelKind<B: Backend> {
    /// An intermediate level with its transfer pair.
    Transfer { p: B::Matrix, r: B::Matrix },
    /// The coarsest level, solved directly.
    Coarsest { lu: DenseLu },
}

/// Immutable per-level operators.
struct LevelOperators<B: Backend> {
    nrows: usize,
    a: B::Matrix,
    kind: LevelKind<B>,
}

/// Mutable per-level state: the coarse right-hand side and correction
/// received from the finer level, a temporary, and the smoother.
struct LevelScratch<B: Backend> {
    f: B::Vector,
    u: B::Vector,
    t: B::Vector,
    smoother: Option<Smoother<B>>,
}

/// Rows and nonzeros of one level, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelInfo {
    pub rows: usize,
    pub nnz: usize,
}

/// An assembled AMG hierarchy, usable as a preconditioner operator.
pub struct Hierarchy<B: Backend> {
    backend: B,
    params: AmgParams,
    ops: Vec<LevelOperators<B>>,
    work: Vec<LevelScratch<B>>,
    info: Vec<LevelInfo>,
}

impl<B: Backend> Hierarchy<B> {
    /// Coarsen `a` recursively until a stopping rule fires and factor the
    /// coarsest operator. Setup errors release every partial level.
    pub fn build(backend: B, a: CrsMatrix, params: AmgParams) -> Result<Self> {
        if a.nrows() != a.ncols() {
            return Err(AmgError::ShapeMismatch(format!(
                "system matrix is {}x{}",
                a.nrows(),
                a.ncols()
            )));
        }

        let mut ops = Vec::new();
        let mut work = Vec::new();
        let mut info = Vec::new();

        let mut a = a;
        loop {
            let n = a.nrows();
            info.push(LevelInfo { rows: n, nnz: a.nnz() });

            let depth_limit = ops.len() + 1 >= params.max_levels;
            if !depth_limit && n > params.ncoarse {
                if let Some((p, r, ac)) = coarsening::coarsen(&a, &params)? {
                    let nc = ac.nrows();
                    if (nc as f64) < STALL_RATIO * (n as f64) {
                        log::debug!(
                            "level {}: {} rows, {} nnz -> {} rows",
                            ops.len(),
                            n,
                            a.nnz(),
                            nc
                        );
                        let smoother = Smoother::setup(&backend, &a, &params)?;
                        ops.push(LevelOperators {
                            nrows: n,
                            a: backend.matrix_from_crs(a),
                            kind: LevelKind::Transfer {
                                p: backend.matrix_from_crs(p),
                                r: backend.matrix_from_crs(r),
                            },
                        });
                        work.push(LevelScratch {
                            f: backend.create_vector(n),
                            u: backend.create_vector(n),
                            t: backend.create_vector(n),
                            smoother: Some(smoother),
                        });
                        a = ac;
                        continue;
                    }
                    log::warn!(
                        "coarsening stagnated at level {} ({} -> {} rows), truncating hierarchy",
                        ops.len(),
                        n,
                        nc
                    );
                } else {
                    log::debug!("no coarse space at level {}, truncating hierarchy", ops.len());
                }
            }

            log::debug!("level {} (coarsest): {} rows, dense LU", ops.len(), n);
            let lu = DenseLu::factor(&a)?;
            ops.push(LevelOperators {
                nrows: n,
                a: backend.matrix_from_crs(a),
                kind: LevelKind::Coarsest { lu },
            });
            work.push(LevelScratch {
                f: backend.create_vector(n),
                u: backend.create_vector(n),
                t: backend.create_vector(n),
                smoother: None,
            });
            break;
        }

        Ok(Self {
            backend,
            params,
            ops,
            work,
            info,
        })
    }

    /// The operator the outer Krylov solver multiplies by.
    pub fn top_matrix(&self) -> &B::Matrix {
        &self.ops[0].a
    }

    pub fn nrows(&self) -> usize {
        self.ops[0].nrows
    }

    pub fn num_levels(&self) -> usize {
        self.ops.len()
    }

    pub fn level_info(&self) -> &[LevelInfo] {
        &self.info
    }

    /// Level operator `A_k` in backend format.
    pub fn level_matrix(&self, k: usize) -> Option<&B::Matrix> {
        self.ops.get(k).map(|l| &l.a)
    }

    /// Prolongation `P_k` (absent on the coarsest level).
    pub fn prolongation(&self, k: usize) -> Option<&B::Matrix> {
        match &self.ops.get(k)?.kind {
            LevelKind::Transfer { p, .. } => Some(p),
            LevelKind::Coarsest { .. } => None,
        }
    }

    /// Restriction `R_k` (absent on the coarsest level).
    pub fn restriction(&self, k: usize) -> Option<&B::Matrix> {
        match &self.ops.get(k)?.kind {
            LevelKind::Transfer { r, .. } => Some(r),
            LevelKind::Coarsest { .. } => None,
        }
    }

    /// Total stored nonzeros over the fine-level nonzeros.
    pub fn operator_complexity(&self) -> f64 {
        let total: usize = self.info.iter().map(|l| l.nnz).sum();
        total as f64 / self.info[0].nnz.max(1) as f64
    }

    /// Total rows over the fine-level rows.
    pub fn grid_complexity(&self) -> f64 {
        let total: usize = self.info.iter().map(|l| l.rows).sum();
        total as f64 / self.info[0].rows.max(1) as f64
    }

    /// One preconditioning cycle: overwrite `x` with `M^{-1} rhs`.
    ///
    /// Takes `&mut self` because the cycle runs through per-level scratch;
    /// use one hierarchy per concurrent solve.
    pub fn apply(&mut self, rhs: &B::Vector, x: &mut B::Vector) -> Result<()> {
        let n = self.nrows();
        if rhs.len() != n || x.len() != n {
            return Err(AmgError::ShapeMismatch(format!(
                "hierarchy is {}x{}, rhs has {} entries, x has {}",
                n,
                n,
                rhs.len(),
                x.len()
            )));
        }
        self.backend.clear(x);
        cycle(
            &self.backend,
            &self.params,
            &self.ops,
            &mut self.work,
            0,
            rhs,
            x,
        )
    }

    /// Split into the top operator and a cycle handle, so the outer Krylov
    /// iteration can multiply by `A_0` while preconditioning with the
    /// cycle.
    pub(crate) fn parts(&mut self) -> (&B, &B::Matrix, CyclePrecond<'_, B>) {
        (
            &self.backend,
            &self.ops[0].a,
            CyclePrecond {
                backend: &self.backend,
                params: &self.params,
                ops: &self.ops,
                work: &mut self.work,
            },
        )
    }
}

impl<B: Backend> fmt::Display for Hierarchy<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "levels:              {}", self.num_levels())?;
        writeln!(f, "operator complexity: {:.2}", self.operator_complexity())?;
        writeln!(f, "grid complexity:     {:.2}", self.grid_complexity())?;
        writeln!(f, "{:>5} {:>10} {:>12}", "level", "rows", "nnz")?;
        for (k, l) in self.info.iter().enumerate() {
            writeln!(f, "{:>5} {:>10} {:>12}", k, l.rows, l.nnz)?;
        }
        Ok(())
    }
}

/// Borrowed view of a hierarchy that runs cycles; see
/// [`Hierarchy::parts`].
pub(crate) struct CyclePrecond<'a, B: Backend> {
    pub(crate) backend: &'a B,
    params: &'a AmgParams,
    ops: &'a [LevelOperators<B>],
    work: &'a mut [LevelScratch<B>],
}

impl<'a, B: Backend> CyclePrecond<'a, B> {
    pub(crate) fn apply(&mut self, rhs: &B::Vector, x: &mut B::Vector) -> Result<()> {
        self.backend.clear(x);
        cycle(self.backend, self.params, self.ops, self.work, 0, rhs, x)
    }
}

/// One cycle descent from the current level. `x` arrives cleared.
fn cycle<B: Backend>(
    bk: &B,
    prm: &AmgParams,
    ops: &[LevelOperators<B>],
    work: &mut [LevelScratch<B>],
    depth: usize,
    rhs: &B::Vector,
    x: &mut B::Vector,
) -> Result<()> {
    let Some((op, ops_rest)) = ops.split_first() else {
        return Ok(());
    };
    let Some((wk, work_rest)) = work.split_first_mut() else {
        return Ok(());
    };

    match &op.kind {
        LevelKind::Coarsest { lu } => lu.solve(rhs.as_slice(), x.as_mut_slice()),
        LevelKind::Transfer { p, r } => {
            let Some(smoother) = wk.smoother.as_mut() else {
                return Ok(());
            };

            for _ in 0..prm.npre {
                smoother.apply(bk, &op.a, rhs, x, &mut wk.t);
            }

            bk.residual(rhs, &op.a, x, &mut wk.t);

            // hand the coarse scratch pair to the recursive call
            let mut cf = mem::replace(&mut work_rest[0].f, bk.create_vector(0));
            let mut cu = mem::replace(&mut work_rest[0].u, bk.create_vector(0));

            bk.spmv(1.0, r, &wk.t, 0.0, &mut cf);
            bk.clear(&mut cu);

            let result = if prm.kcycle > 0 && depth < prm.kcycle {
                krylov_correction(bk, prm, ops_rest, work_rest, depth + 1, &cf, &mut cu)
            } else {
                cycle(bk, prm, ops_rest, work_rest, depth + 1, &cf, &mut cu)
            };

            if result.is_ok() {
                bk.spmv(1.0, p, &cu, 1.0, x);
            }
            work_rest[0].f = cf;
            work_rest[0].u = cu;
            result?;

            for _ in 0..prm.npost {
                smoother.apply(bk, &op.a, rhs, x, &mut wk.t);
            }
            Ok(())
        }
    }
}

/// K-cycle correction: two flexible-CG iterations on the coarse system,
/// preconditioned by the coarse cycle. Scratch is allocated per call; the
/// K-cycle is opt-in.
fn krylov_correction<B: Backend>(
    bk: &B,
    prm: &AmgParams,
    ops: &[LevelOperators<B>],
    work: &mut [LevelScratch<B>],
    depth: usize,
    f: &B::Vector,
    u: &mut B::Vector,
) -> Result<()> {
    let Some(op) = ops.first() else {
        return Ok(());
    };
    let n = op.nrows;

    let mut rv = bk.create_vector(n);
    let mut z = bk.create_vector(n);
    let mut pv = bk.create_vector(n);
    let mut q = bk.create_vector(n);

    bk.copy(f, &mut rv);
    let mut rho_prev = 0.0;
    for it in 0..2 {
        bk.clear(&mut z);
        cycle(bk, prm, ops, work, depth, &rv, &mut z)?;

        let rho = bk.inner_product(&rv, &z);
        if rho == 0.0 {
            break;
        }
        if it == 0 {
            bk.copy(&z, &mut pv);
        } else {
            bk.axpby(1.0, &z, rho / rho_prev, &mut pv);
        }

        bk.spmv(1.0, &op.a, &pv, 0.0, &mut q);
        let pq = bk.inner_product(&pv, &q);
        if pq == 0.0 {
            break;
        }
        let alpha = rho / pq;
        bk.axpby(alpha, &pv, 1.0, u);
        bk.axpby(-alpha, &q, 1.0, &mut rv);
        rho_prev = rho;
    }
    Ok(())
}
