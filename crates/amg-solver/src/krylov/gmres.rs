//! Restarted GMRES(m), right-preconditioned.
//!
//! The Arnoldi basis is orthonormalized with modified Gram-Schmidt and the
//! Hessenberg matrix reduced by Givens rotations, so `|g_{k+1}|` tracks
//! the residual without forming it. The cycle preconditioner is a fixed
//! linear operator, which lets the update apply `M` once to the combined
//! basis correction instead of storing a second basis. On restart the
//! residual is reconstructed explicitly.

use amg_core::{AmgError, Result, SolverParams};
use nalgebra::DMatrix;

use crate::backend::Backend;

use super::{Precond, SolveReport, check_shapes};

fn givens(a: f64, b: f64) -> (f64, f64) {
    let r = a.hypot(b);
    if r == 0.0 { (1.0, 0.0) } else { (a / r, b / r) }
}

pub fn solve<B: Backend, P: Precond<B>>(
    bk: &B,
    a: &B::Matrix,
    pre: &mut P,
    rhs: &B::Vector,
    x: &mut B::Vector,
    prm: &SolverParams,
) -> Result<SolveReport> {
    let n = check_shapes::<B>(rhs, x)?;
    let m = prm.gmres_restart.max(1);

    let norm_rhs = bk.norm(rhs);
    if norm_rhs == 0.0 {
        bk.clear(x);
        return Ok(SolveReport {
            iterations: 0,
            residual: 0.0,
        });
    }

    let mut r = bk.create_vector(n);
    let mut w = bk.create_vector(n);
    let mut z = bk.create_vector(n);
    let mut dx = bk.create_vector(n);
    let mut basis: Vec<B::Vector> = (0..=m).map(|_| bk.create_vector(n)).collect();

    let mut h = DMatrix::<f64>::zeros(m + 1, m);
    let mut cs = vec![0.0f64; m];
    let mut sn = vec![0.0f64; m];
    let mut g = vec![0.0f64; m + 1];

    let mut iter = 0;
    let mut res;
    let mut stalled = false;

    loop {
        bk.residual(rhs, a, x, &mut r);
        let beta = bk.norm(&r);
        res = beta / norm_rhs;
        if res <= prm.tol || iter >= prm.maxiter {
            break;
        }
        if stalled {
            // the Arnoldi space closed without reaching the tolerance
            return Err(AmgError::KrylovBreakdown(
                "Arnoldi breakdown with residual above tolerance".into(),
            ));
        }

        bk.axpby(1.0 / beta, &r, 0.0, &mut basis[0]);
        g.fill(0.0);
        g[0] = beta;

        let mut k_used = 0;
        for j in 0..m {
            pre.precond(&basis[j], &mut z)?;
            bk.spmv(1.0, a, &z, 0.0, &mut w);
            let wscale = bk.norm(&w);

            for i in 0..=j {
                h[(i, j)] = bk.inner_product(&w, &basis[i]);
                bk.axpby(-h[(i, j)], &basis[i], 1.0, &mut w);
            }
            let hnext = bk.norm(&w);
            h[(j + 1, j)] = hnext;
            // w lies (numerically) in the span of the basis: the Krylov
            // space is exhausted
            let happy = hnext <= 1e-14 * wscale;
            if !happy {
                bk.axpby(1.0 / hnext, &w, 0.0, &mut basis[j + 1]);
            }

            for i in 0..j {
                let (hi, hj) = (h[(i, j)], h[(i + 1, j)]);
                h[(i, j)] = cs[i] * hi + sn[i] * hj;
                h[(i + 1, j)] = -sn[i] * hi + cs[i] * hj;
            }
            let (c, s) = givens(h[(j, j)], h[(j + 1, j)]);
            cs[j] = c;
            sn[j] = s;
            h[(j, j)] = c * h[(j, j)] + s * h[(j + 1, j)];
            h[(j + 1, j)] = 0.0;
            g[j + 1] = -s * g[j];
            g[j] *= c;

            iter += 1;
            k_used = j + 1;
            res = g[j + 1].abs() / norm_rhs;
            if happy {
                stalled = true;
            }
            if res <= prm.tol || iter >= prm.maxiter || happy {
                break;
            }
        }

        // back substitution on the triangularized Hessenberg
        let mut y = vec![0.0f64; k_used];
        for i in (0..k_used).rev() {
            let mut sum = g[i];
            for j in i + 1..k_used {
                sum -= h[(i, j)] * y[j];
            }
            if h[(i, i)] == 0.0 {
                return Err(AmgError::KrylovBreakdown("singular Hessenberg".into()));
            }
            y[i] = sum / h[(i, i)];
        }

        // x += M (V y): one preconditioner application on the combination
        bk.clear(&mut dx);
        for (j, &yj) in y.iter().enumerate() {
            bk.axpby(yj, &basis[j], 1.0, &mut dx);
        }
        pre.precond(&dx, &mut z)?;
        bk.axpby(1.0, &z, 1.0, x);
    }

    Ok(SolveReport {
        iterations: iter,
        residual: res,
    })
}
