//! Preconditioned conjugate gradients, for SPD operators.

use amg_core::{Result, SolverParams};

use crate::backend::Backend;

use super::{Precond, SolveReport, check_shapes};

pub fn solve<B: Backend, P: Precond<B>>(
    bk: &B,
    a: &B::Matrix,
    pre: &mut P,
    rhs: &B::Vector,
    x: &mut B::Vector,
    prm: &SolverParams,
) -> Result<SolveReport> {
    let n = check_shapes::<B>(rhs, x)?;

    let norm_rhs = bk.norm(rhs);
    if norm_rhs == 0.0 {
        bk.clear(x);
        return Ok(SolveReport {
            iterations: 0,
            residual: 0.0,
        });
    }

    let mut r = bk.create_vector(n);
    let mut s = bk.create_vector(n);
    let mut p = bk.create_vector(n);
    let mut q = bk.create_vector(n);

    bk.residual(rhs, a, x, &mut r);
    let mut res = bk.norm(&r) / norm_rhs;

    let mut iter = 0;
    let mut rho_prev = 0.0;
    while res > prm.tol && iter < prm.maxiter {
        pre.precond(&r, &mut s)?;

        let rho = bk.inner_product(&r, &s);
        if iter == 0 {
            bk.copy(&s, &mut p);
        } else {
            bk.axpby(1.0, &s, rho / rho_prev, &mut p);
        }

        bk.spmv(1.0, a, &p, 0.0, &mut q);
        let alpha = rho / bk.inner_product(&q, &p);

        bk.axpby(alpha, &p, 1.0, x);
        bk.axpby(-alpha, &q, 1.0, &mut r);

        rho_prev = rho;
        res = bk.norm(&r) / norm_rhs;
        iter += 1;
    }

    Ok(SolveReport {
        iterations: iter,
        residual: res,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{NativeBackend, VectorAccess};
    use amg_core::{AmgError, CrsMatrix, SparseTriplets};

    /// No-op preconditioner for driving the iteration directly.
    struct Identity;

    impl Precond<NativeBackend> for Identity {
        fn precond(
            &mut self,
            r: &nalgebra::DVector<f64>,
            z: &mut nalgebra::DVector<f64>,
        ) -> Result<()> {
            z.copy_from(r);
            Ok(())
        }
    }

    fn poisson_1d(n: usize) -> CrsMatrix {
        let mut t = SparseTriplets::new(n, n);
        for i in 0..n {
            if i > 0 {
                t.push(i, i - 1, -1.0);
            }
            t.push(i, i, 2.0);
            if i + 1 < n {
                t.push(i, i + 1, -1.0);
            }
        }
        CrsMatrix::from_triplets(&t).unwrap()
    }

    #[test]
    fn unpreconditioned_cg_solves_a_small_spd_system() {
        let bk = NativeBackend;
        let a = bk.matrix_from_crs(poisson_1d(32));
        let b = bk.vector_from(&vec![1.0; 32]);
        let mut x = bk.create_vector(32);

        let prm = SolverParams {
            maxiter: 200,
            ..Default::default()
        };
        let report = solve(&bk, &a, &mut Identity, &b, &mut x, &prm).unwrap();
        assert!(report.residual <= prm.tol, "res = {}", report.residual);

        let mut r = bk.create_vector(32);
        bk.residual(&b, &a, &x, &mut r);
        assert!(bk.norm(&r) / bk.norm(&b) <= 1e-7);
    }

    #[test]
    fn zero_rhs_returns_the_zero_solution() {
        let bk = NativeBackend;
        let a = bk.matrix_from_crs(poisson_1d(8));
        let b = bk.create_vector(8);
        let mut x = bk.vector_from(&vec![5.0; 8]);

        let report = solve(&bk, &a, &mut Identity, &b, &mut x, &SolverParams::default()).unwrap();
        assert_eq!(report.iterations, 0);
        assert!(VectorAccess::as_slice(&x).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn maxiter_is_reported_not_raised() {
        let bk = NativeBackend;
        let a = bk.matrix_from_crs(poisson_1d(64));
        let b = bk.vector_from(&vec![1.0; 64]);
        let mut x = bk.create_vector(64);

        let prm = SolverParams {
            maxiter: 2,
            ..Default::default()
        };
        let report = solve(&bk, &a, &mut Identity, &b, &mut x, &prm).unwrap();
        assert_eq!(report.iterations, 2);
        assert!(report.residual > prm.tol);
    }

    #[test]
    fn mismatched_vectors_are_rejected() {
        let bk = NativeBackend;
        let a = bk.matrix_from_crs(poisson_1d(8));
        let b = bk.create_vector(8);
        let mut x = bk.create_vector(9);
        assert!(matches!(
            solve(&bk, &a, &mut Identity, &b, &mut x, &SolverParams::default()),
            Err(AmgError::ShapeMismatch(_))
        ));
    }
}
