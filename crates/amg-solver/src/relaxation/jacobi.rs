//! Damped Jacobi relaxation: `x <- x + omega * D^{-1} (b - A x)`.

use amg_core::{AmgError, CrsMatrix, Result};

use crate::backend::Backend;

pub struct DampedJacobi<B: Backend> {
    dinv: B::Vector,
    damping: f64,
}

impl<B: Backend> DampedJacobi<B> {
    pub fn setup(bk: &B, a: &CrsMatrix, damping: f64) -> Result<Self> {
        let mut dinv = a.diagonal();
        for (i, d) in dinv.iter_mut().enumerate() {
            if *d == 0.0 {
                return Err(AmgError::SingularDiagonal(i));
            }
            *d = 1.0 / *d;
        }
        Ok(Self {
            dinv: bk.vector_from(&dinv),
            damping,
        })
    }

    pub fn apply(
        &self,
        bk: &B,
        a: &B::Matrix,
        b: &B::Vector,
        x: &mut B::Vector,
        tmp: &mut B::Vector,
    ) {
        bk.residual(b, a, x, tmp);
        bk.vmul(self.damping, &self.dinv, tmp, 1.0, x);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{NativeBackend, VectorAccess};
    use amg_core::SparseTriplets;

    fn diag_matrix(values: &[f64]) -> CrsMatrix {
        let n = values.len();
        let mut t = SparseTriplets::new(n, n);
        for (i, &v) in values.iter().enumerate() {
            t.push(i, i, v);
        }
        CrsMatrix::from_triplets(&t).unwrap()
    }

    #[test]
    fn zero_diagonal_is_fatal_to_setup() {
        let bk = NativeBackend;
        let a = diag_matrix(&[1.0, 0.0, 3.0]);
        let err = DampedJacobi::setup(&bk, &a, 0.72);
        assert!(matches!(err, Err(AmgError::SingularDiagonal(1))));
    }

    #[test]
    fn undamped_sweep_solves_a_diagonal_system() {
        let bk = NativeBackend;
        let host = diag_matrix(&[2.0, 4.0, 8.0]);
        let smoother = DampedJacobi::setup(&bk, &host, 1.0).unwrap();
        let a = bk.matrix_from_crs(host);

        let b = bk.vector_from(&[2.0, 8.0, 24.0]);
        let mut x = bk.create_vector(3);
        let mut tmp = bk.create_vector(3);
        smoother.apply(&bk, &a, &b, &mut x, &mut tmp);
        assert_eq!(VectorAccess::as_slice(&x), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn exact_solution_is_a_fixed_point() {
        let n = 8;
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
        let host = CrsMatrix::from_triplets(&t).unwrap();
        let bk = NativeBackend;
        let smoother = DampedJacobi::setup(&bk, &host, 0.72).unwrap();
        let a = bk.matrix_from_crs(host);

        // b = A * xstar for a known xstar
        let xstar = bk.vector_from(&[1.0, -1.0, 2.0, 0.5, 0.0, 3.0, -2.0, 1.0]);
        let mut b = bk.create_vector(n);
        bk.spmv(1.0, &a, &xstar, 0.0, &mut b);

        let mut x = bk.create_vector(n);
        bk.copy(&xstar, &mut x);
        let mut tmp = bk.create_vector(n);
        smoother.apply(&bk, &a, &b, &mut x, &mut tmp);
        for (xi, si) in VectorAccess::as_slice(&x)
            .iter()
            .zip(VectorAccess::as_slice(&xstar))
        {
            assert!((xi - si).abs() < 1e-14);
        }
    }
}
