//! Gauss-Seidel relaxation.
//!
//! One forward sweep solves `(D + L) x_new = b - U x_old`. The strict
//! upper triangle is applied through the backend; the lower triangular
//! solve runs sequentially over host slices, which is what makes this
//! smoother inherently serial.

use amg_core::{AmgError, CrsMatrix, Result};

use crate::backend::{Backend, VectorAccess};

pub struct GaussSeidel<B: Backend> {
    /// D + L rows of the level matrix; the diagonal entry is last in
    /// each row.
    lower: CrsMatrix,
    /// Strict upper triangle, in backend format for the SpMV.
    upper: B::Matrix,
}

impl<B: Backend> GaussSeidel<B> {
    pub fn setup(bk: &B, a: &CrsMatrix) -> Result<Self> {
        let n = a.nrows();
        let mut lptr = Vec::with_capacity(n + 1);
        lptr.push(0usize);
        let mut lcol = Vec::new();
        let mut lval = Vec::new();
        let mut uptr = Vec::with_capacity(n + 1);
        uptr.push(0usize);
        let mut ucol = Vec::new();
        let mut uval = Vec::new();

        for i in 0..n {
            let (cols, vals) = a.row(i);
            let mut has_diag = false;
            for (&j, &v) in cols.iter().zip(vals) {
                if j <= i {
                    if j == i {
                        if v == 0.0 {
                            return Err(AmgError::SingularDiagonal(i));
                        }
                        has_diag = true;
                    }
                    lcol.push(j);
                    lval.push(v);
                } else {
                    ucol.push(j);
                    uval.push(v);
                }
            }
            if !has_diag {
                return Err(AmgError::SingularDiagonal(i));
            }
            lptr.push(lcol.len());
            uptr.push(ucol.len());
        }

        let lower = CrsMatrix::from_parts(n, n, lptr, lcol, lval)?;
        let upper = CrsMatrix::from_parts(n, n, uptr, ucol, uval)?;
        Ok(Self {
            lower,
            upper: bk.matrix_from_crs(upper),
        })
    }

    pub fn apply(
        &self,
        bk: &B,
        _a: &B::Matrix,
        b: &B::Vector,
        x: &mut B::Vector,
        tmp: &mut B::Vector,
    ) {
        // tmp = b - U x
        bk.copy(b, tmp);
        bk.spmv(-1.0, &self.upper, x, 1.0, tmp);

        // (D + L) x = tmp, forward substitution
        let ts = tmp.as_slice();
        let xs = x.as_mut_slice();
        for i in 0..self.lower.nrows() {
            let (cols, vals) = self.lower.row(i);
            let mut sum = ts[i];
            // the diagonal is the last entry of the row
            for (&j, &v) in cols[..cols.len() - 1].iter().zip(vals) {
                sum -= v * xs[j];
            }
            xs[i] = sum / vals[cols.len() - 1];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{NativeBackend, VectorAccess};
    use amg_core::SparseTriplets;

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
    fn missing_or_zero_diagonal_is_fatal() {
        let mut t = SparseTriplets::new(2, 2);
        t.push(0, 0, 1.0);
        t.push(1, 0, 1.0);
        let a = CrsMatrix::from_triplets(&t).unwrap();
        let bk = NativeBackend;
        assert!(matches!(
            GaussSeidel::setup(&bk, &a),
            Err(AmgError::SingularDiagonal(1))
        ));
    }

    #[test]
    fn sweep_is_exact_for_lower_triangular_systems() {
        let mut t = SparseTriplets::new(3, 3);
        t.push(0, 0, 2.0);
        t.push(1, 0, 1.0);
        t.push(1, 1, 2.0);
        t.push(2, 1, 1.0);
        t.push(2, 2, 4.0);
        let host = CrsMatrix::from_triplets(&t).unwrap();

        let bk = NativeBackend;
        let gs = GaussSeidel::setup(&bk, &host).unwrap();
        let a = bk.matrix_from_crs(host);

        let b = bk.vector_from(&[2.0, 5.0, 10.0]);
        let mut x = bk.create_vector(3);
        let mut tmp = bk.create_vector(3);
        gs.apply(&bk, &a, &b, &mut x, &mut tmp);
        // forward substitution: x = [1, 2, 2]
        assert_eq!(VectorAccess::as_slice(&x), &[1.0, 2.0, 2.0]);
    }

    #[test]
    fn exact_solution_is_a_fixed_point() {
        let n = 10;
        let host = poisson_1d(n);
        let bk = NativeBackend;
        let gs = GaussSeidel::setup(&bk, &host).unwrap();
        let a = bk.matrix_from_crs(host);

        let xstar = bk.vector_from(&(0..n).map(|i| (i as f64).sin()).collect::<Vec<_>>());
        let mut b = bk.create_vector(n);
        bk.spmv(1.0, &a, &xstar, 0.0, &mut b);

        let mut x = bk.create_vector(n);
        bk.copy(&xstar, &mut x);
        let mut tmp = bk.create_vector(n);
        gs.apply(&bk, &a, &b, &mut x, &mut tmp);
        for (xi, si) in VectorAccess::as_slice(&x)
            .iter()
            .zip(VectorAccess::as_slice(&xstar))
        {
            assert!((xi - si).abs() < 1e-13);
        }
    }

    #[test]
    fn sweeps_converge_on_a_small_spd_system() {
        let n = 8;
        let host = poisson_1d(n);
        let bk = NativeBackend;
        let gs = GaussSeidel::setup(&bk, &host).unwrap();
        let a = bk.matrix_from_crs(host);

        let b = bk.vector_from(&vec![1.0; n]);
        let mut x = bk.create_vector(n);
        let mut tmp = bk.create_vector(n);
        let mut r = bk.create_vector(n);

        bk.residual(&b, &a, &x, &mut r);
        let r0 = bk.norm(&r);
        for _ in 0..40 {
            gs.apply(&bk, &a, &b, &mut x, &mut tmp);
        }
        bk.residual(&b, &a, &x, &mut r);
        assert!(bk.norm(&r) < 0.1 * r0);
    }
}
