//! Native host backend over nalgebra vectors and host CRS matrices.
//!
//! Row-level parallelism in SpMV comes from rayon; every other kernel uses
//! the sequential reference implementations from the `Backend` trait so
//! that reductions stay deterministic (the idempotence guarantee of
//! `Hierarchy::apply` relies on a fixed summation order).

use amg_core::CrsMatrix;
use nalgebra::DVector;
use rayon::prelude::*;

use super::traits::{Backend, VectorAccess};

impl VectorAccess for DVector<f64> {
    fn len(&self) -> usize {
        self.nrows()
    }

    fn as_slice(&self) -> &[f64] {
        DVector::as_slice(self)
    }

    fn as_mut_slice(&mut self) -> &mut [f64] {
        DVector::as_mut_slice(self)
    }
}

/// Default CPU backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeBackend;

impl Backend for NativeBackend {
    type Vector = DVector<f64>;
    type Matrix = CrsMatrix;

    fn create_vector(&self, n: usize) -> DVector<f64> {
        DVector::zeros(n)
    }

    fn matrix_from_crs(&self, a: CrsMatrix) -> CrsMatrix {
        a
    }

    fn spmv(&self, alpha: f64, a: &CrsMatrix, x: &DVector<f64>, beta: f64, y: &mut DVector<f64>) {
        debug_assert_eq!(a.ncols(), x.nrows());
        debug_assert_eq!(a.nrows(), y.nrows());

        let xs = VectorAccess::as_slice(x);
        y.as_mut_slice()
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, yi)| {
                let (cols, vals) = a.row(i);
                let mut sum = 0.0;
                for (&j, &v) in cols.iter().zip(vals) {
                    sum += v * xs[j];
                }
                *yi = if beta == 0.0 {
                    alpha * sum
                } else {
                    alpha * sum + beta * *yi
                };
            });
    }
}

/// Convert a matrix assembled with `nalgebra_sparse` into the host CRS
/// format. COO assembly followed by CSR conversion is the usual way callers
/// put systems together; this is the bridge into the solver stack.
pub fn crs_from_csr(a: &nalgebra_sparse::CsrMatrix<f64>) -> amg_core::Result<CrsMatrix> {
    CrsMatrix::from_parts(
        a.nrows(),
        a.ncols(),
        a.row_offsets().to_vec(),
        a.col_indices().to_vec(),
        a.values().to_vec(),
    )
}
