//! Backend trait definitions for the AMG core.
//!
//! A backend provides vectors, a matrix type, SpMV and the BLAS-1 kernels
//! the hierarchy and the Krylov solvers are built from. Every component of
//! the solver stack is generic over `Backend`, so a backend swap is a type
//! parameter, not a rewrite.
//!
//! All operations are observationally synchronous from the caller: a
//! backend that batches work internally must have completed ordering by the
//! time `inner_product` (or any read of a result) returns.

use amg_core::CrsMatrix;

/// Host access to a backend vector.
///
/// The sequential relaxations (Gauss-Seidel, the ILU(0) triangular solves)
/// and the coarsest-level dense solve walk vector entries in element order;
/// a backend participating in this solver stack must expose its vectors as
/// host slices.
pub trait VectorAccess {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn as_slice(&self) -> &[f64];

    fn as_mut_slice(&mut self) -> &mut [f64];
}

/// Capability set required from a compute backend.
///
/// The BLAS-1 kernels have reference implementations over host slices;
/// `spmv` is the kernel a backend must bring. `beta = 0` (or `c = 0` for
/// the three-term update) overwrites the output unconditionally, so the
/// destination may hold garbage.
pub trait Backend {
    type Vector: VectorAccess;
    type Matrix;

    /// A zero-initialized vector of length `n`.
    fn create_vector(&self, n: usize) -> Self::Vector;

    /// Transfer a host-assembled CRS matrix into the backend format.
    fn matrix_from_crs(&self, a: CrsMatrix) -> Self::Matrix;

    /// y <- alpha * A * x + beta * y
    fn spmv(&self, alpha: f64, a: &Self::Matrix, x: &Self::Vector, beta: f64, y: &mut Self::Vector);

    fn vector_from(&self, data: &[f64]) -> Self::Vector {
        let mut v = self.create_vector(data.len());
        v.as_mut_slice().copy_from_slice(data);
        v
    }

    fn copy(&self, src: &Self::Vector, dst: &mut Self::Vector) {
        dst.as_mut_slice().copy_from_slice(src.as_slice());
    }

    fn clear(&self, x: &mut Self::Vector) {
        x.as_mut_slice().fill(0.0);
    }

    /// r <- b - A * x
    fn residual(&self, b: &Self::Vector, a: &Self::Matrix, x: &Self::Vector, r: &mut Self::Vector) {
        self.copy(b, r);
        self.spmv(-1.0, a, x, 1.0, r);
    }

    /// y <- a * x + b * y
    fn axpby(&self, a: f64, x: &Self::Vector, b: f64, y: &mut Self::Vector) {
        if b == 0.0 {
            for (yi, &xi) in y.as_mut_slice().iter_mut().zip(x.as_slice()) {
                *yi = a * xi;
            }
        } else {
            for (yi, &xi) in y.as_mut_slice().iter_mut().zip(x.as_slice()) {
                *yi = a * xi + b * *yi;
            }
        }
    }

    /// z <- a * x + b * y + c * z
    fn axpbypcz(
        &self,
        a: f64,
        x: &Self::Vector,
        b: f64,
        y: &Self::Vector,
        c: f64,
        z: &mut Self::Vector,
    ) {
        let (xs, ys) = (x.as_slice(), y.as_slice());
        if c == 0.0 {
            for (i, zi) in z.as_mut_slice().iter_mut().enumerate() {
                *zi = a * xs[i] + b * ys[i];
            }
        } else {
            for (i, zi) in z.as_mut_slice().iter_mut().enumerate() {
                *zi = a * xs[i] + b * ys[i] + c * *zi;
            }
        }
    }

    /// z <- a * x .* y + b * z   (Hadamard product)
    fn vmul(&self, a: f64, x: &Self::Vector, y: &Self::Vector, b: f64, z: &mut Self::Vector) {
        let (xs, ys) = (x.as_slice(), y.as_slice());
        if b == 0.0 {
            for (i, zi) in z.as_mut_slice().iter_mut().enumerate() {
                *zi = a * xs[i] * ys[i];
            }
        } else {
            for (i, zi) in z.as_mut_slice().iter_mut().enumerate() {
                *zi = a * xs[i] * ys[i] + b * *zi;
            }
        }
    }

    fn inner_product(&self, x: &Self::Vector, y: &Self::Vector) -> f64 {
        x.as_slice()
            .iter()
            .zip(y.as_slice())
            .map(|(&a, &b)| a * b)
            .sum()
    }

    fn norm(&self, x: &Self::Vector) -> f64 {
        self.inner_product(x, x).sqrt()
    }
}
