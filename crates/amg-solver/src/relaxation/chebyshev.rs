//! Chebyshev polynomial smoothing on the diagonally scaled operator.
//!
//! Setup estimates the largest eigenvalue of `D^{-1} A` with a few power
//! iterations and targets the interval `[lambda_hi / 30, 1.1 * lambda_hi]`.
//! Apply evaluates the degree-`d` Chebyshev polynomial of `D^{-1} A` on the
//! current residual through the standard two-term recurrence.

use amg_core::{AmgError, CrsMatrix, Result};

use crate::backend::Backend;
use crate::coarsening::smoothed::spectral_radius;

pub struct Chebyshev<B: Backend> {
    dinv: B::Vector,
    degree: usize,
    theta: f64,
    delta: f64,
    r: B::Vector,
    d: B::Vector,
}

impl<B: Backend> Chebyshev<B> {
    pub fn setup(bk: &B, a: &CrsMatrix, degree: usize, power_iters: usize) -> Result<Self> {
        let n = a.nrows();
        let mut dinv = a.diagonal();
        for (i, d) in dinv.iter_mut().enumerate() {
            if *d == 0.0 {
                return Err(AmgError::SingularDiagonal(i));
            }
            *d = 1.0 / *d;
        }

        let mut hi = spectral_radius(a, &dinv, power_iters);
        if hi <= 0.0 {
            hi = 1.0;
        }
        let lo = hi / 30.0;
        let hi = 1.1 * hi;

        Ok(Self {
            dinv: bk.vector_from(&dinv),
            degree: degree.max(1),
            theta: 0.5 * (hi + lo),
            delta: 0.5 * (hi - lo),
            r: bk.create_vector(n),
            d: bk.create_vector(n),
        })
    }

    pub fn apply(
        &mut self,
        bk: &B,
        a: &B::Matrix,
        b: &B::Vector,
        x: &mut B::Vector,
        tmp: &mut B::Vector,
    ) {
        // r = D^{-1} (b - A x)
        bk.residual(b, a, x, tmp);
        bk.vmul(1.0, &self.dinv, tmp, 0.0, &mut self.r);

        // d = r / theta
        bk.axpby(1.0 / self.theta, &self.r, 0.0, &mut self.d);

        let sigma = self.theta / self.delta;
        let mut rho_prev = 1.0 / sigma;

        for _ in 1..self.degree {
            bk.axpby(1.0, &self.d, 1.0, x);

            // r <- r - D^{-1} A d
            bk.spmv(1.0, a, &self.d, 0.0, tmp);
            bk.vmul(-1.0, &self.dinv, tmp, 1.0, &mut self.r);

            let rho = 1.0 / (2.0 * sigma - rho_prev);
            bk.axpby(2.0 * rho / self.delta, &self.r, rho * rho_prev, &mut self.d);
            rho_prev = rho;
        }
        bk.axpby(1.0, &self.d, 1.0, x);
    }
}
