//! Per-level relaxation (smoothing) strategies.
//!
//! Every smoother has a setup phase on the host matrix (run before the
//! level is transferred to the backend) and an apply phase performing one
//! sweep `x <- x + M (b - A x)` through backend primitives. Setup fails
//! with `SingularDiagonal` where the method needs `a_ii != 0`.

use amg_core::{AmgParams, CrsMatrix, RelaxationKind, Result};

use crate::backend::Backend;

pub mod chebyshev;
pub mod gauss_seidel;
pub mod ilu0;
pub mod jacobi;
pub mod spai0;

pub use chebyshev::Chebyshev;
pub use gauss_seidel::GaussSeidel;
pub use ilu0::Ilu0;
pub use jacobi::DampedJacobi;
pub use spai0::Spai0;

/// A configured smoother with its per-level auxiliary state.
pub enum Smoother<B: Backend> {
    DampedJacobi(DampedJacobi<B>),
    GaussSeidel(GaussSeidel<B>),
    Spai0(Spai0<B>),
    Ilu0(Ilu0),
    Chebyshev(Chebyshev<B>),
}

impl<B: Backend> Smoother<B> {
    pub fn setup(bk: &B, a: &CrsMatrix, prm: &AmgParams) -> Result<Self> {
        Ok(match prm.relaxation {
            RelaxationKind::DampedJacobi => {
                Smoother::DampedJacobi(DampedJacobi::setup(bk, a, prm.jacobi_damping)?)
            }
            RelaxationKind::GaussSeidel => Smoother::GaussSeidel(GaussSeidel::setup(bk, a)?),
            RelaxationKind::Spai0 => Smoother::Spai0(Spai0::setup(bk, a)?),
            RelaxationKind::Ilu0 => Smoother::Ilu0(Ilu0::setup(a)?),
            RelaxationKind::Chebyshev => Smoother::Chebyshev(Chebyshev::setup(
                bk,
                a,
                prm.chebyshev_degree,
                prm.chebyshev_power_iters,
            )?),
        })
    }

    /// One smoothing sweep updating `x` toward `A x = b`; `tmp` is level
    /// scratch of matching length.
    pub fn apply(
        &mut self,
        bk: &B,
        a: &B::Matrix,
        b: &B::Vector,
        x: &mut B::Vector,
        tmp: &mut B::Vector,
    ) {
        match self {
            Smoother::DampedJacobi(s) => s.apply(bk, a, b, x, tmp),
            Smoother::GaussSeidel(s) => s.apply(bk, a, b, x, tmp),
            Smoother::Spai0(s) => s.apply(bk, a, b, x, tmp),
            Smoother::Ilu0(s) => s.apply(bk, a, b, x, tmp),
            Smoother::Chebyshev(s) => s.apply(bk, a, b, x, tmp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NativeBackend;
    use amg_core::SparseTriplets;

    #[test]
    fn every_kind_dispatches_through_setup() {
        let n = 10;
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
        let a = bk.matrix_from_crs(host.clone());

        for kind in [
            RelaxationKind::DampedJacobi,
            RelaxationKind::GaussSeidel,
            RelaxationKind::Spai0,
            RelaxationKind::Ilu0,
            RelaxationKind::Chebyshev,
        ] {
            let prm = AmgParams {
                relaxation: kind,
                ..Default::default()
            };
            let mut s = Smoother::setup(&bk, &host, &prm).unwrap();

            let b = bk.vector_from(&vec![1.0; n]);
            let mut x = bk.create_vector(n);
            let mut tmp = bk.create_vector(n);
            let mut r = bk.create_vector(n);
            bk.residual(&b, &a, &x, &mut r);
            let r0 = bk.norm(&r);
            for _ in 0..5 {
                s.apply(&bk, &a, &b, &mut x, &mut tmp);
            }
            bk.residual(&b, &a, &x, &mut r);
            assert!(bk.norm(&r) < r0, "{kind:?} did not reduce the residual");
        }
    }
}
