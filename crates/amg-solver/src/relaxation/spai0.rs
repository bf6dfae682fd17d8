//! SPAI(0): the diagonal approximate inverse minimizing `||I - M A||_F`
//! over diagonal `M`, which gives `m_ii = a_ii / sum_j a_ij^2`.
//!
//! Tolerates zero diagonals: such a row simply gets a zero weight and is
//! left to the coarse correction.

use amg_core::{CrsMatrix, Result};

use crate::backend::Backend;

pub struct Spai0<B: Backend> {
    m: B::Vector,
}

impl<B: Backend> Spai0<B> {
    pub fn setup(bk: &B, a: &CrsMatrix) -> Result<Self> {
        let n = a.nrows();
        let mut m = vec![0.0; n];
        for (i, mi) in m.iter_mut().enumerate() {
            let (cols, vals) = a.row(i);
            let mut diag = 0.0;
            let mut norm2 = 0.0;
            for (&j, &v) in cols.iter().zip(vals) {
                if j == i {
                    diag = v;
                }
                norm2 += v * v;
            }
            *mi = if norm2 > 0.0 { diag / norm2 } else { 0.0 };
        }
        Ok(Self {
            m: bk.vector_from(&m),
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
        bk.vmul(1.0, &self.m, tmp, 1.0, x);
    }
}
