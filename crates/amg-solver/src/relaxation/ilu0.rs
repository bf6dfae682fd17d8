//! ILU(0): incomplete LU factorization on the sparsity pattern of `A`,
//! applied as `x <- x + U^{-1} L^{-1} (b - A x)`.
//!
//! Factors are host-side; the two triangular solves walk them
//! sequentially. The residual still goes through the backend.

use amg_core::{AmgError, CrsMatrix, Result};

use crate::backend::{Backend, VectorAccess};

pub struct Ilu0 {
    /// Strict lower triangle holding the multipliers (unit diagonal
    /// implied).
    lower: CrsMatrix,
    /// Upper triangle including the diagonal, last solved.
    upper: CrsMatrix,
}

impl Ilu0 {
    pub fn setup(a: &CrsMatrix) -> Result<Self> {
        let n = a.nrows();

        // the factorization assumes a present, nonzero diagonal
        let diag = a.diagonal();
        if let Some(i) = diag.iter().position(|&d| d == 0.0) {
            return Err(AmgError::SingularDiagonal(i));
        }

        let mut val = a.values().to_vec();
        let mut diag_idx = vec![usize::MAX; n];
        for i in 0..n {
            let (cols, _) = a.row(i);
            let base = a.ptr()[i];
            if let Ok(k) = cols.binary_search(&i) {
                diag_idx[i] = base + k;
            }
        }

        // IKJ elimination restricted to the pattern of A; `pos` maps the
        // columns of the active row to value indices, stamped per row
        let mut pos = vec![usize::MAX; n];
        let mut stamp = vec![usize::MAX; n];
        for i in 0..n {
            let (cols, _) = a.row(i);
            let base = a.ptr()[i];
            for (k, &j) in cols.iter().enumerate() {
                pos[j] = base + k;
                stamp[j] = i;
            }
            for (k_idx, &k) in cols.iter().enumerate() {
                if k >= i {
                    break;
                }
                let pivot = val[diag_idx[k]];
                if pivot == 0.0 {
                    return Err(AmgError::SingularDiagonal(k));
                }
                let lik = val[base + k_idx] / pivot;
                val[base + k_idx] = lik;
                let (kcols, _) = a.row(k);
                let kbase = a.ptr()[k];
                for (m, &j) in kcols.iter().enumerate() {
                    if j > k && stamp[j] == i {
                        val[pos[j]] -= lik * val[kbase + m];
                    }
                }
            }
            if val[diag_idx[i]] == 0.0 {
                return Err(AmgError::SingularDiagonal(i));
            }
        }

        // split the factored values into L (strict) and U (with diagonal)
        let mut lptr = Vec::with_capacity(n + 1);
        lptr.push(0usize);
        let mut lcol = Vec::new();
        let mut lval = Vec::new();
        let mut uptr = Vec::with_capacity(n + 1);
        uptr.push(0usize);
        let mut ucol = Vec::new();
        let mut uval = Vec::new();
        for i in 0..n {
            let (cols, _) = a.row(i);
            let base = a.ptr()[i];
            for (k, &j) in cols.iter().enumerate() {
                if j < i {
                    lcol.push(j);
                    lval.push(val[base + k]);
                } else {
                    ucol.push(j);
                    uval.push(val[base + k]);
                }
            }
            lptr.push(lcol.len());
            uptr.push(ucol.len());
        }

        Ok(Self {
            lower: CrsMatrix::from_parts(n, n, lptr, lcol, lval)?,
            upper: CrsMatrix::from_parts(n, n, uptr, ucol, uval)?,
        })
    }

    pub fn apply<B: Backend>(
        &self,
        bk: &B,
        a: &B::Matrix,
        b: &B::Vector,
        x: &mut B::Vector,
        tmp: &mut B::Vector,
    ) {
        bk.residual(b, a, x, tmp);

        let ts = tmp.as_mut_slice();
        let n = self.lower.nrows();
        // L y = r (unit diagonal)
        for i in 0..n {
            let (cols, vals) = self.lower.row(i);
            let mut sum = ts[i];
            for (&j, &v) in cols.iter().zip(vals) {
                sum -= v * ts[j];
            }
            ts[i] = sum;
        }
        // U z = y
        for i in (0..n).rev() {
            let (cols, vals) = self.upper.row(i);
            let mut sum = ts[i];
            for (&j, &v) in cols[1..].iter().zip(&vals[1..]) {
                sum -= v * ts[j];
            }
            ts[i] = sum / vals[0];
        }

        bk.axpby(1.0, tmp, 1.0, x);
    }
}
