//! Strength-of-connection graphs.
//!
//! Transient structures: built per level, consumed by the splitting or
//! aggregation pass, dropped once the prolongation exists.

use amg_core::CrsMatrix;

/// Sparse adjacency pattern (CRS without values).
#[derive(Debug, Clone)]
pub struct Connectivity {
    nrows: usize,
    ncols: usize,
    ptr: Vec<usize>,
    col: Vec<usize>,
}

impl Connectivity {
    fn from_rows(nrows: usize, ncols: usize, rows: Vec<Vec<usize>>) -> Self {
        let mut ptr = Vec::with_capacity(nrows + 1);
        ptr.push(0);
        let mut col = Vec::new();
        for row in rows {
            col.extend_from_slice(&row);
            ptr.push(col.len());
        }
        Self {
            nrows,
            ncols,
            ptr,
            col,
        }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn row(&self, i: usize) -> &[usize] {
        &self.col[self.ptr[i]..self.ptr[i + 1]]
    }

    pub fn transpose(&self) -> Connectivity {
        let mut ptr = vec![0usize; self.ncols + 1];
        for &j in &self.col {
            ptr[j + 1] += 1;
        }
        for j in 0..self.ncols {
            ptr[j + 1] += ptr[j];
        }
        let mut col = vec![0usize; self.col.len()];
        let mut next = ptr.clone();
        for i in 0..self.nrows {
            for &j in self.row(i) {
                col[next[j]] = i;
                next[j] += 1;
            }
        }
        Connectivity {
            nrows: self.ncols,
            ncols: self.nrows,
            ptr,
            col,
        }
    }
}

/// Classical coupling test: `i` depends strongly on `j` when
/// `-a_ij >= eps * max_{k != i}(-a_ik)`. Positive off-diagonals are never
/// strong; a row without negative off-diagonals has no strong connections.
pub fn classical(a: &CrsMatrix, eps: f64) -> Connectivity {
    let n = a.nrows();
    let mut rows = Vec::with_capacity(n);
    for i in 0..n {
        let (cols, vals) = a.row(i);
        let mut max_neg = 0.0f64;
        for (&j, &v) in cols.iter().zip(vals) {
            if j != i {
                max_neg = max_neg.max(-v);
            }
        }
        let mut strong = Vec::new();
        if max_neg > 0.0 {
            let threshold = eps * max_neg;
            for (&j, &v) in cols.iter().zip(vals) {
                if j != i && -v >= threshold && -v > 0.0 {
                    strong.push(j);
                }
            }
        }
        rows.push(strong);
    }
    Connectivity::from_rows(n, a.ncols(), rows)
}

/// Symmetric coupling test used by the aggregation strategies:
/// `j` is a strong neighbor of `i` when `a_ij^2 >= eps^2 * |a_ii * a_jj|`.
pub fn aggregation(a: &CrsMatrix, eps: f64) -> Connectivity {
    let n = a.nrows();
    let diag = a.diagonal();
    let eps2 = eps * eps;
    let mut rows = Vec::with_capacity(n);
    for i in 0..n {
        let (cols, vals) = a.row(i);
        let mut strong = Vec::new();
        for (&j, &v) in cols.iter().zip(vals) {
            if j != i && v != 0.0 && v * v >= eps2 * (diag[i] * diag[j]).abs() {
                strong.push(j);
            }
        }
        rows.push(strong);
    }
    Connectivity::from_rows(n, a.ncols(), rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use amg_core::SparseTriplets;

    fn matrix(entries: &[(usize, usize, f64)], n: usize) -> CrsMatrix {
        let mut t = SparseTriplets::new(n, n);
        for &(i, j, v) in entries {
            t.push(i, j, v);
        }
        CrsMatrix::from_triplets(&t).unwrap()
    }

    #[test]
    fn classical_keeps_dominant_negative_couplings() {
        // row 0 couples strongly to 1 (-4) and weakly to 2 (-0.5)
        let a = matrix(
            &[
                (0, 0, 8.0),
                (0, 1, -4.0),
                (0, 2, -0.5),
                (1, 0, -4.0),
                (1, 1, 8.0),
                (2, 0, -0.5),
                (2, 2, 1.0),
            ],
            3,
        );
        let s = classical(&a, 0.25);
        assert_eq!(s.row(0), &[1]);
        assert_eq!(s.row(1), &[0]);
        // the only off-diagonal of row 2 is its own maximum
        assert_eq!(s.row(2), &[0]);
    }

    #[test]
    fn classical_ignores_positive_couplings() {
        let a = matrix(&[(0, 0, 2.0), (0, 1, 1.0), (1, 1, 2.0)], 2);
        let s = classical(&a, 0.25);
        assert!(s.row(0).is_empty());
        assert!(s.row(1).is_empty());
    }

    #[test]
    fn aggregation_test_is_scale_aware() {
        let a = matrix(
            &[
                (0, 0, 1.0),
                (0, 1, 0.5),
                (1, 0, 0.5),
                (1, 1, 1.0),
                (1, 2, 1e-3),
                (2, 1, 1e-3),
                (2, 2, 1.0),
            ],
            3,
        );
        let s = aggregation(&a, 0.08);
        assert_eq!(s.row(0), &[1]);
        assert_eq!(s.row(1), &[0]);
        assert!(s.row(2).is_empty());
    }

    #[test]
    fn transpose_reverses_edges() {
        let a = matrix(&[(0, 0, 2.0), (0, 1, -1.0), (1, 1, 2.0)], 2);
        let s = classical(&a, 0.25);
        assert_eq!(s.row(0), &[1]);
        let st = s.transpose();
        assert_eq!(st.row(1), &[0]);
        assert!(st.row(0).is_empty());
    }
}
