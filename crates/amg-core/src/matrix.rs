//! Compressed row storage (CRS) sparse matrices and the triplet
//! interchange format used to assemble them.
//!
//! A `CrsMatrix` is immutable after assembly. The storage invariants are
//! checked once at construction:
//! - `ptr` has `nrows + 1` entries, `ptr[0] == 0`, non-decreasing,
//!   `ptr[nrows] == nnz`;
//! - column indices are in `[0, ncols)` and strictly increasing within
//!   each row (no duplicates).

use crate::error::{AmgError, Result};

/// Sparse matrix in COO (coordinate/triplet) format.
///
/// Backend-agnostic interchange between an assembly layer and the solver:
/// entries may be pushed in any order and duplicate `(row, col)` pairs are
/// summed when the triplets are compressed into CRS.
#[derive(Debug, Clone)]
pub struct SparseTriplets {
    pub nrows: usize,
    pub ncols: usize,
    pub row_indices: Vec<usize>,
    pub col_indices: Vec<usize>,
    pub values: Vec<f64>,
}

impl SparseTriplets {
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            row_indices: Vec::new(),
            col_indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Number of stored entries (duplicates counted separately).
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn push(&mut self, row: usize, col: usize, value: f64) {
        self.row_indices.push(row);
        self.col_indices.push(col);
        self.values.push(value);
    }
}

/// Sparse matrix in compressed row storage.
#[derive(Debug, Clone, PartialEq)]
pub struct CrsMatrix {
    nrows: usize,
    ncols: usize,
    ptr: Vec<usize>,
    col: Vec<usize>,
    val: Vec<f64>,
}

impl CrsMatrix {
    /// Build from raw CRS arrays, validating the storage invariants.
    pub fn from_parts(
        nrows: usize,
        ncols: usize,
        ptr: Vec<usize>,
        col: Vec<usize>,
        val: Vec<f64>,
    ) -> Result<Self> {
        if ptr.len() != nrows + 1 {
            return Err(AmgError::InvalidMatrix(format!(
                "ptr has {} entries, expected {}",
                ptr.len(),
                nrows + 1
            )));
        }
        if ptr[0] != 0 {
            return Err(AmgError::InvalidMatrix("ptr[0] != 0".into()));
        }
        if ptr[nrows] != col.len() || col.len() != val.len() {
            return Err(AmgError::InvalidMatrix(format!(
                "ptr[nrows] = {}, col has {} entries, val has {}",
                ptr[nrows],
                col.len(),
                val.len()
            )));
        }
        for i in 0..nrows {
            if ptr[i] > ptr[i + 1] {
                return Err(AmgError::InvalidMatrix(format!(
                    "ptr decreases at row {i}"
                )));
            }
            let row = &col[ptr[i]..ptr[i + 1]];
            for (k, &j) in row.iter().enumerate() {
                if j >= ncols {
                    return Err(AmgError::InvalidMatrix(format!(
                        "column {j} out of range in row {i}"
                    )));
                }
                if k > 0 && row[k - 1] >= j {
                    return Err(AmgError::InvalidMatrix(format!(
                        "columns not strictly increasing in row {i}"
                    )));
                }
            }
        }
        Ok(Self {
            nrows,
            ncols,
            ptr,
            col,
            val,
        })
    }

    /// Compress a triplet set into CRS, summing duplicate entries.
    pub fn from_triplets(t: &SparseTriplets) -> Result<Self> {
        for (&i, &j) in t.row_indices.iter().zip(&t.col_indices) {
            if i >= t.nrows || j >= t.ncols {
                return Err(AmgError::InvalidMatrix(format!(
                    "triplet ({i}, {j}) out of range for {}x{}",
                    t.nrows, t.ncols
                )));
            }
        }

        let mut order: Vec<usize> = (0..t.nnz()).collect();
        order.sort_unstable_by_key(|&k| (t.row_indices[k], t.col_indices[k]));

        // per-row counts first, prefix-summed into row pointers after the scan
        let mut ptr = vec![0usize; t.nrows + 1];
        let mut col = Vec::with_capacity(t.nnz());
        let mut val = Vec::with_capacity(t.nnz());

        let mut prev = None;
        for &k in &order {
            let (i, j, v) = (t.row_indices[k], t.col_indices[k], t.values[k]);
            if prev == Some((i, j))
                && let Some(last) = val.last_mut()
            {
                *last += v;
            } else {
                col.push(j);
                val.push(v);
                ptr[i + 1] += 1;
                prev = Some((i, j));
            }
        }
        for i in 0..t.nrows {
            ptr[i + 1] += ptr[i];
        }

        Self::from_parts(t.nrows, t.ncols, ptr, col, val)
    }

    pub fn identity(n: usize) -> Self {
        Self {
            nrows: n,
            ncols: n,
            ptr: (0..=n).collect(),
            col: (0..n).collect(),
            val: vec![1.0; n],
        }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn nnz(&self) -> usize {
        self.val.len()
    }

    pub fn ptr(&self) -> &[usize] {
        &self.ptr
    }

    pub fn col_indices(&self) -> &[usize] {
        &self.col
    }

    pub fn values(&self) -> &[f64] {
        &self.val
    }

    /// Column indices and values of row `i`.
    pub fn row(&self, i: usize) -> (&[usize], &[f64]) {
        let (lo, hi) = (self.ptr[i], self.ptr[i + 1]);
        (&self.col[lo..hi], &self.val[lo..hi])
    }

    /// The main diagonal, zero where no entry is stored.
    pub fn diagonal(&self) -> Vec<f64> {
        let mut diag = vec![0.0; self.nrows.min(self.ncols)];
        for (i, d) in diag.iter_mut().enumerate() {
            let (cols, vals) = self.row(i);
            if let Ok(k) = cols.binary_search(&i) {
                *d = vals[k];
            }
        }
        diag
    }

    /// Transpose via counting sort; rows of the result come out sorted.
    pub fn transpose(&self) -> CrsMatrix {
        let mut ptr = vec![0usize; self.ncols + 1];
        for &j in &self.col {
            ptr[j + 1] += 1;
        }
        for j in 0..self.ncols {
            ptr[j + 1] += ptr[j];
        }

        let mut col = vec![0usize; self.nnz()];
        let mut val = vec![0.0; self.nnz()];
        let mut next = ptr.clone();
        for i in 0..self.nrows {
            let (cols, vals) = self.row(i);
            for (&j, &v) in cols.iter().zip(vals) {
                let dst = next[j];
                col[dst] = i;
                val[dst] = v;
                next[j] += 1;
            }
        }

        CrsMatrix {
            nrows: self.ncols,
            ncols: self.nrows,
            ptr,
            col,
            val,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tridiag(n: usize) -> CrsMatrix {
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
    fn triplets_sum_duplicates_and_sort() {
        let mut t = SparseTriplets::new(2, 2);
        t.push(1, 1, 1.0);
        t.push(0, 1, 2.0);
        t.push(0, 0, 3.0);
        t.push(0, 1, 0.5);

        let a = CrsMatrix::from_triplets(&t).unwrap();
        assert_eq!(a.nnz(), 3);
        assert_eq!(a.ptr(), &[0, 2, 3]);
        let (cols, vals) = a.row(0);
        assert_eq!(cols, &[0, 1]);
        assert_eq!(vals, &[3.0, 2.5]);
    }

    #[test]
    fn triplets_allow_empty_rows() {
        let mut t = SparseTriplets::new(4, 4);
        t.push(0, 0, 1.0);
        t.push(3, 3, 1.0);
        let a = CrsMatrix::from_triplets(&t).unwrap();
        assert_eq!(a.ptr(), &[0, 1, 1, 1, 2]);
    }

    #[test]
    fn from_parts_rejects_bad_structure() {
        // unsorted columns
        let err = CrsMatrix::from_parts(1, 3, vec![0, 2], vec![2, 0], vec![1.0, 1.0]);
        assert!(matches!(err, Err(AmgError::InvalidMatrix(_))));

        // column out of range
        let err = CrsMatrix::from_parts(1, 2, vec![0, 1], vec![5], vec![1.0]);
        assert!(matches!(err, Err(AmgError::InvalidMatrix(_))));

        // ptr not monotone
        let err = CrsMatrix::from_parts(2, 2, vec![0, 2, 1], vec![0, 1], vec![1.0, 1.0]);
        assert!(matches!(err, Err(AmgError::InvalidMatrix(_))));
    }

    #[test]
    fn diagonal_reports_missing_entries_as_zero() {
        let mut t = SparseTriplets::new(3, 3);
        t.push(0, 0, 4.0);
        t.push(1, 0, 1.0);
        t.push(2, 2, 5.0);
        let a = CrsMatrix::from_triplets(&t).unwrap();
        assert_eq!(a.diagonal(), vec![4.0, 0.0, 5.0]);
    }

    #[test]
    fn transpose_roundtrip() {
        let a = tridiag(5);
        let at = a.transpose();
        assert_eq!(at.nrows(), 5);
        // symmetric matrix: transpose equals the original
        assert_eq!(a, at);

        let mut t = SparseTriplets::new(2, 3);
        t.push(0, 2, 1.0);
        t.push(1, 0, 2.0);
        t.push(1, 1, 3.0);
        let b = CrsMatrix::from_triplets(&t).unwrap();
        let bt = b.transpose();
        assert_eq!(bt.nrows(), 3);
        assert_eq!(bt.ncols(), 2);
        assert_eq!(b.transpose().transpose(), b);
        let (cols, vals) = bt.row(0);
        assert_eq!(cols, &[1]);
        assert_eq!(vals, &[2.0]);
    }
}
