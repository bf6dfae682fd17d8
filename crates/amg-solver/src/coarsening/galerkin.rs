//! Sparse matrix products and the Galerkin triple product.
//!
//! `spgemm` is the dominant setup cost. It runs a symbolic pass to size the
//! result exactly, then a numeric pass into a dense per-row accumulator.
//! The column marker is timestamped (symbolic pass stamps `i`, numeric pass
//! stamps `i + nrows`) so it is never cleared between rows.

use amg_core::CrsMatrix;

/// C = A * B.
pub fn spgemm(a: &CrsMatrix, b: &CrsMatrix) -> CrsMatrix {
    assert_eq!(
        a.ncols(),
        b.nrows(),
        "spgemm: inner dimensions must agree"
    );
    let nrows = a.nrows();
    let ncols = b.ncols();

    let mut marker = vec![usize::MAX; ncols];

    // symbolic pass: nnz of each result row
    let mut ptr = vec![0usize; nrows + 1];
    for i in 0..nrows {
        let (acols, _) = a.row(i);
        let mut count = 0;
        for &k in acols {
            let (bcols, _) = b.row(k);
            for &j in bcols {
                if marker[j] != i {
                    marker[j] = i;
                    count += 1;
                }
            }
        }
        ptr[i + 1] = ptr[i] + count;
    }

    // numeric pass into a dense accumulator, columns sorted afterwards
    let nnz = ptr[nrows];
    let mut col = vec![0usize; nnz];
    let mut val = vec![0.0f64; nnz];
    let mut work = vec![0.0f64; ncols];

    for i in 0..nrows {
        let stamp = i + nrows;
        let (acols, avals) = a.row(i);
        let row_start = ptr[i];
        let mut row_end = row_start;
        for (&k, &av) in acols.iter().zip(avals) {
            let (bcols, bvals) = b.row(k);
            for (&j, &bv) in bcols.iter().zip(bvals) {
                if marker[j] != stamp {
                    marker[j] = stamp;
                    col[row_end] = j;
                    row_end += 1;
                    work[j] = av * bv;
                } else {
                    work[j] += av * bv;
                }
            }
        }
        debug_assert_eq!(row_end, ptr[i + 1]);
        let row = &mut col[row_start..row_end];
        row.sort_unstable();
        for (k, &j) in row.iter().enumerate() {
            val[row_start + k] = work[j];
        }
    }

    CrsMatrix::from_parts(nrows, ncols, ptr, col, val)
        .expect("spgemm produces valid CRS structure")
}

/// Galerkin coarse operator `A_c = R * A * P`.
pub fn triple_product(r: &CrsMatrix, a: &CrsMatrix, p: &CrsMatrix) -> CrsMatrix {
    spgemm(r, &spgemm(a, p))
}
