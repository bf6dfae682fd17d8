//! Smoothed aggregation: tentative prolongator improved by one damped
//! Jacobi step on the filtered matrix.

use amg_core::{AmgParams, CrsMatrix};

use super::{aggregation, galerkin, strength};

/// Drop weak off-diagonal entries (aggregation coupling test), keep the
/// diagonal.
pub fn filtered(a: &CrsMatrix, eps: f64) -> CrsMatrix {
    let n = a.nrows();
    let diag = a.diagonal();
    let eps2 = eps * eps;

    let mut ptr = Vec::with_capacity(n + 1);
    ptr.push(0usize);
    let mut col = Vec::new();
    let mut val = Vec::new();
    for i in 0..n {
        let (cols, vals) = a.row(i);
        for (&j, &v) in cols.iter().zip(vals) {
            if j == i || v * v >= eps2 * (diag[i] * diag[j]).abs() {
                col.push(j);
                val.push(v);
            }
        }
        ptr.push(col.len());
    }
    CrsMatrix::from_parts(n, a.ncols(), ptr, col, val)
        .expect("filtering preserves CRS structure")
}

/// Spectral radius of `D^{-1} A` by power iteration.
pub fn spectral_radius(a: &CrsMatrix, dinv: &[f64], iters: usize) -> f64 {
    let n = a.nrows();
    if n == 0 {
        return 0.0;
    }
    let mut v = vec![1.0 / (n as f64).sqrt(); n];
    let mut w = vec![0.0; n];
    let mut lambda = 0.0;
    for _ in 0..iters.max(1) {
        for i in 0..n {
            let (cols, vals) = a.row(i);
            let mut sum = 0.0;
            for (&j, &av) in cols.iter().zip(vals) {
                sum += av * v[j];
            }
            w[i] = dinv[i] * sum;
        }
        lambda = v.iter().zip(&w).map(|(&a, &b)| a * b).sum();
        let norm: f64 = w.iter().map(|&x| x * x).sum::<f64>().sqrt();
        if norm == 0.0 {
            return 0.0;
        }
        for (vi, &wi) in v.iter_mut().zip(&w) {
            *vi = wi / norm;
        }
    }
    lambda.abs()
}

/// Smoothed-aggregation prolongation:
/// `P = (I - omega D^{-1} A_f) P_tent` with `omega = 4 / (3 rho)`.
pub fn prolongation(a: &CrsMatrix, prm: &AmgParams) -> Option<CrsMatrix> {
    let s = strength::aggregation(a, prm.aggr_eps_strong);
    let aggr = aggregation::aggregates(&s);
    if aggr.count == 0 {
        return None;
    }
    let p_tent = aggregation::tentative(&aggr);

    let af = filtered(a, prm.aggr_eps_strong);
    let dinv: Vec<f64> = af
        .diagonal()
        .iter()
        .map(|&d| if d != 0.0 { 1.0 / d } else { 0.0 })
        .collect();

    let rho = spectral_radius(&af, &dinv, prm.chebyshev_power_iters);
    let omega = if rho > 0.0 { 4.0 / (3.0 * rho) } else { 2.0 / 3.0 };

    // S = I - omega D^{-1} A_f, assembled row by row on the pattern of A_f
    let n = af.nrows();
    let mut ptr = Vec::with_capacity(n + 1);
    ptr.push(0usize);
    let mut col = Vec::new();
    let mut val = Vec::new();
    for i in 0..n {
        let (cols, vals) = af.row(i);
        for (&j, &v) in cols.iter().zip(vals) {
            let mut w = -omega * dinv[i] * v;
            if j == i {
                w += 1.0;
            }
            col.push(j);
            val.push(w);
        }
        ptr.push(col.len());
    }
    let smoother = CrsMatrix::from_parts(n, n, ptr, col, val)
        .expect("prolongation smoother shares the filtered pattern");

    Some(galerkin::spgemm(&smoother, &p_tent))
}
