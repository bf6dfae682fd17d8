//! Smoothed aggregation with energy minimization.
//!
//! Instead of one global damping factor, every column of the smoothed
//! prolongator gets its own: for column `j` the update
//! `P_j = P_tent_j - omega_j * q_j` with `q = D^{-1} A_f P_tent` minimizes
//! the energy `P_j^T A_f P_j` over `omega_j`, a scalar quadratic with a
//! closed-form minimizer on the column's sparsity pattern. A final row
//! renormalization restores the near-null-space constraint
//! `P * 1_c = 1_f` that the per-column factors perturb.

use amg_core::{AmgParams, CrsMatrix};

use super::smoothed::{filtered, spectral_radius};
use super::{aggregation, galerkin, strength};

/// Entry-wise inner products of matching columns: `out[j] += x_ij * y_ij`.
/// The two matrices share row order; rows are walked with a sorted merge.
fn column_dots(x: &CrsMatrix, y: &CrsMatrix, out: &mut [f64]) {
    out.fill(0.0);
    for i in 0..x.nrows() {
        let (xc, xv) = x.row(i);
        let (yc, yv) = y.row(i);
        let (mut a, mut b) = (0, 0);
        while a < xc.len() && b < yc.len() {
            match xc[a].cmp(&yc[b]) {
                std::cmp::Ordering::Less => a += 1,
                std::cmp::Ordering::Greater => b += 1,
                std::cmp::Ordering::Equal => {
                    out[xc[a]] += xv[a] * yv[b];
                    a += 1;
                    b += 1;
                }
            }
        }
    }
}

/// Energy-minimizing prolongation; `None` when nothing aggregates.
pub fn prolongation(a: &CrsMatrix, prm: &AmgParams) -> Option<CrsMatrix> {
    let s = strength::aggregation(a, prm.aggr_eps_strong);
    let aggr = aggregation::aggregates(&s);
    if aggr.count == 0 {
        return None;
    }
    let p_tent = aggregation::tentative(&aggr);
    let nc = aggr.count;

    let af = filtered(a, prm.aggr_eps_strong);
    let dinv: Vec<f64> = af
        .diagonal()
        .iter()
        .map(|&d| if d != 0.0 { 1.0 / d } else { 0.0 })
        .collect();

    // q = D^{-1} A_f P_tent is the smoothing direction; its energy terms
    // come from one more product with A_f
    let ap = galerkin::spgemm(&af, &p_tent);
    let q = scale_rows(&ap, &dinv);
    let aq = galerkin::spgemm(&af, &q);

    // omega_j = <q_j, (A_f P_tent)_j> / <q_j, (A_f q)_j>
    let mut num = vec![0.0; nc];
    let mut den = vec![0.0; nc];
    column_dots(&q, &ap, &mut num);
    column_dots(&q, &aq, &mut den);

    // a non-positive curvature means the column has no energy to shed;
    // fall back to the global Jacobi factor for it
    let rho = spectral_radius(&af, &dinv, prm.chebyshev_power_iters);
    let fallback = if rho > 0.0 { 4.0 / (3.0 * rho) } else { 2.0 / 3.0 };
    let omega: Vec<f64> = num
        .iter()
        .zip(&den)
        .map(|(&n, &d)| if d > 0.0 { (n / d).max(0.0) } else { fallback })
        .collect();

    // P = P_tent - q * diag(omega), merged row-wise on sorted patterns
    let n = a.nrows();
    let mut ptr = Vec::with_capacity(n + 1);
    ptr.push(0usize);
    let mut col = Vec::new();
    let mut val = Vec::new();
    for i in 0..n {
        let (tc, tv) = p_tent.row(i);
        let (qc, qv) = q.row(i);
        let (mut x, mut y) = (0, 0);
        while x < tc.len() || y < qc.len() {
            let jt = tc.get(x).copied().unwrap_or(usize::MAX);
            let jq = qc.get(y).copied().unwrap_or(usize::MAX);
            if jt < jq {
                col.push(jt);
                val.push(tv[x]);
                x += 1;
            } else if jq < jt {
                col.push(jq);
                val.push(-omega[jq] * qv[y]);
                y += 1;
            } else {
                col.push(jt);
                val.push(tv[x] - omega[jt] * qv[y]);
                x += 1;
                y += 1;
            }
        }
        ptr.push(col.len());
    }

    // restore the partition of unity on rows that interpolate at all
    for i in 0..n {
        let row = &mut val[ptr[i]..ptr[i + 1]];
        let sum: f64 = row.iter().sum();
        if sum.abs() > f64::EPSILON {
            for v in row.iter_mut() {
                *v /= sum;
            }
        }
    }

    Some(
        CrsMatrix::from_parts(n, nc, ptr, col, val)
            .expect("merged prolongator rows stay sorted"),
    )
}

fn scale_rows(a: &CrsMatrix, scale: &[f64]) -> CrsMatrix {
    let n = a.nrows();
    let mut ptr = Vec::with_capacity(n + 1);
    ptr.push(0usize);
    let mut col = Vec::new();
    let mut val = Vec::new();
    for i in 0..n {
        let (cols, vals) = a.row(i);
        for (&j, &v) in cols.iter().zip(vals) {
            col.push(j);
            val.push(scale[i] * v);
        }
        ptr.push(col.len());
    }
    CrsMatrix::from_parts(n, a.ncols(), ptr, col, val)
        .expect("row scaling preserves CRS structure")
}
