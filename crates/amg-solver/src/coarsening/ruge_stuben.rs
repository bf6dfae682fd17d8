//! Classical Ruge-Stuben coarsening: C/F splitting plus classical
//! interpolation.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use amg_core::{AmgParams, CrsMatrix, Result};

use super::strength::{self, Connectivity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PointState {
    Undecided,
    Coarse,
    Fine,
}

/// Two-pass classical C/F splitting.
///
/// First pass: each point is weighted by the number of points that strongly
/// depend on it; the heaviest point (ties broken toward the lower row
/// index) becomes coarse, its undecided strong dependents become fine, and
/// every undecided point a new fine point depends on gains weight. Second
/// pass: an F-F strong edge whose endpoints share no coarse interpolation
/// point promotes its higher-index endpoint.
fn split(s: &Connectivity, st: &Connectivity) -> Vec<PointState> {
    let n = s.nrows();
    let mut state = vec![PointState::Undecided; n];
    let mut measure: Vec<usize> = (0..n).map(|i| st.row(i).len()).collect();

    let mut heap: BinaryHeap<(usize, Reverse<usize>)> = (0..n)
        .map(|i| (measure[i], Reverse(i)))
        .collect();

    while let Some((m, Reverse(i))) = heap.pop() {
        // stale entry: the point was decided or its measure grew since
        if state[i] != PointState::Undecided || m != measure[i] {
            continue;
        }
        state[i] = PointState::Coarse;
        for &j in st.row(i) {
            if state[j] != PointState::Undecided {
                continue;
            }
            state[j] = PointState::Fine;
            for &k in s.row(j) {
                if state[k] == PointState::Undecided {
                    measure[k] += 1;
                    heap.push((measure[k], Reverse(k)));
                }
            }
        }
    }

    // second pass: every strong F-F pair needs a common coarse neighbor
    for i in 0..n {
        if state[i] != PointState::Fine {
            continue;
        }
        for &j in s.row(i) {
            if j <= i || state[j] != PointState::Fine {
                continue;
            }
            let common = s
                .row(i)
                .iter()
                .any(|&k| state[k] == PointState::Coarse && s.row(j).contains(&k));
            if !common {
                state[j] = PointState::Coarse;
            }
        }
    }

    state
}

/// Classical interpolation operator for a given splitting.
///
/// Coarse rows are identity rows on their coarse index. A fine row
/// interpolates from its strong coarse neighbors; strong fine neighbors are
/// distributed through shared coarse points and weak couplings are folded
/// into the diagonal.
fn interpolation(a: &CrsMatrix, s: &Connectivity, state: &[PointState]) -> Result<CrsMatrix> {
    let n = a.nrows();
    let mut cidx = vec![usize::MAX; n];
    let mut nc = 0;
    for i in 0..n {
        if state[i] == PointState::Coarse {
            cidx[i] = nc;
            nc += 1;
        }
    }

    let mut ptr = Vec::with_capacity(n + 1);
    ptr.push(0usize);
    let mut col = Vec::new();
    let mut val = Vec::new();

    let mut weight = vec![0.0f64; nc];

    for i in 0..n {
        if state[i] == PointState::Coarse {
            col.push(cidx[i]);
            val.push(1.0);
            ptr.push(col.len());
            continue;
        }

        let (cols, vals) = a.row(i);
        let strong = s.row(i);
        let coarse: Vec<usize> = strong
            .iter()
            .copied()
            .filter(|&j| state[j] == PointState::Coarse)
            .collect();

        let mut diag = 0.0;
        for (&j, &v) in cols.iter().zip(vals) {
            if j == i {
                diag += v;
            } else if !strong.contains(&j) {
                // weak coupling folded into the diagonal
                diag += v;
            }
        }

        for &j in &coarse {
            weight[cidx[j]] = 0.0;
        }
        for (&j, &v) in cols.iter().zip(vals) {
            if j == i || !strong.contains(&j) {
                continue;
            }
            match state[j] {
                PointState::Coarse => weight[cidx[j]] += v,
                PointState::Fine => {
                    // distribute a strong F neighbor through the coarse
                    // points both rows share
                    let (jcols, jvals) = a.row(j);
                    let mut shared = 0.0;
                    for (&k, &w) in jcols.iter().zip(jvals) {
                        if coarse.contains(&k) {
                            shared += w;
                        }
                    }
                    if shared != 0.0 {
                        let scale = v / shared;
                        for (&k, &w) in jcols.iter().zip(jvals) {
                            if coarse.contains(&k) {
                                weight[cidx[k]] += scale * w;
                            }
                        }
                    } else {
                        diag += v;
                    }
                }
                PointState::Undecided => unreachable!("splitting decides every point"),
            }
        }

        if diag == 0.0 {
            return Err(amg_core::AmgError::SingularDiagonal(i));
        }
        for &j in &coarse {
            col.push(cidx[j]);
            val.push(-weight[cidx[j]] / diag);
        }
        ptr.push(col.len());
    }

    CrsMatrix::from_parts(n, nc, ptr, col, val)
}

/// Ruge-Stuben prolongation for one level; `None` when no coarse points
/// could be selected.
pub fn prolongation(a: &CrsMatrix, prm: &AmgParams) -> Result<Option<CrsMatrix>> {
    let s = strength::classical(a, prm.eps_strong);
    let st = s.transpose();
    let state = split(&s, &st);

    if !state.iter().any(|&x| x == PointState::Coarse) {
        return Ok(None);
    }
    interpolation(a, &s, &state).map(Some)
}
