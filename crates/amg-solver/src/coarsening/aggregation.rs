//! Greedy pointwise aggregation and the tentative prolongator.

use amg_core::{AmgParams, CrsMatrix};

use super::strength::{self, Connectivity};

/// A point with no strong neighbors stays out of the coarse space;
/// smoothing alone corrects it.
pub const ISOLATED: i64 = -1;
const UNDECIDED: i64 = -2;

/// Aggregate map: `id[i]` is the aggregate of fine point `i`, or
/// [`ISOLATED`].
#[derive(Debug, Clone)]
pub struct Aggregates {
    pub count: usize,
    pub id: Vec<i64>,
}

/// Greedy aggregation over the strength graph.
///
/// Pass one scans points in index order; a point whose strong neighborhood
/// is fully unassigned seeds a new aggregate containing itself and those
/// neighbors. Pass two glues leftovers to the neighboring aggregate with
/// the most strong connections (ties toward the lower aggregate id). Pass
/// three turns any remainder into singletons.
pub fn aggregates(s: &Connectivity) -> Aggregates {
    let n = s.nrows();
    let mut id = vec![UNDECIDED; n];
    let mut count: i64 = 0;

    for i in 0..n {
        if s.row(i).is_empty() {
            id[i] = ISOLATED;
        }
    }

    for i in 0..n {
        if id[i] != UNDECIDED {
            continue;
        }
        let nbr = s.row(i);
        if nbr.iter().all(|&j| id[j] == UNDECIDED) {
            id[i] = count;
            for &j in nbr {
                id[j] = count;
            }
            count += 1;
        }
    }

    for i in 0..n {
        if id[i] != UNDECIDED {
            continue;
        }
        let mut best: Option<(usize, i64)> = None;
        for &j in s.row(i) {
            let g = id[j];
            if g < 0 {
                continue;
            }
            let votes = s.row(i).iter().filter(|&&k| id[k] == g).count();
            match best {
                Some((v, b)) if votes < v || (votes == v && g >= b) => {}
                _ => best = Some((votes, g)),
            }
        }
        if let Some((_, g)) = best {
            id[i] = g;
        }
    }

    for i in 0..n {
        if id[i] == UNDECIDED {
            id[i] = count;
            count += 1;
        }
    }

    Aggregates {
        count: count as usize,
        id,
    }
}

/// Tentative prolongator: a unit entry per aggregated point.
pub fn tentative(aggr: &Aggregates) -> CrsMatrix {
    let n = aggr.id.len();
    let mut ptr = Vec::with_capacity(n + 1);
    ptr.push(0usize);
    let mut col = Vec::new();
    let mut val = Vec::new();
    for &g in &aggr.id {
        if g >= 0 {
            col.push(g as usize);
            val.push(1.0);
        }
        ptr.push(col.len());
    }
    CrsMatrix::from_parts(n, aggr.count, ptr, col, val)
        .expect("tentative prolongator is valid CRS by construction")
}

/// Plain-aggregation prolongation; `None` when nothing aggregates.
pub fn prolongation(a: &CrsMatrix, prm: &AmgParams) -> Option<CrsMatrix> {
    let s = strength::aggregation(a, prm.aggr_eps_strong);
    let aggr = aggregates(&s);
    if aggr.count == 0 {
        return None;
    }
    Some(tentative(&aggr))
}
