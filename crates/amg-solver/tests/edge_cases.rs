//! Degenerate inputs: trivial operators, singular diagonals, breakdowns.

use amg_core::{
    AmgError, AmgParams, CoarseningKind, CrsMatrix, RelaxationKind, Result, SolverKind,
    SolverParams, SparseTriplets,
};
use amg_solver::backend::{Backend, NativeBackend, VectorAccess};
use amg_solver::krylov::{self, Precond};
use amg_solver::{Hierarchy, build};

fn diag_matrix(values: &[f64]) -> CrsMatrix {
    let n = values.len();
    let mut t = SparseTriplets::new(n, n);
    for (i, &v) in values.iter().enumerate() {
        t.push(i, i, v);
    }
    CrsMatrix::from_triplets(&t).unwrap()
}

/// Diagonally dominant tridiagonal matrix with one zeroed diagonal entry.
fn tridiag_with_zero_diag(n: usize, zero_row: usize) -> CrsMatrix {
    let mut t = SparseTriplets::new(n, n);
    for i in 0..n {
        if i > 0 {
            t.push(i, i - 1, -1.0);
        }
        t.push(i, i, if i == zero_row { 0.0 } else { 4.0 });
        if i + 1 < n {
            t.push(i, i + 1, -1.0);
        }
    }
    CrsMatrix::from_triplets(&t).unwrap()
}

#[test]
fn identity_matrix_solves_in_one_application() {
    let n = 100;
    let a = CrsMatrix::identity(n);
    let mut hierarchy = build(a, AmgParams::default()).unwrap();
    // no strong connections: the matrix goes straight to the direct level
    assert_eq!(hierarchy.num_levels(), 1);

    let bk = NativeBackend;
    let b = bk.vector_from(&(0..n).map(|i| (i as f64) - 50.0).collect::<Vec<_>>());
    let mut x = bk.create_vector(n);

    let report = krylov::solve(&SolverParams::default(), &mut hierarchy, &b, &mut x).unwrap();
    assert!(report.iterations <= 1);
    assert!(report.residual <= f64::EPSILON);
    for (xi, bi) in VectorAccess::as_slice(&x)
        .iter()
        .zip(VectorAccess::as_slice(&b))
    {
        assert!((xi - bi).abs() <= 1e-14);
    }
}

#[test]
fn diagonal_matrix_solves_in_one_iteration() {
    let n = 500;
    let entries: Vec<f64> = (1..=n).map(|i| i as f64).collect();
    let a = diag_matrix(&entries);
    let mut hierarchy = build(a, AmgParams::default()).unwrap();

    let bk = NativeBackend;
    let b = bk.vector_from(&entries);
    let mut x = bk.create_vector(n);

    let prm = SolverParams {
        solver: SolverKind::Cg,
        ..Default::default()
    };
    let report = krylov::solve(&prm, &mut hierarchy, &b, &mut x).unwrap();
    assert!(report.iterations <= 1);
    for &xi in VectorAccess::as_slice(&x) {
        assert!((xi - 1.0).abs() <= 1e-10);
    }
}

#[test]
fn zero_diagonal_row_is_fatal_to_ilu0_setup() {
    let a = tridiag_with_zero_diag(60, 30);
    let params = AmgParams {
        coarsening: CoarseningKind::Aggregation,
        relaxation: RelaxationKind::Ilu0,
        ncoarse: 10,
        ..Default::default()
    };
    assert!(matches!(
        build(a, params),
        Err(AmgError::SingularDiagonal(30))
    ));
}

#[test]
fn zero_diagonal_row_is_tolerated_by_spai0() {
    let a = tridiag_with_zero_diag(60, 30);
    let params = AmgParams {
        coarsening: CoarseningKind::Aggregation,
        relaxation: RelaxationKind::Spai0,
        ncoarse: 10,
        ..Default::default()
    };
    let hierarchy = build(a, params).unwrap();
    assert!(hierarchy.num_levels() >= 2);
}

struct Identity;

impl Precond<NativeBackend> for Identity {
    fn precond(
        &mut self,
        r: &nalgebra::DVector<f64>,
        z: &mut nalgebra::DVector<f64>,
    ) -> Result<()> {
        z.copy_from(r);
        Ok(())
    }
}

#[test]
fn bicgstab_reports_breakdown_on_a_skew_operator() {
    // <rhat, A rhat> vanishes for a skew-symmetric operator, which kills
    // the first alpha
    let mut t = SparseTriplets::new(2, 2);
    t.push(0, 1, 1.0);
    t.push(1, 0, -1.0);
    let a_host = CrsMatrix::from_triplets(&t).unwrap();

    let bk = NativeBackend;
    let a = bk.matrix_from_crs(a_host);
    let b = bk.vector_from(&[1.0, 1.0]);
    let mut x = bk.create_vector(2);

    let err = krylov::bicgstab::solve(&bk, &a, &mut Identity, &b, &mut x, &SolverParams::default());
    assert!(matches!(err, Err(AmgError::KrylovBreakdown(_))));
}

#[test]
fn solve_surfaces_nonconvergence_as_a_report() {
    // one iteration on a hard problem: the solver must hand back the
    // iterate and the residual instead of failing
    let n = 800;
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
    let a = CrsMatrix::from_triplets(&t).unwrap();

    let params = AmgParams {
        coarsening: CoarseningKind::Aggregation,
        relaxation: RelaxationKind::DampedJacobi,
        ..Default::default()
    };
    let mut hierarchy: Hierarchy<NativeBackend> = Hierarchy::build(NativeBackend, a, params).unwrap();

    let bk = NativeBackend;
    let b = bk.vector_from(&vec![1.0; n]);
    let mut x = bk.create_vector(n);

    let prm = SolverParams {
        maxiter: 1,
        tol: 1e-14,
        ..Default::default()
    };
    let report = krylov::solve(&prm, &mut hierarchy, &b, &mut x).unwrap();
    assert_eq!(report.iterations, 1);
    assert!(report.residual > prm.tol);
    // the iterate holds the last computed approximation
    assert!(VectorAccess::as_slice(&x).iter().any(|&v| v != 0.0));
}
