//! Solve/sweep behaviour and configuration errors seen from the public API

use fvm::{
    BoundaryConditions, ConvectionScheme, Equation, Expr, FvMesh, FvmError, Mesh, MeshRef,
    SolveOptions, SolverConfig, SolverError, Term, Variable,
};
use std::sync::Arc;

fn setup(n: usize) -> (Arc<FvMesh>, Variable, BoundaryConditions) {
    let mesh = Arc::new(FvMesh::grid_1d(n, 1.0).unwrap());
    let phi = Variable::cell_scalar("phi", mesh.clone() as MeshRef, 0.0);
    let mut bcs = BoundaryConditions::new();
    bcs.add_fixed_value(mesh.faces_left(), 0.0);
    bcs.add_fixed_value(mesh.faces_right(), 1.0);
    (mesh, phi, bcs)
}

#[test]
fn test_update_old_round_trip() {
    let (_, phi, _) = setup(4);
    let phi = phi.with_history();
    phi.set_value(2.0);
    phi.update_old();
    phi.set_value(3.0);

    assert!(phi.old_values().unwrap().iter().all(|&v| v == 2.0));
    assert!(phi.values().iter().all(|&v| v == 3.0));

    phi.update_old();
    assert!(phi.old_values().unwrap().iter().all(|&v| v == 3.0));
}

#[test]
fn test_solver_failure_leaves_variable_untouched() {
    let (_, phi, bcs) = setup(40);
    phi.set_value(0.25);

    let err = Term::diffusion(1.0)
        .solve(&phi, &bcs, 1.0, &SolverConfig::pcg(1e-14, 1))
        .unwrap_err();

    assert!(err.is_solver_failure());
    assert!(matches!(
        err,
        FvmError::Solver(SolverError::ConvergenceFailure(..))
    ));
    assert!(phi.values().iter().all(|&v| v == 0.25));
}

#[test]
fn test_transient_needs_history() {
    let (_, phi, bcs) = setup(3);
    let err = Term::transient(1.0)
        .equals(Term::diffusion(1.0))
        .solve(&phi, &bcs, 0.1, &SolverConfig::default())
        .unwrap_err();
    assert!(matches!(err, FvmError::MissingOldValue { ref name } if name == "phi"));
    assert!(err.is_configuration_error());
}

#[test]
fn test_invalid_time_step() {
    let (_, phi, bcs) = setup(3);
    let phi = phi.with_history();
    let eq = Term::transient(1.0).equals(Term::diffusion(1.0));
    for dt in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let err = eq
            .solve(&phi, &bcs, dt, &SolverConfig::default())
            .unwrap_err();
        assert!(matches!(err, FvmError::InvalidTimeStep(_)));
    }

    // Steady equations never read dt
    Term::diffusion(1.0)
        .solve(&phi, &bcs, 0.0, &SolverConfig::default())
        .unwrap();
}

#[test]
fn test_companion_diffusion_is_required() {
    let (_, phi, bcs) = setup(3);
    let err = Term::convection(1.0, ConvectionScheme::PowerLaw)
        .solve(&phi, &bcs, 1.0, &SolverConfig::default())
        .unwrap_err();
    assert!(matches!(
        err,
        FvmError::MissingCompanionDiffusion {
            scheme: ConvectionScheme::PowerLaw
        }
    ));

    // Upwind needs none
    let eq = Term::convection(1.0, ConvectionScheme::Upwind).equals(Term::diffusion(1.0));
    eq.solve(&phi, &bcs, 1.0, &SolverConfig::default()).unwrap();
}

#[test]
fn test_mesh_and_face_set_errors() {
    let (mesh, phi, bcs) = setup(3);
    let other: MeshRef = Arc::new(FvMesh::grid_1d(3, 1.0).unwrap());
    let gamma = Variable::cell_scalar("gamma", other, 1.0);

    let err = Term::diffusion(&gamma)
        .solve(&phi, &bcs, 1.0, &SolverConfig::default())
        .unwrap_err();
    assert!(matches!(err, FvmError::MeshMismatch));

    assert!(matches!(
        mesh.faces("outlet"),
        Err(FvmError::UnknownFaceSet(ref name)) if name == "outlet"
    ));
}

#[test]
fn test_velocity_rank_mismatch() {
    let mesh = Arc::new(FvMesh::grid_2d(3, 3, 1.0, 1.0).unwrap());
    let phi = Variable::cell_scalar("phi", mesh.clone() as MeshRef, 0.0);
    let bcs = BoundaryConditions::new();

    let diffusion = Term::diffusion(1.0);
    let err = Term::power_law_convection(Expr::vector(&[1.0, 0.0, 0.0]), &diffusion)
        .equals(diffusion)
        .solve(&phi, &bcs, 1.0, &SolverConfig::default())
        .unwrap_err();
    assert!(matches!(
        err,
        FvmError::RankMismatch {
            expected: 2,
            found: 3
        }
    ));
}

#[test]
fn test_face_claimed_twice() {
    let (mesh, phi, mut bcs) = setup(3);
    bcs.add_fixed_flux(mesh.faces_right(), 0.0);
    let err = Term::diffusion(1.0)
        .solve(&phi, &bcs, 1.0, &SolverConfig::default())
        .unwrap_err();
    assert!(matches!(err, FvmError::BoundaryConflict { face } if face == mesh.faces_right()[0]));
}

/// Sign algebra: `a == b` and `a − b == 0` and `−(b − a) == 0` give one system
#[test]
fn test_equation_forms_agree() {
    let (_, phi, bcs) = setup(5);
    let solver = SolverConfig::lu();

    let forms: Vec<Equation> = vec![
        Term::implicit_source(1.0).equals(Term::diffusion(2.0) + 1.0),
        Term::implicit_source(1.0) - Term::diffusion(2.0) - 1.0,
        -(Term::diffusion(2.0) + 1.0 - Term::implicit_source(1.0)),
    ];

    let mut solutions = Vec::new();
    for eq in &forms {
        phi.set_value(0.0);
        eq.solve(&phi, &bcs, 1.0, &solver).unwrap();
        solutions.push(phi.values());
    }
    for other in &solutions[1..] {
        for (a, b) in solutions[0].iter().zip(other.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}

#[test]
fn test_solve_options() {
    let (_, phi, bcs) = setup(6);
    let options = SolveOptions::new(bcs).with_solver(SolverConfig::bicgstab(1e-12, 200));
    let eq = Equation::from(Term::diffusion(1.0));

    let first = eq.sweep_with(&phi, &options).unwrap();
    assert!(first > 0.0);
    let second = eq.sweep_with(&phi, &options).unwrap();
    assert!(second < 1e-8);

    for (i, v) in phi.values().iter().enumerate() {
        assert!((v - (i as f64 + 0.5) / 6.0).abs() < 1e-8);
    }
}
