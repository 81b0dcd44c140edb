//! Validation tests comparing FVM solutions against analytical solutions
//!
//! Steady diffusion, transient diffusion, advection-diffusion and nonlinear
//! diffusion problems on structured grids, each checked against its closed
//! form.

use approx::assert_relative_eq;
use fvm::{
    BoundaryConditions, Equation, Expr, FvMesh, Mesh, MeshRef, SolverConfig, Term, Variable,
    assemble,
};
use std::sync::Arc;

fn grid_1d(nx: usize, dx: f64) -> (Arc<FvMesh>, MeshRef) {
    let mesh = Arc::new(FvMesh::grid_1d(nx, dx).unwrap());
    let m: MeshRef = mesh.clone();
    (mesh, m)
}

fn dirichlet(mesh: &FvMesh, left: f64, right: f64) -> BoundaryConditions {
    let mut bcs = BoundaryConditions::new();
    bcs.add_fixed_value(mesh.faces_left(), left);
    bcs.add_fixed_value(mesh.faces_right(), right);
    bcs
}

fn cell_x(mesh: &FvMesh) -> Vec<f64> {
    (0..mesh.num_cells()).map(|c| mesh.cell_center(c)[0]).collect()
}

/// Abramowitz & Stegun 7.1.26, |error| < 1.5e-7
fn erf(x: f64) -> f64 {
    let sign = x.signum();
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.3275911 * x);
    let poly = t
        * (0.254829592
            + t * (-0.284496736 + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));
    sign * (1.0 - poly * (-x * x).exp())
}

/// Steady diffusion between two fixed values is a straight line
#[test]
fn test_steady_diffusion_ramp() {
    let (mesh, m) = grid_1d(50, 1.0);
    let phi = Variable::cell_scalar("phi", m, 0.0);
    let bcs = dirichlet(&mesh, 0.0, 1.0);

    Term::diffusion(1.0)
        .solve(&phi, &bcs, 1.0, &SolverConfig::default())
        .unwrap();

    let values = phi.values();
    for (v, x) in values.iter().zip(cell_x(&mesh)) {
        assert_relative_eq!(*v, x / 50.0, epsilon = 1e-8);
    }
}

#[test]
fn test_linear_profile_for_every_grid_size() {
    for n in 2..=12 {
        let (mesh, m) = grid_1d(n, 1.0 / n as f64);
        let phi = Variable::cell_scalar("phi", m, 0.0);
        let bcs = dirichlet(&mesh, 2.0, -1.0);

        Term::diffusion(0.3)
            .solve(&phi, &bcs, 1.0, &SolverConfig::lu())
            .unwrap();

        for (v, x) in phi.values().iter().zip(cell_x(&mesh)) {
            assert_relative_eq!(*v, 2.0 - 3.0 * x, epsilon = 1e-12);
        }
    }
}

/// With insulated ends a uniform field never changes
#[test]
fn test_insulated_transient_keeps_constant() {
    let (mesh, m) = grid_1d(20, 0.05);
    let phi = Variable::cell_scalar("phi", m, 3.0).with_history();
    let mut bcs = BoundaryConditions::new();
    bcs.add_fixed_flux(mesh.faces_left(), 0.0);
    bcs.add_fixed_flux(mesh.faces_right(), 0.0);

    let eq = Term::transient(1.0).equals(Term::diffusion(1.0));
    for _ in 0..5 {
        phi.update_old();
        eq.solve(&phi, &bcs, 0.01, &SolverConfig::default()).unwrap();
    }

    for v in phi.values().iter() {
        assert_relative_eq!(*v, 3.0, epsilon = 1e-10);
    }
}

/// Explicit diffusion into a semi-infinite medium follows `1 − erf(x / 2√(Dt))`
#[test]
fn test_explicit_diffusion_matches_erf() {
    let (nx, dx, dt, steps) = (100, 1.0, 0.1, 100);
    let (mesh, m) = grid_1d(nx, dx);
    let phi = Variable::cell_scalar("phi", m, 0.0).with_history();
    let bcs = dirichlet(&mesh, 1.0, 0.0);

    let eq = Term::transient(1.0).equals(Term::explicit_diffusion(1.0));
    for _ in 0..steps {
        phi.update_old();
        eq.solve(&phi, &bcs, dt, &SolverConfig::default()).unwrap();
    }

    let t = steps as f64 * dt;
    let values = phi.values();
    for (v, x) in values.iter().zip(cell_x(&mesh)) {
        let exact = 1.0 - erf(x / (2.0 * t.sqrt()));
        assert!(
            (v - exact).abs() < 2e-3,
            "x = {x}: got {v}, expected {exact}"
        );
    }
}

/// A unit slab cooled through a cold left face follows `erf(x / 2√(Dt))`
#[test]
fn test_explicit_cooling_from_fixed_face() {
    let (nx, dx, dt, steps) = (100, 1.0, 0.1, 100);
    let (mesh, m) = grid_1d(nx, dx);
    let phi = Variable::cell_scalar("phi", m, 1.0).with_history();
    // Right face left unconstrained: no flux
    let mut bcs = BoundaryConditions::new();
    bcs.add_fixed_value(mesh.faces_left(), 0.0);

    let eq = Term::transient(1.0).equals(Term::explicit_diffusion(1.0));
    for _ in 0..steps {
        phi.update_old();
        eq.solve(&phi, &bcs, dt, &SolverConfig::default()).unwrap();
    }

    let t = steps as f64 * dt;
    let values = phi.values();
    for (v, x) in values.iter().zip(cell_x(&mesh)) {
        let exact = erf(x / (2.0 * t.sqrt()));
        assert!(
            (v - exact).abs() < 2e-3,
            "x = {x}: got {v}, expected {exact}"
        );
    }
}

fn advection_diffusion(scheme_exponential: bool) -> (Vec<f64>, Vec<f64>) {
    let (u, d): (f64, f64) = (10.0, 1.0);
    let (mesh, m) = grid_1d(50, 0.02);
    let phi = Variable::cell_scalar("phi", m, 0.0);
    let bcs = dirichlet(&mesh, 0.0, 1.0);

    let diffusion = Term::diffusion(d);
    let convection = if scheme_exponential {
        Term::exponential_convection(u, &diffusion)
    } else {
        Term::power_law_convection(u, &diffusion)
    };
    convection
        .equals(diffusion)
        .solve(&phi, &bcs, 1.0, &SolverConfig::default())
        .unwrap();

    let exact = cell_x(&mesh)
        .iter()
        .map(|x| (u * x / d).exp_m1() / (u / d).exp_m1())
        .collect();
    (phi.values().to_vec(), exact)
}

/// The exponential scheme reproduces steady 1-D advection-diffusion exactly
#[test]
fn test_exponential_scheme_is_exact() {
    let (values, exact) = advection_diffusion(true);
    for (v, e) in values.iter().zip(&exact) {
        assert_relative_eq!(*v, *e, epsilon = 1e-8);
    }
}

#[test]
fn test_power_law_scheme_is_close() {
    let (values, exact) = advection_diffusion(false);
    for (v, e) in values.iter().zip(&exact) {
        assert!((v - e).abs() < 1e-2);
    }
}

/// Uniform x-velocity on a 2-D grid gives the 1-D profile in every row
#[test]
fn test_exponential_scheme_in_2d() {
    let (nx, ny) = (10, 3);
    let mesh = Arc::new(FvMesh::grid_2d(nx, ny, 0.1, 0.1).unwrap());
    let m: MeshRef = mesh.clone();
    let phi = Variable::cell_scalar("phi", m, 0.0);
    let bcs = dirichlet(&mesh, 0.0, 1.0);

    let diffusion = Term::diffusion(1.0);
    Term::exponential_convection(Expr::vector(&[10.0, 0.0]), &diffusion)
        .equals(diffusion)
        .solve(&phi, &bcs, 1.0, &SolverConfig::gmres(1e-12, 500))
        .unwrap();

    let values = phi.values();
    for j in 0..ny {
        for i in 0..nx {
            let c = i + j * nx;
            let x = mesh.cell_center(c)[0];
            let exact = (10.0 * x).exp_m1() / 10.0_f64.exp_m1();
            assert_relative_eq!(values[c], exact, epsilon = 1e-8);
        }
    }
}

/// Convection-diffusion coefficients stay an M-matrix for any Péclet number
#[test]
fn test_power_law_coefficients_are_positive() {
    for pe in [0.0, 1.0, 10.0, 100.0, -100.0] {
        let (mesh, m) = grid_1d(8, 1.0);
        let phi = Variable::cell_scalar("phi", m, 0.0);
        let bcs = dirichlet(&mesh, 0.0, 1.0);

        let diffusion = Term::diffusion(1.0);
        let eq = Term::power_law_convection(pe, &diffusion).equals(diffusion);
        let system = assemble(&eq, &phi, &bcs, 1.0).unwrap();

        for row in 0..system.size() {
            let mut diag = 0.0;
            let mut off_sum = 0.0;
            for (col, v) in system.matrix.row_entries(row) {
                if col == row {
                    diag += v;
                } else {
                    assert!(v <= 0.0, "Pe = {pe}: a[{row}][{col}] = {v}");
                    off_sum -= v;
                }
            }
            assert!(diag > 0.0, "Pe = {pe}: diagonal of row {row} is {diag}");
            assert!(diag + 1e-12 >= off_sum);
        }
    }
}

/// ∇·((1 + φ)∇φ) = 0 has `(1 + φ)² = 4 − 3x` for φ(0) = 1, φ(1) = 0
#[test]
fn test_nonlinear_sweeps_converge() {
    let (mesh, m) = grid_1d(10, 0.1);
    let phi = Variable::cell_scalar("phi", m, 0.0);
    let bcs = dirichlet(&mesh, 1.0, 0.0);

    let eq = Equation::from(Term::diffusion(1.0 + &phi));
    let solver = SolverConfig::lu();

    let mut residuals = Vec::new();
    for _ in 0..30 {
        let residual = eq.sweep(&phi, &bcs, 1.0, &solver).unwrap();
        residuals.push(residual);
        if residual < 1e-8 {
            break;
        }
    }

    assert_relative_eq!(residuals[0], 20.0, epsilon = 1e-12);
    assert!(*residuals.last().unwrap() < 1e-8);
    assert!(residuals.len() < 15);
    for pair in residuals.windows(2) {
        assert!(pair[1] < pair[0], "residuals not decreasing: {residuals:?}");
    }

    for (v, x) in phi.values().iter().zip(cell_x(&mesh)) {
        assert!((v - ((4.0 - 3.0 * x).sqrt() - 1.0)).abs() < 5e-3);
    }
}

/// ∇²φ = φ³ with φ = 1 at both ends: the sink coefficient `φ²` is
/// re-evaluated on every sweep
#[test]
fn test_sweeps_with_field_dependent_sink() {
    let (mesh, m) = grid_1d(10, 0.1);
    let phi = Variable::cell_scalar("phi", m, 0.0);
    let bcs = dirichlet(&mesh, 1.0, 1.0);

    let eq = Term::implicit_source(&phi * &phi).equals(Term::diffusion(1.0));
    let solver = SolverConfig::lu();

    let mut residuals = Vec::new();
    for _ in 0..30 {
        let residual = eq.sweep(&phi, &bcs, 1.0, &solver).unwrap();
        residuals.push(residual);
        if residual < 1e-9 {
            break;
        }
    }

    // φ = 0 leaves only the two boundary rows, then φ = 1 leaves the sink
    assert_relative_eq!(residuals[0], 800.0_f64.sqrt(), epsilon = 1e-9);
    assert_relative_eq!(residuals[1], 0.1 * 10.0_f64.sqrt(), epsilon = 1e-9);
    assert!(*residuals.last().unwrap() < 1e-9);
    for pair in residuals.windows(2) {
        assert!(pair[1] <= pair[0], "residuals increased: {residuals:?}");
    }

    let values = phi.values();
    for i in 0..5 {
        assert_relative_eq!(values[i], values[9 - i], epsilon = 1e-10);
        assert!(values[i] > 0.9 && values[i] < 1.0);
    }
    assert!(values[4] < values[0]);
}

/// Face diffusivity given directly: a weak interior face and an inflow flux
#[test]
fn test_face_diffusivity_with_fixed_flux() {
    let (mesh, m) = grid_1d(2, 1.0);
    let phi = Variable::cell_scalar("phi", m.clone(), 0.0);
    let gamma = Variable::face_scalar("gamma", m, 1.0);
    gamma.set_values(&ndarray::array![1.0, 0.1, 1.0]).unwrap();

    let mut bcs = BoundaryConditions::new();
    bcs.add_fixed_value(mesh.faces_left(), 0.0);
    bcs.add_fixed_flux(mesh.faces_right(), 1.0);

    Term::diffusion(&gamma)
        .solve(&phi, &bcs, 1.0, &SolverConfig::lu())
        .unwrap();

    let values = phi.values();
    assert_relative_eq!(values[0], 0.5, epsilon = 1e-12);
    assert_relative_eq!(values[1], 10.5, epsilon = 1e-12);
}

/// Harmonic face averaging makes a two-material slab exact
#[test]
fn test_harmonic_diffusivity_two_materials() {
    let (mesh, m) = grid_1d(20, 1.0);
    let phi = Variable::cell_scalar("phi", m.clone(), 0.0);
    let gamma = Variable::cell_scalar("gamma", m, 1.0);
    let x = cell_x(&mesh);
    gamma
        .set_values(&x.iter().map(|&x| if x < 10.0 { 1.0 } else { 10.0 }).collect())
        .unwrap();
    let bcs = dirichlet(&mesh, 0.0, 1.0);

    Term::diffusion(&gamma)
        .solve(&phi, &bcs, 1.0, &SolverConfig::lu())
        .unwrap();

    // Series resistance 10/1 + 10/10 = 11
    let values = phi.values();
    for (v, x) in values.iter().zip(&x) {
        let exact = if *x < 10.0 {
            x / 11.0
        } else {
            (10.0 + (x - 10.0) / 10.0) / 11.0
        };
        assert_relative_eq!(*v, exact, epsilon = 1e-12);
    }
}

/// A source balanced by a sink settles at `S / k`
#[test]
fn test_source_and_sink_balance() {
    let (_, m) = grid_1d(5, 0.2);
    let phi = Variable::cell_scalar("phi", m, 0.0);

    Term::implicit_source(4.0)
        .equals(Term::source(2.0))
        .solve(&phi, &BoundaryConditions::new(), 1.0, &SolverConfig::default())
        .unwrap();

    for v in phi.values().iter() {
        assert_relative_eq!(*v, 0.5, epsilon = 1e-12);
    }
}
