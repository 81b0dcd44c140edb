//! JSON case configuration for structured-grid problems
//!
//! A case describes the scalar transport equation
//!
//! ```text
//! ∂(cφ)/∂t + ∇·(uφ) + kφ = ∇·(Γ∇φ) + S
//! ```
//!
//! on a 1-D or 2-D grid, with conditions on the named face sets of the grid.
//! Terms whose coefficient is zero are left out, so `transient = 0` gives a
//! steady problem and an empty velocity gives pure diffusion.

use crate::boundary::{BoundaryCondition, BoundaryConditions, BoundaryKind};
use crate::equation::Equation;
use crate::error::{FvmError, Result};
use crate::field::{Expr, Variable};
use crate::mesh::{FvMesh, Mesh, MeshRef};
use crate::solver::SolverConfig;
use crate::term::{ConvectionScheme, Term};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Complete case loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseConfig {
    /// Case name, copied into the result
    #[serde(default)]
    pub name: String,
    /// Grid specification
    pub grid: GridConfig,
    /// Equation coefficients
    #[serde(default)]
    pub physics: PhysicsConfig,
    /// Boundary conditions by face set
    #[serde(default)]
    pub boundaries: Vec<BoundaryConfig>,
    /// Initial value of φ in every cell
    #[serde(default)]
    pub initial_value: f64,
    /// Time stepping and sweeps
    #[serde(default)]
    pub time: TimeConfig,
    /// Linear solver
    #[serde(default)]
    pub solver: SolverConfig,
}

/// Grid configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GridConfig {
    #[serde(rename = "1d")]
    /// Uniform 1-D grid with `left` and `right` face sets
    OneD {
        /// Number of cells
        nx: usize,
        /// Cell width
        dx: f64,
    },
    #[serde(rename = "2d")]
    /// Uniform 2-D grid with `left`, `right`, `bottom` and `top` face sets
    TwoD {
        nx: usize,
        ny: usize,
        dx: f64,
        dy: f64,
    },
}

/// Uniform equation coefficients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Transient coefficient `c` (0 = steady)
    pub transient: f64,
    /// Diffusivity `Γ`
    pub diffusion: f64,
    /// Velocity `u`, one component per grid dimension (empty = no convection)
    pub velocity: Vec<f64>,
    /// Convection weighting
    pub scheme: ConvectionScheme,
    /// Linear sink coefficient `k` (implicit)
    pub implicit_source: f64,
    /// Volumetric source `S` (explicit)
    pub source: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            transient: 0.0,
            diffusion: 1.0,
            velocity: Vec::new(),
            scheme: ConvectionScheme::PowerLaw,
            implicit_source: 0.0,
            source: 0.0,
        }
    }
}

/// One boundary condition on a named face set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryConfig {
    /// Face set name (`left`, `right`, `bottom`, `top`)
    pub faces: String,
    pub kind: BoundaryKind,
    pub value: f64,
}

/// Time stepping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// Time step
    pub dt: f64,
    /// Number of time steps (1 for steady cases)
    pub steps: usize,
    /// Maximum sweeps per step
    pub sweeps: usize,
    /// Stop sweeping once the residual drops below this value
    pub residual_tolerance: f64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            dt: 1.0,
            steps: 1,
            sweeps: 1,
            residual_tolerance: 0.0,
        }
    }
}

/// Outcome of [`CaseConfig::run`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResult {
    pub name: String,
    /// Simulated time, `steps · dt` for transient cases
    pub time: f64,
    pub steps: usize,
    /// Total number of sweeps over all steps
    pub sweeps: usize,
    /// Residual of the last sweep
    pub residual: f64,
    /// Cell centres, `dim` coordinates each
    pub cell_centers: Vec<Vec<f64>>,
    /// Final cell values
    pub values: Vec<f64>,
}

impl CaseConfig {
    /// Load configuration from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| FvmError::Case(format!("Failed to read config file: {}", e)))?;

        let config: CaseConfig = serde_json::from_str(&contents)
            .map_err(|e| FvmError::Case(format!("Failed to parse JSON: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| FvmError::Case(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, json)
            .map_err(|e| FvmError::Case(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    pub fn build_mesh(&self) -> Result<Arc<FvMesh>> {
        let mesh = match self.grid {
            GridConfig::OneD { nx, dx } => FvMesh::grid_1d(nx, dx)?,
            GridConfig::TwoD { nx, ny, dx, dy } => FvMesh::grid_2d(nx, ny, dx, dy)?,
        };
        Ok(Arc::new(mesh))
    }

    /// `transient + convection + sink == diffusion + source`
    pub fn build_equation(&self, mesh: &dyn Mesh) -> Result<Equation> {
        let p = &self.physics;
        let diffusion = Term::diffusion(p.diffusion);
        let mut lhs = Equation::new();

        if p.transient != 0.0 {
            lhs = lhs + Term::transient(p.transient);
        }
        if !p.velocity.is_empty() {
            if p.velocity.len() != mesh.dim() {
                return Err(FvmError::Case(format!(
                    "velocity has {} components, grid is {}-D",
                    p.velocity.len(),
                    mesh.dim()
                )));
            }
            lhs = lhs
                + Term::convection(Expr::vector(&p.velocity), p.scheme).with_diffusion(&diffusion);
        }
        if p.implicit_source != 0.0 {
            lhs = lhs + Term::implicit_source(p.implicit_source);
        }

        let mut rhs = Equation::from(diffusion);
        if p.source != 0.0 {
            rhs = rhs + Term::source(p.source);
        }
        Ok(lhs.equals(rhs))
    }

    pub fn boundary_conditions(&self, mesh: &dyn Mesh) -> Result<BoundaryConditions> {
        let mut bcs = BoundaryConditions::new();
        for bc in &self.boundaries {
            bcs.push(BoundaryCondition::on_set(mesh, &bc.faces, bc.kind, bc.value)?);
        }
        Ok(bcs)
    }

    /// Run every time step and sweep, returning the final field
    pub fn run(&self) -> Result<CaseResult> {
        let mesh = self.build_mesh()?;
        let equation = self.build_equation(mesh.as_ref())?;
        let bcs = self.boundary_conditions(mesh.as_ref())?;
        let m: MeshRef = mesh.clone();
        let phi = Variable::cell_scalar("phi", m, self.initial_value).with_history();

        let steps = if equation.is_transient() {
            self.time.steps
        } else {
            1
        };
        let mut total_sweeps = 0;
        let mut residual = 0.0;

        for step in 0..steps {
            phi.update_old();
            for _ in 0..self.time.sweeps.max(1) {
                residual = equation.sweep(&phi, &bcs, self.time.dt, &self.solver)?;
                total_sweeps += 1;
                if residual < self.time.residual_tolerance {
                    break;
                }
            }
            if self.solver.verbosity > 0 {
                log::info!("Step {}/{}: residual {:.3e}", step + 1, steps, residual);
            }
        }

        let dim = mesh.dim();
        let cell_centers = (0..mesh.num_cells())
            .map(|c| mesh.cell_center(c)[..dim].to_vec())
            .collect();

        Ok(CaseResult {
            name: self.name.clone(),
            time: if equation.is_transient() {
                steps as f64 * self.time.dt
            } else {
                0.0
            },
            steps,
            sweeps: total_sweeps,
            residual,
            cell_centers,
            values: phi.values().to_vec(),
        })
    }
}

/// Steady 1-D diffusion between φ = 0 and φ = 1
pub fn create_default_config() -> CaseConfig {
    CaseConfig {
        name: "steady-diffusion".to_string(),
        grid: GridConfig::OneD { nx: 50, dx: 1.0 },
        physics: PhysicsConfig::default(),
        boundaries: vec![
            BoundaryConfig {
                faces: "left".to_string(),
                kind: BoundaryKind::FixedValue,
                value: 0.0,
            },
            BoundaryConfig {
                faces: "right".to_string(),
                kind: BoundaryKind::FixedValue,
                value: 1.0,
            },
        ],
        initial_value: 0.0,
        time: TimeConfig::default(),
        solver: SolverConfig::default(),
    }
}
