//! Finite-volume case runner
//!
//! Loads a JSON case (see `cases/`), runs every time step and sweep and
//! writes the final cell values as JSON.

use clap::{Parser, ValueEnum};
use fvm::SolverType;
use fvm::config::{CaseConfig, GridConfig, create_default_config};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "fvm-case")]
#[command(about = "Scalar transport solver using the Finite Volume Method")]
struct Args {
    /// Path to JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output JSON file path
    #[arg(short, long, default_value = "output_fvm.json")]
    output: PathBuf,

    /// Override solver method
    #[arg(short, long)]
    solver: Option<CliSolverType>,

    /// Override the number of time steps
    #[arg(long)]
    steps: Option<usize>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliSolverType {
    Auto,
    Lu,
    Pcg,
    Cg,
    Cgs,
    Bicgstab,
    Gmres,
    GmresIlu,
}

impl From<CliSolverType> for SolverType {
    fn from(cli: CliSolverType) -> Self {
        match cli {
            CliSolverType::Auto => SolverType::Auto,
            CliSolverType::Lu => SolverType::Lu,
            CliSolverType::Pcg => SolverType::Pcg,
            CliSolverType::Cg => SolverType::Cg,
            CliSolverType::Cgs => SolverType::Cgs,
            CliSolverType::Bicgstab => SolverType::BiCgstab,
            CliSolverType::Gmres => SolverType::Gmres,
            CliSolverType::GmresIlu => SolverType::GmresIlu,
        }
    }
}

fn print_config_summary(config: &CaseConfig) {
    println!("=== Case: {} ===", config.name);
    match &config.grid {
        GridConfig::OneD { nx, dx } => println!("Grid: 1-D, {} cells of width {}", nx, dx),
        GridConfig::TwoD { nx, ny, dx, dy } => {
            println!("Grid: 2-D, {}x{} cells of size {}x{}", nx, ny, dx, dy)
        }
    }
    let physics = &config.physics;
    println!(
        "Physics: c={} Γ={} u={:?} ({:?}) k={} S={}",
        physics.transient,
        physics.diffusion,
        physics.velocity,
        physics.scheme,
        physics.implicit_source,
        physics.source
    );
    for bc in &config.boundaries {
        println!("Boundary '{}': {:?} = {}", bc.faces, bc.kind, bc.value);
    }
    println!(
        "Time: dt={} steps={} sweeps={}",
        config.time.dt, config.time.steps, config.time.sweeps
    );
    println!("Solver: {:?}", config.solver.solver_type);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    let mut config = if let Some(config_path) = &args.config {
        println!("Loading configuration from: {}", config_path.display());
        CaseConfig::from_file(config_path)?
    } else {
        println!("No configuration file specified, using default steady diffusion case");
        create_default_config()
    };

    if let Some(solver) = args.solver {
        config.solver.solver_type = solver.into();
    }
    if let Some(steps) = args.steps {
        config.time.steps = steps;
    }
    if args.verbose {
        config.solver.verbosity = config.solver.verbosity.max(1);
    }

    print_config_summary(&config);

    let start = Instant::now();
    let result = config.run()?;
    println!(
        "\nFinished {} step(s), {} sweep(s) in {:.2?}, final residual {:.3e}",
        result.steps,
        result.sweeps,
        start.elapsed(),
        result.residual
    );

    println!("Saving results to: {}", args.output.display());
    fs::write(&args.output, serde_json::to_string_pretty(&result)?)?;
    println!("Done!");

    Ok(())
}
