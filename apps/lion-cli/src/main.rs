mod logging;

use clap::{Parser, Subcommand};
use lion_core::{celsius_to_kelvin, kelvin_to_celsius};
use lion_project::{InputTrace, Project, ProjectError, read_input_trace, save_states, write_states};
use lion_sim::{
    BatchCase, LogConfig, Recorder, RunSummary, SimError, SimState, Simulation, run_batch,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "lion", version)]
#[command(about = "Electro-thermal lithium-ion cell simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a project file with default configuration and a generic cell
    Init {
        /// Output path (.yaml, .yml or .json)
        project_path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Validate project file syntax and values
    Validate {
        /// Path to the project file
        project_path: PathBuf,
    },
    /// Simulate a CSV trace of power and ambient temperature
    Run {
        /// Path to the project file
        project_path: PathBuf,
        /// Input CSV with `power` (W) and `ambient_temperature` (K) columns
        #[arg(short, long)]
        input: PathBuf,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Simulate constant power at constant ambient temperature
    Constant {
        /// Path to the project file
        project_path: PathBuf,
        /// Power in W, positive discharges the cell
        #[arg(long, allow_hyphen_values = true)]
        power: f64,
        /// Ambient temperature in °C
        #[arg(long, allow_hyphen_values = true)]
        ambient_celsius: f64,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run constant-power cases in parallel and print a summary table
    Sweep {
        /// Path to the project file
        project_path: PathBuf,
        /// Comma separated powers in W
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
        power: Vec<f64>,
        /// Comma separated ambient temperatures in °C
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
        ambient_celsius: Vec<f64>,
    },
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error(transparent)]
    Sim(#[from] SimError),

    #[error("{what}")]
    Usage { what: String },
}

type CliResult<T> = Result<T, CliError>;

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            project_path,
            force,
        } => cmd_init(&project_path, force),
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Run {
            project_path,
            input,
            output,
        } => cmd_run(&project_path, &input, output.as_deref()),
        Commands::Constant {
            project_path,
            power,
            ambient_celsius,
            output,
        } => cmd_constant(&project_path, power, ambient_celsius, output.as_deref()),
        Commands::Sweep {
            project_path,
            power,
            ambient_celsius,
        } => cmd_sweep(&project_path, &power, &ambient_celsius),
    }
}

/// Load a project and install logging from its configuration.
fn open_project(project_path: &Path) -> CliResult<Project> {
    let project = lion_project::load(project_path)?;
    logging::init(&project.config.log);

    let config = &project.config;
    info!(
        name = %config.name,
        version = env!("CARGO_PKG_VERSION"),
        stepper = config.stepper.name(),
        minimizer = config.minimizer.name(),
        jacobian = config.jacobian.name(),
        regime = config.regime.name(),
        "lion starting"
    );
    Ok(project)
}

fn cmd_init(project_path: &Path, force: bool) -> CliResult<()> {
    logging::init(&LogConfig::default());
    if project_path.exists() && !force {
        return Err(CliError::Usage {
            what: format!(
                "{} already exists (use --force to overwrite)",
                project_path.display()
            ),
        });
    }
    lion_project::save(project_path, &Project::default())?;
    println!("✓ Wrote project: {}", project_path.display());
    Ok(())
}

fn cmd_validate(project_path: &Path) -> CliResult<()> {
    logging::init(&LogConfig::default());
    println!("Validating project: {}", project_path.display());
    let project = lion_project::load(project_path)?;
    println!("✓ Project is valid");
    println!(
        "  {}: {} steps of {} s, stepper {}, minimizer {}",
        project.config.name,
        project.config.max_iters(),
        project.config.step_seconds,
        project.config.stepper.name(),
        project.config.minimizer.name()
    );
    Ok(())
}

fn cmd_run(project_path: &Path, input: &Path, output: Option<&Path>) -> CliResult<()> {
    let project = open_project(project_path)?;
    let trace = read_input_trace(input)?;
    check_trace(&project, &trace);

    let (summary, states) = simulate(&project, &trace.power, &trace.ambient_temperature)?;
    emit_states(&summary, &states, output)
}

fn cmd_constant(
    project_path: &Path,
    power: f64,
    ambient_celsius: f64,
    output: Option<&Path>,
) -> CliResult<()> {
    let project = open_project(project_path)?;
    let samples = project.config.max_iters();
    let ambient = celsius_to_kelvin(ambient_celsius);

    let (summary, states) = simulate(&project, &vec![power; samples], &vec![ambient; samples])?;
    emit_states(&summary, &states, output)
}

fn cmd_sweep(project_path: &Path, power: &[f64], ambient_celsius: &[f64]) -> CliResult<()> {
    let project = open_project(project_path)?;
    let samples = project.config.max_iters();

    let cases: Vec<BatchCase> = power
        .iter()
        .flat_map(|&p| {
            ambient_celsius.iter().map(move |&c| {
                BatchCase::constant(
                    format!("{p} W @ {c} °C"),
                    p,
                    celsius_to_kelvin(c),
                    samples,
                )
            })
        })
        .collect();

    let start = Instant::now();
    let results = run_batch(&project.config, &project.params, &cases);
    info!(
        cases = cases.len(),
        elapsed_s = start.elapsed().as_secs_f64(),
        "sweep finished"
    );

    println!(
        "{:<24} {:>6} {:>10} {:>10} {:>10} {:>10} {:>8}",
        "case", "steps", "soc", "T [°C]", "V", "I [A]", "soh"
    );
    let mut failed = 0;
    for (case, result) in cases.iter().zip(&results) {
        match result {
            Ok(outcome) => {
                let last = outcome.states.last().unwrap_or(&outcome.initial);
                println!(
                    "{:<24} {:>6} {:>10.5} {:>10.3} {:>10.4} {:>10.4} {:>8.5}",
                    case.name,
                    outcome.summary.steps,
                    last.integrated.soc_nominal,
                    kelvin_to_celsius(last.integrated.internal_temperature),
                    last.derived.voltage,
                    last.derived.current,
                    last.degradation.soh
                );
            }
            Err(e) => {
                failed += 1;
                println!("{:<24} failed: {e}", case.name);
            }
        }
    }

    if failed > 0 {
        warn!(failed, total = cases.len(), "some sweep cases failed");
    }
    Ok(())
}

fn check_trace(project: &Project, trace: &InputTrace) {
    let step = project.config.step_seconds;
    let tolerance = 1e-9 * step.max(1.0);
    if let Some(err) = trace.spacing_error(step).filter(|&e| e > tolerance) {
        warn!(
            step_seconds = step,
            max_deviation = err,
            "time column spacing differs from the configured step"
        );
    }
    let max_iters = project.config.max_iters();
    if trace.len() < max_iters {
        warn!(
            samples = trace.len(),
            max_iters, "trace is shorter than the configured run"
        );
    }
}

fn simulate(
    project: &Project,
    power: &[f64],
    ambient: &[f64],
) -> CliResult<(RunSummary, Vec<SimState>)> {
    let recorder = Recorder::with_capacity(power.len().min(project.config.max_iters()));
    let mut sim = Simulation::with_hooks(project.config.clone(), &project.params, recorder)?;
    sim.init()?;

    let start = Instant::now();
    let result = sim.run(power, ambient);
    let stats = sim.driver_stats();
    sim.cleanup()?;
    let summary = result?;

    if let Some(stats) = stats {
        info!(
            steps = summary.steps,
            accepted = stats.accepted,
            rejected = stats.rejected,
            failed = stats.failed,
            elapsed_s = start.elapsed().as_secs_f64(),
            "run finished"
        );
    }
    Ok((summary, sim.into_hooks().into_states()))
}

fn emit_states(summary: &RunSummary, states: &[SimState], output: Option<&Path>) -> CliResult<()> {
    if let Some(path) = output {
        save_states(path, states)?;
        println!(
            "✓ Simulated {} steps{}, wrote {}",
            summary.steps,
            if summary.closed { "" } else { " (run not complete)" },
            path.display()
        );
    } else {
        write_states(std::io::stdout().lock(), states)?;
    }
    Ok(())
}
