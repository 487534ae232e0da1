use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use crfplan::{OutputFormat, Overrides, RunConfig, execute, init_logging, report};
use crfplan_core::RunProgress;
use crfplan_core::model::STUDIES;

const RUN_FILE_NAME: &str = "run.yaml";

#[derive(Parser, Debug)]
#[command(name = "crfplan")]
#[command(about = "Economic and emission viability of controlled-release fertilizer")]
struct Args {
    /// Path to the data directory (default: ~/.crfplan/)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a simulation and print the report
    Run(RunArgs),
    /// List the reference studies
    Studies,
    /// Write a run file with every default filled in
    InitConfig {
        /// Destination (default: <data-dir>/run.yaml)
        path: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Run file (default: <data-dir>/run.yaml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Study identifier
    #[arg(short, long)]
    study: Option<String>,

    /// Monte Carlo trials
    #[arg(long)]
    trials: Option<usize>,

    /// Seed for Monte Carlo and bootstrap resampling
    #[arg(long, conflicts_with = "random_seed")]
    seed: Option<u64>,

    /// Draw a fresh seed for this run
    #[arg(long)]
    random_seed: bool,

    /// Sobol base sample size
    #[arg(long)]
    sobol_samples: Option<usize>,

    /// Skip the sensitivity analysis
    #[arg(long)]
    no_sensitivity: bool,

    /// Carbon price (foreign currency per t-CO2e)
    #[arg(long)]
    carbon_price: Option<f64>,

    /// FX rate (local per foreign currency)
    #[arg(long)]
    fx_rate: Option<f64>,

    /// Report format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Abandon the run after this many seconds
    #[arg(long)]
    time_limit: Option<u64>,
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".crfplan")
}

fn load_run_config(explicit: Option<&Path>, data_dir: &Path) -> color_eyre::Result<RunConfig> {
    if let Some(path) = explicit {
        return Ok(RunConfig::load(path)?);
    }
    let default_path = data_dir.join(RUN_FILE_NAME);
    if default_path.exists() {
        tracing::info!(path = %default_path.display(), "using run file from data directory");
        Ok(RunConfig::load(&default_path)?)
    } else {
        Ok(RunConfig::default())
    }
}

fn run(args: RunArgs, data_dir: &Path) -> color_eyre::Result<()> {
    let mut config = load_run_config(args.config.as_deref(), data_dir)?;

    let seed = if args.random_seed {
        Some(rand::random::<u64>())
    } else {
        args.seed
    };
    let origin = config.apply(&Overrides {
        study: args.study,
        trials: args.trials,
        seed,
        sobol_samples: args.sobol_samples,
        skip_sensitivity: args.no_sensitivity,
        carbon_price: args.carbon_price,
        fx_rate: args.fx_rate,
        output: args.format,
    });

    let progress = match args.time_limit {
        Some(secs) => RunProgress::default().with_deadline(Duration::from_secs(secs)),
        None => RunProgress::default(),
    };

    let result = execute(&config, origin, Some(&progress))?;
    tracing::info!("{}", report::summary_line(&result));

    let rendered = report::render(&result, config.output)?;
    match args.output {
        Some(path) => {
            fs::write(&path, rendered)?;
            tracing::info!(path = %path.display(), "report written");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn list_studies() {
    for study in STUDIES {
        println!(
            "{:<15} {} [{} / {}] conventional {} treatment {} (per {}), yield impact {:+}%",
            study.id,
            study.name,
            study.crop,
            study.system,
            study.conventional_emission,
            study.treatment_emission,
            study.area_unit.label(),
            study.yield_impact_pct
        );
    }
}

fn init_config(path: Option<PathBuf>, force: bool, data_dir: &Path) -> color_eyre::Result<()> {
    let path = path.unwrap_or_else(|| data_dir.join(RUN_FILE_NAME));
    if path.exists() && !force {
        color_eyre::eyre::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    RunConfig::default().save(&path)?;
    println!("{}", path.display());
    Ok(())
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let data_dir = args.data_dir.unwrap_or_else(default_data_dir);

    let _log = init_logging(&data_dir, &args.log_level)?;

    let result = match args.command {
        Command::Run(run_args) => run(run_args, &data_dir),
        Command::Studies => {
            list_studies();
            Ok(())
        }
        Command::InitConfig { path, force } => init_config(path, force, &data_dir),
    };

    if let Err(err) = &result {
        tracing::error!("crfplan failed: {err}");
    }
    tracing::info!("crfplan finished");
    result
}
