//! cnfsweep - batch SAT sweep with resumable checkpoints
//!
//! `run` scans a corpus, skips formulas already settled in the checkpoint,
//! solves the rest in isolated worker processes, and merges the results back.

mod progress;
mod render;
mod telemetry;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use cnfsweep_core::application::worker::constants::{
    DEFAULT_CHECKPOINT_FILE, DEFAULT_FORMULA_SUFFIX, DEFAULT_NUM_WORKERS, DEFAULT_TIMEOUT_SECONDS,
};
use cnfsweep_core::application::{
    shutdown_channel, CheckpointStats, RetryPolicy, Scheduler, SweepConfig, SweepService,
};
use cnfsweep_core::port::time_provider::SystemTimeProvider;
use cnfsweep_core::port::CheckpointStore;
use cnfsweep_infra_csv::CsvCheckpointStore;
use cnfsweep_infra_system::solver::solve_file;
use cnfsweep_infra_system::{FsCorpusScanner, SubprocessSolver, WorkerCommand};

use progress::IndicatifProgress;
use telemetry::LogFormat;

#[derive(Parser)]
#[command(name = "cnfsweep")]
#[command(about = "Solve every formula in a corpus, resumably", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log output format (logs go to stderr)
    #[arg(long, global = true, env = "CNFSWEEP_LOG_FORMAT", value_enum, default_value = "pretty")]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve pending formulas under a directory and update the checkpoint
    Run(RunArgs),

    /// Summarize an existing checkpoint
    Status {
        /// Checkpoint file
        #[arg(short, long, env = "CNFSWEEP_OUTPUT", default_value = DEFAULT_CHECKPOINT_FILE)]
        output: PathBuf,

        /// Unresolved entries below this many seconds count as retryable
        #[arg(long, env = "CNFSWEEP_RETRY_THRESHOLD", default_value_t = DEFAULT_TIMEOUT_SECONDS)]
        retry_threshold: f64,
    },

    /// Worker mode: solve one DIMACS file, print a JSON report, exit 10/20/0
    #[command(hide = true)]
    Solve {
        file: PathBuf,

        /// Give up (inconclusive) after this many branching decisions
        #[arg(long)]
        max_decisions: Option<u64>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Directory holding the formulas
    #[arg(env = "CNFSWEEP_ROOT")]
    root: PathBuf,

    /// Also search subdirectories
    #[arg(short, long, env = "CNFSWEEP_RECURSIVE")]
    recursive: bool,

    /// Number of concurrent worker processes
    #[arg(short, long, env = "CNFSWEEP_WORKERS", default_value_t = DEFAULT_NUM_WORKERS)]
    workers: usize,

    /// Per-formula wall-clock budget in seconds
    #[arg(short, long, env = "CNFSWEEP_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECONDS)]
    timeout: f64,

    /// Retry unresolved checkpoint entries below this many seconds [default: timeout]
    #[arg(long, env = "CNFSWEEP_RETRY_THRESHOLD")]
    retry_threshold: Option<f64>,

    /// Checkpoint file
    #[arg(short, long, env = "CNFSWEEP_OUTPUT", default_value = DEFAULT_CHECKPOINT_FILE)]
    output: PathBuf,

    /// Filename suffix of formulas
    #[arg(long, env = "CNFSWEEP_SUFFIX", default_value = DEFAULT_FORMULA_SUFFIX)]
    suffix: String,

    /// External solver program (called as `<solver> <solver-args...> <file>`)
    #[arg(long, env = "CNFSWEEP_SOLVER")]
    solver: Option<PathBuf>,

    /// Extra argument for the external solver (repeatable)
    #[arg(long = "solver-arg", allow_hyphen_values = true)]
    solver_args: Vec<String>,

    /// Decision limit for the built-in solver
    #[arg(long, env = "CNFSWEEP_MAX_DECISIONS", conflicts_with = "solver")]
    max_decisions: Option<u64>,

    /// Save intermediate results every N seconds
    #[arg(long, env = "CNFSWEEP_AUTOSAVE_SECS")]
    autosave_secs: Option<f64>,

    /// Print the result rows produced by this run
    #[arg(long)]
    show_results: bool,

    /// Disable the progress bar
    #[arg(long, env = "CNFSWEEP_NO_PROGRESS")]
    no_progress: bool,
}

impl RunArgs {
    fn sweep_config(&self) -> Result<SweepConfig> {
        let autosave_interval = self
            .autosave_secs
            .map(|secs| {
                Duration::try_from_secs_f64(secs)
                    .with_context(|| format!("Invalid autosave interval: {}", secs))
            })
            .transpose()?;

        let mut config = SweepConfig::new(&self.root);
        config.recursive = self.recursive;
        config.num_workers = self.workers;
        config.timeout_seconds = self.timeout;
        config.retry_threshold_seconds = self.retry_threshold;
        config.autosave_interval = autosave_interval;
        Ok(config)
    }

    /// External solver if given, otherwise this executable in worker mode
    fn worker_command(&self) -> Result<WorkerCommand> {
        if let Some(program) = &self.solver {
            return Ok(WorkerCommand::new(program, self.solver_args.clone()));
        }

        let exe = std::env::current_exe().context("Cannot locate the cnfsweep executable")?;
        let mut args = vec!["solve".to_string()];
        if let Some(limit) = self.max_decisions {
            args.push("--max-decisions".to_string());
            args.push(limit.to_string());
        }
        Ok(WorkerCommand::new(exe, args))
    }
}

async fn run(args: RunArgs) -> Result<()> {
    let config = args.sweep_config()?;
    config.validate().context("Invalid configuration")?;

    // DI wiring
    let time_provider = Arc::new(SystemTimeProvider);
    let scanner = Arc::new(FsCorpusScanner::new(args.suffix.as_str())?);
    let store = Arc::new(CsvCheckpointStore::new(&args.output));
    let worker = args.worker_command()?;
    info!(
        program = %worker.program.display(),
        args = ?worker.args,
        "Worker command"
    );
    let solver = Arc::new(SubprocessSolver::with_default_env(worker, time_provider.clone()));
    let progress = Arc::new(IndicatifProgress::new(!args.no_progress));
    let scheduler = Scheduler::new(solver, progress, time_provider);
    let service = SweepService::new(scanner, store, scheduler);

    info!(
        root = %config.root.display(),
        checkpoint = %args.output.display(),
        workers = config.num_workers,
        timeout_seconds = config.timeout_seconds,
        "Starting sweep"
    );

    // Ctrl+C stops dispatch, kills running workers, and still saves
    let (shutdown_tx, shutdown) = shutdown_channel();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping workers and saving partial results");
            shutdown_tx.shutdown();
        }
    });

    let outcome = service.execute(&config, shutdown).await;
    signal_task.abort();
    let outcome = outcome.context("Sweep failed")?;

    render::print_summary(&outcome.summary, &args.output);
    if args.show_results && !outcome.new_results.is_empty() {
        render::print_results(&service.reporter().finalize(&outcome.new_results));
    }

    Ok(())
}

async fn status(output: PathBuf, retry_threshold: f64) -> Result<()> {
    let policy = RetryPolicy::new(retry_threshold).context("Invalid retry threshold")?;
    let table = CsvCheckpointStore::new(&output)
        .load()
        .await
        .context("Failed to load checkpoint")?;

    if table.is_empty() {
        println!(
            "{}",
            format!("No checkpoint data in {}", output.display()).yellow()
        );
        return Ok(());
    }

    let stats = CheckpointStats::new(&table, &policy.partition(&table));
    render::print_stats(&stats, &output, policy.threshold_seconds());
    Ok(())
}

/// Worker mode; never returns
fn solve(file: PathBuf, max_decisions: Option<u64>) -> Result<()> {
    let (verdict, report) = solve_file(&file, max_decisions)
        .with_context(|| format!("Failed to solve {}", file.display()))?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", report.to_line())?;
    stdout.flush()?;

    std::process::exit(verdict.exit_code());
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            telemetry::init_logging(cli.log_format, None)?;
            run(args).await
        }
        Commands::Status {
            output,
            retry_threshold,
        } => {
            telemetry::init_logging(cli.log_format, Some("cnfsweep=warn"))?;
            status(output, retry_threshold).await
        }
        Commands::Solve {
            file,
            max_decisions,
        } => {
            telemetry::init_logging(cli.log_format, Some("cnfsweep=warn"))?;
            solve(file, max_decisions)
        }
    }
}
