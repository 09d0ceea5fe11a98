use std::path::PathBuf;

use chrono::Local;
use clap::{Parser, ValueEnum};
use slabstencil::config::options::{
    DEFAULT_NX, DEFAULT_NY, DEFAULT_NZ, DEFAULT_OUTPUT, DEFAULT_STEPS,
};
use slabstencil::output::{CsvRecorder, ResultRow};
use slabstencil::parallel::{Comm, UniverseComm};
use slabstencil::utils::env;
use slabstencil::{run_benchmark, BoundaryPolicy, GlobalGrid, LinearRamp, Result, RunConfig};

/// Distributed 3-D Jacobi stencil strong-scaling benchmark
#[derive(Parser, Debug)]
#[command(name = "slabstencil", version)]
struct Cli {
    /// Grid points along x (the decomposed axis)
    #[arg(long, env = "SLABSTENCIL_NX", default_value_t = DEFAULT_NX, value_parser = positive)]
    nx: usize,

    /// Grid points along y
    #[arg(long, env = "SLABSTENCIL_NY", default_value_t = DEFAULT_NY, value_parser = positive)]
    ny: usize,

    /// Grid points along z
    #[arg(long, env = "SLABSTENCIL_NZ", default_value_t = DEFAULT_NZ, value_parser = positive)]
    nz: usize,

    /// Number of stencil iterations
    #[arg(
        long,
        env = "SLABSTENCIL_STEPS",
        default_value_t = DEFAULT_STEPS,
        value_parser = positive
    )]
    steps: usize,

    /// CSV file to append timing results to
    #[arg(long, env = "SLABSTENCIL_OUTPUT", default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Value held by the ghost planes at the two ends of the rank chain
    #[arg(long, value_enum, default_value_t = Boundary::Dirichlet)]
    boundary: Boundary,

    /// Worker threads per rank (default: all logical CPUs)
    #[arg(long, env = "SLABSTENCIL_THREADS", value_parser = positive)]
    threads: Option<usize>,

    /// Ranks to run as threads of this process when not launched under MPI
    #[arg(long, env = "SLABSTENCIL_RANKS", default_value_t = 1, value_parser = positive)]
    ranks: usize,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Boundary {
    /// Initial condition one plane outside the domain
    Dirichlet,
    /// Zero
    Zero,
}

impl From<Boundary> for BoundaryPolicy {
    fn from(b: Boundary) -> Self {
        match b {
            Boundary::Dirichlet => BoundaryPolicy::Dirichlet,
            Boundary::Zero => BoundaryPolicy::Zero,
        }
    }
}

fn positive(s: &str) -> std::result::Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".into()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

impl Cli {
    fn run_config(&self) -> Result<RunConfig> {
        let grid = GlobalGrid::new(self.nx, self.ny, self.nz)?;
        let cfg = RunConfig::new(grid, self.steps, self.output.clone());
        Ok(cfg.with_boundary(self.boundary.into()))
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let threads = cli.threads.unwrap_or_else(num_cpus::get);
    if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(threads).build_global() {
        tracing::warn!(error = %e, "rayon pool already initialized");
    }

    let cfg = cli.run_config().unwrap_or_else(|e| {
        tracing::error!(error = %e, "invalid configuration");
        std::process::exit(e.exit_code());
    });

    launch(&cli, &cfg);
}

#[cfg(feature = "mpi")]
fn launch(cli: &Cli, cfg: &RunConfig) {
    let comm = slabstencil::parallel::MpiComm::new().unwrap_or_else(|e| {
        tracing::error!(error = %e, "MPI initialization failed");
        std::process::exit(e.exit_code());
    });
    if cli.ranks > 1 {
        tracing::warn!(ranks = cli.ranks, "--ranks is ignored when running under MPI");
    }
    let threads = env::threads_per_rank(rayon::current_num_threads(), 1);
    run_rank(&UniverseComm::Mpi(comm), cfg, threads);
}

#[cfg(not(feature = "mpi"))]
fn launch(cli: &Cli, cfg: &RunConfig) {
    use slabstencil::parallel::{SerialComm, ThreadComm};

    // in-process ranks share the global rayon pool
    let threads = env::threads_per_rank(rayon::current_num_threads(), cli.ranks);
    if cli.ranks == 1 {
        run_rank(&UniverseComm::Serial(SerialComm), cfg, threads);
    } else {
        ThreadComm::run_group(cli.ranks, |comm| {
            run_rank(&UniverseComm::Threads(comm), cfg, threads)
        });
    }
}

/// Run one rank; any error is fatal to the whole group.
fn run_rank<C: Comm>(comm: &C, cfg: &RunConfig, threads_per_rank: usize) {
    if let Err(e) = execute(comm, cfg, threads_per_rank) {
        tracing::error!(rank = comm.rank(), error = %e, "aborting run");
        comm.abort(e.exit_code());
    }
}

fn execute<C: Comm>(comm: &C, cfg: &RunConfig, threads_per_rank: usize) -> Result<()> {
    if let Some(metrics) = run_benchmark(comm, cfg, &LinearRamp)? {
        let row = ResultRow::new(cfg, &metrics, env::num_nodes(), threads_per_rank, Local::now());
        let recorder = CsvRecorder::new(cfg.output.clone());
        recorder.append(&row)?;
        tracing::info!(path = %recorder.path().display(), "result recorded");
    }
    Ok(())
}
