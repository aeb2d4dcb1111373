use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use field_sim::models::FieldModel;
use field_sim::{
    FileSnapshotSink, IsingLattice, ModelKind, NullSink, Phi4Lattice, Phi4Params, RunSummary,
    SimConfig, SnapshotSink,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Metropolis + Wolff Monte Carlo for the 2D Ising and phi^4 lattice models.
///
/// Prints one CSV line of observables to stdout; logs go to stderr.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Lattice size in the x dimension
    x_dim: usize,

    /// Lattice size in the y dimension
    y_dim: usize,

    /// Equilibration sweeps discarded before sampling
    init: usize,

    /// Number of recorded samples
    sample_size: usize,

    /// Model to simulate: "ising" or "phi4"
    #[arg(long, default_value = "ising", value_parser = parse_model)]
    model: ModelKind,

    /// RNG seed; for ising it is also 100 x temperature.
    /// phi4 defaults to 100 * mu * lambda.
    #[arg(long)]
    seed: Option<u64>,

    /// phi4 mass parameter
    #[arg(long, default_value_t = -1.0, allow_hyphen_values = true)]
    mu: f64,

    /// phi4 coupling
    #[arg(long, default_value_t = 1.0)]
    lambda: f64,

    /// Metropolis sweeps between consecutive samples
    #[arg(long, default_value_t = 5)]
    sweeps_per_sample: usize,

    /// Run a Wolff update after every N-th sweep
    #[arg(long)]
    wolff_interval: Option<usize>,

    /// Order-parameter histogram bins (odd)
    #[arg(long, default_value_t = field_sim::statistics::DEFAULT_BINS)]
    bins: usize,

    /// Write the autocorrelation function here, one lag per line
    #[arg(long)]
    autocorrelation: Option<PathBuf>,

    /// Directory for lattice snapshots (requires --snapshot-frequency)
    #[arg(long, requires = "snapshot_frequency")]
    snapshot_dir: Option<PathBuf>,

    #[arg(long, default_value = "lattice")]
    snapshot_prefix: String,

    /// Store a snapshot every N sweeps (requires --snapshot-dir)
    #[arg(long, requires = "snapshot_dir")]
    snapshot_frequency: Option<usize>,
}

const DEFAULT_ISING_SEED: u64 = 227;

fn parse_model(s: &str) -> Result<ModelKind, String> {
    ModelKind::try_from(s)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = SimConfig::new(cli.x_dim, cli.y_dim, cli.init, cli.sample_size);
    config.sweeps_per_sample = cli.sweeps_per_sample;
    config.wolff_interval = cli.wolff_interval;
    config.histogram_bins = cli.bins;
    config.snapshot_frequency = cli.snapshot_frequency;

    let mut sink: Box<dyn SnapshotSink> = match &cli.snapshot_dir {
        Some(dir) => Box::new(FileSnapshotSink::create(dir, cli.snapshot_prefix.as_str())?),
        None => Box::new(NullSink),
    };

    let pb = ProgressBar::new(config.total_sweeps() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{msg} [{bar:40}] {pos}/{len} [{elapsed_precise} < {eta_precise}, {per_sec}]",
        )?
        .progress_chars("=> "),
    );
    pb.set_message("sweeps");
    let on_sweep = || pb.inc(1);

    let line = match cli.model {
        ModelKind::Ising => {
            let seed = cli.seed.unwrap_or(DEFAULT_ISING_SEED);
            let mut lattice = IsingLattice::new(cli.x_dim, cli.y_dim, seed)?;
            info!(seed, temperature = lattice.temperature(), "ising lattice ready");
            let summary = simulate(
                &mut lattice,
                &config,
                sink.as_mut(),
                &on_sweep,
                cli.autocorrelation.as_deref(),
            )?;
            format!(
                "{},{:.6},{}",
                run_prefix(&cli, seed),
                lattice.temperature(),
                observables(&summary)
            )
        }
        ModelKind::Phi4 => {
            let mut params = Phi4Params::new(cli.mu, cli.lambda);
            if let Some(seed) = cli.seed {
                params = params.with_seed(seed);
            }
            let seed = params.resolved_seed();
            let mut lattice = Phi4Lattice::new(cli.x_dim, cli.y_dim, params)?;
            info!(seed, mu = cli.mu, lambda = cli.lambda, "phi4 lattice ready");
            let summary = simulate(
                &mut lattice,
                &config,
                sink.as_mut(),
                &on_sweep,
                cli.autocorrelation.as_deref(),
            )?;
            let (bimodality, binder) = summary
                .distribution
                .as_ref()
                .map_or((0.0, 0.0), |d| (d.bimodality, d.binder_cumulant));
            format!(
                "{},{:.6},{:.6},{},{:.6},{:.6}",
                run_prefix(&cli, seed),
                cli.mu,
                cli.lambda,
                observables(&summary),
                bimodality,
                binder
            )
        }
    };
    pb.finish();

    println!("{line}");
    Ok(())
}

fn simulate<M: FieldModel>(
    model: &mut M,
    config: &SimConfig,
    sink: &mut dyn SnapshotSink,
    on_sweep: &dyn Fn(),
    autocorrelation: Option<&Path>,
) -> Result<RunSummary, Box<dyn Error>> {
    let summary = field_sim::run(model, config, sink, on_sweep)?;
    if let Some(path) = autocorrelation {
        write_autocorrelation(path, &summary.autocorrelation.function).map_err(|e| {
            format!("failed to write autocorrelation to {}: {e}", path.display())
        })?;
        info!(
            path = %path.display(),
            lags = summary.autocorrelation.function.len(),
            "wrote autocorrelation"
        );
    }
    if summary.counters.snapshot_failures > 0 {
        tracing::warn!(
            failures = summary.counters.snapshot_failures,
            "some snapshots were not written"
        );
    }
    Ok(summary)
}

fn run_prefix(cli: &Cli, seed: u64) -> String {
    format!(
        "{},{},{},{},{}",
        cli.x_dim, cli.y_dim, cli.init, cli.sample_size, seed
    )
}

/// tau, E, dE, |M|, d|M|, C, chi, M, scale factor
fn observables(s: &RunSummary) -> String {
    format!(
        "{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6}",
        s.autocorrelation.time,
        s.energy,
        s.energy_std,
        s.abs_order,
        s.abs_order_std,
        s.specific_heat,
        s.susceptibility,
        s.order,
        s.autocorrelation.scale_factor
    )
}

fn write_autocorrelation(path: &Path, function: &[f64]) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for value in function {
        writeln!(out, "{value}")?;
    }
    out.flush()
}
