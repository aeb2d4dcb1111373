pub mod snapshot;

pub use snapshot::{FileSnapshotSink, NullSink, SnapshotSink};

use tracing::{debug, info, warn};
use validator::Validate;

use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::mcmc;
use crate::models::FieldModel;
use crate::statistics::{RunSummary, SampleAccumulator, UpdateCounters};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Equilibration,
    Sampling,
}

impl Phase {
    fn label(self) -> &'static str {
        match self {
            Self::Equilibration => "equil",
            Self::Sampling => "sample",
        }
    }
}

/// Run equilibration followed by sampling on `model`.
///
/// Sweeps are numbered from 1 across both phases. Each sweep is:
/// 1. `N` Metropolis updates at random sites
/// 2. A Wolff step at a random site when the sweep number is a multiple of
///    `wolff_interval`
/// 3. A snapshot when the sweep number is a multiple of `snapshot_frequency`
///
/// Samples `(total_energy, order_parameter)` are taken after every
/// `sweeps_per_sample` sampling sweeps. An integrity violation aborts the run;
/// snapshot failures are logged and counted.
///
/// `on_sweep` is called once per sweep (useful for progress bars).
pub fn run<M: FieldModel + ?Sized>(
    model: &mut M,
    config: &SimConfig,
    sink: &mut dyn SnapshotSink,
    on_sweep: &dyn Fn(),
) -> Result<RunSummary> {
    config
        .validate()
        .map_err(|e| SimError::InvalidConfig(format!("{e}")))?;
    if config.x_dim * config.y_dim != model.n_sites() {
        return Err(SimError::InvalidConfig(format!(
            "config lattice {}x{} does not match model with {} sites",
            config.x_dim,
            config.y_dim,
            model.n_sites()
        )));
    }

    let mut counters = UpdateCounters::default();
    let mut acc = SampleAccumulator::with_capacity(config.sample_size);
    let mut sweep = 0usize;

    info!(
        x_dim = config.x_dim,
        y_dim = config.y_dim,
        sweeps = config.equilibration_sweeps,
        "equilibrating"
    );
    for _ in 0..config.equilibration_sweeps {
        sweep += 1;
        advance(model, config, sweep, Phase::Equilibration, sink, &mut counters)?;
        on_sweep();
    }

    info!(
        samples = config.sample_size,
        sweeps_per_sample = config.sweeps_per_sample,
        "sampling"
    );
    for sample in 0..config.sample_size {
        for _ in 0..config.sweeps_per_sample {
            sweep += 1;
            advance(model, config, sweep, Phase::Sampling, sink, &mut counters)?;
            on_sweep();
        }
        let energy = model.total_energy();
        let order = model.order_parameter();
        debug!(sample, sweep, energy, order, "recorded sample");
        acc.record(energy, order);
    }

    let summary = RunSummary::from_samples(&acc, &*model, counters, config.histogram_bins);
    info!(
        energy = summary.energy,
        abs_order = summary.abs_order,
        tau = summary.autocorrelation.time,
        acceptance = summary.counters.acceptance_rate(),
        mean_cluster = summary.counters.mean_cluster_size(),
        "run complete"
    );
    if summary.autocorrelation.is_degenerate() {
        info!("no autocorrelation window, error bars set to zero");
    }
    Ok(summary)
}

fn advance<M: FieldModel + ?Sized>(
    model: &mut M,
    config: &SimConfig,
    sweep: usize,
    phase: Phase,
    sink: &mut dyn SnapshotSink,
    counters: &mut UpdateCounters,
) -> Result<()> {
    let accepted = mcmc::metropolis_sweep(model)?;
    counters.metropolis_attempts += model.n_sites() as u64;
    counters.metropolis_accepted += accepted as u64;

    if config.wolff_interval.is_some_and(|k| sweep % k == 0) {
        let size = mcmc::wolff_step(model)?;
        counters.wolff_steps += 1;
        counters.cluster_sites += size as u64;
    }

    if sink.enabled() && config.snapshot_frequency.is_some_and(|k| sweep % k == 0) {
        let label = format!("{}-{sweep}", phase.label());
        if let Err(e) = sink.write(&label, &model.render_grid()) {
            warn!(error = %e, label = %label, "snapshot failed, continuing");
            counters.snapshot_failures += 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IsingLattice, Phi4Lattice, Phi4Params};
    use std::cell::Cell;
    use std::path::PathBuf;

    #[derive(Default)]
    struct RecordingSink {
        labels: Vec<String>,
        fail: bool,
    }

    impl SnapshotSink for RecordingSink {
        fn write(&mut self, label: &str, grid: &str) -> Result<()> {
            assert!(!grid.is_empty());
            self.labels.push(label.to_string());
            if self.fail {
                return Err(SimError::Snapshot {
                    path: PathBuf::from(label),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn test_ising_run() {
        let mut model = IsingLattice::new(6, 6, 180).unwrap();
        let mut config = SimConfig::new(6, 6, 20, 40);
        config.wolff_interval = Some(3);

        let calls = Cell::new(0);
        let summary = run(&mut model, &config, &mut NullSink, &|| calls.set(calls.get() + 1)).unwrap();

        assert_eq!(calls.get(), config.total_sweeps());
        assert_eq!(summary.n_samples, 40);
        assert_eq!(summary.counters.metropolis_attempts, 36 * 220);
        assert_eq!(summary.counters.wolff_steps, 220 / 3);
        assert!(summary.counters.mean_cluster_size() >= 1.0);
        assert!(summary.energy >= -2.0 && summary.energy <= 2.0);
        assert!(summary.abs_order >= 0.0 && summary.abs_order <= 1.0);
        assert!(summary.energy_std.is_finite() && summary.energy_std >= 0.0);
        assert!(summary.distribution.is_none());
        model.validate().unwrap();
    }

    #[test]
    fn test_phi4_run_has_distribution() {
        let mut model = Phi4Lattice::new(5, 5, Phi4Params::new(-1.0, 1.0).with_seed(4)).unwrap();
        let mut config = SimConfig::new(5, 5, 10, 30);
        config.sweeps_per_sample = 2;
        config.wolff_interval = Some(1);
        config.histogram_bins = 11;

        let summary = run(&mut model, &config, &mut NullSink, &|| {}).unwrap();
        let dist = summary.distribution.expect("phi4 has a distribution");
        assert_eq!(dist.histogram.n_bins(), 11);
        assert_eq!(dist.histogram.counts.iter().sum::<u64>(), 30);
        assert!(dist.bimodality >= 0.0 && dist.bimodality <= 1.0);
        assert_eq!(summary.counters.wolff_steps, 70);
    }

    #[test]
    fn test_runs_are_reproducible() {
        let config = SimConfig::new(4, 4, 5, 10);
        let mut a = IsingLattice::new(4, 4, 227).unwrap();
        let mut b = IsingLattice::new(4, 4, 227).unwrap();
        let sa = run(&mut a, &config, &mut NullSink, &|| {}).unwrap();
        let sb = run(&mut b, &config, &mut NullSink, &|| {}).unwrap();
        assert_eq!(a.spins(), b.spins());
        assert_eq!(sa.energy, sb.energy);
        assert_eq!(sa.autocorrelation, sb.autocorrelation);
    }

    // 4x4 at T = 1 with seed 100: one sample after one sweep, no
    // equilibration. Four of the sixteen random-site moves are accepted.
    #[test]
    fn test_single_sweep_run_is_exact() {
        let mut model = IsingLattice::new(4, 4, 100).unwrap();
        let start: Vec<i8> = vec![-1, -1, -1, 1, -1, -1, -1, -1, -1, 1, 1, 1, -1, -1, 1, -1];
        assert_eq!(model.spins(), start.as_slice());

        let mut config = SimConfig::new(4, 4, 0, 1);
        config.sweeps_per_sample = 1;
        let summary = run(&mut model, &config, &mut NullSink, &|| {}).unwrap();

        let end: Vec<i8> = vec![-1, -1, -1, -1, -1, -1, -1, -1, -1, 1, 1, 1, -1, 1, 1, -1];
        assert_eq!(model.spins(), end.as_slice());
        assert_eq!(model.total_energy(), -0.75);
        assert_eq!(model.magnetization(), -0.375);
        assert_eq!(summary.n_samples, 1);
        assert_eq!(summary.energy, -0.75);
        assert_eq!(summary.order, -0.375);
        assert_eq!(summary.abs_order, 0.375);
        assert_eq!(summary.counters.metropolis_attempts, 16);
        assert_eq!(summary.counters.metropolis_accepted, 4);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut model = IsingLattice::new(4, 4, 100).unwrap();
        let mut config = SimConfig::new(4, 4, 0, 0);
        assert!(matches!(
            run(&mut model, &config, &mut NullSink, &|| {}),
            Err(SimError::InvalidConfig(_))
        ));

        config.sample_size = 1;
        config.x_dim = 5;
        assert!(matches!(
            run(&mut model, &config, &mut NullSink, &|| {}),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_integrity_violation_aborts() {
        let mut model = IsingLattice::new(3, 3, 100).unwrap();
        for site in 0..9 {
            model.set_spin(site, 2);
        }
        let config = SimConfig::new(3, 3, 1, 1);
        let err = run(&mut model, &config, &mut NullSink, &|| {}).unwrap_err();
        assert!(matches!(err, SimError::Integrity { value: 2, .. }));
    }

    #[test]
    fn test_snapshot_labels() {
        let mut model = IsingLattice::new(4, 4, 150).unwrap();
        let mut config = SimConfig::new(4, 4, 4, 2);
        config.sweeps_per_sample = 2;
        config.snapshot_frequency = Some(2);

        let mut sink = RecordingSink::default();
        let summary = run(&mut model, &config, &mut sink, &|| {}).unwrap();
        assert_eq!(sink.labels, ["equil-2", "equil-4", "sample-6", "sample-8"]);
        assert_eq!(summary.counters.snapshot_failures, 0);
    }

    #[test]
    fn test_snapshot_failures_are_counted() {
        let mut model = Phi4Lattice::new(3, 3, Phi4Params::new(0.5, 1.0)).unwrap();
        let mut config = SimConfig::new(3, 3, 3, 3);
        config.sweeps_per_sample = 1;
        config.snapshot_frequency = Some(1);

        let mut sink = RecordingSink {
            fail: true,
            ..Default::default()
        };
        let summary = run(&mut model, &config, &mut sink, &|| {}).unwrap();
        assert_eq!(summary.counters.snapshot_failures, 6);
        assert_eq!(summary.n_samples, 3);
    }

    #[test]
    fn test_file_snapshots() {
        let dir = std::env::temp_dir().join(format!("field-sim-run-{}", std::process::id()));
        let mut sink = FileSnapshotSink::create(&dir, "lat").unwrap();
        let mut model = IsingLattice::new(3, 3, 120).unwrap();
        let mut config = SimConfig::new(3, 3, 1, 1);
        config.sweeps_per_sample = 1;
        config.snapshot_frequency = Some(1);

        run(&mut model, &config, &mut sink, &|| {}).unwrap();
        let last = std::fs::read_to_string(dir.join("lat-sample-2.txt")).unwrap();
        assert_eq!(last, model.render_grid());
        assert!(dir.join("lat-equil-1.txt").exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
