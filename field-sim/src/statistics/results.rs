use super::autocorrelation::{compute_autocorrelation, standard_deviation, Autocorrelation};
use super::histogram::{binder_cumulant, Histogram};
use super::SampleAccumulator;
use crate::models::FieldModel;

/// Update bookkeeping gathered over a whole run, both phases included.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateCounters {
    pub metropolis_attempts: u64,
    pub metropolis_accepted: u64,
    pub wolff_steps: u64,
    /// Sum of Wolff cluster sizes.
    pub cluster_sites: u64,
    pub snapshot_failures: u64,
}

impl UpdateCounters {
    pub fn acceptance_rate(&self) -> f64 {
        if self.metropolis_attempts == 0 {
            return 0.0;
        }
        self.metropolis_accepted as f64 / self.metropolis_attempts as f64
    }

    pub fn mean_cluster_size(&self) -> f64 {
        if self.wolff_steps == 0 {
            return 0.0;
        }
        self.cluster_sites as f64 / self.wolff_steps as f64
    }
}

/// Shape diagnostics of the signed order-parameter samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    pub histogram: Histogram,
    pub bimodality: f64,
    pub binder_cumulant: f64,
}

/// Observables of one run.
///
/// Error bars use the autocorrelation time of the `|order|` series; when
/// that series has no decay window every error is zero.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub n_samples: usize,
    /// ⟨E⟩ per site.
    pub energy: f64,
    pub energy_std: f64,
    /// ⟨M⟩, signed.
    pub order: f64,
    pub order_std: f64,
    /// ⟨|M|⟩.
    pub abs_order: f64,
    pub abs_order_std: f64,
    pub specific_heat: f64,
    pub susceptibility: f64,
    pub autocorrelation: Autocorrelation,
    /// Scalar model only.
    pub distribution: Option<Distribution>,
    pub counters: UpdateCounters,
}

impl RunSummary {
    pub fn from_samples<M: FieldModel + ?Sized>(
        acc: &SampleAccumulator,
        model: &M,
        counters: UpdateCounters,
        histogram_bins: usize,
    ) -> Self {
        let n = acc.len();
        let autocorrelation = compute_autocorrelation(&acc.abs_orders);
        let tau = autocorrelation.time;

        let avg_e = acc.energy.average();
        let avg_e2 = acc.energy2.average();
        let avg_m = acc.order.average();
        let avg_m2 = acc.order2.average();
        let avg_abs = acc.abs_order.average();
        let avg_abs2 = acc.abs_order2.average();

        let distribution = model.has_distribution().then(|| {
            let histogram = Histogram::from_samples(&acc.orders, histogram_bins);
            Distribution {
                bimodality: histogram.bimodality(),
                binder_cumulant: binder_cumulant(avg_m2, acc.order4.average()),
                histogram,
            }
        });

        Self {
            n_samples: n,
            energy: avg_e,
            energy_std: standard_deviation(tau, n, avg_e, avg_e2),
            order: avg_m,
            order_std: standard_deviation(tau, n, avg_m, avg_m2),
            abs_order: avg_abs,
            abs_order_std: standard_deviation(tau, n, avg_abs, avg_abs2),
            specific_heat: model.specific_heat(avg_e, avg_e2),
            susceptibility: model.susceptibility(avg_abs, avg_abs2),
            autocorrelation,
            distribution,
            counters,
        }
    }
}
