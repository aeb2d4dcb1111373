/// Default number of order-parameter bins. Odd, so zero sits in the middle bin.
pub const DEFAULT_BINS: usize = 21;

/// Equal-width histogram of signed order-parameter samples over
/// `[-max_abs, +max_abs]`, where `max_abs` is the largest observed magnitude.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub counts: Vec<u64>,
    pub max_abs: f64,
}

impl Histogram {
    pub fn from_samples(values: &[f64], n_bins: usize) -> Self {
        let n_bins = n_bins.max(1);
        let max_abs = values.iter().fold(0.0f64, |m, v| m.max(v.abs()));
        let mut counts = vec![0u64; n_bins];

        if max_abs == 0.0 {
            counts[n_bins / 2] = values.len() as u64;
            return Self { counts, max_abs };
        }

        let width = 2.0 * max_abs / n_bins as f64;
        for &v in values {
            let bin = (((v + max_abs) / width) as usize).min(n_bins - 1);
            counts[bin] += 1;
        }
        Self { counts, max_abs }
    }

    pub fn n_bins(&self) -> usize {
        self.counts.len()
    }

    pub fn bin_width(&self) -> f64 {
        2.0 * self.max_abs / self.n_bins() as f64
    }

    pub fn bin_center(&self, bin: usize) -> f64 {
        -self.max_abs + (bin as f64 + 0.5) * self.bin_width()
    }

    pub fn middle(&self) -> u64 {
        self.counts[self.n_bins() / 2]
    }

    pub fn peak(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// `1 - middle / peak`: near 1 for a two-peaked distribution with an
    /// empty centre, 0 when the centre bin is the most populated.
    pub fn bimodality(&self) -> f64 {
        let peak = self.peak();
        if peak == 0 {
            return 0.0;
        }
        1.0 - self.middle() as f64 / peak as f64
    }
}

/// `1 - <m^4> / (3 <m^2>^2)`, or 0 when `<m^2>` vanishes.
pub fn binder_cumulant(avg_m2: f64, avg_m4: f64) -> f64 {
    if avg_m2 == 0.0 {
        return 0.0;
    }
    1.0 - avg_m4 / (3.0 * avg_m2 * avg_m2)
}
