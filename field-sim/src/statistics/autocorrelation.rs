/// Autocorrelation of an ordered sample series.
///
/// `function[t]` is the lag-`t` autocovariance divided by the lag-0
/// variance (`scale_factor`). The time is estimated from the leading run of
/// lags where the function stays positive and strictly decreasing,
/// treating each such lag as a point on an exponential decay:
/// `tau = mean over t of t / -ln(function[t])`.
#[derive(Debug, Clone, PartialEq)]
pub struct Autocorrelation {
    pub function: Vec<f64>,
    pub time: f64,
    pub scale_factor: f64,
    /// First lag that left the decay window. Lags `1..valid_lags` were used.
    pub valid_lags: usize,
}

impl Autocorrelation {
    /// No lag survived the window, so the time is defined as 0.
    pub fn is_degenerate(&self) -> bool {
        self.valid_lags <= 1
    }
}

/// Compute the autocorrelation function and time of `series`.
///
/// Order matters: `series` must be in sampling order. A series with no
/// measurable variance (constant, or a single sample) returns a zero scale
/// factor and zero time instead of dividing by zero.
pub fn compute_autocorrelation(series: &[f64]) -> Autocorrelation {
    let n = series.len();
    if n == 0 {
        return Autocorrelation {
            function: Vec::new(),
            time: 0.0,
            scale_factor: 0.0,
            valid_lags: 0,
        };
    }

    let nf = n as f64;
    let mean = series.iter().sum::<f64>() / nf;
    let mean_sq = series.iter().map(|x| x * x).sum::<f64>() / nf;
    let scale_factor = mean_sq - mean * mean;

    let mut function = vec![0.0; n];
    function[0] = 1.0;

    // variance below rounding noise of <x^2>
    if scale_factor <= f64::EPSILON * mean_sq {
        return Autocorrelation {
            function,
            time: 0.0,
            scale_factor: 0.0,
            valid_lags: 1,
        };
    }

    for t in 1..n {
        let count = n - t;
        let sum: f64 = series[..count]
            .iter()
            .zip(&series[t..])
            .map(|(a, b)| a * b)
            .sum();
        function[t] = (sum / count as f64 - mean * mean) / scale_factor;
    }

    let mut time = 0.0;
    let mut lag = 1;
    while lag < n && function[lag] > 0.0 && function[lag] < function[lag - 1] {
        time += lag as f64 / -function[lag].ln();
        lag += 1;
    }
    if lag > 1 {
        time /= (lag - 1) as f64;
    }

    Autocorrelation {
        function,
        time,
        scale_factor,
        valid_lags: lag,
    }
}

/// Error of a mean corrected for serial correlation:
/// `sqrt(2 tau / n * (<x^2> - <x>^2))`. Zero when `tau` is zero.
pub fn standard_deviation(tau: f64, n_samples: usize, mean: f64, mean_sq: f64) -> f64 {
    if tau <= 0.0 || n_samples == 0 {
        return 0.0;
    }
    let variance = (mean_sq - mean * mean).max(0.0);
    (2.0 * tau / n_samples as f64 * variance).sqrt()
}
