mod accumulator;
pub mod autocorrelation;
pub mod histogram;
pub mod results;
mod stats;

pub use accumulator::SampleAccumulator;
pub use autocorrelation::{compute_autocorrelation, standard_deviation, Autocorrelation};
pub use histogram::{binder_cumulant, Histogram, DEFAULT_BINS};
pub use results::{Distribution, RunSummary, UpdateCounters};
pub use stats::Statistics;
