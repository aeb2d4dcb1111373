pub mod clusters;
pub mod config;
pub mod error;
pub mod geometry;
pub mod mcmc;
pub mod models;
pub mod simulation;
pub mod statistics;

pub use config::{ModelKind, SimConfig};
pub use error::{Result, SimError};
pub use geometry::HelicalLattice;
pub use models::{FieldModel, IsingLattice, Phi4Lattice, Phi4Params};
pub use simulation::{run, FileSnapshotSink, NullSink, SnapshotSink};
pub use statistics::{Autocorrelation, Distribution, RunSummary, UpdateCounters};
