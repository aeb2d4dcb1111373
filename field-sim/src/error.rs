//! Error types for field-sim.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// A spin site holds something other than +1 or -1. Every statistic
    /// derived after this point would be meaningless, so runs stop here.
    #[error("integrity violation: site {site} holds {value}, expected +1 or -1")]
    Integrity { site: usize, value: i8 },

    #[error("invalid lattice dimensions {x_dim}x{y_dim}, need x_dim >= 2 and y_dim >= 3")]
    InvalidDimensions { x_dim: usize, y_dim: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to write snapshot {}: {source}", path.display())]
    Snapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, SimError>;
