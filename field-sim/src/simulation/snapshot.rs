use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SimError};

/// Destination for periodic text renderings of the lattice.
pub trait SnapshotSink {
    /// Store `grid` (one line per lattice row) under `label`.
    fn write(&mut self, label: &str, grid: &str) -> Result<()>;

    /// When false the driver skips rendering altogether.
    fn enabled(&self) -> bool {
        true
    }
}

/// Writes each snapshot to `<dir>/<prefix>-<label>.txt`.
#[derive(Debug, Clone)]
pub struct FileSnapshotSink {
    dir: PathBuf,
    prefix: String,
}

impl FileSnapshotSink {
    /// Creates `dir` if it does not exist yet.
    pub fn create(dir: impl AsRef<Path>, prefix: impl Into<String>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| SimError::Snapshot {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            prefix: prefix.into(),
        })
    }

    pub fn path_for(&self, label: &str) -> PathBuf {
        self.dir.join(format!("{}-{label}.txt", self.prefix))
    }
}

impl SnapshotSink for FileSnapshotSink {
    fn write(&mut self, label: &str, grid: &str) -> Result<()> {
        let path = self.path_for(label);
        fs::write(&path, grid).map_err(|source| SimError::Snapshot { path, source })
    }
}

/// Discards snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl SnapshotSink for NullSink {
    fn write(&mut self, _label: &str, _grid: &str) -> Result<()> {
        Ok(())
    }

    fn enabled(&self) -> bool {
        false
    }
}
