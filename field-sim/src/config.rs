use validator::{Validate, ValidationError};

use crate::statistics::DEFAULT_BINS;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModelKind {
    Ising,
    Phi4,
}

impl TryFrom<&str> for ModelKind {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "ising" => Ok(Self::Ising),
            "phi4" => Ok(Self::Phi4),
            _ => Err(format!("unknown model '{s}', expected 'ising' or 'phi4'")),
        }
    }
}

fn validate_sim_config(cfg: &SimConfig) -> Result<(), ValidationError> {
    if cfg.x_dim < 2 {
        return Err(ValidationError::new("x_dim must be >= 2"));
    }
    if cfg.y_dim < 3 {
        return Err(ValidationError::new("y_dim must be >= 3"));
    }
    if cfg.sample_size < 1 {
        return Err(ValidationError::new("sample_size must be >= 1"));
    }
    if cfg.sweeps_per_sample < 1 {
        return Err(ValidationError::new("sweeps_per_sample must be >= 1"));
    }
    if cfg.wolff_interval == Some(0) {
        return Err(ValidationError::new("wolff_interval must be >= 1"));
    }
    if cfg.snapshot_frequency == Some(0) {
        return Err(ValidationError::new("snapshot_frequency must be >= 1"));
    }
    if cfg.histogram_bins < 3 || cfg.histogram_bins % 2 == 0 {
        return Err(ValidationError::new("histogram_bins must be odd and >= 3"));
    }
    Ok(())
}

/// Run schedule shared by both models.
#[derive(Debug, Clone, Validate)]
#[validate(schema(function = "validate_sim_config"))]
pub struct SimConfig {
    pub x_dim: usize,
    pub y_dim: usize,
    /// Sweeps discarded before the first sample.
    pub equilibration_sweeps: usize,
    pub sample_size: usize,
    pub sweeps_per_sample: usize,
    /// Run one Wolff step after every `n`-th sweep.
    pub wolff_interval: Option<usize>,
    /// Hand the grid to the snapshot sink every `n` sweeps.
    pub snapshot_frequency: Option<usize>,
    pub histogram_bins: usize,
}

impl SimConfig {
    pub fn new(x_dim: usize, y_dim: usize, equilibration_sweeps: usize, sample_size: usize) -> Self {
        Self {
            x_dim,
            y_dim,
            equilibration_sweeps,
            sample_size,
            sweeps_per_sample: 5,
            wolff_interval: None,
            snapshot_frequency: None,
            histogram_bins: DEFAULT_BINS,
        }
    }

    pub fn total_sweeps(&self) -> usize {
        self.equilibration_sweeps + self.sample_size * self.sweeps_per_sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_kind_parse() {
        assert_eq!(ModelKind::try_from("ising"), Ok(ModelKind::Ising));
        assert_eq!(ModelKind::try_from("phi4"), Ok(ModelKind::Phi4));
        let err = ModelKind::try_from("potts").unwrap_err();
        assert!(err.contains("potts"));
    }

    #[test]
    fn test_defaults_validate() {
        let cfg = SimConfig::new(8, 8, 100, 50);
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.sweeps_per_sample, 5);
        assert_eq!(cfg.total_sweeps(), 350);
    }

    #[test]
    fn test_rejects_bad_schedules() {
        let base = SimConfig::new(4, 4, 0, 1);

        let mut cfg = base.clone();
        cfg.y_dim = 1;
        assert!(cfg.validate().is_err());

        let mut cfg = base.clone();
        cfg.y_dim = 2;
        assert!(cfg.validate().is_err());

        let mut cfg = base.clone();
        cfg.x_dim = 2;
        cfg.y_dim = 3;
        assert!(cfg.validate().is_ok());

        let mut cfg = base.clone();
        cfg.sample_size = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = base.clone();
        cfg.sweeps_per_sample = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = base.clone();
        cfg.wolff_interval = Some(0);
        assert!(cfg.validate().is_err());

        let mut cfg = base.clone();
        cfg.snapshot_frequency = Some(0);
        assert!(cfg.validate().is_err());

        let mut cfg = base.clone();
        cfg.histogram_bins = 20;
        assert!(cfg.validate().is_err());

        let mut cfg = base;
        cfg.wolff_interval = Some(1);
        cfg.snapshot_frequency = Some(3);
        assert!(cfg.validate().is_ok());
    }
}
