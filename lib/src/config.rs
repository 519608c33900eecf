use crate::error::{Result, TransferError};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Update rule used by the trainer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    #[default]
    Adam,
    Sgd,
}

/// Run settings for one training pipeline.
///
/// Missing fields in a JSON file fall back to the defaults below.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub optimizer: OptimizerKind,

    /// Seed of the train/validation/test shuffle.
    pub split_seed: u64,
    /// Seed of the network's weight initialization.
    pub init_seed: u64,
    pub holdout_fraction: f64,
    pub test_fraction: f64,

    pub verbose: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        TransferConfig {
            epochs: 100,
            learning_rate: 0.001,
            optimizer: OptimizerKind::Adam,

            split_seed: 42,
            init_seed: 0,
            holdout_fraction: 0.3,
            test_fraction: 0.5,

            verbose: true,
        }
    }
}

impl TransferConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<TransferConfig> {
        let config_bytes = fs::read(path)?;
        let config: TransferConfig = serde_json::from_slice(&config_bytes)?;
        config.validate()?;

        Ok(config)
    }

    pub fn dump<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let config_str = serde_json::to_string_pretty(&self)?;
        fs::write(path, config_str)?;

        Ok(())
    }

    /// # Errors
    /// `InvalidParameter` for zero epochs, a non-positive or non-finite
    /// learning rate, or a fraction outside `(0, 1)`.
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(TransferError::InvalidParameter(
                "epochs must be at least 1".into(),
            ));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(TransferError::InvalidParameter(format!(
                "learning_rate must be positive and finite, got {}",
                self.learning_rate
            )));
        }
        for (name, value) in [
            ("holdout_fraction", self.holdout_fraction),
            ("test_fraction", self.test_fraction),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(TransferError::InvalidParameter(format!(
                    "{} must lie in (0, 1), got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}
