//! Training hyper-parameters.
use crate::error::{NnError, NnResult};
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for [`Network::fit`](crate::Network::fit) and
/// [`AutoEncoder::fit`](crate::AutoEncoder::fit).
///
/// Missing fields in JSON take their default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub epochs: usize,
    pub learning_rate: f32,
    pub momentum: f32,
    /// Seed for sample shuffling. `None` draws from OS entropy.
    pub seed: Option<u64>,
    pub shuffle: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 1000,
            learning_rate: 0.3,
            momentum: 0.5,
            seed: None,
            shuffle: true,
        }
    }
}

impl TrainConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("invalid training config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> NnResult<()> {
        if self.epochs == 0 {
            return Err(NnError::InvalidArgument("epochs must be positive".into()));
        }
        if !self.learning_rate.is_finite() || self.learning_rate < 0.0 {
            return Err(NnError::InvalidArgument(format!(
                "learning rate must be finite and non-negative, got {}",
                self.learning_rate
            )));
        }
        if !self.momentum.is_finite() || self.momentum < 0.0 {
            return Err(NnError::InvalidArgument(format!(
                "momentum must be finite and non-negative, got {}",
                self.momentum
            )));
        }
        Ok(())
    }

    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn partial_json_uses_defaults() {
        let config = TrainConfig::from_json_str(r#"{"epochs": 10, "seed": 3}"#).unwrap();
        assert_eq!(config.epochs, 10);
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.learning_rate, 0.3);
        assert!(config.shuffle);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(TrainConfig::from_json_str(r#"{"epochs": 0}"#).is_err());
        let config = TrainConfig {
            learning_rate: f32::NAN,
            ..TrainConfig::default()
        };
        assert!(matches!(config.validate(), Err(NnError::InvalidArgument(_))));
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        let config = TrainConfig {
            seed: Some(42),
            ..TrainConfig::default()
        };
        assert_eq!(config.rng().gen::<u64>(), config.rng().gen::<u64>());
    }
}
