use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StatsError;

/// Stats configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Percentiles reported by trend summaries, in `[0, 100]`
    pub trend_percentiles: Vec<f64>,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            trend_percentiles: vec![90.0, 95.0],
        }
    }
}

impl StatsConfig {
    /// Load and validate a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, StatsError> {
        let data = std::fs::read(path)?;
        let config: StatsConfig = serde_json::from_slice(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), StatsError> {
        for p in &self.trend_percentiles {
            if !(0.0..=100.0).contains(p) {
                return Err(StatsError::Config(format!(
                    "trend percentile {p} is out of range [0, 100]"
                )));
            }
        }
        Ok(())
    }
}
