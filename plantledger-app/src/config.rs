use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf};

/// Settings read from `plantledger.yaml`. Every field has a default, so a
/// missing file or a partial one is fine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root of the YAML data directory.
    pub data_dir: PathBuf,
    /// Where charts and exports go when no explicit path is given.
    pub output_dir: PathBuf,
    /// Price per kWh for months that have never been saved.
    pub default_price_per_kwh: Option<f64>,
    pub currency: String,
    /// An `EnvFilter` directive, e.g. "info" or "plantledger_core=debug".
    pub log_level: String,
    pub log_json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            output_dir: PathBuf::from("./data/reports"),
            default_price_per_kwh: None,
            currency: "USD".to_string(),
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl AppConfig {
    /// Loads the configuration at `path`, or the defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: AppConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML from {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if let Some(price) = self.default_price_per_kwh {
            anyhow::ensure!(
                price.is_finite() && price >= 0.0,
                "default_price_per_kwh must be a non-negative number, got {}",
                price
            );
        }
        Ok(())
    }
}
