// Loading `SolverConfig` from TOML.
//
// ```toml
// backend = "highs"          # auto | highs | coin_cbc | greedy
// time_limit = 30.0          # seconds
// gap_tolerance = 0.01
// verbose = false
// sensitivity = true
// throughput_policy = "inflow_and_outflow"
// ```
//
// Every key is optional; missing keys take their defaults.

use std::io;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use crate::domain::SolverConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl SolverConfig {
    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Like [`SolverConfig::load`], but a missing file yields the defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match Self::load(path.as_ref()) {
            Err(ConfigError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.as_ref().display(), "no solver config, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if let Some(secs) = self.time_limit {
            if Duration::try_from_secs_f64(secs).is_err() {
                return Err(ConfigError::Invalid(format!(
                    "time_limit must be a representable number of seconds >= 0 (got {})",
                    secs
                )));
            }
        }
        if let Some(gap) = self.gap_tolerance {
            if !(0.0..=1.0).contains(&gap) {
                return Err(ConfigError::Invalid(format!(
                    "gap_tolerance must lie within [0, 1] (got {})",
                    gap
                )));
            }
        }
        Ok(())
    }
}
