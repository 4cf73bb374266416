use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tram_core::{ErrorInfo, TramError};

/// YAML-configurable parameters governing the self-consistent iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatorConfig {
    /// Upper bound on the number of `(log_nu, f)` update pairs.
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    /// Stop once the largest change of any `f_K_i` drops below this value.
    #[serde(default = "default_ftol")]
    pub ftol: f64,
    /// Ensemble whose state probabilities are normalised to one.
    #[serde(default)]
    pub target_ensemble: usize,
    /// Emit a progress record every `log_interval` iterations (0 disables).
    #[serde(default = "default_log_interval")]
    pub log_interval: usize,
}

fn default_max_iter() -> usize {
    10_000
}

fn default_ftol() -> f64 {
    1.0e-10
}

fn default_log_interval() -> usize {
    100
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            max_iter: default_max_iter(),
            ftol: default_ftol(),
            target_ensemble: 0,
            log_interval: default_log_interval(),
        }
    }
}

impl EstimatorConfig {
    /// Parses a configuration from a YAML document. Missing fields take defaults.
    pub fn from_yaml_str(contents: &str) -> Result<Self, TramError> {
        let config: Self = serde_yaml::from_str(contents).map_err(|err| {
            TramError::Config(ErrorInfo::new("config-parse", err.to_string()))
        })?;
        config.check()?;
        Ok(config)
    }

    /// Loads a configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self, TramError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            TramError::Config(
                ErrorInfo::new("config-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Self::from_yaml_str(&contents).map_err(|err| match err {
            TramError::Config(info) => {
                TramError::Config(info.with_context("path", path.display().to_string()))
            }
            other => other,
        })
    }

    /// Serialises the configuration back to YAML.
    pub fn to_yaml_string(&self) -> Result<String, TramError> {
        serde_yaml::to_string(self).map_err(|err| {
            TramError::Config(ErrorInfo::new("config-serialize", err.to_string()))
        })
    }

    fn check(&self) -> Result<(), TramError> {
        if !(self.ftol.is_finite() && self.ftol >= 0.0) {
            return Err(TramError::Config(
                ErrorInfo::new("invalid-ftol", "ftol must be a finite non-negative number")
                    .with_context("ftol", self.ftol.to_string()),
            ));
        }
        Ok(())
    }
}
