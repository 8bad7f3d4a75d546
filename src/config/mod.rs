//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Parameters of the skill rating update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingConfig {
    /// Prior mean skill of a new player
    #[serde(default = "default_mu")]
    pub mu: f64,

    /// Prior uncertainty of a new player
    #[serde(default = "default_sigma")]
    pub sigma: f64,

    /// Performance variability within a single play
    #[serde(default = "default_beta")]
    pub beta: f64,

    /// Lower bound of the sigma shrink factor
    #[serde(default = "default_kappa")]
    pub kappa: f64,

    /// Uncertainty added before every play
    #[serde(default = "default_tau")]
    pub tau: f64,

    /// Never let a play increase a player's sigma
    #[serde(default)]
    pub limit_sigma: bool,
}

fn default_mu() -> f64 {
    25.0
}

fn default_sigma() -> f64 {
    default_mu() / 3.0
}

fn default_beta() -> f64 {
    default_sigma() / 2.0
}

fn default_kappa() -> f64 {
    0.0001
}

fn default_tau() -> f64 {
    default_mu() / 300.0
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            mu: default_mu(),
            sigma: default_sigma(),
            beta: default_beta(),
            kappa: default_kappa(),
            tau: default_tau(),
            limit_sigma: false,
        }
    }
}

impl RatingConfig {
    /// Validate the rating parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sigma.is_nan() || self.sigma <= 0.0 {
            return Err(ConfigError::ValidationError(
                "rating.sigma must be greater than 0".to_string(),
            ));
        }
        if self.beta.is_nan() || self.beta <= 0.0 {
            return Err(ConfigError::ValidationError(
                "rating.beta must be greater than 0".to_string(),
            ));
        }
        if self.kappa.is_nan() || self.kappa < 0.0 || self.tau.is_nan() || self.tau < 0.0 {
            return Err(ConfigError::ValidationError(
                "rating.kappa and rating.tau must not be negative".to_string(),
            ));
        }
        if !self.mu.is_finite() {
            return Err(ConfigError::ValidationError(
                "rating.mu must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Report settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Plays a player needs before appearing among the best players
    #[serde(default = "default_min_plays")]
    pub min_plays: u32,

    /// Numeric misc fields added to game and player statistics
    #[serde(default)]
    pub numeric_dimensions: Vec<String>,
}

fn default_min_plays() -> u32 {
    3
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            min_plays: default_min_plays(),
            numeric_dimensions: Vec::new(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub rating: RatingConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            rating: RatingConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rating.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.log_level, "info");
        assert_eq!(config.rating.mu, 25.0);
        assert!((config.rating.sigma - 25.0 / 3.0).abs() < 1e-12);
        assert!((config.rating.beta - 25.0 / 6.0).abs() < 1e-12);
        assert!((config.rating.tau - 25.0 / 300.0).abs() < 1e-12);
        assert_eq!(config.report.min_plays, 3);
    }

    #[test]
    fn test_config_validation_ok() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_sigma() {
        let mut config = AppConfig::default();
        config.rating.sigma = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_nan_beta() {
        let mut config = AppConfig::default();
        config.rating.beta = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_negative_tau() {
        let mut config = AppConfig::default();
        config.rating.tau = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [rating]
            beta = 3.0

            [report]
            min_plays = 5
            numeric_dimensions = ["rounds"]
            "#,
        )
        .unwrap();

        assert_eq!(config.rating.beta, 3.0);
        assert_eq!(config.rating.mu, 25.0);
        assert_eq!(config.report.min_plays, 5);
        assert_eq!(config.report.numeric_dimensions, vec!["rounds".to_string()]);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        assert!(matches!(
            AppConfig::from_toml("rating = 3"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_from_file_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let missing = AppConfig::load_or_default(&path).unwrap();
        assert_eq!(missing, AppConfig::default());

        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "log_level = \"debug\"").unwrap();

        let loaded = AppConfig::load_or_default(&path).unwrap();
        assert_eq!(loaded.log_level, "debug");
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();

        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }
}
