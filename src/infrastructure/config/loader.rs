use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use thiserror::Error;

use crate::domain::models::config::ArbiterConfig;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid activation_threshold: {0}. Must be between 0 and 100")]
    InvalidActivationThreshold(f64),

    #[error("Invalid conflict_resolution_threshold: {0}. Must be between 0 and 100")]
    InvalidConflictThreshold(f64),

    #[error("Invalid switch_threshold: {0}. Must be between 0 and 100")]
    InvalidSwitchThreshold(f64),

    #[error("Invalid stability_window_seconds: {0}. Must be at least 1")]
    InvalidStabilityWindow(u64),

    #[error("Invalid max_secondary_domains: {0}. Must be at most 4")]
    InvalidMaxSecondary(usize),

    #[error("Invalid low_availability_factor: {0}. Must be within (0, 1]")]
    InvalidAvailabilityFactor(f64),

    #[error("Invalid compute_budget_ms: {0}. Must be at least 1")]
    InvalidComputeBudget(u64),

    #[error("Invalid base weight for {0}: {1}. Must be between 0 and 100")]
    InvalidBaseWeight(&'static str, f64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .arbiter/config.yaml (project config)
    /// 3. .arbiter/local.yaml (project local overrides, optional)
    /// 4. Environment variables (ARBITER_* prefix, highest priority)
    pub fn load() -> Result<ArbiterConfig> {
        let config: ArbiterConfig = Figment::new()
            .merge(Serialized::defaults(ArbiterConfig::default()))
            .merge(Yaml::file(".arbiter/config.yaml"))
            .merge(Yaml::file(".arbiter/local.yaml"))
            .merge(Env::prefixed("ARBITER_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<ArbiterConfig> {
        let config: ArbiterConfig = Figment::new()
            .merge(Serialized::defaults(ArbiterConfig::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading. Tenant overrides are checked
    /// by validating each tenant's resolved effective config.
    pub fn validate(config: &ArbiterConfig) -> Result<(), ConfigError> {
        Self::validate_effective(config)?;
        for tenant in config.tenants.keys() {
            Self::validate_effective(&config.for_tenant(tenant)).map_err(|e| {
                ConfigError::ValidationFailed(format!("tenant '{tenant}': {e}"))
            })?;
        }
        Ok(())
    }

    fn validate_effective(config: &ArbiterConfig) -> Result<(), ConfigError> {
        if !(0.0..=100.0).contains(&config.activation_threshold) {
            return Err(ConfigError::InvalidActivationThreshold(
                config.activation_threshold,
            ));
        }
        if !(0.0..=100.0).contains(&config.conflict_resolution_threshold) {
            return Err(ConfigError::InvalidConflictThreshold(
                config.conflict_resolution_threshold,
            ));
        }
        if !(0.0..=100.0).contains(&config.switch_threshold) {
            return Err(ConfigError::InvalidSwitchThreshold(config.switch_threshold));
        }
        if config.stability_window_seconds == 0 {
            return Err(ConfigError::InvalidStabilityWindow(
                config.stability_window_seconds,
            ));
        }
        if config.max_secondary_domains > 4 {
            return Err(ConfigError::InvalidMaxSecondary(
                config.max_secondary_domains,
            ));
        }
        if config.low_availability_factor <= 0.0 || config.low_availability_factor > 1.0 {
            return Err(ConfigError::InvalidAvailabilityFactor(
                config.low_availability_factor,
            ));
        }
        if config.compute_budget_ms == 0 {
            return Err(ConfigError::InvalidComputeBudget(config.compute_budget_ms));
        }

        let weights = [
            ("health", config.base_weights.health),
            ("social", config.base_weights.social),
            ("learning", config.base_weights.learning),
            ("exploration", config.base_weights.exploration),
            ("commerce", config.base_weights.commerce),
        ];
        for (name, weight) in weights {
            if !(0.0..=100.0).contains(&weight) {
                return Err(ConfigError::InvalidBaseWeight(name, weight));
            }
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }
        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_default_config() {
        let config = ArbiterConfig::default();
        assert!((config.activation_threshold - 20.0).abs() < f64::EPSILON);
        assert!((config.switch_threshold - 15.0).abs() < f64::EPSILON);
        assert_eq!(config.stability_window_seconds, 60);
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
activation_threshold: 25.0
switch_threshold: 10.0
base_weights:
  health: 100.0
  social: 80.0
logging:
  level: debug
  format: pretty
";

        let config: ArbiterConfig = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert!((config.activation_threshold - 25.0).abs() < f64::EPSILON);
        assert!((config.switch_threshold - 10.0).abs() < f64::EPSILON);
        assert!((config.base_weights.social - 80.0).abs() < f64::EPSILON);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "pretty");

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_out_of_range_threshold() {
        let config = ArbiterConfig {
            activation_threshold: 150.0,
            ..Default::default()
        };

        let result = ConfigLoader::validate(&config);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidActivationThreshold(_)
        ));
    }

    #[test]
    fn test_validate_zero_stability_window() {
        let config = ArbiterConfig {
            stability_window_seconds: 0,
            ..Default::default()
        };

        let result = ConfigLoader::validate(&config);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidStabilityWindow(0)
        ));
    }

    #[test]
    fn test_validate_bad_availability_factor() {
        let config = ArbiterConfig {
            low_availability_factor: 1.5,
            ..Default::default()
        };

        let result = ConfigLoader::validate(&config);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidAvailabilityFactor(_)
        ));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = ArbiterConfig::default();
        config.logging.level = "invalid".to_string();

        let result = ConfigLoader::validate(&config);
        match result.unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "invalid"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = ArbiterConfig::default();
        config.logging.format = "xml".to_string();

        let result = ConfigLoader::validate(&config);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidLogFormat(_)
        ));
    }

    #[test]
    fn test_validate_bad_tenant_override() {
        use crate::domain::models::config::TenantOverrides;

        let mut config = ArbiterConfig::default();
        config.tenants.insert(
            "acme".to_string(),
            TenantOverrides {
                switch_threshold: Some(250.0),
                ..Default::default()
            },
        );

        let result = ConfigLoader::validate(&config);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationFailed(_)
        ));
    }

    #[test]
    fn test_env_override() {
        env::set_var("ARBITER_SWITCH_THRESHOLD", "12.5");
        env::set_var("ARBITER_LOGGING__LEVEL", "debug");

        assert_eq!(env::var("ARBITER_SWITCH_THRESHOLD").unwrap(), "12.5");
        assert_eq!(env::var("ARBITER_LOGGING__LEVEL").unwrap(), "debug");

        env::remove_var("ARBITER_SWITCH_THRESHOLD");
        env::remove_var("ARBITER_LOGGING__LEVEL");
    }

    #[test]
    fn test_hierarchical_merging() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(
            base_file,
            "activation_threshold: 25.0\nlogging:\n  level: info\n  format: json"
        )
        .unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(override_file, "activation_threshold: 35.0\nlogging:\n  level: debug").unwrap();
        override_file.flush().unwrap();

        let config: ArbiterConfig = Figment::new()
            .merge(Serialized::defaults(ArbiterConfig::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert!((config.activation_threshold - 35.0).abs() < f64::EPSILON, "Override should win");
        assert_eq!(
            config.logging.level, "debug",
            "Override should win for nested fields"
        );
        assert_eq!(
            config.logging.format, "json",
            "Base value should persist when not overridden"
        );
    }
}
