use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    errors::WizardError,
    submission::ProgressPlan,
    utils::{self, persistence},
};

const MAX_DEBOUNCE_MS: u64 = 5_000;
const MAX_MINIMUM_AGE: u32 = 120;

/// Tunables for a wizard instance. Every key is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    /// Minimum applicant age, in whole calendar years.
    pub minimum_age: u32,
    /// Coalescing window for keystroke-driven validation.
    pub debounce_ms: u64,
    /// Contact shown when the form can no longer be driven.
    pub fallback_phone: String,
    /// Identifier of the local snapshot written on completion.
    pub snapshot_key: String,
    /// `event_category` attribute attached to every analytics event.
    pub event_category: String,
    pub progress: ProgressPlan,
    /// Latency of the simulated backend used by the terminal front end.
    pub simulated_latency_ms: u64,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            minimum_age: 18,
            debounce_ms: 500,
            fallback_phone: "1-800-555-0199".into(),
            snapshot_key: "insurance_form_data".into(),
            event_category: "Insurance Form".into(),
            progress: ProgressPlan::default(),
            simulated_latency_ms: 2_000,
        }
    }
}

impl WizardConfig {
    pub fn validate(&self) -> Result<(), WizardError> {
        if self.minimum_age == 0 || self.minimum_age > MAX_MINIMUM_AGE {
            return Err(WizardError::Config(format!(
                "minimum_age must be between 1 and {} (got {})",
                MAX_MINIMUM_AGE, self.minimum_age
            )));
        }
        if self.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(WizardError::Config(format!(
                "debounce_ms must be between 0 and {} (got {})",
                MAX_DEBOUNCE_MS, self.debounce_ms
            )));
        }
        if self.snapshot_key.trim().is_empty() {
            return Err(WizardError::Config("snapshot_key cannot be empty".into()));
        }
        Ok(())
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::with_base_dir(utils::app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Self {
        Self {
            path: utils::config_file_in(&base),
        }
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads and validates the configuration, falling back to defaults when no
    /// file exists yet.
    pub fn load(&self) -> Result<WizardConfig, WizardError> {
        let config = persistence::read_json::<WizardConfig>(&self.path)?.unwrap_or_default();
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &WizardConfig) -> Result<(), WizardError> {
        config.validate()?;
        persistence::write_json_atomic(&self.path, config)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_returns_defaults_when_file_missing() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf());
        let config = manager.load().unwrap();
        assert_eq!(config, WizardConfig::default());
        assert_eq!(config.minimum_age, 18);
    }

    #[test]
    fn save_then_load_preserves_overrides() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf());
        let config = WizardConfig {
            minimum_age: 16,
            debounce_ms: 300,
            ..WizardConfig::default()
        };
        manager.save(&config).unwrap();
        assert_eq!(manager.load().unwrap(), config);
    }

    #[test]
    fn partial_file_fills_remaining_keys_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.json");
        std::fs::write(&path, r#"{ "minimum_age": 21 }"#).unwrap();
        let config = ConfigManager::with_path(path).load().unwrap();
        assert_eq!(config.minimum_age, 21);
        assert_eq!(config.debounce_ms, 500);
    }

    #[test]
    fn out_of_range_debounce_is_rejected() {
        let config = WizardConfig {
            debounce_ms: 60_000,
            ..WizardConfig::default()
        };
        assert!(matches!(config.validate(), Err(WizardError::Config(_))));
    }

    #[test]
    fn minimum_age_must_be_a_plausible_age() {
        for minimum_age in [0, 121, 3_000_000_000] {
            let config = WizardConfig {
                minimum_age,
                ..WizardConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(WizardError::Config(_))),
                "{minimum_age} should be rejected"
            );
        }
        let oldest = WizardConfig {
            minimum_age: 120,
            ..WizardConfig::default()
        };
        assert!(oldest.validate().is_ok());
    }

    #[test]
    fn file_with_huge_minimum_age_fails_to_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.json");
        std::fs::write(&path, r#"{ "minimum_age": 3000000000 }"#).unwrap();
        assert!(ConfigManager::with_path(path).load().is_err());
    }
}
