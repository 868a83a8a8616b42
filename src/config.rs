//! Back-office configuration: defaults, an optional JSON file, then environment overrides.
//!
//! # Environment Variables
//!
//! - `BACKOFFICE_CONFIG`: path of a JSON file merged over the defaults
//! - `BACKOFFICE_LOG`: log filter (default: info)
//! - `BACKOFFICE_HIGH_VALUE_LEAD_SCORE`: lead score that triggers auto-assignment (default: 80)
//! - `BACKOFFICE_LARGE_EXPENSE_AMOUNT`: expense amount above which approval is requested
//!   (default: 50000)
//!
//! A JSON file only needs to carry the keys it changes:
//!
//! ```json
//! { "workflow": { "large_expense_amount": 20000 }, "finance": { "card_fee_rate": 0.025 } }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_VAR: &str = "BACKOFFICE_CONFIG";
pub const LOG_VAR: &str = "BACKOFFICE_LOG";
pub const LEAD_SCORE_VAR: &str = "BACKOFFICE_HIGH_VALUE_LEAD_SCORE";
pub const EXPENSE_AMOUNT_VAR: &str = "BACKOFFICE_LARGE_EXPENSE_AMOUNT";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file {}: {source}", .path.display())]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Thresholds used by the built-in workflow triggers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub high_value_lead_score: f64,
    pub large_expense_amount: f64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            high_value_lead_score: 80.0,
            large_expense_amount: 50_000.0,
        }
    }
}

/// Rates and thresholds used by the finance module's hooks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinanceConfig {
    /// Revenues above this amount are split into installments.
    pub installment_threshold: f64,
    pub card_fee_rate: f64,
    pub overseas_tax_rate: f64,
}

impl Default for FinanceConfig {
    fn default() -> Self {
        Self {
            installment_threshold: 100_000.0,
            card_fee_rate: 0.03,
            overseas_tax_rate: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackofficeConfig {
    pub log_filter: String,
    pub workflow: WorkflowConfig,
    pub finance: FinanceConfig,
}

impl Default for BackofficeConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            workflow: WorkflowConfig::default(),
            finance: FinanceConfig::default(),
        }
    }
}

impl BackofficeConfig {
    /// Loads configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|var| std::env::var(var).ok())
    }

    /// Same as [`BackofficeConfig::load`] with an injectable variable lookup.
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match lookup(CONFIG_PATH_VAR) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::InvalidJson {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(filter) = lookup(LOG_VAR) {
            self.log_filter = filter;
        }
        if let Some(value) = lookup(LEAD_SCORE_VAR) {
            self.workflow.high_value_lead_score = parse_amount(LEAD_SCORE_VAR, value)?;
        }
        if let Some(value) = lookup(EXPENSE_AMOUNT_VAR) {
            self.workflow.large_expense_amount = parse_amount(EXPENSE_AMOUNT_VAR, value)?;
        }
        Ok(())
    }
}

fn parse_amount(var: &'static str, value: String) -> Result<f64, ConfigError> {
    match value.trim().parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(parsed),
        _ => Err(ConfigError::InvalidEnv { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = BackofficeConfig::load_with(env(&[])).unwrap();
        assert_eq!(config, BackofficeConfig::default());
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.workflow.high_value_lead_score, 80.0);
        assert_eq!(config.finance.installment_threshold, 100_000.0);
    }

    #[test]
    fn test_env_overrides() {
        let config = BackofficeConfig::load_with(env(&[
            (LOG_VAR, "debug"),
            (LEAD_SCORE_VAR, "70"),
            (EXPENSE_AMOUNT_VAR, " 12000.5 "),
        ]))
        .unwrap();
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.workflow.high_value_lead_score, 70.0);
        assert_eq!(config.workflow.large_expense_amount, 12_000.5);
    }

    #[test]
    fn test_malformed_env_is_an_error() {
        let err = BackofficeConfig::load_with(env(&[(LEAD_SCORE_VAR, "high")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: LEAD_SCORE_VAR, .. }));
    }

    #[test]
    fn test_partial_json_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "finance": {{ "card_fee_rate": 0.025 }} }}"#).unwrap();

        let path = file.path().to_string_lossy().into_owned();
        let config = BackofficeConfig::load_with(env(&[(CONFIG_PATH_VAR, path.as_str())])).unwrap();

        assert_eq!(config.finance.card_fee_rate, 0.025);
        assert_eq!(config.finance.overseas_tax_rate, 0.05);
        assert_eq!(config.workflow, WorkflowConfig::default());
    }

    #[test]
    fn test_malformed_json_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = BackofficeConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidJson { .. }));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let missing = "/nonexistent/backoffice.json";
        let err = BackofficeConfig::load_with(env(&[(CONFIG_PATH_VAR, missing)])).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
