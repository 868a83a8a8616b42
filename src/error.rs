use crate::config::ConfigError;
use app_core::CoreError;

/// Errors that stop the back-office process.
#[derive(Debug, thiserror::Error)]
pub enum BackofficeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}
