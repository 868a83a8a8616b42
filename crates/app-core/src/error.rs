//! # Core Errors
//!
//! This module defines the error types used throughout the application core.
//!
//! Units plugged into the core (modules, services, schema hooks, workflow actions)
//! report failures as a [`BoxError`], so that every business capability can keep its
//! own error enum. The core wraps those boxed errors into [`CoreError`] variants that
//! carry the name of the failing unit.

/// Type-erased error returned by modules, services, hooks and workflow actions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by the application core itself.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Module `{name}` failed to initialize: {source}")]
    ModuleInit {
        name: String,
        #[source]
        source: BoxError,
    },
    #[error("Service `{name}` failed to initialize: {source}")]
    ServiceInit {
        name: String,
        #[source]
        source: BoxError,
    },
    #[error("Application already started")]
    AlreadyStarted,
    #[error("Application not started")]
    NotStarted,
    #[error("Schema not found: {0}")]
    SchemaNotFound(String),
    #[error("Validation failed for `{schema}`: {}", .errors.join("; "))]
    Validation { schema: String, errors: Vec<String> },
    #[error("Hook `{hook}` failed for `{schema}`: {source}")]
    Hook {
        schema: String,
        hook: &'static str,
        #[source]
        source: BoxError,
    },
}

impl CoreError {
    /// Name of the module or service whose initialization failed, if any.
    pub fn failed_unit(&self) -> Option<&str> {
        match self {
            CoreError::ModuleInit { name, .. } | CoreError::ServiceInit { name, .. } => {
                Some(name)
            }
            _ => None,
        }
    }
}
