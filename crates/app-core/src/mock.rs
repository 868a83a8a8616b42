//! # Mock Units & Testing Guide
//!
//! [`MockUnit`] implements both [`Module`] and [`Service`] and records every lifecycle call
//! into a shared [`CallLog`]. Failures are scripted up front, so startup and shutdown
//! ordering can be tested deterministically without any real domain code.
//!
//! ## When to use Mocks vs Real Modules
//!
//! | Feature | MockUnit | Real Module |
//! |---------|----------|-------------|
//! | **Speed** | Instant | Instant, but registers real schemas and hooks |
//! | **Ordering** | Every call recorded in one shared log | Only observable through logs |
//! | **Error Injection** | `fail_initialize` / `fail_destroy` | Requires broken config |
//! | **Use Case** | Boot sequence, shutdown, notifications | Record pipeline, workflows |
//!
//! ## Example
//!
//! ```rust
//! use app_core::mock::{CallLog, MockUnit};
//! use app_core::{ApplicationCore, CoreError};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let log = CallLog::new();
//! let core = ApplicationCore::new();
//! core.register_module("crm", Arc::new(MockUnit::new("crm", &log)));
//! core.register_module("finance", Arc::new(MockUnit::new("finance", &log).fail_initialize("db down")));
//! core.register_service("mailer", Arc::new(MockUnit::new("mailer", &log)));
//!
//! let err = core.start().await.unwrap_err();
//! assert!(matches!(err, CoreError::ModuleInit { ref name, .. } if name == "finance"));
//!
//! // The mailer service never initialized.
//! log.verify(&["initialize:crm", "initialize:finance"]);
//! # }
//! ```

use crate::core::ApplicationCore;
use crate::error::BoxError;
use crate::module::Module;
use crate::schema::SchemaDefinition;
use crate::service::Service;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Ordered record of lifecycle calls, shared between mocks.
///
/// Entries look like `initialize:<name>` and `destroy:<name>`.
#[derive(Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    /// Panics unless the log holds exactly `expected`, in order.
    pub fn verify(&self, expected: &[&str]) {
        let calls = self.calls.lock();
        if *calls != expected {
            panic!("Call log mismatch.\n expected: {expected:?}\n   actual: {calls:?}");
        }
    }
}

/// A module/service double with scripted outcomes.
pub struct MockUnit {
    name: String,
    log: CallLog,
    schemas: Vec<SchemaDefinition>,
    fail_initialize: Option<String>,
    fail_destroy: Option<String>,
}

impl MockUnit {
    pub fn new(name: impl Into<String>, log: &CallLog) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
            schemas: Vec::new(),
            fail_initialize: None,
            fail_destroy: None,
        }
    }

    /// Registers `schema` on the core during `initialize`, like a real module would.
    pub fn with_schema(mut self, schema: SchemaDefinition) -> Self {
        self.schemas.push(schema);
        self
    }

    /// `initialize` records the call and then fails with `message`.
    pub fn fail_initialize(mut self, message: impl Into<String>) -> Self {
        self.fail_initialize = Some(message.into());
        self
    }

    /// `destroy` records the call and then fails with `message`.
    pub fn fail_destroy(mut self, message: impl Into<String>) -> Self {
        self.fail_destroy = Some(message.into());
        self
    }

    async fn on_initialize(&self, core: &ApplicationCore) -> Result<(), BoxError> {
        self.log.record(format!("initialize:{}", self.name));
        if let Some(message) = &self.fail_initialize {
            return Err(message.clone().into());
        }
        for schema in &self.schemas {
            core.register_schema(schema.name(), schema.clone());
        }
        Ok(())
    }

    async fn on_destroy(&self) -> Result<(), BoxError> {
        self.log.record(format!("destroy:{}", self.name));
        match &self.fail_destroy {
            Some(message) => Err(message.clone().into()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Module for MockUnit {
    async fn initialize(&self, core: &ApplicationCore) -> Result<(), BoxError> {
        self.on_initialize(core).await
    }

    async fn destroy(&self) -> Result<(), BoxError> {
        self.on_destroy().await
    }
}

#[async_trait]
impl Service for MockUnit {
    async fn initialize(&self, core: &ApplicationCore) -> Result<(), BoxError> {
        self.on_initialize(core).await
    }

    async fn destroy(&self) -> Result<(), BoxError> {
        self.on_destroy().await
    }
}
