//! # Services
//!
//! A [`Service`] is singleton, cross-module infrastructure (the workflow engine, a
//! notifier, ...). It has the same lifecycle contract as a [`Module`](crate::Module)
//! but lives in its own namespace and starts in a later boot phase: services are
//! initialized strictly after every module, so a service can rely on module schemas
//! being registered.
//!
//! Among themselves, services start in registration order. A service should not rely on
//! another service having started unless the host registers them in that order.

use crate::core::ApplicationCore;
use crate::error::{BoxError, CoreError};
use crate::registry::Registry;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{error, info};

/// A pluggable cross-cutting infrastructure unit.
#[async_trait]
pub trait Service: Send + Sync {
    async fn initialize(&self, core: &ApplicationCore) -> Result<(), BoxError>;

    async fn destroy(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Name-keyed, registration-ordered store of services.
pub struct ServiceRegistry {
    services: Registry<Arc<dyn Service>>,
    initialized: Mutex<Vec<(String, Arc<dyn Service>)>>,
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self {
            services: Registry::new("service"),
            initialized: Mutex::new(Vec::new()),
        }
    }

    pub fn register(&self, name: impl Into<String>, service: Arc<dyn Service>) -> bool {
        self.services.register(name, service)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Service>> {
        self.services.get(name)
    }

    pub fn list(&self) -> Vec<String> {
        self.services.list()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Fail-fast, in registration order.
    pub async fn initialize(&self, core: &ApplicationCore) -> Result<(), CoreError> {
        for (name, service) in self.services.snapshot() {
            if let Err(source) = service.initialize(core).await {
                error!(service = %name, error = %source, "Service initialization failed");
                return Err(CoreError::ServiceInit { name, source });
            }
            info!(service = %name, "Service initialized");
            self.initialized.lock().push((name, service));
        }
        Ok(())
    }

    /// Best-effort, in registration order, over the services that initialized.
    /// Returns the names that failed.
    pub async fn destroy(&self) -> Vec<String> {
        let initialized = std::mem::take(&mut *self.initialized.lock());
        let mut failed = Vec::new();
        for (name, service) in initialized {
            match service.destroy().await {
                Ok(()) => info!(service = %name, "Service destroyed"),
                Err(e) => {
                    error!(service = %name, error = %e, "Service destroy failed");
                    failed.push(name);
                }
            }
        }
        failed
    }
}
