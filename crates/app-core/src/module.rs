//! # Modules
//!
//! A [`Module`] is a bounded business capability (projects, CRM, finance, ...) plugged
//! into the [`ApplicationCore`]. It owns zero or more schema registrations and, in the
//! host application, the route bindings that expose them.
//!
//! ## Context Injection
//!
//! Modules are constructed without a reference to the core. The core is handed to
//! [`Module::initialize`] instead, which is where a module registers its schemas. This
//! keeps ownership one-directional: the core owns its modules, modules only borrow the
//! core while they start.
//!
//! ## Lifecycle Policy
//!
//! - **initialize**: sequential, in registration order, **fail-fast**. The first failing
//!   module aborts startup; modules registered after it are never initialized, and the
//!   ones before it are not rolled back.
//! - **destroy**: sequential, in registration order, **best-effort**. A failing module is
//!   logged and the remaining modules are still destroyed. Only modules whose `initialize`
//!   succeeded are destroyed, and each of them at most once.

use crate::core::ApplicationCore;
use crate::error::{BoxError, CoreError};
use crate::registry::Registry;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{error, info};

/// A pluggable business-capability unit.
///
/// # Provided Methods
/// [`Module::destroy`] defaults to doing nothing. Only implement it when the module
/// holds resources that need releasing.
#[async_trait]
pub trait Module: Send + Sync {
    /// Called once during [`ApplicationCore::start`], before the system serves traffic.
    async fn initialize(&self, core: &ApplicationCore) -> Result<(), BoxError>;

    /// Called once during shutdown.
    async fn destroy(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Name-keyed, registration-ordered store of modules.
pub struct ModuleRegistry {
    modules: Registry<Arc<dyn Module>>,
    initialized: Mutex<Vec<(String, Arc<dyn Module>)>>,
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self {
            modules: Registry::new("module"),
            initialized: Mutex::new(Vec::new()),
        }
    }

    /// Stores `module` under `name`, replacing any earlier module of that name.
    pub fn register(&self, name: impl Into<String>, module: Arc<dyn Module>) -> bool {
        self.modules.register(name, module)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Module>> {
        self.modules.get(name)
    }

    /// Registered module names, in registration order.
    pub fn list(&self) -> Vec<String> {
        self.modules.list()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Initializes every module in registration order, stopping at the first failure.
    ///
    /// Modules registered while this runs are not picked up.
    pub async fn initialize(&self, core: &ApplicationCore) -> Result<(), CoreError> {
        for (name, module) in self.modules.snapshot() {
            if let Err(source) = module.initialize(core).await {
                error!(module = %name, error = %source, "Module initialization failed");
                return Err(CoreError::ModuleInit { name, source });
            }
            info!(module = %name, "Module initialized");
            self.initialized.lock().push((name, module));
        }
        Ok(())
    }

    /// Destroys every initialized module in registration order.
    ///
    /// Returns the names of the modules whose `destroy` failed. A second call finds
    /// nothing left to destroy.
    pub async fn destroy(&self) -> Vec<String> {
        let initialized = std::mem::take(&mut *self.initialized.lock());
        let mut failed = Vec::new();
        for (name, module) in initialized {
            match module.destroy().await {
                Ok(()) => info!(module = %name, "Module destroyed"),
                Err(e) => {
                    error!(module = %name, error = %e, "Module destroy failed");
                    failed.push(name);
                }
            }
        }
        failed
    }
}
