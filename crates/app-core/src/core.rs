//! # Application Core
//!
//! [`ApplicationCore`] composes the module, schema and service registries, the
//! lifecycle [`Notifier`] and the boot sequence.
//!
//! ## Boot Sequence
//!
//! [`ApplicationCore::start`] runs three phases, each fully awaited before the next:
//!
//! 1. **Modules** initialize in registration order. This is where they register their
//!    schemas, so schemas only exist after this phase.
//! 2. **Schemas** are enumerated and checked for dangling relations.
//! 3. **Services** initialize in registration order.
//!
//! `app:started` is emitted last. If a module fails, phases 2 and 3 never run and
//! `start` returns the failure; the host must not serve traffic.
//!
//! ## Shutdown
//!
//! [`ApplicationCore::shutdown`] runs once, from `Started` or `Failed`. It destroys only
//! the units that initialized, so a core that failed halfway can still release what it
//! acquired. Overlapping calls are refused while the first one is running.
//!
//! ## Late Registration
//!
//! Registering after `start` has begun is allowed but nothing already initialized will
//! notice: a module registered late is never initialized.

use crate::error::CoreError;
use crate::events::{CoreEvent, EventKind, Notifier};
use crate::module::{Module, ModuleRegistry};
use crate::schema::{SchemaDefinition, SchemaRegistry, ValidationResult};
use crate::service::{Service, ServiceRegistry};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, info_span, Instrument};

/// Where the core is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreState {
    Constructed,
    Starting,
    Started,
    /// A module or service failed to initialize. The core cannot be started again.
    Failed,
    Stopping,
    Stopped,
}

/// Marks an interrupted boot as failed: a panicking unit or a dropped `start` future
/// must not leave the core in `Starting`.
struct BootGuard<'a> {
    state: &'a Mutex<CoreState>,
}

impl Drop for BootGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if *state == CoreState::Starting {
            *state = CoreState::Failed;
        }
    }
}

/// Units whose `destroy` failed during [`ApplicationCore::shutdown`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    pub failed_services: Vec<String>,
    pub failed_modules: Vec<String>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.failed_services.is_empty() && self.failed_modules.is_empty()
    }
}

pub struct ApplicationCore {
    modules: ModuleRegistry,
    schemas: SchemaRegistry,
    services: ServiceRegistry,
    notifier: Notifier,
    state: Mutex<CoreState>,
}

impl Default for ApplicationCore {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationCore {
    pub fn new() -> Self {
        Self {
            modules: ModuleRegistry::new(),
            schemas: SchemaRegistry::new(),
            services: ServiceRegistry::new(),
            notifier: Notifier::new(),
            state: Mutex::new(CoreState::Constructed),
        }
    }

    /// Subscribes `listener` to one kind of lifecycle notification.
    pub fn on(&self, kind: EventKind, listener: impl Fn(&CoreEvent) + Send + Sync + 'static) {
        self.notifier.subscribe(kind, listener);
    }

    pub fn register_module(&self, name: impl Into<String>, module: Arc<dyn Module>) {
        let name = name.into();
        self.modules.register(name.clone(), module.clone());
        self.notifier.emit(&CoreEvent::ModuleRegistered { name, module });
    }

    pub fn register_schema(
        &self,
        name: impl Into<String>,
        schema: impl Into<Arc<SchemaDefinition>>,
    ) {
        let name = name.into();
        let schema = schema.into();
        self.schemas.register(name.clone(), schema.clone());
        self.notifier.emit(&CoreEvent::SchemaRegistered { name, schema });
    }

    pub fn register_service(&self, name: impl Into<String>, service: Arc<dyn Service>) {
        let name = name.into();
        self.services.register(name.clone(), service.clone());
        self.notifier.emit(&CoreEvent::ServiceRegistered { name, service });
    }

    /// Runs the boot sequence once.
    ///
    /// # Errors
    /// - [`CoreError::AlreadyStarted`] if `start` was called before, successfully or not.
    /// - [`CoreError::ModuleInit`] / [`CoreError::ServiceInit`] for the first unit that
    ///   failed; units after it were not initialized.
    pub async fn start(&self) -> Result<(), CoreError> {
        {
            let mut state = self.state.lock();
            if *state != CoreState::Constructed {
                return Err(CoreError::AlreadyStarted);
            }
            *state = CoreState::Starting;
        }
        let _guard = BootGuard { state: &self.state };

        let result = self.boot().instrument(info_span!("core_start")).await;
        *self.state.lock() = match result {
            Ok(()) => CoreState::Started,
            Err(_) => CoreState::Failed,
        };
        result?;

        info!(
            modules = self.modules.len(),
            schemas = self.schemas.len(),
            services = self.services.len(),
            "Application started"
        );
        self.notifier.emit(&CoreEvent::AppStarted);
        Ok(())
    }

    async fn boot(&self) -> Result<(), CoreError> {
        self.modules.initialize(self).await?;
        self.schemas.initialize();
        self.services.initialize(self).await
    }

    /// Destroys services, then modules, both best-effort, and emits `app:stopped`.
    ///
    /// Destroy failures are logged and collected into the report; they do not stop the
    /// remaining units from being destroyed.
    ///
    /// # Errors
    /// [`CoreError::NotStarted`] unless the core is `Started` or `Failed`. This includes
    /// a shutdown that is already in progress.
    pub async fn shutdown(&self) -> Result<ShutdownReport, CoreError> {
        {
            let mut state = self.state.lock();
            if !matches!(*state, CoreState::Started | CoreState::Failed) {
                return Err(CoreError::NotStarted);
            }
            *state = CoreState::Stopping;
        }

        let report = async {
            ShutdownReport {
                failed_services: self.services.destroy().await,
                failed_modules: self.modules.destroy().await,
            }
        }
        .instrument(info_span!("core_shutdown"))
        .await;

        *self.state.lock() = CoreState::Stopped;
        info!(clean = report.is_clean(), "Application stopped");
        self.notifier.emit(&CoreEvent::AppStopped);
        Ok(report)
    }

    pub fn state(&self) -> CoreState {
        *self.state.lock()
    }

    pub fn get_module(&self, name: &str) -> Option<Arc<dyn Module>> {
        self.modules.get(name)
    }

    pub fn get_service(&self, name: &str) -> Option<Arc<dyn Service>> {
        self.services.get(name)
    }

    pub fn get_schema(&self, name: &str) -> Option<Arc<SchemaDefinition>> {
        self.schemas.get(name)
    }

    pub fn validate(&self, schema_name: &str, payload: &Value) -> ValidationResult {
        self.schemas.validate(schema_name, payload)
    }

    pub fn modules(&self) -> &ModuleRegistry {
        &self.modules
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::schema::FieldSpec;
    use async_trait::async_trait;
    use parking_lot::Mutex as PlMutex;

    struct SchemaModule {
        schema: &'static str,
    }

    #[async_trait]
    impl Module for SchemaModule {
        async fn initialize(&self, core: &ApplicationCore) -> Result<(), BoxError> {
            core.register_schema(
                self.schema,
                SchemaDefinition::new(self.schema).field("name", FieldSpec::string().required()),
            );
            Ok(())
        }
    }

    #[tokio::test]
    async fn schemas_exist_after_modules_initialize() {
        let core = ApplicationCore::new();
        core.register_module("crm", Arc::new(SchemaModule { schema: "leads" }));
        assert!(core.get_schema("leads").is_none());

        core.start().await.unwrap();
        assert_eq!(core.state(), CoreState::Started);
        assert_eq!(core.schemas().list(), vec!["leads"]);
        assert!(core.validate("leads", &serde_json::json!({ "name": "x" })).valid);
    }

    #[tokio::test]
    async fn notifications_carry_name_and_follow_boot() {
        let core = ApplicationCore::new();
        let seen = Arc::new(PlMutex::new(Vec::new()));
        for kind in [
            EventKind::ModuleRegistered,
            EventKind::SchemaRegistered,
            EventKind::AppStarted,
            EventKind::AppStopped,
        ] {
            let seen = seen.clone();
            core.on(kind, move |event| {
                let label = match event.name() {
                    Some(name) => format!("{}:{name}", event.kind()),
                    None => event.kind().to_string(),
                };
                seen.lock().push(label);
            });
        }

        core.register_module("crm", Arc::new(SchemaModule { schema: "leads" }));
        core.start().await.unwrap();
        core.shutdown().await.unwrap();

        assert_eq!(
            *seen.lock(),
            vec![
                "module:registered:crm",
                "schema:registered:leads",
                "app:started",
                "app:stopped"
            ]
        );
    }

    #[tokio::test]
    async fn start_twice_is_rejected() {
        let core = ApplicationCore::new();
        core.start().await.unwrap();
        assert!(matches!(core.start().await, Err(CoreError::AlreadyStarted)));
    }

    #[tokio::test]
    async fn shutdown_requires_started_core() {
        let core = ApplicationCore::new();
        assert!(matches!(core.shutdown().await, Err(CoreError::NotStarted)));
    }

    #[tokio::test]
    async fn shutdown_runs_once() {
        let core = ApplicationCore::new();
        core.start().await.unwrap();
        core.shutdown().await.unwrap();
        assert_eq!(core.state(), CoreState::Stopped);
        assert!(matches!(core.shutdown().await, Err(CoreError::NotStarted)));
    }

    struct PanickingModule;

    #[async_trait]
    impl Module for PanickingModule {
        async fn initialize(&self, _core: &ApplicationCore) -> Result<(), BoxError> {
            panic!("module blew up");
        }
    }

    #[tokio::test]
    async fn panicking_module_leaves_core_failed() {
        let core = Arc::new(ApplicationCore::new());
        core.register_module("broken", Arc::new(PanickingModule));

        let booting = core.clone();
        let joined = tokio::spawn(async move { booting.start().await }).await;
        assert!(joined.is_err_and(|e| e.is_panic()));

        assert_eq!(core.state(), CoreState::Failed);
        assert!(core.shutdown().await.unwrap().is_clean());
        assert_eq!(core.state(), CoreState::Stopped);
    }

    #[test]
    fn lookups_of_unknown_names_are_none() {
        let core = ApplicationCore::new();
        assert!(core.get_module("nonexistent").is_none());
        assert!(core.get_service("nonexistent").is_none());
        assert!(core.get_schema("nonexistent").is_none());
        let result = core.validate("nonexistent", &serde_json::json!({}));
        assert_eq!(result.errors, vec!["schema nonexistent does not exist"]);
    }
}
