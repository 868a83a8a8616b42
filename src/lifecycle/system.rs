use crate::config::BackofficeConfig;
use crate::error::BackofficeError;
use crate::modules::{CrmModule, FinanceModule, ProjectsModule};
use crate::workflows::default_workflows;
use app_core::{ApplicationCore, ShutdownReport, WorkflowEngine};
use std::sync::Arc;
use tracing::{info, warn};

/// The runtime orchestrator for the back office.
///
/// `BackofficeSystem` is responsible for:
/// - **Wiring**: building the workflow engine and handing it to the modules that publish events
/// - **Registration**: workflow service first, then the `projects`, `crm` and `finance` modules
/// - **Lifecycle**: booting the core and shutting it down again
///
/// The system keeps its own handle on the [`WorkflowEngine`] so callers can dispatch events
/// without looking the service up by name.
///
/// # Example
///
/// ```ignore
/// let system = BackofficeSystem::new(BackofficeConfig::load()?);
/// system.start().await?;
///
/// let lead = system.core().schemas().prepare_create("leads", payload).await?;
/// // ... persist ...
/// system.core().schemas().complete_create("leads", &lead).await?;
///
/// system.shutdown().await?;
/// ```
pub struct BackofficeSystem {
    core: ApplicationCore,
    workflow: Arc<WorkflowEngine>,
    config: BackofficeConfig,
}

impl BackofficeSystem {
    /// Registers every unit. Nothing is initialized until [`BackofficeSystem::start`].
    pub fn new(config: BackofficeConfig) -> Self {
        let workflow = Arc::new(WorkflowEngine::with_builtin(default_workflows(
            &config.workflow,
        )));
        let core = ApplicationCore::new();

        core.register_service("workflow", workflow.clone());
        core.register_module("projects", Arc::new(ProjectsModule::new(workflow.clone())));
        core.register_module("crm", Arc::new(CrmModule::new(workflow.clone())));
        core.register_module(
            "finance",
            Arc::new(FinanceModule::new(workflow.clone(), config.finance.clone())),
        );

        Self {
            core,
            workflow,
            config,
        }
    }

    /// Boots the core: modules, then schemas, then services.
    pub async fn start(&self) -> Result<(), BackofficeError> {
        self.core.start().await?;
        info!(
            modules = ?self.core.modules().list(),
            schemas = ?self.core.schemas().list(),
            "Back office ready"
        );
        Ok(())
    }

    /// Gracefully shuts the system down.
    ///
    /// Destroy failures do not abort shutdown; they are logged and returned in the report.
    pub async fn shutdown(self) -> Result<ShutdownReport, BackofficeError> {
        info!("Shutting down back office...");
        let report = self.core.shutdown().await?;
        if !report.is_clean() {
            warn!(
                services = ?report.failed_services,
                modules = ?report.failed_modules,
                "Some units failed to shut down cleanly"
            );
        }
        info!("Back office shutdown complete.");
        Ok(report)
    }

    pub fn core(&self) -> &ApplicationCore {
        &self.core
    }

    pub fn workflow(&self) -> &Arc<WorkflowEngine> {
        &self.workflow
    }

    pub fn config(&self) -> &BackofficeConfig {
        &self.config
    }
}
