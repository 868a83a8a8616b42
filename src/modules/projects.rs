use super::{publish, set_field};
use app_core::{
    ApplicationCore, BoxError, FieldSpec, Module, SchemaDefinition, SchemaHooks, WorkflowEngine,
};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

pub const PROJECT_STATUSES: &[&str] = &["active", "completed", "cancelled"];

/// Stamps `created_at`/`updated_at` and announces status changes.
struct ProjectHooks {
    workflow: Arc<WorkflowEngine>,
}

#[async_trait]
impl SchemaHooks for ProjectHooks {
    async fn before_create(&self, mut record: Value) -> Result<Value, BoxError> {
        let now = json!(Utc::now().to_rfc3339());
        set_field(&mut record, "created_at", now.clone());
        set_field(&mut record, "updated_at", now);
        Ok(record)
    }

    async fn before_update(&self, mut record: Value) -> Result<Value, BoxError> {
        set_field(&mut record, "updated_at", json!(Utc::now().to_rfc3339()));
        Ok(record)
    }

    async fn after_update(&self, record: &Value) -> Result<(), BoxError> {
        if record.get("status").is_some_and(|s| !s.is_null()) {
            publish(&self.workflow, "project:status_changed", record).await;
        }
        Ok(())
    }
}

pub fn projects_schema(workflow: Arc<WorkflowEngine>) -> SchemaDefinition {
    SchemaDefinition::new("projects")
        .field("company_name", FieldSpec::string().required())
        .field("vat_number", FieldSpec::string())
        .field("contact_name", FieldSpec::string().required())
        .field("contact_phone", FieldSpec::string())
        .field("contact_email", FieldSpec::string())
        .field("project_date", FieldSpec::date().required())
        .field("responsible_person", FieldSpec::string().required())
        .field(
            "status",
            FieldSpec::string()
                .default_value("active")
                .one_of(PROJECT_STATUSES),
        )
        .field("description", FieldSpec::string())
        .hooks(Arc::new(ProjectHooks { workflow }))
}

pub struct ProjectsModule {
    workflow: Arc<WorkflowEngine>,
}

impl ProjectsModule {
    pub fn new(workflow: Arc<WorkflowEngine>) -> Self {
        Self { workflow }
    }
}

#[async_trait]
impl Module for ProjectsModule {
    async fn initialize(&self, core: &ApplicationCore) -> Result<(), BoxError> {
        core.register_schema("projects", projects_schema(self.workflow.clone()));
        info!(module = "projects", "Projects module loaded");
        Ok(())
    }

    async fn destroy(&self) -> Result<(), BoxError> {
        info!(module = "projects", "Projects module unloaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_core::{SchemaRegistry, WorkflowTrigger};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn project() -> Value {
        json!({
            "company_name": "Acme",
            "contact_name": "Wile",
            "project_date": "2024-03-01",
            "responsible_person": "Road Runner"
        })
    }

    #[tokio::test]
    async fn create_stamps_timestamps_and_defaults_status() {
        let registry = SchemaRegistry::new();
        registry.register("projects", projects_schema(Arc::new(WorkflowEngine::new())));

        let record = registry.prepare_create("projects", project()).await.unwrap();
        assert_eq!(record["status"], "active");
        assert!(record["created_at"].is_string());
        assert_eq!(record["created_at"], record["updated_at"]);
    }

    #[tokio::test]
    async fn missing_required_fields_are_reported_in_order() {
        let schema = projects_schema(Arc::new(WorkflowEngine::new()));
        let result = schema.validate(&json!({ "company_name": "Acme", "project_date": "soon" }));
        assert_eq!(
            result.errors,
            vec![
                "contact_name is required",
                "project_date has wrong type, expected date",
                "responsible_person is required"
            ]
        );
    }

    #[tokio::test]
    async fn status_update_is_announced() {
        let workflow = Arc::new(WorkflowEngine::new());
        let announced = Arc::new(AtomicUsize::new(0));
        let counter = announced.clone();
        workflow.register_trigger(WorkflowTrigger::new("project:status_changed", move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<(), BoxError>(())
            }
        }));

        let registry = SchemaRegistry::new();
        registry.register("projects", projects_schema(workflow));

        let update = registry
            .prepare_update("projects", json!({ "status": "completed" }))
            .await
            .unwrap();
        assert!(update["updated_at"].is_string());
        registry.complete_update("projects", &update).await.unwrap();

        let rename = registry
            .prepare_update("projects", json!({ "description": "phase 2" }))
            .await
            .unwrap();
        registry.complete_update("projects", &rename).await.unwrap();

        assert_eq!(announced.load(Ordering::SeqCst), 1);
    }
}
