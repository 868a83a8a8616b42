//! Leads and contacts.
//!
//! New leads are scored before they are stored. The score rewards complete contact data
//! and the acquisition channel:
//!
//! | signal        | points |
//! |---------------|--------|
//! | name          | 10     |
//! | company       | 15     |
//! | phone         | 10     |
//! | email         | 15     |
//! | source 推薦   | 30     |
//! | source 展會   | 25     |
//! | source 官網   | 20     |
//! | source 廣告   | 15     |
//! | source 其他   | 5      |
//!
//! capped at [`MAX_LEAD_SCORE`].

use super::{is_filled, publish, set_field};
use app_core::{
    ApplicationCore, BoxError, Cardinality, FieldSpec, Module, SchemaDefinition, SchemaHooks,
    WorkflowEngine,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

pub const LEAD_STATUSES: &[&str] = &["new", "contacted", "qualified", "lost"];
pub const CONTACT_STATUSES: &[&str] = &["active", "inactive"];
pub const MAX_LEAD_SCORE: u32 = 100;

const FIELD_POINTS: &[(&str, u32)] = &[("name", 10), ("company", 15), ("phone", 10), ("email", 15)];

fn source_bonus(source: &str) -> u32 {
    match source {
        "推薦" => 30,
        "官網" => 20,
        "廣告" => 15,
        "展會" => 25,
        "其他" => 5,
        _ => 0,
    }
}

/// Scores a lead from the data it carries.
pub fn lead_score(lead: &Value) -> u32 {
    let completeness: u32 = FIELD_POINTS
        .iter()
        .filter(|(field, _)| is_filled(lead, field))
        .map(|(_, points)| points)
        .sum();
    let bonus = lead
        .get("source")
        .and_then(Value::as_str)
        .map_or(0, source_bonus);
    (completeness + bonus).min(MAX_LEAD_SCORE)
}

struct LeadHooks {
    workflow: Arc<WorkflowEngine>,
}

#[async_trait]
impl SchemaHooks for LeadHooks {
    async fn before_create(&self, mut record: Value) -> Result<Value, BoxError> {
        let score = lead_score(&record);
        debug!(score, "Lead scored");
        set_field(&mut record, "lead_score", json!(score));
        Ok(record)
    }

    async fn after_create(&self, record: &Value) -> Result<(), BoxError> {
        publish(&self.workflow, "lead:created", record).await;
        Ok(())
    }

    async fn after_update(&self, record: &Value) -> Result<(), BoxError> {
        publish(&self.workflow, "lead:updated", record).await;
        Ok(())
    }
}

pub fn leads_schema(workflow: Arc<WorkflowEngine>) -> SchemaDefinition {
    SchemaDefinition::new("leads")
        .field("name", FieldSpec::string().required())
        .field("company", FieldSpec::string())
        .field("phone", FieldSpec::string())
        .field("email", FieldSpec::string())
        .field("source", FieldSpec::string())
        .field(
            "status",
            FieldSpec::string().default_value("new").one_of(LEAD_STATUSES),
        )
        .field("lead_score", FieldSpec::number().default_value(0))
        .field("tags", FieldSpec::json())
        .field("custom_fields", FieldSpec::json())
        .field("assigned_to", FieldSpec::string())
        .hooks(Arc::new(LeadHooks { workflow }))
}

pub fn contacts_schema() -> SchemaDefinition {
    SchemaDefinition::new("contacts")
        .field("name", FieldSpec::string().required())
        .field("company", FieldSpec::string())
        .field("position", FieldSpec::string())
        .field("phone", FieldSpec::string())
        .field("email", FieldSpec::string())
        .field("lead_id", FieldSpec::relation("leads", Cardinality::BelongsTo))
        .field(
            "customer_id",
            FieldSpec::relation("customers", Cardinality::BelongsTo),
        )
        .field("tags", FieldSpec::json())
        .field("custom_fields", FieldSpec::json())
        .field(
            "status",
            FieldSpec::string()
                .default_value("active")
                .one_of(CONTACT_STATUSES),
        )
}

pub struct CrmModule {
    workflow: Arc<WorkflowEngine>,
}

impl CrmModule {
    pub fn new(workflow: Arc<WorkflowEngine>) -> Self {
        Self { workflow }
    }
}

#[async_trait]
impl Module for CrmModule {
    async fn initialize(&self, core: &ApplicationCore) -> Result<(), BoxError> {
        core.register_schema("leads", leads_schema(self.workflow.clone()));
        core.register_schema("contacts", contacts_schema());
        info!(module = "crm", "CRM module loaded");
        Ok(())
    }

    async fn destroy(&self) -> Result<(), BoxError> {
        info!(module = "crm", "CRM module unloaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_core::{SchemaRegistry, WorkflowTrigger};
    use parking_lot::Mutex;

    #[test]
    fn score_counts_filled_fields_and_source() {
        assert_eq!(lead_score(&json!({ "name": "Ada" })), 10);
        assert_eq!(
            lead_score(&json!({ "name": "Ada", "company": "", "email": "ada@example.com" })),
            25
        );
        assert_eq!(lead_score(&json!({ "name": "Ada", "source": "官網" })), 30);
        assert_eq!(lead_score(&json!({ "name": "Ada", "source": "billboard" })), 10);
    }

    #[test]
    fn complete_referred_lead_scores_highest() {
        let lead = json!({
            "name": "Ada",
            "company": "Analytical Engines",
            "phone": "0900-000-000",
            "email": "ada@example.com",
            "source": "推薦"
        });
        assert_eq!(lead_score(&lead), 80);
        assert!(lead_score(&lead) <= MAX_LEAD_SCORE);
    }

    #[test]
    fn contacts_reference_leads_and_customers() {
        let relations: Vec<_> = contacts_schema()
            .relations()
            .map(|(field, target)| (field.to_string(), target.to_string()))
            .collect();
        assert_eq!(
            relations,
            vec![
                ("lead_id".to_string(), "leads".to_string()),
                ("customer_id".to_string(), "customers".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn created_lead_is_scored_and_published() {
        let workflow = Arc::new(WorkflowEngine::new());
        let published = Arc::new(Mutex::new(Vec::new()));
        for event in ["lead:created", "lead:updated"] {
            let published = published.clone();
            workflow.register_trigger(WorkflowTrigger::new(event, move |lead: Value| {
                let published = published.clone();
                async move {
                    published.lock().push((event, lead["lead_score"].clone()));
                    Ok::<(), BoxError>(())
                }
            }));
        }

        let registry = SchemaRegistry::new();
        registry.register("leads", leads_schema(workflow));

        let lead = registry
            .prepare_create(
                "leads",
                json!({ "name": "Ada", "company": "AE", "lead_score": 99 }),
            )
            .await
            .unwrap();
        assert_eq!(lead["lead_score"], 25);
        assert_eq!(lead["status"], "new");
        registry.complete_create("leads", &lead).await.unwrap();
        registry.complete_update("leads", &lead).await.unwrap();

        assert_eq!(
            *published.lock(),
            vec![("lead:created", json!(25)), ("lead:updated", json!(25))]
        );
    }
}
