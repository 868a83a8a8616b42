//! Built-in workflow triggers installed when the workflow service starts.
//!
//! | event                    | guard                                  | action              |
//! |--------------------------|----------------------------------------|---------------------|
//! | `lead:updated`           | -                                      | rescore notice      |
//! | `lead:created`           | `lead_score >= high_value_lead_score`  | auto-assign notice  |
//! | `installment:due`        | -                                      | collection reminder |
//! | `project:status_changed` | -                                      | status notice       |
//! | `expense:created`        | `amount > large_expense_amount`        | approval request    |
//!
//! Actions only log; delivery to chat or mail is outside this crate.

use crate::config::WorkflowConfig;
use app_core::{BoxError, WorkflowTrigger};
use serde_json::Value;
use tracing::info;

/// Renders a payload field for logs, without JSON quoting for strings.
fn text(payload: &Value, key: &str) -> String {
    match payload.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "-".to_string(),
        Some(other) => other.to_string(),
    }
}

fn number(payload: &Value, key: &str) -> Option<f64> {
    payload.get(key).and_then(Value::as_f64)
}

pub fn default_workflows(config: &WorkflowConfig) -> Vec<WorkflowTrigger> {
    let lead_threshold = config.high_value_lead_score;
    let expense_threshold = config.large_expense_amount;

    vec![
        WorkflowTrigger::new("lead:updated", |lead: Value| async move {
            info!(lead = %text(&lead, "id"), "Rescoring lead");
            Ok::<(), BoxError>(())
        }),
        WorkflowTrigger::new("lead:created", |lead: Value| async move {
            info!(
                lead = %text(&lead, "name"),
                score = %text(&lead, "lead_score"),
                "High-value lead auto-assigned"
            );
            Ok::<(), BoxError>(())
        })
        .when(move |lead| number(lead, "lead_score").is_some_and(|s| s >= lead_threshold)),
        WorkflowTrigger::new("installment:due", |installment: Value| async move {
            info!(amount = %text(&installment, "amount"), "Collection reminder sent");
            Ok::<(), BoxError>(())
        }),
        WorkflowTrigger::new("project:status_changed", |project: Value| async move {
            info!(
                project = %text(&project, "company_name"),
                status = %text(&project, "status"),
                "Project status changed"
            );
            Ok::<(), BoxError>(())
        }),
        WorkflowTrigger::new("expense:created", |expense: Value| async move {
            info!(amount = %text(&expense, "amount"), "Large expense needs approval");
            Ok::<(), BoxError>(())
        })
        .when(move |expense| number(expense, "amount").is_some_and(|a| a > expense_threshold)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_core::{Service, WorkflowEngine};
    use serde_json::json;

    async fn started_engine(config: &WorkflowConfig) -> WorkflowEngine {
        let engine = WorkflowEngine::with_builtin(default_workflows(config));
        let core = app_core::ApplicationCore::new();
        Service::initialize(&engine, &core).await.unwrap();
        engine
    }

    #[tokio::test]
    async fn builtins_cover_every_event() {
        let engine = started_engine(&WorkflowConfig::default()).await;
        assert_eq!(
            engine.events(),
            vec![
                "expense:created",
                "installment:due",
                "lead:created",
                "lead:updated",
                "project:status_changed"
            ]
        );
    }

    #[tokio::test]
    async fn lead_guard_uses_configured_score() {
        let engine = started_engine(&WorkflowConfig::default()).await;
        let low = engine.trigger("lead:created", json!({ "name": "a", "lead_score": 79 })).await;
        assert_eq!((low.fired, low.skipped), (0, 1));
        let high = engine.trigger("lead:created", json!({ "name": "b", "lead_score": 80 })).await;
        assert_eq!((high.fired, high.skipped), (1, 0));

        let strict = started_engine(&WorkflowConfig {
            high_value_lead_score: 95.0,
            ..WorkflowConfig::default()
        })
        .await;
        let summary = strict.trigger("lead:created", json!({ "lead_score": 90 })).await;
        assert_eq!(summary.skipped, 1);
    }

    #[tokio::test]
    async fn expense_guard_is_strictly_greater() {
        let engine = started_engine(&WorkflowConfig::default()).await;
        let at = engine.trigger("expense:created", json!({ "amount": 50_000 })).await;
        assert_eq!(at.skipped, 1);
        let above = engine.trigger("expense:created", json!({ "amount": 50_001 })).await;
        assert_eq!(above.fired, 1);
        let missing = engine.trigger("expense:created", json!({})).await;
        assert_eq!(missing.skipped, 1);
    }

    #[test]
    fn text_renders_without_quotes() {
        let payload = json!({ "name": "Ada", "score": 3, "gone": null });
        assert_eq!(text(&payload, "name"), "Ada");
        assert_eq!(text(&payload, "score"), "3");
        assert_eq!(text(&payload, "gone"), "-");
        assert_eq!(text(&payload, "missing"), "-");
    }
}
