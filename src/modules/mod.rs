//! # Back-office Modules
//!
//! Each module owns the schemas of one business area and registers them on the core
//! while it initializes:
//!
//! | module     | schemas                | publishes                                   |
//! |------------|------------------------|---------------------------------------------|
//! | `projects` | `projects`             | `project:status_changed`                    |
//! | `crm`      | `leads`, `contacts`    | `lead:created`, `lead:updated`              |
//! | `finance`  | `revenues`, `expenses` | `expense:created`                           |
//!
//! Modules receive the workflow engine at construction; the core itself is only injected
//! into `initialize`.

pub mod crm;
pub mod finance;
pub mod projects;

pub use crm::CrmModule;
pub use finance::FinanceModule;
pub use projects::ProjectsModule;

use app_core::WorkflowEngine;
use serde_json::Value;
use tracing::debug;

/// Dispatches `event` with `record` as payload. Dispatch never fails.
pub(crate) async fn publish(workflow: &WorkflowEngine, event: &str, record: &Value) {
    let summary = workflow.trigger(event, record.clone()).await;
    debug!(
        event,
        fired = summary.fired,
        skipped = summary.skipped,
        failed = summary.failed,
        "Event published"
    );
}

/// Sets `key` on an object record. Non-object records are left alone; validation
/// rejects them later.
pub(crate) fn set_field(record: &mut Value, key: &str, value: Value) {
    if let Some(fields) = record.as_object_mut() {
        fields.insert(key.to_string(), value);
    }
}

/// Whether `record[key]` holds something other than null, `false`, `0` or `""`.
pub(crate) fn is_filled(record: &Value, key: &str) -> bool {
    match record.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}
