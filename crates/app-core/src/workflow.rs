//! # Workflow Engine
//!
//! A named-event trigger table. Modules and services publish domain events
//! (`lead:created`, `expense:created`, ...) and every [`WorkflowTrigger`] registered for
//! that event runs, in registration order, if its guard accepts the payload.
//!
//! ## Fire-and-continue
//!
//! Dispatch isolates triggers from each other. A trigger whose action fails (or whose
//! guard or action panics) is logged with the event name and the next trigger still
//! runs. [`WorkflowEngine::trigger`] itself never fails; it reports what happened in a
//! [`DispatchSummary`].
//!
//! Each trigger runs on its own Tokio task which is awaited before the next one starts,
//! so triggers of one event never overlap. Different events dispatched by unrelated
//! callers have no ordering between them.
//!
//! ```rust
//! use app_core::{WorkflowEngine, WorkflowTrigger};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let engine = WorkflowEngine::new();
//! engine.register_trigger(
//!     WorkflowTrigger::new("lead:created", |lead| async move {
//!         tracing::info!(name = %lead["name"], "Auto-assigning high-value lead");
//!         Ok::<(), app_core::BoxError>(())
//!     })
//!     .when(|lead| lead["lead_score"].as_i64().unwrap_or(0) >= 80),
//! );
//!
//! let summary = engine.trigger("lead:created", json!({ "name": "Ada", "lead_score": 90 })).await;
//! assert_eq!(summary.fired, 1);
//! # }
//! ```

use crate::core::ApplicationCore;
use crate::error::BoxError;
use crate::service::Service;
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info};

pub type Guard = Arc<dyn Fn(&Value) -> bool + Send + Sync>;
pub type Action = Arc<dyn Fn(Value) -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>;

/// An (event, optional guard, action) registration.
#[derive(Clone)]
pub struct WorkflowTrigger {
    event: String,
    guard: Option<Guard>,
    action: Action,
}

impl WorkflowTrigger {
    pub fn new<F, Fut>(event: impl Into<String>, action: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        Self {
            event: event.into(),
            guard: None,
            action: Arc::new(move |payload| action(payload).boxed()),
        }
    }

    /// Only run the action when `guard` returns `true` for the payload.
    pub fn when(mut self, guard: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.guard = Some(Arc::new(guard));
        self
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn has_guard(&self) -> bool {
        self.guard.is_some()
    }

    /// Guard check followed by the action. `Ok(false)` means the guard skipped it.
    async fn run(self, payload: Value) -> Result<bool, BoxError> {
        if let Some(guard) = &self.guard {
            if !guard(&payload) {
                return Ok(false);
            }
        }
        (self.action)(payload).await?;
        Ok(true)
    }
}

impl fmt::Debug for WorkflowTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowTrigger")
            .field("event", &self.event)
            .field("guarded", &self.guard.is_some())
            .finish()
    }
}

/// What a single dispatch did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub fired: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Event name → triggers, in registration order.
///
/// The engine is a [`Service`]: `initialize` installs its built-in triggers and
/// `destroy` clears every trigger.
pub struct WorkflowEngine {
    triggers: RwLock<HashMap<String, Vec<WorkflowTrigger>>>,
    builtin: Vec<WorkflowTrigger>,
}

impl Default for WorkflowEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowEngine {
    /// An engine without built-in triggers.
    pub fn new() -> Self {
        Self::with_builtin(Vec::new())
    }

    /// An engine that installs `builtin` when initialized.
    pub fn with_builtin(builtin: Vec<WorkflowTrigger>) -> Self {
        Self {
            triggers: RwLock::new(HashMap::new()),
            builtin,
        }
    }

    /// Appends `trigger` to its event's sequence.
    pub fn register_trigger(&self, trigger: WorkflowTrigger) {
        debug!(event = %trigger.event, guarded = trigger.has_guard(), "Trigger registered");
        self.triggers
            .write()
            .entry(trigger.event.clone())
            .or_default()
            .push(trigger);
    }

    pub fn trigger_count(&self, event: &str) -> usize {
        self.triggers.read().get(event).map_or(0, Vec::len)
    }

    /// Events with at least one trigger, sorted.
    pub fn events(&self) -> Vec<String> {
        let mut events: Vec<String> = self.triggers.read().keys().cloned().collect();
        events.sort();
        events
    }

    /// Runs every trigger registered for `event`, in order.
    ///
    /// Unknown events are a silent no-op.
    pub async fn trigger(&self, event: &str, payload: Value) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        let triggers = self.triggers.read().get(event).cloned();
        let Some(triggers) = triggers else {
            return summary;
        };

        for trigger in triggers {
            let payload = payload.clone();
            match tokio::spawn(trigger.run(payload)).await {
                Ok(Ok(true)) => {
                    summary.fired += 1;
                    info!(event, "Workflow action completed");
                }
                Ok(Ok(false)) => {
                    summary.skipped += 1;
                    debug!(event, "Workflow guard skipped trigger");
                }
                Ok(Err(e)) => {
                    summary.failed += 1;
                    error!(event, error = %e, "Workflow action failed");
                }
                Err(e) => {
                    summary.failed += 1;
                    error!(event, error = %e, "Workflow action panicked");
                }
            }
        }
        summary
    }

    pub fn clear(&self) {
        self.triggers.write().clear();
    }
}

#[async_trait]
impl Service for WorkflowEngine {
    async fn initialize(&self, _core: &ApplicationCore) -> Result<(), BoxError> {
        for trigger in &self.builtin {
            self.register_trigger(trigger.clone());
        }
        info!(triggers = self.builtin.len(), "Workflow engine started");
        Ok(())
    }

    async fn destroy(&self) -> Result<(), BoxError> {
        self.clear();
        info!("Workflow engine stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    fn recorder(
        log: &Arc<Mutex<Vec<i32>>>,
        tag: i32,
    ) -> impl Fn(Value) -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync + 'static {
        let log = log.clone();
        move |_| {
            let log = log.clone();
            async move {
                log.lock().push(tag);
                Ok::<(), BoxError>(())
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn guard_filters_and_order_is_preserved() {
        let engine = WorkflowEngine::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        engine.register_trigger(WorkflowTrigger::new("lead:created", recorder(&log, 1)));
        engine.register_trigger(
            WorkflowTrigger::new("lead:created", recorder(&log, 2))
                .when(|lead| lead["lead_score"].as_i64().is_some_and(|s| s >= 80)),
        );

        let low = engine.trigger("lead:created", json!({ "lead_score": 50 })).await;
        assert_eq!(*log.lock(), vec![1]);
        assert_eq!(low, DispatchSummary { fired: 1, skipped: 1, failed: 0 });

        log.lock().clear();
        engine.trigger("lead:created", json!({ "lead_score": 90 })).await;
        assert_eq!(*log.lock(), vec![1, 2]);
    }

    #[tokio::test]
    async fn failing_trigger_does_not_block_siblings() {
        let engine = WorkflowEngine::new();
        let ran = Arc::new(Mutex::new(Vec::new()));

        engine.register_trigger(WorkflowTrigger::new("expense:created", |_| async {
            Err::<(), BoxError>("notification endpoint down".into())
        }));
        let sink = ran.clone();
        engine.register_trigger(WorkflowTrigger::new("expense:created", move |_| {
            let sink = sink.clone();
            async move {
                sink.lock().push("ran");
                Ok::<(), BoxError>(())
            }
        }));

        let summary = engine.trigger("expense:created", json!({ "amount": 1 })).await;
        assert_eq!(*ran.lock(), vec!["ran"]);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.fired, 1);
    }

    #[tokio::test]
    async fn panicking_trigger_is_isolated() {
        let engine = WorkflowEngine::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        engine.register_trigger(WorkflowTrigger::new(
            "installment:due",
            |payload: Value| async move {
                if payload.get("amount").is_none() {
                    panic!("installment without amount");
                }
                Ok::<(), BoxError>(())
            },
        ));
        engine.register_trigger(WorkflowTrigger::new("installment:due", recorder(&log, 7)));

        let summary = engine.trigger("installment:due", json!({})).await;
        assert_eq!(*log.lock(), vec![7]);
        assert_eq!(summary.failed, 1);
    }

    #[tokio::test]
    async fn unknown_event_is_a_no_op() {
        let engine = WorkflowEngine::new();
        let summary = engine.trigger("nobody:listens", json!({})).await;
        assert_eq!(summary, DispatchSummary::default());
    }

    #[tokio::test]
    async fn destroy_clears_triggers() {
        let engine = WorkflowEngine::new();
        engine.register_trigger(WorkflowTrigger::new("lead:updated", |_| async {
            Ok::<(), BoxError>(())
        }));
        assert_eq!(engine.trigger_count("lead:updated"), 1);

        Service::destroy(&engine).await.unwrap();
        assert_eq!(engine.trigger_count("lead:updated"), 0);
        assert!(engine.events().is_empty());
    }
}
