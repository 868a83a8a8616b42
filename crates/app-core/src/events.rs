//! # Lifecycle Notifications
//!
//! The core's only observable side channel. Every registration and every lifecycle
//! transition is announced as a [`CoreEvent`]; collaborators (logging, metrics,
//! diagnostics) subscribe without the core depending on them.
//!
//! | kind                 | emitted by                                  |
//! |----------------------|---------------------------------------------|
//! | `module:registered`  | [`ApplicationCore::register_module`]        |
//! | `schema:registered`  | [`ApplicationCore::register_schema`]        |
//! | `service:registered` | [`ApplicationCore::register_service`]       |
//! | `app:started`        | [`ApplicationCore::start`]                  |
//! | `app:stopped`        | [`ApplicationCore::shutdown`]               |
//!
//! Listeners are called synchronously, on the emitting task, in subscription order.
//! There is no ordering between different kinds.
//!
//! [`ApplicationCore::register_module`]: crate::ApplicationCore::register_module
//! [`ApplicationCore::register_schema`]: crate::ApplicationCore::register_schema
//! [`ApplicationCore::register_service`]: crate::ApplicationCore::register_service
//! [`ApplicationCore::start`]: crate::ApplicationCore::start
//! [`ApplicationCore::shutdown`]: crate::ApplicationCore::shutdown

use crate::module::Module;
use crate::schema::SchemaDefinition;
use crate::service::Service;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ModuleRegistered,
    SchemaRegistered,
    ServiceRegistered,
    AppStarted,
    AppStopped,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ModuleRegistered => "module:registered",
            EventKind::SchemaRegistered => "schema:registered",
            EventKind::ServiceRegistered => "service:registered",
            EventKind::AppStarted => "app:started",
            EventKind::AppStopped => "app:stopped",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification payload. Registration events carry `{name, entity}`.
#[derive(Clone)]
pub enum CoreEvent {
    ModuleRegistered {
        name: String,
        module: Arc<dyn Module>,
    },
    SchemaRegistered {
        name: String,
        schema: Arc<SchemaDefinition>,
    },
    ServiceRegistered {
        name: String,
        service: Arc<dyn Service>,
    },
    AppStarted,
    AppStopped,
}

impl CoreEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            CoreEvent::ModuleRegistered { .. } => EventKind::ModuleRegistered,
            CoreEvent::SchemaRegistered { .. } => EventKind::SchemaRegistered,
            CoreEvent::ServiceRegistered { .. } => EventKind::ServiceRegistered,
            CoreEvent::AppStarted => EventKind::AppStarted,
            CoreEvent::AppStopped => EventKind::AppStopped,
        }
    }

    /// Name of the registered entity, for registration events.
    pub fn name(&self) -> Option<&str> {
        match self {
            CoreEvent::ModuleRegistered { name, .. }
            | CoreEvent::SchemaRegistered { name, .. }
            | CoreEvent::ServiceRegistered { name, .. } => Some(name),
            CoreEvent::AppStarted | CoreEvent::AppStopped => None,
        }
    }
}

impl fmt::Debug for CoreEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("CoreEvent");
        out.field("kind", &self.kind().as_str());
        if let Some(name) = self.name() {
            out.field("name", &name);
        }
        out.finish()
    }
}

pub type Listener = Arc<dyn Fn(&CoreEvent) + Send + Sync>;

/// Listener lists keyed by [`EventKind`].
#[derive(Default)]
pub struct Notifier {
    listeners: RwLock<HashMap<EventKind, Vec<Listener>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        kind: EventKind,
        listener: impl Fn(&CoreEvent) + Send + Sync + 'static,
    ) {
        self.listeners
            .write()
            .entry(kind)
            .or_default()
            .push(Arc::new(listener));
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.read().get(&kind).map_or(0, Vec::len)
    }

    /// Calls every listener of `event.kind()` in subscription order.
    ///
    /// The listener list is copied first, so a listener may subscribe further
    /// listeners; those only see later events.
    pub fn emit(&self, event: &CoreEvent) {
        let listeners = self
            .listeners
            .read()
            .get(&event.kind())
            .cloned()
            .unwrap_or_default();
        tracing::trace!(event = %event.kind(), listeners = listeners.len(), "Emit");
        for listener in listeners {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn listeners_run_in_subscription_order() {
        let notifier = Notifier::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let log = log.clone();
            notifier.subscribe(EventKind::AppStarted, move |_| log.lock().push(tag));
        }
        let other = log.clone();
        notifier.subscribe(EventKind::AppStopped, move |_| other.lock().push("stopped"));

        notifier.emit(&CoreEvent::AppStarted);
        assert_eq!(*log.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn emit_without_listeners_is_a_no_op() {
        let notifier = Notifier::new();
        notifier.emit(&CoreEvent::AppStopped);
        assert_eq!(notifier.listener_count(EventKind::AppStopped), 0);
    }

    #[test]
    fn listener_may_subscribe_during_emit() {
        let notifier = Arc::new(Notifier::new());
        let inner = notifier.clone();
        notifier.subscribe(EventKind::AppStarted, move |_| {
            inner.subscribe(EventKind::AppStarted, |_| {});
        });

        notifier.emit(&CoreEvent::AppStarted);
        assert_eq!(notifier.listener_count(EventKind::AppStarted), 2);
    }

    #[test]
    fn kinds_use_colon_names() {
        assert_eq!(EventKind::ModuleRegistered.to_string(), "module:registered");
        assert_eq!(EventKind::AppStarted.as_str(), "app:started");
    }
}
