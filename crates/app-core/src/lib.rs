//! # Application Core
//!
//! This crate provides the composition root for a modular back-office server. It knows
//! nothing about projects, leads or invoices; it only knows how to plug **modules**,
//! **schemas** and **services** together and boot them in a predictable order.
//!
//! ## Architecture Overview
//!
//! The core separates concerns into three kinds of units:
//!
//! 1. **Modules** ([`Module`]) - bounded business capabilities. They register schemas
//!    while they initialize.
//! 2. **Schemas** ([`SchemaDefinition`]) - declarative entity descriptions with field
//!    rules, defaults and lifecycle hooks ([`SchemaHooks`]).
//! 3. **Services** ([`Service`]) - long-lived infrastructure started after every schema
//!    exists, such as the [`WorkflowEngine`].
//!
//! Each kind lives in its own name-keyed registry, owned by the [`ApplicationCore`].
//! Registries preserve registration order, and that order is the initialization order.
//!
//! ## Startup Sequence
//!
//! ```text
//! register_module / register_service      (host, before start)
//!            │
//!            ▼
//! ApplicationCore::start
//!   1. modules.initialize   ── modules call core.register_schema(..)
//!   2. schemas.initialize   ── enumerate, warn on dangling relations
//!   3. services.initialize  ── e.g. workflow engine installs its triggers
//!   4. emit app:started
//! ```
//!
//! The first failing module or service aborts `start` with a [`CoreError`] naming it.
//! Nothing is rolled back; the host is expected to exit.
//!
//! ## Context Injection (Late Binding)
//!
//! Modules and services are constructed **without** a reference to the core. The core is
//! injected into `initialize(&self, core)` instead:
//!
//! ```rust
//! use app_core::{ApplicationCore, BoxError, FieldSpec, Module, SchemaDefinition};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct ProjectsModule;
//!
//! #[async_trait]
//! impl Module for ProjectsModule {
//!     async fn initialize(&self, core: &ApplicationCore) -> Result<(), BoxError> {
//!         core.register_schema(
//!             "projects",
//!             SchemaDefinition::new("projects")
//!                 .field("company_name", FieldSpec::string().required()),
//!         );
//!         Ok(())
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let core = ApplicationCore::new();
//! core.register_module("projects", Arc::new(ProjectsModule));
//! core.start().await.unwrap();
//!
//! let result = core.validate("projects", &serde_json::json!({}));
//! assert_eq!(result.errors, vec!["company_name is required"]);
//! # }
//! ```
//!
//! This keeps ownership one-directional: the core owns its units through `Arc`, units
//! only borrow the core while they start.
//!
//! ## Concurrency Model
//!
//! - Registries are guarded by short-lived `parking_lot` locks that are never held
//!   across an `.await`. Lifecycle loops iterate over a snapshot, so a module may
//!   register schemas from inside its own `initialize`.
//! - Lifecycle notifications ([`CoreEvent`]) are delivered synchronously, in subscription
//!   order, on the emitting task.
//! - Workflow triggers run one at a time per event, each on its own Tokio task so that a
//!   failing or panicking action never reaches the caller.
//!
//! ## Testing
//!
//! The [`mock`] module provides [`mock::MockUnit`], a module/service double that records
//! every lifecycle call into a shared log and can be scripted to fail.

pub mod core;
pub mod error;
pub mod events;
pub mod mock;
pub mod module;
mod registry;
pub mod schema;
pub mod service;
pub mod workflow;

// Re-export core types for convenience
pub use crate::core::{ApplicationCore, CoreState, ShutdownReport};
pub use error::{BoxError, CoreError};
pub use events::{CoreEvent, EventKind, Listener, Notifier};
pub use module::{Module, ModuleRegistry};
pub use schema::{
    Cardinality, DanglingRelation, FieldKind, FieldSpec, SchemaDefinition, SchemaHooks,
    SchemaRegistry, ValidationResult,
};
pub use service::{Service, ServiceRegistry};
pub use workflow::{DispatchSummary, WorkflowEngine, WorkflowTrigger};
