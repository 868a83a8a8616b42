//! # Finance Back Office
//!
//! A modular back office for project, CRM and finance records, assembled on top of
//! [`app_core`].
//!
//! ## 🚀 Core Components
//!
//! - **[modules]**: The business areas. [`ProjectsModule`](modules::ProjectsModule),
//!   [`CrmModule`](modules::CrmModule) and [`FinanceModule`](modules::FinanceModule) register
//!   their schemas and hooks when the core starts.
//! - **[workflows]**: The built-in triggers for lead, installment, project and expense events.
//! - **[lifecycle]**: [`BackofficeSystem`](lifecycle::BackofficeSystem), which wires the
//!   units together and boots or stops the core, plus the tracing setup.
//! - **[config]**: Defaults, an optional JSON file and environment overrides.
//!
//! ## 📚 Quick Start
//!
//! The `backoffice` binary demonstrates:
//! 1.  Loading [`BackofficeConfig`](config::BackofficeConfig) and setting up tracing.
//! 2.  Booting the [`BackofficeSystem`](lifecycle::BackofficeSystem).
//! 3.  Running one lead through the record pipeline, which publishes `lead:created`.
//! 4.  Shutting down.
//!
//! ## 🧪 Testing
//!
//! See [`app_core::mock`] for doubles that record lifecycle calls without real modules.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod modules;
pub mod workflows;
