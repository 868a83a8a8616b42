//! # Schemas
//!
//! Declarative descriptions of persisted entities, and their validation.
//!
//! A [`SchemaDefinition`] maps field names to [`FieldSpec`]s in declaration order and may
//! carry [`SchemaHooks`], asynchronous callbacks that run around record creation and
//! update. Schemas are registered into the [`SchemaRegistry`] by modules while they
//! initialize.
//!
//! Validation is pure: it never touches a database and never fails. Bad input is
//! reported as a [`ValidationResult`] whose errors follow field declaration order.
//!
//! ```rust
//! use app_core::{FieldSpec, SchemaDefinition};
//! use serde_json::json;
//!
//! let leads = SchemaDefinition::new("leads")
//!     .field("name", FieldSpec::string().required())
//!     .field("lead_score", FieldSpec::number().default_value(0));
//!
//! assert!(leads.validate(&json!({ "name": "Ada" })).valid);
//!
//! let result = leads.validate(&json!({ "lead_score": "80" }));
//! assert_eq!(
//!     result.errors,
//!     vec!["name is required", "lead_score has wrong type, expected number"]
//! );
//! ```

pub mod field;
pub mod registry;

pub use field::*;
pub use registry::*;

use crate::error::BoxError;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Asynchronous record lifecycle hooks attached to a schema.
///
/// # Provided Methods (Hooks)
/// Every hook has a default implementation that passes the record through unchanged
/// (`before_*`) or does nothing (`after_*`). Implement only the ones you need.
///
/// `before_*` hooks transform the candidate record and return the version to persist.
/// `after_*` hooks see the persisted record and perform side effects.
#[async_trait]
pub trait SchemaHooks: Send + Sync {
    async fn before_create(&self, record: Value) -> Result<Value, BoxError> {
        Ok(record)
    }

    async fn after_create(&self, _record: &Value) -> Result<(), BoxError> {
        Ok(())
    }

    async fn before_update(&self, record: Value) -> Result<Value, BoxError> {
        Ok(record)
    }

    async fn after_update(&self, _record: &Value) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Outcome of checking a payload against a schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    pub fn unknown_schema(name: &str) -> Self {
        Self::from_errors(vec![format!("schema {name} does not exist")])
    }
}

/// Which rules a validation pass applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Coverage {
    /// Every declared field; absent required fields are errors.
    Full,
    /// Only fields present in the payload (partial updates).
    PresentOnly,
}

/// A named, declarative description of a persisted entity.
#[derive(Clone)]
pub struct SchemaDefinition {
    name: String,
    table_name: String,
    fields: IndexMap<String, FieldSpec>,
    hooks: Option<Arc<dyn SchemaHooks>>,
}

impl SchemaDefinition {
    /// Creates an empty schema whose table name defaults to `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            table_name: name.clone(),
            name,
            fields: IndexMap::new(),
            hooks: None,
        }
    }

    pub fn table(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Appends a field. Declaring the same name twice replaces the spec in place.
    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.insert(name.into(), spec);
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn SchemaHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn field_spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn lifecycle_hooks(&self) -> Option<&dyn SchemaHooks> {
        self.hooks.as_deref()
    }

    /// `(field, target schema)` for every relation field.
    pub fn relations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields()
            .filter_map(|(name, spec)| spec.kind.relation_target().map(|t| (name, t)))
    }

    /// Fills declared defaults into fields that are missing or null.
    ///
    /// Non-object payloads are returned untouched.
    pub fn apply_defaults(&self, payload: Value) -> Value {
        let mut record = match payload {
            Value::Object(record) => record,
            other => return other,
        };
        for (name, spec) in &self.fields {
            let Some(default) = &spec.default else {
                continue;
            };
            let absent = record.get(name).map_or(true, Value::is_null);
            if absent {
                record.insert(name.clone(), default.clone());
            }
        }
        Value::Object(record)
    }

    /// Checks `payload` against every declared field.
    pub fn validate(&self, payload: &Value) -> ValidationResult {
        self.check(payload, Coverage::Full)
    }

    /// Checks only the fields present in `payload`; missing required fields are not
    /// reported. Used for partial updates.
    pub fn validate_present(&self, payload: &Value) -> ValidationResult {
        self.check(payload, Coverage::PresentOnly)
    }

    fn check(&self, payload: &Value, coverage: Coverage) -> ValidationResult {
        let empty = Map::new();
        let record = payload.as_object().unwrap_or(&empty);
        let mut errors = Vec::new();

        for (name, spec) in &self.fields {
            let value = record.get(name).filter(|v| !v.is_null());

            let Some(value) = value else {
                if spec.required && coverage == Coverage::Full {
                    errors.push(format!("{name} is required"));
                }
                continue;
            };

            if !spec.kind.matches(value) {
                errors.push(format!("{name} has wrong type, expected {}", spec.kind));
            }
            if !spec.accepts(value) {
                errors.push(format!("{name} failed validation"));
            }
        }

        ValidationResult::from_errors(errors)
    }
}

impl fmt::Debug for SchemaDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaDefinition")
            .field("name", &self.name)
            .field("table_name", &self.table_name)
            .field("fields", &self.fields)
            .field("hooks", &self.hooks.is_some())
            .finish()
    }
}
