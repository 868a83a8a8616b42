//! # Schema Registry
//!
//! Stores [`SchemaDefinition`]s by name and runs the record pipeline around them.
//!
//! ## Record Pipeline
//!
//! The persistence layer is not part of the core, but it drives records through the
//! registry so that defaults, hooks and validation are applied consistently:
//!
//! 1. [`SchemaRegistry::prepare_create`] fills defaults, runs `beforeCreate` and
//!    validates the result.
//! 2. The host persists the record.
//! 3. [`SchemaRegistry::complete_create`] runs `afterCreate` on the persisted record.
//!
//! Updates follow the same shape with [`SchemaRegistry::prepare_update`] and
//! [`SchemaRegistry::complete_update`]; update payloads are partial, so only the
//! fields they carry are validated.

use super::{SchemaDefinition, ValidationResult};
use crate::error::CoreError;
use crate::registry::Registry;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A relation field whose target schema is not registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingRelation {
    pub schema: String,
    pub field: String,
    pub target: String,
}

pub struct SchemaRegistry {
    schemas: Registry<Arc<SchemaDefinition>>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self {
            schemas: Registry::new("schema"),
        }
    }

    /// Stores `schema` under `name`, silently replacing an earlier definition
    /// (the overwrite is logged at `warn`).
    pub fn register(
        &self,
        name: impl Into<String>,
        schema: impl Into<Arc<SchemaDefinition>>,
    ) -> bool {
        self.schemas.register(name, schema.into())
    }

    pub fn get(&self, name: &str) -> Option<Arc<SchemaDefinition>> {
        self.schemas.get(name)
    }

    pub fn list(&self) -> Vec<String> {
        self.schemas.list()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Logs every registered schema and any relation pointing at an unknown schema.
    ///
    /// Dangling relations are reported, not rejected.
    pub fn initialize(&self) {
        info!(count = self.len(), "Schemas registered");
        for (name, schema) in self.schemas.snapshot() {
            info!(
                schema = %name,
                table = schema.table_name(),
                fields = schema.field_count(),
                "Schema ready"
            );
        }
        for dangling in self.dangling_relations() {
            warn!(
                schema = %dangling.schema,
                field = %dangling.field,
                target = %dangling.target,
                "Relation target is not a registered schema"
            );
        }
    }

    pub fn dangling_relations(&self) -> Vec<DanglingRelation> {
        let mut dangling = Vec::new();
        for (name, schema) in self.schemas.snapshot() {
            for (field, target) in schema.relations() {
                if !self.schemas.contains(target) {
                    dangling.push(DanglingRelation {
                        schema: name.clone(),
                        field: field.to_string(),
                        target: target.to_string(),
                    });
                }
            }
        }
        dangling
    }

    /// Validates `payload` against the schema registered as `schema_name`.
    ///
    /// Never fails: an unknown schema yields a single validation error.
    pub fn validate(&self, schema_name: &str, payload: &Value) -> ValidationResult {
        match self.get(schema_name) {
            Some(schema) => schema.validate(payload),
            None => ValidationResult::unknown_schema(schema_name),
        }
    }

    /// Defaults, then `beforeCreate`, then full validation. Returns the record to persist.
    pub async fn prepare_create(
        &self,
        schema_name: &str,
        payload: Value,
    ) -> Result<Value, CoreError> {
        let schema = self.require(schema_name)?;
        let mut record = schema.apply_defaults(payload);
        if let Some(hooks) = schema.lifecycle_hooks() {
            record = hooks
                .before_create(record)
                .await
                .map_err(|source| hook_error(schema_name, "beforeCreate", source))?;
        }
        ensure_valid(schema_name, schema.validate(&record))?;
        debug!(schema = schema_name, "Record prepared for create");
        Ok(record)
    }

    /// Runs `afterCreate` on a persisted record.
    pub async fn complete_create(
        &self,
        schema_name: &str,
        record: &Value,
    ) -> Result<(), CoreError> {
        let schema = self.require(schema_name)?;
        if let Some(hooks) = schema.lifecycle_hooks() {
            hooks
                .after_create(record)
                .await
                .map_err(|source| hook_error(schema_name, "afterCreate", source))?;
        }
        Ok(())
    }

    /// `beforeUpdate`, then validation of the fields the partial payload carries.
    pub async fn prepare_update(
        &self,
        schema_name: &str,
        payload: Value,
    ) -> Result<Value, CoreError> {
        let schema = self.require(schema_name)?;
        let mut record = payload;
        if let Some(hooks) = schema.lifecycle_hooks() {
            record = hooks
                .before_update(record)
                .await
                .map_err(|source| hook_error(schema_name, "beforeUpdate", source))?;
        }
        ensure_valid(schema_name, schema.validate_present(&record))?;
        debug!(schema = schema_name, "Record prepared for update");
        Ok(record)
    }

    pub async fn complete_update(
        &self,
        schema_name: &str,
        record: &Value,
    ) -> Result<(), CoreError> {
        let schema = self.require(schema_name)?;
        if let Some(hooks) = schema.lifecycle_hooks() {
            hooks
                .after_update(record)
                .await
                .map_err(|source| hook_error(schema_name, "afterUpdate", source))?;
        }
        Ok(())
    }

    fn require(&self, schema_name: &str) -> Result<Arc<SchemaDefinition>, CoreError> {
        self.get(schema_name)
            .ok_or_else(|| CoreError::SchemaNotFound(schema_name.to_string()))
    }
}

fn hook_error(schema: &str, hook: &'static str, source: crate::error::BoxError) -> CoreError {
    warn!(schema, hook, error = %source, "Schema hook failed");
    CoreError::Hook {
        schema: schema.to_string(),
        hook,
        source,
    }
}

fn ensure_valid(schema: &str, result: ValidationResult) -> Result<(), CoreError> {
    if result.valid {
        Ok(())
    } else {
        Err(CoreError::Validation {
            schema: schema.to_string(),
            errors: result.errors,
        })
    }
}
