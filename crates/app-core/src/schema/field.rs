//! # Field Specifications
//!
//! A [`FieldSpec`] describes one field of a [`SchemaDefinition`](super::SchemaDefinition):
//! its [`FieldKind`], the `required`/`unique` flags, an optional default and an optional
//! custom predicate.
//!
//! [`FieldKind`] is a tagged union. Only [`FieldKind::Relation`] carries extra data (the
//! target schema and the [`Cardinality`]), so a string field can never be given a
//! relation target by mistake.
//!
//! ```rust
//! use app_core::{Cardinality, FieldSpec};
//! use serde_json::json;
//!
//! let status = FieldSpec::string()
//!     .default_value("new")
//!     .one_of(&["new", "contacted", "qualified", "lost"]);
//! assert!(status.accepts(&json!("new")));
//! assert!(!status.accepts(&json!("bogus")));
//!
//! let lead = FieldSpec::relation("leads", Cardinality::BelongsTo);
//! assert_eq!(lead.kind.relation_target(), Some("leads"));
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Custom validation predicate, evaluated against a present field value.
pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// How many records a relation field points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Cardinality {
    HasOne,
    HasMany,
    BelongsTo,
}

/// The primitive kind of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Date,
    Boolean,
    /// Any structured value: objects and arrays.
    Json,
    /// A reference to a record of another schema. Not type-checked at validation time;
    /// referential integrity belongs to the persistence layer.
    Relation {
        target: String,
        cardinality: Cardinality,
    },
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Date => "date",
            FieldKind::Boolean => "boolean",
            FieldKind::Json => "json",
            FieldKind::Relation { .. } => "relation",
        }
    }

    pub fn relation_target(&self) -> Option<&str> {
        match self {
            FieldKind::Relation { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Whether a present (non-null) value has the runtime shape this kind expects.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Number => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Date => value.as_str().is_some_and(is_date),
            FieldKind::Json => value.is_object() || value.is_array(),
            FieldKind::Relation { .. } => true,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts RFC 3339 / RFC 2822 timestamps, ISO dates and ISO date-times without offset.
pub fn is_date(s: &str) -> bool {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s).is_ok()
        || DateTime::parse_from_rfc2822(s).is_ok()
        || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").is_ok()
}

/// Declarative description of a single field.
#[derive(Clone)]
pub struct FieldSpec {
    pub kind: FieldKind,
    pub required: bool,
    pub unique: bool,
    pub default: Option<Value>,
    validation: Option<Predicate>,
}

impl FieldSpec {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            required: false,
            unique: false,
            default: None,
            validation: None,
        }
    }

    pub fn string() -> Self {
        Self::new(FieldKind::String)
    }

    pub fn number() -> Self {
        Self::new(FieldKind::Number)
    }

    pub fn date() -> Self {
        Self::new(FieldKind::Date)
    }

    pub fn boolean() -> Self {
        Self::new(FieldKind::Boolean)
    }

    pub fn json() -> Self {
        Self::new(FieldKind::Json)
    }

    pub fn relation(target: impl Into<String>, cardinality: Cardinality) -> Self {
        Self::new(FieldKind::Relation {
            target: target.into(),
            cardinality,
        })
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Attaches a custom predicate. Replaces any earlier predicate.
    pub fn validate(mut self, predicate: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.validation = Some(Arc::new(predicate));
        self
    }

    /// Predicate shortcut: the value must be one of `allowed` strings.
    pub fn one_of(self, allowed: &[&str]) -> Self {
        let allowed: Vec<String> = allowed.iter().map(|s| s.to_string()).collect();
        self.validate(move |value| {
            value
                .as_str()
                .is_some_and(|s| allowed.iter().any(|a| a == s))
        })
    }

    pub fn has_validation(&self) -> bool {
        self.validation.is_some()
    }

    /// Runs the custom predicate. Fields without one accept everything.
    pub fn accepts(&self, value: &Value) -> bool {
        self.validation.as_ref().map_or(true, |p| p(value))
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("unique", &self.unique)
            .field("default", &self.default)
            .field("validation", &self.validation.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn date_kind_accepts_common_formats() {
        let kind = FieldKind::Date;
        assert!(kind.matches(&json!("2024-03-01")));
        assert!(kind.matches(&json!("2024-03-01T10:30:00Z")));
        assert!(kind.matches(&json!("2024-03-01T10:30:00.250+08:00")));
        assert!(kind.matches(&json!("2024-03-01 10:30:00")));
        assert!(!kind.matches(&json!("not a date")));
        assert!(!kind.matches(&json!("2024-13-45")));
        assert!(!kind.matches(&json!(20240301)));
    }

    #[test]
    fn json_kind_accepts_objects_and_arrays() {
        assert!(FieldKind::Json.matches(&json!({"a": 1})));
        assert!(FieldKind::Json.matches(&json!(["vip", "referral"])));
        assert!(!FieldKind::Json.matches(&json!("{}")));
        assert!(!FieldKind::Json.matches(&json!(3)));
    }

    #[test]
    fn relation_kind_is_permissive() {
        let kind = FieldKind::Relation {
            target: "projects".into(),
            cardinality: Cardinality::BelongsTo,
        };
        assert!(kind.matches(&json!(42)));
        assert!(kind.matches(&json!("p-42")));
        assert_eq!(kind.name(), "relation");
    }

    #[test]
    fn one_of_rejects_non_strings() {
        let field = FieldSpec::string().one_of(&["active", "inactive"]);
        assert!(field.accepts(&json!("active")));
        assert!(!field.accepts(&json!(1)));
    }
}
