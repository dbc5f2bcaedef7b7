//! Field schema for registered experiments.
//!
//! The schema is a static table of [`FieldSpec`] descriptors. Validation and
//! uniqueness checks dispatch over this table instead of hard-coding fields.

use serde_json::Value;

/// Server-managed fields. Never accepted from a client, never in the schema.
pub const AUTH_HASH: &str = "auth_hash";
pub const LAST_UPDATED: &str = "last_updated";
pub const SYSTEM_FIELDS: [&str; 2] = [AUTH_HASH, LAST_UPDATED];

/// Fields stripped from every read response.
pub const SENSITIVE_FIELDS: [&str; 1] = [AUTH_HASH];

/// Expected JSON kind of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    String,
    List,
}

impl FieldKind {
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::String => value.is_string(),
            Self::List => value.is_array(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::String => "string",
            Self::List => "list",
        }
    }
}

/// Human-readable kind of an arbitrary JSON value, for defect messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub unique: bool,
}

impl FieldSpec {
    const fn new(name: &'static str, kind: FieldKind, required: bool, unique: bool) -> Self {
        Self {
            name,
            kind,
            required,
            unique,
        }
    }
}

/// The public fields of an experiment record.
pub const EXPERIMENT_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("start_time", FieldKind::Integer, true, false),
    FieldSpec::new("end_by", FieldKind::Integer, false, false),
    FieldSpec::new("id", FieldKind::String, true, true),
    FieldSpec::new("long_name", FieldKind::String, false, false),
    FieldSpec::new("description", FieldKind::String, false, false),
    FieldSpec::new("websocket_ip", FieldKind::String, true, true),
    FieldSpec::new("websocket_credentials", FieldKind::List, true, false),
];

#[derive(Debug, Clone, Copy)]
pub struct Schema {
    fields: &'static [FieldSpec],
}

impl Default for Schema {
    fn default() -> Self {
        Self::experiments()
    }
}

impl Schema {
    pub const fn new(fields: &'static [FieldSpec]) -> Self {
        Self { fields }
    }

    pub const fn experiments() -> Self {
        Self::new(EXPERIMENT_FIELDS)
    }

    /// Descriptors in table order.
    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    pub fn get(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn unique_fields(&self) -> impl Iterator<Item = &'static FieldSpec> {
        self.fields.iter().filter(|f| f.unique)
    }

    pub fn is_system_field(name: &str) -> bool {
        SYSTEM_FIELDS.contains(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integer_rejects_floats_and_booleans() {
        assert!(FieldKind::Integer.matches(&json!(100)));
        assert!(FieldKind::Integer.matches(&json!(-3)));
        assert!(!FieldKind::Integer.matches(&json!(100.5)));
        assert!(!FieldKind::Integer.matches(&json!(true)));
        assert!(!FieldKind::Integer.matches(&json!("100")));
    }

    #[test]
    fn list_and_string_kinds() {
        assert!(FieldKind::List.matches(&json!(["u", "p"])));
        assert!(!FieldKind::List.matches(&json!({"u": "p"})));
        assert!(FieldKind::String.matches(&json!("10.0.0.1")));
        assert!(!FieldKind::String.matches(&Value::Null));
    }

    #[test]
    fn value_kind_names() {
        assert_eq!(value_kind(&json!(1.5)), "float");
        assert_eq!(value_kind(&json!(7)), "integer");
        assert_eq!(value_kind(&json!(null)), "null");
        assert_eq!(value_kind(&json!({})), "object");
    }

    #[test]
    fn experiment_schema_unique_fields() {
        let schema = Schema::experiments();
        let unique: Vec<_> = schema.unique_fields().map(|f| f.name).collect();
        assert_eq!(unique, vec!["id", "websocket_ip"]);
        assert!(schema.get("end_by").is_some_and(|f| !f.required));
        assert!(schema.get(AUTH_HASH).is_none());
    }
}
