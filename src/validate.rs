//! Schema validation of incoming field maps.
//!
//! All defects are collected in one pass and returned together as
//! [`RegistryError::Validation`].

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{RegistryError, Result};
use crate::schema::{value_kind, FieldSpec, Schema};

/// Whether every schema field is checked (create) or only the supplied ones (update).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    Create,
    Update,
}

/// How an update treats field names that are neither in the schema nor
/// system-managed. Creates always drop them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFields {
    #[default]
    Reject,
    Ignore,
}

#[derive(Debug, Clone, Copy)]
pub struct Validator {
    schema: Schema,
    unknown_fields: UnknownFields,
}

impl Validator {
    pub fn new(schema: Schema, unknown_fields: UnknownFields) -> Self {
        Self {
            schema,
            unknown_fields,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Validate `input` and return the normalized field map.
    ///
    /// In [`ValidationMode::Create`] the result holds every schema field, with
    /// explicit nulls for absent optional ones. In [`ValidationMode::Update`]
    /// it holds only the supplied fields, ready to be merged over a record.
    /// System fields and, on create, unknown fields are never part of the result.
    pub fn validate(
        &self,
        input: &Map<String, Value>,
        mode: ValidationMode,
    ) -> Result<Map<String, Value>> {
        let mut defects = Vec::new();
        let mut normalized = Map::new();

        match mode {
            ValidationMode::Create => {
                for spec in self.schema.fields() {
                    match input.get(spec.name) {
                        None | Some(Value::Null) if !spec.required => {
                            normalized.insert(spec.name.to_string(), Value::Null);
                        }
                        None => defects.push(format!("{} is required", spec.name)),
                        Some(value) => check_field(spec, value, &mut normalized, &mut defects),
                    }
                }
            }
            ValidationMode::Update => {
                for (name, value) in input {
                    if Schema::is_system_field(name) {
                        continue;
                    }
                    if let Some(spec) = self.schema.get(name) {
                        if value.is_null() && !spec.required {
                            normalized.insert(name.clone(), Value::Null);
                        } else {
                            check_field(spec, value, &mut normalized, &mut defects);
                        }
                    }
                }
            }
        }

        if mode == ValidationMode::Update && self.unknown_fields == UnknownFields::Reject {
            defects.extend(
                input
                    .keys()
                    .filter(|name| {
                        !Schema::is_system_field(name) && self.schema.get(name).is_none()
                    })
                    .map(|name| format!("{name} is not a known field")),
            );
        }

        if defects.is_empty() {
            Ok(normalized)
        } else {
            Err(RegistryError::Validation(defects))
        }
    }
}

fn check_field(
    spec: &FieldSpec,
    value: &Value,
    normalized: &mut Map<String, Value>,
    defects: &mut Vec<String>,
) {
    if spec.kind.matches(value) {
        normalized.insert(spec.name.to_string(), value.clone());
    } else {
        defects.push(format!(
            "{} is the wrong type. Expected {} got {}",
            spec.name,
            spec.kind.name(),
            value_kind(value)
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn validator() -> Validator {
        Validator::new(Schema::experiments(), UnknownFields::Reject)
    }

    #[test]
    fn create_fills_optional_fields_with_null() {
        let input = object(json!({
            "id": "exp1",
            "start_time": 100,
            "websocket_ip": "10.0.0.1",
            "websocket_credentials": ["u", "p"],
        }));
        let record = validator().validate(&input, ValidationMode::Create).unwrap();
        assert_eq!(record.len(), 7);
        assert_eq!(record["end_by"], Value::Null);
        assert_eq!(record["long_name"], Value::Null);
        assert_eq!(record["id"], json!("exp1"));
    }

    #[test]
    fn create_reports_single_missing_field() {
        let input = object(json!({
            "id": "exp1",
            "start_time": 100,
            "websocket_credentials": ["u", "p"],
        }));
        let err = validator().validate(&input, ValidationMode::Create).unwrap_err();
        assert_eq!(err.defects().unwrap(), ["websocket_ip is required"]);
    }

    #[test]
    fn create_accumulates_every_defect() {
        let input = object(json!({
            "start_time": "soon",
            "end_by": 1.5,
            "websocket_ip": "10.0.0.1",
            "websocket_credentials": "u:p",
        }));
        let err = validator().validate(&input, ValidationMode::Create).unwrap_err();
        assert_eq!(
            err.defects().unwrap(),
            [
                "start_time is the wrong type. Expected integer got string",
                "end_by is the wrong type. Expected integer got float",
                "id is required",
                "websocket_credentials is the wrong type. Expected list got string",
            ]
        );
    }

    #[test]
    fn create_rejects_null_for_required_field() {
        let input = object(json!({
            "id": null,
            "start_time": 100,
            "websocket_ip": "10.0.0.1",
            "websocket_credentials": [],
        }));
        let err = validator().validate(&input, ValidationMode::Create).unwrap_err();
        assert_eq!(
            err.defects().unwrap(),
            ["id is the wrong type. Expected string got null"]
        );
    }

    #[test]
    fn create_drops_client_supplied_system_fields() {
        let input = object(json!({
            "id": "exp1",
            "start_time": 100,
            "websocket_ip": "10.0.0.1",
            "websocket_credentials": [],
            "auth_hash": "forged",
            "last_updated": 0,
        }));
        let record = validator().validate(&input, ValidationMode::Create).unwrap();
        assert!(!record.contains_key("auth_hash"));
        assert!(!record.contains_key("last_updated"));
    }

    #[test]
    fn create_drops_unknown_fields_regardless_of_policy() {
        let input = object(json!({
            "id": "exp1",
            "start_time": 100,
            "websocket_ip": "10.0.0.1",
            "websocket_credentials": ["u", "p"],
            "worker_version": "2",
        }));
        let record = validator().validate(&input, ValidationMode::Create).unwrap();
        assert_eq!(record.len(), 7);
        assert!(!record.contains_key("worker_version"));
    }

    #[test]
    fn unknown_fields_rejected_or_ignored_by_policy() {
        let input = object(json!({"id": "exp1", "colour": "blue"}));

        let err = validator().validate(&input, ValidationMode::Update).unwrap_err();
        assert_eq!(err.defects().unwrap(), ["colour is not a known field"]);

        let lenient = Validator::new(Schema::experiments(), UnknownFields::Ignore);
        let changes = lenient.validate(&input, ValidationMode::Update).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes["id"], json!("exp1"));
    }

    #[test]
    fn update_checks_only_supplied_fields() {
        let input = object(json!({
            "id": "exp1",
            "auth_hash": "00",
            "description": "warm",
        }));
        let changes = validator().validate(&input, ValidationMode::Update).unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes["description"], json!("warm"));
    }

    #[test]
    fn update_reports_type_defects() {
        let input = object(json!({"id": "exp1", "end_by": "tomorrow"}));
        let err = validator().validate(&input, ValidationMode::Update).unwrap_err();
        assert_eq!(
            err.to_string(),
            "end_by is the wrong type. Expected integer got string"
        );
    }
}
