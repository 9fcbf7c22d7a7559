//! Tool parameter schemas.
//!
//! `ParameterSchema` is the subset of JSON Schema that chat-completion servers
//! understand for function parameters. It serializes to the same JSON the
//! server expects, and it validates raw tool arguments before they are
//! deserialized into a typed input.

use std::collections::BTreeMap;

use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;
use thiserror::Error;

/// A parameter schema, tagged by its JSON `type`.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ParameterSchema {
    Object {
        description: Option<String>,
        #[serde(default)]
        properties: BTreeMap<String, ParameterSchema>,
        #[serde(default)]
        required: Vec<String>,
        #[serde(rename = "additionalProperties")]
        additional_properties: Option<bool>,
    },
    String {
        description: Option<String>,
        #[serde(rename = "enum")]
        enum_values: Option<Vec<String>>,
    },
    Integer {
        description: Option<String>,
        minimum: Option<f64>,
        maximum: Option<f64>,
    },
    Number {
        description: Option<String>,
        minimum: Option<f64>,
        maximum: Option<f64>,
    },
    Boolean {
        description: Option<String>,
    },
    Array {
        description: Option<String>,
        items: Option<Box<ParameterSchema>>,
    },
}

/// Raw arguments that don't satisfy a schema.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("at `{path}`: {reason}")]
pub struct SchemaViolation {
    /// Dotted path to the offending value, `$` being the root.
    pub path: String,
    pub reason: String,
}

impl ParameterSchema {
    /// Derive a schema from a Rust type with `schemars`.
    ///
    /// Optional fields are emitted without a `null` type and nested structs are
    /// inlined, so the result fits the tagged representation. Types that
    /// still need unsupported constructs (maps, unions) are rejected.
    pub fn for_type<T: JsonSchema>() -> Result<Self, serde_json::Error> {
        let settings = SchemaSettings::draft07().with(|s| {
            s.option_add_null_type = false;
            s.inline_subschemas = true;
        });
        let root = settings.into_generator().into_root_schema_for::<T>();
        serde_json::from_value(serde_json::to_value(&root)?)
    }

    /// An object schema that rejects undeclared properties.
    pub fn strict_object(
        properties: impl IntoIterator<Item = (String, ParameterSchema)>,
        required: impl IntoIterator<Item = String>,
    ) -> Self {
        ParameterSchema::Object {
            description: None,
            properties: properties.into_iter().collect(),
            required: required.into_iter().collect(),
            additional_properties: Some(false),
        }
    }

    pub fn string(description: impl Into<String>) -> Self {
        ParameterSchema::String {
            description: Some(description.into()),
            enum_values: None,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            ParameterSchema::Object { description, .. }
            | ParameterSchema::String { description, .. }
            | ParameterSchema::Integer { description, .. }
            | ParameterSchema::Number { description, .. }
            | ParameterSchema::Boolean { description }
            | ParameterSchema::Array { description, .. } => description.as_deref(),
        }
    }

    /// Required property names; empty for non-object schemas.
    pub fn required(&self) -> &[String] {
        match self {
            ParameterSchema::Object { required, .. } => required,
            _ => &[],
        }
    }

    /// Check `value` against this schema.
    pub fn validate(&self, value: &Value) -> Result<(), SchemaViolation> {
        self.check(value, "$")
    }

    fn check(&self, value: &Value, path: &str) -> Result<(), SchemaViolation> {
        let violation = |reason: String| SchemaViolation {
            path: path.to_string(),
            reason,
        };

        match self {
            ParameterSchema::Object {
                properties,
                required,
                additional_properties,
                ..
            } => {
                let object = value
                    .as_object()
                    .ok_or_else(|| violation(format!("expected object, found {}", kind(value))))?;

                for name in required {
                    if !object.contains_key(name) {
                        return Err(violation(format!("missing required property `{name}`")));
                    }
                }

                for (name, field) in object {
                    // An optional property may be sent as an explicit null.
                    if field.is_null() && !required.contains(name) {
                        continue;
                    }
                    match properties.get(name) {
                        Some(schema) => schema.check(field, &format!("{path}.{name}"))?,
                        None if *additional_properties == Some(false) => {
                            return Err(violation(format!("unexpected property `{name}`")));
                        }
                        None => {}
                    }
                }
                Ok(())
            }
            ParameterSchema::String { enum_values, .. } => {
                let text = value
                    .as_str()
                    .ok_or_else(|| violation(format!("expected string, found {}", kind(value))))?;
                match enum_values {
                    Some(allowed) if !allowed.iter().any(|v| v == text) => Err(violation(format!(
                        "`{text}` is not one of {}",
                        allowed.join(", ")
                    ))),
                    _ => Ok(()),
                }
            }
            ParameterSchema::Integer {
                minimum, maximum, ..
            } => {
                let is_integer = value.is_i64()
                    || value.is_u64()
                    || value.as_f64().is_some_and(|n| n.fract() == 0.0);
                if !is_integer {
                    return Err(violation(format!("expected integer, found {}", kind(value))));
                }
                check_bounds(value, *minimum, *maximum).map_err(violation)
            }
            ParameterSchema::Number {
                minimum, maximum, ..
            } => {
                if !value.is_number() {
                    return Err(violation(format!("expected number, found {}", kind(value))));
                }
                check_bounds(value, *minimum, *maximum).map_err(violation)
            }
            ParameterSchema::Boolean { .. } => {
                if value.is_boolean() {
                    Ok(())
                } else {
                    Err(violation(format!("expected boolean, found {}", kind(value))))
                }
            }
            ParameterSchema::Array { items, .. } => {
                let elements = value
                    .as_array()
                    .ok_or_else(|| violation(format!("expected array, found {}", kind(value))))?;
                if let Some(items) = items {
                    for (i, element) in elements.iter().enumerate() {
                        items.check(element, &format!("{path}[{i}]"))?;
                    }
                }
                Ok(())
            }
        }
    }
}

fn check_bounds(value: &Value, minimum: Option<f64>, maximum: Option<f64>) -> Result<(), String> {
    let Some(n) = value.as_f64() else {
        return Ok(());
    };
    if let Some(min) = minimum.filter(|min| n < *min) {
        return Err(format!("{n} is below the minimum {min}"));
    }
    if let Some(max) = maximum.filter(|max| n > *max) {
        return Err(format!("{n} is above the maximum {max}"));
    }
    Ok(())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, JsonSchema)]
    #[serde(deny_unknown_fields)]
    #[allow(dead_code)]
    struct LookupArgs {
        /// Customer name.
        name: String,
        /// Page number.
        page: Option<u32>,
        tags: Vec<String>,
    }

    fn order_schema() -> ParameterSchema {
        ParameterSchema::strict_object(
            [("order_id".to_string(), ParameterSchema::string("The order ID."))],
            ["order_id".to_string()],
        )
    }

    #[test]
    fn serializes_as_json_schema() {
        let value = serde_json::to_value(order_schema()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "object",
                "properties": {
                    "order_id": {"type": "string", "description": "The order ID."}
                },
                "required": ["order_id"],
                "additionalProperties": false
            })
        );
    }

    #[test]
    fn accepts_valid_arguments() {
        assert!(order_schema().validate(&json!({"order_id": "1017"})).is_ok());
    }

    #[test]
    fn rejects_missing_required_property() {
        let err = order_schema().validate(&json!({})).unwrap_err();
        assert_eq!(err.path, "$");
        assert!(err.reason.contains("order_id"));
    }

    #[test]
    fn rejects_undeclared_property() {
        let err = order_schema()
            .validate(&json!({"order_id": "1", "coupon": "FREE"}))
            .unwrap_err();
        assert!(err.reason.contains("coupon"));
    }

    #[test]
    fn rejects_wrong_type_with_path() {
        let err = order_schema()
            .validate(&json!({"order_id": 1017}))
            .unwrap_err();
        assert_eq!(err.path, "$.order_id");
        assert_eq!(err.reason, "expected string, found number");
    }

    #[test]
    fn open_object_allows_extra_properties() {
        let schema = ParameterSchema::Object {
            description: None,
            properties: BTreeMap::new(),
            required: vec![],
            additional_properties: None,
        };
        assert!(schema.validate(&json!({"anything": true})).is_ok());
    }

    #[test]
    fn integer_bounds_are_enforced() {
        let schema = ParameterSchema::Integer {
            description: None,
            minimum: Some(1.0),
            maximum: Some(10.0),
        };
        assert!(schema.validate(&json!(5)).is_ok());
        assert!(schema.validate(&json!(11)).is_err());
        assert!(schema.validate(&json!(2.5)).is_err());
    }

    #[test]
    fn derives_schema_from_type() {
        let schema = ParameterSchema::for_type::<LookupArgs>().unwrap();
        let ParameterSchema::Object {
            properties,
            required,
            additional_properties,
            ..
        } = &schema
        else {
            panic!("expected object schema, got {schema:?}");
        };

        assert_eq!(additional_properties, &Some(false));
        assert!(required.contains(&"name".to_string()));
        assert!(!required.contains(&"page".to_string()));
        assert_eq!(properties["name"].description(), Some("Customer name."));
        assert!(matches!(properties["page"], ParameterSchema::Integer { .. }));
        assert!(matches!(properties["tags"], ParameterSchema::Array { .. }));

        assert!(schema
            .validate(&json!({"name": "ada", "tags": ["vip"]}))
            .is_ok());
        assert!(schema.validate(&json!({"name": "ada"})).is_err());
    }

    #[test]
    fn optional_property_accepts_null() {
        let schema = ParameterSchema::for_type::<LookupArgs>().unwrap();

        assert!(schema
            .validate(&json!({"name": "ada", "page": null, "tags": []}))
            .is_ok());

        let err = schema
            .validate(&json!({"name": null, "tags": []}))
            .unwrap_err();
        assert_eq!(err.path, "$.name");

        let args: LookupArgs =
            serde_json::from_value(json!({"name": "ada", "page": null, "tags": []})).unwrap();
        assert_eq!(args.page, None);
    }
}
