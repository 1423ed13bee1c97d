//! Structural validation of protocol descriptions.
//!
//! Descriptions are checked against an embedded JSON Schema before they are
//! deserialized, so a malformed file is reported with a path into the
//! document rather than a bare serde message.

use jsonschema::Validator;
use serde_json::{Map, Value};

use crate::error::{Result, SchemaError};

const DESCRIPTION_SCHEMA: &str = r##"{
    "$schema": "https://json-schema.org/draft/2020-12/schema",
    "type": "object",
    "properties": {
        "structs": {
            "type": "object",
            "additionalProperties": { "$ref": "#/$defs/fields" }
        },
        "packets": {
            "type": "array",
            "items": { "$ref": "#/$defs/packet" }
        }
    },
    "required": ["packets"],
    "$defs": {
        "fields": {
            "type": "array",
            "items": { "$ref": "#/$defs/field" }
        },
        "length": {
            "oneOf": [
                { "type": "integer", "minimum": 0 },
                { "type": "string", "minLength": 1 }
            ]
        },
        "packet": {
            "type": "object",
            "properties": {
                "direction": { "type": "string" },
                "family": { "type": "string" },
                "action": { "type": "string" },
                "fields": { "$ref": "#/$defs/fields" }
            },
            "required": ["direction", "family", "action"]
        },
        "kind": {
            "type": "object",
            "properties": {
                "type": {
                    "enum": [
                        "byte", "char", "short", "three", "int",
                        "string", "prefix_string", "break_string", "end_string",
                        "break", "struct", "array"
                    ]
                },
                "length": { "$ref": "#/$defs/length" },
                "fields": { "$ref": "#/$defs/fields" },
                "ref": { "type": "string", "minLength": 1 },
                "element": { "$ref": "#/$defs/element" },
                "delimited": { "type": "boolean" }
            },
            "required": ["type"],
            "allOf": [
                {
                    "if": { "properties": { "type": { "const": "string" } } },
                    "then": { "required": ["length"] }
                },
                {
                    "if": { "properties": { "type": { "const": "array" } } },
                    "then": { "required": ["element"] }
                },
                {
                    "if": { "properties": { "type": { "const": "struct" } } },
                    "then": {
                        "oneOf": [
                            { "required": ["fields"] },
                            { "required": ["ref"] }
                        ]
                    }
                }
            ]
        },
        "field": {
            "allOf": [{ "$ref": "#/$defs/kind" }],
            "properties": {
                "name": { "type": "string", "minLength": 1 },
                "sensitive": { "type": "boolean" }
            },
            "required": ["name"]
        },
        "element": {
            "allOf": [{ "$ref": "#/$defs/kind" }]
        }
    }
}"##;

/// Definitions whose objects are closed to unknown keys in strict mode.
const SEALED_DEFS: [&str; 3] = ["packet", "field", "element"];

/// Maximum number of violations folded into one error message.
const MAX_REPORTED: usize = 4;

/// Check a parsed description against the embedded description schema.
pub(crate) fn validate_description(description: &Value, strict_mode: bool) -> Result<()> {
    let validator = description_validator(strict_mode)?;

    let mut errors = validator.iter_errors(description);
    if let Some(first) = errors.next() {
        let mut message = first.to_string();
        for err in errors.take(MAX_REPORTED - 1) {
            message.push_str("; ");
            message.push_str(&err.to_string());
        }
        return Err(SchemaError::CompileFailed(message));
    }

    Ok(())
}

fn description_validator(strict_mode: bool) -> Result<Validator> {
    let mut schema: Value = serde_json::from_str(DESCRIPTION_SCHEMA)?;
    if strict_mode {
        apply_strict_mode(&mut schema);
    }

    jsonschema::validator_for(&schema).map_err(|err| SchemaError::CompileFailed(err.to_string()))
}

/// Close the root object and every sealed definition to unknown keys.
///
/// `unevaluatedProperties` rather than `additionalProperties`, since field
/// and element keys are declared through `allOf` into the shared kind.
fn apply_strict_mode(schema: &mut Value) {
    let Value::Object(root) = schema else {
        return;
    };
    seal(root);

    if let Some(Value::Object(defs)) = root.get_mut("$defs") {
        for name in SEALED_DEFS {
            if let Some(Value::Object(def)) = defs.get_mut(name) {
                seal(def);
            }
        }
    }
}

fn seal(map: &mut Map<String, Value>) {
    map.entry("unevaluatedProperties")
        .or_insert(Value::Bool(false));
}
