//! Schema simplification for documentation output
//!
//! Turns a resolved schema into a presentation schema: noise keywords are
//! dropped, every node gets a one-line `_typeDescription`, and nodes without
//! a declared example get a synthesized one.

use crate::resolver::{ref_name, CIRCULAR_REF, ORIGINAL_REF};
use serde_json::{Map, Value};

/// Human-readable type annotation added to every simplified node
pub const TYPE_DESCRIPTION: &str = "_typeDescription";

/// Keywords that carry no meaning for a reader of the catalog
const NOISE_KEYWORDS: &[&str] = &[
    "$schema",
    "id",
    "$id",
    "discriminator",
    "externalDocs",
    "xml",
    "deprecated",
    "readOnly",
    "writeOnly",
];

/// Keywords holding a map of name -> schema
const SCHEMA_MAPS: &[&str] = &["properties", "patternProperties"];

/// Keywords holding a single subschema
const SCHEMA_SLOTS: &[&str] = &[
    "additionalProperties",
    "not",
    "if",
    "then",
    "else",
    "propertyNames",
    "contains",
    "unevaluatedProperties",
];

/// Keywords holding a list of subschemas
const SCHEMA_LISTS: &[&str] = &["allOf", "anyOf", "oneOf"];

/// Objects with no required list expand at most this many properties
const EXAMPLE_PROPERTY_LIMIT: usize = 3;

/// Stateless schema simplifier
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaProcessor;

impl SchemaProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Produce the presentation form of a resolved schema
    ///
    /// Applying this to its own output yields the same value.
    pub fn simplify(&self, schema: &Value) -> Value {
        let Value::Object(map) = schema else {
            return schema.clone();
        };

        let mut simplified = Map::with_capacity(map.len() + 2);
        for (key, value) in map {
            if NOISE_KEYWORDS.contains(&key.as_str()) {
                continue;
            }
            simplified.insert(key.clone(), self.simplify_keyword(key, value));
        }

        if !simplified.contains_key("example") && !simplified.contains_key("examples") {
            simplified.insert("example".to_string(), synthesize_example(&simplified, true));
        }

        let description = describe_type(&Value::Object(simplified.clone()));
        simplified.insert(TYPE_DESCRIPTION.to_string(), Value::String(description));

        Value::Object(simplified)
    }

    fn simplify_keyword(&self, key: &str, value: &Value) -> Value {
        match value {
            Value::Object(members) if SCHEMA_MAPS.contains(&key) => Value::Object(
                members
                    .iter()
                    .map(|(name, schema)| (name.clone(), self.simplify(schema)))
                    .collect(),
            ),
            Value::Object(_) if key == "items" || SCHEMA_SLOTS.contains(&key) => {
                self.simplify(value)
            }
            Value::Array(schemas) if key == "items" || SCHEMA_LISTS.contains(&key) => {
                Value::Array(schemas.iter().map(|s| self.simplify(s)).collect())
            }
            _ => value.clone(),
        }
    }
}

/// One-line description of a schema node
pub fn describe_type(schema: &Value) -> String {
    let Value::Object(map) = schema else {
        return "any".to_string();
    };

    if let Some(pointer) = map.get(ORIGINAL_REF).and_then(Value::as_str) {
        return ref_name(pointer).to_string();
    }

    match map.get("type") {
        Some(Value::String(ty)) if ty == "array" => match map.get("items") {
            Some(Value::Array(items)) => format!(
                "array of [{}]",
                items.iter().map(describe_type).collect::<Vec<_>>().join(", ")
            ),
            Some(items) => format!("array of {}", describe_type(items)),
            None => "array".to_string(),
        },
        Some(Value::String(ty)) if ty == "object" => match map.get("properties") {
            Some(Value::Object(props)) => format!("object with {} properties", props.len()),
            _ => "object".to_string(),
        },
        Some(Value::String(ty)) => ty.clone(),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" | "),
        _ if map.contains_key("allOf") => "combined schema (allOf)".to_string(),
        _ if map.contains_key("anyOf") => "one of several schemas (anyOf)".to_string(),
        _ if map.contains_key("oneOf") => "exactly one schema (oneOf)".to_string(),
        _ => "object".to_string(),
    }
}

/// Build an example value for a schema node
///
/// `top` is true for the node being simplified: it expands its own fields
/// even if it was inlined from a reference. Nested inlined references become
/// `"<Name>"` placeholders.
fn synthesize_example(schema: &Map<String, Value>, top: bool) -> Value {
    if let Some(pointer) = schema.get(ORIGINAL_REF).and_then(Value::as_str) {
        let circular = schema.get(CIRCULAR_REF).and_then(Value::as_bool) == Some(true);
        if !top || circular {
            return Value::String(format!("<{}>", ref_name(pointer)));
        }
    }

    if !top {
        if let Some(example) = schema.get("example") {
            return example.clone();
        }
    }

    let first_enum = schema
        .get("enum")
        .and_then(Value::as_array)
        .and_then(|values| values.first())
        .cloned();

    match primary_type(schema) {
        Some("string") => first_enum.unwrap_or_else(|| {
            let literal = match schema.get("format").and_then(Value::as_str) {
                Some("date-time") => "2025-01-01T12:00:00Z",
                Some("date") => "2025-01-01",
                Some("email") => "example@example.com",
                Some("uuid") => "123e4567-e89b-12d3-a456-426614174000",
                _ => "string value",
            };
            Value::String(literal.to_string())
        }),
        Some("number") | Some("integer") => first_enum.unwrap_or_else(|| Value::from(123)),
        Some("boolean") => Value::Bool(true),
        Some("array") => match schema.get("items") {
            Some(Value::Object(items)) => Value::Array(vec![synthesize_example(items, false)]),
            Some(Value::Array(tuple)) => Value::Array(
                tuple
                    .iter()
                    .filter_map(Value::as_object)
                    .map(|item| synthesize_example(item, false))
                    .collect(),
            ),
            _ => Value::Array(Vec::new()),
        },
        Some("object") => object_example(schema),
        Some(_) => Value::Null,
        None => untyped_example(schema),
    }
}

fn object_example(schema: &Map<String, Value>) -> Value {
    let Some(Value::Object(properties)) = schema.get("properties") else {
        return Value::Object(Map::new());
    };

    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut example = Map::new();
    for name in required {
        if let Some(Value::Object(property)) = properties.get(name) {
            example.insert(name.to_string(), synthesize_example(property, false));
        }
    }

    if example.is_empty() {
        for (name, property) in properties.iter().take(EXAMPLE_PROPERTY_LIMIT) {
            if let Value::Object(property) = property {
                example.insert(name.clone(), synthesize_example(property, false));
            }
        }
    }

    Value::Object(example)
}

fn untyped_example(schema: &Map<String, Value>) -> Value {
    if schema.contains_key("properties") {
        return object_example(schema);
    }

    if let Some(Value::Array(members)) = schema.get("allOf") {
        let mut merged = Map::new();
        for member in members.iter().filter_map(Value::as_object) {
            match synthesize_example(member, false) {
                Value::Object(fields) => merged.extend(fields),
                Value::Null => {}
                other => return other,
            }
        }
        return Value::Object(merged);
    }

    for combinator in ["anyOf", "oneOf"] {
        if let Some(first) = schema
            .get(combinator)
            .and_then(Value::as_array)
            .and_then(|members| members.first())
            .and_then(Value::as_object)
        {
            return synthesize_example(first, false);
        }
    }

    if let Some(value) = schema.get("enum").and_then(Value::as_array).and_then(|v| v.first()) {
        return value.clone();
    }

    Value::Object(Map::new())
}

/// First non-null entry of `type`
fn primary_type(schema: &Map<String, Value>) -> Option<&str> {
    match schema.get("type")? {
        Value::String(ty) => Some(ty.as_str()),
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|ty| *ty != "null")
            .or(Some("null")),
        _ => None,
    }
}
