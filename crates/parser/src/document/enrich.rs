//! Operation enrichment
//!
//! Runs on a resolved document. Each operation learns its own path template
//! and uppercased method, inherits the path item's shared parameters, and
//! gets a human-readable type description on every parameter.

use super::types::{ApiDocument, Parameter, ParameterLocation, ParameterOrRef};
use crate::schema::describe_type;
use serde_json::Value;

/// Enrich every operation of every path in place
pub fn enrich_operations(document: &mut ApiDocument) {
    for (template, item) in document.paths.iter_mut() {
        let shared = item.parameters.clone();

        for (method, operation) in item.operations_mut() {
            operation.path = Some(template.clone());
            operation.method = Some(method.as_upper().to_string());

            let inherited: Vec<ParameterOrRef> = shared
                .iter()
                .filter(|p| match p.as_parameter() {
                    Some(param) => !declares(&operation.parameters, &param.name, param.location),
                    None => true,
                })
                .cloned()
                .collect();
            if !inherited.is_empty() {
                let own = std::mem::take(&mut operation.parameters);
                operation.parameters = inherited.into_iter().chain(own).collect();
            }

            for parameter in operation.parameters.iter_mut() {
                if let ParameterOrRef::Parameter(param) = parameter {
                    param.type_description = Some(describe_parameter(param));
                }
            }
        }
    }
}

fn declares(parameters: &[ParameterOrRef], name: &str, location: ParameterLocation) -> bool {
    parameters
        .iter()
        .filter_map(ParameterOrRef::as_parameter)
        .any(|p| p.name == name && p.location == location)
}

/// Human-readable parameter type, e.g. `string (date-time) - one of [A, B]`
pub fn describe_parameter(param: &Parameter) -> String {
    let mut description = match (&param.schema, param.param_type.as_deref()) {
        (Some(schema), _) => describe_type(schema),
        (None, Some("array")) => match &param.items {
            Some(items) => format!("array of {}", describe_type(items)),
            None => "array".to_string(),
        },
        (None, Some(ty)) => ty.to_string(),
        (None, None) => "any".to_string(),
    };

    let format = param.format.as_deref().or_else(|| {
        param
            .schema
            .as_ref()
            .and_then(|s| s.get("format"))
            .and_then(Value::as_str)
    });
    if let Some(format) = format {
        description.push_str(&format!(" ({})", format));
    }

    let values = if param.enum_values.is_empty() {
        param
            .schema
            .as_ref()
            .and_then(|s| s.get("enum"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    } else {
        param.enum_values.as_slice()
    };
    if !values.is_empty() {
        let listed: Vec<String> = values.iter().map(display_value).collect();
        description.push_str(&format!(" - one of [{}]", listed.join(", ")));
    }

    description
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn param(value: Value) -> Parameter {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_describe_primitive_with_format() {
        let p = param(json!({"name": "createdAfter", "in": "query", "type": "string", "format": "date-time"}));
        assert_eq!(describe_parameter(&p), "string (date-time)");
    }

    #[test]
    fn test_describe_enum() {
        let p = param(json!({
            "name": "status",
            "in": "query",
            "type": "string",
            "enum": ["Pending", "Shipped", "Canceled"]
        }));
        assert_eq!(
            describe_parameter(&p),
            "string - one of [Pending, Shipped, Canceled]"
        );
    }

    #[test]
    fn test_describe_array_and_schema() {
        let p = param(json!({
            "name": "ids",
            "in": "query",
            "type": "array",
            "items": {"type": "string"}
        }));
        assert_eq!(describe_parameter(&p), "array of string");

        let p = param(json!({
            "name": "body",
            "in": "body",
            "schema": {"type": "object", "_originalRef": "#/definitions/CreateOrder"}
        }));
        assert_eq!(describe_parameter(&p), "CreateOrder");

        let p = param(json!({
            "name": "limit",
            "in": "query",
            "schema": {"type": "integer", "format": "int32", "enum": [10, 20]}
        }));
        assert_eq!(describe_parameter(&p), "integer (int32) - one of [10, 20]");
    }

    #[test]
    fn test_enrich_sets_derived_fields_and_merges_shared() {
        let mut doc: ApiDocument = serde_json::from_value(json!({
            "swagger": "2.0",
            "info": {"title": "T", "version": "1"},
            "paths": {
                "/orders/{orderId}": {
                    "parameters": [
                        {"name": "orderId", "in": "path", "required": true, "type": "string"},
                        {"name": "marketplace", "in": "query", "type": "string"}
                    ],
                    "get": {
                        "parameters": [
                            {"name": "marketplace", "in": "query", "type": "integer"}
                        ],
                        "responses": {}
                    },
                    "delete": {"responses": {}}
                }
            }
        }))
        .unwrap();

        enrich_operations(&mut doc);

        let item = &doc.paths["/orders/{orderId}"];
        let get = item.get.as_ref().unwrap();
        assert_eq!(get.path.as_deref(), Some("/orders/{orderId}"));
        assert_eq!(get.method.as_deref(), Some("GET"));

        let names: Vec<(&str, &str)> = get
            .parameters
            .iter()
            .filter_map(ParameterOrRef::as_parameter)
            .map(|p| (p.name.as_str(), p.type_description.as_deref().unwrap()))
            .collect();
        assert_eq!(names, vec![("orderId", "string"), ("marketplace", "integer")]);

        let delete = item.delete.as_ref().unwrap();
        assert_eq!(delete.method.as_deref(), Some("DELETE"));
        assert_eq!(delete.parameters.len(), 2);
    }
}
