//! Local `$ref` resolution
//!
//! Walks a JSON fragment depth-first and replaces every `{"$ref": "#/..."}`
//! node with the recursively resolved target, annotated with `_originalRef`.
//!
//! Cycle detection is per path: the walk carries the set of pointers that
//! are ancestors of the current node. A pointer that reappears within its
//! own ancestry becomes a `_circularRef` marker; the same pointer reached
//! along two unrelated paths is expanded independently each time. There is
//! no cross-path memoization.
//!
//! The walk never mutates its input. Dangling pointers, external pointers
//! and runaway nesting all become diagnostic placeholder schemas instead of
//! errors.

use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::warn;

/// Default ceiling on walk nesting
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Pointer an inlined node came from
pub const ORIGINAL_REF: &str = "_originalRef";
/// Marks the point where a cycle was broken
pub const CIRCULAR_REF: &str = "_circularRef";
/// Marks a pointer that did not address anything in the document
pub const UNRESOLVED_REF: &str = "_unresolvedRef";
/// Marks a pointer into another document or URL
pub const EXTERNAL_REF: &str = "_externalRef";
/// Marks a subtree cut off by the depth ceiling
pub const DEPTH_EXCEEDED: &str = "_depthExceeded";

/// Schema keywords whose values are instance data, never schemas
const DATA_KEYWORDS: &[&str] = &["example", "enum", "default", "const"];

/// Keys whose object values are keyed by user-chosen names
const NAMED_MAPS: &[&str] = &[
    "properties",
    "patternProperties",
    "definitions",
    "$defs",
    "schemas",
    "paths",
    "responses",
    "parameters",
    "requestBodies",
    "headers",
    "content",
    "examples",
    "securitySchemes",
    "securityDefinitions",
];

/// Resolves local references against one document root
pub struct ReferenceResolver<'a> {
    root: &'a Value,
    max_depth: usize,
}

/// Ancestry of the node currently being walked
#[derive(Debug, Default)]
struct Trail {
    /// Property names and pointers traversed so far
    context: Vec<String>,
    /// Pointers currently being expanded
    visited: HashSet<String>,
}

impl Trail {
    fn enter(&mut self, step: impl Into<String>) {
        self.context.push(step.into());
    }

    fn leave(&mut self) {
        self.context.pop();
    }

    fn push_ref(&mut self, pointer: &str) {
        self.visited.insert(pointer.to_string());
        self.context.push(pointer.to_string());
    }

    fn pop_ref(&mut self, pointer: &str) {
        self.visited.remove(pointer);
        self.context.pop();
    }

    fn describe(&self) -> String {
        if self.context.is_empty() {
            "<root>".to_string()
        } else {
            self.context.join(" -> ")
        }
    }
}

impl<'a> ReferenceResolver<'a> {
    /// Create a resolver for pointers into `root`
    pub fn new(root: &'a Value) -> Self {
        Self {
            root,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Override the nesting ceiling
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Resolve every reference reachable from `fragment`
    pub fn resolve(&self, fragment: &Value) -> Value {
        let mut trail = Trail::default();
        self.walk(fragment, &mut trail, 0, false)
    }

    /// Resolve a single pointer as if it appeared as `{"$ref": pointer}`
    pub fn resolve_pointer(&self, pointer: &str) -> Value {
        let mut node = Map::new();
        node.insert("$ref".to_string(), Value::String(pointer.to_string()));
        self.resolve(&Value::Object(node))
    }

    fn walk(&self, node: &Value, trail: &mut Trail, depth: usize, named: bool) -> Value {
        if depth > self.max_depth {
            let context = trail.describe();
            warn!(%context, max_depth = self.max_depth, "Maximum reference depth exceeded");
            return marker(
                format!("Maximum reference depth exceeded at {}", context),
                None,
                DEPTH_EXCEEDED,
            );
        }

        match node {
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        trail.enter(format!("[{}]", i));
                        let resolved = self.walk(item, trail, depth + 1, false);
                        trail.leave();
                        resolved
                    })
                    .collect(),
            ),
            Value::Object(map) => {
                if !named {
                    if let Some(Value::String(pointer)) = map.get("$ref") {
                        return self.expand(pointer, map, trail, depth);
                    }
                }
                self.walk_members(map, trail, depth, named)
            }
            other => other.clone(),
        }
    }

    fn walk_members(
        &self,
        map: &Map<String, Value>,
        trail: &mut Trail,
        depth: usize,
        named: bool,
    ) -> Value {
        let mut resolved = Map::with_capacity(map.len());
        for (key, value) in map {
            if !named && DATA_KEYWORDS.contains(&key.as_str()) {
                resolved.insert(key.clone(), value.clone());
                continue;
            }

            let child_named = !named && NAMED_MAPS.contains(&key.as_str()) && value.is_object();
            trail.enter(key.as_str());
            let child = self.walk(value, trail, depth + 1, child_named);
            trail.leave();
            resolved.insert(key.clone(), child);
        }
        Value::Object(resolved)
    }

    fn expand(
        &self,
        pointer: &str,
        node: &Map<String, Value>,
        trail: &mut Trail,
        depth: usize,
    ) -> Value {
        if !pointer.starts_with('#') {
            warn!(%pointer, context = %trail.describe(), "External reference not resolved");
            return marker(
                format!("External reference: {} (not resolved)", pointer),
                Some(pointer),
                EXTERNAL_REF,
            );
        }

        if trail.visited.contains(pointer) {
            warn!(%pointer, context = %trail.describe(), "Circular reference detected");
            return marker(
                format!("Circular reference to {}", pointer),
                Some(pointer),
                CIRCULAR_REF,
            );
        }

        let target = match lookup(self.root, pointer) {
            Ok(target) => target,
            Err(reason) => {
                warn!(%pointer, context = %trail.describe(), %reason, "Reference not found");
                return marker(
                    format!("Unresolved reference: {} ({})", pointer, reason),
                    Some(pointer),
                    UNRESOLVED_REF,
                );
            }
        };

        trail.push_ref(pointer);
        let mut resolved = self.walk(target, trail, depth + 1, false);

        if let Value::Object(inlined) = &mut resolved {
            // Keywords beside `$ref` refine the target
            for (key, value) in node {
                if key == "$ref" {
                    continue;
                }
                let sibling = if DATA_KEYWORDS.contains(&key.as_str()) {
                    value.clone()
                } else {
                    trail.enter(key.as_str());
                    let sibling = self.walk(value, trail, depth + 1, false);
                    trail.leave();
                    sibling
                };
                inlined.insert(key.clone(), sibling);
            }
            inlined.insert(ORIGINAL_REF.to_string(), Value::String(pointer.to_string()));
        }
        trail.pop_ref(pointer);

        resolved
    }
}

/// Whether a resolved node is a cycle-break marker
pub fn is_circular(node: &Value) -> bool {
    node.get(CIRCULAR_REF).and_then(Value::as_bool) == Some(true)
}

/// Last segment of a pointer, e.g. `#/definitions/Widget` -> `Widget`
pub fn ref_name(pointer: &str) -> &str {
    pointer
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty() && *s != "#")
        .unwrap_or("object")
}

/// Navigate a local pointer (`#/a/b/0`) from the document root
fn lookup<'v>(root: &'v Value, pointer: &str) -> Result<&'v Value, String> {
    let path = pointer.trim_start_matches('#');
    if path.is_empty() {
        return Ok(root);
    }

    let path = path
        .strip_prefix('/')
        .ok_or_else(|| "pointer must start with '#/'".to_string())?;

    let mut current = root;
    for raw in path.split('/') {
        let segment = decode_segment(raw);
        current = match current {
            Value::Object(map) => map
                .get(&segment)
                .ok_or_else(|| format!("segment '{}' not found", segment))?,
            Value::Array(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i))
                .ok_or_else(|| format!("index '{}' out of range", segment))?,
            _ => return Err(format!("segment '{}' does not address a container", segment)),
        };
    }

    Ok(current)
}

/// Percent-decode, then undo JSON pointer escaping
fn decode_segment(raw: &str) -> String {
    let decoded = urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    decoded.replace("~1", "/").replace("~0", "~")
}

/// Diagnostic placeholder schema
fn marker(description: String, pointer: Option<&str>, tag: &str) -> Value {
    let mut map = Map::new();
    map.insert("type".to_string(), Value::String("object".to_string()));
    map.insert("description".to_string(), Value::String(description));
    if let Some(pointer) = pointer {
        map.insert(ORIGINAL_REF.to_string(), Value::String(pointer.to_string()));
    }
    map.insert(tag.to_string(), Value::Bool(true));
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn widget_doc() -> Value {
        json!({
            "definitions": {
                "Widget": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "string"},
                        "parent": {"$ref": "#/definitions/Widget"}
                    },
                    "required": ["id"]
                }
            }
        })
    }

    #[test]
    fn test_no_refs_is_identity() {
        let doc = json!({});
        let schema = json!({
            "type": "object",
            "properties": {"a": {"type": "array", "items": {"type": "integer"}}},
            "enum": [{"$ref": "not-a-ref"}]
        });

        assert_eq!(ReferenceResolver::new(&doc).resolve(&schema), schema);
    }

    #[test]
    fn test_simple_ref_is_inlined_and_traced() {
        let doc = json!({"components": {"schemas": {"Money": {"type": "number"}}}});
        let resolved = ReferenceResolver::new(&doc)
            .resolve(&json!({"items": {"$ref": "#/components/schemas/Money"}}));

        assert_eq!(
            resolved,
            json!({"items": {"type": "number", "_originalRef": "#/components/schemas/Money"}})
        );
    }

    #[test]
    fn test_self_reference_breaks_once() {
        let doc = widget_doc();
        let resolved = ReferenceResolver::new(&doc).resolve_pointer("#/definitions/Widget");

        assert_eq!(resolved["_originalRef"], "#/definitions/Widget");
        assert_eq!(resolved["properties"]["id"], json!({"type": "string"}));
        let parent = &resolved["properties"]["parent"];
        assert!(is_circular(parent));
        assert_eq!(parent["_originalRef"], "#/definitions/Widget");
        assert!(parent.get("properties").is_none());
    }

    #[test]
    fn test_mutual_cycle_terminates() {
        let doc = json!({
            "definitions": {
                "A": {"properties": {"b": {"$ref": "#/definitions/B"}}},
                "B": {"properties": {"a": {"$ref": "#/definitions/A"}}}
            }
        });
        let resolved = ReferenceResolver::new(&doc).resolve_pointer("#/definitions/A");

        let b = &resolved["properties"]["b"];
        assert_eq!(b["_originalRef"], "#/definitions/B");
        let back = &b["properties"]["a"];
        assert!(is_circular(back));
        assert_eq!(back["_originalRef"], "#/definitions/A");
    }

    #[test]
    fn test_sibling_paths_are_not_circular() {
        let doc = json!({"definitions": {"Id": {"type": "string"}}});
        let resolved = ReferenceResolver::new(&doc).resolve(&json!({
            "properties": {
                "left": {"$ref": "#/definitions/Id"},
                "right": {"$ref": "#/definitions/Id"}
            }
        }));

        assert!(!is_circular(&resolved["properties"]["left"]));
        assert!(!is_circular(&resolved["properties"]["right"]));
        assert_eq!(resolved["properties"]["right"]["type"], "string");
    }

    #[test]
    fn test_refs_in_combinators_and_keywords() {
        let doc = json!({"definitions": {"S": {"type": "string"}}});
        let r = json!({"$ref": "#/definitions/S"});
        let resolved = ReferenceResolver::new(&doc).resolve(&json!({
            "allOf": [r.clone()],
            "anyOf": [r.clone()],
            "oneOf": [r.clone()],
            "not": r.clone(),
            "if": r.clone(),
            "then": r.clone(),
            "else": r.clone(),
            "additionalProperties": r.clone(),
            "patternProperties": {"^x-": r.clone()},
            "propertyNames": r.clone(),
            "contains": r.clone(),
            "unevaluatedProperties": r.clone(),
            "items": [r.clone(), r]
        }));

        let text = resolved.to_string();
        assert!(!text.contains("\"$ref\""), "unresolved ref left in {}", text);
        assert_eq!(resolved["patternProperties"]["^x-"]["type"], "string");
        assert_eq!(resolved["items"][1]["type"], "string");
    }

    #[test]
    fn test_dangling_pointer_becomes_placeholder() {
        let doc = json!({"definitions": {}});
        let resolved = ReferenceResolver::new(&doc).resolve_pointer("#/definitions/Gone");

        assert_eq!(resolved["type"], "object");
        assert_eq!(resolved[UNRESOLVED_REF], true);
        assert_eq!(resolved["_originalRef"], "#/definitions/Gone");
        assert!(resolved["description"]
            .as_str()
            .unwrap()
            .starts_with("Unresolved reference: #/definitions/Gone"));
    }

    #[test]
    fn test_external_pointer_is_surfaced() {
        let doc = json!({});
        let resolved = ReferenceResolver::new(&doc).resolve_pointer("common.json#/Money");

        assert_eq!(resolved[EXTERNAL_REF], true);
        assert_eq!(
            resolved["description"],
            "External reference: common.json#/Money (not resolved)"
        );
    }

    #[test]
    fn test_percent_and_tilde_decoding() {
        let doc = json!({"paths": {"/a/{id}": {"x": {"type": "boolean"}}}});
        let resolved =
            ReferenceResolver::new(&doc).resolve_pointer("#/paths/~1a~1%7Bid%7D/x");

        assert_eq!(resolved["type"], "boolean");
    }

    #[test]
    fn test_depth_ceiling() {
        let doc = json!({
            "definitions": {
                "L1": {"items": {"$ref": "#/definitions/L2"}},
                "L2": {"items": {"$ref": "#/definitions/L3"}},
                "L3": {"items": {"type": "string"}}
            }
        });
        let resolved = ReferenceResolver::new(&doc)
            .with_max_depth(3)
            .resolve_pointer("#/definitions/L1");

        assert!(resolved.to_string().contains(DEPTH_EXCEEDED));
    }

    #[test]
    fn test_resolution_is_idempotent_and_pure() {
        let doc = widget_doc();
        let before = doc.clone();
        let resolver = ReferenceResolver::new(&doc);

        let once = resolver.resolve(&doc);
        let twice = ReferenceResolver::new(&once).resolve(&once);

        assert_eq!(once, twice);
        assert_eq!(doc, before);
    }

    #[test]
    fn test_named_maps_do_not_treat_keys_as_keywords() {
        let doc = json!({"definitions": {"S": {"type": "string"}}});
        let resolved = ReferenceResolver::new(&doc).resolve(&json!({
            "properties": {
                "default": {"$ref": "#/definitions/S"},
                "example": {"$ref": "#/definitions/S"}
            },
            "example": {"$ref": "#/definitions/S"}
        }));

        assert_eq!(resolved["properties"]["default"]["type"], "string");
        assert_eq!(resolved["properties"]["example"]["type"], "string");
        assert_eq!(resolved["example"], json!({"$ref": "#/definitions/S"}));
    }

    #[test]
    fn test_component_schemas_named_like_keywords_are_resolved() {
        let doc = json!({
            "components": {
                "schemas": {
                    "Money": {"type": "number"},
                    "default": {"properties": {"m": {"$ref": "#/components/schemas/Money"}}},
                    "enum": {"items": {"$ref": "#/components/schemas/Money"}}
                },
                "responses": {
                    "example": {"description": "ok", "schema": {"$ref": "#/components/schemas/Money"}}
                }
            }
        });
        let resolved = ReferenceResolver::new(&doc).resolve(&doc);

        let text = resolved.to_string();
        assert!(!text.contains("\"$ref\""), "unresolved ref left in {}", text);
        let schemas = &resolved["components"]["schemas"];
        assert_eq!(schemas["default"]["properties"]["m"]["type"], "number");
        assert_eq!(schemas["enum"]["items"]["type"], "number");
        assert_eq!(resolved["components"]["responses"]["example"]["schema"]["type"], "number");
    }

    #[test]
    fn test_siblings_refine_target() {
        let doc = json!({"definitions": {"S": {"type": "string", "description": "base"}}});
        let resolved = ReferenceResolver::new(&doc)
            .resolve(&json!({"$ref": "#/definitions/S", "description": "override"}));

        assert_eq!(resolved["description"], "override");
        assert_eq!(resolved["type"], "string");
    }

    #[test]
    fn test_ref_name() {
        assert_eq!(ref_name("#/components/schemas/Widget"), "Widget");
        assert_eq!(ref_name("#"), "object");
    }
}
