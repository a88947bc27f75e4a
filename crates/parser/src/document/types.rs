//! Swagger 2.0 / OpenAPI 3.x document model
//!
//! Typed view over the parts of a document the catalog needs. Schema nodes
//! stay as `serde_json::Value` so reference resolution can inline arbitrary
//! JSON Schema keywords and annotate them with trace fields. Anything not
//! modelled explicitly is kept in a flattened `extensions` map.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A JSON-Schema-shaped node
pub type Schema = Value;

/// Document root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiDocument {
    /// Swagger version marker (e.g., "2.0")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swagger: Option<String>,

    /// OpenAPI version marker (e.g., "3.0.1")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openapi: Option<String>,

    /// API metadata
    pub info: Info,

    /// API paths in declaration order
    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,

    /// Swagger 2.0 schema definitions
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub definitions: IndexMap<String, Schema>,

    /// OpenAPI 3.x reusable components
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,

    /// Tag declarations (used for subcategory descriptions)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagInfo>,

    /// Set once references are resolved and operations enriched
    #[serde(rename = "_processed", default, skip_serializing_if = "is_false")]
    pub processed: bool,

    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

/// API information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,

    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

/// Declared tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Reusable components (OpenAPI 3.x)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub schemas: IndexMap<String, Schema>,

    /// parameters, requestBodies, responses, securitySchemes, ...
    #[serde(flatten)]
    pub other: IndexMap<String, Value>,
}

/// Operations bound to one path template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,

    /// Parameters shared by every operation on this path
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterOrRef>,

    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

/// HTTP method of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

/// One HTTP method on one path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(
        rename = "operationId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub operation_id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterOrRef>,

    /// OpenAPI 3.x request body
    #[serde(
        rename = "requestBody",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub request_body: Option<RequestBody>,

    /// Status code -> response, in declaration order
    #[serde(default)]
    pub responses: IndexMap<String, Response>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub deprecated: bool,

    /// Owning path template (derived during enrichment)
    #[serde(rename = "_path", default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Uppercased HTTP method (derived during enrichment)
    #[serde(rename = "_method", default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

/// A parameter, an unresolved reference to one, or a resolution placeholder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterOrRef {
    Reference {
        #[serde(rename = "$ref")]
        ref_path: String,
    },

    Parameter(Box<Parameter>),

    /// Anything else, e.g. a diagnostic placeholder left by the resolver
    Other(Value),
}

/// Where a parameter travels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterLocation {
    Query,
    Header,
    Path,
    Cookie,
    Body,
    FormData,
}

/// Parameter definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,

    #[serde(rename = "in")]
    pub location: ParameterLocation,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub required: bool,

    /// Swagger 2.0 inline type
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Swagger 2.0 array element type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Schema>,

    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,

    /// Body parameter (2.0) or parameter schema (3.x)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub deprecated: bool,

    /// Human-readable type (derived during enrichment)
    #[serde(
        rename = "_typeDescription",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub type_description: Option<String>,

    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

/// Request body (OpenAPI 3.x)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub content: IndexMap<String, MediaType>,

    #[serde(default)]
    pub required: bool,

    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

/// Response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Swagger 2.0 response schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,

    /// OpenAPI 3.x content types
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,

    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

/// Media type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,

    /// OpenAPI 3.x named examples (`{summary, value}` objects)
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, Value>,

    #[serde(flatten)]
    pub extensions: IndexMap<String, Value>,
}

/// Declared document flavour
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecVersion {
    Swagger(String),
    OpenApi(String),
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ApiDocument {
    /// Version marker, preferring `openapi` when both are present
    pub fn spec_version(&self) -> Option<SpecVersion> {
        match (&self.openapi, &self.swagger) {
            (Some(v), _) => Some(SpecVersion::OpenApi(v.clone())),
            (None, Some(v)) => Some(SpecVersion::Swagger(v.clone())),
            (None, None) => None,
        }
    }

    /// Description of a declared tag
    pub fn tag_description(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.name == name)
            .and_then(|t| t.description.as_deref())
    }

    /// Count operations across all paths
    pub fn operation_count(&self) -> usize {
        self.paths.values().map(|p| p.operations().count()).sum()
    }
}

impl HttpMethod {
    /// Iteration order for operations within a path item
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Patch,
        HttpMethod::Trace,
    ];

    /// Lowercase key as it appears in a path item
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
            HttpMethod::Trace => "trace",
        }
    }

    pub fn as_upper(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_upper())
    }
}

impl PathItem {
    fn slot(&self, method: HttpMethod) -> &Option<Operation> {
        match method {
            HttpMethod::Get => &self.get,
            HttpMethod::Post => &self.post,
            HttpMethod::Put => &self.put,
            HttpMethod::Delete => &self.delete,
            HttpMethod::Options => &self.options,
            HttpMethod::Head => &self.head,
            HttpMethod::Patch => &self.patch,
            HttpMethod::Trace => &self.trace,
        }
    }

    /// Get the operation for a method
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        self.slot(method).as_ref()
    }

    /// Declared operations in `HttpMethod::ALL` order
    pub fn operations(&self) -> impl Iterator<Item = (HttpMethod, &Operation)> + '_ {
        HttpMethod::ALL
            .into_iter()
            .filter_map(move |m| self.operation(m).map(|op| (m, op)))
    }

    /// Mutable access to declared operations in `HttpMethod::ALL` order
    pub fn operations_mut(&mut self) -> impl Iterator<Item = (HttpMethod, &mut Operation)> + '_ {
        [
            (HttpMethod::Get, &mut self.get),
            (HttpMethod::Post, &mut self.post),
            (HttpMethod::Put, &mut self.put),
            (HttpMethod::Delete, &mut self.delete),
            (HttpMethod::Options, &mut self.options),
            (HttpMethod::Head, &mut self.head),
            (HttpMethod::Patch, &mut self.patch),
            (HttpMethod::Trace, &mut self.trace),
        ]
        .into_iter()
        .filter_map(|(m, op)| op.as_mut().map(|op| (m, op)))
    }
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Path => "path",
            ParameterLocation::Cookie => "cookie",
            ParameterLocation::Body => "body",
            ParameterLocation::FormData => "formData",
        }
    }
}

impl ParameterOrRef {
    /// The parameter, if this entry is a concrete one
    pub fn as_parameter(&self) -> Option<&Parameter> {
        match self {
            ParameterOrRef::Parameter(p) => Some(p),
            _ => None,
        }
    }
}

impl Response {
    /// Schema from Swagger 2.0 `schema`, else the JSON (or first) media type
    pub fn primary_schema(&self) -> Option<&Schema> {
        self.schema
            .as_ref()
            .or_else(|| primary_media_schema(&self.content))
    }
}

impl RequestBody {
    /// Schema of the JSON (or first) media type
    pub fn primary_schema(&self) -> Option<&Schema> {
        primary_media_schema(&self.content)
    }
}

fn primary_media_schema(content: &IndexMap<String, MediaType>) -> Option<&Schema> {
    content
        .get("application/json")
        .and_then(|m| m.schema.as_ref())
        .or_else(|| content.values().find_map(|m| m.schema.as_ref()))
}
