//! Catalog data model
//!
//! The presentation-ready shape produced by the mapper: an ordered list of
//! categories, each holding endpoints and optional subcategories. A catalog
//! is built once per load and replaced wholesale on refresh.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Compiled API catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCatalog {
    /// Categories in display order
    pub categories: Vec<ApiCategory>,

    /// Plain-language goals mapped to the endpoints that serve them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub intent_mappings: Vec<IntentMapping>,
}

/// Top-level grouping of endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiCategory {
    /// Display name (e.g., "Orders")
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Endpoints directly under this category
    #[serde(default)]
    pub endpoints: Vec<CatalogEndpoint>,

    /// Optional nested groupings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subcategories: Vec<ApiSubcategory>,
}

/// Nested grouping inside a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSubcategory {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub endpoints: Vec<CatalogEndpoint>,
}

/// One operation, ready for presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEndpoint {
    /// Catalog-wide unique identifier (e.g., "orders_getOrder")
    pub id: String,

    /// operationId as declared (or generated from method and path)
    pub original_operation_id: String,

    /// Display name (summary, else operationId)
    pub name: String,

    /// Uppercased HTTP method
    pub method: String,

    /// Path template (e.g., "/orders/v0/orders/{orderId}")
    pub path: String,

    #[serde(default)]
    pub description: String,

    /// One-line statement of what the endpoint is for
    #[serde(default)]
    pub purpose: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default)]
    pub deprecated: bool,

    /// API version from the document's info block
    #[serde(default)]
    pub version: String,

    /// Identity of the document this endpoint came from
    #[serde(default)]
    pub source: String,

    #[serde(default)]
    pub parameters: Vec<EndpointParameter>,

    #[serde(default)]
    pub responses: Vec<EndpointResponse>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_endpoints: Vec<RelatedEndpoint>,

    /// Short statements of what callers typically use the endpoint for
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub common_use_cases: Vec<String>,

    /// Request/response pairs declared by the document
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<UsageExample>,
}

/// Simplified parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointParameter {
    pub name: String,

    /// Location: path, query, header, cookie, body, formData
    pub location: String,

    #[serde(default)]
    pub required: bool,

    /// Human-readable type (e.g., "string (date-time)", "array of Widget")
    pub type_description: String,

    #[serde(default)]
    pub description: String,

    /// Simplified schema, when the parameter carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

/// Simplified response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointResponse {
    /// Status code as declared ("200", "default", ...)
    pub status_code: String,

    #[serde(default)]
    pub description: String,

    /// Simplified response schema with synthesized example
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

/// Pointer to a sibling endpoint in the same document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedEndpoint {
    pub id: String,
    pub relationship: String,
}

/// Sample request and response for one endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageExample {
    pub scenario: String,
    pub request: Value,
    pub response: Value,
}

/// A goal phrased as "I want to ..." and the endpoint that serves it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentMapping {
    pub intent: String,
    pub endpoint_id: String,
    pub reason: String,
}

/// Result of an endpoint lookup
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointMatch<'a> {
    pub endpoint: &'a CatalogEndpoint,

    /// "Category" or "Category > Subcategory"
    pub category: String,
}

impl ApiCatalog {
    /// Find a category by name, ignoring ASCII case
    pub fn category_by_name(&self, name: &str) -> Option<&ApiCategory> {
        self.categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Find an endpoint by id anywhere in the catalog
    pub fn endpoint_by_id(&self, id: &str) -> Option<EndpointMatch<'_>> {
        for category in &self.categories {
            if let Some(endpoint) = category.endpoints.iter().find(|e| e.id == id) {
                return Some(EndpointMatch {
                    endpoint,
                    category: category.name.clone(),
                });
            }

            for subcategory in &category.subcategories {
                if let Some(endpoint) = subcategory.endpoints.iter().find(|e| e.id == id) {
                    return Some(EndpointMatch {
                        endpoint,
                        category: format!("{} > {}", category.name, subcategory.name),
                    });
                }
            }
        }

        None
    }

    /// Iterate every endpoint, category endpoints before subcategory endpoints
    pub fn endpoints(&self) -> impl Iterator<Item = &CatalogEndpoint> {
        self.categories.iter().flat_map(|c| c.all_endpoints())
    }

    /// Count endpoints across categories and subcategories
    pub fn total_endpoints(&self) -> usize {
        self.categories.iter().map(ApiCategory::endpoint_count).sum()
    }

    /// Intent mappings containing every word of `query`, ignoring case
    ///
    /// An empty query matches every mapping.
    pub fn intents_matching(&self, query: &str) -> Vec<&IntentMapping> {
        let words: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();

        self.intent_mappings
            .iter()
            .filter(|m| {
                let intent = m.intent.to_lowercase();
                words.iter().all(|w| intent.contains(w.as_str()))
            })
            .collect()
    }
}

impl ApiCategory {
    /// Create an empty category
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            endpoints: Vec::new(),
            subcategories: Vec::new(),
        }
    }

    /// Own endpoints followed by every subcategory's endpoints
    pub fn all_endpoints(&self) -> impl Iterator<Item = &CatalogEndpoint> {
        self.endpoints
            .iter()
            .chain(self.subcategories.iter().flat_map(|s| s.endpoints.iter()))
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
            + self
                .subcategories
                .iter()
                .map(|s| s.endpoints.len())
                .sum::<usize>()
    }
}
