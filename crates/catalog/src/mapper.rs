//! Processed documents -> ApiCatalog
//!
//! Every operation of every processed document becomes one `CatalogEndpoint`.
//! Grouping into categories follows [`GroupBy`]; endpoint ids are
//! `<categoryPrefix>_<operationId>` and must be unique catalog-wide.

use api_catalog_common::{
    ApiCatalog, ApiCategory, ApiSubcategory, CatalogConfig, CatalogEndpoint, CatalogError,
    CollisionPolicy, EndpointParameter, EndpointResponse, GroupBy, GroupingSettings,
    RelatedEndpoint, Result, UsageExample,
};
use api_catalog_parser::naming::{
    category_prefix, first_sentence, generate_operation_id, path_prefix, resource_name,
    resource_path, strip_title_prefix,
};
use api_catalog_parser::{
    describe_parameter, describe_type, HttpMethod, Operation, Parameter, ParameterLocation,
    ParameterOrRef, ProcessedDocument, SchemaProcessor,
};
use crate::intent::intent_mappings;
use indexmap::IndexMap;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Longest purpose taken verbatim from a description with no sentence break
const PURPOSE_LIMIT: usize = 100;

/// Description phrases that mark a sentence as a use case
const USE_CASE_MARKERS: &[&str] = &[
    "use this to",
    "allows you to",
    "enables you to",
    "can be used to",
    "use case",
    "useful for",
];

/// Vendor extension carrying static sandbox request/response pairs
const SANDBOX_EXTENSION: &str = "x-amzn-api-sandbox";

/// Builds an [`ApiCatalog`] from processed documents
#[derive(Debug, Clone)]
pub struct CatalogMapper {
    grouping: GroupingSettings,
    on_collision: CollisionPolicy,
    /// Catalog root, used to qualify colliding ids by relative path
    root: Option<PathBuf>,
    processor: SchemaProcessor,
}

/// One operation with its assigned id, before conversion
struct Draft<'a> {
    template: &'a str,
    method: HttpMethod,
    operation: &'a Operation,
    operation_id: String,
    category: String,
    id: String,
}

impl CatalogMapper {
    pub fn new(grouping: GroupingSettings, on_collision: CollisionPolicy) -> Self {
        Self {
            grouping,
            on_collision,
            root: None,
            processor: SchemaProcessor::new(),
        }
    }

    pub fn from_config(config: &CatalogConfig) -> Self {
        Self::new(config.grouping.clone(), config.ids.on_collision)
            .with_root(config.catalog_path.clone())
    }

    /// Qualify colliding ids with the document path below `root`
    /// instead of the bare file stem
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Map documents, in the given order, into a catalog sorted by category name
    pub fn map(&self, documents: &[ProcessedDocument]) -> Result<ApiCatalog> {
        let mut categories: IndexMap<String, ApiCategory> = IndexMap::new();
        let mut ids: HashMap<String, String> = HashMap::new();

        for document in documents {
            let drafts = self.draft_document(document, &mut ids)?;
            debug!(
                source = %document.identity(),
                endpoints = drafts.len(),
                "Mapped API document"
            );

            for (index, draft) in drafts.iter().enumerate() {
                let endpoint = self.build_endpoint(document, &drafts, index);
                self.place(&mut categories, document, draft, endpoint);
            }
        }

        let mut categories: Vec<ApiCategory> = categories.into_values().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));

        let intent_mappings = intent_mappings(&categories);
        let catalog = ApiCatalog {
            categories,
            intent_mappings,
        };
        info!(
            documents = documents.len(),
            categories = catalog.categories.len(),
            endpoints = catalog.total_endpoints(),
            intents = catalog.intent_mappings.len(),
            "Built API catalog"
        );
        Ok(catalog)
    }

    fn draft_document<'a>(
        &self,
        document: &'a ProcessedDocument,
        ids: &mut HashMap<String, String>,
    ) -> Result<Vec<Draft<'a>>> {
        let title = strip_title_prefix(&document.document.info.title, &self.grouping.title_prefixes);
        let mut drafts = Vec::new();

        for (template, item) in &document.document.paths {
            for (method, operation) in item.operations() {
                let operation_id = operation
                    .operation_id
                    .clone()
                    .unwrap_or_else(|| generate_operation_id(method, template));
                let category = self.category_name(&title, template, operation);
                let prefix = category_prefix(&category);
                let id = self.assign_id(ids, &prefix, &operation_id, document)?;

                drafts.push(Draft {
                    template,
                    method,
                    operation,
                    operation_id,
                    category,
                    id,
                });
            }
        }

        Ok(drafts)
    }

    fn category_name(&self, title: &str, template: &str, operation: &Operation) -> String {
        match self.grouping.group_by {
            GroupBy::Document => title.to_string(),
            GroupBy::Tag => operation
                .tags
                .first()
                .cloned()
                .unwrap_or_else(|| title.to_string()),
            GroupBy::PathPrefix => path_prefix(template)
                .map(capitalize)
                .unwrap_or_else(|| title.to_string()),
        }
    }

    /// Register a unique id, applying the collision policy
    fn assign_id(
        &self,
        ids: &mut HashMap<String, String>,
        prefix: &str,
        operation_id: &str,
        document: &ProcessedDocument,
    ) -> Result<String> {
        let source = document.identity();
        let candidate = format!("{}_{}", prefix, operation_id);

        let Some(first) = ids.get(&candidate) else {
            ids.insert(candidate.clone(), source);
            return Ok(candidate);
        };

        if self.on_collision == CollisionPolicy::Reject || *first == source {
            return Err(CatalogError::DuplicateEndpointId {
                id: candidate,
                first: first.clone(),
                second: source,
            });
        }

        let qualifier = match &self.root {
            Some(root) => document.relative_name(root),
            None => document.stem(),
        };
        let qualified = format!("{}_{}_{}", prefix, qualifier, operation_id);
        if let Some(first) = ids.get(&qualified) {
            return Err(CatalogError::DuplicateEndpointId {
                id: qualified,
                first: first.clone(),
                second: source,
            });
        }

        warn!(
            id = %candidate,
            first = %first,
            second = %source,
            renamed = %qualified,
            "Duplicate endpoint id, qualifying with document name"
        );
        ids.insert(qualified.clone(), source);
        Ok(qualified)
    }

    fn place(
        &self,
        categories: &mut IndexMap<String, ApiCategory>,
        document: &ProcessedDocument,
        draft: &Draft<'_>,
        endpoint: CatalogEndpoint,
    ) {
        let doc = &document.document;
        let category = categories.entry(draft.category.clone()).or_insert_with(|| {
            let description = match self.grouping.group_by {
                GroupBy::Document => doc.info.description.clone(),
                GroupBy::Tag => doc.tag_description(&draft.category).map(str::to_string),
                GroupBy::PathPrefix => None,
            }
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| format!("APIs for {}", draft.category));
            ApiCategory::new(draft.category.clone(), description)
        });

        let subcategory_tag = match self.grouping.group_by {
            GroupBy::Document if self.grouping.subcategories_by_tag => {
                draft.operation.tags.first()
            }
            _ => None,
        };

        let Some(tag) = subcategory_tag else {
            category.endpoints.push(endpoint);
            return;
        };

        match category.subcategories.iter_mut().find(|s| &s.name == tag) {
            Some(subcategory) => subcategory.endpoints.push(endpoint),
            None => category.subcategories.push(ApiSubcategory {
                name: tag.clone(),
                description: doc.tag_description(tag).unwrap_or_default().to_string(),
                endpoints: vec![endpoint],
            }),
        }
    }

    fn build_endpoint(
        &self,
        document: &ProcessedDocument,
        drafts: &[Draft<'_>],
        index: usize,
    ) -> CatalogEndpoint {
        let draft = &drafts[index];
        let operation = draft.operation;

        CatalogEndpoint {
            id: draft.id.clone(),
            original_operation_id: draft.operation_id.clone(),
            name: operation
                .summary
                .clone()
                .unwrap_or_else(|| draft.operation_id.clone()),
            method: draft.method.as_upper().to_string(),
            path: draft.template.to_string(),
            description: operation.description.clone().unwrap_or_default(),
            purpose: purpose(operation, draft.method),
            tags: operation.tags.clone(),
            deprecated: operation.deprecated,
            version: document.document.info.version.clone(),
            source: document.identity(),
            parameters: self.parameters(operation, &draft.id),
            responses: self.responses(operation),
            related_endpoints: related_endpoints(drafts, index),
            common_use_cases: common_use_cases(operation, draft),
            examples: self.usage_examples(operation),
        }
    }

    /// Sandbox pairs first, then OpenAPI 3 request body examples
    fn usage_examples(&self, operation: &Operation) -> Vec<UsageExample> {
        let mut examples = Vec::new();

        let sandbox = operation
            .extensions
            .get(SANDBOX_EXTENSION)
            .and_then(|s| s.get("static"))
            .and_then(Value::as_array);
        for pair in sandbox.into_iter().flatten() {
            if let (Some(request), Some(response)) = (pair.get("request"), pair.get("response")) {
                examples.push(UsageExample {
                    scenario: format!("Example {}", examples.len() + 1),
                    request: request.clone(),
                    response: response.clone(),
                });
            }
        }

        let declared = operation
            .request_body
            .as_ref()
            .and_then(|b| b.content.get("application/json"))
            .map(|m| &m.examples);
        for (name, example) in declared.into_iter().flatten() {
            if let Some(value) = example.get("value") {
                examples.push(UsageExample {
                    scenario: name.clone(),
                    request: value.clone(),
                    response: self.success_response(operation),
                });
            }
        }

        examples
    }

    /// Simplified 200/201 schema, or a generic success message
    fn success_response(&self, operation: &Operation) -> Value {
        let schema = ["200", "201"]
            .iter()
            .filter_map(|status| operation.responses.get(*status))
            .find_map(|r| r.primary_schema());

        match schema {
            Some(schema) => json!({"schema": self.processor.simplify(schema)}),
            None => json!({"message": "Successful response"}),
        }
    }

    fn parameters(&self, operation: &Operation, endpoint_id: &str) -> Vec<EndpointParameter> {
        let mut parameters: Vec<EndpointParameter> = Vec::new();

        for entry in &operation.parameters {
            let Some(param) = entry.as_parameter() else {
                if let ParameterOrRef::Other(placeholder) = entry {
                    warn!(
                        endpoint = %endpoint_id,
                        detail = %placeholder.get("description").and_then(|d| d.as_str()).unwrap_or("unrecognised entry"),
                        "Skipping unusable parameter"
                    );
                }
                continue;
            };
            parameters.push(self.parameter(param));
        }

        if let Some(body) = &operation.request_body {
            if let Some(schema) = body
                .content
                .get("application/json")
                .and_then(|m| m.schema.as_ref())
            {
                parameters.push(EndpointParameter {
                    name: "body".to_string(),
                    location: ParameterLocation::Body.as_str().to_string(),
                    required: body.required,
                    type_description: describe_type(schema),
                    description: body
                        .description
                        .clone()
                        .unwrap_or_else(|| "Request body".to_string()),
                    schema: Some(self.processor.simplify(schema)),
                });
            }
        }

        parameters
    }

    fn parameter(&self, param: &Parameter) -> EndpointParameter {
        EndpointParameter {
            name: param.name.clone(),
            location: param.location.as_str().to_string(),
            required: param.required,
            type_description: param
                .type_description
                .clone()
                .unwrap_or_else(|| describe_parameter(param)),
            description: param
                .description
                .clone()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| parameter_purpose(param)),
            schema: param.schema.as_ref().map(|s| self.processor.simplify(s)),
        }
    }

    fn responses(&self, operation: &Operation) -> Vec<EndpointResponse> {
        operation
            .responses
            .iter()
            .map(|(status, response)| EndpointResponse {
                status_code: status.clone(),
                description: response.description.clone().unwrap_or_default(),
                schema: response
                    .primary_schema()
                    .map(|s| self.processor.simplify(s)),
            })
            .collect()
    }
}

/// One-line statement of what an operation is for
fn purpose(operation: &Operation, method: HttpMethod) -> String {
    if let Some(description) = operation
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
    {
        if let Some(sentence) = first_sentence(description) {
            return sentence.to_string();
        }
        if description.chars().count() > PURPOSE_LIMIT {
            let cut: String = description.chars().take(PURPOSE_LIMIT - 3).collect();
            return format!("{}...", cut);
        }
        return description.to_string();
    }

    if let Some(summary) = operation.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        return summary.to_string();
    }

    match method {
        HttpMethod::Get => "Retrieve information from the API.",
        HttpMethod::Post => "Create or submit data through the API.",
        HttpMethod::Put => "Update existing data through the API.",
        HttpMethod::Patch => "Partially update existing data through the API.",
        HttpMethod::Delete => "Remove data through the API.",
        _ => "Interact with the API.",
    }
    .to_string()
}

/// Use-case sentences from the description, else a per-method default
fn common_use_cases(operation: &Operation, draft: &Draft<'_>) -> Vec<String> {
    let description = operation.description.as_deref().unwrap_or_default().to_lowercase();
    let found: Vec<String> = description
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| USE_CASE_MARKERS.iter().any(|m| s.contains(m)))
        .map(|s| format!("{}.", capitalize(s)))
        .collect();
    if !found.is_empty() {
        return found;
    }

    let resource = resource_name(draft.template);
    let op = draft.operation_id.to_lowercase();
    let mut cases = Vec::new();
    match draft.method {
        HttpMethod::Get => {
            cases.push(format!("Retrieve {} information.", resource));
            if op.contains("list") || op.contains("search") {
                cases.push(format!("Find {} records that match certain criteria.", resource));
            }
        }
        HttpMethod::Post => {
            cases.push(format!("Create a new {}.", resource));
            if op.contains("submit") || op.contains("send") {
                cases.push(format!("Submit {} data for processing.", resource));
            }
        }
        HttpMethod::Put | HttpMethod::Patch => {
            cases.push(format!("Update existing {} information.", resource));
        }
        HttpMethod::Delete => cases.push(format!("Remove a {}.", resource)),
        _ => {}
    }
    cases
}

fn parameter_purpose(param: &Parameter) -> String {
    match param.location {
        ParameterLocation::Path => {
            format!("Identifies the specific {} in the request path.", param.name)
        }
        ParameterLocation::Query => "Filters or customizes the request results.".to_string(),
        ParameterLocation::Header => "Provides additional context for the request.".to_string(),
        ParameterLocation::Body | ParameterLocation::FormData => {
            "Contains the data to be processed.".to_string()
        }
        ParameterLocation::Cookie => format!("Specifies the {} for this operation.", param.name),
    }
}

/// Same-document endpoints sharing a tag or a resource path
fn related_endpoints(drafts: &[Draft<'_>], index: usize) -> Vec<RelatedEndpoint> {
    let current = &drafts[index];
    let current_resource = resource_path(current.template);

    drafts
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .filter_map(|(_, other)| {
            let shared: Vec<&str> = current
                .operation
                .tags
                .iter()
                .filter(|t| other.operation.tags.contains(t))
                .map(String::as_str)
                .collect();
            let same_resource = resource_path(other.template) == current_resource;

            let relationship = if same_resource {
                let resource = resource_name(current.template);
                match (current.method, other.method) {
                    (HttpMethod::Get, HttpMethod::Post) => format!("Create a new {}", resource),
                    (HttpMethod::Get, HttpMethod::Put) | (HttpMethod::Get, HttpMethod::Patch) => {
                        format!("Update the {}", resource)
                    }
                    (HttpMethod::Get, HttpMethod::Delete) => format!("Delete the {}", resource),
                    (HttpMethod::Post, HttpMethod::Get) => {
                        format!("Retrieve the created {}", resource)
                    }
                    _ => format!("Another operation on the same {} resource", resource),
                }
            } else if !shared.is_empty() {
                format!("Related to the same functionality ({})", shared.join(", "))
            } else {
                return None;
            };

            Some(RelatedEndpoint {
                id: other.id.clone(),
                relationship,
            })
        })
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
