//! Markdown views of a catalog

use api_catalog_common::{
    ApiCatalog, ApiCategory, ApiSubcategory, CatalogEndpoint, CatalogError, EndpointMatch,
    EndpointParameter, EndpointResponse, RelatedEndpoint, Result, UsageExample,
};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use tera::{Context, Tera, Value};

/// Longest text kept in a Markdown table cell
const CELL_LIMIT: usize = 100;

/// Renders catalogs, categories and endpoints as Markdown
pub struct CatalogRenderer {
    tera: Tera,
}

#[derive(Serialize)]
struct OverviewView<'a> {
    total_endpoints: usize,
    categories: Vec<CategoryRow<'a>>,
}

#[derive(Serialize)]
struct CategoryRow<'a> {
    name: &'a str,
    description: &'a str,
    endpoint_count: usize,
}

#[derive(Serialize)]
struct CategoryView<'a> {
    name: &'a str,
    description: &'a str,
    endpoints: &'a [CatalogEndpoint],
    subcategories: &'a [ApiSubcategory],
}

#[derive(Serialize)]
struct ResponseView<'a> {
    status_code: &'a str,
    description: &'a str,
    type_description: Option<&'a str>,
    example: Option<String>,
}

#[derive(Serialize)]
struct ExampleView<'a> {
    scenario: &'a str,
    request: String,
    response: String,
}

#[derive(Serialize)]
struct EndpointView<'a> {
    #[serde(flatten)]
    endpoint: EndpointSummary<'a>,
    category: &'a str,
    use_cases: &'a [String],
    parameters: &'a [EndpointParameter],
    responses: Vec<ResponseView<'a>>,
    examples: Vec<ExampleView<'a>>,
    related: &'a [RelatedEndpoint],
}

#[derive(Serialize)]
struct EndpointSummary<'a> {
    id: &'a str,
    name: &'a str,
    method: &'a str,
    path: &'a str,
    description: &'a str,
    purpose: &'a str,
    tags: &'a [String],
    deprecated: bool,
    version: &'a str,
    source: &'a str,
}

impl<'a> From<&'a CatalogEndpoint> for EndpointSummary<'a> {
    fn from(e: &'a CatalogEndpoint) -> Self {
        Self {
            id: &e.id,
            name: &e.name,
            method: &e.method,
            path: &e.path,
            description: &e.description,
            purpose: &e.purpose,
            tags: &e.tags,
            deprecated: e.deprecated,
            version: &e.version,
            source: &e.source,
        }
    }
}

impl CatalogRenderer {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.register_filter("md_cell", md_cell_filter);

        let templates = [
            ("overview.md", include_str!("../templates/overview.md.tera")),
            ("category.md", include_str!("../templates/category.md.tera")),
            ("endpoint.md", include_str!("../templates/endpoint.md.tera")),
        ];
        for (name, source) in templates {
            tera.add_raw_template(name, source).map_err(|e| {
                CatalogError::Render(format!("Failed to load {} template: {}", name, e))
            })?;
        }

        Ok(Self { tera })
    }

    /// Category table with endpoint counts
    pub fn render_overview(&self, catalog: &ApiCatalog) -> Result<String> {
        let view = OverviewView {
            total_endpoints: catalog.total_endpoints(),
            categories: catalog
                .categories
                .iter()
                .map(|c| CategoryRow {
                    name: &c.name,
                    description: &c.description,
                    endpoint_count: c.endpoint_count(),
                })
                .collect(),
        };
        self.render("overview.md", &view)
    }

    /// Endpoint tables for one category and its subcategories
    pub fn render_category(&self, category: &ApiCategory) -> Result<String> {
        let view = CategoryView {
            name: &category.name,
            description: &category.description,
            endpoints: &category.endpoints,
            subcategories: &category.subcategories,
        };
        self.render("category.md", &view)
    }

    /// Full detail for one endpoint
    pub fn render_endpoint(&self, found: &EndpointMatch<'_>) -> Result<String> {
        let endpoint = found.endpoint;
        let responses = endpoint
            .responses
            .iter()
            .map(response_view)
            .collect::<Result<Vec<_>>>()?;
        let examples = endpoint
            .examples
            .iter()
            .map(example_view)
            .collect::<Result<Vec<_>>>()?;

        let view = EndpointView {
            endpoint: EndpointSummary::from(endpoint),
            category: &found.category,
            use_cases: &endpoint.common_use_cases,
            parameters: &endpoint.parameters,
            responses,
            examples,
            related: &endpoint.related_endpoints,
        };
        self.render("endpoint.md", &view)
    }

    fn render<T: Serialize>(&self, template: &str, view: &T) -> Result<String> {
        let context = Context::from_serialize(view).map_err(|e| {
            CatalogError::Render(format!("Failed to build {} context: {}", template, e))
        })?;

        self.tera
            .render(template, &context)
            .map_err(|e| CatalogError::Render(format!("Template error in {}: {:?}", template, e)))
    }
}

fn response_view(response: &EndpointResponse) -> Result<ResponseView<'_>> {
    let schema = response.schema.as_ref();
    let example = match schema.and_then(|s| s.get("example")) {
        Some(example) => Some(serde_json::to_string_pretty(example)?),
        None => None,
    };

    Ok(ResponseView {
        status_code: &response.status_code,
        description: &response.description,
        type_description: schema
            .and_then(|s| s.get("_typeDescription"))
            .and_then(JsonValue::as_str),
        example,
    })
}

fn example_view(example: &UsageExample) -> Result<ExampleView<'_>> {
    Ok(ExampleView {
        scenario: &example.scenario,
        request: serde_json::to_string_pretty(&example.request)?,
        response: serde_json::to_string_pretty(&example.response)?,
    })
}

/// Escape text for a Markdown table cell and cap its length
fn md_cell_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };

    let flat = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|");

    let cell = if flat.chars().count() > CELL_LIMIT {
        let cut: String = flat.chars().take(CELL_LIMIT - 3).collect();
        format!("{}...", cut.trim_end())
    } else {
        flat
    };

    Ok(Value::String(cell))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn endpoint() -> CatalogEndpoint {
        CatalogEndpoint {
            id: "orders_getOrder".to_string(),
            original_operation_id: "getOrder".to_string(),
            name: "Get an order".to_string(),
            method: "GET".to_string(),
            path: "/orders/v0/orders/{orderId}".to_string(),
            description: "Returns the order. Includes buyer info.".to_string(),
            purpose: "Returns the order.".to_string(),
            tags: vec!["orders".to_string()],
            deprecated: false,
            version: "v0".to_string(),
            source: "ordersV0.json".to_string(),
            parameters: vec![EndpointParameter {
                name: "orderId".to_string(),
                location: "path".to_string(),
                required: true,
                type_description: "string".to_string(),
                description: "An Amazon-defined order identifier | 3-7-7 format.".to_string(),
                schema: None,
            }],
            responses: vec![EndpointResponse {
                status_code: "200".to_string(),
                description: "Success".to_string(),
                schema: Some(json!({
                    "type": "object",
                    "_typeDescription": "Order",
                    "example": {"AmazonOrderId": "string value"}
                })),
            }],
            related_endpoints: vec![RelatedEndpoint {
                id: "orders_getOrders".to_string(),
                relationship: "Related to the same functionality (orders)".to_string(),
            }],
            common_use_cases: vec!["Retrieve order information.".to_string()],
            examples: vec![UsageExample {
                scenario: "Example 1".to_string(),
                request: json!({"pathParameters": {"orderId": "TEST_CASE_200"}}),
                response: json!({"payload": {"AmazonOrderId": "902-1845936-5435065"}}),
            }],
        }
    }

    fn catalog() -> ApiCatalog {
        let mut orders = ApiCategory::new("Orders", "Order APIs");
        orders.endpoints.push(endpoint());
        orders.subcategories.push(ApiSubcategory {
            name: "Items".to_string(),
            description: String::new(),
            endpoints: vec![endpoint()],
        });
        ApiCatalog {
            categories: vec![orders],
            ..Default::default()
        }
    }

    #[test]
    fn test_md_cell_escapes_and_truncates() {
        let out = md_cell_filter(&Value::String("a | b\nc".to_string()), &HashMap::new()).unwrap();
        assert_eq!(out, Value::String("a \\| b c".to_string()));

        let long = "word ".repeat(40);
        let out = md_cell_filter(&Value::String(long), &HashMap::new()).unwrap();
        let out = out.as_str().unwrap();
        assert!(out.ends_with("..."));
        assert!(out.chars().count() <= CELL_LIMIT);
    }

    #[test]
    fn test_render_overview() {
        let out = CatalogRenderer::new().unwrap().render_overview(&catalog()).unwrap();

        assert!(out.contains("1 categories, 2 endpoints."));
        assert!(out.contains("| Orders | 2 | Order APIs |"));
    }

    #[test]
    fn test_render_category() {
        let catalog = catalog();
        let out = CatalogRenderer::new()
            .unwrap()
            .render_category(&catalog.categories[0])
            .unwrap();

        assert!(out.starts_with("# Orders"));
        assert!(out.contains("## Items"));
        assert!(out.contains("| `orders_getOrder` | GET | `/orders/v0/orders/{orderId}` | Returns the order. |"));
    }

    #[test]
    fn test_render_endpoint() {
        let catalog = catalog();
        let found = catalog.endpoint_by_id("orders_getOrder").unwrap();
        let out = CatalogRenderer::new().unwrap().render_endpoint(&found).unwrap();

        assert!(out.contains("`GET /orders/v0/orders/{orderId}`"));
        assert!(out.contains("- **Category:** Orders"));
        assert!(out.contains("identifier \\| 3-7-7 format."));
        assert!(out.contains("### 200 (Order)"));
        assert!(out.contains("\"AmazonOrderId\": \"string value\""));
        assert!(out.contains("- `orders_getOrders`: Related to the same functionality (orders)"));
        assert!(out.contains("## Common Use Cases\n\n- Retrieve order information."));
        assert!(out.contains("### Example 1"));
        assert!(out.contains("\"orderId\": \"TEST_CASE_200\""));
        assert!(out.contains("\"AmazonOrderId\": \"902-1845936-5435065\""));
    }
}
