//! Intent mappings
//!
//! Each endpoint contributes a primary intent built from its purpose, one
//! intent per common use case, and a few phrased from its operationId verb.
//! Only primary intents may repeat; the others are deduplicated ignoring case.

use api_catalog_common::{ApiCategory, CatalogEndpoint, IntentMapping};
use api_catalog_parser::naming::resource_name;

const INTENT_LEADS: &[&str] = &["i want to", "i need to", "i would like to"];

/// Build intent mappings for every endpoint, in catalog order
pub fn intent_mappings(categories: &[ApiCategory]) -> Vec<IntentMapping> {
    let mut mappings = Vec::new();

    for category in categories {
        for endpoint in category.all_endpoints() {
            if let Some(intent) = primary_intent(endpoint) {
                mappings.push(IntentMapping {
                    reason: format!("This endpoint directly serves the goal to {}", goal(&intent)),
                    intent,
                    endpoint_id: endpoint.id.clone(),
                });
            }

            for use_case in &endpoint.common_use_cases {
                if let Some(intent) = as_intent(use_case) {
                    push_unique(
                        &mut mappings,
                        intent,
                        endpoint,
                        "This endpoint is designed for this use case".to_string(),
                    );
                }
            }

            verb_intents(&mut mappings, endpoint, &category.name);
        }
    }

    mappings
}

/// Phrase text as "I want to ..."
pub fn as_intent(text: &str) -> Option<String> {
    let text = text.trim().trim_end_matches('.').trim().to_lowercase();
    if text.is_empty() {
        return None;
    }

    if INTENT_LEADS.iter().any(|lead| text.starts_with(lead)) {
        Some(text)
    } else {
        Some(format!("I want to {}", text))
    }
}

fn primary_intent(endpoint: &CatalogEndpoint) -> Option<String> {
    if !endpoint.purpose.trim().is_empty() {
        return as_intent(&endpoint.purpose);
    }
    as_intent(&split_camel_case(&endpoint.original_operation_id))
}

/// Intent text without its "I want to" lead
fn goal(intent: &str) -> &str {
    let lower = intent.to_lowercase();
    INTENT_LEADS
        .iter()
        .find(|lead| lower.starts_with(*lead))
        .and_then(|lead| intent.get(lead.len()..))
        .map_or(intent, str::trim_start)
}

fn verb_intents(mappings: &mut Vec<IntentMapping>, endpoint: &CatalogEndpoint, category: &str) {
    let op = endpoint.original_operation_id.to_lowercase();
    let resource = resource_name(&endpoint.path);

    if contains_any(&op, &["get", "list", "search"]) {
        push_unique(
            mappings,
            format!("I want to find {} in my {} account", resource, category),
            endpoint,
            format!("This endpoint retrieves {} information", resource),
        );
    }
    if contains_any(&op, &["create", "add"]) {
        push_unique(
            mappings,
            format!("I want to add a new {} to my {} account", resource, category),
            endpoint,
            format!("This endpoint creates new {} entries", resource),
        );
    }
    if contains_any(&op, &["update", "edit"]) {
        push_unique(
            mappings,
            format!("I want to update my {} information", resource),
            endpoint,
            format!("This endpoint updates existing {} data", resource),
        );
    }
    if contains_any(&op, &["delete", "remove", "cancel"]) {
        push_unique(
            mappings,
            format!("I want to remove a {} from my account", resource),
            endpoint,
            format!("This endpoint deletes {} entries", resource),
        );
    }
}

fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

fn push_unique(
    mappings: &mut Vec<IntentMapping>,
    intent: String,
    endpoint: &CatalogEndpoint,
    reason: String,
) {
    if mappings
        .iter()
        .any(|m| m.intent.eq_ignore_ascii_case(&intent))
    {
        return;
    }
    mappings.push(IntentMapping {
        intent,
        endpoint_id: endpoint.id.clone(),
        reason,
    });
}

/// `getOrderItems` -> `get order items`
fn split_camel_case(id: &str) -> String {
    let mut words = String::with_capacity(id.len() + 4);
    for c in id.chars() {
        if c.is_ascii_uppercase() && !words.is_empty() {
            words.push(' ');
        }
        words.push(c.to_ascii_lowercase());
    }
    words
}
