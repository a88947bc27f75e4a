//! Operation and category naming helpers

use crate::document::types::HttpMethod;

/// Build an operationId from method and path template
///
/// `GET /orders/{orderId}/items` becomes `getOrdersOrderidItems`.
pub fn generate_operation_id(method: HttpMethod, path: &str) -> String {
    let mut id = method.as_str().to_string();
    for segment in path.split(|c: char| !c.is_ascii_alphanumeric()) {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            id.push(first.to_ascii_uppercase());
            id.push_str(&chars.as_str().to_ascii_lowercase());
        }
    }
    id
}

/// Strip the first matching prefix (ignoring ASCII case) from a title
pub fn strip_title_prefix(title: &str, prefixes: &[String]) -> String {
    let title = title.trim();
    for prefix in prefixes {
        let prefix = prefix.trim_start();
        if prefix.is_empty() || title.len() <= prefix.len() {
            continue;
        }
        if let Some(head) = title.get(..prefix.len()) {
            if head.eq_ignore_ascii_case(prefix) {
                return title[prefix.len()..].trim().to_string();
            }
        }
    }
    title.to_string()
}

/// camelCase identifier prefix for a category name
///
/// `"Fulfillment Inbound"` becomes `"fulfillmentInbound"`.
pub fn category_prefix(name: &str) -> String {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();

    let mut prefix = String::with_capacity(cleaned.len());
    for (i, word) in cleaned.split_whitespace().enumerate() {
        if i == 0 {
            prefix.push_str(word);
        } else {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                prefix.push(first.to_ascii_uppercase());
                prefix.push_str(chars.as_str());
            }
        }
    }
    prefix
}

/// Path template with every parameter collapsed to `{id}`
pub fn resource_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.starts_with('{') && segment.ends_with('}') {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Singular name of the last literal path segment
///
/// `/orders/v0/orders/{orderId}` becomes `"order"`.
pub fn resource_name(path: &str) -> String {
    let last = path
        .split('/')
        .filter(|s| !s.is_empty() && !s.contains('{'))
        .next_back();

    match last {
        Some(s) if s.len() > 1 && s.ends_with('s') => s[..s.len() - 1].to_string(),
        Some(s) => s.to_string(),
        None => "resource".to_string(),
    }
}

/// First path segment that is neither a parameter nor a version marker
pub fn path_prefix(path: &str) -> Option<&str> {
    path.split('/')
        .filter(|s| !s.is_empty() && !s.starts_with('{'))
        .find(|s| !is_version_segment(s))
}

fn is_version_segment(segment: &str) -> bool {
    let rest = segment
        .strip_prefix('v')
        .or_else(|| segment.strip_prefix('V'));
    match rest {
        Some(digits) => !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit() || c == '.'),
        None => segment.chars().next().is_some_and(|c| c.is_ascii_digit()),
    }
}

/// First sentence of a description, including its terminator
pub fn first_sentence(text: &str) -> Option<&str> {
    let text = text.trim_start();
    let end = text.find(['.', '!', '?'])?;
    if end == 0 {
        return None;
    }
    Some(text[..=end].trim())
}
