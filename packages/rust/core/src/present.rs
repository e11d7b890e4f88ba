//! Presentation-only links that make portal URLs prominent in responses.

use serde_json::{Map, Value};

use docbridge_shared::{DirectLink, QuickLink};

use crate::str_field;
use crate::urls::{PORTAL_URL_FIELD, PortalUrls};

/// Description characters kept in a quick link.
const QUICK_LINK_DESCRIPTION_CHARS: usize = 100;

/// Attach `quick_links` (for result lists) and `direct_link` (for single
/// documents) to an annotated response. No-op without a portal base or
/// for non-object values.
pub fn add_presentation_links(value: &mut Value, portal: &PortalUrls) {
    if !portal.is_configured() {
        return;
    }
    let Value::Object(map) = value else {
        return;
    };

    if let Some(results) = map.get("results").and_then(Value::as_array) {
        let links = quick_links(results);
        map.insert("quick_links".into(), serde_json::to_value(links).unwrap_or_default());
    }

    if map.contains_key("content") {
        if let Some(link) = direct_link(map) {
            map.insert("direct_link".into(), serde_json::to_value(link).unwrap_or_default());
        }
    }
}

fn quick_links(results: &[Value]) -> Vec<QuickLink> {
    results
        .iter()
        .enumerate()
        .filter_map(|(idx, result)| {
            let url = str_field(result, PORTAL_URL_FIELD)?;
            let description = match str_field(result, "description") {
                Some(text) if !text.is_empty() => {
                    let head: String = text.chars().take(QUICK_LINK_DESCRIPTION_CHARS).collect();
                    format!("{head}...")
                }
                _ => String::new(),
            };
            Some(QuickLink {
                title: str_field(result, "title")
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Result {}", idx + 1)),
                url: url.to_string(),
                description,
            })
        })
        .collect()
}

fn direct_link(map: &Map<String, Value>) -> Option<DirectLink> {
    let url = map.get(PORTAL_URL_FIELD).and_then(Value::as_str)?;
    Some(DirectLink {
        title: map
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("Document")
            .to_string(),
        url: url.to_string(),
        message: format!("📄 View this document online: {url}"),
    })
}
