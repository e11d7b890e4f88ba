//! Response enrichment for Deploy API payloads.
//!
//! This crate turns raw search and document responses into
//! assistant-friendly ones: portal URLs attached to every path-bearing
//! node, ranked snippets, quick answers, topic categories and follow-up
//! suggestions. Everything here is pure and synchronous; the HTTP client
//! and tool surface live in sibling crates.

pub mod answer;
pub mod categorize;
pub mod enrich;
pub mod extract;
pub mod present;
pub mod related;
pub mod snippet;
pub mod suggest;
pub mod urls;

use serde_json::Value;

pub use answer::{ANSWER_RULES, AnswerRule, QuickAnswerExtractor, extract_quick_answer};
pub use categorize::{Category, categorize};
pub use enrich::{EnhancedSearch, Enricher};
pub use extract::{extract_key_facts, extract_sections, parent_path};
pub use present::add_presentation_links;
pub use related::find_related;
pub use snippet::{DEFAULT_SNIPPET_LENGTH, extract_snippet};
pub use suggest::{learning_path, suggest_alternatives};
pub use urls::{PORTAL_URL_FIELD, PortalUrls};

/// Number of leading search results that are scored and categorized.
pub const MAX_PROCESSED_RESULTS: usize = 10;

/// Borrow a string field of a JSON object, if present.
pub(crate) fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}
