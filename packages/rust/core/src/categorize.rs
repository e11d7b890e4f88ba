//! Topic buckets for search results, derived from their paths.

use serde_json::{Map, Value};

use crate::{MAX_PROCESSED_RESULTS, str_field};

/// Topic bucket for a search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Guides,
    Api,
    Troubleshooting,
    Reference,
    Concepts,
}

impl Category {
    /// All categories in output order.
    pub const ALL: [Category; 5] = [
        Self::Guides,
        Self::Api,
        Self::Troubleshooting,
        Self::Reference,
        Self::Concepts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guides => "guides",
            Self::Api => "api",
            Self::Troubleshooting => "troubleshooting",
            Self::Reference => "reference",
            Self::Concepts => "concepts",
        }
    }

    /// Classify a document path. First match wins.
    pub fn from_path(path: &str) -> Self {
        let path = path.to_lowercase();
        if path.contains("guide") || path.contains("how-to") {
            Self::Guides
        } else if path.contains("api") {
            Self::Api
        } else if path.contains("troubleshoot") || path.contains("error") {
            Self::Troubleshooting
        } else if path.contains("reference") {
            Self::Reference
        } else {
            Self::Concepts
        }
    }
}

/// Count the first ten object results per category. Only non-empty
/// categories appear, in [`Category::ALL`] order.
pub fn categorize(results: &[Value]) -> Map<String, Value> {
    let mut counts = [0usize; Category::ALL.len()];

    for result in results.iter().take(MAX_PROCESSED_RESULTS) {
        if !result.is_object() {
            continue;
        }
        let category = Category::from_path(str_field(result, "path").unwrap_or(""));
        counts[category as usize] += 1;
    }

    Category::ALL
        .iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .map(|(category, count)| (category.as_str().to_string(), Value::from(count)))
        .collect()
}
