//! Related-content lookup by path hierarchy.

use serde_json::Value;

use docbridge_shared::{RelatedEntry, RelatedSets};

use crate::str_field;

/// Maximum entries kept per bucket.
const MAX_PER_BUCKET: usize = 3;

/// Partition `results` by their relationship to `current_path`.
///
/// Ancestors (`current_path` starts with the other path) and descendants
/// (the other path starts with `current_path`) are recognized first; any
/// remaining result whose first path segment matches is a sibling in the
/// same section. The entry for `current_path` itself is skipped.
pub fn find_related(current_path: &str, results: &[Value]) -> RelatedSets {
    let mut related = RelatedSets::default();
    if current_path.is_empty() {
        return related;
    }

    let current_section = first_segment(current_path);

    for result in results {
        let path = str_field(result, "path").unwrap_or("");
        if path == current_path {
            continue;
        }

        let bucket = if !path.is_empty() && current_path.starts_with(path) {
            &mut related.parent_topics
        } else if path.starts_with(current_path) {
            &mut related.child_topics
        } else if first_segment(path) == current_section {
            &mut related.same_section
        } else {
            continue;
        };

        if bucket.len() < MAX_PER_BUCKET {
            bucket.push(RelatedEntry {
                title: str_field(result, "title").unwrap_or("").to_string(),
                path: path.to_string(),
                portal_url: str_field(result, "portal_url").unwrap_or("").to_string(),
            });
        }
    }

    related
}

fn first_segment(path: &str) -> &str {
    path.trim_matches('/').split('/').next().unwrap_or("")
}
