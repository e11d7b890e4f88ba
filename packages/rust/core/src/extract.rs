//! Structure extraction from single-document content: key facts,
//! section headings, and the parent of a requested path.

use std::sync::LazyLock;

use regex::Regex;

use docbridge_shared::Section;

/// Maximum number of key facts returned.
const MAX_KEY_FACTS: usize = 5;

/// Collect up to five bullet or numbered-list items from `content`.
pub fn extract_key_facts(content: &str) -> Vec<String> {
    static BULLET_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
        [
            Regex::new(r"^[•·▪▫◦‣⁃]\s*(.+)$").expect("valid regex"),
            Regex::new(r"^[-*]\s+(.+)$").expect("valid regex"),
            Regex::new(r"^\d+\.\s+(.+)$").expect("valid regex"),
        ]
    });

    content
        .split('\n')
        .map(str::trim)
        .filter_map(|line| {
            BULLET_PATTERNS
                .iter()
                .find_map(|re| re.captures(line))
                .map(|caps| caps[1].trim().to_string())
        })
        .take(MAX_KEY_FACTS)
        .collect()
}

/// Collect Markdown headings of levels 1-3.
pub fn extract_sections(content: &str) -> Vec<Section> {
    static HEADING_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^(#{1,3})\s+(.+)$").expect("valid regex"));

    content
        .split('\n')
        .map(str::trim)
        .filter_map(|line| {
            let caps = HEADING_RE.captures(line)?;
            Some(Section {
                title: caps[2].to_string(),
                level: caps[1].len() as u8,
            })
        })
        .collect()
}

/// Parent of a document path; the root is its own parent.
pub fn parent_path(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return "/".to_string();
    }

    match path.trim_end_matches('/').rsplit_once('/') {
        Some((parent, _)) if !parent.is_empty() => parent.to_string(),
        _ => "/".to_string(),
    }
}
