//! Output types produced by the enrichment pipeline.
//!
//! Everything here is request-scoped and serialized straight into the
//! JSON returned to tool callers.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SnippetOutcome
// ---------------------------------------------------------------------------

/// A query-relevant excerpt chosen from a document body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnippetOutcome {
    /// Excerpt text, with `**term**` markers when highlighted.
    pub snippet: String,
    /// Relevance in `[0.0, 1.0]`.
    pub relevance_score: f64,
    /// Whether any query term was marked up.
    pub highlighted: bool,
    /// Query terms found in the best sentence, in query order.
    #[serde(default)]
    pub matched_terms: Vec<String>,
}

impl SnippetOutcome {
    /// Unhighlighted, zero-relevance outcome.
    pub fn unmatched(snippet: impl Into<String>) -> Self {
        Self {
            snippet: snippet.into(),
            relevance_score: 0.0,
            highlighted: false,
            matched_terms: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// RelatedSets
// ---------------------------------------------------------------------------

/// A document reference inside [`RelatedSets`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedEntry {
    pub title: String,
    pub path: String,
    pub portal_url: String,
}

/// Results related to a given path, bucketed by relationship.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedSets {
    /// Siblings sharing the first path segment.
    pub same_section: Vec<RelatedEntry>,
    /// Ancestors of the current path.
    pub parent_topics: Vec<RelatedEntry>,
    /// Descendants of the current path.
    pub child_topics: Vec<RelatedEntry>,
    pub see_also: Vec<RelatedEntry>,
}

impl RelatedSets {
    /// True when every bucket is empty.
    pub fn is_empty(&self) -> bool {
        self.same_section.is_empty()
            && self.parent_topics.is_empty()
            && self.child_topics.is_empty()
            && self.see_also.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Presentation types
// ---------------------------------------------------------------------------

/// One step of a suggested reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningStep {
    pub step: u32,
    pub title: String,
    pub path: String,
}

/// Entry of the top-level `quick_links` list on search responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickLink {
    pub title: String,
    pub url: String,
    pub description: String,
}

/// Prominent link attached to single-document responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectLink {
    pub title: String,
    pub url: String,
    pub message: String,
}

/// A Markdown heading found in document content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    /// Heading depth (1-3).
    pub level: u8,
}
