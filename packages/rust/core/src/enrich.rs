//! Search-response enrichment orchestrator.
//!
//! Composes URL annotation, smart snippets, quick answers, categorization
//! and query suggestions over a raw Deploy API response.

use std::cmp::Ordering;

use serde_json::{Map, Value, json};
use tracing::{debug, info, instrument};

use crate::answer::QuickAnswerExtractor;
use crate::categorize::categorize;
use crate::extract::{extract_key_facts, extract_sections, parent_path};
use crate::present::add_presentation_links;
use crate::snippet::{DEFAULT_SNIPPET_LENGTH, extract_snippet};
use crate::suggest::{learning_path, suggest_alternatives};
use crate::urls::PortalUrls;
use crate::{MAX_PROCESSED_RESULTS, str_field};

/// Relevance given to results without a `content` body.
const DEFAULT_RELEVANCE: f64 = 0.5;

/// Number of enhanced results echoed in `enhanced_search.top_results`.
const TOP_RESULTS: usize = 5;

/// Aggregate produced by [`Enricher::enhance_results`].
#[derive(Debug, Clone)]
pub struct EnhancedSearch {
    pub total_results: usize,
    /// Up to ten results with scoring fields, sorted by relevance.
    pub enhanced_results: Vec<Value>,
    pub quick_answer: Option<String>,
    /// Alternatives, only filled when there were no results.
    pub suggested_queries: Vec<String>,
    pub categories: Map<String, Value>,
}

/// Applies the enrichment pipeline to Deploy API responses.
#[derive(Debug, Clone)]
pub struct Enricher {
    portal: PortalUrls,
    answers: QuickAnswerExtractor,
}

impl Enricher {
    /// Enricher with the standard quick-answer rules.
    pub fn new(portal: PortalUrls) -> Self {
        Self::with_answers(portal, QuickAnswerExtractor::standard().clone())
    }

    pub fn with_answers(portal: PortalUrls, answers: QuickAnswerExtractor) -> Self {
        Self { portal, answers }
    }

    pub fn portal(&self) -> &PortalUrls {
        &self.portal
    }

    /// Enrich a raw search response for `query`.
    ///
    /// The tree is annotated with portal URLs first. When it carries a
    /// `results` array, `enhanced_search` and `suggested_learning_path`
    /// are attached, plus `did_you_mean` when the array is empty.
    #[instrument(skip_all, fields(query = %query))]
    pub fn enrich(&self, raw: &Value, query: &str) -> Value {
        let mut tree = self.portal.annotate(raw);

        let enhanced = tree
            .get("results")
            .and_then(Value::as_array)
            .map(|results| self.enhance_results(results, query));

        if let (Some(enhanced), Some(map)) = (enhanced, tree.as_object_mut()) {
            let no_results = enhanced.total_results == 0;

            let mut summary = json!({
                "quick_answer": enhanced.quick_answer,
                "total_results": enhanced.total_results,
                "categories": enhanced.categories,
                "top_results": enhanced.enhanced_results.iter().take(TOP_RESULTS).collect::<Vec<_>>(),
            });
            if no_results {
                summary["suggested_queries"] = json!(enhanced.suggested_queries);
            }

            map.insert("enhanced_search".into(), summary);
            map.insert("suggested_learning_path".into(), json!(learning_path(query)));
            if no_results {
                map.insert("did_you_mean".into(), json!(suggest_alternatives(query)));
            }

            info!(
                total = enhanced.total_results,
                quick_answer = enhanced.quick_answer.is_some(),
                "search enriched"
            );
        }

        add_presentation_links(&mut tree, &self.portal);
        tree
    }

    /// Score, snippet and categorize the first ten results.
    pub fn enhance_results(&self, results: &[Value], query: &str) -> EnhancedSearch {
        let mut quick_answer = None;
        let mut answer_attempted = false;
        let mut scored: Vec<(f64, Value)> = Vec::new();

        for result in results.iter().take(MAX_PROCESSED_RESULTS) {
            let Value::Object(fields) = result else {
                continue;
            };

            let snippet = str_field(result, "content").map(|content| {
                if !answer_attempted {
                    answer_attempted = true;
                    quick_answer = self.answers.extract(content, query);
                }
                extract_snippet(content, query, DEFAULT_SNIPPET_LENGTH)
            });

            let mut enhanced = fields.clone();
            let relevance = match &snippet {
                Some(snippet) => {
                    enhanced.insert("relevance_score".into(), json!(snippet.relevance_score));
                    enhanced.insert("smart_snippet".into(), json!(snippet.snippet));
                    enhanced.insert("highlighted_terms".into(), json!(snippet.matched_terms));
                    snippet.relevance_score
                }
                None => {
                    let description = str_field(result, "description").unwrap_or("");
                    enhanced.insert("relevance_score".into(), json!(DEFAULT_RELEVANCE));
                    enhanced.insert("smart_snippet".into(), json!(description));
                    enhanced.insert("highlighted_terms".into(), json!([]));
                    DEFAULT_RELEVANCE
                }
            };

            scored.push((relevance, Value::Object(enhanced)));
        }

        // Stable: equal scores keep API order.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        let suggested_queries = if results.is_empty() {
            suggest_alternatives(query)
        } else {
            Vec::new()
        };

        debug!(processed = scored.len(), "results enhanced");

        EnhancedSearch {
            total_results: results.len(),
            enhanced_results: scored.into_iter().map(|(_, value)| value).collect(),
            quick_answer,
            suggested_queries,
            categories: categorize(results),
        }
    }

    /// Annotate a single-document response and attach key facts, sections
    /// and, when the document was requested by path, its parent topic.
    #[instrument(skip_all, fields(for_path = for_path.unwrap_or("")))]
    pub fn enrich_content(&self, raw: &Value, for_path: Option<&str>) -> Value {
        let mut tree = self.portal.annotate(raw);

        if let Some(map) = tree.as_object_mut() {
            if let Some(content) = map.get("content").and_then(Value::as_str) {
                let facts = extract_key_facts(content);
                let sections = extract_sections(content);
                map.insert("key_facts".into(), json!(facts));
                map.insert("sections".into(), json!(sections));
            }

            if let Some(path) = for_path {
                map.insert(
                    "related_suggestions".into(),
                    json!({
                        "next_steps": "Use search_deployment to find related content",
                        "parent_topic": parent_path(path),
                    }),
                );
            }
        }

        add_presentation_links(&mut tree, &self.portal);
        tree
    }

    /// Annotate any other response and attach presentation links.
    pub fn decorate(&self, raw: &Value) -> Value {
        let mut tree = self.portal.annotate(raw);
        add_presentation_links(&mut tree, &self.portal);
        tree
    }
}
