//! Alternative queries and suggested learning paths.

use docbridge_shared::LearningStep;

/// Maximum number of alternative queries returned.
const MAX_SUGGESTIONS: usize = 3;

/// Keyword → replacement terms, applied in table order.
const SYNONYMS: &[(&str, &[&str])] = &[
    ("login", &["authentication", "sign in", "access"]),
    ("error", &["issue", "problem", "troubleshooting"]),
    ("create", &["add", "new", "make"]),
    ("delete", &["remove", "destroy", "clear"]),
    ("update", &["modify", "change", "edit"]),
];

/// Propose up to three alternative queries for a search that found nothing.
///
/// The singular/plural flip always comes first, followed by synonym
/// substitutions on the lower-cased query.
pub fn suggest_alternatives(query: &str) -> Vec<String> {
    let mut suggestions = Vec::new();

    match query.strip_suffix('s') {
        Some(singular) => suggestions.push(singular.to_string()),
        None => suggestions.push(format!("{query}s")),
    }

    let query_lower = query.to_lowercase();
    for (word, alternatives) in SYNONYMS {
        if query_lower.contains(word) {
            suggestions.extend(alternatives.iter().map(|alt| query_lower.replace(word, alt)));
        }
    }

    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}

// ---------------------------------------------------------------------------
// Learning paths
// ---------------------------------------------------------------------------

type PathTable = &'static [(&'static str, &'static str)];

/// Topic keyword → ordered (title, path) steps. Checked in order.
const LEARNING_PATHS: &[(&str, PathTable)] = &[
    (
        "getting-started",
        &[
            ("Overview", "/overview"),
            ("Installation", "/installation"),
            ("Configuration", "/configuration"),
            ("First Steps", "/first-steps"),
            ("Best Practices", "/best-practices"),
        ],
    ),
    (
        "api",
        &[
            ("API Overview", "/api/overview"),
            ("Authentication", "/api/authentication"),
            ("Making Requests", "/api/requests"),
            ("Response Handling", "/api/responses"),
            ("Error Handling", "/api/errors"),
        ],
    ),
    (
        "troubleshooting",
        &[
            ("Common Issues", "/troubleshooting/common"),
            ("Error Messages", "/troubleshooting/errors"),
            ("Debugging Steps", "/troubleshooting/debugging"),
            ("Getting Help", "/support"),
        ],
    ),
];

const DEFAULT_LEARNING_PATH: PathTable = &[
    ("Start Here", "/"),
    ("Core Concepts", "/concepts"),
    ("Practical Guides", "/guides"),
    ("Reference", "/reference"),
];

/// Suggested reading order for a topic or query.
pub fn learning_path(topic: &str) -> Vec<LearningStep> {
    let topic = topic.to_lowercase();
    let steps = LEARNING_PATHS
        .iter()
        .find(|(key, _)| topic.contains(key))
        .map_or(DEFAULT_LEARNING_PATH, |(_, steps)| *steps);

    steps
        .iter()
        .zip(1..)
        .map(|((title, path), step)| LearningStep {
            step,
            title: (*title).to_string(),
            path: (*path).to_string(),
        })
        .collect()
}
