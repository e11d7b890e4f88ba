//! Smart snippet extraction.
//!
//! Picks the sentence that best matches a query, widens it with one
//! sentence of context on each side, and marks query terms with `**`.

use regex::{NoExpand, RegexBuilder};

use docbridge_shared::SnippetOutcome;

/// Default maximum snippet length, in characters.
pub const DEFAULT_SNIPPET_LENGTH: usize = 300;

/// Extract the most relevant excerpt of `content` for `query`.
///
/// Scoring per sentence: one point per query term it contains, plus the
/// term count again when the whole query appears verbatim, and the total
/// is multiplied by 1.5 when it exceeds 1. Ties go to the earliest
/// sentence. When nothing matches, the head of `content` is returned with
/// zero relevance.
pub fn extract_snippet(content: &str, query: &str, max_length: usize) -> SnippetOutcome {
    if content.is_empty() {
        return SnippetOutcome::unmatched("");
    }

    let query_lower = query.to_lowercase();
    let terms: Vec<&str> = query_lower.split_whitespace().collect();
    let sentences = split_sentences(content);

    let mut best_idx = 0;
    let mut best_score = 0.0_f64;
    for (idx, sentence) in sentences.iter().enumerate() {
        let score = score_sentence(&sentence.to_lowercase(), &query_lower, &terms);
        if score > best_score {
            best_idx = idx;
            best_score = score;
        }
    }

    if best_score == 0.0 {
        let snippet = if content.chars().count() > max_length {
            format!("{}...", take_chars(content, max_length))
        } else {
            content.to_string()
        };
        return SnippetOutcome::unmatched(snippet);
    }

    let start = best_idx.saturating_sub(1);
    let end = (best_idx + 2).min(sentences.len());
    let window = sentences[start..end].join(" ");

    let mut snippet = highlight_terms(&window, &terms);
    if snippet.chars().count() > max_length {
        let prefix = take_chars(&snippet, max_length);
        let cut = prefix.rsplit_once(' ').map_or(prefix, |(head, _)| head);
        snippet = format!("{cut}...");
    }

    let best_lower = sentences[best_idx].to_lowercase();
    let matched_terms = terms
        .iter()
        .filter(|term| best_lower.contains(**term))
        .map(|term| term.to_string())
        .collect();

    SnippetOutcome {
        snippet,
        relevance_score: (best_score / terms.len() as f64).min(1.0),
        highlighted: true,
        matched_terms,
    }
}

/// Score one lower-cased sentence against the query terms.
fn score_sentence(sentence_lower: &str, query_lower: &str, terms: &[&str]) -> f64 {
    let mut score = terms
        .iter()
        .filter(|term| sentence_lower.contains(**term))
        .count() as f64;

    if sentence_lower.contains(query_lower) {
        score += terms.len() as f64;
    }

    if score > 1.0 {
        score *= 1.5;
    }

    score
}

/// Split after `.`, `!` or `?` when followed by whitespace. The whitespace
/// run between sentences is dropped.
fn split_sentences(content: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = content.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let Some(&(boundary, next)) = chars.peek() else {
            break;
        };
        if !next.is_whitespace() {
            continue;
        }

        sentences.push(&content[start..boundary]);
        let mut resume = boundary;
        while let Some(&(idx, ws)) = chars.peek() {
            if !ws.is_whitespace() {
                break;
            }
            resume = idx + ws.len_utf8();
            chars.next();
        }
        start = resume;
    }

    sentences.push(&content[start..]);
    sentences
}

/// Wrap every case-insensitive occurrence of each term in `**`.
/// Terms are applied one after another, so overlapping terms can nest.
fn highlight_terms(text: &str, terms: &[&str]) -> String {
    let mut result = text.to_string();
    for term in terms {
        let Ok(re) = RegexBuilder::new(&regex::escape(term))
            .case_insensitive(true)
            .build()
        else {
            continue;
        };
        let marked = format!("**{term}**");
        result = re.replace_all(&result, NoExpand(&marked)).into_owned();
    }
    result
}

/// The first `n` characters of `s` (not bytes).
fn take_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "The cat sat. The cat ran fast. Dogs bark.";

    #[test]
    fn empty_content_has_zero_relevance() {
        let outcome = extract_snippet("", "anything", DEFAULT_SNIPPET_LENGTH);
        assert_eq!(outcome.snippet, "");
        assert_eq!(outcome.relevance_score, 0.0);
        assert!(!outcome.highlighted);
    }

    #[test]
    fn picks_best_sentence_with_context() {
        let outcome = extract_snippet(SAMPLE, "cat ran", DEFAULT_SNIPPET_LENGTH);
        assert_eq!(
            outcome.snippet,
            "The **cat** sat. The **cat** **ran** fast. Dogs bark."
        );
        assert_eq!(outcome.relevance_score, 1.0);
        assert!(outcome.highlighted);
        assert_eq!(outcome.matched_terms, vec!["cat", "ran"]);
    }

    #[test]
    fn context_window_is_clamped() {
        let content = "Alpha one. Beta two. Gamma three. Delta four.";
        let outcome = extract_snippet(content, "alpha", DEFAULT_SNIPPET_LENGTH);
        assert_eq!(outcome.snippet, "**alpha** one. Beta two.");

        let outcome = extract_snippet(content, "delta", DEFAULT_SNIPPET_LENGTH);
        assert_eq!(outcome.snippet, "Gamma three. **delta** four.");
    }

    #[test]
    fn ties_go_to_the_earliest_sentence() {
        let content = "First mentions docs. Second also mentions docs. Third.";
        let outcome = extract_snippet(content, "docs", DEFAULT_SNIPPET_LENGTH);
        // Best is sentence 0, so the window is sentences 0..2.
        assert_eq!(
            outcome.snippet,
            "First mentions **docs**. Second also mentions **docs**."
        );
    }

    #[test]
    fn single_term_relevance_is_one() {
        let outcome = extract_snippet("Setup is easy.", "setup", DEFAULT_SNIPPET_LENGTH);
        assert_eq!(outcome.relevance_score, 1.0);
    }

    #[test]
    fn partial_match_relevance_is_fractional() {
        let outcome = extract_snippet(
            "Tokens expire daily. Nothing else here.",
            "tokens rotate weekly",
            DEFAULT_SNIPPET_LENGTH,
        );
        assert!((outcome.relevance_score - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(outcome.matched_terms, vec!["tokens"]);
    }

    #[test]
    fn no_match_falls_back_to_content_head() {
        let content = "x".repeat(400);
        let outcome = extract_snippet(&content, "missing", 300);
        assert_eq!(outcome.snippet.len(), 303);
        assert!(outcome.snippet.ends_with("..."));
        assert_eq!(outcome.relevance_score, 0.0);
        assert!(!outcome.highlighted);
        assert!(outcome.matched_terms.is_empty());

        let outcome = extract_snippet("Short text.", "missing", 300);
        assert_eq!(outcome.snippet, "Short text.");
    }

    #[test]
    fn long_window_is_cut_at_a_space() {
        let content = format!("Intro. The keyword {} end. Outro.", "word ".repeat(30));
        let outcome = extract_snippet(&content, "keyword", 40);
        assert!(outcome.snippet.ends_with("..."));
        assert!(outcome.snippet.chars().count() <= 43);
        assert!(!outcome.snippet.trim_end_matches("...").ends_with(' '));
    }

    #[test]
    fn matched_terms_come_from_best_sentence_only() {
        let content = "Install the agent. Configure the proxy now.";
        let outcome = extract_snippet(content, "configure agent", DEFAULT_SNIPPET_LENGTH);
        // Both sentences score 1; the first wins the tie.
        assert_eq!(outcome.matched_terms, vec!["agent"]);
    }

    #[test]
    fn highlighting_is_case_insensitive() {
        let outcome = extract_snippet("API keys are secret.", "api", DEFAULT_SNIPPET_LENGTH);
        assert_eq!(outcome.snippet, "**api** keys are secret.");
    }

    #[test]
    fn overlapping_terms_may_nest() {
        let outcome = extract_snippet("The cat naps.", "cat ca", DEFAULT_SNIPPET_LENGTH);
        assert_eq!(outcome.snippet, "The ****ca**t** naps.");
    }

    #[test]
    fn regex_metacharacters_in_query_are_literal() {
        let outcome = extract_snippet("Use a.b (v2) here.", "(v2)", DEFAULT_SNIPPET_LENGTH);
        assert_eq!(outcome.snippet, "Use a.b **(v2)** here.");
    }

    #[test]
    fn sentence_split_consumes_whitespace_runs() {
        let parts = split_sentences("One.  Two!\nThree? Four");
        assert_eq!(parts, vec!["One.", "Two!", "Three?", "Four"]);
        assert_eq!(split_sentences("v1.2 is out"), vec!["v1.2 is out"]);
    }

    #[test]
    fn multibyte_content_is_truncated_on_char_boundaries() {
        let content = "é".repeat(10);
        let outcome = extract_snippet(&content, "zzz", 4);
        assert_eq!(outcome.snippet, "éééé...");
    }
}
