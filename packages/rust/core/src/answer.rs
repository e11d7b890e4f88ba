//! Quick-answer extraction for question-shaped queries.
//!
//! A query is matched against an ordered table of question shapes; the
//! paired answer shape is then searched for in the document body. The
//! table is plain data ([`ANSWER_RULES`]) so its priority order is
//! explicit and testable.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

/// Placeholder in answer patterns replaced by the escaped question subject.
const SUBJECT: &str = "{subject}";

/// Words never used as the subject of a definition lookup.
const DEFINITION_STOPLIST: [&str; 5] = ["what", "is", "the", "a", "an"];

/// A (question shape, answer shape) pair.
#[derive(Debug, Clone, Copy)]
pub struct AnswerRule {
    pub name: &'static str,
    /// Matched against the lower-cased query.
    pub question: &'static str,
    /// Searched for in the content. May reference the question's first
    /// capture group as `{subject}`.
    pub answer: &'static str,
}

/// Rules in priority order.
pub const ANSWER_RULES: &[AnswerRule] = &[
    AnswerRule {
        name: "what-is",
        question: r"what\s+is\s+(\w+)",
        answer: r"(?i)(\w+)\s+is\s+([^.]+)\.",
    },
    AnswerRule {
        name: "how-to",
        question: r"how\s+to\s+(.+)",
        answer: r"(?i)to\s+{subject}[^,]*,\s*([^.]+)\.",
    },
    AnswerRule {
        name: "whats-the",
        question: r"what'?s?\s+the\s+(\w+)",
        answer: r"(?i)the\s+{subject}\s+is\s+([^.]+)\.",
    },
    AnswerRule {
        name: "quantity",
        question: r"(limit|maximum|minimum|rate|cost|price)",
        answer: r"(?i)(limit|maximum|minimum|rate|cost|price)[^:]*:\s*([^.\n]+)",
    },
];

#[derive(Debug, Clone)]
enum AnswerPattern {
    Fixed(Regex),
    PerSubject(&'static str),
}

#[derive(Debug, Clone)]
struct CompiledRule {
    name: &'static str,
    question: Regex,
    answer: AnswerPattern,
}

/// Pulls one-line answers out of document bodies.
#[derive(Debug, Clone)]
pub struct QuickAnswerExtractor {
    rules: Vec<CompiledRule>,
}

impl QuickAnswerExtractor {
    /// Compile a rule table. Subject templates are validated with a
    /// placeholder subject.
    pub fn new(rules: &[AnswerRule]) -> Result<Self, regex::Error> {
        let rules = rules
            .iter()
            .map(|rule| {
                let answer = if rule.answer.contains(SUBJECT) {
                    Regex::new(&rule.answer.replace(SUBJECT, "x"))?;
                    AnswerPattern::PerSubject(rule.answer)
                } else {
                    AnswerPattern::Fixed(Regex::new(rule.answer)?)
                };
                Ok(CompiledRule {
                    name: rule.name,
                    question: Regex::new(rule.question)?,
                    answer,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self { rules })
    }

    /// Extractor built from [`ANSWER_RULES`].
    pub fn standard() -> &'static Self {
        static STANDARD: LazyLock<QuickAnswerExtractor> = LazyLock::new(|| {
            QuickAnswerExtractor::new(ANSWER_RULES).expect("valid answer rules")
        });
        &STANDARD
    }

    /// Try to answer `query` from `content`. `None` is a normal outcome.
    pub fn extract(&self, content: &str, query: &str) -> Option<String> {
        if content.is_empty() {
            return None;
        }

        let query_lower = query.to_lowercase();

        for rule in &self.rules {
            let Some(question) = rule.question.captures(&query_lower) else {
                continue;
            };

            let answer = match &rule.answer {
                AnswerPattern::Fixed(re) => first_answer(re, content),
                AnswerPattern::PerSubject(template) => {
                    let subject = question.get(1).map_or("", |m| m.as_str());
                    Regex::new(&template.replace(SUBJECT, &regex::escape(subject)))
                        .ok()
                        .and_then(|re| first_answer(&re, content))
                }
            };

            // The first rule whose pattern matches decides, even when its
            // answer trims to nothing.
            if let Some(answer) = answer {
                trace!(rule = rule.name, "quick answer found");
                return (!answer.is_empty()).then_some(answer);
            }
        }

        if query_lower.contains("what") || query_lower.contains("define") {
            return definition_answer(content, &query_lower).filter(|answer| !answer.is_empty());
        }

        None
    }
}

/// Last capture group of the first match, trimmed. May be empty.
fn first_answer(re: &Regex, content: &str) -> Option<String> {
    let caps = re.captures(content)?;
    let last = caps.get(caps.len() - 1)?;
    Some(last.as_str().trim().to_string())
}

/// Look for a `Term ...: definition` line for the first meaningful query word.
fn definition_answer(content: &str, query_lower: &str) -> Option<String> {
    static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid regex"));

    let term = WORD_RE
        .find_iter(query_lower)
        .map(|m| m.as_str())
        .find(|word| word.chars().count() >= 3 && !DEFINITION_STOPLIST.contains(word))?;

    let re = Regex::new(&format!(r"(?i){}[^:]*:\s*([^.\n]+)", regex::escape(term))).ok()?;
    trace!(term, "trying definition lookup");
    first_answer(&re, content)
}

/// Shorthand for [`QuickAnswerExtractor::standard`]`.extract`.
pub fn extract_quick_answer(content: &str, query: &str) -> Option<String> {
    QuickAnswerExtractor::standard().extract(content, query)
}
