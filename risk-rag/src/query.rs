//! Question analysis: vocabulary normalisation, retrieval planning and filter
//! extraction.
//!
//! These are plain rule tables over regular expressions. They are heuristics
//! and are kept together here so they can be tuned and tested on their own.
//!
//! Known limitation: a 3–6 digit number between 1900 and 2100 is read as a
//! year unless a keyword such as `risk` directly precedes it, so an
//! identifier like `2001` is only found when written as `risk 2001`.

use std::ops::RangeInclusive;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::AssistantConfig;

/// How to retrieve context for a question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum RetrievalPlan {
    /// Exact lookup of the listed identifiers, in order.
    ByIdentifiers { ids: Vec<String> },
    /// Nearest-neighbour search returning `top_k` documents.
    Semantic { top_k: usize },
}

/// Optional constraints parsed from a counting question.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsible: Option<String>,
}

impl FilterSet {
    /// Whether no filter is present.
    pub fn is_empty(&self) -> bool {
        self.year.is_none() && self.area.is_none() && self.responsible.is_none()
    }
}

fn rule(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid question rule pattern")
}

/// Closure vocabulary is rewritten to "ended" so questions use the same
/// words as the rendered documents. Applied in order.
static VOCABULARY_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (rule(r"(?i)\bclosing date\b"), "end date"),
        (rule(r"(?i)\bclosed\b"), "ended"),
        (rule(r"(?i)\bcloses\b"), "ends"),
        (rule(r"(?i)\bclosure\b"), "end"),
    ]
});

static NUMBER_TOKEN: LazyLock<Regex> = LazyLock::new(|| rule(r"\b\d{3,6}\b"));
static COUNT_WORDS: LazyLock<Regex> = LazyLock::new(|| rule(r"(?i)\bhow\s+many\b"));
static LISTING_WORDS: LazyLock<Regex> = LazyLock::new(|| rule(r"(?i)\b(which|list|lists|show)\b"));
static COUNT_ENDED: LazyLock<Regex> =
    LazyLock::new(|| rule(r"(?is)\bhow\s+many\s+points?\b.*\bended\b"));
static YEAR_FILTER: LazyLock<Regex> = LazyLock::new(|| rule(r"\b(\d{4})\b"));
static AREA_FILTER: LazyLock<Regex> = LazyLock::new(|| rule(r"(?i)\barea\s+(\w+)"));
static RESPONSIBLE_FILTER: LazyLock<Regex> =
    LazyLock::new(|| rule(r"(?i)\bresponsible\s+([\w\s]+)"));

const YEAR_LIKE: RangeInclusive<u32> = 1900..=2100;
const ID_KEYWORDS: &str = "id|point|risk|deficiency";

/// Rewrite closure vocabulary to its canonical form.
pub fn normalize_question(question: &str) -> String {
    VOCABULARY_RULES
        .iter()
        .fold(question.to_string(), |text, (pattern, replacement)| {
            pattern.replace_all(&text, *replacement).into_owned()
        })
}

/// Extract up to `max` record identifiers mentioned in the question.
///
/// Year-like numbers count only when qualified by a preceding keyword
/// (`id`, `point`, `risk`, `deficiency`) at most five non-digit characters
/// away. Duplicates are dropped, keeping first-seen order.
pub fn extract_identifiers(question: &str, max: usize) -> Vec<String> {
    let lower = question.to_lowercase();
    let mut ids: Vec<String> = Vec::new();

    for token in NUMBER_TOKEN.find_iter(&lower) {
        let number = token.as_str();
        let looks_like_year = number.parse::<u32>().is_ok_and(|n| YEAR_LIKE.contains(&n));
        if looks_like_year && !is_qualified(&lower, number) {
            continue;
        }
        if !ids.iter().any(|id| id == number) {
            ids.push(number.to_string());
        }
    }

    ids.truncate(max);
    ids
}

fn is_qualified(question: &str, number: &str) -> bool {
    let pattern = format!(r"({ID_KEYWORDS})[^\d]{{0,5}}{}\b", regex::escape(number));
    Regex::new(&pattern).is_ok_and(|re| re.is_match(question))
}

/// Result size for a semantic search, by question shape.
pub fn choose_top_k(question: &str, config: &AssistantConfig) -> usize {
    if COUNT_WORDS.is_match(question) {
        config.count_top_k
    } else if LISTING_WORDS.is_match(question) {
        config.listing_top_k
    } else {
        config.default_top_k
    }
}

/// Decide the retrieval strategy for an already normalised question.
pub fn classify(question: &str, config: &AssistantConfig) -> RetrievalPlan {
    let ids = extract_identifiers(question, config.max_identifiers);
    if ids.is_empty() {
        RetrievalPlan::Semantic { top_k: choose_top_k(question, config) }
    } else {
        RetrievalPlan::ByIdentifiers { ids }
    }
}

/// Parse year, area and responsible-party constraints from a question.
pub fn extract_filters(question: &str) -> FilterSet {
    FilterSet {
        year: first_capture(&YEAR_FILTER, question).map(str::to_string),
        area: first_capture(&AREA_FILTER, question).map(str::to_lowercase),
        responsible: first_capture(&RESPONSIBLE_FILTER, question)
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty()),
    }
}

fn first_capture<'a>(re: &Regex, text: &'a str) -> Option<&'a str> {
    re.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// Whether the question asks how many points were ended.
pub fn is_count_question(question: &str) -> bool {
    COUNT_ENDED.is_match(question)
}
