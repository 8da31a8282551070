//! Keyword relevance ranking and answer extraction.
//!
//! Scoring is a fixed weighted sum, so identical corpus and query always
//! produce identical results:
//!
//! | component                                   | weight |
//! |---------------------------------------------|--------|
//! | keywords found in the title or path         | 0.50   |
//! | keywords found anywhere in the term index   | 0.35   |
//! | keyword coverage of the best section        | 0.15   |
//!
//! Each component is the fraction of query keywords it contains.

use crate::term_index::TermIndex;
use crate::tokenize::{is_stop_word, tokenize};
use serde::{Deserialize, Serialize};
use ssot_core::{CategoryFilter, Document, Section};
use std::collections::HashSet;

pub const TITLE_WEIGHT: f64 = 0.5;
pub const INDEX_WEIGHT: f64 = 0.35;
pub const SECTION_WEIGHT: f64 = 0.15;

/// Scores at or above this map to full confidence.
pub const CONFIDENCE_SATURATION: f64 = 0.85;

/// Characters of the selected section quoted in the answer.
const ANSWER_EXCERPT_CHARS: usize = 500;

const NO_RESULTS: &str = "No relevant information found.";

/// A search request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub category: CategoryFilter,
    pub topic: Option<String>,
    pub question: String,
}

impl Query {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: CategoryFilter) -> Self {
        self.category = category;
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Distinct keywords of topic and question, stop words removed, in order of appearance.
    pub fn keywords(&self, compounds: &HashSet<String>) -> Vec<String> {
        let text = match &self.topic {
            Some(topic) => format!("{topic} {}", self.question),
            None => self.question.clone(),
        };
        let mut seen = HashSet::new();
        tokenize(&text, compounds)
            .into_iter()
            .map(|t| t.term)
            .filter(|term| !is_stop_word(term))
            .filter(|term| seen.insert(term.clone()))
            .collect()
    }
}

/// One ranked document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryHit {
    pub path: String,
    pub title: String,
    /// Heading of the selected section, e.g. `## Best Practices`.
    pub section: String,
    pub section_index: usize,
    pub score: f64,
    /// Keywords found anywhere in the document.
    pub matched_keywords: Vec<String>,
}

/// Ranked results with a confidence value and an extracted answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub question: String,
    pub keywords: Vec<String>,
    pub results: Vec<QueryHit>,
    pub confidence: f64,
    pub answer: String,
}

impl QueryResult {
    /// A result with no hits. Not an error.
    pub fn empty(question: impl Into<String>, keywords: Vec<String>) -> Self {
        Self {
            question: question.into(),
            keywords,
            results: Vec::new(),
            confidence: 0.0,
            answer: NO_RESULTS.to_string(),
        }
    }

    pub fn top(&self) -> Option<&QueryHit> {
        self.results.first()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Ranks `documents` against `query`, returning at most `max_results` hits.
///
/// `index` must be built over the same documents.
pub fn rank(
    documents: &[Document],
    index: &TermIndex,
    query: &Query,
    max_results: usize,
) -> QueryResult {
    let compounds = index.vocabulary().compounds();
    let keywords = query.keywords(&compounds);
    if keywords.is_empty() {
        tracing::debug!("Query has no keywords after stop-word removal");
        return QueryResult::empty(&query.question, keywords);
    }

    let mut scored: Vec<(QueryHit, &Section)> = documents
        .iter()
        .filter(|doc| query.category.matches(doc.category))
        .filter_map(|doc| score_document(doc, index, &keywords, &compounds))
        .collect();

    scored.sort_by(|a, b| {
        b.0.score
            .total_cmp(&a.0.score)
            .then_with(|| a.0.path.cmp(&b.0.path))
    });
    scored.truncate(max_results.max(1));

    let Some((top, section)) = scored.first() else {
        tracing::info!(keywords = keywords.len(), "Query matched no documents");
        return QueryResult::empty(&query.question, keywords);
    };

    let confidence = top.score.min(CONFIDENCE_SATURATION) / CONFIDENCE_SATURATION;
    let excerpt: String = section.body.chars().take(ANSWER_EXCERPT_CHARS).collect();
    let answer = format!(
        "Relevant information found in {}, {} section.\n\n{}",
        top.path, top.section, excerpt
    );

    tracing::info!(
        keywords = keywords.len(),
        results = scored.len(),
        "Top result {} (confidence {:.2})",
        top.path,
        confidence
    );

    QueryResult {
        question: query.question.clone(),
        keywords,
        results: scored.into_iter().map(|(hit, _)| hit).collect(),
        confidence,
        answer,
    }
}

fn term_set(text: &str, compounds: &HashSet<String>) -> HashSet<String> {
    tokenize(text, compounds).into_iter().map(|t| t.term).collect()
}

fn fraction(hits: usize, total: usize) -> f64 {
    hits as f64 / total as f64
}

fn score_document<'d>(
    doc: &'d Document,
    index: &TermIndex,
    keywords: &[String],
    compounds: &HashSet<String>,
) -> Option<(QueryHit, &'d Section)> {
    let heading_terms = term_set(&format!("{} {}", doc.title, doc.path), compounds);
    let title_hits = keywords.iter().filter(|k| heading_terms.contains(*k)).count();

    let matched_keywords: Vec<String> = keywords
        .iter()
        .filter(|k| heading_terms.contains(*k) || index.count(&doc.path, k) > 0)
        .cloned()
        .collect();
    let index_hits = keywords
        .iter()
        .filter(|k| index.count(&doc.path, k) > 0)
        .count();

    // Highest coverage wins; the first section keeps ties.
    let mut best: Option<(usize, &Section, usize)> = None;
    for (idx, section) in doc.sections.iter().enumerate() {
        let terms = term_set(&format!("{}\n{}", section.heading, section.body), compounds);
        let hits = keywords.iter().filter(|k| terms.contains(*k)).count();
        if best.map_or(true, |(_, _, top)| hits > top) {
            best = Some((idx, section, hits));
        }
    }
    let (section_index, section, section_hits) = best?;

    if title_hits == 0 && index_hits == 0 && section_hits == 0 {
        return None;
    }

    let n = keywords.len();
    let score = TITLE_WEIGHT * fraction(title_hits, n)
        + INDEX_WEIGHT * fraction(index_hits, n)
        + SECTION_WEIGHT * fraction(section_hits, n);

    Some((
        QueryHit {
            path: doc.path.clone(),
            title: doc.title.clone(),
            section: section.marker(),
            section_index,
            score,
            matched_keywords,
        },
        section,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::Vocabulary;
    use pretty_assertions::assert_eq;
    use ssot_core::Category;

    const AGENTS: &str = "\
# AGENTS

Overview of the agents in this repository.

## Setup

Install the toolchain.

## Best Practices

Agents should follow these best practices: keep prompts short.
";

    fn corpus() -> Vec<Document> {
        vec![
            Document::parse("files/AGENTS.md", AGENTS),
            Document::parse("files/notes.md", "# Notes\n\nThe best coffee.\n"),
            Document::parse("tools/agents.md", "# Agent tools\n\nBest practices for agents.\n"),
        ]
    }

    fn run(query: &Query) -> QueryResult {
        let docs = corpus();
        let index = TermIndex::build(&docs, &Vocabulary::new());
        rank(&docs, &index, query, 5)
    }

    #[test]
    fn test_keywords_drop_stop_words_and_duplicates() {
        let query = Query::new("What are the best practices for the best agents?");
        assert_eq!(query.keywords(&HashSet::new()), vec!["best", "practices", "agents"]);

        let query = Query::new("review").with_topic("Multi-Agent");
        let compounds = HashSet::from(["multi-agent".to_string()]);
        assert_eq!(query.keywords(&compounds), vec!["multi-agent", "review"]);
    }

    #[test]
    fn test_best_section_selected() {
        let query = Query::new("AGENTS best practices")
            .with_category(CategoryFilter::Only(Category::Files));
        let result = run(&query);

        let top = result.top().unwrap();
        assert_eq!(top.path, "files/AGENTS.md");
        assert_eq!(top.section, "## Best Practices");
        assert_eq!(top.section_index, 2);
        assert!(result.confidence > 0.0);
        assert!(result
            .answer
            .starts_with("Relevant information found in files/AGENTS.md, ## Best Practices section.\n\n"));
        assert!(result.answer.ends_with("keep prompts short."));
    }

    #[test]
    fn test_category_filter_restricts_candidates() {
        let query = Query::new("agents").with_category(CategoryFilter::Only(Category::Tools));
        let result = run(&query);
        let paths: Vec<&str> = result.results.iter().map(|h| h.path.as_str()).collect();
        assert_eq!(paths, vec!["tools/agents.md"]);
    }

    #[test]
    fn test_ties_broken_by_path() {
        let docs = vec![
            Document::parse("b.md", "# Same\n\nwidget\n"),
            Document::parse("a.md", "# Same\n\nwidget\n"),
        ];
        let index = TermIndex::build(&docs, &Vocabulary::new());
        let result = rank(&docs, &index, &Query::new("widget"), 5);
        let paths: Vec<&str> = result.results.iter().map(|h| h.path.as_str()).collect();
        assert_eq!(paths, vec!["a.md", "b.md"]);
        assert_eq!(result.results[0].score, result.results[1].score);
    }

    #[test]
    fn test_max_results_caps_output() {
        let docs: Vec<Document> = (0..8)
            .map(|i| Document::parse(format!("d{i}.md"), "widget"))
            .collect();
        let index = TermIndex::build(&docs, &Vocabulary::new());
        let result = rank(&docs, &index, &Query::new("widget"), 3);
        assert_eq!(result.results.len(), 3);
    }

    #[test]
    fn test_no_keywords_is_empty_result() {
        let result = run(&Query::new("what is the"));
        assert!(result.is_empty());
        assert!(result.keywords.is_empty());
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.answer, "No relevant information found.");
    }

    #[test]
    fn test_no_match_is_empty_result() {
        let result = run(&Query::new("kubernetes"));
        assert!(result.is_empty());
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.keywords, vec!["kubernetes"]);
    }

    #[test]
    fn test_confidence_saturates() {
        let docs = vec![Document::parse("widget.md", "# Widget\n\nwidget")];
        let index = TermIndex::build(&docs, &Vocabulary::new());
        let result = rank(&docs, &index, &Query::new("widget"), 5);
        assert!((result.results[0].score - 1.0).abs() < 1e-9);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_answer_excerpt_truncated() {
        let body = format!("# Long\n\n{}", "é".repeat(800));
        let docs = vec![Document::parse("long.md", body)];
        let index = TermIndex::build(&docs, &Vocabulary::new());
        let result = rank(&docs, &index, &Query::new("long"), 5);
        let excerpt = result.answer.split("\n\n").nth(1).unwrap();
        assert_eq!(excerpt.chars().count(), 500);
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let query = Query::new("best practices agents");
        assert_eq!(run(&query), run(&query));
    }
}
