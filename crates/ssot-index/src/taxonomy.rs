//! Tag validation against the controlled vocabulary.

use crate::vocabulary::Vocabulary;
use serde::{Deserialize, Serialize};
use ssot_core::Document;

/// Vocabulary terms suggested per unknown tag.
const MAX_SUGGESTIONS: usize = 3;

/// Characters a suggestion must share with the start of the tag.
const PREFIX_LEN: usize = 3;

/// A tag that is not in the controlled vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermIssue {
    pub term: String,
    pub message: String,
    pub suggestions: Vec<String>,
}

/// Tag issues found in one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentIssues {
    pub path: String,
    pub issues: Vec<TermIssue>,
}

/// Checks tags against the vocabulary. Tags are compared lower-cased.
pub fn validate_tags<S: AsRef<str>>(tags: &[S], vocabulary: &Vocabulary) -> Vec<TermIssue> {
    tags.iter()
        .map(|tag| tag.as_ref().trim().to_lowercase())
        .filter(|tag| !tag.is_empty() && !vocabulary.contains(tag))
        .map(|tag| TermIssue {
            message: format!("'{tag}' not in controlled vocabulary"),
            suggestions: suggestions(&tag, vocabulary),
            term: tag,
        })
        .collect()
}

/// Validates the front matter tags of every document.
///
/// Only documents with at least one issue are returned.
pub fn validate_corpus_tags(documents: &[Document], vocabulary: &Vocabulary) -> Vec<DocumentIssues> {
    let report: Vec<DocumentIssues> = documents
        .iter()
        .filter_map(|doc| {
            let issues = validate_tags(&doc.tags(), vocabulary);
            (!issues.is_empty()).then(|| DocumentIssues {
                path: doc.path.clone(),
                issues,
            })
        })
        .collect();
    tracing::debug!("Tag validation found issues in {} documents", report.len());
    report
}

fn suggestions(tag: &str, vocabulary: &Vocabulary) -> Vec<String> {
    let prefix: String = tag.chars().take(PREFIX_LEN).collect();
    // Terms come back sorted, so the first matches are the suggestions.
    vocabulary
        .terms()
        .filter(|term| term.starts_with(&prefix))
        .take(MAX_SUGGESTIONS)
        .map(str::to_string)
        .collect()
}
