//! Inverted index of terms per document.
//!
//! Built once per corpus snapshot and never updated incrementally. Besides
//! per-document counts, every spelling seen for a term is recorded so
//! casing drift against the vocabulary can be reported.

use crate::tokenize::{is_numeric, is_stop_word, tokenize, Token};
use crate::vocabulary::Vocabulary;
use serde::{Deserialize, Serialize};
use ssot_core::Document;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Frequent terms listed in usage recommendations.
const FREQUENT_TERMS: usize = 5;

/// Unused terms listed by name in usage recommendations.
const UNUSED_EXAMPLES: usize = 5;

/// Documents containing a term and how often each does.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermEntry {
    /// Document path to occurrence count.
    pub documents: BTreeMap<String, usize>,
    /// Spelling to occurrence count across the corpus.
    pub surfaces: BTreeMap<String, usize>,
}

impl TermEntry {
    pub fn total(&self) -> usize {
        self.documents.values().sum()
    }
}

/// A term seen with more than one capitalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasingIssue {
    pub term: String,
    pub canonical: String,
    /// Every spelling observed, with counts.
    pub variants: BTreeMap<String, usize>,
}

/// A frequently used term missing from the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndefinedTerm {
    pub term: String,
    pub count: usize,
}

/// Term index over a corpus.
#[derive(Debug, Clone, Default)]
pub struct TermIndex {
    entries: HashMap<String, TermEntry>,
    vocabulary: Vocabulary,
    document_count: usize,
}

impl TermIndex {
    /// Tokenizes every document body, front matter excluded.
    pub fn build(documents: &[Document], vocabulary: &Vocabulary) -> Self {
        let compounds = vocabulary.compounds();
        let phrases = vocabulary.phrases();
        let mut entries: HashMap<String, TermEntry> = HashMap::new();

        for doc in documents {
            let mut seen: Vec<(usize, &str, Token<'_>)> = Vec::new();
            for (line_no, line) in doc.content_lines() {
                for token in tokenize(line, &compounds) {
                    let entry = entries.entry(token.term.clone()).or_default();
                    *entry.documents.entry(doc.path.clone()).or_default() += 1;
                    *entry.surfaces.entry(token.surface.to_string()).or_default() += 1;
                    seen.push((line_no, line, token));
                }
            }

            for (phrase, words) in &phrases {
                let mut surfaces: BTreeMap<String, usize> = BTreeMap::new();
                for window in seen.windows(words.len()) {
                    let matched = window
                        .iter()
                        .zip(words)
                        .all(|((_, _, token), word)| token.term == *word);
                    if matched {
                        *surfaces.entry(phrase_surface(window)).or_default() += 1;
                    }
                }
                let count: usize = surfaces.values().sum();
                if count > 0 {
                    let entry = entries.entry(phrase.clone()).or_default();
                    *entry.documents.entry(doc.path.clone()).or_default() += count;
                    for (surface, n) in surfaces {
                        *entry.surfaces.entry(surface).or_default() += n;
                    }
                }
            }
        }

        tracing::debug!(
            "Indexed {} terms across {} documents",
            entries.len(),
            documents.len()
        );

        Self {
            entries,
            vocabulary: vocabulary.clone(),
            document_count: documents.len(),
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Number of distinct terms.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn document_count(&self) -> usize {
        self.document_count
    }

    pub fn entry(&self, term: &str) -> Option<&TermEntry> {
        self.entries.get(&term.to_lowercase())
    }

    /// Per-document occurrence counts for a term.
    pub fn occurrences(&self, term: &str) -> BTreeMap<String, usize> {
        self.entry(term)
            .map(|entry| entry.documents.clone())
            .unwrap_or_default()
    }

    /// Occurrences of a term in one document.
    pub fn count(&self, path: &str, term: &str) -> usize {
        self.entry(term)
            .and_then(|entry| entry.documents.get(path).copied())
            .unwrap_or(0)
    }

    /// Total occurrences of a term in the corpus.
    pub fn total(&self, term: &str) -> usize {
        self.entry(term).map(TermEntry::total).unwrap_or(0)
    }

    /// Paths of documents containing any of the keywords.
    pub fn documents_containing<I, S>(&self, keywords: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        keywords
            .into_iter()
            .filter_map(|k| self.entry(k.as_ref()))
            .flat_map(|entry| entry.documents.keys().cloned())
            .collect()
    }

    /// Terms used at least `threshold` times that the vocabulary lacks.
    ///
    /// Stop words and purely numeric tokens are not candidates. Sorted by
    /// count descending, then term.
    pub fn undefined_terms(&self, threshold: usize) -> Vec<UndefinedTerm> {
        let mut terms: Vec<UndefinedTerm> = self
            .entries
            .iter()
            .filter(|(term, _)| {
                !self.vocabulary.contains(term) && !is_stop_word(term) && !is_numeric(term)
            })
            .map(|(term, entry)| UndefinedTerm {
                term: term.clone(),
                count: entry.total(),
            })
            .filter(|t| t.count >= threshold)
            .collect();
        terms.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.term.cmp(&b.term)));
        terms
    }

    /// Reports a vocabulary term written with more than one capitalization.
    ///
    /// Returns `None` for terms outside the vocabulary and for terms that
    /// are spelled one way throughout.
    pub fn inconsistent_casing(&self, term: &str) -> Option<CasingIssue> {
        let canonical = self.vocabulary.canonical(term)?;
        let entry = self.entry(term)?;
        if entry.surfaces.len() < 2 {
            return None;
        }
        Some(CasingIssue {
            term: term.to_lowercase(),
            canonical: canonical.to_string(),
            variants: entry.surfaces.clone(),
        })
    }

    /// Casing issues for every vocabulary term.
    pub fn casing_issues(&self) -> Vec<CasingIssue> {
        self.vocabulary
            .terms()
            .filter_map(|term| self.inconsistent_casing(term))
            .collect()
    }

    /// Corpus-wide occurrence count of every vocabulary term, zero when unused.
    pub fn term_usage(&self) -> BTreeMap<String, usize> {
        self.vocabulary
            .terms()
            .map(|term| (term.to_string(), self.total(term)))
            .collect()
    }

    /// Maintenance hints derived from [`TermIndex::term_usage`].
    pub fn usage_recommendations(&self) -> Vec<String> {
        let usage = self.term_usage();
        let mut out = Vec::new();

        let unused: Vec<&str> = usage
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(term, _)| term.as_str())
            .collect();
        if !unused.is_empty() {
            let names: Vec<&str> = unused.iter().take(UNUSED_EXAMPLES).copied().collect();
            out.push(format!("{} unused terms: {}", unused.len(), names.join(", ")));
        }

        let mut frequent: Vec<(&String, &usize)> =
            usage.iter().filter(|(_, count)| **count > 0).collect();
        frequent.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        if !frequent.is_empty() {
            let listed: Vec<String> = frequent
                .iter()
                .take(FREQUENT_TERMS)
                .map(|(term, count)| format!("{term}({count})"))
                .collect();
            out.push(format!("Frequent terms: {}", listed.join(", ")));
        }

        out
    }
}

/// Spelling of a matched phrase as written.
///
/// A phrase on one line keeps its original separators. One that wraps
/// across lines is joined with single spaces.
fn phrase_surface(window: &[(usize, &str, Token<'_>)]) -> String {
    match (window.first(), window.last()) {
        (Some((first_line, line, first)), Some((last_line, _, last))) if first_line == last_line => {
            line[first.span.start..last.span.end].to_string()
        }
        _ => window
            .iter()
            .map(|(_, _, token)| token.surface)
            .collect::<Vec<_>>()
            .join(" "),
    }
}
