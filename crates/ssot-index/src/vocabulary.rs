//! Controlled vocabulary loaded from the taxonomy document.

use crate::error::{IndexError, Result};
use crate::tokenize::tokenize;
use regex::Regex;
use ssot_core::SsotConfig;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::OnceLock;

/// The set of approved terms.
///
/// Terms are stored lower-cased. The spelling used where a term was
/// defined is kept as its canonical form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    terms: BTreeMap<String, String>,
}

fn definition_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-\s+\*\*([^*]+)\*\*:").expect("definition pattern is valid"))
}

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^###\s+(.+)$").expect("heading pattern is valid"))
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a vocabulary from explicit terms. The first spelling of a term wins.
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocab = Self::new();
        for term in terms {
            vocab.insert(term.as_ref());
        }
        vocab
    }

    fn insert(&mut self, surface: &str) {
        let surface = surface.trim();
        if surface.is_empty() {
            return;
        }
        self.terms
            .entry(surface.to_lowercase())
            .or_insert_with(|| surface.to_string());
    }

    /// Parses taxonomy markdown.
    ///
    /// Terms come from definition lines (`- **term**: ...`) and level-3
    /// headings. Heading whitespace becomes `-`; headings without a letter
    /// are skipped.
    pub fn parse_taxonomy(markdown: &str) -> Self {
        let mut vocab = Self::new();
        for line in markdown.lines() {
            if let Some(caps) = definition_re().captures(line) {
                vocab.insert(&caps[1]);
                continue;
            }
            if let Some(caps) = heading_re().captures(line.trim()) {
                let term = whitespace_re().replace_all(caps[1].trim(), "-");
                if term.chars().any(|c| c.is_alphabetic()) {
                    vocab.insert(&term);
                }
            }
        }
        vocab
    }

    /// Loads the taxonomy at `config.taxonomy_path` under `root`.
    ///
    /// A missing file yields an empty vocabulary.
    pub fn load(root: &Path, config: &SsotConfig) -> Result<Self> {
        let path = root.join(&config.taxonomy_path);
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                let vocab = Self::parse_taxonomy(&text);
                tracing::info!("Loaded {} taxonomy terms from {}", vocab.len(), path.display());
                Ok(vocab)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Taxonomy not found at {}", path.display());
                Ok(Self::new())
            }
            Err(source) => Err(IndexError::TaxonomyIo { path, source }),
        }
    }

    /// True if the term is defined, ignoring case.
    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains_key(&term.to_lowercase())
    }

    /// The spelling a term was defined with.
    pub fn canonical(&self, term: &str) -> Option<&str> {
        self.terms.get(&term.to_lowercase()).map(String::as_str)
    }

    /// Lower-cased terms in sorted order.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Hyphenated terms the tokenizer keeps whole.
    pub fn compounds(&self) -> HashSet<String> {
        self.terms
            .keys()
            .filter(|t| t.contains('-'))
            .cloned()
            .collect()
    }

    /// Terms the tokenizer splits into several tokens, with those tokens.
    ///
    /// Covers phrases like `single source` and terms with inner
    /// punctuation like `CI/CD` or `Node.js`.
    pub(crate) fn phrases(&self) -> Vec<(String, Vec<String>)> {
        let compounds = self.compounds();
        self.terms
            .keys()
            .filter_map(|term| {
                let words: Vec<String> = tokenize(term, &compounds)
                    .into_iter()
                    .map(|token| token.term)
                    .collect();
                (words.len() > 1).then(|| (term.clone(), words))
            })
            .collect()
    }
}
