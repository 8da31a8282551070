//! SSOT Index - Term statistics and relevance search
//!
//! Builds an inverted term index over a loaded corpus and uses it for two
//! jobs: ranking documents against keyword queries, and checking term
//! usage against the controlled vocabulary kept in the taxonomy document.
//!
//! # Example
//!
//! ```
//! use ssot_core::Document;
//! use ssot_index::{rank, Query, TermIndex, Vocabulary};
//!
//! let docs = vec![Document::parse(
//!     "files/AGENTS.md",
//!     "# Agents\n\n## Best Practices\n\nAgents follow best practices.",
//! )];
//! let index = TermIndex::build(&docs, &Vocabulary::new());
//! let result = rank(&docs, &index, &Query::new("agents best practices"), 5);
//!
//! assert_eq!(result.top().map(|hit| hit.section.as_str()), Some("## Best Practices"));
//! ```

mod error;
mod ranker;
mod taxonomy;
mod term_index;
mod tokenize;
mod vocabulary;

pub use error::{IndexError, Result};
pub use ranker::{
    rank, Query, QueryHit, QueryResult, CONFIDENCE_SATURATION, INDEX_WEIGHT, SECTION_WEIGHT,
    TITLE_WEIGHT,
};
pub use taxonomy::{validate_corpus_tags, validate_tags, DocumentIssues, TermIssue};
pub use term_index::{CasingIssue, TermEntry, TermIndex, UndefinedTerm};
pub use tokenize::{tokenize, Token, STOP_WORDS};
pub use vocabulary::Vocabulary;
