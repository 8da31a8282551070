//! Directed references between documents.

use serde::{Deserialize, Serialize};

/// A directed edge from one document to a markdown target.
///
/// The target is a normalized repository-relative path that may or may not
/// name a loaded document; the graph decides which.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    /// Path of the document containing the link.
    pub source: String,

    /// Normalized path the link resolves to.
    pub target: String,

    /// Fragment carried by the link. Kept as opaque metadata.
    pub anchor: Option<String>,

    /// Index of the section in the source document.
    pub section: usize,

    /// 1-based line in the source document.
    pub line: usize,
}

impl Reference {
    /// Creates a reference with no anchor or location.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            anchor: None,
            section: 0,
            line: 0,
        }
    }

    /// True if the document links to itself.
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}
