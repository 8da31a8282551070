//! Edge endpoints and the flat edge form used for export.
//!
//! Every reference extracted from the corpus is kept. References whose
//! target names a loaded document become graph edges; the rest point at
//! [`Endpoint::Missing`] so broken links stay visible.

use crate::graph::NodeId;
use serde::{Deserialize, Serialize};

/// Where a reference lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// A loaded document.
    Document(NodeId),
    /// Sentinel for a target that no loaded document matches.
    Missing,
}

impl Endpoint {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// Resolution status of an exported edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeStatus {
    Resolved,
    Missing,
}

impl std::fmt::Display for EdgeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resolved => write!(f, "resolved"),
            Self::Missing => write!(f, "missing"),
        }
    }
}

/// A simplified edge for export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub anchor: Option<String>,
    pub line: usize,
    pub status: EdgeStatus,
}
