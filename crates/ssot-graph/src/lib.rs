//! SSOT Graph - Document reference management
//!
//! This crate builds the directed graph of references between markdown
//! documents and answers structural questions about it: which documents
//! nothing links to, which reference chains loop back on themselves, and
//! which links point at files that do not exist.
//!
//! # Architecture
//!
//! The graph uses petgraph internally with a path index on top. Only
//! references that resolve to a loaded document become petgraph edges;
//! dangling references are kept beside the graph so reports can list them.
//!
//! # Example
//!
//! ```
//! use ssot_core::{Document, SsotConfig};
//! use ssot_graph::ReferenceGraph;
//!
//! let docs = vec![
//!     Document::parse("README.md", "[guide](files/guide.md)"),
//!     Document::parse("files/guide.md", "# Guide"),
//! ];
//! let graph = ReferenceGraph::from_documents(&docs, &SsotConfig::default());
//!
//! assert!(graph.orphans().is_empty());
//! assert!(graph.cycles().is_empty());
//! ```

mod builder;
mod cycles;
mod edge;
mod graph;
mod report;

pub use builder::GraphBuilder;
pub use cycles::CycleScan;
pub use edge::{EdgeStatus, Endpoint, GraphEdge};
pub use graph::{DocNode, GraphStats, NodeId, ReferenceGraph};
pub use report::CrossRefReport;
