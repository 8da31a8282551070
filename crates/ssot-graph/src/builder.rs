//! Graph builder for constructing the reference graph from documents.
//!
//! The builder takes documents and references and resolves the references
//! into graph edges against the set of loaded paths.

use crate::edge::Endpoint;
use crate::graph::{DocNode, ReferenceGraph};
use ssot_core::{Document, Reference, SsotConfig};

/// Builds a ReferenceGraph from loaded documents.
///
/// The builder handles the two-pass process:
/// 1. Add all documents as nodes
/// 2. Resolve references into edges once every path is known
pub struct GraphBuilder {
    graph: ReferenceGraph,
    config: SsotConfig,
    pending: Vec<Reference>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    /// Creates a builder with the default configuration.
    pub fn new() -> Self {
        Self::with_config(&SsotConfig::default())
    }

    /// Creates a builder using the entry points and cycle cap of `config`.
    pub fn with_config(config: &SsotConfig) -> Self {
        let mut graph = ReferenceGraph::new();
        graph.max_cycles = config.max_cycles;
        Self {
            graph,
            config: config.clone(),
            pending: Vec::new(),
        }
    }

    /// Adds documents as nodes. Duplicate paths keep the first document.
    pub fn add_documents(&mut self, documents: &[Document]) {
        for doc in documents {
            let node = DocNode {
                path: doc.path.clone(),
                title: doc.title.clone(),
                category: doc.category,
                entry_point: self.config.is_entry_point(&doc.path),
            };
            if self.graph.add_document(node).is_none() {
                tracing::warn!(path = %doc.path, "Duplicate document path ignored");
            }
        }
    }

    /// Queues references for resolution.
    pub fn add_references(&mut self, references: impl IntoIterator<Item = Reference>) {
        self.pending.extend(references);
    }

    /// Resolves queued references into edges.
    ///
    /// This is the second pass after all documents are added.
    pub fn resolve_edges(&mut self) {
        let mut resolved = 0usize;
        let mut dangling = 0usize;
        for reference in std::mem::take(&mut self.pending) {
            match self.graph.add_reference(reference) {
                Some(Endpoint::Document(_)) => resolved += 1,
                Some(Endpoint::Missing) => dangling += 1,
                None => {}
            }
        }
        tracing::debug!(resolved, dangling, "Resolved references");
    }

    /// Finishes building and returns the graph.
    pub fn build(mut self) -> ReferenceGraph {
        self.resolve_edges();
        tracing::info!(
            "Built reference graph: {} documents, {} edges",
            self.graph.node_count(),
            self.graph.edge_count()
        );
        self.graph
    }
}
