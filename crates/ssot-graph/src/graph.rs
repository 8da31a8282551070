//! Core graph data structure.
//!
//! The ReferenceGraph wraps petgraph and adds a path index. Nodes are the
//! loaded documents in discovery order; edges are resolved references.
//! Dangling references are kept beside the graph with a missing endpoint.

use crate::builder::GraphBuilder;
use crate::cycles::CycleScan;
use crate::edge::{EdgeStatus, Endpoint, GraphEdge};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use ssot_core::{Category, Document, Reference, SsotConfig};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Unique identifier for a node in the graph.
pub type NodeId = NodeIndex;

/// A document as seen by the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocNode {
    pub path: String,
    pub title: String,
    pub category: Option<Category>,
    /// Exempt from orphan classification.
    pub entry_point: bool,
}

/// The document reference graph.
#[derive(Debug, Clone)]
pub struct ReferenceGraph {
    /// Edge weights index into `references`.
    pub(crate) graph: DiGraph<DocNode, usize>,

    /// Maps document paths to node indexes.
    path_index: HashMap<String, NodeId>,

    /// Every reference, in insertion order.
    references: Vec<Reference>,

    /// Endpoint of each reference, parallel to `references`.
    endpoints: Vec<Endpoint>,

    /// Cycle enumeration stops after this many cycles.
    pub(crate) max_cycles: usize,
}

impl Default for ReferenceGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceGraph {
    /// Creates a new empty graph.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            path_index: HashMap::new(),
            references: Vec::new(),
            endpoints: Vec::new(),
            max_cycles: SsotConfig::default().max_cycles,
        }
    }

    /// Builds a graph from documents and already extracted references,
    /// using the default entry-point convention.
    pub fn build(documents: &[Document], references: Vec<Reference>) -> Self {
        let mut builder = GraphBuilder::new();
        builder.add_documents(documents);
        builder.add_references(references);
        builder.build()
    }

    /// Extracts references from every document and builds the graph.
    pub fn from_documents(documents: &[Document], config: &SsotConfig) -> Self {
        let mut builder = GraphBuilder::with_config(config);
        builder.add_documents(documents);
        for doc in documents {
            builder.add_references(ssot_core::extract_references(doc));
        }
        builder.build()
    }

    /// Adds a document node. Returns `None` if the path is already present.
    pub(crate) fn add_document(&mut self, node: DocNode) -> Option<NodeId> {
        if self.path_index.contains_key(&node.path) {
            return None;
        }
        let path = node.path.clone();
        let index = self.graph.add_node(node);
        self.path_index.insert(path, index);
        Some(index)
    }

    /// Records a reference, adding an edge when both ends are loaded documents.
    ///
    /// References from a source that is not in the graph are ignored.
    pub(crate) fn add_reference(&mut self, reference: Reference) -> Option<Endpoint> {
        let Some(from) = self.get_index(&reference.source) else {
            tracing::debug!(
                "Ignoring reference from unknown document {} to {}",
                reference.source,
                reference.target
            );
            return None;
        };
        let endpoint = match self.get_index(&reference.target) {
            Some(to) => {
                self.graph.add_edge(from, to, self.references.len());
                Endpoint::Document(to)
            }
            None => Endpoint::Missing,
        };
        self.references.push(reference);
        self.endpoints.push(endpoint);
        Some(endpoint)
    }

    /// Gets a node by path.
    pub fn get(&self, path: &str) -> Option<&DocNode> {
        let index = self.path_index.get(path)?;
        self.graph.node_weight(*index)
    }

    /// Gets the node index for a path.
    pub fn get_index(&self, path: &str) -> Option<NodeId> {
        self.path_index.get(path).copied()
    }

    /// Gets a node by its graph index.
    pub fn node(&self, index: NodeId) -> Option<&DocNode> {
        self.graph.node_weight(index)
    }

    /// Iterates over documents in discovery order.
    pub fn nodes(&self) -> impl Iterator<Item = &DocNode> {
        self.graph.node_weights()
    }

    /// Returns the number of documents.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of resolved edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All references, resolved or not, in insertion order.
    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    /// Every reference with its endpoint.
    pub fn edges(&self) -> impl Iterator<Item = (&Reference, Endpoint)> {
        self.references.iter().zip(self.endpoints.iter().copied())
    }

    /// References whose target does not resolve to a loaded document.
    pub fn dangling(&self) -> Vec<&Reference> {
        self.edges()
            .filter(|(_, endpoint)| endpoint.is_missing())
            .map(|(reference, _)| reference)
            .collect()
    }

    /// Number of incoming references from other documents.
    ///
    /// A document linking to itself does not count as referenced.
    pub fn in_degree(&self, index: NodeId) -> usize {
        self.graph
            .edges_directed(index, Direction::Incoming)
            .filter(|edge| edge.source() != index)
            .count()
    }

    /// Documents nobody else links to, excluding entry points.
    pub fn orphans(&self) -> Vec<&DocNode> {
        let orphans: Vec<&DocNode> = self
            .graph
            .node_indices()
            .filter(|idx| self.in_degree(*idx) == 0)
            .filter_map(|idx| self.graph.node_weight(idx))
            .filter(|node| !node.entry_point)
            .collect();
        tracing::debug!("Detected {} orphans", orphans.len());
        orphans
    }

    /// Paths this document links to, sorted and unique.
    pub fn neighbors(&self, path: &str) -> Vec<&str> {
        self.adjacent(path, Direction::Outgoing)
    }

    /// Paths of documents linking to this one, sorted and unique.
    pub fn referrers(&self, path: &str) -> Vec<&str> {
        self.adjacent(path, Direction::Incoming)
    }

    fn adjacent(&self, path: &str, direction: Direction) -> Vec<&str> {
        let Some(index) = self.get_index(path) else {
            return Vec::new();
        };
        self.graph
            .neighbors_directed(index, direction)
            .filter_map(|idx| self.graph.node_weight(idx))
            .map(|node| node.path.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Unique successors of every node, sorted by path. Indexed by node index.
    pub(crate) fn successor_lists(&self) -> Vec<Vec<NodeId>> {
        self.graph
            .node_indices()
            .map(|idx| {
                let mut succ: Vec<NodeId> = self
                    .graph
                    .neighbors_directed(idx, Direction::Outgoing)
                    .collect();
                succ.sort_by(|a, b| self.graph[*a].path.cmp(&self.graph[*b].path));
                succ.dedup();
                succ
            })
            .collect()
    }

    /// Source path to sorted unique resolved target paths.
    ///
    /// Every document has an entry, even with no outgoing references.
    pub fn reference_map(&self) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, BTreeSet<String>> = self
            .nodes()
            .map(|node| (node.path.clone(), BTreeSet::new()))
            .collect();
        for (reference, endpoint) in self.edges() {
            if endpoint.is_missing() {
                continue;
            }
            map.entry(reference.source.clone())
                .or_default()
                .insert(reference.target.clone());
        }
        map.into_iter()
            .map(|(source, targets)| (source, targets.into_iter().collect()))
            .collect()
    }

    /// Returns all references in export form.
    pub fn export_edges(&self) -> Vec<GraphEdge> {
        self.edges()
            .map(|(reference, endpoint)| GraphEdge {
                source: reference.source.clone(),
                target: reference.target.clone(),
                anchor: reference.anchor.clone(),
                line: reference.line,
                status: if endpoint.is_missing() {
                    EdgeStatus::Missing
                } else {
                    EdgeStatus::Resolved
                },
            })
            .collect()
    }
}

/// Graph statistics for reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_files: usize,
    pub total_references: usize,
    pub resolved_references: usize,
    pub dangling_references: usize,
    pub entry_points: usize,
    pub orphans: usize,
    pub cycles: usize,
    pub cycles_truncated: bool,
}

impl ReferenceGraph {
    /// Returns graph statistics.
    pub fn stats(&self) -> GraphStats {
        self.stats_with(&self.cycle_scan())
    }

    /// Returns graph statistics using a cycle scan the caller already ran.
    pub fn stats_with(&self, scan: &CycleScan) -> GraphStats {
        let dangling = self.endpoints.iter().filter(|e| e.is_missing()).count();
        GraphStats {
            total_files: self.node_count(),
            total_references: self.references.len(),
            resolved_references: self.references.len() - dangling,
            dangling_references: dangling,
            entry_points: self.nodes().filter(|n| n.entry_point).count(),
            orphans: self.orphans().len(),
            cycles: scan.cycles.len(),
            cycles_truncated: scan.truncated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(path: &str, body: &str) -> Document {
        Document::parse(path, body)
    }

    fn graph_of(docs: &[Document]) -> ReferenceGraph {
        ReferenceGraph::from_documents(docs, &SsotConfig::default())
    }

    fn orphan_paths(graph: &ReferenceGraph) -> Vec<&str> {
        graph.orphans().iter().map(|n| n.path.as_str()).collect()
    }

    #[test]
    fn test_entry_point_scenario_has_no_orphans() {
        let docs = vec![
            doc("A.md", "[b](B.md)"),
            doc("B.md", "no links"),
            doc("README.md", "[a](A.md)"),
        ];
        let graph = graph_of(&docs);

        assert!(graph.orphans().is_empty());
        assert!(graph.cycles().is_empty());
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_unlinked_document_is_orphan() {
        let docs = vec![
            doc("README.md", "[a](files/a.md)"),
            doc("files/a.md", "# A"),
            doc("files/lonely.md", "# Lonely"),
        ];
        let graph = graph_of(&docs);
        assert_eq!(orphan_paths(&graph), vec!["files/lonely.md"]);
    }

    #[test]
    fn test_entry_points_never_orphans() {
        let docs = vec![
            doc("README.md", ""),
            doc("files/INDEX.md", ""),
            doc("files/deep/README.md", ""),
        ];
        let graph = graph_of(&docs);
        // Only root and category-root entry points are exempt.
        assert_eq!(orphan_paths(&graph), vec!["files/deep/README.md"]);
    }

    #[test]
    fn test_self_link_does_not_rescue_orphan() {
        let docs = vec![doc("files/self.md", "[me](self.md)")];
        let graph = graph_of(&docs);
        assert_eq!(orphan_paths(&graph), vec!["files/self.md"]);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_dangling_references_are_kept() {
        let docs = vec![doc("files/a.md", "[gone](missing.md) [b](b.md)"), doc("files/b.md", "")];
        let graph = graph_of(&docs);

        let dangling = graph.dangling();
        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].target, "files/missing.md");
        assert_eq!(graph.references().len(), 2);
        assert_eq!(graph.edge_count(), 1);

        let stats = graph.stats();
        assert_eq!(stats.dangling_references, 1);
        assert_eq!(stats.resolved_references, 1);

        let map = graph.reference_map();
        assert_eq!(map["files/a.md"], vec!["files/b.md".to_string()]);
        assert!(map["files/b.md"].is_empty());
    }

    #[test]
    fn test_neighbors_and_referrers() {
        let docs = vec![
            doc("a.md", "[b](b.md) [b again](b.md) [c](c.md)"),
            doc("b.md", "[c](c.md)"),
            doc("c.md", ""),
        ];
        let graph = graph_of(&docs);
        assert_eq!(graph.neighbors("a.md"), vec!["b.md", "c.md"]);
        assert_eq!(graph.referrers("c.md"), vec!["a.md", "b.md"]);
        assert!(graph.neighbors("nope.md").is_empty());
    }

    #[test]
    fn test_build_is_idempotent() {
        let docs = vec![
            doc("z.md", "[a](a.md)"),
            doc("a.md", "[z](z.md) [m](m.md)"),
            doc("m.md", "[x](x.md)"),
        ];
        let first = graph_of(&docs);
        let second = graph_of(&docs);

        let paths = |g: &ReferenceGraph| g.nodes().map(|n| n.path.clone()).collect::<Vec<_>>();
        assert_eq!(paths(&first), paths(&second));
        assert_eq!(paths(&first), vec!["z.md", "a.md", "m.md"]);
        assert_eq!(first.export_edges(), second.export_edges());
        assert_eq!(first.cycles(), second.cycles());
    }

    #[test]
    fn test_build_from_explicit_references() {
        let docs = vec![doc("a.md", ""), doc("b.md", "")];
        let graph = ReferenceGraph::build(
            &docs,
            vec![Reference::new("a.md", "b.md"), Reference::new("ghost.md", "a.md")],
        );
        // References from unknown sources are dropped; there is no node for them.
        assert_eq!(graph.references().len(), 1);
        assert_eq!(orphan_paths(&graph), vec!["a.md"]);
    }

    #[test]
    fn test_percent_encoded_link_resolves() {
        let docs = vec![doc("README.md", "[x](my%20file.md)"), doc("my file.md", "")];
        let graph = ReferenceGraph::from_documents(&docs, &SsotConfig::default());
        assert!(graph.dangling().is_empty());
        assert_eq!(graph.neighbors("README.md"), vec!["my file.md"]);
    }

    #[test]
    fn test_unknown_source_reference_is_ignored() {
        let mut graph = ReferenceGraph::build(&[doc("a.md", "")], Vec::new());
        assert!(graph
            .add_reference(Reference::new("ghost.md", "a.md"))
            .is_none());
        assert_eq!(graph.references().len(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.stats().total_references, 0);
    }

    #[test]
    fn test_stats_with_reuses_scan() {
        let docs = vec![doc("a.md", "[b](b.md)"), doc("b.md", "[a](a.md)")];
        let graph = ReferenceGraph::from_documents(&docs, &SsotConfig::default());
        let scan = graph.cycle_scan();
        assert_eq!(graph.stats_with(&scan), graph.stats());
        assert_eq!(graph.stats_with(&scan).cycles, 1);
    }
}
