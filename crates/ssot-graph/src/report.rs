//! Cross-reference report.
//!
//! Bundles the graph queries into one serializable value with
//! human-readable recommendations.

use crate::edge::GraphEdge;
use crate::graph::{GraphStats, ReferenceGraph};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Orphans listed by path in a recommendation before eliding the rest.
const ORPHAN_EXAMPLES: usize = 3;

/// Full cross-reference analysis of a corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossRefReport {
    pub reference_map: BTreeMap<String, Vec<String>>,
    pub orphans: Vec<String>,
    pub cycles: Vec<Vec<String>>,
    pub cycles_truncated: bool,
    pub dangling: Vec<GraphEdge>,
    pub stats: GraphStats,
}

impl CrossRefReport {
    /// Runs every graph query and collects the results.
    pub fn from_graph(graph: &ReferenceGraph) -> Self {
        let scan = graph.cycle_scan();
        let dangling = graph
            .export_edges()
            .into_iter()
            .filter(|edge| edge.status == crate::EdgeStatus::Missing)
            .collect();
        let report = Self {
            reference_map: graph.reference_map(),
            orphans: graph.orphans().iter().map(|n| n.path.clone()).collect(),
            stats: graph.stats_with(&scan),
            cycles: scan.cycles,
            cycles_truncated: scan.truncated,
            dangling,
        };
        tracing::info!("Cross-reference analysis: {}", report.summary());
        report
    }

    /// Human-readable hints for fixing the corpus. Empty when nothing is wrong.
    pub fn recommendations(&self) -> Vec<String> {
        let mut out = Vec::new();

        if !self.orphans.is_empty() {
            let mut examples = self
                .orphans
                .iter()
                .take(ORPHAN_EXAMPLES)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ");
            if self.orphans.len() > ORPHAN_EXAMPLES {
                examples.push_str(", ...");
            }
            out.push(format!(
                "Review {} orphan documents (e.g. {})",
                self.orphans.len(),
                examples
            ));
        }

        if let Some(first) = self.cycles.first().and_then(|c| c.first()) {
            out.push(format!(
                "Resolve {} circular reference chains (first cycle starts at {})",
                self.cycles.len(),
                first
            ));
        }

        if !self.dangling.is_empty() {
            out.push(format!("Fix {} broken links", self.dangling.len()));
        }

        out
    }

    /// One-line summary for terminal output.
    pub fn summary(&self) -> String {
        format!(
            "{} documents, {} references ({} broken), {} orphans, {} cycles{}",
            self.stats.total_files,
            self.stats.total_references,
            self.stats.dangling_references,
            self.orphans.len(),
            self.cycles.len(),
            if self.cycles_truncated { " (truncated)" } else { "" }
        )
    }

    /// Serializes the report as pretty JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ssot_core::{Document, SsotConfig};

    fn report(docs: &[(&str, &str)]) -> CrossRefReport {
        let docs: Vec<Document> = docs.iter().map(|(p, b)| Document::parse(*p, *b)).collect();
        CrossRefReport::from_graph(&ReferenceGraph::from_documents(&docs, &SsotConfig::default()))
    }

    #[test]
    fn test_clean_corpus_has_no_recommendations() {
        let r = report(&[("README.md", "[a](a.md)"), ("a.md", "")]);
        assert!(r.recommendations().is_empty());
        assert_eq!(r.summary(), "2 documents, 1 references (0 broken), 0 orphans, 0 cycles");
    }

    #[test]
    fn test_recommendations() {
        let r = report(&[
            ("a.md", "[b](b.md)"),
            ("b.md", "[a](a.md) [x](x.md)"),
            ("c.md", ""),
            ("d.md", ""),
            ("e.md", ""),
            ("f.md", ""),
        ]);
        assert_eq!(
            r.recommendations(),
            vec![
                "Review 4 orphan documents (e.g. c.md, d.md, e.md, ...)".to_string(),
                "Resolve 1 circular reference chains (first cycle starts at a.md)".to_string(),
                "Fix 1 broken links".to_string(),
            ]
        );
    }

    #[test]
    fn test_stats_agree_with_cycles() {
        let r = report(&[
            ("a.md", "[b](b.md) [c](c.md)"),
            ("b.md", "[a](a.md) [c](c.md)"),
            ("c.md", "[a](a.md)"),
        ]);
        assert_eq!(r.stats.cycles, r.cycles.len());
        assert_eq!(r.stats.cycles_truncated, r.cycles_truncated);
        assert_eq!(r.cycles.len(), 3);
    }

    #[test]
    fn test_report_serializes() {
        let r = report(&[("a.md", "[gone](gone.md)")]);
        let json = r.to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["dangling"][0]["target"], "gone.md");
        assert_eq!(value["dangling"][0]["status"], "missing");
        assert_eq!(value["stats"]["total_files"], 1);
    }
}
