//! Circular reference detection.
//!
//! Enumerates every elementary cycle of the reference graph. Each cycle is
//! reported once, rotated so it starts at its lexicographically smallest
//! path. A document linking to itself is a one-element cycle.

use crate::graph::{NodeId, ReferenceGraph};
use serde::{Deserialize, Serialize};

/// Result of a cycle scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleScan {
    /// Cycles as path sequences, sorted.
    pub cycles: Vec<Vec<String>>,
    /// True if enumeration stopped at the configured cap.
    pub truncated: bool,
}

impl ReferenceGraph {
    /// Returns every elementary cycle, up to the configured cap.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        self.cycle_scan().cycles
    }

    /// Enumerates cycles and reports whether the cap was hit.
    ///
    /// Johnson's circuit search. Nodes are ranked by path and each search
    /// only visits nodes ranked at or above its start, so every cycle is
    /// found exactly once, from its smallest member. A node stays blocked
    /// until a cycle is found through it, which keeps the work per start
    /// linear when the graph has no cycles.
    pub fn cycle_scan(&self) -> CycleScan {
        let n = self.graph.node_count();
        let mut order: Vec<NodeId> = self.graph.node_indices().collect();
        order.sort_by(|a, b| self.graph[*a].path.cmp(&self.graph[*b].path));
        let mut rank = vec![0usize; n];
        for (r, idx) in order.iter().enumerate() {
            rank[idx.index()] = r;
        }

        let successors = self.successor_lists();
        let mut cycles: Vec<Vec<NodeId>> = Vec::new();
        let mut truncated = false;
        let mut blocked = vec![false; n];
        let mut blocked_by: Vec<Vec<NodeId>> = vec![Vec::new(); n];

        'outer: for &start in &order {
            let start_rank = rank[start.index()];
            for &idx in &order[start_rank..] {
                blocked[idx.index()] = false;
                blocked_by[idx.index()].clear();
            }

            // (node, next successor position, found a cycle below this frame)
            let mut stack: Vec<(NodeId, usize, bool)> = vec![(start, 0, false)];
            blocked[start.index()] = true;

            while let Some(frame) = stack.last_mut() {
                let (node, pos) = (frame.0, frame.1);
                let succs = &successors[node.index()];

                if pos < succs.len() {
                    frame.1 += 1;
                    let next = succs[pos];
                    if rank[next.index()] < start_rank {
                        continue;
                    }
                    if next == start {
                        if cycles.len() >= self.max_cycles {
                            truncated = true;
                            break 'outer;
                        }
                        frame.2 = true;
                        cycles.push(stack.iter().map(|(idx, _, _)| *idx).collect());
                    } else if !blocked[next.index()] {
                        blocked[next.index()] = true;
                        stack.push((next, 0, false));
                    }
                    continue;
                }

                let found = frame.2;
                stack.pop();
                if found {
                    unblock(node, &mut blocked, &mut blocked_by);
                    if let Some(parent) = stack.last_mut() {
                        parent.2 = true;
                    }
                } else {
                    for &next in succs {
                        let waiting = &mut blocked_by[next.index()];
                        if rank[next.index()] >= start_rank && !waiting.contains(&node) {
                            waiting.push(node);
                        }
                    }
                }
            }
        }

        let mut cycles: Vec<Vec<String>> = cycles
            .into_iter()
            .map(|cycle| {
                cycle
                    .into_iter()
                    .map(|idx| self.graph[idx].path.clone())
                    .collect()
            })
            .collect();
        cycles.sort();

        if truncated {
            tracing::warn!(
                "Cycle enumeration stopped after {} cycles",
                self.max_cycles
            );
        }
        tracing::debug!("Detected {} cycles", cycles.len());

        CycleScan { cycles, truncated }
    }
}

/// Clears the block on `node` and on every node waiting for it.
fn unblock(node: NodeId, blocked: &mut [bool], blocked_by: &mut [Vec<NodeId>]) {
    let mut pending = vec![node];
    while let Some(idx) = pending.pop() {
        blocked[idx.index()] = false;
        for waiting in std::mem::take(&mut blocked_by[idx.index()]) {
            if blocked[waiting.index()] {
                pending.push(waiting);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{GraphBuilder, ReferenceGraph};
    use pretty_assertions::assert_eq;
    use ssot_core::{Document, Reference, SsotConfig};

    fn graph(paths: &[&str], edges: &[(&str, &str)]) -> ReferenceGraph {
        let docs: Vec<Document> = paths.iter().map(|p| Document::parse(*p, "")).collect();
        let refs = edges.iter().map(|(s, t)| Reference::new(*s, *t)).collect();
        ReferenceGraph::build(&docs, refs)
    }

    fn is_closed_walk(graph: &ReferenceGraph, cycle: &[String]) -> bool {
        cycle.iter().enumerate().all(|(i, path)| {
            let next = &cycle[(i + 1) % cycle.len()];
            graph.neighbors(path).contains(&next.as_str())
        })
    }

    #[test]
    fn test_two_node_cycle() {
        let g = graph(&["A.md", "B.md"], &[("A.md", "B.md"), ("B.md", "A.md")]);
        assert_eq!(g.cycles(), vec![vec!["A.md".to_string(), "B.md".to_string()]]);
    }

    #[test]
    fn test_cycle_starts_at_smallest_path() {
        let g = graph(
            &["c.md", "b.md", "a.md"],
            &[("c.md", "a.md"), ("a.md", "b.md"), ("b.md", "c.md")],
        );
        assert_eq!(
            g.cycles(),
            vec![vec!["a.md".to_string(), "b.md".to_string(), "c.md".to_string()]]
        );
    }

    #[test]
    fn test_self_loop_is_cycle() {
        let g = graph(&["a.md"], &[("a.md", "a.md")]);
        assert_eq!(g.cycles(), vec![vec!["a.md".to_string()]]);
    }

    #[test]
    fn test_acyclic_graph() {
        let g = graph(
            &["a.md", "b.md", "c.md"],
            &[("a.md", "b.md"), ("a.md", "c.md"), ("b.md", "c.md")],
        );
        assert!(g.cycles().is_empty());
    }

    #[test]
    fn test_overlapping_cycles_each_reported_once() {
        // a -> b -> a, a -> c -> a, b -> c -> b and the two 3-cycles.
        let g = graph(
            &["a.md", "b.md", "c.md"],
            &[
                ("a.md", "b.md"),
                ("b.md", "a.md"),
                ("a.md", "c.md"),
                ("c.md", "a.md"),
                ("b.md", "c.md"),
                ("c.md", "b.md"),
            ],
        );
        let cycles = g.cycles();
        assert_eq!(cycles.len(), 5);
        for cycle in &cycles {
            assert!(is_closed_walk(&g, cycle), "not a closed walk: {cycle:?}");
            assert_eq!(cycle.iter().min(), cycle.first());
        }
        let mut unique = cycles.clone();
        unique.dedup();
        assert_eq!(unique.len(), cycles.len());
    }

    #[test]
    fn test_navigation_chain_scans_fast() {
        // Every page links to the next two, as "next" and "skip" links do.
        let paths: Vec<String> = (0..60).map(|i| format!("d{i:02}.md")).collect();
        let mut edges = Vec::new();
        for i in 0..paths.len() {
            for j in [i + 1, i + 2] {
                if j < paths.len() {
                    edges.push((paths[i].as_str(), paths[j].as_str()));
                }
            }
        }
        let names: Vec<&str> = paths.iter().map(String::as_str).collect();
        let g = graph(&names, &edges);

        let started = std::time::Instant::now();
        let scan = g.cycle_scan();
        assert!(scan.cycles.is_empty());
        assert!(!scan.truncated);
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
    }

    #[test]
    fn test_back_link_after_chain_closes_every_path() {
        // d0 -> d1 -> d2 -> d3 with skips d0 -> d2 and d1 -> d3, closed by d3 -> d0.
        let g = graph(
            &["d0.md", "d1.md", "d2.md", "d3.md"],
            &[
                ("d0.md", "d1.md"),
                ("d1.md", "d2.md"),
                ("d2.md", "d3.md"),
                ("d0.md", "d2.md"),
                ("d1.md", "d3.md"),
                ("d3.md", "d0.md"),
            ],
        );
        let cycles = g.cycles();
        assert_eq!(
            cycles,
            vec![
                vec!["d0.md", "d1.md", "d2.md", "d3.md"],
                vec!["d0.md", "d1.md", "d3.md"],
                vec!["d0.md", "d2.md", "d3.md"],
            ]
            .into_iter()
            .map(|c| c.into_iter().map(String::from).collect::<Vec<_>>())
            .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_duplicate_links_do_not_duplicate_cycles() {
        let g = graph(
            &["a.md", "b.md"],
            &[("a.md", "b.md"), ("a.md", "b.md"), ("b.md", "a.md")],
        );
        assert_eq!(g.cycles().len(), 1);
    }

    #[test]
    fn test_dangling_targets_never_in_cycles() {
        let g = graph(&["a.md"], &[("a.md", "gone.md")]);
        assert!(g.cycles().is_empty());
    }

    #[test]
    fn test_cycle_cap_sets_truncated() {
        let config = SsotConfig {
            max_cycles: 2,
            ..SsotConfig::default()
        };
        let docs: Vec<Document> = ["a.md", "b.md", "c.md", "d.md"]
            .iter()
            .map(|p| Document::parse(*p, ""))
            .collect();
        let mut builder = GraphBuilder::with_config(&config);
        builder.add_documents(&docs);
        for s in ["a.md", "b.md", "c.md", "d.md"] {
            builder.add_references(vec![Reference::new(s, s)]);
        }
        let scan = builder.build().cycle_scan();

        assert!(scan.truncated);
        assert_eq!(scan.cycles.len(), 2);
    }
}
