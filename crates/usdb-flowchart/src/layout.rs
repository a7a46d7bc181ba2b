//! Layered layout for flowchart rendering
//!
//! Nodes are ranked by the longest path from the start over forward edges.
//! Back edges (loops) are found with a depth-first search and ignored for
//! ranking, so every loop body sits below its loop head. Within a rank,
//! nodes take columns in creation order.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::model::{FlowchartSet, NodeId};

pub const NODE_WIDTH: f64 = 180.0;
pub const NODE_HEIGHT: f64 = 60.0;
pub const COLUMN_GAP: f64 = 40.0;
pub const RANK_GAP: f64 = 40.0;
pub const MARGIN: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub node: NodeId,
    pub rank: usize,
    pub column: usize,
    /// Top-left corner in pixels
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// One cell per node, indexed by node id
    pub cells: Vec<Cell>,
    /// Indices into the set's edges that close a loop
    pub back_edges: Vec<usize>,
    pub width: f64,
    pub height: f64,
}

impl Layout {
    pub fn cell(&self, node: NodeId) -> Option<&Cell> {
        self.cells.get(node)
    }

    pub fn rank_count(&self) -> usize {
        self.cells.iter().map(|c| c.rank + 1).max().unwrap_or(0)
    }
}

pub fn layout(set: &FlowchartSet) -> Layout {
    let count = set.nodes.len();
    let back_edges = find_back_edges(set);

    // longest path over the remaining DAG, in topological order
    let mut indegree = vec![0usize; count];
    for (index, edge) in set.edges.iter().enumerate() {
        if !back_edges.contains(&index) && edge.to < count {
            indegree[edge.to] += 1;
        }
    }
    let mut rank = vec![0usize; count];
    let mut queue: VecDeque<NodeId> = (0..count).filter(|&n| indegree[n] == 0).collect();
    while let Some(node) = queue.pop_front() {
        for (index, edge) in set.edges.iter().enumerate() {
            if edge.from != node || edge.to >= count || back_edges.contains(&index) {
                continue;
            }
            rank[edge.to] = rank[edge.to].max(rank[node] + 1);
            indegree[edge.to] -= 1;
            if indegree[edge.to] == 0 {
                queue.push_back(edge.to);
            }
        }
    }

    let ranks = rank.iter().map(|r| r + 1).max().unwrap_or(0);
    let mut next_column = vec![0usize; ranks];
    let mut cells = Vec::with_capacity(count);
    for node in 0..count {
        let column = next_column[rank[node]];
        next_column[rank[node]] += 1;
        cells.push(Cell {
            node,
            rank: rank[node],
            column,
            x: MARGIN + column as f64 * (NODE_WIDTH + COLUMN_GAP),
            y: MARGIN + rank[node] as f64 * (NODE_HEIGHT + RANK_GAP),
        });
    }

    let columns = next_column.iter().copied().max().unwrap_or(0);
    let width = 2.0 * MARGIN + span(columns, NODE_WIDTH, COLUMN_GAP);
    let height = 2.0 * MARGIN + span(ranks, NODE_HEIGHT, RANK_GAP);

    Layout {
        cells,
        back_edges,
        width,
        height,
    }
}

fn span(slots: usize, size: f64, gap: f64) -> f64 {
    if slots == 0 {
        0.0
    } else {
        slots as f64 * size + (slots - 1) as f64 * gap
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    Active,
    Done,
}

/// Edges that point at a node still on the DFS stack, in edge order
fn find_back_edges(set: &FlowchartSet) -> Vec<usize> {
    let count = set.nodes.len();
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); count];
    for (index, edge) in set.edges.iter().enumerate() {
        if edge.from < count && edge.to < count {
            outgoing[edge.from].push(index);
        }
    }

    let mut marks = vec![Mark::Unvisited; count];
    let mut back_edges = Vec::new();
    // start first, then anything unreachable from it
    for root in 0..count {
        if marks[root] != Mark::Unvisited {
            continue;
        }
        marks[root] = Mark::Active;
        let mut stack = vec![(root, 0usize)];
        while let Some((node, next)) = stack.pop() {
            let Some(&index) = outgoing[node].get(next) else {
                marks[node] = Mark::Done;
                continue;
            };
            stack.push((node, next + 1));
            let to = set.edges[index].to;
            match marks[to] {
                Mark::Active => back_edges.push(index),
                Mark::Unvisited => {
                    marks[to] = Mark::Active;
                    stack.push((to, 0));
                }
                Mark::Done => {}
            }
        }
    }
    back_edges.sort_unstable();
    back_edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeKind;

    fn chain(kinds: &[NodeKind]) -> FlowchartSet {
        let mut set = FlowchartSet::new("t");
        for kind in kinds {
            set.add_node(*kind, "", None);
        }
        set
    }

    #[test]
    fn test_straight_line_ranks() {
        let mut set = chain(&[NodeKind::Start, NodeKind::Process, NodeKind::End]);
        set.add_edge(0, 1, None);
        set.add_edge(1, 2, None);
        let layout = layout(&set);
        let ranks: Vec<usize> = layout.cells.iter().map(|c| c.rank).collect();
        assert_eq!(ranks, vec![0, 1, 2]);
        assert!(layout.back_edges.is_empty());
        assert_eq!(layout.rank_count(), 3);
        assert_eq!(layout.cell(2).map(|c| c.y), Some(MARGIN + 2.0 * (NODE_HEIGHT + RANK_GAP)));
    }

    #[test]
    fn test_loop_back_edge_is_ignored() {
        // start -> loop -> body -> loop, loop -> end
        let mut set = chain(&[NodeKind::Start, NodeKind::Loop, NodeKind::Process, NodeKind::End]);
        set.add_edge(0, 1, None);
        set.add_edge(1, 2, Some("true".into()));
        set.add_edge(2, 1, None);
        set.add_edge(1, 3, Some("false".into()));
        let layout = layout(&set);
        assert_eq!(layout.back_edges, vec![2]);
        assert_eq!(layout.cell(2).map(|c| c.rank), Some(2));
        assert_eq!(layout.cell(3).map(|c| c.rank), Some(2));
        assert_eq!(layout.cell(3).map(|c| c.column), Some(1));
    }

    #[test]
    fn test_longest_path_wins() {
        // start -> decision -> a -> b -> merge, decision -> merge
        let mut set = chain(&[
            NodeKind::Start,
            NodeKind::Decision,
            NodeKind::Process,
            NodeKind::Process,
            NodeKind::Merge,
        ]);
        set.add_edge(0, 1, None);
        set.add_edge(1, 2, Some("true".into()));
        set.add_edge(2, 3, None);
        set.add_edge(3, 4, None);
        set.add_edge(1, 4, Some("false".into()));
        let layout = layout(&set);
        assert_eq!(layout.cell(4).map(|c| c.rank), Some(4));
        assert_eq!(layout.width, 2.0 * MARGIN + NODE_WIDTH);
    }

    #[test]
    fn test_empty_set() {
        let layout = layout(&FlowchartSet::new("empty"));
        assert!(layout.cells.is_empty());
        assert_eq!(layout.width, 2.0 * MARGIN);
    }
}
