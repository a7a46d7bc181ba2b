//! Flowchart graph types

use serde::{Deserialize, Serialize};
use usdb_ast::Span;

/// Index of a node within its [`FlowchartSet`]
pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Start,
    End,
    Process,
    /// Reserved for I/O markers; the lowering emits `Process` for PRINT and SCAN
    Input,
    Output,
    Decision,
    Loop,
    Merge,
    Call,
    Return,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowchartNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    /// Routine a `call` node links to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowchartEdge {
    pub from: NodeId,
    pub to: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// The flowchart of one routine or of the main program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowchartSet {
    pub name: String,
    pub nodes: Vec<FlowchartNode>,
    pub edges: Vec<FlowchartEdge>,
}

impl FlowchartSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn add_node(&mut self, kind: NodeKind, label: impl Into<String>, span: Option<Span>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(FlowchartNode {
            id,
            kind,
            label: label.into(),
            span,
            target: None,
        });
        id
    }

    pub fn add_edge(&mut self, from: NodeId, to: NodeId, label: Option<String>) {
        self.edges.push(FlowchartEdge { from, to, label });
    }

    pub fn node(&self, id: NodeId) -> Option<&FlowchartNode> {
        self.nodes.get(id)
    }

    pub fn outgoing(&self, id: NodeId) -> impl Iterator<Item = &FlowchartEdge> {
        self.edges.iter().filter(move |e| e.from == id)
    }

    pub fn incoming(&self, id: NodeId) -> impl Iterator<Item = &FlowchartEdge> {
        self.edges.iter().filter(move |e| e.to == id)
    }

    pub fn nodes_of(&self, kind: NodeKind) -> impl Iterator<Item = &FlowchartNode> {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }

    /// The `start` node, always the first one created
    pub fn start(&self) -> Option<&FlowchartNode> {
        self.nodes_of(NodeKind::Start).next()
    }

    pub fn end(&self) -> Option<&FlowchartNode> {
        self.nodes_of(NodeKind::End).next()
    }
}
