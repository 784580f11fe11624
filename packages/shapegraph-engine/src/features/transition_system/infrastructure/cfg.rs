//! Control-flow multigraph of one method

use crate::features::transition_system::domain::{CfgEdge, TsNode};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef};
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Clone, Default)]
pub struct Cfg {
    graph: DiGraph<TsNode, CfgEdge>,
    labels: FxHashMap<String, NodeIndex>,
}

impl Cfg {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; the label must be fresh
    pub fn add_node(&mut self, node: TsNode) -> NodeIndex {
        let label = node.label().to_string();
        debug_assert!(!self.labels.contains_key(&label));
        let index = self.graph.add_node(node);
        self.labels.insert(label, index);
        index
    }

    pub fn lookup(&self, label: &str) -> Option<NodeIndex> {
        self.labels.get(label).copied()
    }

    pub fn node(&self, index: NodeIndex) -> Option<&TsNode> {
        self.graph.node_weight(index)
    }

    pub fn node_mut(&mut self, index: NodeIndex) -> Option<&mut TsNode> {
        self.graph.node_weight_mut(index)
    }

    pub fn add_edge(&mut self, src: NodeIndex, dst: NodeIndex, edge: CfgEdge) -> EdgeIndex {
        self.graph.add_edge(src, dst, edge)
    }

    pub fn has_edge(&self, src: NodeIndex, dst: NodeIndex) -> bool {
        self.graph.contains_edge(src, dst)
    }

    /// Outgoing edges in insertion order
    pub fn outgoing(&self, src: NodeIndex) -> Vec<(NodeIndex, &CfgEdge)> {
        let mut edges: Vec<_> = self.graph.edges(src).collect();
        edges.sort_by_key(|e| e.id());
        edges.into_iter().map(|e| (e.target(), e.weight())).collect()
    }

    /// Distinct successors
    pub fn successors(&self, src: NodeIndex) -> Vec<NodeIndex> {
        let mut seen = FxHashSet::default();
        self.outgoing(src)
            .into_iter()
            .filter_map(|(dst, _)| seen.insert(dst).then_some(dst))
            .collect()
    }

    /// Target of the call-to-return edge leaving `call_site`
    pub fn return_site(&self, call_site: NodeIndex) -> Option<NodeIndex> {
        self.outgoing(call_site)
            .into_iter()
            .find(|(_, edge)| edge.is_call_to_return())
            .map(|(dst, _)| dst)
    }

    /// Depth-first from `start`, then any unreachable nodes in creation order
    pub fn dfs_order(&self, start: NodeIndex) -> Vec<NodeIndex> {
        let mut order = Vec::with_capacity(self.graph.node_count());
        let mut visited = FxHashSet::default();
        if self.graph.node_weight(start).is_some() {
            let mut dfs = Dfs::new(&self.graph, start);
            while let Some(index) = dfs.next(&self.graph) {
                visited.insert(index);
                order.push(index);
            }
        }
        order.extend(self.graph.node_indices().filter(|i| !visited.contains(i)));
        order
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
