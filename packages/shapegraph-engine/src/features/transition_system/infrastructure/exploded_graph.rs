//! Exploded fact graph and summary cache
//!
//! Nodes are (CFG node, fact) pairs, edges are discovered transitions. The
//! forward summary maps each entry fact to the exit facts reachable from it.

use crate::errors::{EngineError, Result};
use crate::features::join::Fact;
use crate::features::transition_system::domain::SummaryDelta;
use petgraph::graph::NodeIndex;
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Dfs;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{BTreeMap, BTreeSet};

type FactNode = (NodeIndex, Fact);

#[derive(Debug, Clone)]
pub struct ExplodedGraph {
    facts: DiGraphMap<FactNode, ()>,
    node_facts: FxHashMap<NodeIndex, Vec<Fact>>,
    skeleton: FxHashSet<(NodeIndex, NodeIndex)>,
    source: NodeIndex,
    sink: NodeIndex,
    forward: BTreeMap<Fact, BTreeSet<Fact>>,
    forward_up_to_date: bool,
    frozen: BTreeSet<(Fact, Fact)>,
    propagated_to_exit: BTreeSet<Fact>,
}

impl ExplodedGraph {
    pub fn new(source: NodeIndex, sink: NodeIndex) -> Self {
        let mut node_facts = FxHashMap::default();
        node_facts.insert(source, Vec::new());
        node_facts.insert(sink, Vec::new());
        Self {
            facts: DiGraphMap::new(),
            node_facts,
            skeleton: FxHashSet::default(),
            source,
            sink,
            forward: BTreeMap::new(),
            forward_up_to_date: true,
            frozen: BTreeSet::new(),
            propagated_to_exit: BTreeSet::new(),
        }
    }

    pub fn add_node(&mut self, node: NodeIndex) {
        self.node_facts.entry(node).or_default();
    }

    pub fn add_edge(&mut self, src: NodeIndex, dst: NodeIndex) {
        self.add_node(src);
        self.add_node(dst);
        self.skeleton.insert((src, dst));
    }

    pub fn contains_edge(&self, src: NodeIndex, dst: NodeIndex) -> bool {
        self.skeleton.contains(&(src, dst))
    }

    pub fn contains_fact(&self, node: NodeIndex, fact: Fact) -> bool {
        self.facts.contains_node((node, fact))
    }

    pub fn facts_at(&self, node: NodeIndex) -> &[Fact] {
        self.node_facts.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns false if the fact is already known. A known fact re-added at
    /// the sink is remembered as re-propagated.
    pub fn add_fact(&mut self, node: NodeIndex, fact: Fact) -> bool {
        if self.contains_fact(node, fact) {
            if node == self.sink {
                self.propagated_to_exit.insert(fact);
            }
            return false;
        }
        self.node_facts.entry(node).or_default().push(fact);
        self.facts.add_node((node, fact));
        self.forward_up_to_date = false;
        true
    }

    pub fn add_transition(&mut self, src: NodeIndex, src_fact: Fact, dst: NodeIndex, dst_fact: Fact) -> Result<bool> {
        if !self.contains_edge(src, dst) {
            return Err(EngineError::misuse(format!(
                "no CFG edge {} -> {}",
                src.index(),
                dst.index()
            )));
        }
        if !self.contains_fact(src, src_fact) || !self.contains_fact(dst, dst_fact) {
            return Err(EngineError::misuse(format!(
                "transition {} -> {} between unknown facts",
                src_fact, dst_fact
            )));
        }
        let (from, to) = ((src, src_fact), (dst, dst_fact));
        if self.facts.contains_edge(from, to) {
            return Ok(false);
        }
        self.facts.add_edge(from, to, ());
        self.forward_up_to_date = false;
        Ok(true)
    }

    /// Transitions between facts at `src` and facts at `dst`
    pub fn transitions(&self, src: NodeIndex, dst: NodeIndex) -> Vec<(Fact, Fact)> {
        self.facts_at(src)
            .iter()
            .flat_map(|&f| {
                self.facts
                    .neighbors((src, f))
                    .filter(move |(n, _)| *n == dst)
                    .map(move |(_, g)| (f, g))
            })
            .collect()
    }

    /// Facts at `node` with no outgoing transition
    pub fn stuck_facts(&self, node: NodeIndex) -> Vec<Fact> {
        self.facts_at(node)
            .iter()
            .copied()
            .filter(|&f| self.facts.neighbors((node, f)).next().is_none())
            .collect()
    }

    fn update_forward(&mut self) {
        let mut forward = BTreeMap::new();
        for &entry in self.facts_at(self.source) {
            let mut exits = BTreeSet::new();
            let mut dfs = Dfs::new(&self.facts, (self.source, entry));
            while let Some((node, fact)) = dfs.next(&self.facts) {
                if node == self.sink {
                    exits.insert(fact);
                }
            }
            forward.insert(entry, exits);
        }
        self.forward = forward;
        self.forward_up_to_date = true;
    }

    /// Summary pairs discovered since the previous call
    pub fn forward_delta(&mut self) -> Option<SummaryDelta> {
        if !self.forward_up_to_date {
            self.update_forward();
        }
        let current: BTreeSet<(Fact, Fact)> = self
            .forward
            .iter()
            .flat_map(|(&entry, exits)| exits.iter().map(move |&exit| (entry, exit)))
            .collect();

        let delta = SummaryDelta {
            added: current.difference(&self.frozen).copied().collect(),
            refreshed: self
                .frozen
                .iter()
                .filter(|(_, exit)| self.propagated_to_exit.contains(exit))
                .copied()
                .collect(),
        };
        self.propagated_to_exit.clear();
        self.frozen = current;
        (!delta.is_empty()).then_some(delta)
    }

    /// Exit facts for `entry` as of the last summary computation
    pub fn cached_exit_facts(&self, entry: Fact) -> Vec<Fact> {
        self.forward
            .get(&entry)
            .map(|exits| exits.iter().copied().collect())
            .unwrap_or_default()
    }
}
