//! Transition system of one method
//!
//! The CFG topology is built first and then frozen by the program. Each
//! node owns one abstract state in the method's state store; the exploded
//! graph records which fact produced which, and yields the summary.

use crate::config::JoinMode;
use crate::errors::{EngineError, Result};
use crate::features::join::{Fact, RepositoryId, StateStore};
use crate::features::semantics::domain::{ActionInstance, PhaseTimer, StructureMessages};
use crate::features::structure::ports::AbstractStructure;
use crate::features::transition_system::domain::{
    invocation_string, CfgEdge, MethodId, MethodKind, NodeKind, SummaryDelta, TsNode,
};
use crate::features::transition_system::infrastructure::{Cfg, ExplodedGraph};
use petgraph::graph::NodeIndex;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Debug, Clone)]
pub struct MethodTs<S> {
    id: MethodId,
    signature: String,
    kind: MethodKind,
    cfg: Cfg,
    store: StateStore<S>,
    exploded: ExplodedGraph,
    entry: NodeIndex,
    exit: NodeIndex,
}

impl<S: AbstractStructure> MethodTs<S> {
    pub fn new(
        id: MethodId,
        signature: impl Into<String>,
        kind: MethodKind,
        entry_label: &str,
        exit_label: &str,
        join_mode: JoinMode,
    ) -> Result<Self> {
        let signature = signature.into();
        if entry_label == exit_label {
            return Err(EngineError::registration(format!(
                "method {} uses {} as both entry and exit",
                signature, entry_label
            )));
        }
        let mut store = StateStore::new(RepositoryId(id.0), join_mode);
        let mut cfg = Cfg::new();
        let entry = cfg.add_node(TsNode::new(entry_label, NodeKind::Entry, store.allocate_state()));
        let exit = cfg.add_node(TsNode::new(exit_label, NodeKind::Exit, store.allocate_state()));
        Ok(Self {
            id,
            signature,
            kind,
            cfg,
            store,
            exploded: ExplodedGraph::new(entry, exit),
            entry,
            exit,
        })
    }

    pub fn id(&self) -> MethodId {
        self.id
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn kind(&self) -> MethodKind {
        self.kind
    }

    pub fn entry(&self) -> NodeIndex {
        self.entry
    }

    pub fn exit(&self) -> NodeIndex {
        self.exit
    }

    pub fn cfg(&self) -> &Cfg {
        &self.cfg
    }

    pub fn store(&self) -> &StateStore<S> {
        &self.store
    }

    pub fn contains_site(&self, site: NodeIndex) -> bool {
        self.cfg.node(site).is_some()
    }

    /// Node labelled `label`
    pub fn node(&self, label: &str) -> Option<NodeIndex> {
        self.cfg.lookup(label)
    }

    pub fn ts_node(&self, site: NodeIndex) -> Result<&TsNode> {
        self.cfg.node(site).ok_or_else(|| {
            EngineError::misuse(format!(
                "node {} does not belong to {}",
                site.index(),
                self.signature
            ))
        })
    }

    /// Find or create the node `label` for use as `kind`.
    ///
    /// Entry, exit and return sites also serve as intra endpoints; an intra
    /// node is promoted once when a call is discovered at it. Any other
    /// mismatch is an error.
    pub fn obtain_node(&mut self, kind: NodeKind, label: &str) -> Result<NodeIndex> {
        if let Some(index) = self.cfg.lookup(label) {
            let signature = &self.signature;
            let node = self
                .cfg
                .node_mut(index)
                .ok_or_else(|| EngineError::misuse(format!("dangling label {}", label)))?;
            if node.kind() == kind || (kind == NodeKind::Intra && node.kind().accepts_intra()) {
                return Ok(index);
            }
            if node.kind() == NodeKind::Intra && kind.is_call_site() {
                node.specialize(kind)?;
                trace!(label, %kind, "intra node promoted to call site");
                return Ok(index);
            }
            return Err(EngineError::misuse(format!(
                "node {} in {} has conflicting types: was {} and now {}",
                label,
                signature,
                node.kind(),
                kind
            )));
        }
        let state = self.store.allocate_state();
        let index = self.cfg.add_node(TsNode::new(label, kind, state));
        self.exploded.add_node(index);
        Ok(index)
    }

    pub fn add_intra_stmt(&mut self, from: &str, to: &str, action: Arc<ActionInstance>) -> Result<()> {
        let src = self.obtain_node(NodeKind::Intra, from)?;
        // any node may be entered by an intra edge, call sites included
        let dst = match self.cfg.lookup(to) {
            Some(index) => index,
            None => self.obtain_node(NodeKind::Intra, to)?,
        };
        trace!(method = %self.signature, from, to, action = %action, "intra statement");
        self.cfg.add_edge(src, dst, CfgEdge::Intra(action));
        self.exploded.add_edge(src, dst);
        Ok(())
    }

    pub fn add_static_invocation(&mut self, from: &str, to: &str, callee: &str, args: &[String]) -> Result<()> {
        self.add_invocation(NodeKind::StaticCallSite, from, to, callee, args)
    }

    pub fn add_constructor_invocation(&mut self, from: &str, to: &str, callee: &str, args: &[String]) -> Result<()> {
        self.add_invocation(NodeKind::ConstructorCallSite, from, to, callee, args)
    }

    /// Candidate targets of one virtual call share a single call-to-return
    /// edge; registering another candidate leaves the CFG unchanged.
    pub fn add_virtual_invocation(&mut self, from: &str, to: &str, callee: &str, args: &[String]) -> Result<()> {
        self.add_invocation(NodeKind::VirtualCallSite, from, to, callee, args)
    }

    /// Whether a `kind` call from `from` returning to `to` can be added.
    /// Leaves the CFG untouched, so a rejected call changes nothing.
    ///
    /// A call site has exactly one outgoing edge, its call-to-return edge.
    /// Only another candidate of the same virtual call may reuse it.
    pub fn check_invocation(&self, kind: NodeKind, from: &str, to: &str) -> Result<()> {
        if from == to {
            return Err(EngineError::misuse(format!(
                "call site {} in {} returns to itself",
                from, self.signature
            )));
        }
        let dst = self.cfg.lookup(to);
        if let Some(dst) = dst {
            let node = self.ts_node(dst)?;
            if node.kind() != NodeKind::ReturnSite {
                return Err(self.conflict(to, node.kind(), NodeKind::ReturnSite));
            }
        }
        let Some(src) = self.cfg.lookup(from) else {
            return Ok(());
        };
        let node = self.ts_node(src)?;
        if node.kind() != kind && node.kind() != NodeKind::Intra {
            return Err(self.conflict(from, node.kind(), kind));
        }
        let existing = self.cfg.outgoing(src);
        if existing.is_empty() {
            return Ok(());
        }
        let shared = kind == NodeKind::VirtualCallSite
            && existing.len() == 1
            && existing[0].1.is_call_to_return()
            && Some(existing[0].0) == dst;
        if shared {
            return Ok(());
        }
        Err(EngineError::misuse(format!(
            "call site {} in {} already has an outgoing edge",
            from, self.signature
        )))
    }

    fn conflict(&self, label: &str, was: NodeKind, now: NodeKind) -> EngineError {
        EngineError::misuse(format!(
            "node {} in {} has conflicting types: was {} and now {}",
            label, self.signature, was, now
        ))
    }

    fn add_invocation(
        &mut self,
        kind: NodeKind,
        from: &str,
        to: &str,
        callee: &str,
        args: &[String],
    ) -> Result<()> {
        self.check_invocation(kind, from, to)?;
        let src = self.obtain_node(kind, from)?;
        if self.cfg.return_site(src).is_some() {
            return Ok(());
        }
        let dst = self.obtain_node(NodeKind::ReturnSite, to)?;
        self.add_call_to_return(src, dst, callee, args);
        Ok(())
    }

    fn add_call_to_return(&mut self, src: NodeIndex, dst: NodeIndex, callee: &str, args: &[String]) {
        let invocation = invocation_string(callee, args);
        trace!(method = %self.signature, %invocation, "call-to-return edge");
        self.cfg.add_edge(src, dst, CfgEdge::CallToReturn { invocation });
        self.exploded.add_edge(src, dst);
    }

    /// Outgoing edges of `site`. A call site has exactly its call-to-return
    /// edge.
    pub fn following_edges(&self, site: NodeIndex) -> Vec<(NodeIndex, &CfgEdge)> {
        self.cfg.outgoing(site)
    }

    pub fn matching_return_node(&self, call_site: NodeIndex) -> Result<NodeIndex> {
        let node = self.ts_node(call_site)?;
        if !node.is_call_site() {
            return Err(EngineError::misuse(format!(
                "{} is not a call site",
                node.render_label("")
            )));
        }
        self.cfg.return_site(call_site).ok_or_else(|| {
            EngineError::misuse(format!("call site {} has no return site", node.label()))
        })
    }

    /// Join `structure` into the state at `site`. The exploded graph only
    /// learns about facts that changed the state.
    pub fn add_structure(&mut self, site: NodeIndex, structure: S) -> Result<(bool, Fact)> {
        let state = self.ts_node(site)?.state();
        let (changed, fact) = self.store.add_structure(state, structure)?;
        if changed {
            self.exploded.add_fact(site, fact);
        }
        Ok((changed, fact))
    }

    pub fn add_transition(&mut self, from: NodeIndex, from_fact: Fact, to: NodeIndex, to_fact: Fact) -> Result<bool> {
        self.exploded.add_transition(from, from_fact, to, to_fact)
    }

    /// Exit facts cached for `entry_fact` by the last summary update
    pub fn known_effect(&self, entry_fact: Fact) -> Vec<Fact> {
        self.exploded.cached_exit_facts(entry_fact)
    }

    pub fn fact_for_structure(&self, site: NodeIndex, structure: &S) -> Option<Fact> {
        let state = self.cfg.node(site)?.state();
        self.store.fact_for_existing(state, structure)
    }

    pub fn update_summary(&mut self) -> Option<SummaryDelta> {
        let delta = self.exploded.forward_delta();
        if let Some(delta) = &delta {
            debug!(
                method = %self.signature,
                added = delta.added.len(),
                refreshed = delta.refreshed.len(),
                "summary updated"
            );
        }
        delta
    }

    pub fn structure(&self, fact: Fact) -> Option<&S> {
        self.store.structure(fact)
    }

    pub fn facts_at(&self, site: NodeIndex) -> Vec<Fact> {
        self.cfg
            .node(site)
            .map(|n| {
                self.store
                    .structures(n.state())
                    .into_iter()
                    .map(|(fact, _)| fact)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Facts at `site` that have not been propagated anywhere
    pub fn stuck_facts(&self, site: NodeIndex) -> Vec<Fact> {
        self.exploded.stuck_facts(site)
    }

    pub fn transitions(&self, src: NodeIndex, dst: NodeIndex) -> Vec<(Fact, Fact)> {
        self.exploded.transitions(src, dst)
    }

    /// Every structure, node by node in DFS order from the entry
    pub fn all_structures(&self) -> Vec<&S> {
        self.cfg
            .dfs_order(self.entry)
            .into_iter()
            .filter_map(|i| self.cfg.node(i))
            .flat_map(|n| self.store.structures(n.state()).into_iter().map(|(_, s)| s))
            .collect()
    }

    pub fn add_messages(&mut self, fact: Fact, messages: StructureMessages<S>) {
        self.store.add_messages(fact, messages);
    }

    pub fn messages(&self, fact: Fact) -> Option<&StructureMessages<S>> {
        self.store.messages(fact)
    }

    pub fn set_print_all(&mut self) {
        for index in self.cfg.node_indices().collect::<Vec<_>>() {
            if let Some(node) = self.cfg.node_mut(index) {
                node.set_print(true);
            }
        }
    }

    /// Print only entry, exit, call and return sites
    pub fn set_print_interproc(&mut self) {
        for index in self.cfg.node_indices().collect::<Vec<_>>() {
            if let Some(node) = self.cfg.node_mut(index) {
                if node.kind() != NodeKind::Intra {
                    node.set_print(true);
                }
            }
        }
    }

    pub fn set_print_node(&mut self, label: &str) -> Result<()> {
        let index = self.cfg.lookup(label).ok_or_else(|| {
            EngineError::misuse(format!("no node {} in {}", label, self.signature))
        })?;
        if let Some(node) = self.cfg.node_mut(index) {
            node.set_print(true);
        }
        Ok(())
    }

    /// Messages grouped per node, nodes in DFS order
    pub fn render_messages(&self) -> String {
        let mut out = String::new();
        for index in self.cfg.dfs_order(self.entry) {
            let Some(node) = self.cfg.node(index) else {
                continue;
            };
            let mut header = false;
            for (fact, _) in self.store.structures(node.state()) {
                let Some(messages) = self.store.messages(fact) else {
                    continue;
                };
                if !header {
                    let _ = writeln!(out, "{}", node.render_label(&format!("{} ", self.signature)));
                    header = true;
                }
                for (focused, texts) in messages.iter() {
                    for text in texts {
                        let _ = writeln!(out, "  {}", text);
                    }
                    if node.should_print() {
                        for line in focused.render().lines() {
                            let _ = writeln!(out, "    {}", line);
                        }
                    }
                }
            }
        }
        out
    }

    /// Structures at the nodes marked for printing
    pub fn render_nodes(&self) -> String {
        let mut out = String::new();
        for index in self.cfg.dfs_order(self.entry) {
            let Some(node) = self.cfg.node(index) else {
                continue;
            };
            if !node.should_print() {
                continue;
            }
            let structures = self.store.structures(node.state());
            let _ = writeln!(out, "{} ({} structures)", node.render_label(""), structures.len());
            for (fact, s) in structures {
                let _ = writeln!(out, "  {}", fact);
                for line in s.render().lines() {
                    let _ = writeln!(out, "    {}", line);
                }
            }
        }
        out
    }

    pub fn join_timer(&self) -> PhaseTimer {
        self.store.join_timer()
    }
}
