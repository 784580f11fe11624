//! Reference three-valued structure
//!
//! Sparse storage: one ordered table per predicate mapping node tuples to
//! non-false Kleene values. Absent tuples are false. The summary marker is
//! the reserved `sm` predicate.

use crate::config::JoinMode;
use crate::features::structure::domain::{Constraint, Formula};
use crate::features::structure::ports::{
    AbstractStructure, MergeOutcome, NodeId, NullaryCombiner,
};
use crate::features::vocabulary::{PredicateId, Vocabulary};
use crate::shared::models::Kleene;
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;

pub(super) type Table = BTreeMap<Box<[NodeId]>, Kleene>;

#[derive(Clone)]
pub struct ThreeValuedStructure {
    pub(super) vocabulary: Arc<Vocabulary>,
    pub(super) constraints: Arc<Vec<Constraint>>,
    pub(super) nodes: BTreeSet<NodeId>,
    pub(super) next_node: u32,
    pub(super) tables: Vec<Table>,
}

impl ThreeValuedStructure {
    /// Empty structure over `vocabulary` with no integrity constraints
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        let tables = vec![Table::new(); vocabulary.len()];
        Self {
            vocabulary,
            constraints: Arc::new(Vec::new()),
            nodes: BTreeSet::new(),
            next_node: 0,
            tables,
        }
    }

    pub fn with_constraints(mut self, constraints: Arc<Vec<Constraint>>) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn constraints(&self) -> &Arc<Vec<Constraint>> {
        &self.constraints
    }

    /// Non-false entries of `pred`
    pub fn entries(&self, pred: PredicateId) -> impl Iterator<Item = (&[NodeId], Kleene)> {
        self.tables[pred.index()].iter().map(|(k, v)| (&**k, *v))
    }

    /// Copy `node` into a fresh node. Every tuple mentioning `node` is
    /// replicated for each way of substituting the copy at its positions.
    pub(super) fn duplicate_node(&mut self, node: NodeId) -> NodeId {
        let copy = self.new_node();
        for table in &mut self.tables {
            let mut additions = Vec::new();
            for (tuple, value) in table.iter() {
                let positions: Vec<usize> = tuple
                    .iter()
                    .enumerate()
                    .filter(|(_, n)| **n == node)
                    .map(|(i, _)| i)
                    .collect();
                if positions.is_empty() {
                    continue;
                }
                for mask in 1u32..(1u32 << positions.len()) {
                    let mut variant = tuple.to_vec();
                    for (bit, &pos) in positions.iter().enumerate() {
                        if mask & (1 << bit) != 0 {
                            variant[pos] = copy;
                        }
                    }
                    additions.push((variant.into_boxed_slice(), *value));
                }
            }
            table.extend(additions);
        }
        copy
    }

    fn same_contents(&self, other: &Self) -> bool {
        self.nodes == other.nodes && self.tables == other.tables
    }
}

impl PartialEq for ThreeValuedStructure {
    fn eq(&self, other: &Self) -> bool {
        self.same_contents(other)
    }
}

impl fmt::Debug for ThreeValuedStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl AbstractStructure for ThreeValuedStructure {
    fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocabulary
    }

    fn nodes(&self) -> Vec<NodeId> {
        self.nodes.iter().copied().collect()
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn eval(&self, pred: PredicateId, tuple: &[NodeId]) -> Kleene {
        self.tables[pred.index()]
            .get(tuple)
            .copied()
            .unwrap_or(Kleene::False)
    }

    fn update(&mut self, pred: PredicateId, tuple: &[NodeId], value: Kleene) {
        debug_assert_eq!(tuple.len(), self.vocabulary.arity(pred));
        debug_assert!(tuple.iter().all(|n| self.nodes.contains(n)));
        let table = &mut self.tables[pred.index()];
        if value == Kleene::False {
            table.remove(tuple);
        } else {
            table.insert(tuple.into(), value);
        }
    }

    fn new_node(&mut self) -> NodeId {
        let node = NodeId(self.next_node);
        self.next_node += 1;
        self.nodes.insert(node);
        node
    }

    fn remove_node(&mut self, node: NodeId) {
        if self.nodes.remove(&node) {
            for table in &mut self.tables {
                table.retain(|tuple, _| !tuple.contains(&node));
            }
        }
    }

    fn focus(&self, formulas: &[Formula]) -> Vec<Self> {
        self.focus_all(formulas)
    }

    fn coerce(&mut self) -> bool {
        self.coerce_constraints()
    }

    fn blur(&mut self) {
        self.blur_nodes();
    }

    fn merge_with(&mut self, other: &Self, mode: JoinMode) -> MergeOutcome {
        match mode {
            JoinMode::Relational => {
                if self.isomorphic(other) {
                    MergeOutcome::Subsumed
                } else {
                    MergeOutcome::Unrelated
                }
            }
            JoinMode::Partial => match self.join_into(other) {
                MergeOutcome::Unrelated if self.isomorphic(other) => MergeOutcome::Subsumed,
                outcome => outcome,
            },
        }
    }

    fn is_isomorphic(&self, other: &Self) -> bool {
        self.isomorphic(other)
    }

    fn combine(combiner: &dyn NullaryCombiner, call: &Self, exit: &Self) -> Self {
        let mut out = ThreeValuedStructure::new(Arc::clone(&call.vocabulary))
            .with_constraints(Arc::clone(&call.constraints));
        let call_map: FxHashMap<NodeId, NodeId> =
            call.nodes.iter().map(|n| (*n, out.new_node())).collect();
        let exit_map: FxHashMap<NodeId, NodeId> =
            exit.nodes.iter().map(|n| (*n, out.new_node())).collect();

        for pred in call.vocabulary.iter() {
            let p = pred.id;
            if pred.arity == 0 {
                let value = combiner.combine(call.eval(p, &[]), exit.eval(p, &[]));
                out.update(p, &[], value);
                continue;
            }
            for (side, map) in [(call, &call_map), (exit, &exit_map)] {
                for (tuple, value) in side.entries(p) {
                    let mapped: Vec<NodeId> = tuple.iter().map(|n| map[n]).collect();
                    out.update(p, &mapped, value);
                }
            }
        }
        out
    }

    fn render(&self) -> String {
        let sm = self.vocabulary.reserved().sm;
        let mut out = String::new();
        let _ = write!(out, "nodes:");
        for node in &self.nodes {
            let mark = if self.eval(sm, &[*node]) == Kleene::Unknown {
                "*"
            } else {
                ""
            };
            let _ = write!(out, " {}{}", node, mark);
        }
        out.push('\n');
        for pred in self.vocabulary.iter() {
            let table = &self.tables[pred.id.index()];
            if pred.id == sm || table.is_empty() {
                continue;
            }
            if pred.arity == 0 {
                let value = table.values().next().copied().unwrap_or(Kleene::False);
                let _ = writeln!(out, "{} = {}", pred.name, value);
                continue;
            }
            let _ = write!(out, "{}:", pred.name);
            for (tuple, value) in table {
                let names: Vec<String> = tuple.iter().map(|n| n.to_string()).collect();
                if names.len() == 1 {
                    let _ = write!(out, " {}={}", names[0], value);
                } else {
                    let _ = write!(out, " ({})={}", names.join(","), value);
                }
            }
            out.push('\n');
        }
        out
    }
}
