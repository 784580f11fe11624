//! Abstract structure port
//!
//! The engine only talks to structures through this trait. Storage layout,
//! node identity and the focus/coerce/blur algorithms belong to the
//! implementation.

use crate::config::JoinMode;
use crate::features::structure::domain::Formula;
use crate::features::vocabulary::{PredicateId, Vocabulary};
use crate::shared::models::Kleene;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Node identifier, unique within one structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u{}", self.0)
    }
}

/// Result of merging a candidate into an existing structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The candidate cannot be merged into this structure
    Unrelated,
    /// The candidate adds nothing; this structure is unchanged
    Subsumed,
    /// The candidate was joined in and this structure grew
    Merged,
}

/// Combines the nullary predicate values of the two sides of a combine
pub trait NullaryCombiner {
    fn combine(&self, call: Kleene, exit: Kleene) -> Kleene;
}

/// Logical OR of the two sides
#[derive(Debug, Clone, Copy, Default)]
pub struct OrCombiner;

impl NullaryCombiner for OrCombiner {
    fn combine(&self, call: Kleene, exit: Kleene) -> Kleene {
        call.or(exit)
    }
}

impl<F> NullaryCombiner for F
where
    F: Fn(Kleene, Kleene) -> Kleene,
{
    fn combine(&self, call: Kleene, exit: Kleene) -> Kleene {
        self(call, exit)
    }
}

pub trait AbstractStructure: Clone + fmt::Debug {
    fn vocabulary(&self) -> &Arc<Vocabulary>;

    /// Nodes in ascending id order
    fn nodes(&self) -> Vec<NodeId>;

    fn node_count(&self) -> usize {
        self.nodes().len()
    }

    fn eval(&self, pred: PredicateId, tuple: &[NodeId]) -> Kleene;

    fn update(&mut self, pred: PredicateId, tuple: &[NodeId], value: Kleene);

    /// Allocate a fresh non-summary node with every predicate false
    fn new_node(&mut self) -> NodeId;

    fn remove_node(&mut self, node: NodeId);

    /// Split into structures where each focus formula is definite. The
    /// disjunction of the results denotes the same configurations as `self`.
    fn focus(&self, formulas: &[Formula]) -> Vec<Self>;

    /// Sharpen with the integrity constraints; `false` when infeasible
    fn coerce(&mut self) -> bool;

    /// Merge nodes with equal canonical names
    fn blur(&mut self);

    fn merge_with(&mut self, other: &Self, mode: JoinMode) -> MergeOutcome;

    fn is_isomorphic(&self, other: &Self) -> bool;

    /// Disjoint union of the two node universes. Nullary predicates are
    /// combined with `combiner`; tuples spanning both sides are false.
    fn combine(combiner: &dyn NullaryCombiner, call: &Self, exit: &Self) -> Self;

    /// Human-readable dump used in diagnostics
    fn render(&self) -> String;

    fn is_summary(&self, node: NodeId) -> bool {
        let sm = self.vocabulary().reserved().sm;
        self.eval(sm, &[node]) == Kleene::Unknown
    }

    /// Remove every node on which unary `pred` is true
    fn filter_nodes(&mut self, pred: PredicateId) {
        let doomed: Vec<NodeId> = self
            .nodes()
            .into_iter()
            .filter(|n| self.eval(pred, &[*n]) == Kleene::True)
            .collect();
        for node in doomed {
            self.remove_node(node);
        }
    }

    /// Set unary `pred` to `value` on every node
    fn set_all(&mut self, pred: PredicateId, value: Kleene) {
        for node in self.nodes() {
            self.update(pred, &[node], value);
        }
    }
}
