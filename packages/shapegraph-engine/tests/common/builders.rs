//! Test data builders

use shapegraph_engine::features::structure::{AbstractStructure, Constraint, NodeId};
use shapegraph_engine::features::structure::ThreeValuedStructure;
use shapegraph_engine::features::vocabulary::{PredicateId, Vocabulary};
use shapegraph_engine::shared::models::Kleene;
use std::sync::Arc;

/// Builder for ThreeValuedStructure. Nodes are addressed by creation order.
#[derive(Debug)]
pub struct StructureBuilder {
    structure: ThreeValuedStructure,
    nodes: Vec<NodeId>,
}

impl StructureBuilder {
    pub fn new(vocab: &Arc<Vocabulary>) -> Self {
        Self {
            structure: ThreeValuedStructure::new(Arc::clone(vocab)),
            nodes: Vec::new(),
        }
    }

    pub fn with_constraints(mut self, constraints: Vec<Constraint>) -> Self {
        self.structure = self.structure.with_constraints(Arc::new(constraints));
        self
    }

    /// Add `count` fresh nodes
    pub fn nodes(mut self, count: usize) -> Self {
        for _ in 0..count {
            let node = self.structure.new_node();
            self.nodes.push(node);
        }
        self
    }

    /// Set a unary predicate on the i-th node
    pub fn unary(mut self, pred: PredicateId, i: usize, value: Kleene) -> Self {
        let node = self.nodes[i];
        self.structure.update(pred, &[node], value);
        self
    }

    pub fn binary(mut self, pred: PredicateId, i: usize, j: usize, value: Kleene) -> Self {
        let (u, v) = (self.nodes[i], self.nodes[j]);
        self.structure.update(pred, &[u, v], value);
        self
    }

    pub fn nullary(mut self, pred: PredicateId, value: Kleene) -> Self {
        self.structure.update(pred, &[], value);
        self
    }

    pub fn build(self) -> ThreeValuedStructure {
        self.structure
    }
}
