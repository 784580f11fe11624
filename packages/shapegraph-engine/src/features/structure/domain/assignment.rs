//! Variable-to-node assignments produced by formula evaluation

use super::formula::Var;
use crate::features::structure::ports::NodeId;
use std::fmt;

/// Partial map from variables to nodes, kept sorted by variable
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Assignment {
    bindings: Vec<(Var, NodeId)>,
}

impl Assignment {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, var: Var) -> Option<NodeId> {
        self.bindings
            .binary_search_by_key(&var, |(v, _)| *v)
            .ok()
            .map(|i| self.bindings[i].1)
    }

    pub fn binds(&self, var: Var) -> bool {
        self.get(var).is_some()
    }

    /// Bind `var`, replacing any previous binding
    pub fn bind(&mut self, var: Var, node: NodeId) {
        match self.bindings.binary_search_by_key(&var, |(v, _)| *v) {
            Ok(i) => self.bindings[i].1 = node,
            Err(i) => self.bindings.insert(i, (var, node)),
        }
    }

    pub fn with(&self, var: Var, node: NodeId) -> Self {
        let mut next = self.clone();
        next.bind(var, node);
        next
    }

    pub fn unbind(&mut self, var: Var) {
        if let Ok(i) = self.bindings.binary_search_by_key(&var, |(v, _)| *v) {
            self.bindings.remove(i);
        }
    }

    /// Nodes bound to `vars`, in order; `None` if any is unbound
    pub fn tuple(&self, vars: &[Var]) -> Option<Vec<NodeId>> {
        vars.iter().map(|v| self.get(*v)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Var, NodeId)> + '_ {
        self.bindings.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, (v, n)) in self.bindings.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", v, n)?;
        }
        write!(f, "]")
    }
}
