//! Predicate declarations

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense predicate identifier, assigned in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PredicateId(pub u32);

impl PredicateId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PredicateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    pub id: PredicateId,
    pub name: String,
    pub arity: usize,
    /// Unary predicates used to name nodes during blur
    pub abstraction: bool,
    /// Pre-registered by the engine
    pub reserved: bool,
}

impl Predicate {
    pub fn is_nullary(&self) -> bool {
        self.arity == 0
    }

    pub fn is_unary(&self) -> bool {
        self.arity == 1
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.arity)
    }
}
