//! Predicate vocabulary
//!
//! Two phases: a `VocabularyBuilder` collects declarations while the
//! analysis is set up, `freeze()` consumes it and hands out a shared
//! read-only `Vocabulary` for the rest of the run.

use super::predicate::{Predicate, PredicateId};
use crate::errors::{EngineError, Result};
use rustc_hash::FxHashMap;
use std::sync::Arc;

pub const SM: &str = "sm";
pub const KILL: &str = "kill";
pub const IN_UC: &str = "inUc";
pub const IN_UX: &str = "inUx";
pub const ACTIVE: &str = "active";
pub const IS_NEW: &str = "isNew";

/// Ids of the engine-reserved unary predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservedPredicates {
    /// Summary marker: a node is a summary node iff `sm` is unknown on it
    pub sm: PredicateId,
    /// Nodes to discard after update
    pub kill: PredicateId,
    /// Nodes contributed by the caller side of a combine
    pub in_uc: PredicateId,
    /// Nodes contributed by the callee exit side of a combine
    pub in_ux: PredicateId,
    pub active: PredicateId,
    /// Node allocated by the current action
    pub is_new: PredicateId,
}

#[derive(Debug)]
pub struct VocabularyBuilder {
    predicates: Vec<Predicate>,
    by_name: FxHashMap<String, PredicateId>,
    reserved: ReservedPredicates,
}

impl VocabularyBuilder {
    pub fn new() -> Self {
        let mut builder = Self {
            predicates: Vec::new(),
            by_name: FxHashMap::default(),
            reserved: ReservedPredicates {
                sm: PredicateId(0),
                kill: PredicateId(0),
                in_uc: PredicateId(0),
                in_ux: PredicateId(0),
                active: PredicateId(0),
                is_new: PredicateId(0),
            },
        };
        builder.reserved = ReservedPredicates {
            sm: builder.push(SM, 1, false, true),
            kill: builder.push(KILL, 1, false, true),
            in_uc: builder.push(IN_UC, 1, false, true),
            in_ux: builder.push(IN_UX, 1, false, true),
            active: builder.push(ACTIVE, 1, false, true),
            is_new: builder.push(IS_NEW, 1, false, true),
        };
        builder
    }

    fn push(&mut self, name: &str, arity: usize, abstraction: bool, reserved: bool) -> PredicateId {
        let id = PredicateId(self.predicates.len() as u32);
        self.predicates.push(Predicate {
            id,
            name: name.to_string(),
            arity,
            abstraction,
            reserved,
        });
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Declare a predicate. Unary predicates take part in blur unless
    /// declared with `abstraction = false`.
    ///
    /// Re-declaring a name with the same arity returns the existing id.
    pub fn declare(&mut self, name: &str, arity: usize, abstraction: bool) -> Result<PredicateId> {
        if let Some(&id) = self.by_name.get(name) {
            let existing = &self.predicates[id.index()];
            if existing.reserved {
                return Err(EngineError::registration(format!(
                    "predicate {} is reserved by the engine",
                    name
                )));
            }
            if existing.arity != arity {
                return Err(EngineError::registration(format!(
                    "predicate {} redeclared with arity {} (was {})",
                    name, arity, existing.arity
                )));
            }
            return Ok(id);
        }
        Ok(self.push(name, arity, abstraction && arity == 1, false))
    }

    pub fn nullary(&mut self, name: &str) -> Result<PredicateId> {
        self.declare(name, 0, false)
    }

    pub fn unary(&mut self, name: &str) -> Result<PredicateId> {
        self.declare(name, 1, true)
    }

    pub fn binary(&mut self, name: &str) -> Result<PredicateId> {
        self.declare(name, 2, false)
    }

    pub fn freeze(self) -> Arc<Vocabulary> {
        Arc::new(Vocabulary {
            predicates: self.predicates,
            by_name: self.by_name,
            reserved: self.reserved,
        })
    }
}

impl Default for VocabularyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Frozen predicate vocabulary
#[derive(Debug)]
pub struct Vocabulary {
    predicates: Vec<Predicate>,
    by_name: FxHashMap<String, PredicateId>,
    reserved: ReservedPredicates,
}

impl Vocabulary {
    pub fn lookup(&self, name: &str) -> Option<PredicateId> {
        self.by_name.get(name).copied()
    }

    /// Like `lookup`, failing with `UndefinedPredicate`
    pub fn require(&self, name: &str) -> Result<PredicateId> {
        self.lookup(name)
            .ok_or_else(|| EngineError::undefined_predicate(name))
    }

    pub fn predicate(&self, id: PredicateId) -> &Predicate {
        &self.predicates[id.index()]
    }

    pub fn name(&self, id: PredicateId) -> &str {
        &self.predicates[id.index()].name
    }

    pub fn arity(&self, id: PredicateId) -> usize {
        self.predicates[id.index()].arity
    }

    pub fn reserved(&self) -> &ReservedPredicates {
        &self.reserved
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Predicate> {
        self.predicates.iter()
    }

    pub fn with_arity(&self, arity: usize) -> impl Iterator<Item = &Predicate> {
        self.predicates.iter().filter(move |p| p.arity == arity)
    }

    /// Unary predicates that name nodes during canonical abstraction
    pub fn unary_abstraction(&self) -> impl Iterator<Item = PredicateId> + '_ {
        self.predicates
            .iter()
            .filter(|p| p.abstraction && p.arity == 1)
            .map(|p| p.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_predicates_preregistered() {
        let vocab = VocabularyBuilder::new().freeze();
        for name in [SM, KILL, IN_UC, IN_UX, ACTIVE, IS_NEW] {
            let id = vocab.lookup(name).unwrap();
            assert!(vocab.predicate(id).reserved);
            assert_eq!(vocab.arity(id), 1);
            assert!(!vocab.predicate(id).abstraction);
        }
        assert_eq!(vocab.reserved().kill, vocab.lookup(KILL).unwrap());
    }

    #[test]
    fn test_declare_is_idempotent_per_arity() {
        let mut builder = VocabularyBuilder::new();
        let x = builder.unary("x").unwrap();
        assert_eq!(builder.unary("x").unwrap(), x);
        assert!(builder.binary("x").is_err());
        assert!(builder.unary(KILL).is_err());
    }

    #[test]
    fn test_only_unary_predicates_are_abstraction() {
        let mut builder = VocabularyBuilder::new();
        let x = builder.unary("x").unwrap();
        let n = builder.declare("n", 2, true).unwrap();
        let vocab = builder.freeze();
        let abs: Vec<_> = vocab.unary_abstraction().collect();
        assert_eq!(abs, vec![x]);
        assert!(!vocab.predicate(n).abstraction);
    }

    #[test]
    fn test_require_unknown_predicate() {
        let vocab = VocabularyBuilder::new().freeze();
        let err = vocab.require("next").unwrap_err();
        assert!(matches!(err, EngineError::UndefinedPredicate(ref n) if n == "next"));
    }
}
