//! Predicate vocabulary
//!
//! Program entities are mapped to predicates. The vocabulary is built during
//! analysis setup, then frozen and shared read-only by every structure.

pub mod domain;

pub use domain::vocabulary::{ACTIVE, IN_UC, IN_UX, IS_NEW, KILL, SM};
pub use domain::{Predicate, PredicateId, ReservedPredicates, Vocabulary, VocabularyBuilder};
