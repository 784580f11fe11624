pub mod predicate;
pub mod vocabulary;

pub use predicate::{Predicate, PredicateId};
pub use vocabulary::{ReservedPredicates, Vocabulary, VocabularyBuilder};
