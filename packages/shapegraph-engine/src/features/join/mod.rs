//! Join repository
//!
//! Structures at a program point are kept join-closed and addressed by
//! `Fact` handles: (repository, state, slot).

pub mod domain;
pub mod infrastructure;

pub use domain::{AbstractState, Fact, RepositoryId, StateId, StructureIndex};
pub use infrastructure::{StateStore, StructureRepository};
