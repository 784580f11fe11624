//! Feature modules
//!
//! Each feature is split into domain / ports / application / infrastructure
//! where it has something to put there.

pub mod join;
pub mod semantics;
pub mod structure;
pub mod transition_system;
pub mod vocabulary;
