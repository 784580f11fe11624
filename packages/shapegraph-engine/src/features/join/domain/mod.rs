pub mod abstract_state;
pub mod fact;

pub use abstract_state::AbstractState;
pub use fact::{Fact, RepositoryId, StateId, StructureIndex};
