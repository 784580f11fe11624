mod repository;
mod state_store;

pub use repository::StructureRepository;
pub use state_store::StateStore;
