pub mod structure;

pub use structure::{AbstractStructure, MergeOutcome, NodeId, NullaryCombiner, OrCombiner};
