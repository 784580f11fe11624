//! Action semantics domain models

pub mod action;
pub mod action_instance;
pub mod messages;
pub mod statistics;

pub use action::{Action, MessageKind, MessageRule, PredicateUpdate};
pub use action_instance::{
    instance_id, ActionCache, ActionDefinition, ActionInstance, ActionLibrary, PredSym,
};
pub use messages::{MessageRecord, StructureMessages};
pub use statistics::{AnalysisStatistics, Phase, PhaseTimer};
