//! Statement semantics
//!
//! - `domain`: actions, macro instances, messages, statistics
//! - `ports`: diagnostic listeners
//! - `application`: the applier pipeline and the interpreter that owns one
//!   applier per role

pub mod application;
pub mod domain;
pub mod ports;

pub use application::{AbstractInterpreter, Applier, ProgramPoint};
pub use domain::{
    Action, ActionCache, ActionDefinition, ActionInstance, ActionLibrary, AnalysisStatistics,
    MessageKind, MessageRecord, Phase, PredSym, StructureMessages,
};
pub use ports::{AnalysisListener, CollectingListener};
