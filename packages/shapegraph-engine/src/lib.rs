/*
 * Shapegraph Engine - parametric shape analysis core
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : Kleene logic
 * - config/      : applier policies, presets, YAML overrides
 * - features/    : vocabulary → structure → semantics → join → transition_system
 *
 * The worklist scheduler stays outside: the engine reports new facts and
 * transitions through `EventConsumer` and the caller decides what to
 * propagate next.
 */

#![allow(clippy::too_many_arguments)] // builder calls mirror the call-site tuple
#![allow(clippy::new_without_default)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod errors;
pub mod features;
pub mod shared;

pub use config::{AnalysisConfig, ApplierPolicy, ApplierRole, JoinMode, Preset};
pub use errors::{EngineError, Result};
pub use features::join::{Fact, StateStore};
pub use features::semantics::{
    AbstractInterpreter, Action, ActionInstance, ActionLibrary, AnalysisListener,
    AnalysisStatistics, Applier, ProgramPoint, StructureMessages,
};
pub use features::structure::{AbstractStructure, Formula, ThreeValuedStructure, Var};
pub use features::transition_system::{
    Event, EventConsumer, MethodId, MethodKind, MethodTs, NodeKind, ProgramTs, SummaryDelta,
};
pub use features::vocabulary::{Vocabulary, VocabularyBuilder};
pub use shared::models::Kleene;
