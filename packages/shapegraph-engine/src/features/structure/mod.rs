//! Three-valued structures
//!
//! - `domain`: formulas, assignments, integrity constraints
//! - `ports`: the `AbstractStructure` trait the engine is written against
//! - `infrastructure`: formula evaluation and a reference sparse structure

pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use domain::{Assignment, Constraint, Formula, Var};
pub use infrastructure::{eval_closed, evaluate, ThreeValuedStructure};
pub use ports::{AbstractStructure, MergeOutcome, NodeId, NullaryCombiner, OrCombiner};
