//! Intra- and interprocedural transition systems
//!
//! - `domain`: node kinds, CFG edges, call sites, calling contexts
//! - `ports`: events for the external scheduler
//! - `infrastructure`: the petgraph CFG and the exploded fact graph
//! - `application`: `MethodTs`, `InterProcTs` and `ProgramTs`

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{InterProcTs, MethodTs, ProgramTs};
pub use domain::{
    BasicCtx, CallSite, CallSiteVirtual, CallingContext, CfgEdge, MethodId, MethodKind, NodeKind,
    SummaryDelta, TableOfCallingContexts, TsNode,
};
pub use ports::{Event, EventConsumer, RecordingConsumer};
