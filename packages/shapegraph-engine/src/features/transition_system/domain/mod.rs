pub mod call_site;
pub mod calling_context;
pub mod edge;
pub mod node;
pub mod summary;

pub use call_site::{CallSite, CallSiteVirtual};
pub use calling_context::{BasicCtx, CallingContext, TableOfCallingContexts};
pub use edge::{invocation_string, CfgEdge};
pub use node::{MethodId, MethodKind, NodeKind, TsNode};
pub use summary::SummaryDelta;
