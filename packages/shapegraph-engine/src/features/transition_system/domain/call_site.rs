//! Resolved call sites

use super::node::{MethodId, MethodKind};
use crate::features::semantics::domain::ActionInstance;
use petgraph::graph::NodeIndex;
use std::sync::Arc;

/// A call from `caller` at `site` into `callee`, with the actions that bind
/// arguments on the way in and results on the way out
#[derive(Debug, Clone)]
pub struct CallSite {
    pub kind: MethodKind,
    pub caller: MethodId,
    pub site: NodeIndex,
    pub callee: MethodId,
    pub call_action: Arc<ActionInstance>,
    pub ret_action: Arc<ActionInstance>,
}

/// One candidate target of a virtual call; the guard narrows the receiver
/// to the candidate's dynamic type
#[derive(Debug, Clone)]
pub struct CallSiteVirtual {
    pub call_site: CallSite,
    pub guard_action: Arc<ActionInstance>,
}

impl CallSiteVirtual {
    pub fn callee(&self) -> MethodId {
        self.call_site.callee
    }
}
