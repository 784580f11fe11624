use crate::features::semantics::domain::ActionInstance;
use std::fmt;
use std::sync::Arc;

/// CFG edge label
#[derive(Debug, Clone)]
pub enum CfgEdge {
    /// Intraprocedural statement
    Intra(Arc<ActionInstance>),
    /// Call site to its return site; the call itself goes through the callee
    CallToReturn { invocation: String },
}

impl CfgEdge {
    pub fn is_call_to_return(&self) -> bool {
        matches!(self, CfgEdge::CallToReturn { .. })
    }

    pub fn action(&self) -> Option<&Arc<ActionInstance>> {
        match self {
            CfgEdge::Intra(action) => Some(action),
            CfgEdge::CallToReturn { .. } => None,
        }
    }
}

impl fmt::Display for CfgEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CfgEdge::Intra(action) => write!(f, "{}", action.title()),
            CfgEdge::CallToReturn { invocation } => f.write_str(invocation),
        }
    }
}

/// `callee(a1, a2)`
pub fn invocation_string(callee: &str, args: &[String]) -> String {
    format!("{}({})", callee, args.join(", "))
}
