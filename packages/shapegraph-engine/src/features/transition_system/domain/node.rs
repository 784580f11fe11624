//! CFG node kinds and transition-system nodes

use crate::errors::{EngineError, Result};
use crate::features::join::StateId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a method within a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodId(pub u32);

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// Registration bin of a method. A method lives in exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    Static,
    Virtual,
    Constructor,
}

impl MethodKind {
    /// Node kind of a call site invoking a method of this kind
    pub fn call_site_kind(&self) -> NodeKind {
        match self {
            MethodKind::Static => NodeKind::StaticCallSite,
            MethodKind::Virtual => NodeKind::VirtualCallSite,
            MethodKind::Constructor => NodeKind::ConstructorCallSite,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MethodKind::Static => "static",
            MethodKind::Virtual => "virtual",
            MethodKind::Constructor => "constructor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Entry,
    Exit,
    Intra,
    StaticCallSite,
    VirtualCallSite,
    ConstructorCallSite,
    ReturnSite,
}

impl NodeKind {
    pub fn short_name(&self) -> &'static str {
        match self {
            NodeKind::Entry => "Entry",
            NodeKind::Exit => "Exit",
            NodeKind::Intra => "Intra",
            NodeKind::StaticCallSite => "sCall",
            NodeKind::VirtualCallSite => "vCall",
            NodeKind::ConstructorCallSite => "cCall",
            NodeKind::ReturnSite => "Return",
        }
    }

    pub fn is_call_site(&self) -> bool {
        matches!(
            self,
            NodeKind::StaticCallSite | NodeKind::VirtualCallSite | NodeKind::ConstructorCallSite
        )
    }

    /// Whether a node of this kind may also serve as an intra statement
    /// endpoint
    pub fn accepts_intra(&self) -> bool {
        matches!(
            self,
            NodeKind::Intra | NodeKind::Entry | NodeKind::Exit | NodeKind::ReturnSite
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// A CFG node with its abstract state
#[derive(Debug, Clone)]
pub struct TsNode {
    label: String,
    kind: NodeKind,
    state: StateId,
    print: bool,
}

impl TsNode {
    pub fn new(label: impl Into<String>, kind: NodeKind, state: StateId) -> Self {
        Self {
            label: label.into(),
            kind,
            state,
            print: false,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn state(&self) -> StateId {
        self.state
    }

    pub fn should_print(&self) -> bool {
        self.print
    }

    pub fn set_print(&mut self, print: bool) {
        self.print = print;
    }

    pub fn is_call_site(&self) -> bool {
        self.kind.is_call_site()
    }

    /// Promote an intra node to a call site. A promoted node is no longer
    /// intra, so a second promotion is a misuse.
    pub fn specialize(&mut self, kind: NodeKind) -> Result<()> {
        if self.kind != NodeKind::Intra || !kind.is_call_site() {
            return Err(EngineError::misuse(format!(
                "node {} cannot be specialized from {} to {}",
                self.label, self.kind, kind
            )));
        }
        self.kind = kind;
        Ok(())
    }

    /// `Kind: label`, optionally prefixed
    pub fn render_label(&self, prefix: &str) -> String {
        format!("{}{}: {}", prefix, self.kind.short_name(), self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specialize_once() {
        let mut node = TsNode::new("L3", NodeKind::Intra, StateId(0));
        node.specialize(NodeKind::VirtualCallSite).unwrap();
        assert!(node.is_call_site());
        assert_eq!(node.render_label(""), "vCall: L3");
        assert!(node.specialize(NodeKind::StaticCallSite).is_err());
        let again = node.specialize(NodeKind::VirtualCallSite).unwrap_err();
        assert!(matches!(again, EngineError::StructuralMisuse(_)));
        assert_eq!(node.kind(), NodeKind::VirtualCallSite);
    }

    #[test]
    fn test_specialize_only_to_call_site() {
        let mut node = TsNode::new("L1", NodeKind::Intra, StateId(0));
        assert!(node.specialize(NodeKind::ReturnSite).is_err());
        let mut exit = TsNode::new("exit", NodeKind::Exit, StateId(1));
        assert!(exit.specialize(NodeKind::StaticCallSite).is_err());
    }

    #[test]
    fn test_short_names() {
        let names: Vec<_> = [
            NodeKind::Entry,
            NodeKind::Exit,
            NodeKind::Intra,
            NodeKind::StaticCallSite,
            NodeKind::VirtualCallSite,
            NodeKind::ConstructorCallSite,
            NodeKind::ReturnSite,
        ]
        .iter()
        .map(NodeKind::short_name)
        .collect();
        assert_eq!(
            names,
            vec!["Entry", "Exit", "Intra", "sCall", "vCall", "cCall", "Return"]
        );
        assert_eq!(MethodKind::Virtual.call_site_kind(), NodeKind::VirtualCallSite);
    }
}
