//! Notifications for the external scheduler
//!
//! The transition system never decides propagation order; it reports every
//! newly discovered fact or transition and lets the consumer queue work.

use crate::features::join::Fact;
use crate::features::transition_system::domain::MethodId;
use petgraph::graph::NodeIndex;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// New fact at a non-call-site node
    Intra {
        method: MethodId,
        site: NodeIndex,
        fact: Fact,
    },
    StaticCall {
        caller: MethodId,
        site: NodeIndex,
        fact: Fact,
        callee: MethodId,
    },
    /// One per candidate callee
    VirtualCall {
        caller: MethodId,
        site: NodeIndex,
        fact: Fact,
        callee: MethodId,
    },
    ConstructorCall {
        caller: MethodId,
        site: NodeIndex,
        fact: Fact,
        callee: MethodId,
    },
    /// A summary pair to propagate back to callers
    Ret {
        method: MethodId,
        entry: Fact,
        exit: Fact,
    },
    Transition {
        method: MethodId,
        from_site: NodeIndex,
        from_fact: Fact,
        to_site: NodeIndex,
        to_fact: Fact,
    },
}

impl Event {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Event::Intra { .. } => "intra",
            Event::StaticCall { .. } => "static-call",
            Event::VirtualCall { .. } => "virtual-call",
            Event::ConstructorCall { .. } => "constructor-call",
            Event::Ret { .. } => "ret",
            Event::Transition { .. } => "transition",
        }
    }
}

pub trait EventConsumer {
    fn consume(&mut self, event: Event);
}

/// Records every event; clones share the buffer
#[derive(Debug, Clone, Default)]
pub struct RecordingConsumer {
    events: Rc<RefCell<Vec<Event>>>,
}

impl RecordingConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    /// Remove and return the recorded events
    pub fn drain(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

impl EventConsumer for RecordingConsumer {
    fn consume(&mut self, event: Event) {
        self.events.borrow_mut().push(event);
    }
}
