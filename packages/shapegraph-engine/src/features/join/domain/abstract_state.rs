//! Join-closed set of structures at one program point

use super::fact::{StateId, StructureIndex};

/// Slots owned by one program point, in insertion order.
///
/// No two slots hold structures that the join would merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbstractState {
    id: StateId,
    slots: Vec<StructureIndex>,
}

impl AbstractState {
    pub fn new(id: StateId) -> Self {
        Self {
            id,
            slots: Vec::new(),
        }
    }

    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn slots(&self) -> &[StructureIndex] {
        &self.slots
    }

    pub fn owns(&self, slot: StructureIndex) -> bool {
        self.slots.contains(&slot)
    }

    pub(crate) fn push(&mut self, slot: StructureIndex) {
        debug_assert!(!slot.is_bottom());
        self.slots.push(slot);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
