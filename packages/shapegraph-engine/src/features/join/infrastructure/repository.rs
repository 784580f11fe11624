//! Arena of structures addressed by slot

use crate::features::join::domain::{RepositoryId, StructureIndex};

/// Slot 0 is reserved for bottom and never holds a structure
#[derive(Debug, Clone)]
pub struct StructureRepository<S> {
    id: RepositoryId,
    slots: Vec<Option<S>>,
}

impl<S> StructureRepository<S> {
    pub fn new(id: RepositoryId) -> Self {
        Self {
            id,
            slots: vec![None],
        }
    }

    pub fn id(&self) -> RepositoryId {
        self.id
    }

    pub fn add(&mut self, structure: S) -> StructureIndex {
        let index = StructureIndex(self.slots.len() as u32);
        self.slots.push(Some(structure));
        index
    }

    pub fn get(&self, index: StructureIndex) -> Option<&S> {
        self.slots.get(index.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, index: StructureIndex) -> Option<&mut S> {
        self.slots.get_mut(index.index()).and_then(Option::as_mut)
    }

    /// Structures in slot order, bottom excluded
    pub fn iter(&self) -> impl Iterator<Item = (StructureIndex, &S)> {
        self.slots
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(i, s)| s.as_ref().map(|s| (StructureIndex(i as u32), s)))
    }

    pub fn len(&self) -> usize {
        self.slots.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
