//! Stable handles for joined structures

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one structure repository (one per method)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepositoryId(pub u32);

/// Identifies one abstract state within a repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateId(pub u32);

/// Slot of a structure in its repository. Slot 0 is bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StructureIndex(pub u32);

impl StructureIndex {
    pub const BOTTOM: StructureIndex = StructureIndex(0);

    pub fn is_bottom(&self) -> bool {
        self.0 == 0
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Handle for one post-join structure owned by exactly one abstract state.
///
/// Two facts are equal iff they name the same slot of the same state in the
/// same repository. The structure behind a fact may grow under partial join;
/// the handle does not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fact {
    pub repository: RepositoryId,
    pub state: StateId,
    pub structure: StructureIndex,
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "r{}.s{}.t{}",
            self.repository.0, self.state.0, self.structure.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fact_identity() {
        let a = Fact {
            repository: RepositoryId(1),
            state: StateId(2),
            structure: StructureIndex(3),
        };
        let b = Fact {
            state: StateId(4),
            ..a
        };
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "r1.s2.t3");
        assert!(StructureIndex::BOTTOM.is_bottom());
    }
}
