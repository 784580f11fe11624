use crate::features::join::Fact;

/// Change of a method summary since the previous update.
///
/// `added` holds (entry, exit) pairs never reported before. `refreshed`
/// holds pairs reported earlier whose exit structure grew since (partial
/// join), so their callers must see it again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryDelta {
    pub added: Vec<(Fact, Fact)>,
    pub refreshed: Vec<(Fact, Fact)>,
}

impl SummaryDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.refreshed.is_empty()
    }

    /// Every pair callers must revisit
    pub fn pairs(&self) -> impl Iterator<Item = &(Fact, Fact)> {
        self.added.iter().chain(self.refreshed.iter())
    }
}
