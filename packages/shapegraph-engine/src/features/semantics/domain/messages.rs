//! Diagnostics produced by message formulas
//!
//! Messages are attached to the focused structure on which they fired.
//! Lists only grow: adding messages for a structure that already has some
//! extends its list.

use crate::features::structure::ports::AbstractStructure;
use serde::{Deserialize, Serialize};

/// Focused structure -> message texts
#[derive(Debug, Clone)]
pub struct StructureMessages<S> {
    entries: Vec<(S, Vec<String>)>,
}

impl<S> Default for StructureMessages<S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<S: AbstractStructure> StructureMessages<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `messages` against `focused`, extending the list of an
    /// isomorphic structure already present
    pub fn add(&mut self, focused: S, messages: Vec<String>) {
        if messages.is_empty() {
            return;
        }
        if let Some((_, list)) = self
            .entries
            .iter_mut()
            .find(|(s, _)| s.is_isomorphic(&focused))
        {
            for m in messages {
                if !list.contains(&m) {
                    list.push(m);
                }
            }
            return;
        }
        self.entries.push((focused, messages));
    }

    pub fn extend(&mut self, other: StructureMessages<S>) {
        for (s, msgs) in other.entries {
            self.add(s, msgs);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&S, &[String])> {
        self.entries.iter().map(|(s, m)| (s, m.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of focused structures with messages
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn message_count(&self) -> usize {
        self.entries.iter().map(|(_, m)| m.len()).sum()
    }

    pub fn into_entries(self) -> Vec<(S, Vec<String>)> {
        self.entries
    }
}

/// One listener notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Title of the action that fired the messages
    pub transformer: String,
    /// Ids of the input structures (one, or two for a combine)
    pub inputs: Vec<String>,
    pub location: String,
    /// Rendered focused structure
    pub focused: String,
    pub messages: Vec<String>,
}
