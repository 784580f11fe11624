//! Abstract states backed by one structure repository
//!
//! `add_structure` joins a candidate into a state: if an existing slot
//! subsumes it or absorbs it (partial join), that slot's fact is returned;
//! otherwise a new slot is minted.

use crate::config::JoinMode;
use crate::errors::{EngineError, Result};
use crate::features::join::domain::{AbstractState, Fact, RepositoryId, StateId, StructureIndex};
use crate::features::semantics::domain::{PhaseTimer, StructureMessages};
use crate::features::structure::ports::{AbstractStructure, MergeOutcome};
use rustc_hash::FxHashMap;
use std::time::Instant;
use tracing::trace;

use super::repository::StructureRepository;

#[derive(Debug, Clone)]
pub struct StateStore<S> {
    repository: StructureRepository<S>,
    states: Vec<AbstractState>,
    messages: FxHashMap<Fact, StructureMessages<S>>,
    join_mode: JoinMode,
    join_timer: PhaseTimer,
}

impl<S: AbstractStructure> StateStore<S> {
    pub fn new(id: RepositoryId, join_mode: JoinMode) -> Self {
        Self {
            repository: StructureRepository::new(id),
            states: Vec::new(),
            messages: FxHashMap::default(),
            join_mode,
            join_timer: PhaseTimer::default(),
        }
    }

    pub fn id(&self) -> RepositoryId {
        self.repository.id()
    }

    pub fn join_mode(&self) -> JoinMode {
        self.join_mode
    }

    pub fn allocate_state(&mut self) -> StateId {
        let id = StateId(self.states.len() as u32);
        self.states.push(AbstractState::new(id));
        id
    }

    pub fn state(&self, id: StateId) -> Option<&AbstractState> {
        self.states.get(id.0 as usize)
    }

    fn fact(&self, state: StateId, slot: StructureIndex) -> Fact {
        Fact {
            repository: self.repository.id(),
            state,
            structure: slot,
        }
    }

    /// Join `structure` into `state`. Returns whether the state changed and
    /// the fact now covering the structure.
    pub fn add_structure(&mut self, state: StateId, structure: S) -> Result<(bool, Fact)> {
        let started = Instant::now();
        let slots = self
            .states
            .get(state.0 as usize)
            .ok_or_else(|| EngineError::misuse(format!("unknown abstract state {}", state.0)))?
            .slots()
            .to_vec();

        let mut outcome = None;
        for slot in slots {
            let Some(existing) = self.repository.get_mut(slot) else {
                continue;
            };
            match existing.merge_with(&structure, self.join_mode) {
                MergeOutcome::Unrelated => {}
                MergeOutcome::Subsumed => {
                    outcome = Some((false, slot));
                    break;
                }
                MergeOutcome::Merged => {
                    outcome = Some((true, slot));
                    break;
                }
            }
        }

        let (changed, slot) = match outcome {
            Some(found) => found,
            None => {
                let slot = self.repository.add(structure);
                if let Some(s) = self.states.get_mut(state.0 as usize) {
                    s.push(slot);
                }
                (true, slot)
            }
        };
        self.join_timer.total += started.elapsed();
        self.join_timer.invocations += 1;
        let fact = self.fact(state, slot);
        trace!(%fact, changed, "joined structure");
        Ok((changed, fact))
    }

    pub fn structure(&self, fact: Fact) -> Option<&S> {
        if fact.repository != self.repository.id() {
            return None;
        }
        self.repository.get(fact.structure)
    }

    /// Whether `fact` names a live slot of its own state in this store.
    /// Pure lookup: slots are only ever appended to a state, so ownership
    /// is membership.
    pub fn contains_fact(&self, fact: Fact) -> bool {
        self.state(fact.state)
            .is_some_and(|state| state.owns(fact.structure))
            && self.structure(fact).is_some()
    }

    /// Fact of the slot in `state` that already covers `structure`
    pub fn fact_for_existing(&self, state: StateId, structure: &S) -> Option<Fact> {
        let owned = self.state(state)?;
        owned.slots().iter().copied().find_map(|slot| {
            let existing = self.repository.get(slot)?;
            let mut probe = existing.clone();
            (probe.merge_with(structure, self.join_mode) == MergeOutcome::Subsumed)
                .then(|| self.fact(state, slot))
        })
    }

    pub fn structures(&self, state: StateId) -> Vec<(Fact, &S)> {
        let Some(owned) = self.state(state) else {
            return Vec::new();
        };
        owned
            .slots()
            .iter()
            .filter_map(|&slot| {
                self.repository
                    .get(slot)
                    .map(|s| (self.fact(state, slot), s))
            })
            .collect()
    }

    pub fn messages(&self, fact: Fact) -> Option<&StructureMessages<S>> {
        self.messages.get(&fact)
    }

    /// Extend the messages recorded for `fact`
    pub fn add_messages(&mut self, fact: Fact, messages: StructureMessages<S>) {
        if messages.is_empty() {
            return;
        }
        self.messages.entry(fact).or_default().extend(messages);
    }

    pub fn has_messages(&self) -> bool {
        !self.messages.is_empty()
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn structure_count(&self) -> usize {
        self.repository.len()
    }

    pub fn join_timer(&self) -> PhaseTimer {
        self.join_timer
    }
}
