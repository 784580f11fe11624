//! Calling contexts
//!
//! For every (callee, entry fact) the table records which call sites, with
//! which call-site facts, produced that entry fact. When the callee's
//! summary for the entry fact changes, every recorded caller is revisited.

use super::node::MethodId;
use crate::features::join::Fact;
use petgraph::graph::NodeIndex;
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

/// One contributing call: (caller, call site, fact at the call site)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BasicCtx {
    pub caller: MethodId,
    pub site: NodeIndex,
    pub call_fact: Fact,
}

/// Contributing calls of one entry fact, with the call-site facts refined
/// by the guard/call action, in registration order
#[derive(Debug, Clone, Default)]
pub struct CallingContext {
    contexts: Vec<(BasicCtx, Vec<Fact>)>,
}

impl CallingContext {
    /// Record `refined` for `ctx`. Returns whether anything new was learnt.
    pub fn update(&mut self, ctx: BasicCtx, refined: &[Fact]) -> bool {
        match self.contexts.iter_mut().find(|(c, _)| *c == ctx) {
            None => {
                self.contexts.push((ctx, refined.to_vec()));
                true
            }
            Some((_, stored)) => {
                let mut grew = false;
                for fact in refined {
                    if !stored.contains(fact) {
                        stored.push(*fact);
                        grew = true;
                    }
                }
                grew
            }
        }
    }

    pub fn basic_contexts(&self) -> impl Iterator<Item = &BasicCtx> {
        self.contexts.iter().map(|(c, _)| c)
    }

    pub fn refined_facts(&self, ctx: &BasicCtx) -> Option<&[Fact]> {
        self.contexts
            .iter()
            .find(|(c, _)| c == ctx)
            .map(|(_, facts)| facts.as_slice())
    }

    pub fn call_sites(&self) -> BTreeSet<(MethodId, NodeIndex)> {
        self.contexts
            .iter()
            .map(|(c, _)| (c.caller, c.site))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableOfCallingContexts {
    table: FxHashMap<MethodId, BTreeMap<Fact, CallingContext>>,
}

impl TableOfCallingContexts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a possible call target; idempotent
    pub fn add_target(&mut self, callee: MethodId) {
        self.table.entry(callee).or_default();
    }

    pub fn contains_target(&self, callee: MethodId) -> bool {
        self.table.contains_key(&callee)
    }

    /// Record `ctx` for every entry fact. Returns whether any context grew.
    pub fn add(&mut self, callee: MethodId, entry_facts: &[Fact], ctx: BasicCtx, refined: &[Fact]) -> bool {
        let contexts = self.table.entry(callee).or_default();
        let mut grew = false;
        for fact in entry_facts {
            grew |= contexts.entry(*fact).or_default().update(ctx, refined);
        }
        grew
    }

    pub fn get(&self, callee: MethodId, entry_fact: Fact) -> Option<&CallingContext> {
        self.table.get(&callee)?.get(&entry_fact)
    }

    pub fn contexts_of(&self, callee: MethodId) -> impl Iterator<Item = (&Fact, &CallingContext)> {
        self.table.get(&callee).into_iter().flat_map(|m| m.iter())
    }

    /// Methods with at least one recorded call into `callee`
    pub fn callers(&self, callee: MethodId) -> BTreeSet<MethodId> {
        self.contexts_of(callee)
            .flat_map(|(_, ctx)| ctx.basic_contexts().map(|c| c.caller))
            .collect()
    }

    /// Per target: entry facts / calling contexts
    pub fn report(&self, name: impl Fn(MethodId) -> String) -> String {
        let mut targets: Vec<_> = self.table.iter().collect();
        targets.sort_by_key(|(id, _)| **id);
        let mut out = String::new();
        for (callee, contexts) in targets {
            let total: usize = contexts.values().map(CallingContext::len).sum();
            let _ = writeln!(
                out,
                "Method {} has entry structures / calling contexts {} / {}",
                name(*callee),
                contexts.len(),
                total
            );
        }
        out
    }
}
