//! Interprocedural edges
//!
//! Resolved call sites keyed by (caller, site) plus the table of calling
//! contexts. Static and constructor sites have one callee; a virtual site
//! keeps one entry per candidate.

use crate::errors::{EngineError, Result};
use crate::features::join::Fact;
use crate::features::semantics::domain::ActionInstance;
use crate::features::transition_system::domain::{
    BasicCtx, CallSite, CallSiteVirtual, CallingContext, MethodId, MethodKind,
    TableOfCallingContexts,
};
use petgraph::graph::NodeIndex;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::trace;

type SiteKey = (MethodId, NodeIndex);

#[derive(Debug, Clone, Default)]
pub struct InterProcTs {
    static_sites: FxHashMap<SiteKey, CallSite>,
    constructor_sites: FxHashMap<SiteKey, CallSite>,
    virtual_sites: FxHashMap<SiteKey, Vec<CallSiteVirtual>>,
    contexts: TableOfCallingContexts,
    complete: bool,
}

impl InterProcTs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callee` as a possible call target
    pub fn add_method(&mut self, callee: MethodId) -> Result<()> {
        self.ensure_open()?;
        self.contexts.add_target(callee);
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.complete {
            return Err(EngineError::registration(
                "call graph is frozen once definitions are complete",
            ));
        }
        Ok(())
    }

    fn ensure_target(&self, callee: MethodId) -> Result<()> {
        if !self.contexts.contains_target(callee) {
            return Err(EngineError::registration(format!(
                "{} is not a registered call target",
                callee
            )));
        }
        Ok(())
    }

    fn occupied(&self, key: &SiteKey) -> bool {
        self.static_sites.contains_key(key) || self.constructor_sites.contains_key(key)
    }

    /// Whether a static or constructor call into `callee` may be registered
    /// at `site`. `None` stands for a site the caller has not created yet.
    pub fn check_unique(&self, caller: MethodId, site: Option<NodeIndex>, callee: MethodId) -> Result<()> {
        self.ensure_open()?;
        self.ensure_target(callee)?;
        let Some(site) = site else {
            return Ok(());
        };
        let key = (caller, site);
        if self.occupied(&key) || self.virtual_sites.contains_key(&key) {
            return Err(duplicate(caller, site, callee));
        }
        Ok(())
    }

    /// Like `check_unique`, but a virtual site takes any number of distinct
    /// candidates
    pub fn check_virtual(&self, caller: MethodId, site: Option<NodeIndex>, callee: MethodId) -> Result<()> {
        self.ensure_open()?;
        self.ensure_target(callee)?;
        let Some(site) = site else {
            return Ok(());
        };
        let key = (caller, site);
        let duplicate_candidate = self
            .virtual_sites
            .get(&key)
            .is_some_and(|targets| targets.iter().any(|t| t.callee() == callee));
        if self.occupied(&key) || duplicate_candidate {
            return Err(duplicate(caller, site, callee));
        }
        Ok(())
    }

    pub fn add_static_invocation(
        &mut self,
        caller: MethodId,
        site: NodeIndex,
        callee: MethodId,
        call_action: Arc<ActionInstance>,
        ret_action: Arc<ActionInstance>,
    ) -> Result<()> {
        self.add_unique(MethodKind::Static, caller, site, callee, call_action, ret_action)
    }

    pub fn add_constructor_invocation(
        &mut self,
        caller: MethodId,
        site: NodeIndex,
        callee: MethodId,
        call_action: Arc<ActionInstance>,
        ret_action: Arc<ActionInstance>,
    ) -> Result<()> {
        self.add_unique(MethodKind::Constructor, caller, site, callee, call_action, ret_action)
    }

    fn add_unique(
        &mut self,
        kind: MethodKind,
        caller: MethodId,
        site: NodeIndex,
        callee: MethodId,
        call_action: Arc<ActionInstance>,
        ret_action: Arc<ActionInstance>,
    ) -> Result<()> {
        self.check_unique(caller, Some(site), callee)?;
        let key = (caller, site);
        trace!(%caller, %callee, kind = kind.as_str(), "call site registered");
        let call_site = CallSite {
            kind,
            caller,
            site,
            callee,
            call_action,
            ret_action,
        };
        match kind {
            MethodKind::Constructor => self.constructor_sites.insert(key, call_site),
            _ => self.static_sites.insert(key, call_site),
        };
        Ok(())
    }

    pub fn add_virtual_invocation(
        &mut self,
        caller: MethodId,
        site: NodeIndex,
        callee: MethodId,
        call_action: Arc<ActionInstance>,
        ret_action: Arc<ActionInstance>,
        guard_action: Arc<ActionInstance>,
    ) -> Result<()> {
        self.check_virtual(caller, Some(site), callee)?;
        let key = (caller, site);
        trace!(%caller, %callee, "virtual call candidate registered");
        self.virtual_sites
            .entry(key)
            .or_default()
            .push(CallSiteVirtual {
                call_site: CallSite {
                    kind: MethodKind::Virtual,
                    caller,
                    site,
                    callee,
                    call_action,
                    ret_action,
                },
                guard_action,
            });
        Ok(())
    }

    pub fn complete_definitions(&mut self) {
        self.complete = true;
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn static_target(&self, caller: MethodId, site: NodeIndex) -> Option<MethodId> {
        self.static_sites.get(&(caller, site)).map(|c| c.callee)
    }

    pub fn constructor_target(&self, caller: MethodId, site: NodeIndex) -> Option<MethodId> {
        self.constructor_sites.get(&(caller, site)).map(|c| c.callee)
    }

    /// Candidate callees in registration order
    pub fn virtual_targets(&self, caller: MethodId, site: NodeIndex) -> Vec<MethodId> {
        self.virtual_sites
            .get(&(caller, site))
            .map(|targets| targets.iter().map(CallSiteVirtual::callee).collect())
            .unwrap_or_default()
    }

    /// The resolved call from `caller` at `site` into `callee`, whatever its
    /// kind
    pub fn call_site(&self, caller: MethodId, site: NodeIndex, callee: MethodId) -> Option<&CallSite> {
        let key = (caller, site);
        if let Some(c) = self.static_sites.get(&key).or_else(|| self.constructor_sites.get(&key)) {
            return (c.callee == callee).then_some(c);
        }
        self.virtual_site(caller, site, callee).map(|v| &v.call_site)
    }

    fn virtual_site(&self, caller: MethodId, site: NodeIndex, callee: MethodId) -> Option<&CallSiteVirtual> {
        self.virtual_sites
            .get(&(caller, site))?
            .iter()
            .find(|t| t.callee() == callee)
    }

    fn require_call_site(&self, caller: MethodId, site: NodeIndex, callee: MethodId) -> Result<&CallSite> {
        self.call_site(caller, site, callee).ok_or_else(|| {
            EngineError::misuse(format!(
                "node {} of {} does not call {}",
                site.index(),
                caller,
                callee
            ))
        })
    }

    pub fn call_action(&self, caller: MethodId, site: NodeIndex, callee: MethodId) -> Result<Arc<ActionInstance>> {
        Ok(Arc::clone(&self.require_call_site(caller, site, callee)?.call_action))
    }

    pub fn ret_action(&self, caller: MethodId, site: NodeIndex, callee: MethodId) -> Result<Arc<ActionInstance>> {
        Ok(Arc::clone(&self.require_call_site(caller, site, callee)?.ret_action))
    }

    /// Only virtual calls carry a guard
    pub fn guard_action(&self, caller: MethodId, site: NodeIndex, callee: MethodId) -> Result<Arc<ActionInstance>> {
        self.virtual_site(caller, site, callee)
            .map(|v| Arc::clone(&v.guard_action))
            .ok_or_else(|| {
                EngineError::misuse(format!(
                    "node {} of {} is not a virtual call of {}",
                    site.index(),
                    caller,
                    callee
                ))
            })
    }

    pub fn is_static_call_site_of(&self, caller: MethodId, site: NodeIndex, callee: MethodId) -> bool {
        self.static_target(caller, site) == Some(callee)
    }

    pub fn is_constructor_call_site_of(&self, caller: MethodId, site: NodeIndex, callee: MethodId) -> bool {
        self.constructor_target(caller, site) == Some(callee)
    }

    pub fn is_virtual_call_site_of(&self, caller: MethodId, site: NodeIndex, callee: MethodId) -> bool {
        self.virtual_site(caller, site, callee).is_some()
    }

    pub fn is_call_site_of(&self, caller: MethodId, site: NodeIndex, callee: MethodId) -> bool {
        self.call_site(caller, site, callee).is_some()
    }

    /// Record that `call_fact` at (`caller`, `site`) reached `callee` with
    /// `entry_facts`, refined to `refined` by the call action. Returns
    /// whether any calling context grew.
    pub fn update_calling_ctxs(
        &mut self,
        callee: MethodId,
        entry_facts: &[Fact],
        ctx: BasicCtx,
        refined: &[Fact],
    ) -> Result<bool> {
        if entry_facts.is_empty() || refined.is_empty() {
            return Err(EngineError::misuse(format!(
                "calling context of {} needs entry and refined facts",
                callee
            )));
        }
        if !self.is_call_site_of(ctx.caller, ctx.site, callee) {
            return Err(EngineError::misuse(format!(
                "node {} of {} does not call {}",
                ctx.site.index(),
                ctx.caller,
                callee
            )));
        }
        Ok(self.contexts.add(callee, entry_facts, ctx, refined))
    }

    pub fn calling_context(&self, callee: MethodId, entry_fact: Fact) -> Option<&CallingContext> {
        self.contexts.get(callee, entry_fact)
    }

    pub fn callers(&self, callee: MethodId) -> BTreeSet<MethodId> {
        self.contexts.callers(callee)
    }

    pub fn call_site_count(&self) -> usize {
        self.static_sites.len()
            + self.constructor_sites.len()
            + self.virtual_sites.values().map(Vec::len).sum::<usize>()
    }

    pub fn statistics_report(&self, name: impl Fn(MethodId) -> String) -> String {
        self.contexts.report(name)
    }
}

fn duplicate(caller: MethodId, site: NodeIndex, callee: MethodId) -> EngineError {
    EngineError::registration(format!(
        "duplicate call to {} at node {} of {}",
        callee,
        site.index(),
        caller
    ))
}
