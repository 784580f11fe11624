//! Whole-program transition system
//!
//! Two phases. While building, methods are registered in exactly one of the
//! static, virtual or constructor bins and their CFGs and call sites are
//! added. `complete_definitions` freezes the topology; from then on only
//! facts, transitions and calling contexts grow, and every new fact or
//! transition is forwarded to the event consumer.

use super::interproc_ts::InterProcTs;
use super::method_ts::MethodTs;
use crate::config::{AnalysisConfig, JoinMode};
use crate::errors::{EngineError, Result};
use crate::features::join::Fact;
use crate::features::semantics::domain::ActionInstance;
use crate::features::structure::ports::AbstractStructure;
use crate::features::transition_system::domain::{
    BasicCtx, CallingContext, CfgEdge, MethodId, MethodKind, NodeKind, SummaryDelta,
};
use crate::features::transition_system::ports::{Event, EventConsumer};
use petgraph::graph::NodeIndex;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::fmt::{self, Write as _};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default)]
struct BuildCounters {
    intra_stmts: usize,
    static_sites: usize,
    virtual_sites: usize,
    constructor_sites: usize,
}

pub struct ProgramTs<S> {
    methods: Vec<MethodTs<S>>,
    signatures: FxHashMap<String, MethodId>,
    main: Option<MethodId>,
    interproc: InterProcTs,
    consumer: Option<Box<dyn EventConsumer>>,
    join_mode: JoinMode,
    analysis_started: bool,
    print_all_methods: bool,
    counters: BuildCounters,
}

impl<S: AbstractStructure> ProgramTs<S> {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            methods: Vec::new(),
            signatures: FxHashMap::default(),
            main: None,
            interproc: InterProcTs::new(),
            consumer: None,
            join_mode: config.join,
            analysis_started: false,
            print_all_methods: false,
            counters: BuildCounters::default(),
        }
    }

    fn ensure_building(&self, what: &str) -> Result<()> {
        if self.analysis_started {
            return Err(EngineError::registration(format!(
                "{} after definitions were completed",
                what
            )));
        }
        Ok(())
    }

    fn add_method(
        &mut self,
        kind: MethodKind,
        signature: &str,
        entry_label: &str,
        exit_label: &str,
    ) -> Result<MethodId> {
        self.ensure_building("method registration")?;
        if let Some(existing) = self.signatures.get(signature) {
            let bin = self.methods[existing.0 as usize].kind();
            return Err(EngineError::registration(format!(
                "method {} already registered as {}",
                signature,
                bin.as_str()
            )));
        }
        let id = MethodId(self.methods.len() as u32);
        let method = MethodTs::new(id, signature, kind, entry_label, exit_label, self.join_mode)?;
        self.interproc.add_method(id)?;
        self.methods.push(method);
        self.signatures.insert(signature.to_string(), id);
        debug!(%id, signature, kind = kind.as_str(), "method registered");
        Ok(id)
    }

    pub fn add_static_method(&mut self, signature: &str, entry_label: &str, exit_label: &str) -> Result<MethodId> {
        self.add_method(MethodKind::Static, signature, entry_label, exit_label)
    }

    pub fn add_virtual_method(&mut self, signature: &str, entry_label: &str, exit_label: &str) -> Result<MethodId> {
        self.add_method(MethodKind::Virtual, signature, entry_label, exit_label)
    }

    pub fn add_constructor(&mut self, signature: &str, entry_label: &str, exit_label: &str) -> Result<MethodId> {
        self.add_method(MethodKind::Constructor, signature, entry_label, exit_label)
    }

    /// Main must be a registered static method and can be set only once
    pub fn set_main(&mut self, id: MethodId) -> Result<()> {
        if let Some(main) = self.main {
            return Err(EngineError::registration(format!(
                "main already set to {}",
                self.methods[main.0 as usize].signature()
            )));
        }
        let method = self.method(id)?;
        if method.kind() != MethodKind::Static {
            return Err(EngineError::registration(format!(
                "main method {} must be static",
                method.signature()
            )));
        }
        self.main = Some(id);
        Ok(())
    }

    pub fn main(&self) -> Option<MethodId> {
        self.main
    }

    pub fn set_event_consumer(&mut self, consumer: Box<dyn EventConsumer>) {
        self.consumer = Some(consumer);
    }

    pub fn lookup(&self, signature: &str) -> Option<MethodId> {
        self.signatures.get(signature).copied()
    }

    pub fn contains(&self, signature: &str) -> bool {
        self.signatures.contains_key(signature)
    }

    pub fn method(&self, id: MethodId) -> Result<&MethodTs<S>> {
        self.methods
            .get(id.0 as usize)
            .ok_or_else(|| EngineError::registration(format!("undefined method {}", id)))
    }

    fn method_mut(&mut self, id: MethodId) -> Result<&mut MethodTs<S>> {
        self.methods
            .get_mut(id.0 as usize)
            .ok_or_else(|| EngineError::registration(format!("undefined method {}", id)))
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodTs<S>> {
        self.methods.iter()
    }

    /// Methods of one bin
    pub fn bin(&self, kind: MethodKind) -> impl Iterator<Item = &MethodTs<S>> {
        self.methods.iter().filter(move |m| m.kind() == kind)
    }

    pub fn interproc(&self) -> &InterProcTs {
        &self.interproc
    }

    pub fn analysis_started(&self) -> bool {
        self.analysis_started
    }

    pub fn add_intra_stmt(&mut self, method: MethodId, from: &str, to: &str, action: Arc<ActionInstance>) -> Result<()> {
        self.ensure_building("intra statement")?;
        self.method_mut(method)?.add_intra_stmt(from, to, action)?;
        self.counters.intra_stmts += 1;
        Ok(())
    }

    fn check_callee(&self, caller: MethodId, callee: MethodId, kind: MethodKind, from: &str) -> Result<String> {
        let caller_sig = self.method(caller)?.signature().to_string();
        let target = self.method(callee)?;
        if target.kind() != kind {
            return Err(EngineError::misuse(format!(
                "invoking {} method {} as {} at {} in {}",
                target.kind().as_str(),
                target.signature(),
                kind.as_str(),
                from,
                caller_sig
            )));
        }
        Ok(target.signature().to_string())
    }

    /// Resolve a static call at `from`. Every check runs before the caller's
    /// CFG is touched, so a rejected call leaves the program unchanged.
    #[allow(clippy::too_many_arguments)]
    pub fn add_static_invocation(
        &mut self,
        caller: MethodId,
        args: &[String],
        from: &str,
        to: &str,
        callee: MethodId,
        call_action: Arc<ActionInstance>,
        ret_action: Arc<ActionInstance>,
    ) -> Result<()> {
        self.ensure_building("static invocation")?;
        let callee_sig = self.check_callee(caller, callee, MethodKind::Static, from)?;
        let ts = self.method(caller)?;
        ts.check_invocation(NodeKind::StaticCallSite, from, to)?;
        self.interproc.check_unique(caller, ts.node(from), callee)?;
        let ts = self.method_mut(caller)?;
        ts.add_static_invocation(from, to, &callee_sig, args)?;
        let site = call_site_index(ts, from)?;
        self.interproc
            .add_static_invocation(caller, site, callee, call_action, ret_action)?;
        self.counters.static_sites += 1;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_constructor_invocation(
        &mut self,
        caller: MethodId,
        args: &[String],
        from: &str,
        to: &str,
        callee: MethodId,
        call_action: Arc<ActionInstance>,
        ret_action: Arc<ActionInstance>,
    ) -> Result<()> {
        self.ensure_building("constructor invocation")?;
        let callee_sig = self.check_callee(caller, callee, MethodKind::Constructor, from)?;
        let ts = self.method(caller)?;
        ts.check_invocation(NodeKind::ConstructorCallSite, from, to)?;
        self.interproc.check_unique(caller, ts.node(from), callee)?;
        let ts = self.method_mut(caller)?;
        ts.add_constructor_invocation(from, to, &callee_sig, args)?;
        let site = call_site_index(ts, from)?;
        self.interproc
            .add_constructor_invocation(caller, site, callee, call_action, ret_action)?;
        self.counters.constructor_sites += 1;
        Ok(())
    }

    /// Register one candidate target of a virtual call. Call it once per
    /// candidate with the same `from`/`to`.
    #[allow(clippy::too_many_arguments)]
    pub fn add_virtual_invocation(
        &mut self,
        caller: MethodId,
        args: &[String],
        from: &str,
        to: &str,
        callee: MethodId,
        call_action: Arc<ActionInstance>,
        ret_action: Arc<ActionInstance>,
        guard_action: Arc<ActionInstance>,
    ) -> Result<()> {
        self.ensure_building("virtual invocation")?;
        let callee_sig = self.check_callee(caller, callee, MethodKind::Virtual, from)?;
        let ts = self.method(caller)?;
        ts.check_invocation(NodeKind::VirtualCallSite, from, to)?;
        self.interproc.check_virtual(caller, ts.node(from), callee)?;
        let ts = self.method_mut(caller)?;
        ts.add_virtual_invocation(from, to, &callee_sig, args)?;
        let site = call_site_index(ts, from)?;
        self.interproc.add_virtual_invocation(
            caller,
            site,
            callee,
            call_action,
            ret_action,
            guard_action,
        )?;
        self.counters.virtual_sites += 1;
        Ok(())
    }

    /// Freeze the program topology
    pub fn complete_definitions(&mut self) {
        self.analysis_started = true;
        self.interproc.complete_definitions();
        info!(
            methods = self.methods.len(),
            intra = self.counters.intra_stmts,
            static_calls = self.counters.static_sites,
            virtual_calls = self.counters.virtual_sites,
            constructor_calls = self.counters.constructor_sites,
            "program definitions complete"
        );
    }

    /// Seed the entry of main. Returns the facts that were new.
    pub fn init_analysis(&mut self, initial: Vec<S>) -> Result<Vec<Fact>> {
        if !self.analysis_started {
            return Err(EngineError::misuse("init_analysis before complete_definitions"));
        }
        let main = self
            .main
            .ok_or_else(|| EngineError::registration("no main method was set"))?;
        let entry = self.method(main)?.entry();
        let mut seeded = Vec::new();
        for structure in initial {
            let (changed, fact) = self.add_structure(main, entry, structure)?;
            if changed && !seeded.contains(&fact) {
                seeded.push(fact);
            }
        }
        info!(facts = seeded.len(), "analysis initialized");
        Ok(seeded)
    }

    fn emit(&mut self, events: Vec<Event>) {
        if let Some(consumer) = self.consumer.as_mut() {
            for event in events {
                consumer.consume(event);
            }
        }
    }

    /// Join `structure` into the state at `site`. On change, one event is
    /// emitted: per candidate callee at a virtual call site, a single one
    /// elsewhere.
    pub fn add_structure(&mut self, method: MethodId, site: NodeIndex, structure: S) -> Result<(bool, Fact)> {
        let ts = self.method_mut(method)?;
        let kind = ts.ts_node(site)?.kind();
        let (changed, fact) = ts.add_structure(site, structure)?;
        if changed {
            let events: Vec<Event> = match kind {
                NodeKind::StaticCallSite => self
                    .interproc
                    .static_target(method, site)
                    .map(|callee| Event::StaticCall {
                        caller: method,
                        site,
                        fact,
                        callee,
                    })
                    .into_iter()
                    .collect(),
                NodeKind::ConstructorCallSite => self
                    .interproc
                    .constructor_target(method, site)
                    .map(|callee| Event::ConstructorCall {
                        caller: method,
                        site,
                        fact,
                        callee,
                    })
                    .into_iter()
                    .collect(),
                NodeKind::VirtualCallSite => self
                    .interproc
                    .virtual_targets(method, site)
                    .into_iter()
                    .map(|callee| Event::VirtualCall {
                        caller: method,
                        site,
                        fact,
                        callee,
                    })
                    .collect(),
                _ => vec![Event::Intra { method, site, fact }],
            };
            self.emit(events);
        }
        Ok((changed, fact))
    }

    pub fn add_transition(
        &mut self,
        method: MethodId,
        from_site: NodeIndex,
        from_fact: Fact,
        to_site: NodeIndex,
        to_fact: Fact,
    ) -> Result<bool> {
        let added = self
            .method_mut(method)?
            .add_transition(from_site, from_fact, to_site, to_fact)?;
        if added {
            self.emit(vec![Event::Transition {
                method,
                from_site,
                from_fact,
                to_site,
                to_fact,
            }]);
        }
        Ok(added)
    }

    /// New and refreshed summary pairs since the previous call. Each pair is
    /// also emitted as a return event.
    pub fn update_summary(&mut self, method: MethodId) -> Result<Option<SummaryDelta>> {
        let delta = self.method_mut(method)?.update_summary();
        if let Some(delta) = &delta {
            let events = delta
                .pairs()
                .map(|&(entry, exit)| Event::Ret {
                    method,
                    entry,
                    exit,
                })
                .collect();
            self.emit(events);
        }
        Ok(delta)
    }

    pub fn known_effect(&self, method: MethodId, entry_fact: Fact) -> Result<Vec<Fact>> {
        Ok(self.method(method)?.known_effect(entry_fact))
    }

    pub fn fact_for_structure(&self, method: MethodId, site: NodeIndex, structure: &S) -> Result<Option<Fact>> {
        Ok(self.method(method)?.fact_for_structure(site, structure))
    }

    pub fn structure(&self, method: MethodId, fact: Fact) -> Result<Option<&S>> {
        Ok(self.method(method)?.structure(fact))
    }

    pub fn following_edges(&self, method: MethodId, site: NodeIndex) -> Result<Vec<(NodeIndex, &CfgEdge)>> {
        Ok(self.method(method)?.following_edges(site))
    }

    pub fn matching_return_node(&self, method: MethodId, call_site: NodeIndex) -> Result<NodeIndex> {
        self.method(method)?.matching_return_node(call_site)
    }

    fn require_kind(&self, method: MethodId, site: NodeIndex, kind: NodeKind) -> Result<()> {
        let node = self.method(method)?.ts_node(site)?;
        if node.kind() != kind {
            return Err(EngineError::misuse(format!(
                "{} is not a {} node",
                node.render_label(""),
                kind
            )));
        }
        Ok(())
    }

    fn require_call_site(&self, method: MethodId, site: NodeIndex) -> Result<()> {
        let node = self.method(method)?.ts_node(site)?;
        if !node.is_call_site() {
            return Err(EngineError::misuse(format!(
                "{} is not a call site",
                node.render_label("")
            )));
        }
        Ok(())
    }

    pub fn static_callee(&self, method: MethodId, site: NodeIndex) -> Result<MethodId> {
        self.require_kind(method, site, NodeKind::StaticCallSite)?;
        self.interproc
            .static_target(method, site)
            .ok_or_else(|| EngineError::misuse(format!("no static call at node {}", site.index())))
    }

    pub fn constructor_callee(&self, method: MethodId, site: NodeIndex) -> Result<MethodId> {
        self.require_kind(method, site, NodeKind::ConstructorCallSite)?;
        self.interproc.constructor_target(method, site).ok_or_else(|| {
            EngineError::misuse(format!("no constructor call at node {}", site.index()))
        })
    }

    pub fn virtual_callees(&self, method: MethodId, site: NodeIndex) -> Result<Vec<MethodId>> {
        self.require_kind(method, site, NodeKind::VirtualCallSite)?;
        Ok(self.interproc.virtual_targets(method, site))
    }

    pub fn call_action(&self, caller: MethodId, site: NodeIndex, callee: MethodId) -> Result<Arc<ActionInstance>> {
        self.require_call_site(caller, site)?;
        self.interproc.call_action(caller, site, callee)
    }

    pub fn ret_action(&self, caller: MethodId, site: NodeIndex, callee: MethodId) -> Result<Arc<ActionInstance>> {
        self.require_call_site(caller, site)?;
        self.interproc.ret_action(caller, site, callee)
    }

    pub fn guard_action(&self, caller: MethodId, site: NodeIndex, callee: MethodId) -> Result<Arc<ActionInstance>> {
        self.require_kind(caller, site, NodeKind::VirtualCallSite)?;
        self.interproc.guard_action(caller, site, callee)
    }

    /// Record that `call_fact` at (`caller`, `site`) produced the callee's
    /// `entry_facts`, refined to `refined`
    pub fn update_calling_ctxs(
        &mut self,
        callee: MethodId,
        entry_facts: &[Fact],
        caller: MethodId,
        site: NodeIndex,
        call_fact: Fact,
        refined: &[Fact],
    ) -> Result<bool> {
        self.method(callee)?;
        self.require_call_site(caller, site)?;
        let ctx = BasicCtx {
            caller,
            site,
            call_fact,
        };
        self.interproc
            .update_calling_ctxs(callee, entry_facts, ctx, refined)
    }

    pub fn calling_context(&self, callee: MethodId, entry_fact: Fact) -> Result<&CallingContext> {
        self.interproc
            .calling_context(callee, entry_fact)
            .ok_or_else(|| {
                EngineError::misuse(format!(
                    "no calling context for {} at {}",
                    entry_fact, callee
                ))
            })
    }

    pub fn callers(&self, callee: MethodId) -> BTreeSet<MethodId> {
        self.interproc.callers(callee)
    }

    pub fn is_static_call_site_of(&self, caller: MethodId, site: NodeIndex, callee: MethodId) -> bool {
        self.interproc.is_static_call_site_of(caller, site, callee)
    }

    pub fn is_virtual_call_site_of(&self, caller: MethodId, site: NodeIndex, callee: MethodId) -> bool {
        self.interproc.is_virtual_call_site_of(caller, site, callee)
    }

    pub fn is_constructor_call_site_of(&self, caller: MethodId, site: NodeIndex, callee: MethodId) -> bool {
        self.interproc.is_constructor_call_site_of(caller, site, callee)
    }

    pub fn is_call_site_of(&self, caller: MethodId, site: NodeIndex, callee: MethodId) -> bool {
        self.interproc.is_call_site_of(caller, site, callee)
    }

    pub fn set_print_all_nodes(&mut self) {
        self.print_all_methods = true;
        for method in &mut self.methods {
            method.set_print_all();
        }
    }

    pub fn set_print_interproc_nodes(&mut self) {
        for method in &mut self.methods {
            method.set_print_interproc();
        }
    }

    pub fn set_print_method(&mut self, method: MethodId) -> Result<()> {
        self.method_mut(method)?.set_print_all();
        Ok(())
    }

    pub fn set_print_node(&mut self, method: MethodId, label: &str) -> Result<()> {
        self.method_mut(method)?.set_print_node(label)
    }

    pub fn prints_all_methods(&self) -> bool {
        self.print_all_methods
    }

    pub fn render_messages(&self) -> String {
        self.methods
            .iter()
            .map(MethodTs::render_messages)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Structures at every node marked for printing
    pub fn render_results(&self) -> String {
        let mut out = String::new();
        for method in &self.methods {
            let nodes = method.render_nodes();
            if nodes.is_empty() {
                continue;
            }
            let _ = writeln!(out, "== {} ==", method.signature());
            out.push_str(&nodes);
        }
        out
    }

    pub fn statistics_report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Program: {} methods, {} intra statements, {} call sites",
            self.methods.len(),
            self.counters.intra_stmts,
            self.interproc.call_site_count()
        );
        for method in &self.methods {
            let timer = method.join_timer();
            let _ = writeln!(
                out,
                "  {} [{}]: {} nodes, {} structures, join {:.3} ms",
                method.signature(),
                method.kind().as_str(),
                method.cfg().node_count(),
                method.store().structure_count(),
                timer.total.as_secs_f64() * 1000.0
            );
        }
        out.push_str(&self.interproc.statistics_report(|id| {
            self.methods
                .get(id.0 as usize)
                .map(|m| m.signature().to_string())
                .unwrap_or_else(|| id.to_string())
        }));
        info!("{}", out);
        out
    }
}

fn call_site_index<S: AbstractStructure>(ts: &MethodTs<S>, label: &str) -> Result<NodeIndex> {
    ts.node(label)
        .ok_or_else(|| EngineError::misuse(format!("call site {} was not created", label)))
}

impl<S> fmt::Debug for ProgramTs<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgramTs")
            .field("methods", &self.methods.len())
            .field("main", &self.main)
            .field("analysis_started", &self.analysis_started)
            .field("has_consumer", &self.consumer.is_some())
            .finish()
    }
}
