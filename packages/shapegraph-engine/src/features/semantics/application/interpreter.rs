//! Abstract interpreter
//!
//! Owns one applier per role plus the shared statistics and listeners.
//! Return-site actions go through `apply_binary`, which first combines the
//! call-site and exit structures into one.

use super::applier::Applier;
use crate::config::{AnalysisConfig, ApplierRole};
use crate::errors::Result;
use crate::features::semantics::domain::{
    ActionInstance, AnalysisStatistics, MessageRecord, Phase, StructureMessages,
};
use crate::features::semantics::ports::AnalysisListener;
use crate::features::structure::ports::{AbstractStructure, NullaryCombiner, OrCombiner};
use crate::shared::models::Kleene;
use std::fmt;
use tracing::{debug, info};

/// Where an action runs, and which input structures it consumes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramPoint {
    pub label: String,
    pub inputs: Vec<String>,
}

impl ProgramPoint {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            inputs: Vec::new(),
        }
    }

    pub fn with_input(mut self, id: impl Into<String>) -> Self {
        self.inputs.push(id.into());
        self
    }
}

pub struct AbstractInterpreter {
    intra: Applier,
    guard: Applier,
    call: Applier,
    ret: Applier,
    statistics: AnalysisStatistics,
    listeners: Vec<Box<dyn AnalysisListener>>,
}

impl AbstractInterpreter {
    pub fn new(config: &AnalysisConfig) -> Result<Self> {
        Ok(Self {
            intra: Applier::new(ApplierRole::Intra, config.intra.clone())?,
            guard: Applier::new(ApplierRole::Guard, config.guard.clone())?,
            call: Applier::new(ApplierRole::Call, config.call.clone())?,
            ret: Applier::new(ApplierRole::Ret, config.ret.clone())?,
            statistics: AnalysisStatistics::new(),
            listeners: Vec::new(),
        })
    }

    pub fn add_listener(&mut self, listener: Box<dyn AnalysisListener>) {
        self.listeners.push(listener);
    }

    pub fn applier(&self, role: ApplierRole) -> &Applier {
        match role {
            ApplierRole::Intra => &self.intra,
            ApplierRole::Guard => &self.guard,
            ApplierRole::Call => &self.call,
            ApplierRole::Ret => &self.ret,
        }
    }

    pub fn apply_intra<S: AbstractStructure>(
        &mut self,
        action: &ActionInstance,
        input: &S,
        at: &ProgramPoint,
        messages: &mut StructureMessages<S>,
    ) -> Result<Vec<S>> {
        self.apply_with(ApplierRole::Intra, action, input, at, messages)
    }

    /// Narrow a virtual call to one candidate's dynamic type
    pub fn apply_guard<S: AbstractStructure>(
        &mut self,
        action: &ActionInstance,
        input: &S,
        at: &ProgramPoint,
        messages: &mut StructureMessages<S>,
    ) -> Result<Vec<S>> {
        self.apply_with(ApplierRole::Guard, action, input, at, messages)
    }

    /// Bind actuals to formals, producing callee entry structures
    pub fn apply_call<S: AbstractStructure>(
        &mut self,
        action: &ActionInstance,
        input: &S,
        at: &ProgramPoint,
        messages: &mut StructureMessages<S>,
    ) -> Result<Vec<S>> {
        self.apply_with(ApplierRole::Call, action, input, at, messages)
    }

    /// Return with the default OR combiner for nullary predicates
    pub fn apply_ret<S: AbstractStructure>(
        &mut self,
        action: &ActionInstance,
        call: &S,
        exit: &S,
        at: &ProgramPoint,
        messages: &mut StructureMessages<S>,
    ) -> Result<Vec<S>> {
        self.apply_binary(&OrCombiner, action, call, exit, at, messages)
    }

    /// Combine a call-site structure with a callee exit structure and run
    /// the return action on the result.
    ///
    /// Call-side nodes carry `inUc` and exit-side nodes carry `inUx` while
    /// the action runs. In every returned structure `inUc`, `inUx` and `kill`
    /// are false on all nodes. Neither input is modified.
    pub fn apply_binary<S: AbstractStructure>(
        &mut self,
        combiner: &dyn NullaryCombiner,
        action: &ActionInstance,
        call: &S,
        exit: &S,
        at: &ProgramPoint,
        messages: &mut StructureMessages<S>,
    ) -> Result<Vec<S>> {
        let reserved = *call.vocabulary().reserved();
        let mut call_side = call.clone();
        call_side.set_all(reserved.in_uc, Kleene::True);
        let mut exit_side = exit.clone();
        exit_side.set_all(reserved.in_ux, Kleene::True);
        let combined = S::combine(combiner, &call_side, &exit_side);
        self.statistics.combines += 1;
        debug!(
            action = %action,
            location = %at.label,
            call_nodes = call.node_count(),
            exit_nodes = exit.node_count(),
            "combined call and exit structures"
        );

        let mut results = self.apply_with(ApplierRole::Ret, action, &combined, at, messages)?;
        for result in &mut results {
            result.set_all(reserved.in_uc, Kleene::False);
            result.set_all(reserved.in_ux, Kleene::False);
            result.filter_nodes(reserved.kill);
            result.set_all(reserved.kill, Kleene::False);
        }
        Ok(results)
    }

    fn apply_with<S: AbstractStructure>(
        &mut self,
        role: ApplierRole,
        action: &ActionInstance,
        input: &S,
        at: &ProgramPoint,
        messages: &mut StructureMessages<S>,
    ) -> Result<Vec<S>> {
        let applier = match role {
            ApplierRole::Intra => &self.intra,
            ApplierRole::Guard => &self.guard,
            ApplierRole::Call => &self.call,
            ApplierRole::Ret => &self.ret,
        };
        let mut fired = StructureMessages::new();
        let out = applier.apply(action, input, &at.label, &mut fired, &mut self.statistics)?;
        if !fired.is_empty() {
            for (focused, texts) in fired.iter() {
                let record = MessageRecord {
                    transformer: action.title().to_string(),
                    inputs: at.inputs.clone(),
                    location: at.label.clone(),
                    focused: focused.render(),
                    messages: texts.to_vec(),
                };
                for listener in &mut self.listeners {
                    listener.on_messages(&record);
                }
            }
            messages.extend(fired);
        }
        Ok(out)
    }

    pub fn statistics(&self) -> &AnalysisStatistics {
        &self.statistics
    }

    pub fn statistics_mut(&mut self) -> &mut AnalysisStatistics {
        &mut self.statistics
    }

    pub fn start_analysis(&mut self) {
        self.statistics.start(Phase::TotalAnalysis);
    }

    /// Stop the total timer and log the report
    pub fn finish_analysis(&mut self) -> String {
        self.statistics.stop(Phase::TotalAnalysis);
        let report = self.statistics.report();
        info!("{}", report);
        report
    }
}

impl fmt::Debug for AbstractInterpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbstractInterpreter")
            .field("intra", &self.intra)
            .field("guard", &self.guard)
            .field("call", &self.call)
            .field("ret", &self.ret)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
