//! Action-application pipeline
//!
//! skip → focus → [coerce] → precondition → messages → update → kill filter
//! → [coerce] → blur
//!
//! Output order follows (focused structure × satisfying assignment).

use crate::config::{ApplierPolicy, ApplierRole};
use crate::errors::{EngineError, Result};
use crate::features::semantics::domain::{
    ActionInstance, AnalysisStatistics, Phase, StructureMessages,
};
use crate::features::structure::ports::AbstractStructure;
use tracing::{debug, error, warn};

/// One pipeline instance with a fixed policy
#[derive(Debug, Clone)]
pub struct Applier {
    role: ApplierRole,
    policy: ApplierPolicy,
}

impl Applier {
    pub fn new(role: ApplierRole, policy: ApplierPolicy) -> Result<Self> {
        policy.validate_for(role)?;
        Ok(Self { role, policy })
    }

    pub fn role(&self) -> ApplierRole {
        self.role
    }

    pub fn policy(&self) -> &ApplierPolicy {
        &self.policy
    }

    pub fn does_focus(&self) -> bool {
        self.policy.do_focus
    }

    pub fn does_coerce_after_focus(&self) -> bool {
        self.policy.do_coerce_after_focus
    }

    pub fn does_coerce_after_update(&self) -> bool {
        self.policy.do_coerce_after_update
    }

    pub fn does_blur(&self) -> bool {
        self.policy.do_blur
    }

    pub fn freezes_structures_with_messages(&self) -> bool {
        self.policy.freeze_structures_with_messages
    }

    pub fn breaks_if_coerce_after_update_failed(&self) -> bool {
        self.policy.break_if_coerce_after_update_failed
    }

    /// Apply `instance` to `input` at `location`.
    ///
    /// Messages are recorded against the focused structure they fired on.
    /// Returns `EngineError::CoerceAfterUpdate` (and nothing else) when an
    /// updated structure breaks a constraint under break-on-failure.
    pub fn apply<S: AbstractStructure>(
        &self,
        instance: &ActionInstance,
        input: &S,
        location: &str,
        messages: &mut StructureMessages<S>,
        stats: &mut AnalysisStatistics,
    ) -> Result<Vec<S>> {
        stats.actions_applied += 1;
        if instance.is_skip() {
            return Ok(vec![input.clone()]);
        }
        let action = instance.action();
        let kill = input.vocabulary().reserved().kill;

        let focused = if self.policy.do_focus && !action.focus_formulas().is_empty() {
            let out = stats.time(Phase::Focus, || input.focus(action.focus_formulas()));
            debug!(
                role = %self.role,
                action = %instance,
                location,
                structures = out.len(),
                "focus split"
            );
            out
        } else {
            vec![input.clone()]
        };

        let mut answer = Vec::new();
        for mut focused in focused {
            if self.policy.do_coerce_after_focus {
                let feasible = stats.time(Phase::Coerce, || focused.coerce());
                if !feasible {
                    stats.constraint_breaches += 1;
                    if self.policy.print_structure_if_coerce_after_focus_failed {
                        warn!(
                            role = %self.role,
                            action = %instance,
                            location,
                            structure = %input.render(),
                            "coerce after focus failed"
                        );
                    } else {
                        debug!(location, "focused structure infeasible, dropped");
                    }
                    continue;
                }
            }

            let assignments =
                stats.time(Phase::Precondition, || action.precondition_assignments(&focused));

            for assignment in assignments {
                let fired = action.report_messages(&focused, &assignment);
                if !fired.is_empty() {
                    messages.add(focused.clone(), fired);
                    if self.policy.freeze_structures_with_messages {
                        stats.messages += 1;
                        debug!(location, %assignment, "branch frozen with messages");
                        continue;
                    }
                }

                let mut result = stats.time(Phase::Update, || {
                    let mut updated = action.evaluate_update(&focused, &assignment);
                    updated.filter_nodes(kill);
                    updated
                });

                if self.policy.do_coerce_after_update {
                    let feasible = stats.time(Phase::Coerce, || result.coerce());
                    if !feasible {
                        stats.breaches_after_update += 1;
                        warn!(
                            role = %self.role,
                            action = %instance,
                            location,
                            %assignment,
                            "coerce after update failed"
                        );
                        if self.policy.break_if_coerce_after_update_failed {
                            let input = input.render();
                            let output = result.render();
                            error!(
                                action = %instance,
                                location,
                                %input,
                                updated = %output,
                                "analysis stopped: constraint breached after update"
                            );
                            return Err(EngineError::CoerceAfterUpdate {
                                action: instance.title().to_string(),
                                location: location.to_string(),
                                input,
                                output,
                            });
                        }
                        continue;
                    }
                }

                if self.policy.do_blur {
                    stats.time(Phase::Blur, || result.blur());
                }
                stats.structures += 1;
                answer.push(result);
            }
        }
        Ok(answer)
    }
}
