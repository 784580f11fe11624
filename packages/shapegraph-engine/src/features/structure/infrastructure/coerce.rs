//! Coerce: sharpen a structure with its integrity constraints
//!
//! For every assignment on which a constraint body is definitely true:
//! a false head makes the structure infeasible, an unknown literal head
//! is set to the value the constraint demands. Runs to a fixpoint.

use super::evaluator::{eval_closed, evaluate};
use super::three_valued::ThreeValuedStructure;
use crate::features::structure::domain::Assignment;
use crate::features::structure::ports::AbstractStructure;
use crate::shared::models::Kleene;
use std::sync::Arc;
use tracing::trace;

impl ThreeValuedStructure {
    pub(super) fn coerce_constraints(&mut self) -> bool {
        let constraints = Arc::clone(&self.constraints);
        let sm = self.vocabulary.reserved().sm;
        loop {
            let mut changed = false;
            for constraint in constraints.iter() {
                for (assignment, body) in evaluate(self, constraint.body(), &Assignment::empty()) {
                    if body != Kleene::True {
                        continue;
                    }
                    match eval_closed(self, constraint.head(), &assignment) {
                        Kleene::True => {}
                        Kleene::False => {
                            trace!(%assignment, "integrity constraint violated");
                            return false;
                        }
                        Kleene::Unknown => {
                            let Some((&pred, vars, positive)) = constraint.head().as_literal()
                            else {
                                continue;
                            };
                            if pred == sm {
                                continue;
                            }
                            if let Some(tuple) = assignment.tuple(vars) {
                                self.update(pred, &tuple, Kleene::from_bool(positive));
                                changed = true;
                            }
                        }
                    }
                }
            }
            if !changed {
                return true;
            }
        }
    }
}
