//! Compiled statement semantics
//!
//! An `Action` is immutable once built: focus formulas, an optional
//! precondition, one update formula per updated predicate and message
//! formulas. Applying it to a structure and an assignment is a pure function.

use crate::features::structure::domain::{Assignment, Formula, Var};
use crate::features::structure::infrastructure::{eval_closed, evaluate};
use crate::features::structure::ports::{AbstractStructure, NodeId};
use crate::features::vocabulary::PredicateId;
use crate::shared::models::Kleene;

/// `predicate(vars) := formula`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateUpdate<P = PredicateId> {
    pub predicate: P,
    pub vars: Vec<Var>,
    pub formula: Formula<P>,
}

/// When a message formula fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Formula is potentially true (true or unknown)
    Potential,
    /// Formula is definitely true
    DefiniteTrue,
    /// Formula is definitely false
    DefiniteFalse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRule<P = PredicateId> {
    pub kind: MessageKind,
    pub condition: Formula<P>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action<P = PredicateId> {
    title: String,
    skip: bool,
    focus: Vec<Formula<P>>,
    precondition: Option<Formula<P>>,
    updates: Vec<PredicateUpdate<P>>,
    messages: Vec<MessageRule<P>>,
    new_var: Option<Var>,
}

impl<P> Action<P> {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            skip: false,
            focus: Vec::new(),
            precondition: None,
            updates: Vec::new(),
            messages: Vec::new(),
            new_var: None,
        }
    }

    /// The no-op action
    pub fn skip(title: impl Into<String>) -> Self {
        Self {
            skip: true,
            ..Self::new(title)
        }
    }

    pub fn with_focus(mut self, formula: Formula<P>) -> Self {
        self.focus.push(formula);
        self
    }

    pub fn with_precondition(mut self, formula: Formula<P>) -> Self {
        self.precondition = Some(formula);
        self
    }

    pub fn with_update(mut self, predicate: P, vars: Vec<Var>, formula: Formula<P>) -> Self {
        self.updates.push(PredicateUpdate {
            predicate,
            vars,
            formula,
        });
        self
    }

    pub fn with_message(mut self, kind: MessageKind, condition: Formula<P>, text: impl Into<String>) -> Self {
        self.messages.push(MessageRule {
            kind,
            condition,
            text: text.into(),
        });
        self
    }

    /// Allocate a node bound to `var` before the update runs
    pub fn allocating(mut self, var: Var) -> Self {
        self.new_var = Some(var);
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_skip(&self) -> bool {
        self.skip
    }

    pub fn focus_formulas(&self) -> &[Formula<P>] {
        &self.focus
    }

    pub fn precondition(&self) -> Option<&Formula<P>> {
        self.precondition.as_ref()
    }

    pub fn updates(&self) -> &[PredicateUpdate<P>] {
        &self.updates
    }

    pub fn message_rules(&self) -> &[MessageRule<P>] {
        &self.messages
    }

    pub fn new_var(&self) -> Option<Var> {
        self.new_var
    }

    /// Same action with a different title and every predicate reference
    /// translated
    pub fn try_map<Q, E>(
        &self,
        title: String,
        f: &mut impl FnMut(&P) -> Result<Q, E>,
    ) -> Result<Action<Q>, E> {
        let focus = self
            .focus
            .iter()
            .map(|g| g.try_map_predicates(f))
            .collect::<Result<Vec<_>, E>>()?;
        let precondition = match &self.precondition {
            Some(g) => Some(g.try_map_predicates(f)?),
            None => None,
        };
        let mut updates = Vec::with_capacity(self.updates.len());
        for u in &self.updates {
            updates.push(PredicateUpdate {
                predicate: f(&u.predicate)?,
                vars: u.vars.clone(),
                formula: u.formula.try_map_predicates(f)?,
            });
        }
        let mut messages = Vec::with_capacity(self.messages.len());
        for m in &self.messages {
            messages.push(MessageRule {
                kind: m.kind,
                condition: m.condition.try_map_predicates(f)?,
                text: m.text.clone(),
            });
        }
        Ok(Action {
            title,
            skip: self.skip,
            focus,
            precondition,
            updates,
            messages,
            new_var: self.new_var,
        })
    }
}

impl Action<PredicateId> {
    /// Assignments on which the precondition is not false. Without a
    /// precondition there is exactly one, empty, assignment.
    pub fn precondition_assignments<S: AbstractStructure>(&self, structure: &S) -> Vec<Assignment> {
        match &self.precondition {
            None => vec![Assignment::empty()],
            Some(pre) => evaluate(structure, pre, &Assignment::empty())
                .into_iter()
                .map(|(assignment, _)| assignment)
                .collect(),
        }
    }

    /// Texts of the message rules that fire, without duplicates
    pub fn report_messages<S: AbstractStructure>(&self, structure: &S, assignment: &Assignment) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for rule in &self.messages {
            let fires = match rule.kind {
                MessageKind::Potential => !evaluate(structure, &rule.condition, assignment).is_empty(),
                MessageKind::DefiniteTrue => evaluate(structure, &rule.condition, assignment)
                    .iter()
                    .any(|(_, v)| *v == Kleene::True),
                MessageKind::DefiniteFalse => {
                    let negated = rule.condition.clone().negate();
                    evaluate(structure, &negated, assignment)
                        .iter()
                        .any(|(_, v)| *v == Kleene::True)
                }
            };
            if fires && !out.contains(&rule.text) {
                out.push(rule.text.clone());
            }
        }
        out
    }

    /// Apply the update formulas. All formulas read the pre-update
    /// structure; `is_new` marks the allocated node while they run and is
    /// cleared afterwards.
    pub fn evaluate_update<S: AbstractStructure>(&self, structure: &S, assignment: &Assignment) -> S {
        let is_new = structure.vocabulary().reserved().is_new;
        let mut pre = structure.clone();
        let mut assignment = assignment.clone();
        if let Some(var) = self.new_var {
            let node = pre.new_node();
            pre.update(is_new, &[node], Kleene::True);
            assignment.bind(var, node);
        }

        let nodes = pre.nodes();
        let mut post = pre.clone();
        for update in &self.updates {
            for tuple in tuples(&nodes, update.vars.len()) {
                let mut local = assignment.clone();
                for (var, node) in update.vars.iter().zip(tuple.iter()) {
                    local.bind(*var, *node);
                }
                let value = eval_closed(&pre, &update.formula, &local);
                post.update(update.predicate, &tuple, value);
            }
        }

        if self.new_var.is_some() {
            post.set_all(is_new, Kleene::False);
        }
        post
    }
}

/// Every tuple of `arity` nodes, lexicographically
fn tuples(nodes: &[NodeId], arity: usize) -> Vec<Vec<NodeId>> {
    let mut out = vec![Vec::with_capacity(arity)];
    for _ in 0..arity {
        let mut next = Vec::with_capacity(out.len() * nodes.len());
        for prefix in &out {
            for &node in nodes {
                let mut t = prefix.clone();
                t.push(node);
                next.push(t);
            }
        }
        out = next;
    }
    out
}
