//! Integrity constraints used by coerce
//!
//! `body ==> head`: wherever `body` evaluates to definite true, `head` must
//! hold. Variables of `head` not bound by `body` are universally closed.

use super::formula::{Formula, Var};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    body: Formula,
    head: Formula,
}

impl Constraint {
    pub fn new(body: Formula, head: Formula) -> Self {
        let body_vars = body.free_vars();
        let extra: Vec<Var> = head
            .free_vars()
            .into_iter()
            .filter(|v| !body_vars.contains(v))
            .collect();
        let head = extra
            .into_iter()
            .rev()
            .fold(head, |acc, v| Formula::forall(v, acc));
        Self { body, head }
    }

    pub fn body(&self) -> &Formula {
        &self.body
    }

    pub fn head(&self) -> &Formula {
        &self.head
    }
}
