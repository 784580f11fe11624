//! Focus: case-split structures until the focus formulas are definite
//!
//! Literal formulas `p(v..)` / `!p(v..)` are handled. For every tuple on
//! which `p` is unknown:
//! - tuples of non-summary nodes split into a false and a true copy;
//! - a unary tuple on a summary node `u` splits three ways: `p` false on all
//!   of `u`, true on all of `u`, or `u` materialized into two summary nodes,
//!   one with `p` true and one with `p` false.
//!
//! Tuples of arity two or more touching a summary node stay unknown, which is
//! sound. Non-literal formulas leave the structure unchanged.

use super::evaluator::evaluate;
use super::three_valued::ThreeValuedStructure;
use crate::features::structure::domain::{Assignment, Formula, Var};
use crate::features::structure::ports::{AbstractStructure, NodeId};
use crate::features::vocabulary::PredicateId;
use crate::shared::models::Kleene;
use tracing::debug;

impl ThreeValuedStructure {
    pub(super) fn focus_all(&self, formulas: &[Formula]) -> Vec<Self> {
        let mut current = vec![self.clone()];
        for formula in formulas {
            let mut next = Vec::with_capacity(current.len());
            for structure in current {
                next.extend(structure.focus_formula(formula));
            }
            current = next;
        }
        current
    }

    fn focus_formula(self, formula: &Formula) -> Vec<Self> {
        let Some((&pred, vars, _)) = formula.as_literal() else {
            debug!(
                formula = %formula.render(&self.vocabulary),
                "focus formula is not a literal; structure kept as is"
            );
            return vec![self];
        };
        if pred == self.vocabulary.reserved().sm {
            return vec![self];
        }

        let mut done = Vec::new();
        let mut pending = vec![self];
        while let Some(structure) = pending.pop() {
            match structure.find_focus_tuple(pred, vars) {
                None => done.push(structure),
                Some(tuple) => {
                    let mut splits = structure.split_on(pred, &tuple);
                    splits.reverse();
                    pending.extend(splits);
                }
            }
        }
        done
    }

    fn find_focus_tuple(&self, pred: PredicateId, vars: &[Var]) -> Option<Vec<NodeId>> {
        let atom = Formula::Pred(pred, vars.to_vec());
        evaluate(self, &atom, &Assignment::empty())
            .into_iter()
            .filter(|(_, value)| *value == Kleene::Unknown)
            .filter_map(|(assignment, _)| assignment.tuple(vars))
            .find(|tuple| self.splittable(tuple))
    }

    fn splittable(&self, tuple: &[NodeId]) -> bool {
        tuple.len() == 1 || tuple.iter().all(|n| !self.is_summary(*n))
    }

    fn split_on(&self, pred: PredicateId, tuple: &[NodeId]) -> Vec<Self> {
        let mut negative = self.clone();
        negative.update(pred, tuple, Kleene::False);
        let mut positive = self.clone();
        positive.update(pred, tuple, Kleene::True);

        if tuple.len() == 1 && self.is_summary(tuple[0]) {
            let node = tuple[0];
            let mut materialized = self.clone();
            let copy = materialized.duplicate_node(node);
            materialized.update(pred, &[node], Kleene::True);
            materialized.update(pred, &[copy], Kleene::False);
            vec![negative, positive, materialized]
        } else {
            vec![negative, positive]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::vocabulary::VocabularyBuilder;

    #[test]
    fn test_focus_splits_non_summary_unknown() {
        let mut builder = VocabularyBuilder::new();
        let x = builder.unary("x").unwrap();
        let mut s = ThreeValuedStructure::new(builder.freeze());
        let u0 = s.new_node();
        let u1 = s.new_node();
        s.update(x, &[u0], Kleene::Unknown);
        s.update(x, &[u1], Kleene::Unknown);

        let focused = s.focus(&[Formula::unary(x, Var(0))]);
        assert_eq!(focused.len(), 4);
        for f in &focused {
            assert!(f.eval(x, &[u0]).is_definite());
            assert!(f.eval(x, &[u1]).is_definite());
        }
    }

    #[test]
    fn test_focus_materializes_summary_node() {
        let mut builder = VocabularyBuilder::new();
        let x = builder.unary("x").unwrap();
        let vocab = builder.freeze();
        let sm = vocab.reserved().sm;
        let mut s = ThreeValuedStructure::new(vocab);
        let u = s.new_node();
        s.update(sm, &[u], Kleene::Unknown);
        s.update(x, &[u], Kleene::Unknown);

        let focused = s.focus(&[Formula::unary(x, Var(0)).negate()]);
        assert_eq!(focused.len(), 3);
        assert_eq!(focused[2].node_count(), 2);
        for f in &focused {
            for n in f.nodes() {
                assert!(f.eval(x, &[n]).is_definite());
            }
        }
    }

    #[test]
    fn test_focus_on_definite_formula_is_identity() {
        let mut builder = VocabularyBuilder::new();
        let b = builder.nullary("b").unwrap();
        let mut s = ThreeValuedStructure::new(builder.freeze());
        s.update(b, &[], Kleene::True);
        let focused = s.focus(&[Formula::nullary(b)]);
        assert_eq!(focused, vec![s]);
    }

    #[test]
    fn test_focus_non_literal_keeps_structure() {
        let mut builder = VocabularyBuilder::new();
        let x = builder.unary("x").unwrap();
        let mut s = ThreeValuedStructure::new(builder.freeze());
        let u = s.new_node();
        s.update(x, &[u], Kleene::Unknown);
        let v = Var(0);
        let focused = s.focus(&[Formula::exists(v, Formula::unary(x, v))]);
        assert_eq!(focused.len(), 1);
    }
}
