//! First-order formulas over three-valued structures
//!
//! `Formula<P>` is generic over how predicates are referenced: compiled
//! actions use `PredicateId`, action templates use symbolic references that
//! are resolved when a macro is instantiated.

use crate::features::vocabulary::{PredicateId, Vocabulary};
use crate::shared::models::Kleene;
use std::fmt;

/// Logical variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Var(pub u32);

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Formula<P = PredicateId> {
    Const(Kleene),
    Pred(P, Vec<Var>),
    Eq(Var, Var),
    Not(Box<Formula<P>>),
    And(Box<Formula<P>>, Box<Formula<P>>),
    Or(Box<Formula<P>>, Box<Formula<P>>),
    Implies(Box<Formula<P>>, Box<Formula<P>>),
    Exists(Var, Box<Formula<P>>),
    Forall(Var, Box<Formula<P>>),
}

impl<P> Formula<P> {
    pub fn truth() -> Self {
        Formula::Const(Kleene::True)
    }

    pub fn falsity() -> Self {
        Formula::Const(Kleene::False)
    }

    pub fn unknown() -> Self {
        Formula::Const(Kleene::Unknown)
    }

    pub fn nullary(p: P) -> Self {
        Formula::Pred(p, Vec::new())
    }

    pub fn unary(p: P, v: Var) -> Self {
        Formula::Pred(p, vec![v])
    }

    pub fn binary(p: P, v1: Var, v2: Var) -> Self {
        Formula::Pred(p, vec![v1, v2])
    }

    pub fn eq(v1: Var, v2: Var) -> Self {
        Formula::Eq(v1, v2)
    }

    pub fn negate(self) -> Self {
        Formula::Not(Box::new(self))
    }

    pub fn and(self, other: Self) -> Self {
        Formula::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Self) -> Self {
        Formula::Or(Box::new(self), Box::new(other))
    }

    pub fn implies(self, other: Self) -> Self {
        Formula::Implies(Box::new(self), Box::new(other))
    }

    pub fn exists(v: Var, body: Self) -> Self {
        Formula::Exists(v, Box::new(body))
    }

    pub fn forall(v: Var, body: Self) -> Self {
        Formula::Forall(v, Box::new(body))
    }

    /// Free variables in order of first occurrence
    pub fn free_vars(&self) -> Vec<Var> {
        let mut out = Vec::new();
        self.collect_free(&mut Vec::new(), &mut out);
        out
    }

    fn collect_free(&self, bound: &mut Vec<Var>, out: &mut Vec<Var>) {
        let note = |v: Var, bound: &Vec<Var>, out: &mut Vec<Var>| {
            if !bound.contains(&v) && !out.contains(&v) {
                out.push(v);
            }
        };
        match self {
            Formula::Const(_) => {}
            Formula::Pred(_, vars) => {
                for v in vars {
                    note(*v, bound, out);
                }
            }
            Formula::Eq(a, b) => {
                note(*a, bound, out);
                note(*b, bound, out);
            }
            Formula::Not(f) => f.collect_free(bound, out),
            Formula::And(l, r) | Formula::Or(l, r) | Formula::Implies(l, r) => {
                l.collect_free(bound, out);
                r.collect_free(bound, out);
            }
            Formula::Exists(v, f) | Formula::Forall(v, f) => {
                bound.push(*v);
                f.collect_free(bound, out);
                bound.pop();
            }
        }
    }

    /// `p(vars)` or `!p(vars)`, with the polarity
    pub fn as_literal(&self) -> Option<(&P, &[Var], bool)> {
        match self {
            Formula::Pred(p, vars) => Some((p, vars.as_slice(), true)),
            Formula::Not(inner) => match inner.as_ref() {
                Formula::Pred(p, vars) => Some((p, vars.as_slice(), false)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Rebuild the formula with every predicate reference translated
    pub fn try_map_predicates<Q, E>(
        &self,
        f: &mut impl FnMut(&P) -> Result<Q, E>,
    ) -> Result<Formula<Q>, E> {
        Ok(match self {
            Formula::Const(k) => Formula::Const(*k),
            Formula::Pred(p, vars) => Formula::Pred(f(p)?, vars.clone()),
            Formula::Eq(a, b) => Formula::Eq(*a, *b),
            Formula::Not(inner) => Formula::Not(Box::new(inner.try_map_predicates(f)?)),
            Formula::And(l, r) => Formula::And(
                Box::new(l.try_map_predicates(f)?),
                Box::new(r.try_map_predicates(f)?),
            ),
            Formula::Or(l, r) => Formula::Or(
                Box::new(l.try_map_predicates(f)?),
                Box::new(r.try_map_predicates(f)?),
            ),
            Formula::Implies(l, r) => Formula::Implies(
                Box::new(l.try_map_predicates(f)?),
                Box::new(r.try_map_predicates(f)?),
            ),
            Formula::Exists(v, body) => {
                Formula::Exists(*v, Box::new(body.try_map_predicates(f)?))
            }
            Formula::Forall(v, body) => {
                Formula::Forall(*v, Box::new(body.try_map_predicates(f)?))
            }
        })
    }

    fn write_with(
        &self,
        f: &mut fmt::Formatter<'_>,
        name: &dyn Fn(&P) -> String,
    ) -> fmt::Result {
        match self {
            Formula::Const(k) => write!(f, "{}", k),
            Formula::Pred(p, vars) => {
                write!(f, "{}(", name(p))?;
                for (i, v) in vars.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, ")")
            }
            Formula::Eq(a, b) => write!(f, "{} == {}", a, b),
            Formula::Not(inner) => {
                write!(f, "!")?;
                inner.write_with(f, name)
            }
            Formula::And(l, r) => self.write_binop(f, l, "&", r, name),
            Formula::Or(l, r) => self.write_binop(f, l, "|", r, name),
            Formula::Implies(l, r) => self.write_binop(f, l, "->", r, name),
            Formula::Exists(v, body) => {
                write!(f, "E({}). ", v)?;
                body.write_with(f, name)
            }
            Formula::Forall(v, body) => {
                write!(f, "A({}). ", v)?;
                body.write_with(f, name)
            }
        }
    }

    fn write_binop(
        &self,
        f: &mut fmt::Formatter<'_>,
        l: &Formula<P>,
        op: &str,
        r: &Formula<P>,
        name: &dyn Fn(&P) -> String,
    ) -> fmt::Result {
        write!(f, "(")?;
        l.write_with(f, name)?;
        write!(f, " {} ", op)?;
        r.write_with(f, name)?;
        write!(f, ")")
    }
}

impl<P: fmt::Display> fmt::Display for Formula<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_with(f, &|p: &P| p.to_string())
    }
}

impl Formula<PredicateId> {
    /// Render with predicate names taken from the vocabulary
    pub fn render(&self, vocabulary: &Vocabulary) -> String {
        struct Named<'a>(&'a Formula, &'a Vocabulary);
        impl fmt::Display for Named<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0
                    .write_with(f, &|p: &PredicateId| self.1.name(*p).to_string())
            }
        }
        Named(self, vocabulary).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_vars_respect_quantifiers() {
        let (v0, v1) = (Var(0), Var(1));
        let f: Formula<u32> = Formula::exists(v1, Formula::binary(7, v0, v1))
            .and(Formula::unary(3, v0));
        assert_eq!(f.free_vars(), vec![v0]);

        let g: Formula<u32> = Formula::eq(v1, v0);
        assert_eq!(g.free_vars(), vec![v1, v0]);
    }

    #[test]
    fn test_as_literal() {
        let v = Var(0);
        let pos: Formula<u32> = Formula::unary(1, v);
        let neg = pos.clone().negate();
        assert_eq!(pos.as_literal().map(|(p, _, b)| (*p, b)), Some((1, true)));
        assert_eq!(neg.as_literal().map(|(p, _, b)| (*p, b)), Some((1, false)));
        assert!(pos.and(neg).as_literal().is_none());
    }

    #[test]
    fn test_map_predicates() {
        let f: Formula<&str> = Formula::unary("x", Var(0)).or(Formula::nullary("b"));
        let mapped: Result<Formula<u32>, String> = f.try_map_predicates(&mut |p: &&str| match *p {
            "x" => Ok(1),
            "b" => Ok(2),
            other => Err(other.to_string()),
        });
        assert_eq!(
            mapped.unwrap(),
            Formula::unary(1, Var(0)).or(Formula::nullary(2))
        );

        let missing: Formula<&str> = Formula::unary("y", Var(0));
        let err: Result<Formula<u32>, String> =
            missing.try_map_predicates(&mut |p: &&str| Err(p.to_string()));
        assert_eq!(err.unwrap_err(), "y");
    }

    #[test]
    fn test_display() {
        let f: Formula<&str> =
            Formula::forall(Var(1), Formula::unary("x", Var(1)).implies(Formula::unknown()));
        assert_eq!(f.to_string(), "A(v1). (x(v1) -> 1/2)");
    }
}
