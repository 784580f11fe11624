//! Kleene formula evaluation over any `AbstractStructure`

use crate::features::structure::domain::{Assignment, Formula, Var};
use crate::features::structure::ports::{AbstractStructure, NodeId};
use crate::shared::models::Kleene;

/// Value of `formula` under an assignment binding all of its free variables.
///
/// Unbound variables evaluate as if the formula were false at them; callers
/// go through [`evaluate`] when variables remain open.
pub fn eval_closed<S: AbstractStructure>(
    structure: &S,
    formula: &Formula,
    assignment: &Assignment,
) -> Kleene {
    let nodes = structure.nodes();
    eval_rec(structure, &nodes, formula, &mut assignment.clone())
}

fn eval_rec<S: AbstractStructure>(
    structure: &S,
    nodes: &[NodeId],
    formula: &Formula,
    assignment: &mut Assignment,
) -> Kleene {
    match formula {
        Formula::Const(k) => *k,
        Formula::Pred(p, vars) => match assignment.tuple(vars) {
            Some(tuple) => structure.eval(*p, &tuple),
            None => Kleene::False,
        },
        Formula::Eq(a, b) => match (assignment.get(*a), assignment.get(*b)) {
            (Some(x), Some(y)) if x != y => Kleene::False,
            (Some(x), Some(_)) => {
                if structure.is_summary(x) {
                    Kleene::Unknown
                } else {
                    Kleene::True
                }
            }
            _ => Kleene::False,
        },
        Formula::Not(inner) => eval_rec(structure, nodes, inner, assignment).not(),
        Formula::And(l, r) => {
            let lv = eval_rec(structure, nodes, l, assignment);
            if lv == Kleene::False {
                return Kleene::False;
            }
            lv.and(eval_rec(structure, nodes, r, assignment))
        }
        Formula::Or(l, r) => {
            let lv = eval_rec(structure, nodes, l, assignment);
            if lv == Kleene::True {
                return Kleene::True;
            }
            lv.or(eval_rec(structure, nodes, r, assignment))
        }
        Formula::Implies(l, r) => {
            let lv = eval_rec(structure, nodes, l, assignment);
            if lv == Kleene::False {
                return Kleene::True;
            }
            lv.implies(eval_rec(structure, nodes, r, assignment))
        }
        Formula::Exists(v, body) => quantify(structure, nodes, *v, body, assignment, true),
        Formula::Forall(v, body) => quantify(structure, nodes, *v, body, assignment, false),
    }
}

fn quantify<S: AbstractStructure>(
    structure: &S,
    nodes: &[NodeId],
    var: Var,
    body: &Formula,
    assignment: &mut Assignment,
    existential: bool,
) -> Kleene {
    let saved = assignment.get(var);
    let (mut acc, stop) = if existential {
        (Kleene::False, Kleene::True)
    } else {
        (Kleene::True, Kleene::False)
    };
    for &node in nodes {
        assignment.bind(var, node);
        let v = eval_rec(structure, nodes, body, assignment);
        acc = if existential { acc.or(v) } else { acc.and(v) };
        if acc == stop {
            break;
        }
    }
    match saved {
        Some(node) => assignment.bind(var, node),
        None => assignment.unbind(var),
    }
    acc
}

/// Enumerate the assignments extending `partial` over the formula's unbound
/// free variables, keeping those on which the formula is not false.
///
/// Results follow lexicographic node order of the free variables taken in
/// order of first occurrence.
pub fn evaluate<S: AbstractStructure>(
    structure: &S,
    formula: &Formula,
    partial: &Assignment,
) -> Vec<(Assignment, Kleene)> {
    let open: Vec<Var> = formula
        .free_vars()
        .into_iter()
        .filter(|v| !partial.binds(*v))
        .collect();
    let nodes = structure.nodes();
    let mut out = Vec::new();
    let mut current = partial.clone();
    enumerate(structure, &nodes, formula, &open, &mut current, &mut out);
    out
}

fn enumerate<S: AbstractStructure>(
    structure: &S,
    nodes: &[NodeId],
    formula: &Formula,
    open: &[Var],
    current: &mut Assignment,
    out: &mut Vec<(Assignment, Kleene)>,
) {
    match open.split_first() {
        None => {
            let value = eval_rec(structure, nodes, formula, current);
            if value != Kleene::False {
                out.push((current.clone(), value));
            }
        }
        Some((&var, rest)) => {
            for &node in nodes {
                current.bind(var, node);
                enumerate(structure, nodes, formula, rest, current, out);
            }
            current.unbind(var);
        }
    }
}
