//! Action-application pipeline, end to end through the interpreter

mod common;

use common::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use shapegraph_engine::config::{AnalysisConfig, ApplierPolicy, ApplierRole};
use shapegraph_engine::features::semantics::domain::{Action, ActionInstance, StructureMessages};
use shapegraph_engine::features::semantics::{AbstractInterpreter, Applier, ProgramPoint};
use shapegraph_engine::features::structure::{AbstractStructure, Constraint, Formula, Var};
use shapegraph_engine::shared::models::Kleene;
use shapegraph_engine::EngineError;

#[test]
fn test_assign_null_clears_variable() {
    let f = list_vocab();
    let s = StructureBuilder::new(&f.vocab)
        .nodes(2)
        .unary(f.x, 0, Kleene::True)
        .unary(f.x, 1, Kleene::Unknown)
        .unary(f.a, 0, Kleene::True)
        .build();

    let mut interp = AbstractInterpreter::new(&AnalysisConfig::default()).unwrap();
    let mut msgs = StructureMessages::new();
    let out = interp
        .apply_intra(&clear("x = null", f.x), &s, &ProgramPoint::new("L1"), &mut msgs)
        .unwrap();

    assert_eq!(out.len(), 1);
    let r = &out[0];
    assert_eq!(r.node_count(), 2);
    for node in r.nodes() {
        assert_eq!(r.eval(f.x, &[node]), Kleene::False);
    }
    let marked: Vec<_> = r.nodes().into_iter().filter(|n| r.eval(f.a, &[*n]) == Kleene::True).collect();
    assert_eq!(marked.len(), 1);
    assert!(msgs.is_empty());
    assert_eq!(interp.statistics().structures, 1);
}

#[test]
fn test_assign_null_merges_indistinguishable_nodes() {
    let f = list_vocab();
    let sm = f.vocab.reserved().sm;
    let s = StructureBuilder::new(&f.vocab)
        .nodes(2)
        .unary(f.x, 0, Kleene::True)
        .unary(f.x, 1, Kleene::Unknown)
        .build();

    let mut interp = AbstractInterpreter::new(&AnalysisConfig::default()).unwrap();
    let out = interp
        .apply_intra(&clear("x = null", f.x), &s, &ProgramPoint::new("L1"), &mut StructureMessages::new())
        .unwrap();

    // nothing tells the two nodes apart once x is cleared, so blur folds them
    assert_eq!(out.len(), 1);
    let r = &out[0];
    assert_eq!(r.node_count(), 1);
    let node = r.nodes()[0];
    assert_eq!(r.eval(f.x, &[node]), Kleene::False);
    assert_eq!(r.eval(sm, &[node]), Kleene::Unknown);
}

#[test]
fn test_break_on_coerce_failure_returns_no_partial_results() {
    let f = list_vocab();
    let v = Var(0);
    let w = Var(1);
    // x(v) => y(v)
    let constraints = vec![Constraint::new(Formula::unary(f.x, v), Formula::unary(f.y, v))];
    let s = StructureBuilder::new(&f.vocab)
        .with_constraints(constraints)
        .nodes(2)
        .unary(f.y, 0, Kleene::True)
        .unary(f.x, 1, Kleene::True)
        .unary(f.y, 1, Kleene::True)
        .build();

    // for each y-node v: y(v) := false. Feasible on the first node only.
    let action = ActionInstance::from_action(
        Action::new("drop y")
            .with_precondition(Formula::unary(f.y, v))
            .with_update(
                f.y,
                vec![w],
                Formula::unary(f.y, w).and(Formula::eq(w, v).negate()),
            ),
    );
    let mut msgs = StructureMessages::new();

    let mut lenient = AbstractInterpreter::new(&AnalysisConfig::default()).unwrap();
    let out = lenient
        .apply_intra(&action, &s, &ProgramPoint::new("L9"), &mut msgs)
        .unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(lenient.statistics().breaches_after_update, 1);

    let policy = ApplierPolicy::default().with_break_on_coerce_failure(true);
    let config = AnalysisConfig::default().with_all_policies(policy);
    let mut strict = AbstractInterpreter::new(&config).unwrap();
    let err = strict
        .apply_intra(&action, &s, &ProgramPoint::new("L9"), &mut msgs)
        .unwrap_err();
    match err {
        EngineError::CoerceAfterUpdate { action, location, .. } => {
            assert_eq!(action, "drop y");
            assert_eq!(location, "L9");
        }
        other => panic!("unexpected error {other}"),
    }
    assert_eq!(strict.statistics().breaches_after_update, 1);
}

#[test]
fn test_focus_splits_before_update() {
    let f = list_vocab();
    let v = Var(0);
    let s = StructureBuilder::new(&f.vocab)
        .nodes(1)
        .unary(f.x, 0, Kleene::Unknown)
        .build();
    // y := x, focused on x
    let action = ActionInstance::from_action(
        Action::new("y = x")
            .with_focus(Formula::unary(f.x, v))
            .with_update(f.y, vec![v], Formula::unary(f.x, v)),
    );
    let applier = Applier::new(ApplierRole::Intra, ApplierPolicy::default()).unwrap();
    let mut stats = Default::default();
    let out = applier
        .apply(&action, &s, "L2", &mut StructureMessages::new(), &mut stats)
        .unwrap();
    assert_eq!(out.len(), 2);
    for r in &out {
        let node = r.nodes()[0];
        assert_eq!(r.eval(f.y, &[node]), r.eval(f.x, &[node]));
        assert!(r.eval(f.y, &[node]).is_definite());
    }
}

#[test]
fn test_combine_erases_markers_and_killed_nodes() {
    let f = list_vocab();
    let reserved = *f.vocab.reserved();
    let call = StructureBuilder::new(&f.vocab)
        .nodes(2)
        .unary(f.x, 0, Kleene::True)
        .binary(f.n, 0, 1, Kleene::True)
        .build();
    let exit = StructureBuilder::new(&f.vocab)
        .nodes(2)
        .unary(f.y, 0, Kleene::True)
        .nullary(f.g, Kleene::True)
        .build();

    // keep the exit node pointed to by y, drop the rest of the exit side
    let v = Var(0);
    let ret = ActionInstance::from_action(Action::new("return").with_update(
        reserved.kill,
        vec![v],
        Formula::unary(reserved.in_ux, v).and(Formula::unary(f.y, v).negate()),
    ));
    let mut interp = AbstractInterpreter::new(&AnalysisConfig::default()).unwrap();
    let out = interp
        .apply_ret(&ret, &call, &exit, &ProgramPoint::new("R1"), &mut StructureMessages::new())
        .unwrap();

    assert_eq!(out.len(), 1);
    for r in &out {
        assert_eq!(r.node_count(), 3);
        for node in r.nodes() {
            assert_eq!(r.eval(reserved.kill, &[node]), Kleene::False);
            assert_eq!(r.eval(reserved.in_uc, &[node]), Kleene::False);
            assert_eq!(r.eval(reserved.in_ux, &[node]), Kleene::False);
        }
        assert_eq!(r.eval(f.g, &[]), Kleene::True);
    }
    assert_eq!(interp.statistics().combines, 1);
}

fn arbitrary_structure() -> impl Strategy<Value = Vec<(u8, u8)>> {
    prop::collection::vec((0u8..3, 0u8..3), 0..4)
}

proptest! {
    #[test]
    fn prop_skip_is_identity(values in arbitrary_structure()) {
        let f = list_vocab();
        let mut builder = StructureBuilder::new(&f.vocab).nodes(values.len());
        for (i, (x, a)) in values.iter().enumerate() {
            builder = builder
                .unary(f.x, i, Kleene::from_u8(*x).unwrap())
                .unary(f.a, i, Kleene::from_u8(*a).unwrap());
        }
        let s = builder.build();
        let mut interp = AbstractInterpreter::new(&AnalysisConfig::default()).unwrap();
        let out = interp
            .apply_intra(&ActionInstance::skip(), &s, &ProgramPoint::new("L0"), &mut StructureMessages::new())
            .unwrap();
        prop_assert_eq!(out.len(), 1);
        prop_assert!(out[0].is_isomorphic(&s));
    }
}
