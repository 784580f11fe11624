//! Program transition system driven by hand, the way an external worklist
//! scheduler would

mod common;

use common::*;
use pretty_assertions::assert_eq;
use shapegraph_engine::config::{AnalysisConfig, JoinMode};
use shapegraph_engine::features::semantics::domain::{Action, ActionInstance, StructureMessages};
use shapegraph_engine::features::semantics::{AbstractInterpreter, ProgramPoint};
use shapegraph_engine::features::structure::{AbstractStructure, Formula, ThreeValuedStructure, Var};
use shapegraph_engine::features::transition_system::{
    Event, MethodId, MethodKind, NodeKind, ProgramTs, RecordingConsumer,
};
use shapegraph_engine::features::vocabulary::VocabularyBuilder;
use shapegraph_engine::shared::models::Kleene;
use shapegraph_engine::EngineError;
use std::collections::BTreeSet;
use std::sync::Arc;

type Program = ProgramTs<ThreeValuedStructure>;

fn program() -> Program {
    ProgramTs::new(&AnalysisConfig::default())
}

#[test]
fn test_method_lives_in_one_bin() {
    let mut p = program();
    p.add_virtual_method("void A.m()", "e", "x").unwrap();
    let err = p.add_static_method("void A.m()", "e", "x").unwrap_err();
    assert!(matches!(err, EngineError::Registration(_)));
    let err = p.add_constructor("void A.m()", "e", "x").unwrap_err();
    assert!(matches!(err, EngineError::Registration(_)));
    assert_eq!(p.methods().count(), 1);
    assert_eq!(p.bin(MethodKind::Virtual).count(), 1);
}

#[test]
fn test_virtual_site_with_two_candidates() {
    let f = list_vocab();
    let mut p = program();
    let main = p.add_static_method("void main()", "e", "x").unwrap();
    let m1 = p.add_virtual_method("void A.run()", "e", "x").unwrap();
    let m2 = p.add_virtual_method("void B.run()", "e", "x").unwrap();
    let args = vec!["o".to_string()];
    for (callee, tag) in [(m1, "A"), (m2, "B")] {
        p.add_virtual_invocation(
            main,
            &args,
            "L1",
            "L2",
            callee,
            named(&format!("call {tag}")),
            named(&format!("ret {tag}")),
            named(&format!("guard {tag}")),
        )
        .unwrap();
    }
    p.add_intra_stmt(main, "e", "L1", skip()).unwrap();
    p.set_main(main).unwrap();
    let consumer = RecordingConsumer::new();
    p.set_event_consumer(Box::new(consumer.clone()));
    p.complete_definitions();

    let site = p.method(main).unwrap().node("L1").unwrap();
    let callees = p.virtual_callees(main, site).unwrap();
    assert_eq!(callees, vec![m1, m2]);

    let mut triples = BTreeSet::new();
    for &callee in &callees {
        assert!(p.is_virtual_call_site_of(main, site, callee));
        assert!(p.is_call_site_of(main, site, callee));
        triples.insert((
            p.call_action(main, site, callee).unwrap().title().to_string(),
            p.guard_action(main, site, callee).unwrap().title().to_string(),
            p.ret_action(main, site, callee).unwrap().title().to_string(),
        ));
    }
    assert_eq!(triples.len(), 2);
    assert!(triples.contains(&("call A".into(), "guard A".into(), "ret A".into())));

    // a virtual site is not a static one
    assert!(matches!(p.static_callee(main, site), Err(EngineError::StructuralMisuse(_))));

    let (changed, _) = p
        .add_structure(main, site, ThreeValuedStructure::new(f.vocab))
        .unwrap();
    assert!(changed);
    let targets: Vec<_> = consumer
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::VirtualCall { callee, .. } => Some(callee),
            _ => None,
        })
        .collect();
    assert_eq!(targets, vec![m1, m2]);
}

#[test]
fn test_call_into_wrong_kind_rejected() {
    let mut p = program();
    let main = p.add_static_method("void main()", "e", "x").unwrap();
    let ctor = p.add_constructor("A()", "e", "x").unwrap();
    let err = p
        .add_virtual_invocation(main, &[], "L1", "L2", ctor, skip(), skip(), skip())
        .unwrap_err();
    assert!(matches!(err, EngineError::StructuralMisuse(_)));
    p.add_constructor_invocation(main, &[], "L1", "L2", ctor, skip(), skip())
        .unwrap();
    let site = p.method(main).unwrap().node("L1").unwrap();
    assert_eq!(p.constructor_callee(main, site).unwrap(), ctor);
    assert!(p.is_constructor_call_site_of(main, site, ctor));
    assert!(p.guard_action(main, site, ctor).is_err());
}

fn edges_from(p: &Program, method: MethodId, label: &str) -> usize {
    let site = p.method(method).unwrap().node(label).unwrap();
    p.following_edges(method, site).unwrap().len()
}

#[test]
fn test_second_call_at_site_leaves_cfg_unchanged() {
    let mut p = program();
    let main = p.add_static_method("void main()", "e", "x").unwrap();
    let g = p.add_static_method("void g()", "e", "x").unwrap();
    let h = p.add_static_method("void h()", "e", "x").unwrap();
    let ctor = p.add_constructor("A()", "e", "x").unwrap();
    let other = p.add_constructor("B()", "e", "x").unwrap();

    p.add_static_invocation(main, &[], "L1", "L2", g, skip(), skip())
        .unwrap();
    assert!(p
        .add_static_invocation(main, &[], "L1", "L3", h, skip(), skip())
        .is_err());
    assert!(p
        .add_static_invocation(main, &[], "L1", "L2", h, skip(), skip())
        .is_err());
    assert!(p
        .add_constructor_invocation(main, &[], "L1", "L3", ctor, skip(), skip())
        .is_err());
    assert_eq!(edges_from(&p, main, "L1"), 1);
    assert_eq!(p.method(main).unwrap().node("L3"), None);

    p.add_constructor_invocation(main, &[], "K1", "K2", ctor, skip(), skip())
        .unwrap();
    assert!(p
        .add_constructor_invocation(main, &[], "K1", "K3", other, skip(), skip())
        .is_err());
    assert_eq!(edges_from(&p, main, "K1"), 1);
    assert_eq!(p.method(main).unwrap().node("K3"), None);

    let l1 = p.method(main).unwrap().node("L1").unwrap();
    let k1 = p.method(main).unwrap().node("K1").unwrap();
    assert_eq!(p.static_callee(main, l1).unwrap(), g);
    assert_eq!(p.constructor_callee(main, k1).unwrap(), ctor);
    assert_eq!(p.matching_return_node(main, l1).unwrap(), p.method(main).unwrap().node("L2").unwrap());
    assert_eq!(p.interproc().call_site_count(), 2);
}

#[test]
fn test_virtual_site_rejects_other_call_kinds() {
    let mut p = program();
    let main = p.add_static_method("void main()", "e", "x").unwrap();
    let run = p.add_virtual_method("void A.run()", "e", "x").unwrap();
    let g = p.add_static_method("void g()", "e", "x").unwrap();
    let ctor = p.add_constructor("A()", "e", "x").unwrap();

    p.add_virtual_invocation(main, &[], "L1", "L2", run, skip(), skip(), skip())
        .unwrap();
    let err = p
        .add_static_invocation(main, &[], "L1", "L2", g, skip(), skip())
        .unwrap_err();
    assert!(matches!(err, EngineError::StructuralMisuse(_)));
    let err = p
        .add_constructor_invocation(main, &[], "L1", "L2", ctor, skip(), skip())
        .unwrap_err();
    assert!(matches!(err, EngineError::StructuralMisuse(_)));
    // the same candidate twice
    let err = p
        .add_virtual_invocation(main, &[], "L1", "L2", run, skip(), skip(), skip())
        .unwrap_err();
    assert!(matches!(err, EngineError::Registration(_)));

    assert_eq!(edges_from(&p, main, "L1"), 1);
    let site = p.method(main).unwrap().node("L1").unwrap();
    assert_eq!(p.virtual_callees(main, site).unwrap(), vec![run]);
    assert!(!p.is_static_call_site_of(main, site, g));
    assert!(!p.is_constructor_call_site_of(main, site, ctor));
}

#[test]
fn test_summaries_never_repeat_pairs() {
    let f = list_vocab();
    let mut p = program();
    let m = p.add_static_method("void f()", "e", "x").unwrap();
    p.add_intra_stmt(m, "e", "x", skip()).unwrap();
    p.complete_definitions();
    let (entry, exit) = {
        let ts = p.method(m).unwrap();
        (ts.entry(), ts.exit())
    };

    let mut seen = BTreeSet::new();
    let mut entries = Vec::new();
    for i in 0..3usize {
        let s = StructureBuilder::new(&f.vocab).nodes(i).build();
        let (_, e) = p.add_structure(m, entry, s.clone()).unwrap();
        let (_, x) = p.add_structure(m, exit, s).unwrap();
        p.add_transition(m, entry, e, exit, x).unwrap();
        entries.push(e);

        let delta = p.update_summary(m).unwrap().unwrap();
        for pair in &delta.added {
            assert!(seen.insert(*pair), "pair {:?} reported twice", pair);
        }
        assert!(p.update_summary(m).unwrap().is_none());
    }
    assert_eq!(seen.len(), 3);
    for e in entries {
        assert_eq!(p.known_effect(m, e).unwrap().len(), 1);
    }
}

#[test]
fn test_partial_join_refreshes_summary() {
    let mut builder = VocabularyBuilder::new();
    let x = builder.unary("x").unwrap();
    let y = builder.declare("y", 1, false).unwrap();
    let vocab = builder.freeze();
    let config = AnalysisConfig::default().with_join(JoinMode::Partial);
    let mut p: Program = ProgramTs::new(&config);
    let m = p.add_static_method("void f()", "e", "x").unwrap();
    p.add_intra_stmt(m, "e", "x", skip()).unwrap();
    p.complete_definitions();
    let (entry, exit) = {
        let ts = p.method(m).unwrap();
        (ts.entry(), ts.exit())
    };

    let build = |value: Kleene| {
        StructureBuilder::new(&vocab)
            .nodes(1)
            .unary(x, 0, Kleene::True)
            .unary(y, 0, value)
            .build()
    };
    let (_, e) = p.add_structure(m, entry, build(Kleene::True)).unwrap();
    let (_, out) = p.add_structure(m, exit, build(Kleene::True)).unwrap();
    p.add_transition(m, entry, e, exit, out).unwrap();
    let first = p.update_summary(m).unwrap().unwrap();
    assert_eq!(first.added, vec![(e, out)]);

    // y widens to unknown at the exit; same fact, more precise summary needed
    let (changed, widened) = p.add_structure(m, exit, build(Kleene::False)).unwrap();
    assert!(changed);
    assert_eq!(widened, out);
    let second = p.update_summary(m).unwrap().unwrap();
    assert!(second.added.is_empty());
    assert_eq!(second.refreshed, vec![(e, out)]);
    let merged = p.structure(m, out).unwrap().unwrap();
    assert_eq!(merged.eval(y, &[merged.nodes()[0]]), Kleene::Unknown);
}

#[test]
fn test_static_call_round_trip() {
    let f = list_vocab();
    let reserved = *f.vocab.reserved();
    let v = Var(0);
    let ret = Arc::new(ActionInstance::from_action(Action::new("ret f").with_update(
        reserved.kill,
        vec![v],
        Formula::unary(reserved.in_ux, v),
    )));

    let mut p = program();
    let main = p.add_static_method("void main()", "m_entry", "m_exit").unwrap();
    let callee = p.add_static_method("void f()", "f_entry", "f_exit").unwrap();
    p.add_intra_stmt(main, "m_entry", "L1", skip()).unwrap();
    p.add_static_invocation(main, &[], "L1", "L2", callee, named("call f"), ret)
        .unwrap();
    p.add_intra_stmt(main, "L2", "m_exit", skip()).unwrap();
    p.add_intra_stmt(callee, "f_entry", "f_exit", Arc::new(clear("x = null", f.x)))
        .unwrap();
    p.set_main(main).unwrap();
    let consumer = RecordingConsumer::new();
    p.set_event_consumer(Box::new(consumer.clone()));
    p.complete_definitions();

    let mut interp = AbstractInterpreter::new(&AnalysisConfig::default()).unwrap();
    let mut msgs = StructureMessages::new();
    let seed = StructureBuilder::new(&f.vocab)
        .nodes(1)
        .unary(f.x, 0, Kleene::True)
        .build();
    let seeded = p.init_analysis(vec![seed.clone()]).unwrap();
    assert_eq!(seeded.len(), 1);

    let (m_entry, l1) = {
        let ts = p.method(main).unwrap();
        (ts.entry(), ts.node("L1").unwrap())
    };
    assert_eq!(p.method(main).unwrap().ts_node(l1).unwrap().kind(), NodeKind::StaticCallSite);

    // main: entry -> L1
    let (_, c0) = p.add_structure(main, l1, seed.clone()).unwrap();
    p.add_transition(main, m_entry, seeded[0], l1, c0).unwrap();

    // call into f
    assert_eq!(p.static_callee(main, l1).unwrap(), callee);
    let call = p.call_action(main, l1, callee).unwrap();
    let at = ProgramPoint::new("L1").with_input(c0.to_string());
    let entered = interp.apply_call(&call, &seed, &at, &mut msgs).unwrap();
    let (f_entry, f_exit) = {
        let ts = p.method(callee).unwrap();
        (ts.entry(), ts.exit())
    };
    let (_, fe) = p.add_structure(callee, f_entry, entered[0].clone()).unwrap();
    assert!(p.update_calling_ctxs(callee, &[fe], main, l1, c0, &[c0]).unwrap());

    // f body
    let body = {
        let edges = p.following_edges(callee, f_entry).unwrap();
        assert_eq!(edges.len(), 1);
        edges[0].1.action().cloned().unwrap()
    };
    let exited = interp
        .apply_intra(&body, &entered[0], &ProgramPoint::new("f_entry"), &mut msgs)
        .unwrap();
    let (_, fx) = p.add_structure(callee, f_exit, exited[0].clone()).unwrap();
    p.add_transition(callee, f_entry, fe, f_exit, fx).unwrap();
    let delta = p.update_summary(callee).unwrap().unwrap();
    assert_eq!(delta.added, vec![(fe, fx)]);
    assert_eq!(p.known_effect(callee, fe).unwrap(), vec![fx]);

    // return to every recorded caller
    let context = p.calling_context(callee, fe).unwrap();
    let ctx = *context.basic_contexts().next().unwrap();
    assert_eq!((ctx.caller, ctx.site, ctx.call_fact), (main, l1, c0));
    let call_side = p.structure(main, c0).unwrap().unwrap().clone();
    let exit_side = p.structure(callee, fx).unwrap().unwrap().clone();
    let ret = p.ret_action(main, l1, callee).unwrap();
    let returned = interp
        .apply_ret(&ret, &call_side, &exit_side, &ProgramPoint::new("L2"), &mut msgs)
        .unwrap();
    assert_eq!(returned.len(), 1);
    assert_eq!(returned[0].node_count(), 1);
    assert_eq!(returned[0].eval(f.x, &[returned[0].nodes()[0]]), Kleene::True);

    let l2 = p.matching_return_node(main, l1).unwrap();
    let (_, r0) = p.add_structure(main, l2, returned[0].clone()).unwrap();
    assert!(p.add_transition(main, l1, c0, l2, r0).unwrap());
    assert!(!p.add_transition(main, l1, c0, l2, r0).unwrap());

    assert_eq!(p.callers(callee).into_iter().collect::<Vec<_>>(), vec![main]);
    let kinds: Vec<_> = consumer.events().iter().map(Event::kind_name).collect();
    assert_eq!(
        kinds,
        vec![
            "intra",
            "static-call",
            "transition",
            "intra",
            "intra",
            "transition",
            "ret",
            "intra",
            "transition",
        ]
    );
    assert_eq!(interp.statistics().combines, 1);
    assert!(p.statistics_report().contains("void f()"));
}
