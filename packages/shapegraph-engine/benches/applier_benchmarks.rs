//! Applier throughput on list-shaped structures
//!
//! Measures one intra step (focus, update, coerce, blur) and one
//! combine-and-return step as the heap grows.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use shapegraph_engine::features::semantics::domain::{Action, ActionInstance, StructureMessages};
use shapegraph_engine::features::semantics::{AbstractInterpreter, ProgramPoint};
use shapegraph_engine::features::structure::{AbstractStructure, Formula, ThreeValuedStructure, Var};
use shapegraph_engine::features::vocabulary::{PredicateId, VocabularyBuilder};
use shapegraph_engine::{AnalysisConfig, Kleene, Preset};

struct ListFixture {
    structure: ThreeValuedStructure,
    x: PredicateId,
    y: PredicateId,
}

/// `x` points to the head of an `n`-linked list of `len` concrete nodes
fn list(len: usize) -> ListFixture {
    let mut builder = VocabularyBuilder::new();
    let x = builder.unary("x").unwrap();
    let y = builder.unary("y").unwrap();
    let n = builder.binary("n").unwrap();
    let mut s = ThreeValuedStructure::new(builder.freeze());
    let nodes: Vec<_> = (0..len).map(|_| s.new_node()).collect();
    if let Some(head) = nodes.first() {
        s.update(x, &[*head], Kleene::True);
    }
    for pair in nodes.windows(2) {
        s.update(n, &[pair[0], pair[1]], Kleene::True);
    }
    ListFixture { structure: s, x, y }
}

// ============================================================================
// Intra
// ============================================================================

fn bench_copy_variable(c: &mut Criterion) {
    let mut group = c.benchmark_group("intra_copy_variable");
    let v = Var(0);

    for len in [1usize, 4, 16, 64] {
        let f = list(len);
        let action = ActionInstance::from_action(
            Action::new("y = x")
                .with_focus(Formula::unary(f.x, v))
                .with_update(f.y, vec![v], Formula::unary(f.x, v)),
        );
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &f, |b, f| {
            let mut interp = AbstractInterpreter::new(&AnalysisConfig::default()).unwrap();
            let point = ProgramPoint::new("L1");
            b.iter(|| {
                let mut msgs = StructureMessages::new();
                let out = interp
                    .apply_intra(&action, black_box(&f.structure), &point, &mut msgs)
                    .unwrap();
                black_box(out)
            });
        });
    }

    group.finish();
}

fn bench_presets(c: &mut Criterion) {
    let mut group = c.benchmark_group("intra_by_preset");
    let f = list(16);
    let v = Var(0);
    let action = ActionInstance::from_action(
        Action::new("y = x")
            .with_focus(Formula::unary(f.x, v))
            .with_update(f.y, vec![v], Formula::unary(f.x, v)),
    );

    for preset in [Preset::Fast, Preset::Balanced, Preset::Thorough] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{:?}", preset)),
            &preset,
            |b, &preset| {
                let mut interp =
                    AbstractInterpreter::new(&AnalysisConfig::from_preset(preset)).unwrap();
                let point = ProgramPoint::new("L1");
                b.iter(|| {
                    let mut msgs = StructureMessages::new();
                    black_box(
                        interp
                            .apply_intra(&action, &f.structure, &point, &mut msgs)
                            .unwrap(),
                    )
                });
            },
        );
    }

    group.finish();
}

// ============================================================================
// Combine
// ============================================================================

fn bench_return(c: &mut Criterion) {
    let mut group = c.benchmark_group("ret_combine");

    for len in [1usize, 8, 32] {
        let caller = list(len);
        let callee = list(len);
        let ret = ActionInstance::skip();
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, _| {
            let mut interp = AbstractInterpreter::new(&AnalysisConfig::default()).unwrap();
            let point = ProgramPoint::new("R1");
            b.iter(|| {
                let mut msgs = StructureMessages::new();
                black_box(
                    interp
                        .apply_ret(&ret, &caller.structure, &callee.structure, &point, &mut msgs)
                        .unwrap(),
                )
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_copy_variable, bench_presets, bench_return);
criterion_main!(benches);
