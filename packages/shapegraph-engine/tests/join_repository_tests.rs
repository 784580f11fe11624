//! Join repository: fact identity, idempotence, reserved slot

mod common;

use common::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use shapegraph_engine::config::JoinMode;
use shapegraph_engine::features::join::{RepositoryId, StateStore, StructureIndex, StructureRepository};
use shapegraph_engine::features::structure::ThreeValuedStructure;
use shapegraph_engine::shared::models::Kleene;

/// The same structure built with its nodes created in the opposite order
fn mirrored(values: &[(u8, u8)], reverse: bool) -> ThreeValuedStructure {
    let f = list_vocab();
    let mut order: Vec<usize> = (0..values.len()).collect();
    if reverse {
        order.reverse();
    }
    let mut builder = StructureBuilder::new(&f.vocab).nodes(values.len());
    for (slot, &i) in order.iter().enumerate() {
        let (x, a) = values[i];
        builder = builder
            .unary(f.x, slot, Kleene::from_u8(x % 3).unwrap())
            .unary(f.a, slot, Kleene::from_u8(a % 3).unwrap());
    }
    builder.build()
}

#[test]
fn test_isomorphic_structures_share_one_fact() {
    for mode in [JoinMode::Relational, JoinMode::Partial] {
        let values = [(2, 0), (0, 2), (1, 1)];
        let first = mirrored(&values, false);
        let second = mirrored(&values, true);

        let mut store = StateStore::new(RepositoryId(3), mode);
        let state = store.allocate_state();
        let (changed, fact) = store.add_structure(state, first.clone()).unwrap();
        assert!(changed);
        let (changed, again) = store.add_structure(state, second.clone()).unwrap();
        assert!(!changed);
        assert_eq!(fact, again);
        assert!(store.contains_fact(fact));
        assert_eq!(store.fact_for_existing(state, &first), Some(fact));
        assert_eq!(store.fact_for_existing(state, &second), Some(fact));
        assert_eq!(store.structures(state).len(), 1);
    }
}

#[test]
fn test_repository_slot_zero_is_bottom() {
    let f = list_vocab();
    let mut repo = StructureRepository::new(RepositoryId(1));
    assert!(repo.get(StructureIndex::BOTTOM).is_none());
    let first = repo.add(ThreeValuedStructure::new(f.vocab.clone()));
    let second = repo.add(ThreeValuedStructure::new(f.vocab));
    assert_eq!(first, StructureIndex(1));
    assert_eq!(second, StructureIndex(2));
    assert!(repo.iter().all(|(index, _)| !index.is_bottom()));
    assert_eq!(repo.len(), 2);
}

#[test]
fn test_facts_from_different_states_differ() {
    let f = list_vocab();
    let s = ThreeValuedStructure::new(f.vocab);
    let mut store = StateStore::new(RepositoryId(0), JoinMode::Relational);
    let a = store.allocate_state();
    let b = store.allocate_state();
    let (_, fa) = store.add_structure(a, s.clone()).unwrap();
    let (_, fb) = store.add_structure(b, s).unwrap();
    assert_ne!(fa, fb);
    assert!(fa.structure != fb.structure);
}

proptest! {
    #[test]
    fn prop_join_is_idempotent(values in prop::collection::vec((0u8..3, 0u8..3), 0..4)) {
        let mut store = StateStore::new(RepositoryId(0), JoinMode::Relational);
        let state = store.allocate_state();
        let (_, first) = store.add_structure(state, mirrored(&values, false)).unwrap();
        let (changed, second) = store.add_structure(state, mirrored(&values, true)).unwrap();
        prop_assert!(!changed);
        prop_assert_eq!(first, second);
        prop_assert_eq!(store.structure_count(), 1);
    }
}
