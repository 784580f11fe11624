//! Test fixtures

use shapegraph_engine::features::semantics::domain::{Action, ActionInstance};
use shapegraph_engine::features::structure::{Formula, Var};
use shapegraph_engine::features::vocabulary::{PredicateId, Vocabulary, VocabularyBuilder};
use std::sync::Arc;

/// A small list vocabulary: `x`, `y` abstraction variables, `a` abstraction
/// marker, `n` next field, `g` a nullary flag
#[derive(Debug, Clone)]
pub struct ListVocab {
    pub vocab: Arc<Vocabulary>,
    pub x: PredicateId,
    pub y: PredicateId,
    pub a: PredicateId,
    pub n: PredicateId,
    pub g: PredicateId,
}

pub fn list_vocab() -> ListVocab {
    let mut builder = VocabularyBuilder::new();
    let x = builder.unary("x").unwrap();
    let y = builder.unary("y").unwrap();
    let a = builder.unary("a").unwrap();
    let n = builder.binary("n").unwrap();
    let g = builder.nullary("g").unwrap();
    ListVocab {
        vocab: builder.freeze(),
        x,
        y,
        a,
        n,
        g,
    }
}

pub fn skip() -> Arc<ActionInstance> {
    Arc::new(ActionInstance::skip())
}

/// `p(v) := false` for every node
pub fn clear(title: &str, p: PredicateId) -> ActionInstance {
    let v = Var(0);
    ActionInstance::from_action(Action::new(title).with_update(p, vec![v], Formula::falsity()))
}

pub fn named(title: &str) -> Arc<ActionInstance> {
    Arc::new(ActionInstance::from_action(Action::skip(title)))
}
