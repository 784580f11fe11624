//! Action macros and their instantiations
//!
//! An analysis defines macros such as `Copy_Var(lhs, rhs)` whose formulas
//! name predicates either directly or through a formal parameter. An
//! `ActionInstance` binds a macro to actual arguments (predicate names) and is
//! identified by `name(arg1,arg2)`. Instances are cached in a bounded LRU.

use super::action::Action;
use crate::errors::{EngineError, Result};
use crate::features::vocabulary::{PredicateId, Vocabulary};
use lru::LruCache;
use rustc_hash::FxHashMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

/// Predicate reference inside a macro body
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PredSym {
    /// A predicate of the vocabulary
    Named(String),
    /// The actual argument at this position
    Param(usize),
}

impl fmt::Display for PredSym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredSym::Named(name) => f.write_str(name),
            PredSym::Param(i) => write!(f, "${}", i),
        }
    }
}

/// Macro definition: formal parameters plus a templated body.
///
/// `{param}` occurrences in the body's title are replaced by the actual
/// argument.
#[derive(Debug, Clone)]
pub struct ActionDefinition {
    name: String,
    params: Vec<String>,
    body: Action<PredSym>,
}

impl ActionDefinition {
    pub fn new(name: impl Into<String>, params: Vec<String>, body: Action<PredSym>) -> Self {
        Self {
            name: name.into(),
            params,
            body,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Compile the body for `args`, resolving every predicate name
    pub fn instantiate(&self, args: &[String], vocabulary: &Vocabulary) -> Result<Action> {
        if args.len() != self.params.len() {
            return Err(EngineError::misuse(format!(
                "macro {} expects {} arguments, got {}",
                self.name,
                self.params.len(),
                args.len()
            )));
        }
        let mut title = self.body.title().to_string();
        for (param, arg) in self.params.iter().zip(args) {
            title = title.replace(&format!("{{{}}}", param), arg);
        }
        self.body.try_map(title, &mut |sym: &PredSym| -> Result<PredicateId> {
            match sym {
                PredSym::Named(name) => vocabulary.require(name),
                PredSym::Param(i) => match args.get(*i) {
                    Some(arg) => vocabulary.require(arg),
                    None => Err(EngineError::misuse(format!(
                        "macro {} refers to missing parameter {}",
                        self.name, i
                    ))),
                },
            }
        })
    }
}

/// A macro bound to concrete arguments
#[derive(Debug)]
pub struct ActionInstance {
    macro_name: String,
    args: Vec<String>,
    id: String,
    action: Arc<Action>,
}

impl ActionInstance {
    pub fn new(macro_name: impl Into<String>, args: Vec<String>, action: Action) -> Self {
        let macro_name = macro_name.into();
        let id = instance_id(&macro_name, &args);
        Self {
            macro_name,
            args,
            id,
            action: Arc::new(action),
        }
    }

    /// Instance of an inline action that has no macro behind it
    pub fn from_action(action: Action) -> Self {
        let name = action.title().to_string();
        Self::new(name, Vec::new(), action)
    }

    pub fn skip() -> Self {
        Self::from_action(Action::skip("skip"))
    }

    /// `name(arg1,arg2)`
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn macro_name(&self, with_args: bool) -> String {
        if with_args {
            self.id.clone()
        } else {
            self.macro_name.clone()
        }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn title(&self) -> &str {
        self.action.title()
    }

    pub fn is_skip(&self) -> bool {
        self.action.is_skip()
    }
}

impl fmt::Display for ActionInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

pub fn instance_id(macro_name: &str, args: &[String]) -> String {
    format!("{}({})", macro_name, args.join(","))
}

/// Bounded LRU cache of instances keyed by id
pub struct ActionCache {
    cache: LruCache<String, Arc<ActionInstance>>,
    hits: usize,
    misses: usize,
}

impl ActionCache {
    pub fn new(capacity: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity)
            .ok_or_else(|| EngineError::misuse("action cache capacity must be > 0"))?;
        Ok(Self {
            cache: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        })
    }

    pub fn get(&mut self, id: &str) -> Option<Arc<ActionInstance>> {
        match self.cache.get(id) {
            Some(instance) => {
                self.hits += 1;
                Some(Arc::clone(instance))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, instance: Arc<ActionInstance>) {
        self.cache.put(instance.id().to_string(), instance);
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}

impl fmt::Debug for ActionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ActionCache: {} entries, {} hits, {} misses",
            self.cache.len(),
            self.hits,
            self.misses
        )
    }
}

/// Macro definitions of one analysis plus the instance cache
#[derive(Debug)]
pub struct ActionLibrary {
    vocabulary: Arc<Vocabulary>,
    definitions: FxHashMap<String, ActionDefinition>,
    cache: ActionCache,
}

impl ActionLibrary {
    pub fn new(vocabulary: Arc<Vocabulary>, cache_capacity: usize) -> Result<Self> {
        Ok(Self {
            vocabulary,
            definitions: FxHashMap::default(),
            cache: ActionCache::new(cache_capacity)?,
        })
    }

    pub fn define(&mut self, definition: ActionDefinition) -> Result<()> {
        if self.definitions.contains_key(definition.name()) {
            return Err(EngineError::registration(format!(
                "action macro {} defined twice",
                definition.name()
            )));
        }
        self.definitions
            .insert(definition.name().to_string(), definition);
        Ok(())
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Every macro the program refers to must be defined before the
    /// fixpoint starts
    pub fn validate_expected<'a>(&self, expected: impl IntoIterator<Item = &'a str>) -> Result<()> {
        let mut missing: Vec<&str> = expected
            .into_iter()
            .filter(|name| !self.is_defined(name))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort_unstable();
        missing.dedup();
        Err(EngineError::undefined_macro(missing.join(", ")))
    }

    /// Cached instance of `name(args)`
    pub fn instance(&mut self, name: &str, args: &[&str]) -> Result<Arc<ActionInstance>> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let id = instance_id(name, &args);
        if let Some(instance) = self.cache.get(&id) {
            return Ok(instance);
        }
        let definition = self
            .definitions
            .get(name)
            .ok_or_else(|| EngineError::undefined_macro(name))?;
        let action = definition.instantiate(&args, &self.vocabulary)?;
        debug!(%id, "instantiated action macro");
        let instance = Arc::new(ActionInstance::new(name, args, action));
        self.cache.insert(Arc::clone(&instance));
        Ok(instance)
    }

    pub fn cache(&self) -> &ActionCache {
        &self.cache
    }

    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocabulary
    }
}
