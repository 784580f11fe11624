//! Error types for shapegraph-engine
//!
//! Caller-contract violations fail fast at construction/registration time.
//! The only error raised while the fixpoint runs is the coerce-after-update
//! abort, which means an update formula broke a declared integrity constraint.

use crate::config::ConfigError;
use thiserror::Error;

/// Main error type for engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    /// Method registration or program-level setup error
    #[error("Registration error: {0}")]
    Registration(String),

    /// Caller violated a structural contract (node types, edges, call kinds)
    #[error("Structural misuse: {0}")]
    StructuralMisuse(String),

    /// Action macro referenced but never defined
    #[error("Undefined action macro: {0}")]
    UndefinedMacro(String),

    /// Formula names a predicate the vocabulary does not know
    #[error("Undefined predicate: {0}")]
    UndefinedPredicate(String),

    /// Coerce failed after update with break-on-failure enabled
    #[error(
        "Coerce after update failed for action {action} at {location}\ninput:\n{input}\nupdated:\n{output}"
    )]
    CoerceAfterUpdate {
        action: String,
        location: String,
        input: String,
        output: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl EngineError {
    pub fn registration(msg: impl Into<String>) -> Self {
        EngineError::Registration(msg.into())
    }

    pub fn misuse(msg: impl Into<String>) -> Self {
        EngineError::StructuralMisuse(msg.into())
    }

    pub fn undefined_macro(name: impl Into<String>) -> Self {
        EngineError::UndefinedMacro(name.into())
    }

    pub fn undefined_predicate(name: impl Into<String>) -> Self {
        EngineError::UndefinedPredicate(name.into())
    }

    /// True for the fatal abort raised during the fixpoint
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::CoerceAfterUpdate { .. })
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::registration("method foo() already defined");
        assert_eq!(
            err.to_string(),
            "Registration error: method foo() already defined"
        );

        let err = EngineError::CoerceAfterUpdate {
            action: "x = null".to_string(),
            location: "L1".to_string(),
            input: "in".to_string(),
            output: "out".to_string(),
        };
        assert!(err.is_fatal());
        assert!(err.to_string().contains("x = null"));
        assert!(err.to_string().contains("L1"));
    }

    #[test]
    fn test_non_fatal_errors() {
        assert!(!EngineError::misuse("conflicting types").is_fatal());
        assert!(!EngineError::undefined_macro("Foo").is_fatal());
    }
}
