//! Common test utilities for shapegraph-engine
//!
//! Shared vocabularies, structure builders and action helpers for the
//! integration tests.

#![allow(dead_code)]

mod builders;
mod fixtures;

pub use builders::*;
pub use fixtures::*;
