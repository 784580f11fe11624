//! Shared models

mod kleene;

pub use kleene::Kleene;
