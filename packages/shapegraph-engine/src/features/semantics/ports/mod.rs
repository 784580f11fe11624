pub mod listener;

pub use listener::{AnalysisListener, CollectingListener};
