pub mod event_consumer;

pub use event_consumer::{Event, EventConsumer, RecordingConsumer};
