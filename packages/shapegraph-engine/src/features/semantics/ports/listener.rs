//! Diagnostic listener port

use crate::features::semantics::domain::MessageRecord;
use std::cell::RefCell;
use std::rc::Rc;

/// Receives one record whenever message formulas fire
pub trait AnalysisListener {
    fn on_messages(&mut self, record: &MessageRecord);
}

/// Keeps every record; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct CollectingListener {
    records: Rc<RefCell<Vec<MessageRecord>>>,
}

impl CollectingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<MessageRecord> {
        self.records.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl AnalysisListener for CollectingListener {
    fn on_messages(&mut self, record: &MessageRecord) {
        self.records.borrow_mut().push(record.clone());
    }
}
