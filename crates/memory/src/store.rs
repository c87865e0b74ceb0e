//! Process-wide conversation history.
//!
//! Appends are never rejected and never evict. Readers only ever see the
//! tail of the history: [`ConversationStore::snapshot`] is capped at the
//! configured window.

use parking_lot::RwLock;

pub const DEFAULT_WINDOW: usize = 5;

pub struct ConversationStore<R> {
    records: RwLock<Vec<R>>,
    window: usize,
}

impl<R: Clone> ConversationStore<R> {
    pub fn new(window: usize) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            window,
        }
    }

    /// Append a fully constructed record. The write lock is held only for
    /// the push, so readers observe either the old or the new prefix.
    pub fn append(&self, record: R) {
        let mut records = self.records.write();
        records.push(record);
        tracing::debug!("Conversation history now holds {} records", records.len());
    }

    /// Last `n` records, oldest first.
    pub fn recent(&self, n: usize) -> Vec<R> {
        let records = self.records.read();
        let start = records.len().saturating_sub(n);
        records[start..].to_vec()
    }

    /// The externally visible view: the last `window` records.
    pub fn snapshot(&self) -> Vec<R> {
        self.recent(self.window)
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl<R: Clone> Default for ConversationStore<R> {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
