use std::sync::Arc;
use tokio::sync::watch;

use crate::domain::entities::Message;

/// Messages at positions `[cursor, end)` taken under one lock
#[derive(Debug, Default)]
pub struct LogSnapshot {
    pub messages: Vec<Arc<Message>>,
    pub end: usize,
}

/// Store trait - the append-only, globally ordered message log
pub trait MessageStore: Send + Sync {
    /// Append a message and wake every subscriber. Returns its position.
    fn append(&self, message: Message) -> usize;

    /// Everything from `cursor` to the current end.
    ///
    /// A cursor past the end yields an empty snapshot.
    fn read_from(&self, cursor: usize) -> LogSnapshot;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Change feed carrying the log length after each append
    fn subscribe(&self) -> watch::Receiver<usize>;
}
