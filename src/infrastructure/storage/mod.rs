//! In-memory message log

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

use crate::domain::entities::Message;
use crate::domain::traits::{LogSnapshot, MessageStore};

/// Process-wide append-only log.
///
/// One mutex serializes appends and reads; the watch channel carries the
/// new length to every session after each append. Sending on a watch
/// channel never waits on receivers, so a stalled session cannot hold up
/// the appender.
pub struct InMemoryLog {
    messages: Mutex<Vec<Arc<Message>>>,
    notify: watch::Sender<usize>,
}

impl InMemoryLog {
    pub fn new() -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            messages: Mutex::new(Vec::new()),
            notify,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<Message>>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryLog {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageStore for InMemoryLog {
    fn append(&self, message: Message) -> usize {
        let mut messages = self.lock();
        let position = messages.len();
        tracing::debug!("log[{}] {} from {}", position, message.id, message.author);
        messages.push(Arc::new(message));
        // Published under the lock so subscribers only ever see lengths grow.
        self.notify.send_replace(messages.len());
        position
    }

    fn read_from(&self, cursor: usize) -> LogSnapshot {
        let messages = self.lock();
        let end = messages.len();
        let start = cursor.min(end);
        LogSnapshot {
            messages: messages[start..].to_vec(),
            end,
        }
    }

    fn len(&self) -> usize {
        self.lock().len()
    }

    fn subscribe(&self) -> watch::Receiver<usize> {
        self.notify.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{IdentityKey, User, UserId, UserRef};
    use std::collections::HashSet;

    fn author(id: u64) -> UserRef {
        Arc::new(User::new(UserId(id), format!("user{}", id), IdentityKey::new(id.to_string()), "red"))
    }

    #[test]
    fn test_append_returns_positions_in_order() {
        let log = InMemoryLog::new();
        let a = author(1);
        assert_eq!(log.append(Message::new(a.clone(), "first")), 0);
        assert_eq!(log.append(Message::new(a, "second")), 1);
        assert_eq!(log.len(), 2);

        let snapshot = log.read_from(1);
        assert_eq!(snapshot.end, 2);
        assert_eq!(snapshot.messages.len(), 1);
        assert_eq!(snapshot.messages[0].content, "second");
    }

    #[test]
    fn test_read_past_end_is_empty() {
        let log = InMemoryLog::new();
        let snapshot = log.read_from(5);
        assert!(snapshot.messages.is_empty());
        assert_eq!(snapshot.end, 0);
    }

    #[tokio::test]
    async fn test_append_notifies_subscribers() {
        let log = InMemoryLog::new();
        let mut rx = log.subscribe();
        log.append(Message::new(author(1), "ping"));
        rx.changed().await.expect("sender alive");
        assert_eq!(*rx.borrow(), 1);
    }

    #[test]
    fn test_concurrent_appends_are_all_kept_once() {
        let log = Arc::new(InMemoryLog::new());
        let writers: u64 = 8;
        let per_writer: u64 = 250;

        let handles: Vec<_> = (0..writers)
            .map(|w| {
                let log = Arc::clone(&log);
                std::thread::spawn(move || {
                    let me = author(w);
                    for i in 0..per_writer {
                        log.append(Message::new(me.clone(), format!("{}-{}", w, i)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("writer thread panicked");
        }

        let snapshot = log.read_from(0);
        assert_eq!(snapshot.end, (writers * per_writer) as usize);
        let unique: HashSet<_> = snapshot.messages.iter().map(|m| m.content.clone()).collect();
        assert_eq!(unique.len(), snapshot.end);
    }
}
