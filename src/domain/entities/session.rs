use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use super::{Message, UserRef};
use crate::application::messaging::Debounce;
use crate::domain::traits::MessageStore;

/// Identifier of one connection's session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Lifecycle of a session. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Active,
    Closing,
    Closed,
}

/// Per-connection state: who is talking, how much of the log they have
/// seen, and whether they are currently debounced.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    user: UserRef,
    cursor: usize,
    state: SessionState,
    limiter: Debounce,
}

impl Session {
    pub fn new(id: SessionId, user: UserRef, limiter: Debounce) -> Self {
        Self {
            id,
            user,
            cursor: 0,
            state: SessionState::Connecting,
            limiter,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn user(&self) -> &UserRef {
        &self.user
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_alive(&self) -> bool {
        matches!(self.state, SessionState::Connecting | SessionState::Active)
    }

    pub fn activate(&mut self) {
        if self.state == SessionState::Connecting {
            self.state = SessionState::Active;
        }
    }

    /// Move to `Closing`. Returns false if the session was already closing.
    pub fn begin_close(&mut self) -> bool {
        if self.is_alive() {
            self.state = SessionState::Closing;
            true
        } else {
            false
        }
    }

    pub fn close(&mut self) {
        self.state = SessionState::Closed;
    }

    /// Check the debounce window for a freshly received line
    pub fn admit_input(&mut self, now: Instant) -> bool {
        self.limiter.admit(now)
    }

    /// Read everything past the cursor and advance the cursor to the end of
    /// that same snapshot, so nothing is skipped or delivered twice.
    pub fn take_unseen(&mut self, store: &dyn MessageStore) -> Vec<Arc<Message>> {
        let snapshot = store.read_from(self.cursor);
        self.cursor = self.cursor.max(snapshot.end);
        snapshot.messages
    }
}
