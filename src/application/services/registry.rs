//! Live session registry and identity table

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

use crate::application::errors::NameError;
use crate::domain::entities::{IdentityKey, SessionId, User, UserId, UserRef};

/// Result of resolving a connecting peer to a user
#[derive(Debug, Clone)]
pub struct Attachment {
    pub user: UserRef,
    /// True if the identity key was already known
    pub rejoined: bool,
}

struct SessionEntry {
    user: UserRef,
    outbox: mpsc::Sender<String>,
}

#[derive(Default)]
struct Inner {
    sessions: BTreeMap<SessionId, SessionEntry>,
    known: HashMap<IdentityKey, UserRef>,
    next_session: u64,
    next_user: u64,
    anonymous_counter: usize,
}

impl Inner {
    fn name_taken(&self, name: &str, except: Option<UserId>) -> bool {
        let sessions = self.sessions.values().map(|s| &s.user);
        let known = self.known.values();
        sessions
            .chain(known)
            .filter(|u| Some(u.id()) != except)
            .any(|u| u.name_matches_ignore_case(name))
    }
}

/// Every live session plus every identity ever seen.
///
/// All reads and writes go through one mutex, so name checks, renames and
/// broadcasts see a consistent set of sessions.
pub struct SessionRegistry {
    inner: Mutex<Inner>,
    palette: Vec<String>,
    anonymous_prefix: String,
    outbox_capacity: usize,
}

impl SessionRegistry {
    pub fn new(palette: Vec<String>, anonymous_prefix: impl Into<String>, outbox_capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            palette,
            anonymous_prefix: anonymous_prefix.into(),
            outbox_capacity: outbox_capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Re-attach to the user known under `key`, or create a new anonymous one
    pub fn attach(&self, key: IdentityKey) -> Attachment {
        let mut inner = self.lock();

        if let Some(user) = inner.known.get(&key) {
            return Attachment {
                user: Arc::clone(user),
                rejoined: true,
            };
        }

        let name = loop {
            inner.anonymous_counter += 1;
            let candidate = format!("{}{}", self.anonymous_prefix, inner.anonymous_counter);
            if !inner.name_taken(&candidate, None) {
                break candidate;
            }
        };
        let color = self
            .palette
            .get((inner.anonymous_counter - 1) % self.palette.len().max(1))
            .cloned()
            .unwrap_or_else(|| "black".to_string());

        inner.next_user += 1;
        let user = Arc::new(User::new(UserId(inner.next_user), name, key.clone(), color));
        inner.known.insert(key, Arc::clone(&user));

        Attachment { user, rejoined: false }
    }

    /// Register a live session for `user` and hand back its outbox
    pub fn open(&self, user: UserRef) -> (SessionId, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(self.outbox_capacity);
        let mut inner = self.lock();
        inner.next_session += 1;
        let id = SessionId(inner.next_session);
        inner.sessions.insert(id, SessionEntry { user, outbox: tx });
        (id, rx)
    }

    /// Remove a session. Returns false if it was not registered.
    pub fn close(&self, id: SessionId) -> bool {
        self.lock().sessions.remove(&id).is_some()
    }

    pub fn is_open(&self, id: SessionId) -> bool {
        self.lock().sessions.contains_key(&id)
    }

    pub fn active_count(&self) -> usize {
        self.lock().sessions.len()
    }

    /// Display names of live sessions, oldest session first
    pub fn active_names(&self) -> Vec<String> {
        self.lock()
            .sessions
            .values()
            .map(|s| s.user.display_name())
            .collect()
    }

    /// Exact, case-sensitive lookup among live sessions
    pub fn find_active(&self, name: &str) -> Option<UserRef> {
        self.lock()
            .sessions
            .values()
            .find(|s| s.user.display_name() == name)
            .map(|s| Arc::clone(&s.user))
    }

    /// Rename `user` if no other identity holds the name (case-insensitive).
    ///
    /// Check and rename happen under the same lock. Returns the old name.
    pub fn rename(&self, user: &UserRef, new_name: &str) -> Result<String, NameError> {
        let inner = self.lock();
        if inner.name_taken(new_name, Some(user.id())) {
            return Err(NameError::AlreadyInUse);
        }
        Ok(user.rename(new_name))
    }

    /// Queue a line for every live session. Returns how many were reached.
    ///
    /// A session whose outbox is full misses the line; it is not waited for.
    pub fn broadcast(&self, line: &str) -> usize {
        self.send_where(line, |_| true)
    }

    pub fn broadcast_except(&self, except: SessionId, line: &str) -> usize {
        self.send_where(line, |id| id != except)
    }

    pub fn send_to(&self, id: SessionId, line: &str) -> bool {
        self.send_where(line, |candidate| candidate == id) == 1
    }

    fn send_where(&self, line: &str, filter: impl Fn(SessionId) -> bool) -> usize {
        let inner = self.lock();
        let mut reached = 0;

        for (id, entry) in inner.sessions.iter().filter(|(id, _)| filter(**id)) {
            match entry.outbox.try_send(line.to_string()) {
                Ok(()) => reached += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!("[{}] {} is not reading, notice dropped", id, entry.user);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }
        }

        reached
    }
}
