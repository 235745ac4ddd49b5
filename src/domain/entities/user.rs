use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Stable identifier of a user for the lifetime of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u{}", self.0)
    }
}

/// Key used to re-attach a reconnecting client to an existing user.
///
/// Derived from the peer address, so it is only as strong as that address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A chat participant.
///
/// Shared between sessions and messages via `Arc`. Only the display name is
/// mutable, and only the session registry renames users.
#[derive(Debug)]
pub struct User {
    id: UserId,
    origin: IdentityKey,
    color: String,
    name: RwLock<String>,
}

/// Shared handle to a user
pub type UserRef = Arc<User>;

impl User {
    pub fn new(id: UserId, name: impl Into<String>, origin: IdentityKey, color: impl Into<String>) -> Self {
        Self {
            id,
            origin,
            color: color.into(),
            name: RwLock::new(name.into()),
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn origin(&self) -> &IdentityKey {
        &self.origin
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    /// Current display name
    pub fn display_name(&self) -> String {
        self.name
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the display name, returning the previous one
    pub(crate) fn rename(&self, new_name: impl Into<String>) -> String {
        let mut name = self.name.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *name, new_name.into())
    }

    /// Case-insensitive name comparison used for uniqueness checks
    pub fn name_matches_ignore_case(&self, candidate: &str) -> bool {
        self.display_name().to_lowercase() == candidate.to_lowercase()
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
