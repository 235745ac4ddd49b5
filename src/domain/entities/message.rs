use super::{User, UserRef};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A chat line stored in the message log.
///
/// Immutable once built. An empty recipient list means the message is
/// public; otherwise the listed users (author included) see it as directed.
/// Everyone still receives it, recipients only change the rendering.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: Uuid,
    pub author: UserRef,
    pub content: String,
    pub recipients: Vec<UserRef>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(author: UserRef, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author,
            content: content.into(),
            recipients: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Add a recipient, ignoring duplicates
    pub fn with_recipient(mut self, user: UserRef) -> Self {
        self.add_recipient(user);
        self
    }

    pub fn add_recipient(&mut self, user: UserRef) {
        if !self.recipients.iter().any(|r| r.id() == user.id()) {
            self.recipients.push(user);
        }
    }

    pub fn is_public(&self) -> bool {
        self.recipients.is_empty()
    }

    /// Whether `reader` should see this message with mention styling
    pub fn is_directed_to(&self, reader: &User) -> bool {
        self.recipients.iter().any(|r| r.id() == reader.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{IdentityKey, UserId};
    use std::sync::Arc;

    fn user(id: u64, name: &str) -> UserRef {
        Arc::new(User::new(UserId(id), name, IdentityKey::new(name), "teal"))
    }

    #[test]
    fn test_recipients_are_deduplicated() {
        let bob = user(2, "bob");
        let msg = Message::new(user(1, "alice"), "hi @bob @bob")
            .with_recipient(bob.clone())
            .with_recipient(bob.clone());
        assert_eq!(msg.recipients.len(), 1);
        assert!(!msg.is_public());
    }

    #[test]
    fn test_directed_only_to_listed_users() {
        let alice = user(1, "alice");
        let bob = user(2, "bob");
        let carol = user(3, "carol");
        let msg = Message::new(alice.clone(), "hello @bob")
            .with_recipient(alice.clone())
            .with_recipient(bob.clone());

        assert!(msg.is_directed_to(&alice));
        assert!(msg.is_directed_to(&bob));
        assert!(!msg.is_directed_to(&carol));
    }
}
