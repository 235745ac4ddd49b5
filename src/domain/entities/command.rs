use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{SessionId, UserRef};
use crate::application::errors::CommandError;
use crate::application::services::ChatHub;

/// What a command handler sees of the invoking session
pub struct CommandContext<'a> {
    pub session: SessionId,
    pub user: &'a UserRef,
    pub hub: &'a ChatHub,
}

/// Result of a successful command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Write this line back to the sender
    Reply(String),
    /// Write the farewell line, then close the sender's session
    Exit { farewell: String },
}

/// A command implementation.
///
/// Handlers run on the invoking session's worker and only touch in-memory
/// state, so they must not block.
pub trait CommandHandler: Send + Sync {
    fn execute(&self, ctx: &CommandContext<'_>, arg: Option<&str>) -> Result<CommandOutcome, CommandError>;
}

/// Represents a chat command
#[derive(Clone)]
pub struct Command {
    pub keyword: String,
    pub handler: Arc<dyn CommandHandler>,
}

impl Command {
    pub fn new(keyword: impl Into<String>, handler: impl CommandHandler + 'static) -> Self {
        Self {
            keyword: keyword.into(),
            handler: Arc::new(handler),
        }
    }

    pub fn execute(&self, ctx: &CommandContext<'_>, arg: Option<&str>) -> Result<CommandOutcome, CommandError> {
        self.handler.execute(ctx, arg)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("keyword", &self.keyword)
            .finish_non_exhaustive()
    }
}

/// Keyword to command table. Filled at startup, read-only afterwards.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Command>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, command: Command) {
        self.commands.insert(command.keyword.clone(), command);
    }

    /// Exact, case-sensitive lookup
    pub fn get(&self, keyword: &str) -> Option<&Command> {
        self.commands.get(keyword)
    }

    /// Registered keywords in sorted order
    pub fn keywords(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pong;

    impl CommandHandler for Pong {
        fn execute(&self, _ctx: &CommandContext<'_>, _arg: Option<&str>) -> Result<CommandOutcome, CommandError> {
            Ok(CommandOutcome::Reply("pong".into()))
        }
    }

    #[test]
    fn test_registry_lookup_is_case_sensitive() {
        let mut registry = CommandRegistry::new();
        registry.register(Command::new("ping", Pong));
        registry.register(Command::new("echo", Pong));

        assert!(registry.get("ping").is_some());
        assert!(registry.get("PING").is_none());
        assert_eq!(registry.keywords(), vec!["echo", "ping"]);
        assert_eq!(registry.len(), 2);
    }
}
