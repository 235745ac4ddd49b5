//! Message dispatcher - Routes input lines to commands or the log

use std::time::Instant;

use super::parser::{Input, LineParser};
use crate::application::errors::CommandError;
use crate::application::services::ChatHub;
use crate::domain::entities::{CommandContext, CommandOutcome, Session};

/// What became of one input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Arrived inside the debounce window
    Dropped,
    /// Blank line
    Ignored,
    /// Lines for the sender only
    Reply(Vec<String>),
    /// Stored in the log at this position
    Posted(usize),
    /// Send these lines, then close the session
    Exit(Vec<String>),
}

impl Dispatch {
    pub fn reply(line: impl Into<String>) -> Self {
        Dispatch::Reply(vec![line.into()])
    }
}

/// Message dispatcher - debounce, classify, then route
#[derive(Debug, Clone)]
pub struct MessageDispatcher {
    parser: LineParser,
    max_message_length: usize,
}

impl MessageDispatcher {
    pub fn new(prefix: impl Into<String>, max_message_length: usize) -> Self {
        Self {
            parser: LineParser::new(prefix),
            max_message_length,
        }
    }

    pub fn dispatch(&self, hub: &ChatHub, session: &mut Session, line: &str, now: Instant) -> Dispatch {
        if !session.admit_input(now) {
            tracing::warn!("{} tried to spam messages", session.user());
            return Dispatch::Dropped;
        }

        tracing::debug!("[{}] {}: {}", session.id(), session.user(), line);

        match self.parser.parse(line) {
            Input::Empty => Dispatch::Ignored,
            Input::Malformed => Dispatch::reply(CommandError::Parse.to_string()),
            Input::Command(cmd) => self.run_command(hub, session, cmd.keyword, cmd.argument),
            Input::Chat(text) if text.chars().count() > self.max_message_length => self.too_long(),
            Input::Chat(text) => Dispatch::Posted(hub.post(session.user(), text)),
        }
    }

    /// A line the transport cut off before its end arrived
    pub fn dispatch_oversized(&self, session: &mut Session, now: Instant) -> Dispatch {
        if !session.admit_input(now) {
            tracing::warn!("{} tried to spam messages", session.user());
            return Dispatch::Dropped;
        }

        tracing::warn!("[{}] {} sent an overlong line", session.id(), session.user());
        self.too_long()
    }

    fn too_long(&self) -> Dispatch {
        Dispatch::reply(format!(
            "Your message is too long. Maximum of {} characters is allowed.",
            self.max_message_length
        ))
    }

    fn run_command(&self, hub: &ChatHub, session: &Session, keyword: &str, argument: Option<&str>) -> Dispatch {
        let Some(command) = hub.commands().get(keyword) else {
            return Dispatch::reply(CommandError::NotFound(keyword.to_string()).to_string());
        };

        let ctx = CommandContext {
            session: session.id(),
            user: session.user(),
            hub,
        };

        let mut lines = vec![format!("Executing command '{}'.", keyword)];
        match command.execute(&ctx, argument) {
            Ok(CommandOutcome::Reply(text)) => {
                lines.push(text);
                Dispatch::Reply(lines)
            }
            Ok(CommandOutcome::Exit { farewell }) => {
                lines.push(farewell);
                Dispatch::Exit(lines)
            }
            Err(e) => {
                tracing::debug!("[{}] {} rejected: {}", session.id(), keyword, e);
                lines.push(e.to_string());
                Dispatch::Reply(lines)
            }
        }
    }
}
