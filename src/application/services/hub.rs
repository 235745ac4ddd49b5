//! Chat hub - Shared state every session works against

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use super::command_service;
use super::registry::SessionRegistry;
use crate::application::messaging::{mentions, Debounce, Dispatch, MessageDispatcher, Renderer};
use crate::domain::entities::{CommandRegistry, IdentityKey, Message, Session, SessionId, UserRef};
use crate::domain::traits::{MessageStore, Sanitizer};

/// Tunables the hub needs at runtime
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub command_prefix: String,
    pub max_message_length: usize,
    /// Longest raw input line in bytes; longer lines are discarded unread
    pub max_line_bytes: usize,
    /// Notices queued per session before further ones are dropped
    pub outbox_capacity: usize,
    pub min_name_length: usize,
    pub max_name_length: usize,
    pub rate_limit_window: Duration,
    pub show_timestamps: bool,
    pub anonymous_prefix: String,
    pub palette: Vec<String>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            command_prefix: "\\".to_string(),
            max_message_length: 250,
            max_line_bytes: 4096,
            outbox_capacity: 64,
            min_name_length: 3,
            max_name_length: 12,
            rate_limit_window: Duration::from_millis(200),
            show_timestamps: false,
            anonymous_prefix: "Anonym".to_string(),
            palette: ["red", "#a38a00", "olive", "maroon", "lime", "green", "teal", "navy", "fuchsia", "purple"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// End of stream or I/O failure
    Lost,
    /// The exit command, which already announced the departure
    Exited,
}

/// A freshly accepted session and the receiving end of its outbox
#[derive(Debug)]
pub struct Connection {
    pub session: Session,
    pub outbox: mpsc::Receiver<String>,
    pub rejoined: bool,
}

/// Owns the message log, the session registry and the command table
pub struct ChatHub {
    settings: ChatSettings,
    log: Arc<dyn MessageStore>,
    sessions: SessionRegistry,
    commands: CommandRegistry,
    sanitizer: Box<dyn Sanitizer>,
    dispatcher: MessageDispatcher,
    renderer: Renderer,
}

impl ChatHub {
    pub fn new(settings: ChatSettings, log: Arc<dyn MessageStore>, sanitizer: Box<dyn Sanitizer>) -> Self {
        let mut commands = CommandRegistry::new();
        command_service::register_defaults(&mut commands);

        Self {
            sessions: SessionRegistry::new(
                settings.palette.clone(),
                settings.anonymous_prefix.clone(),
                settings.outbox_capacity,
            ),
            dispatcher: MessageDispatcher::new(settings.command_prefix.clone(), settings.max_message_length),
            renderer: Renderer::new(settings.show_timestamps),
            settings,
            log,
            commands,
            sanitizer,
        }
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    pub fn log(&self) -> &dyn MessageStore {
        self.log.as_ref()
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Resolve identity, register the session, greet it and announce it
    pub fn connect(&self, key: IdentityKey) -> Connection {
        let attachment = self.sessions.attach(key);
        let user = attachment.user;
        tracing::debug!("identity {} attached to user {}", user.origin(), user.id());
        let (id, outbox) = self.sessions.open(Arc::clone(&user));

        self.sessions.send_to(id, &self.renderer.notice(&self.userlist_text()));
        self.sessions.send_to(
            id,
            &self.renderer.notice(&format!(
                "Use the command \"{}help\" to get a list of all supported commands.",
                self.settings.command_prefix
            )),
        );

        if attachment.rejoined {
            self.announce(&format!("Client '{}' has reentered this server.", user));
        } else {
            self.announce(&format!("New client '{}' has been connected to this server.", user));
        }

        Connection {
            session: Session::new(id, user, Debounce::new(self.settings.rate_limit_window)),
            outbox,
            rejoined: attachment.rejoined,
        }
    }

    /// Process one received line on behalf of `session`
    pub fn handle_line(&self, session: &mut Session, line: &str, now: Instant) -> Dispatch {
        self.dispatcher.dispatch(self, session, line, now)
    }

    /// Answer a line the transport had to cut off
    pub fn handle_oversized(&self, session: &mut Session, now: Instant) -> Dispatch {
        self.dispatcher.dispatch_oversized(session, now)
    }

    /// Sanitize, resolve mentions and append. Returns the log position.
    pub fn post(&self, author: &UserRef, raw: &str) -> usize {
        let content = self.sanitizer.clean(raw);
        let mut message = Message::new(Arc::clone(author), content);

        let recipients: Vec<UserRef> = mentions(&message.content)
            .into_iter()
            .filter_map(|name| self.sessions.find_active(name))
            .collect();

        if !recipients.is_empty() {
            message.add_recipient(Arc::clone(author));
            for recipient in recipients {
                message.add_recipient(recipient);
            }
        }

        self.log.append(message)
    }

    /// Render everything the session has not seen yet and advance its cursor
    pub fn render_unseen(&self, session: &mut Session) -> Vec<String> {
        let reader = Arc::clone(session.user());
        session
            .take_unseen(self.log.as_ref())
            .iter()
            .map(|message| self.renderer.message(message, &reader))
            .collect()
    }

    /// Bold notice to every live session
    pub fn announce(&self, text: &str) {
        tracing::info!("{}", text);
        self.sessions.broadcast(&self.renderer.notice(text));
    }

    pub fn announce_except(&self, except: SessionId, text: &str) {
        tracing::info!("{}", text);
        self.sessions.broadcast_except(except, &self.renderer.notice(text));
    }

    /// Unregister a closing session and tell the others if it was lost
    pub fn disconnect(&self, session: &mut Session, departure: Departure) {
        session.begin_close();
        if !self.sessions.close(session.id()) {
            return;
        }

        if departure == Departure::Lost {
            self.announce(&format!(
                "The user '{}' has been disconnected from the server.",
                session.user()
            ));
        }
    }

    pub fn userlist_text(&self) -> String {
        format!("Currently connected: [{}]", self.sessions.active_names().join(", "))
    }
}
