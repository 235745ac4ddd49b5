//! Wire rendering of notices and chat lines

use crate::domain::entities::{Message, User};

/// Turns log entries and notices into outgoing lines.
///
/// Directed messages are underlined for their recipients; everyone else gets
/// the public form of the same log entry.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    show_timestamps: bool,
}

impl Renderer {
    pub fn new(show_timestamps: bool) -> Self {
        Self { show_timestamps }
    }

    /// System or broadcast text
    pub fn notice(&self, text: &str) -> String {
        format!("<b>{}</b>", text)
    }

    /// One log entry as seen by `reader`
    pub fn message(&self, message: &Message, reader: &User) -> String {
        let mut line = String::new();

        if self.show_timestamps {
            line.push_str(&message.timestamp.format("[%H:%M:%S] ").to_string());
        }

        line.push_str(&format!(
            "<b color=\"{}\">{}</b>:\t",
            message.author.color(),
            message.author.display_name()
        ));

        if message.is_directed_to(reader) {
            line.push_str(&format!("<u>{}</u>", message.content));
        } else {
            line.push_str(&message.content);
        }

        line
    }
}
