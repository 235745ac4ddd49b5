//! linechat - a line-oriented multi-user chat server
//!
//! Clients connect over TCP and exchange newline-delimited text. Lines
//! starting with the command prefix run commands; everything else is
//! appended to a shared, append-only log that every session replays and
//! follows through its own cursor.

pub mod application;
pub mod domain;
pub mod infrastructure;

use std::sync::Arc;

use application::errors::ChatError;
use application::services::ChatHub;
use infrastructure::adapters::TcpAdapter;
use infrastructure::config::Config;
use infrastructure::sanitizer::MarkupStripper;
use infrastructure::storage::InMemoryLog;

/// Build the hub described by `config` with the in-memory log
pub fn build_hub(config: &Config) -> Arc<ChatHub> {
    Arc::new(ChatHub::new(
        config.chat_settings(),
        Arc::new(InMemoryLog::new()),
        Box::new(MarkupStripper),
    ))
}

/// Bind the listener for `config` without starting to accept
pub async fn bind(config: &Config) -> Result<TcpAdapter, ChatError> {
    config.validate()?;
    TcpAdapter::bind(&config.bind_addr(), build_hub(config), config.server.identity).await
}
