//! Application services - Shared chat state and built-in commands

pub mod command_service;
pub mod hub;
pub mod registry;

pub use command_service::{register_defaults, validate_name, Builtin};
pub use hub::{ChatHub, ChatSettings, Connection, Departure};
pub use registry::{Attachment, SessionRegistry};
