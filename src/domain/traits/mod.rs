//! Domain traits - Abstractions for infrastructure implementations

pub mod sanitizer;
pub mod store;

pub use sanitizer::Sanitizer;
pub use store::{LogSnapshot, MessageStore};
