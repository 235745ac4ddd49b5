//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration loading
//! - Storage: The in-memory message log
//! - Sanitizer: Markup stripping for chat content
//! - Adapters: Transports (TCP)

pub mod adapters;
pub mod config;
pub mod sanitizer;
pub mod storage;
