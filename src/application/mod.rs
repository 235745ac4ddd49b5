//! Application layer - Chat behaviour
//! 
//! This layer contains:
//! - Services: Session registry, chat hub, built-in commands
//! - Errors: Domain-specific errors
//! - Messaging: Line parsing, debouncing, dispatching, rendering

pub mod errors;
pub mod messaging;
pub mod services;
