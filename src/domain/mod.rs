//! Domain layer - Core chat model
//! 
//! This layer contains:
//! - Entities: Core objects (User, Message, Session, Command)
//! - Traits: Seams for infrastructure (MessageStore, Sanitizer)

pub mod entities;
pub mod traits;
