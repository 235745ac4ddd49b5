//! Domain entities - Core chat objects

pub mod command;
pub mod message;
pub mod session;
pub mod user;

pub use command::{Command, CommandContext, CommandHandler, CommandOutcome, CommandRegistry};
pub use message::Message;
pub use session::{Session, SessionId, SessionState};
pub use user::{IdentityKey, User, UserId, UserRef};
