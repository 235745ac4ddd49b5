//! Message handling - Parsing, debouncing, dispatching and rendering

pub mod dispatcher;
pub mod parser;
pub mod rate_limit;
pub mod render;

pub use dispatcher::{Dispatch, MessageDispatcher};
pub use parser::{mentions, CommandLine, Input, LineParser};
pub use rate_limit::Debounce;
pub use render::Renderer;
