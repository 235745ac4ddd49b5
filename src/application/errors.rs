//! Application layer errors

use thiserror::Error;

/// General server errors
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The listener can no longer accept connections. Fatal for the process.
    #[error("Accept loop failed: {0}")]
    Accept(#[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Command execution errors
///
/// The `Display` output is what the sender sees as a reply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command '{0}'.")]
    NotFound(String),

    #[error("Couldn't parse command.")]
    Parse,

    #[error("{0}")]
    Name(#[from] NameError),
}

/// Rename validation failures, in the order they are checked
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("You haven't provided the username.")]
    Missing,

    #[error("Your wanted name is too long. Maximum {max} characters are allowed.")]
    TooLong { max: usize },

    #[error("Your wanted name is too short. Minimum {min} characters are needed.")]
    TooShort { min: usize },

    #[error("Your wanted name contains not allowed characters. Only letters and numbers are allowed.")]
    InvalidCharacters,

    #[error("Your wanted name is already in use.")]
    AlreadyInUse,
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}
