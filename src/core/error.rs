use std::io;
use thiserror::Error;

/// Custom error types for the Remote ID broadcast core
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Command error: {0}")]
    Command(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Length violation: {field} is {actual} bytes, limit is {limit}")]
    LengthViolation {
        field: &'static str,
        limit: usize,
        actual: usize,
    },

    #[error("Initialization failed at {stage}: {detail}")]
    Init {
        stage: &'static str,
        detail: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a new transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Error::Transport(msg.into())
    }

    /// Creates a new command error
    pub fn command(msg: impl Into<String>) -> Self {
        Error::Command(msg.into())
    }

    /// Creates a new encoding error
    pub fn encoding(msg: impl Into<String>) -> Self {
        Error::Encoding(msg.into())
    }

    /// Creates a new length violation error
    pub fn length_violation(field: &'static str, limit: usize, actual: usize) -> Self {
        Error::LengthViolation {
            field,
            limit,
            actual,
        }
    }

    /// Creates a new initialization error for the named bring-up stage
    pub fn init(stage: &'static str, detail: impl Into<String>) -> Self {
        Error::Init {
            stage,
            detail: detail.into(),
        }
    }

    /// Creates a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Creates a new invalid state error
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Error::InvalidState(msg.into())
    }
}
