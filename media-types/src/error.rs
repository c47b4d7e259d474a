/*!
    Error types shared across the pipeline crates.
*/

use thiserror::Error as ThisError;

/**
    Error produced by pipeline components.

    Codec workers and the engine recover from these locally; none of them
    cross the engine boundary to callers.
*/
#[derive(Debug, Clone, ThisError)]
pub enum Error {
    #[error("codec error: {0}")]
    Codec(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl Error {
    /**
        Create a codec error from any message.
    */
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec(message.into())
    }

    /**
        Create an invalid-data error from any message.
    */
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData(message.into())
    }

    /**
        Create an unsupported-format error from any message.
    */
    pub fn unsupported_format(message: impl Into<String>) -> Self {
        Self::UnsupportedFormat(message.into())
    }
}

/**
    Result alias used throughout the pipeline crates.
*/
pub type Result<T> = std::result::Result<T, Error>;

/**
    Error returned by `FromStr` implementations on enum types.
*/
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("unknown {kind} '{value}'")]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
}
