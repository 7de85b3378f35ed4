//! Error type shared by the token sources and the state machine runtime.
//!
//! The runtime never wraps or reinterprets these values: whatever a
//! transition stores in the machine's error slot is what `run` returns.

use thiserror::Error;

/// Errors produced while tokenizing or driving a state machine.
#[derive(Debug, Error)]
pub enum Error {
    /// The token source has no more tokens.
    ///
    /// A fully consumed stream ends with this value; `ignore_eof` demotes it
    /// to success.
    #[error("end of input")]
    Eof,

    /// The tokenizer rejected its input.
    #[error("syntax error at byte {position}: {message}")]
    Syntax { position: u64, message: String },

    /// Token bytes were not valid UTF-8.
    #[error("invalid utf-8 in token: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// A string could not be parsed as a namespaced name.
    #[error("invalid name: {0:?}")]
    InvalidName(String),

    /// The execution context was cancelled.
    #[error("context cancelled")]
    Cancelled,

    /// The execution context's deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// An application error raised by a transition or callback.
    #[error(transparent)]
    Custom(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap an application error.
    pub fn custom<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Custom(err.into())
    }

    /// True only for [`Error::Eof`].
    pub fn is_eof(&self) -> bool {
        matches!(self, Error::Eof)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
