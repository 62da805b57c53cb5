//! CLI error types.

use std::{fmt, io};

use secretstream::StreamError;

/// Errors that can occur while running a command.
#[derive(Debug)]
pub enum CliError {
    /// Invalid arguments (zero chunk size, chunk size above the frame limit).
    ///
    /// Detected before any file is opened or any byte is written.
    Config(String),

    /// Key file could not be parsed (bad hex, wrong length).
    ///
    /// Regenerate the key or point `--key` at the right file.
    Key(String),

    /// Stream error (authentication failure, truncated input, etc.).
    ///
    /// The output may already hold plaintext from frames that opened before
    /// the failure; discard it.
    Stream(StreamError),

    /// Filesystem or pipe error.
    Io(io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Key(msg) => write!(f, "key error: {msg}"),
            Self::Stream(err) => write!(f, "stream error: {err}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Stream(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Config(_) | Self::Key(_) => None,
        }
    }
}

impl From<StreamError> for CliError {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::Io(err) => Self::Io(err),
            other => Self::Stream(other),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}
