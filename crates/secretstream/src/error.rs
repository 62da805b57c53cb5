//! Error types for secret streams.
//!
//! A single error enum covers both directions. State and authentication
//! failures are terminal for the stream instance that produced them; nothing
//! in this crate retries. Whether a failed call may be repeated depends on
//! the stream's [`Phase`] afterwards, not on the error alone.

use std::io;

use thiserror::Error;

use crate::phase::Phase;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StreamError>;

/// Errors produced by [`crate::Encoder`], [`crate::Decoder`] and
/// [`crate::StreamState`].
#[derive(Error, Debug)]
pub enum StreamError {
    /// Operation attempted on a stream that is no longer streaming
    #[error("invalid state: cannot {operation} a {phase:?} stream")]
    InvalidState {
        /// Phase the stream was in
        phase: Phase,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Header has the wrong size or could not be read from the source
    #[error("invalid header: expected {expected} bytes, got {actual}")]
    InvalidHeader {
        /// Required header size
        expected: usize,
        /// Size that was supplied
        actual: usize,
    },

    /// Key has the wrong size
    #[error("invalid key: expected {expected} bytes, got {actual}")]
    InvalidKey {
        /// Required key size
        expected: usize,
        /// Size that was supplied
        actual: usize,
    },

    /// Frame failed authentication (tampered, reordered, truncated, or
    /// opened with the wrong associated data)
    #[error("decryption failed: {reason}")]
    DecryptionFailed {
        /// What went wrong
        reason: &'static str,
    },

    /// Source ended before a frame's authenticator could be read
    #[error("source exhausted: received {received} of {expected} frame bytes")]
    SourceExhausted {
        /// Bytes received before the source ended
        received: usize,
        /// Bytes the frame would have needed
        expected: usize,
    },

    /// Plaintext exceeds what a single frame can carry
    #[error("message too large: {size} bytes exceeds maximum of {max}")]
    MessageTooLarge {
        /// Plaintext size
        size: usize,
        /// Largest allowed plaintext
        max: u64,
    },

    /// Output buffer cannot hold the frame's plaintext
    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall {
        /// Plaintext size of the frame
        needed: usize,
        /// Size of the supplied buffer
        available: usize,
    },

    /// Authenticated frame carried a tag byte this crate does not know
    #[error("unknown tag byte {0:#04x}")]
    UnknownTag(u8),

    /// OS random number generator unavailable
    #[error("entropy source unavailable: {0}")]
    Entropy(String),

    /// The secretstream primitive rejected an operation that passed the size
    /// checks
    #[error("secretstream primitive failed: {0}")]
    Primitive(String),

    /// Sink or source failure, passed through unchanged
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl StreamError {
    fn io_kind(&self) -> io::ErrorKind {
        match self {
            Self::Io(err) => err.kind(),
            Self::SourceExhausted { .. } => io::ErrorKind::UnexpectedEof,
            Self::InvalidHeader { .. }
            | Self::InvalidKey { .. }
            | Self::MessageTooLarge { .. }
            | Self::BufferTooSmall { .. } => io::ErrorKind::InvalidInput,
            Self::InvalidState { .. } | Self::DecryptionFailed { .. } | Self::UnknownTag(_) => {
                io::ErrorKind::InvalidData
            },
            Self::Entropy(_) | Self::Primitive(_) => io::ErrorKind::Other,
        }
    }
}

/// Convert `StreamError` to `io::Error` for callers that work in `io` terms.
///
/// Wrapped I/O errors are returned as-is so their kind survives.
impl From<StreamError> for io::Error {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::Io(inner) => inner,
            other => Self::new(other.io_kind(), other),
        }
    }
}
