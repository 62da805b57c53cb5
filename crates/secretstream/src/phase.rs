//! Stream lifecycle shared by encoders and decoders.
//!
//! ```text
//! Streaming ──(non-final frame, rekey)──► Streaming
//!     │
//!     ├──(Final frame)──────────────────► Finalized
//!     │
//!     └──(failure after state moved)────► Desynchronized
//! ```
//!
//! `Finalized` and `Desynchronized` are terminal.

use crate::error::{Result, StreamError};

/// Where a stream is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Frames may be written or read
    #[default]
    Streaming,
    /// A Final-tagged frame has been written or read
    Finalized,
    /// A failure happened after the stream state or transport position moved
    Desynchronized,
}

impl Phase {
    /// Returns true once no further frames can be processed.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Streaming)
    }

    /// Fails with `InvalidState` unless the stream is still streaming.
    pub(crate) fn ensure_streaming(self, operation: &'static str) -> Result<()> {
        match self {
            Self::Streaming => Ok(()),
            Self::Finalized | Self::Desynchronized => {
                Err(StreamError::InvalidState { phase: self, operation })
            },
        }
    }
}
