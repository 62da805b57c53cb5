//! Per-frame tags carried inside the authenticated data.
//!
//! The tag is encrypted together with each frame rather than sent as a
//! plaintext field, so the receiver learns message boundaries, rekey points
//! and end-of-stream only from frames that authenticate.

use std::fmt;

/// Bit that makes both sides rekey after the frame.
pub(crate) const REKEY_BIT: u8 = 0x02;

/// Metadata attached to a single frame.
///
/// Wire values match libsodium's `crypto_secretstream_xchacha20poly1305`
/// tags: `Final` is `Sync | Rekey`, so the state is also rekeyed after the
/// last frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Tag {
    /// Ordinary chunk; carries no extra meaning
    #[default]
    Message = 0x00,
    /// Last chunk of a logical message
    Sync = 0x01,
    /// Both sides derive fresh key material after this frame
    Rekey = 0x02,
    /// Last frame of the stream
    Final = 0x03,
}

impl Tag {
    /// Every tag, in wire order.
    pub const ALL: [Tag; 4] = [Tag::Message, Tag::Sync, Tag::Rekey, Tag::Final];

    /// Wire byte for this tag.
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Returns true if the frame ends the stream.
    pub fn is_final(self) -> bool {
        matches!(self, Self::Final)
    }

    /// Returns true if the state is rekeyed after a frame with this tag.
    pub fn triggers_rekey(self) -> bool {
        self.to_byte() & REKEY_BIT != 0
    }
}

impl TryFrom<u8> for Tag {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x00 => Ok(Self::Message),
            0x01 => Ok(Self::Sync),
            0x02 => Ok(Self::Rekey),
            0x03 => Ok(Self::Final),
            other => Err(other),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Message => "message",
            Self::Sync => "sync",
            Self::Rekey => "rekey",
            Self::Final => "final",
        };
        f.write_str(name)
    }
}
