//! Evolving stream state backed by `dryoc`'s
//! `crypto_secretstream_xchacha20poly1305`.
//!
//! The primitive is libsodium's secretstream construction, so frames produced
//! here open with libsodium and vice versa. This wrapper owns one primitive
//! state, checks sizes up front and maps tag bytes and failures onto this
//! crate's types.
//!
//! ```text
//! (Key, Header) ──init──► state ──seal/open──► state' ──seal/open──► ...
//!                                     │
//!                                     └─ rekeys itself after Rekey and Final
//!                                        frames and when the counter wraps
//! ```
//!
//! A frame that fails authentication leaves the state untouched and releases
//! no plaintext.

use std::fmt;

use dryoc::{
    classic::crypto_secretstream_xchacha20poly1305::{
        State, crypto_secretstream_xchacha20poly1305_init_pull,
        crypto_secretstream_xchacha20poly1305_pull, crypto_secretstream_xchacha20poly1305_push,
        crypto_secretstream_xchacha20poly1305_rekey,
    },
    constants::{
        CRYPTO_SECRETSTREAM_XCHACHA20POLY1305_ABYTES,
        CRYPTO_SECRETSTREAM_XCHACHA20POLY1305_HEADERBYTES,
        CRYPTO_SECRETSTREAM_XCHACHA20POLY1305_KEYBYTES,
    },
};
use zeroize::Zeroize;

use crate::{
    error::{Result, StreamError},
    framing::{MESSAGE_MAX, OVERHEAD, fits_in_frame, plaintext_len},
    key::{HEADER_SIZE, Header, KEY_SIZE, Key},
    tag::Tag,
};

const _: () = assert!(OVERHEAD == CRYPTO_SECRETSTREAM_XCHACHA20POLY1305_ABYTES);
const _: () = assert!(HEADER_SIZE == CRYPTO_SECRETSTREAM_XCHACHA20POLY1305_HEADERBYTES);
const _: () = assert!(KEY_SIZE == CRYPTO_SECRETSTREAM_XCHACHA20POLY1305_KEYBYTES);

/// Cryptographic context threaded through every frame of one stream.
///
/// Deliberately not `Clone`: two copies of the same state would seal
/// different frames under the same nonce. Zeroized on drop.
pub struct StreamState {
    inner: State,
}

impl StreamState {
    /// Derive the initial state from a key and the stream header.
    ///
    /// Encoder and decoder call this with the same inputs and end up with the
    /// same state. The header is generated by the caller, so both sides use
    /// the primitive's pull-side initializer.
    pub fn new(key: &Key, header: &Header) -> Self {
        let mut inner = State::new();
        crypto_secretstream_xchacha20poly1305_init_pull(&mut inner, header.as_bytes(), key.as_bytes());
        Self { inner }
    }

    /// Encrypt and authenticate one frame, then advance the state.
    ///
    /// Returns `plaintext.len() + OVERHEAD` bytes.
    ///
    /// # Errors
    ///
    /// - `MessageTooLarge` if `plaintext` exceeds [`MESSAGE_MAX`]; the state
    ///   is not advanced
    pub fn seal(&mut self, plaintext: &[u8], associated_data: &[u8], tag: Tag) -> Result<Vec<u8>> {
        self.seal_tag_byte(plaintext, associated_data, tag.to_byte())
    }

    /// Verify and decrypt one frame into `plaintext`, then advance the state.
    ///
    /// Writes `frame.len() - OVERHEAD` bytes to the front of `plaintext` and
    /// returns the frame's tag.
    ///
    /// # Errors
    ///
    /// - `DecryptionFailed` if the frame is shorter than [`OVERHEAD`] or does
    ///   not authenticate; the state is not advanced
    /// - `BufferTooSmall` if `plaintext` cannot hold the message
    /// - `UnknownTag` if an authentic frame carries an unknown tag byte; the
    ///   state has already advanced
    pub fn open(
        &mut self,
        frame: &[u8],
        associated_data: &[u8],
        plaintext: &mut [u8],
    ) -> Result<Tag> {
        let Some(message_len) = plaintext_len(frame.len()) else {
            return Err(StreamError::DecryptionFailed {
                reason: "frame shorter than authenticator",
            });
        };
        if !fits_in_frame(message_len) {
            return Err(StreamError::MessageTooLarge { size: message_len, max: MESSAGE_MAX });
        }
        if plaintext.len() < message_len {
            return Err(StreamError::BufferTooSmall {
                needed: message_len,
                available: plaintext.len(),
            });
        }

        let mut tag_byte = 0u8;
        crypto_secretstream_xchacha20poly1305_pull(
            &mut self.inner,
            &mut plaintext[..message_len],
            &mut tag_byte,
            frame,
            ad(associated_data),
        )
        .map_err(|_| StreamError::DecryptionFailed { reason: "authentication failed" })?;

        Tag::try_from(tag_byte).map_err(StreamError::UnknownTag)
    }

    /// Replace the key material with fresh material derived from the current
    /// state.
    ///
    /// Happens automatically after Rekey and Final frames. Calling it
    /// explicitly requires the other side to call it at the same position.
    pub fn rekey(&mut self) {
        crypto_secretstream_xchacha20poly1305_rekey(&mut self.inner);
    }

    fn seal_tag_byte(
        &mut self,
        plaintext: &[u8],
        associated_data: &[u8],
        tag_byte: u8,
    ) -> Result<Vec<u8>> {
        if !fits_in_frame(plaintext.len()) {
            return Err(StreamError::MessageTooLarge { size: plaintext.len(), max: MESSAGE_MAX });
        }

        let mut frame = vec![0u8; plaintext.len() + OVERHEAD];
        crypto_secretstream_xchacha20poly1305_push(
            &mut self.inner,
            &mut frame,
            plaintext,
            ad(associated_data),
            tag_byte,
        )
        .map_err(|err| StreamError::Primitive(err.to_string()))?;
        Ok(frame)
    }
}

/// The primitive distinguishes absent from empty associated data only in its
/// signature; both authenticate the same.
fn ad(associated_data: &[u8]) -> Option<&[u8]> {
    (!associated_data.is_empty()).then_some(associated_data)
}

impl fmt::Debug for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamState").finish_non_exhaustive()
    }
}

impl Drop for StreamState {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}
