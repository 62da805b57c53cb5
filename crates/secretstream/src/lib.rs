//! Chunked authenticated secret streams
//!
//! Seals a sequence of independently sized plaintext chunks into a sequence
//! of frames that can travel over any byte transport (files, sockets, pipes)
//! while keeping chunk boundaries and detecting tampering, truncation and
//! reordering. Per-frame metadata (message boundary, rekey, end of stream) is
//! encrypted and authenticated inside each frame rather than sent beside it.
//!
//! # Stream Lifecycle
//!
//! ```text
//!            Key                                     Key
//!             │                                       │
//!             ▼                                       ▼
//!  Encoder::new ──► Header ─── out of band or ───► Decoder::new
//!             │                prefix on the wire     │
//!             ▼                                       ▼
//!  write(chunk) ───────────── frame ────────────► read(buf) → Chunk
//!  write(chunk) ───────────── frame ────────────► read(buf) → Chunk
//!  write_final / close ────── Final frame ──────► read(buf) → Chunk (final)
//! ```
//!
//! Frames carry no length prefix. Each frame is `plaintext + OVERHEAD` bytes
//! and the reader passes buffers of the same sizes the writer used. The last
//! frame may be shorter than the reader's buffer.
//!
//! Both sides thread a [`StreamState`] through every frame. The state is owned
//! by exactly one encoder or decoder and is never cloned, so frames only open
//! in the order they were sealed.
//!
//! # Security
//!
//! Authenticity:
//! - Every frame is authenticated with Poly1305 over the tag, ciphertext and
//!   associated data
//! - Frames are chained through the evolving nonce: a dropped, duplicated or
//!   reordered frame fails to open
//! - A truncated stream is detectable because the Final tag never arrives
//!
//! Key rotation:
//! - [`Tag::Rekey`] frames and [`Tag::Final`] frames rekey both sides
//! - The 32-bit frame counter wrapping also forces a rekey
//! - [`Encoder::rekey`] / [`Decoder::rekey`] rotate without a frame, but
//!   must be called at the same position on both sides
//!
//! Failure:
//! - Any authentication or framing failure leaves the stream
//!   [`Phase::Desynchronized`]; there are no retries
//!
//! # Example
//!
//! ```
//! use secretstream::{Decoder, Encoder, Key, Tag};
//!
//! # fn main() -> Result<(), secretstream::StreamError> {
//! let key = Key::generate()?;
//!
//! let mut encoder = Encoder::new(&key, Vec::new())?;
//! let header = *encoder.header();
//! encoder.write(b"hello")?;
//! encoder.write_final(b"world")?;
//! let wire = encoder.into_inner();
//!
//! let mut decoder = Decoder::new(&key, &header, wire.as_slice());
//! let mut buf = [0u8; 5];
//!
//! let chunk = decoder.read(&mut buf)?;
//! assert_eq!(chunk.tag, Tag::Message);
//! assert_eq!(&buf[..chunk.len], b"hello");
//!
//! let chunk = decoder.read(&mut buf)?;
//! assert!(chunk.is_final());
//! assert_eq!(&buf[..chunk.len], b"world");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod framing;
pub mod key;
pub mod phase;
pub mod state;
pub mod tag;

pub use decoder::{Chunk, Decoder};
pub use encoder::Encoder;
pub use error::{Result, StreamError};
pub use framing::{MAC_SIZE, MESSAGE_MAX, OVERHEAD, frame_len, plaintext_len};
pub use key::{HEADER_SIZE, Header, KEY_SIZE, Key};
pub use phase::Phase;
pub use state::StreamState;
pub use tag::Tag;
