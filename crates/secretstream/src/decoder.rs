//! Opening side of a stream.
//!
//! A read of `L` plaintext bytes consumes exactly one frame of `L + OVERHEAD`
//! bytes from the source, so the reader must use the chunk sizes the writer
//! used. The last frame of a stream may be shorter: if the source ends after
//! at least [`OVERHEAD`] bytes, whatever arrived is opened as one frame.

use std::{
    io::{self, Read},
    mem,
};

use tracing::{debug, trace};

use crate::{
    error::{Result, StreamError},
    framing::OVERHEAD,
    key::{HEADER_SIZE, Header, Key},
    phase::Phase,
    state::StreamState,
    tag::Tag,
};

/// Outcome of a successful [`Decoder::read`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Plaintext bytes written to the front of the caller's buffer
    pub len: usize,
    /// Tag the frame was sealed with
    pub tag: Tag,
}

impl Chunk {
    /// Returns true if this was the last frame of the stream.
    pub fn is_final(&self) -> bool {
        self.tag.is_final()
    }
}

/// Turns frames read from `R` back into plaintext chunks.
#[derive(Debug)]
pub struct Decoder<R> {
    source: R,
    state: StreamState,
    associated_data: Vec<u8>,
    tag: Tag,
    phase: Phase,
    frames: u64,
    /// Reused between reads
    frame: Vec<u8>,
}

impl<R: Read> Decoder<R> {
    /// Open a stream whose header was delivered separately.
    pub fn new(key: &Key, header: &Header, source: R) -> Self {
        Self {
            source,
            state: StreamState::new(key, header),
            associated_data: Vec::new(),
            tag: Tag::default(),
            phase: Phase::Streaming,
            frames: 0,
            frame: Vec::new(),
        }
    }

    /// Open a stream from raw header bytes.
    ///
    /// # Errors
    ///
    /// - `InvalidHeader` if `header` is not exactly [`HEADER_SIZE`] bytes;
    ///   nothing is read from `source`
    pub fn from_header_bytes(key: &Key, header: &[u8], source: R) -> Result<Self> {
        let header = Header::from_bytes(header)?;
        Ok(Self::new(key, &header, source))
    }

    /// Open a stream whose header is the first [`HEADER_SIZE`] bytes of
    /// `source`, as written by [`crate::Encoder::write_header`].
    ///
    /// # Errors
    ///
    /// - `InvalidHeader` if the source ends before a full header
    /// - `Io` if the source fails
    pub fn read_header(key: &Key, mut source: R) -> Result<Self> {
        let mut header = [0u8; HEADER_SIZE];
        let received = fill(&mut source, &mut header)?;
        if received < HEADER_SIZE {
            return Err(StreamError::InvalidHeader { expected: HEADER_SIZE, actual: received });
        }
        Ok(Self::new(key, &Header::from(header), source))
    }

    /// Associated data for the next read only.
    ///
    /// Must match what the encoder set for the corresponding frame.
    pub fn set_associated_data(&mut self, associated_data: impl Into<Vec<u8>>) {
        self.associated_data = associated_data.into();
    }

    /// Tag of the most recently opened frame ([`Tag::Message`] before the
    /// first read).
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Read one frame and decrypt it into `buf`.
    ///
    /// Reads `buf.len() + OVERHEAD` bytes, or fewer if the source ends after at
    /// least [`OVERHEAD`] bytes. The returned [`Chunk`] says how many bytes of
    /// `buf` hold plaintext and whether the frame ended the stream.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the stream is finalized or desynchronized
    /// - `SourceExhausted` if the source ends before [`OVERHEAD`] bytes
    /// - `DecryptionFailed` if the frame does not authenticate (corrupted,
    ///   truncated, reordered, or wrong associated data)
    /// - `UnknownTag` if the frame authenticates but carries an unknown tag
    /// - `Io` if the source fails
    ///
    /// An I/O error raised before any byte arrived, or a source that is
    /// already empty, leaves the decoder [`Phase::Streaming`] and the read may
    /// be repeated. Every other error leaves it desynchronized.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<Chunk> {
        self.phase.ensure_streaming("read")?;
        let associated_data = mem::take(&mut self.associated_data);

        let expected = buf.len() + OVERHEAD;
        self.frame.resize(expected, 0);

        let mut received = 0;
        let mut remaining = expected;
        while remaining > 0 {
            match self.source.read(&mut self.frame[received..expected]) {
                Ok(0) => break,
                Ok(n) => {
                    received += n;
                    remaining -= n;
                },
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {},
                Err(err) => {
                    if received > 0 {
                        self.desynchronize("source failed mid-frame");
                    }
                    return Err(err.into());
                },
            }
        }

        if received < OVERHEAD {
            if received > 0 {
                self.desynchronize("source ended mid-frame");
            }
            return Err(StreamError::SourceExhausted { received, expected });
        }

        let frame = &self.frame[..received];
        let tag = match self.state.open(frame, &associated_data, buf) {
            Ok(tag) => tag,
            Err(err) => {
                self.desynchronize("frame rejected");
                return Err(err);
            },
        };

        let len = received - OVERHEAD;
        let short = received < expected;
        trace!(frame = self.frames, len, %tag, short, "opened frame");
        self.frames += 1;
        self.tag = tag;

        if tag.is_final() {
            self.phase = Phase::Finalized;
            debug!(frames = self.frames, "decoder reached end of stream");
        } else if tag.triggers_rekey() {
            debug!(frames = self.frames, "decoder rekeyed by tag");
        }

        Ok(Chunk { len, tag })
    }

    /// Rekey the local state without reading a frame, mirroring
    /// [`crate::Encoder::rekey`].
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the stream is finalized or desynchronized
    pub fn rekey(&mut self) -> Result<()> {
        self.phase.ensure_streaming("rekey")?;
        self.state.rekey();
        debug!(frames = self.frames, "decoder rekeyed");
        Ok(())
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns true once a Final frame has been read.
    pub fn is_finalized(&self) -> bool {
        self.phase == Phase::Finalized
    }

    /// Number of frames opened so far.
    pub fn frames_read(&self) -> u64 {
        self.frames
    }

    /// Shared reference to the source.
    pub fn get_ref(&self) -> &R {
        &self.source
    }

    /// Consume the decoder and return the source.
    ///
    /// After a Final frame the source is positioned right after it.
    pub fn into_inner(self) -> R {
        self.source
    }

    fn desynchronize(&mut self, reason: &'static str) {
        self.phase = Phase::Desynchronized;
        debug!(frame = self.frames, reason, "decoder desynchronized");
    }
}

/// Read until `buf` is full or the source ends. Returns the bytes read.
fn fill<R: Read>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut received = 0;
    while received < buf.len() {
        match source.read(&mut buf[received..]) {
            Ok(0) => break,
            Ok(n) => received += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {},
            Err(err) => return Err(err),
        }
    }
    Ok(received)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Encoder, key::KEY_SIZE};

    fn key() -> Key {
        Key::from([9u8; KEY_SIZE])
    }

    fn header() -> Header {
        Header::from([3u8; HEADER_SIZE])
    }

    fn sealed(chunks: &[&[u8]]) -> Vec<u8> {
        let mut encoder = Encoder::with_header(&key(), header(), Vec::new());
        let Some((last, rest)) = chunks.split_last() else {
            encoder.close().unwrap();
            return encoder.into_inner();
        };
        for chunk in rest {
            encoder.write(chunk).unwrap();
        }
        encoder.write_final(last).unwrap();
        encoder.into_inner()
    }

    #[test]
    fn reads_back_chunks() {
        let wire = sealed(&[b"abc", b"defg"]);
        let mut decoder = Decoder::new(&key(), &header(), wire.as_slice());

        let mut buf = [0u8; 3];
        assert_eq!(decoder.read(&mut buf).unwrap(), Chunk { len: 3, tag: Tag::Message });
        assert_eq!(&buf, b"abc");

        let mut buf = [0u8; 4];
        let chunk = decoder.read(&mut buf).unwrap();
        assert!(chunk.is_final());
        assert_eq!(&buf[..chunk.len], b"defg");
        assert_eq!(decoder.frames_read(), 2);
    }

    #[test]
    fn short_final_frame_fits_larger_buffer() {
        let wire = sealed(&[b"tail"]);
        let mut decoder = Decoder::new(&key(), &header(), wire.as_slice());

        let mut buf = [0u8; 64];
        let chunk = decoder.read(&mut buf).unwrap();
        assert_eq!(chunk.len, 4);
        assert!(chunk.is_final());
        assert_eq!(&buf[..4], b"tail");
    }

    #[test]
    fn empty_source_is_exhausted_not_empty_success() {
        let mut decoder = Decoder::new(&key(), &header(), io::empty());
        let mut buf = [0u8; 8];
        assert!(matches!(
            decoder.read(&mut buf),
            Err(StreamError::SourceExhausted { received: 0, expected }) if expected == 8 + OVERHEAD
        ));
        assert_eq!(decoder.phase(), Phase::Streaming, "nothing was consumed");
    }

    #[test]
    fn partial_authenticator_desynchronizes() {
        let wire = sealed(&[b"x"]);
        let mut decoder = Decoder::new(&key(), &header(), &wire[..OVERHEAD - 1]);
        let mut buf = [0u8; 1];
        assert!(matches!(
            decoder.read(&mut buf),
            Err(StreamError::SourceExhausted { received, .. }) if received == OVERHEAD - 1
        ));
        assert_eq!(decoder.phase(), Phase::Desynchronized);
    }

    #[test]
    fn header_bytes_of_wrong_length_are_rejected() {
        for len in [0, HEADER_SIZE - 1, HEADER_SIZE + 1] {
            let bytes = vec![0u8; len];
            assert!(matches!(
                Decoder::from_header_bytes(&key(), &bytes, io::empty()),
                Err(StreamError::InvalidHeader { actual, .. }) if actual == len
            ));
        }
    }

    #[test]
    fn truncated_header_prefix_is_rejected() {
        let prefix = [0u8; HEADER_SIZE - 4];
        assert!(matches!(
            Decoder::read_header(&key(), &prefix[..]),
            Err(StreamError::InvalidHeader { actual, .. }) if actual == HEADER_SIZE - 4
        ));
    }

    #[test]
    fn associated_data_applies_to_one_read() {
        let mut encoder = Encoder::with_header(&key(), header(), Vec::new());
        encoder.set_associated_data(b"ctx".to_vec());
        encoder.write(b"one").unwrap();
        encoder.write(b"two").unwrap();
        let wire = encoder.into_inner();

        let mut decoder = Decoder::new(&key(), &header(), wire.as_slice());
        let mut buf = [0u8; 3];
        decoder.set_associated_data(b"ctx".to_vec());
        decoder.read(&mut buf).unwrap();
        decoder.read(&mut buf).unwrap();
        assert_eq!(&buf, b"two");
    }

    #[test]
    fn fill_stops_at_end_of_source() {
        let mut source = &b"abc"[..];
        let mut buf = [0u8; 8];
        assert_eq!(fill(&mut source, &mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"abc");
    }

    /// Source that reports `WouldBlock` once before handing out its bytes.
    struct NotReadyOnce<'a> {
        inner: &'a [u8],
        ready: bool,
    }

    impl Read for NotReadyOnce<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.ready {
                self.ready = true;
                return Err(io::Error::from(io::ErrorKind::WouldBlock));
            }
            self.inner.read(buf)
        }
    }

    #[test]
    fn would_block_before_any_byte_can_be_retried() {
        let wire = sealed(&[b"later"]);
        let mut decoder =
            Decoder::new(&key(), &header(), NotReadyOnce { inner: &wire, ready: false });
        let mut buf = [0u8; 5];

        match decoder.read(&mut buf) {
            Err(StreamError::Io(err)) => assert_eq!(err.kind(), io::ErrorKind::WouldBlock),
            other => unreachable!("expected WouldBlock, got {other:?}"),
        }
        assert_eq!(decoder.phase(), Phase::Streaming);

        let chunk = decoder.read(&mut buf).unwrap();
        assert!(chunk.is_final());
        assert_eq!(&buf, b"later");
    }
}
