//! Sealing side of a stream.
//!
//! Each call to [`Encoder::write`] seals one plaintext chunk into one frame
//! and hands the whole frame to the sink in a single `write_all`.

use std::{io::Write, mem};

use tracing::{debug, trace};

use crate::{
    error::{Result, StreamError},
    framing::{MESSAGE_MAX, fits_in_frame},
    key::{Header, Key},
    phase::Phase,
    state::StreamState,
    tag::Tag,
};

/// Turns plaintext chunks into frames written to `W`.
#[derive(Debug)]
pub struct Encoder<W> {
    sink: W,
    header: Header,
    state: StreamState,
    associated_data: Vec<u8>,
    tag: Tag,
    phase: Phase,
    frames: u64,
    header_sent: bool,
}

impl<W: Write> Encoder<W> {
    /// Start a stream with a freshly generated header.
    ///
    /// Nothing is written to `sink` yet; transmit [`Encoder::header`] to the
    /// receiver first, or call [`Encoder::write_header`].
    ///
    /// # Errors
    ///
    /// - `Entropy` if the OS RNG is unavailable
    pub fn new(key: &Key, sink: W) -> Result<Self> {
        let header = Header::generate()?;
        Ok(Self::with_header(key, header, sink))
    }

    /// Start a stream with a caller-supplied header.
    ///
    /// The header must be random and never reused with the same key; reuse
    /// produces identical keystreams across streams. Intended for callers
    /// that manage their own randomness.
    pub fn with_header(key: &Key, header: Header, sink: W) -> Self {
        Self {
            sink,
            header,
            state: StreamState::new(key, &header),
            associated_data: Vec::new(),
            tag: Tag::default(),
            phase: Phase::Streaming,
            frames: 0,
            header_sent: false,
        }
    }

    /// Header the decoder needs before it can open any frame.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Write the header to the sink, ahead of the first frame.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the stream is no longer streaming, or a header or
    ///   frame was already written
    /// - `Io` if the sink fails
    pub fn write_header(&mut self) -> Result<()> {
        self.phase.ensure_streaming("write header to")?;
        if self.header_sent || self.frames > 0 {
            return Err(StreamError::InvalidState {
                phase: self.phase,
                operation: "write a second header to",
            });
        }

        self.sink.write_all(self.header.as_bytes())?;
        self.header_sent = true;
        Ok(())
    }

    /// Associated data for the next operation only.
    ///
    /// Authenticated but never written to the sink; the decoder must supply
    /// the same bytes for the matching frame.
    pub fn set_associated_data(&mut self, associated_data: impl Into<Vec<u8>>) {
        self.associated_data = associated_data.into();
    }

    /// Tag for the next [`Encoder::write`] only. Defaults to
    /// [`Tag::Message`].
    ///
    /// Setting [`Tag::Final`] makes that write end the stream.
    pub fn set_tag(&mut self, tag: Tag) {
        self.tag = tag;
    }

    /// Seal `plaintext` with the pending tag and associated data and write the
    /// frame.
    ///
    /// Returns the number of bytes written to the sink.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the stream is finalized or desynchronized
    /// - `MessageTooLarge` if `plaintext` does not fit in a frame
    /// - `Io` if the sink fails; the stream becomes desynchronized
    pub fn write(&mut self, plaintext: &[u8]) -> Result<usize> {
        self.phase.ensure_streaming("write")?;
        let (tag, associated_data) = self.take_pending(plaintext.len(), None)?;
        self.seal_and_send(plaintext, tag, &associated_data)
    }

    /// Seal `plaintext` as the last frame of the stream.
    ///
    /// The pending tag is ignored; any later write fails with
    /// `InvalidState`.
    ///
    /// # Errors
    ///
    /// Same as [`Encoder::write`].
    pub fn write_final(&mut self, plaintext: &[u8]) -> Result<usize> {
        self.phase.ensure_streaming("write final frame to")?;
        let (tag, associated_data) = self.take_pending(plaintext.len(), Some(Tag::Final))?;
        self.seal_and_send(plaintext, tag, &associated_data)
    }

    /// End the stream with an empty Final frame.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the stream was already finalized (including by a
    ///   previous `close`)
    /// - `Io` if the sink fails
    pub fn close(&mut self) -> Result<()> {
        self.phase.ensure_streaming("close")?;
        let (tag, associated_data) = self.take_pending(0, Some(Tag::Final))?;
        self.seal_and_send(&[], tag, &associated_data).map(|_| ())
    }

    /// Rekey the local state without emitting a frame.
    ///
    /// The decoder must call [`crate::Decoder::rekey`] after reading the same
    /// number of frames.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the stream is finalized or desynchronized
    pub fn rekey(&mut self) -> Result<()> {
        self.phase.ensure_streaming("rekey")?;
        self.state.rekey();
        debug!(frames = self.frames, "encoder rekeyed");
        Ok(())
    }

    /// Flush the sink.
    ///
    /// # Errors
    ///
    /// - `Io` if the sink fails
    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns true once a Final frame has been written.
    pub fn is_finalized(&self) -> bool {
        self.phase == Phase::Finalized
    }

    /// Number of frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames
    }

    /// Shared reference to the sink.
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Mutable reference to the sink.
    ///
    /// Writing to it directly corrupts the frame sequence.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    /// Consume the encoder and return the sink.
    pub fn into_inner(self) -> W {
        self.sink
    }

    /// Check the chunk size, then consume the pending tag and associated data.
    ///
    /// A rejected chunk leaves both pending values in place.
    fn take_pending(&mut self, len: usize, tag: Option<Tag>) -> Result<(Tag, Vec<u8>)> {
        if !fits_in_frame(len) {
            return Err(StreamError::MessageTooLarge { size: len, max: MESSAGE_MAX });
        }
        let pending = mem::take(&mut self.tag);
        Ok((tag.unwrap_or(pending), mem::take(&mut self.associated_data)))
    }

    fn seal_and_send(&mut self, plaintext: &[u8], tag: Tag, associated_data: &[u8]) -> Result<usize> {
        let frame = self.state.seal(plaintext, associated_data, tag)?;

        if let Err(err) = self.sink.write_all(&frame) {
            self.phase = Phase::Desynchronized;
            debug!(frame = self.frames, error = %err, "sink failed after sealing; encoder desynchronized");
            return Err(err.into());
        }

        trace!(frame = self.frames, len = frame.len(), %tag, "sealed frame");
        self.frames += 1;

        if tag.is_final() {
            self.phase = Phase::Finalized;
            debug!(frames = self.frames, "encoder finalized");
        } else if tag.triggers_rekey() {
            debug!(frames = self.frames, "encoder rekeyed by tag");
        }

        Ok(frame.len())
    }
}
