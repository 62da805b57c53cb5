//! File encryption and decryption.
//!
//! Encrypted files are laid out as:
//!
//! ```text
//! header (HEADER_SIZE) || frame(chunk_size) * n || frame(<= chunk_size, Final)
//! ```
//!
//! Every frame but the last carries exactly `chunk_size` plaintext bytes. The
//! last frame is always tagged Final and may be shorter, or empty when the
//! input is empty. Decryption must use the chunk size used for encryption.

use std::{
    io::{self, Read, Write},
    mem,
};

use secretstream::{Decoder, Encoder, Key, MESSAGE_MAX};
use tracing::{debug, info};

use crate::error::CliError;

/// Default plaintext bytes per frame.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Settings shared by [`encrypt`] and [`decrypt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipeConfig {
    /// Plaintext bytes per frame
    pub chunk_size: usize,
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self { chunk_size: DEFAULT_CHUNK_SIZE }
    }
}

impl PipeConfig {
    /// Check the settings before any I/O happens.
    pub fn validate(&self) -> Result<(), CliError> {
        if self.chunk_size == 0 {
            return Err(CliError::Config("chunk size must be at least 1 byte".into()));
        }
        if self.chunk_size as u64 > MESSAGE_MAX {
            return Err(CliError::Config(format!(
                "chunk size {} exceeds the frame limit of {MESSAGE_MAX} bytes",
                self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Totals for one run of [`encrypt`] or [`decrypt`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipeStats {
    /// Frames sealed or opened, including the Final frame
    pub frames: u64,
    /// Plaintext bytes consumed or produced
    pub plaintext_bytes: u64,
}

/// Encrypt everything in `input` into `output`.
///
/// Reads one chunk ahead so the last chunk can be sealed as Final without an
/// extra empty frame.
pub fn encrypt<R: Read, W: Write>(
    key: &Key,
    mut input: R,
    output: W,
    config: &PipeConfig,
) -> Result<PipeStats, CliError> {
    config.validate()?;
    let chunk_size = config.chunk_size;

    let mut encoder = Encoder::new(key, output)?;
    encoder.write_header()?;

    let mut stats = PipeStats::default();
    let mut current = Vec::with_capacity(chunk_size);
    let mut next = Vec::with_capacity(chunk_size);
    read_chunk(&mut input, &mut current, chunk_size)?;

    loop {
        if current.len() == chunk_size {
            read_chunk(&mut input, &mut next, chunk_size)?;
            if !next.is_empty() {
                encoder.write(&current)?;
                stats.frames += 1;
                stats.plaintext_bytes += chunk_size as u64;
                mem::swap(&mut current, &mut next);
                continue;
            }
        }

        encoder.write_final(&current)?;
        stats.frames += 1;
        stats.plaintext_bytes += current.len() as u64;
        break;
    }

    encoder.flush()?;
    info!(frames = stats.frames, bytes = stats.plaintext_bytes, chunk_size, "encrypted stream");
    Ok(stats)
}

/// Decrypt a stream produced by [`encrypt`] from `input` into `output`.
///
/// Plaintext is written as each frame authenticates, so on error `output`
/// may hold a prefix of the original data. Bytes after the Final frame are
/// rejected.
pub fn decrypt<R: Read, W: Write>(
    key: &Key,
    input: R,
    mut output: W,
    config: &PipeConfig,
) -> Result<PipeStats, CliError> {
    config.validate()?;

    let mut decoder = Decoder::read_header(key, input)?;
    let mut stats = PipeStats::default();
    let mut buf = vec![0u8; config.chunk_size];

    loop {
        let chunk = decoder.read(&mut buf)?;
        output.write_all(&buf[..chunk.len])?;
        stats.frames += 1;
        stats.plaintext_bytes += chunk.len as u64;

        if chunk.is_final() {
            break;
        }
    }

    let mut trailing = Vec::new();
    read_chunk(&mut decoder.into_inner(), &mut trailing, 1)?;
    if !trailing.is_empty() {
        return Err(CliError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            "trailing data after final frame",
        )));
    }

    output.flush()?;
    debug!(frames = stats.frames, "reached final frame");
    info!(frames = stats.frames, bytes = stats.plaintext_bytes, "decrypted stream");
    Ok(stats)
}

/// Replace `buf` with up to `limit` bytes from `source`, stopping early only
/// at end of input.
fn read_chunk<R: Read>(source: &mut R, buf: &mut Vec<u8>, limit: usize) -> io::Result<()> {
    buf.clear();
    source.take(limit as u64).read_to_end(buf)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use secretstream::{HEADER_SIZE, KEY_SIZE, OVERHEAD, StreamError};

    use super::*;

    fn key() -> Key {
        Key::from([4u8; KEY_SIZE])
    }

    fn config(chunk_size: usize) -> PipeConfig {
        PipeConfig { chunk_size }
    }

    #[test]
    fn default_chunk_size_is_valid() {
        assert_eq!(PipeConfig::default().chunk_size, 64 * 1024);
        assert!(PipeConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_chunk_size_is_rejected_before_io() {
        let mut output = Vec::new();
        assert!(matches!(
            encrypt(&key(), &b"data"[..], &mut output, &config(0)),
            Err(CliError::Config(_))
        ));
        assert!(output.is_empty());
    }

    #[test]
    fn empty_input_is_header_and_empty_final() {
        let mut output = Vec::new();
        let stats = encrypt(&key(), io::empty(), &mut output, &config(16)).unwrap();
        assert_eq!(stats, PipeStats { frames: 1, plaintext_bytes: 0 });
        assert_eq!(output.len(), HEADER_SIZE + OVERHEAD);
    }

    #[test]
    fn exact_multiple_has_no_trailing_empty_frame() {
        let mut output = Vec::new();
        let stats = encrypt(&key(), &[7u8; 32][..], &mut output, &config(16)).unwrap();
        assert_eq!(stats.frames, 2);
        assert_eq!(output.len(), HEADER_SIZE + 2 * (16 + OVERHEAD));
    }

    #[test]
    fn roundtrip_in_memory() {
        let plaintext: Vec<u8> = (0..100u8).collect();
        let mut sealed = Vec::new();
        encrypt(&key(), plaintext.as_slice(), &mut sealed, &config(7)).unwrap();

        let mut opened = Vec::new();
        let stats = decrypt(&key(), sealed.as_slice(), &mut opened, &config(7)).unwrap();
        assert_eq!(opened, plaintext);
        assert_eq!(stats, PipeStats { frames: 15, plaintext_bytes: 100 });
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut sealed = Vec::new();
        encrypt(&key(), &b"payload"[..], &mut sealed, &config(16)).unwrap();
        sealed.push(0);

        let mut opened = Vec::new();
        assert!(matches!(
            decrypt(&key(), sealed.as_slice(), &mut opened, &config(16)),
            Err(CliError::Io(err)) if err.kind() == io::ErrorKind::InvalidData
        ));
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let mut sealed = Vec::new();
        encrypt(&key(), &b"payload"[..], &mut sealed, &config(16)).unwrap();

        let mut opened = Vec::new();
        assert!(matches!(
            decrypt(&Key::from([5u8; KEY_SIZE]), sealed.as_slice(), &mut opened, &config(16)),
            Err(CliError::Stream(StreamError::DecryptionFailed { .. }))
        ));
        assert!(opened.is_empty());
    }

    #[test]
    fn read_chunk_stops_at_limit_and_end_of_input() {
        let mut source = &b"abcdefg"[..];
        let mut buf = vec![0xff; 2];

        read_chunk(&mut source, &mut buf, 4).unwrap();
        assert_eq!(buf, b"abcd");
        read_chunk(&mut source, &mut buf, 4).unwrap();
        assert_eq!(buf, b"efg");
        read_chunk(&mut source, &mut buf, 4).unwrap();
        assert!(buf.is_empty());
    }
}
