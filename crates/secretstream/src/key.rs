//! Fixed-size key and header types.
//!
//! Both are plain byte arrays whose size is a protocol constant. Constructors
//! from untrusted slices check the length; everything else works on arrays so
//! the size is carried by the type.

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::error::{Result, StreamError};

/// Size of a stream key in bytes.
pub const KEY_SIZE: usize = 32;

/// Size of a stream header in bytes.
pub const HEADER_SIZE: usize = 24;

/// Shared secret for one or more streams.
///
/// Zeroized on drop. `Debug` never prints the key material and equality is
/// checked in constant time.
#[derive(Clone)]
pub struct Key([u8; KEY_SIZE]);

impl Key {
    /// Generate a key from the OS random number generator.
    ///
    /// # Errors
    ///
    /// - `Entropy` if the OS RNG is unavailable
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; KEY_SIZE];
        fill_random(&mut bytes)?;
        Ok(Self(bytes))
    }

    /// Build a key from a slice of exactly [`KEY_SIZE`] bytes.
    ///
    /// # Errors
    ///
    /// - `InvalidKey` if `bytes` has any other length
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let array: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| StreamError::InvalidKey { expected: KEY_SIZE, actual: bytes.len() })?;
        Ok(Self(array))
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl From<[u8; KEY_SIZE]> for Key {
    fn from(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Key {
    type Error = StreamError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes(bytes)
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_slice().ct_eq(other.0.as_slice()).into()
    }
}

impl Eq for Key {}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key([REDACTED])")
    }
}

impl Drop for Key {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Public stream initializer.
///
/// Generated once per encoder and delivered to the decoder before the first
/// frame, either prepended to the same transport or out of band. It carries
/// no secret but binds the stream's subkey and nonce, so a decoder built from
/// a different header rejects every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Header([u8; HEADER_SIZE]);

impl Header {
    /// Generate a fresh header from the OS random number generator.
    ///
    /// # Errors
    ///
    /// - `Entropy` if the OS RNG is unavailable
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; HEADER_SIZE];
        fill_random(&mut bytes)?;
        Ok(Self(bytes))
    }

    /// Rebuild a header received from the wire.
    ///
    /// # Errors
    ///
    /// - `InvalidHeader` if `bytes` is not exactly [`HEADER_SIZE`] long
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let array: [u8; HEADER_SIZE] = bytes.try_into().map_err(|_| {
            StreamError::InvalidHeader { expected: HEADER_SIZE, actual: bytes.len() }
        })?;
        Ok(Self(array))
    }

    /// Raw header bytes, as transmitted.
    pub fn as_bytes(&self) -> &[u8; HEADER_SIZE] {
        &self.0
    }
}

impl From<[u8; HEADER_SIZE]> for Header {
    fn from(bytes: [u8; HEADER_SIZE]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Header {
    type Error = StreamError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes(bytes)
    }
}

fn fill_random(buffer: &mut [u8]) -> Result<()> {
    getrandom::fill(buffer).map_err(|err| StreamError::Entropy(err.to_string()))
}
