//! File encryption on top of `secretstream`.
//!
//! Library half of the `secretstream` binary: key file handling and the
//! encrypt/decrypt pipelines, kept out of `main.rs` so they can be tested
//! without spawning a process.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod keyfile;
pub mod pipeline;

pub use error::CliError;
pub use pipeline::{DEFAULT_CHUNK_SIZE, PipeConfig, PipeStats, decrypt, encrypt};
