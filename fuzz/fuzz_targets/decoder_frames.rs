//! Fuzz target for Decoder::read on attacker-controlled bytes
//!
//! # Strategy
//!
//! - Arbitrary key and header
//! - Arbitrary wire bytes, optionally prefixed with a header
//! - Arbitrary sequence of read buffer sizes (including 0)
//!
//! # Invariants
//!
//! - NEVER panic
//! - Unauthenticated bytes never open successfully
//! - After any error other than an empty source, the decoder stays
//!   desynchronized and rejects further reads

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use secretstream::{Decoder, Header, Key, Phase, StreamError, HEADER_SIZE, KEY_SIZE};

#[derive(Debug, Arbitrary)]
struct Input {
    key: [u8; KEY_SIZE],
    header: [u8; HEADER_SIZE],
    /// Read the header from the wire instead of using `header`
    header_on_wire: bool,
    read_sizes: Vec<u16>,
    wire: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let key = Key::from(input.key);

    let decoder = if input.header_on_wire {
        Decoder::read_header(&key, input.wire.as_slice())
    } else {
        Ok(Decoder::new(&key, &Header::from(input.header), input.wire.as_slice()))
    };
    let Ok(mut decoder) = decoder else {
        assert!(input.wire.len() < HEADER_SIZE, "full header prefix must be accepted");
        return;
    };

    for size in input.read_sizes.iter().take(64) {
        let mut buf = vec![0u8; usize::from(*size % 4096)];
        match decoder.read(&mut buf) {
            Ok(chunk) => panic!("forged frame opened: {chunk:?}"),
            Err(StreamError::SourceExhausted { received: 0, .. }) => {
                assert_eq!(decoder.phase(), Phase::Streaming);
            }
            Err(_) => {
                assert_eq!(decoder.phase(), Phase::Desynchronized);
                assert!(matches!(
                    decoder.read(&mut buf),
                    Err(StreamError::InvalidState { .. })
                ));
                return;
            }
        }
    }
});
