//! Fuzz target for Encoder/Decoder round trips
//!
//! # Strategy
//!
//! - Arbitrary chunk sizes, tags and associated data per frame
//! - Explicit rekeys interleaved on both sides
//! - Optional single-byte corruption of the sealed stream
//!
//! # Invariants
//!
//! - Every chunk, tag and associated data round-trips unchanged
//! - The stream ends exactly at the Final frame
//! - A corrupted byte is always rejected, never silently accepted

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use secretstream::{Decoder, Encoder, Header, Key, StreamError, Tag, HEADER_SIZE, KEY_SIZE};

#[derive(Debug, Arbitrary)]
enum FuzzTag {
    Message,
    Sync,
    Rekey,
}

impl From<&FuzzTag> for Tag {
    fn from(tag: &FuzzTag) -> Self {
        match tag {
            FuzzTag::Message => Tag::Message,
            FuzzTag::Sync => Tag::Sync,
            FuzzTag::Rekey => Tag::Rekey,
        }
    }
}

#[derive(Debug, Arbitrary)]
struct Step {
    chunk: Vec<u8>,
    tag: FuzzTag,
    associated_data: Vec<u8>,
    /// Explicit rekey on both sides before this frame
    rekey_before: bool,
}

#[derive(Debug, Arbitrary)]
struct Scenario {
    key: [u8; KEY_SIZE],
    header: [u8; HEADER_SIZE],
    steps: Vec<Step>,
    last: Vec<u8>,
    /// Position and XOR mask of a corrupted byte
    corruption: Option<(u16, u8)>,
}

fuzz_target!(|scenario: Scenario| {
    let key = Key::from(scenario.key);
    let header = Header::from(scenario.header);
    let steps = &scenario.steps[..scenario.steps.len().min(32)];

    let mut encoder = Encoder::with_header(&key, header, Vec::new());
    for step in steps {
        if step.rekey_before {
            encoder.rekey().unwrap();
        }
        encoder.set_tag(Tag::from(&step.tag));
        encoder.set_associated_data(step.associated_data.clone());
        encoder.write(&step.chunk).unwrap();
    }
    encoder.write_final(&scenario.last).unwrap();
    let mut wire = encoder.into_inner();

    let corrupted = match scenario.corruption {
        Some((position, mask)) if mask != 0 && !wire.is_empty() => {
            let position = usize::from(position) % wire.len();
            wire[position] ^= mask;
            true
        }
        _ => false,
    };

    let mut decoder = Decoder::new(&key, &header, wire.as_slice());
    let mut rejected = false;
    for step in steps {
        if step.rekey_before {
            decoder.rekey().unwrap();
        }
        decoder.set_associated_data(step.associated_data.clone());
        let mut buf = vec![0u8; step.chunk.len()];
        match decoder.read(&mut buf) {
            Ok(chunk) => {
                assert_eq!(chunk.tag, Tag::from(&step.tag));
                assert_eq!(&buf[..chunk.len], step.chunk.as_slice());
            }
            Err(StreamError::DecryptionFailed { .. }) if corrupted => {
                rejected = true;
                break;
            }
            Err(err) => panic!("unexpected error: {err}"),
        }
    }

    if !rejected {
        let mut buf = vec![0u8; scenario.last.len()];
        match decoder.read(&mut buf) {
            Ok(chunk) => {
                assert!(!corrupted, "corrupted stream accepted");
                assert!(chunk.is_final());
                assert_eq!(&buf[..chunk.len], scenario.last.as_slice());
            }
            Err(StreamError::DecryptionFailed { .. }) => assert!(corrupted),
            Err(err) => panic!("unexpected error: {err}"),
        }
    }
});
