//! Property-based tests for sealing and opening streams

use proptest::prelude::*;
use secretstream::{
    Decoder, Encoder, HEADER_SIZE, Header, KEY_SIZE, Key, OVERHEAD, StreamError, Tag, frame_len,
    plaintext_len,
};

/// One chunk as the writer emits it.
#[derive(Debug, Clone)]
struct Step {
    chunk: Vec<u8>,
    tag: Tag,
    associated_data: Vec<u8>,
}

fn non_final_tag() -> impl Strategy<Value = Tag> {
    prop_oneof![Just(Tag::Message), Just(Tag::Sync), Just(Tag::Rekey)]
}

fn step() -> impl Strategy<Value = Step> {
    (
        prop::collection::vec(any::<u8>(), 0..300),
        non_final_tag(),
        prop::collection::vec(any::<u8>(), 0..40),
    )
        .prop_map(|(chunk, tag, associated_data)| Step { chunk, tag, associated_data })
}

fn seal(key: &Key, header: Header, steps: &[Step], last: &[u8]) -> Result<Vec<u8>, StreamError> {
    let mut encoder = Encoder::with_header(key, header, Vec::new());
    for step in steps {
        encoder.set_tag(step.tag);
        encoder.set_associated_data(step.associated_data.clone());
        encoder.write(&step.chunk)?;
    }
    encoder.write_final(last)?;
    Ok(encoder.into_inner())
}

/// Property: Any sequence of chunks, tags and associated data round-trips
#[test]
fn prop_stream_roundtrip() {
    proptest!(|(
        key in any::<[u8; KEY_SIZE]>(),
        header in any::<[u8; HEADER_SIZE]>(),
        steps in prop::collection::vec(step(), 0..12),
        last in prop::collection::vec(any::<u8>(), 0..300),
    )| {
        let key = Key::from(key);
        let header = Header::from(header);
        let wire = seal(&key, header, &steps, &last)?;

        let mut decoder = Decoder::new(&key, &header, wire.as_slice());
        for step in &steps {
            let mut buf = vec![0u8; step.chunk.len()];
            decoder.set_associated_data(step.associated_data.clone());
            let chunk = decoder.read(&mut buf)?;

            prop_assert_eq!(chunk.tag, step.tag);
            prop_assert_eq!(&buf[..chunk.len], step.chunk.as_slice());
        }

        let mut buf = vec![0u8; last.len()];
        let chunk = decoder.read(&mut buf)?;
        prop_assert!(chunk.is_final());
        prop_assert_eq!(&buf[..chunk.len], last.as_slice());
        prop_assert!(decoder.is_finalized());
    });
}

/// Property: Wire length is the sum of plaintext lengths plus one overhead per frame
#[test]
fn prop_wire_length_is_exact() {
    proptest!(|(
        steps in prop::collection::vec(step(), 0..12),
        last in prop::collection::vec(any::<u8>(), 0..64),
    )| {
        let key = Key::from([5u8; KEY_SIZE]);
        let wire = seal(&key, Header::from([6u8; HEADER_SIZE]), &steps, &last)?;

        let expected: usize = steps
            .iter()
            .map(|step| step.chunk.len())
            .chain(std::iter::once(last.len()))
            .map(|len| frame_len(len).unwrap_or(usize::MAX))
            .sum();
        prop_assert_eq!(wire.len(), expected);
        prop_assert_eq!(plaintext_len(OVERHEAD), Some(0));
    });
}

/// Property: Flipping any single bit of a sealed frame makes it fail to open
#[test]
fn prop_single_bit_flip_is_rejected() {
    proptest!(|(
        chunk in prop::collection::vec(any::<u8>(), 0..200),
        associated_data in prop::collection::vec(any::<u8>(), 0..32),
        position in any::<prop::sample::Index>(),
        bit in 0u8..8,
    )| {
        let key = Key::from([7u8; KEY_SIZE]);
        let header = Header::from([8u8; HEADER_SIZE]);

        let mut encoder = Encoder::with_header(&key, header, Vec::new());
        encoder.set_associated_data(associated_data.clone());
        encoder.write(&chunk)?;
        let mut wire = encoder.into_inner();

        let position = position.index(wire.len());
        wire[position] ^= 1 << bit;

        let mut decoder = Decoder::new(&key, &header, wire.as_slice());
        decoder.set_associated_data(associated_data);
        let mut buf = vec![0u8; chunk.len()];
        let result = decoder.read(&mut buf);
        prop_assert!(matches!(result, Err(StreamError::DecryptionFailed { .. })), "{:?}", result);
    });
}

/// Property: Associated data that differs from the writer's fails to open
#[test]
fn prop_associated_data_mismatch_is_rejected() {
    proptest!(|(
        chunk in prop::collection::vec(any::<u8>(), 0..64),
        written in prop::collection::vec(any::<u8>(), 0..32),
        read in prop::collection::vec(any::<u8>(), 0..32),
    )| {
        prop_assume!(written != read);
        let key = Key::from([9u8; KEY_SIZE]);
        let header = Header::from([10u8; HEADER_SIZE]);

        let mut encoder = Encoder::with_header(&key, header, Vec::new());
        encoder.set_associated_data(written);
        encoder.write(&chunk)?;
        let wire = encoder.into_inner();

        let mut decoder = Decoder::new(&key, &header, wire.as_slice());
        decoder.set_associated_data(read);
        let mut buf = vec![0u8; chunk.len()];
        let rejected = matches!(decoder.read(&mut buf), Err(StreamError::DecryptionFailed { .. }));
        prop_assert!(rejected);
    });
}

/// Property: Two streams under one key with different headers never share ciphertext
#[test]
fn prop_distinct_headers_give_distinct_frames() {
    proptest!(|(
        chunk in prop::collection::vec(any::<u8>(), 1..64),
        a in any::<[u8; HEADER_SIZE]>(),
        b in any::<[u8; HEADER_SIZE]>(),
    )| {
        prop_assume!(a != b);
        let key = Key::from([11u8; KEY_SIZE]);

        let seal_one = |header: [u8; HEADER_SIZE]| -> Result<Vec<u8>, StreamError> {
            let mut encoder = Encoder::with_header(&key, Header::from(header), Vec::new());
            encoder.write(&chunk)?;
            Ok(encoder.into_inner())
        };

        prop_assert_ne!(seal_one(a)?, seal_one(b)?);
    });
}
