//! Frame size bookkeeping shared by the encoder and decoder.
//!
//! A frame is `encrypted tag (1 byte) || ciphertext || Poly1305 tag (16
//! bytes)`. There is no length prefix: the receiver reads frames with the same
//! chunk size the sender wrote them with.

/// Size of the Poly1305 authenticator.
pub const MAC_SIZE: usize = 16;

/// Bytes a frame adds on top of its plaintext.
pub const OVERHEAD: usize = 1 + MAC_SIZE;

/// Largest plaintext a single frame may carry.
///
/// ChaCha20's 32-bit block counter starts at 2 for message data, leaving
/// `2^32 - 2` blocks of 64 bytes.
pub const MESSAGE_MAX: u64 = 64 * ((1 << 32) - 2);

/// Frame length for a plaintext of `plaintext_len` bytes.
///
/// Returns `None` if the length would overflow `usize`.
pub const fn frame_len(plaintext_len: usize) -> Option<usize> {
    plaintext_len.checked_add(OVERHEAD)
}

/// Plaintext length carried by a frame of `frame_len` bytes.
///
/// Returns `None` if the frame cannot even hold an authenticator.
pub const fn plaintext_len(frame_len: usize) -> Option<usize> {
    frame_len.checked_sub(OVERHEAD)
}

/// Returns true if `plaintext_len` fits in one frame.
pub fn fits_in_frame(plaintext_len: usize) -> bool {
    (plaintext_len as u64) <= MESSAGE_MAX
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overhead_is_tag_plus_mac() {
        assert_eq!(OVERHEAD, 17);
    }

    #[test]
    fn frame_and_plaintext_lengths_are_inverse() {
        for len in [0usize, 1, 5, 4096, 65_536] {
            let frame = frame_len(len).unwrap();
            assert_eq!(frame, len + OVERHEAD);
            assert_eq!(plaintext_len(frame), Some(len));
        }
    }

    #[test]
    fn short_frames_have_no_plaintext_length() {
        assert_eq!(plaintext_len(0), None);
        assert_eq!(plaintext_len(OVERHEAD - 1), None);
        assert_eq!(plaintext_len(OVERHEAD), Some(0));
    }

    #[test]
    fn frame_len_overflow() {
        assert_eq!(frame_len(usize::MAX), None);
    }

    #[test]
    fn message_max_boundary() {
        assert!(fits_in_frame(0));
        assert!(fits_in_frame(1 << 20));
        assert_eq!(MESSAGE_MAX, 274_877_906_816);
    }
}
