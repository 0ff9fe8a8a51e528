//! Fixed-capacity, NUL-terminated string members.

use std::borrow::Cow;
use std::ffi::c_char;

/// Copy `src` into a fixed buffer.
///
/// At most `N - 1` bytes are copied, cut back to a UTF-8 character boundary.
/// The remainder of the buffer is zero-filled, so the result is always
/// NUL-terminated. Returns the number of bytes copied.
pub fn copy_to_fixed<const N: usize>(dst: &mut [c_char; N], src: &str) -> usize {
    if N == 0 {
        return 0;
    }
    let mut len = src.len().min(N - 1);
    while !src.is_char_boundary(len) {
        len -= 1;
    }
    for (slot, byte) in dst.iter_mut().zip(src.as_bytes()[..len].iter()) {
        *slot = *byte as c_char;
    }
    for slot in &mut dst[len..] {
        *slot = 0;
    }
    len
}

/// Read a fixed buffer up to its first NUL (or its full length).
///
/// Borrows from `src` when the bytes are valid UTF-8. Invalid sequences are
/// replaced rather than rejected, which allocates.
#[must_use]
pub fn fixed_to_str<const N: usize>(src: &[c_char; N]) -> Cow<'_, str> {
    let bytes: &[u8] = bytemuck::cast_slice(src.as_slice());
    let len = bytes.iter().position(|&b| b == 0).unwrap_or(N);
    String::from_utf8_lossy(&bytes[..len])
}

/// `true` if the buffer holds a terminating NUL.
#[must_use]
pub fn is_terminated<const N: usize>(src: &[c_char; N]) -> bool {
    src.contains(&0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_string_is_copied_and_zero_filled() {
        let mut buf = [0x55 as c_char; 8];
        assert_eq!(copy_to_fixed(&mut buf, "abc"), 3);
        assert_eq!(fixed_to_str(&buf), "abc");
        assert!(buf[3..].iter().all(|&c| c == 0));
    }

    #[test]
    fn long_string_is_truncated_and_terminated() {
        let mut buf = [0 as c_char; 4];
        assert_eq!(copy_to_fixed(&mut buf, "abcdef"), 3);
        assert_eq!(buf[3], 0);
        assert_eq!(fixed_to_str(&buf), "abc");
        assert!(is_terminated(&buf));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let mut buf = [0 as c_char; 4];
        // 'é' is two bytes; "aé" fits, "aéé" would split the second one.
        assert_eq!(copy_to_fixed(&mut buf, "aéé"), 3);
        assert_eq!(fixed_to_str(&buf), "aé");
    }

    #[test]
    fn unterminated_buffer_reads_full_length() {
        let buf = [b'x' as c_char; 3];
        assert!(!is_terminated(&buf));
        assert_eq!(fixed_to_str(&buf), "xxx");
    }

    #[test]
    fn valid_utf8_is_borrowed() {
        let mut buf = [0 as c_char; 8];
        copy_to_fixed(&mut buf, "héllo");
        assert!(matches!(fixed_to_str(&buf), Cow::Borrowed("héllo")));
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let buf = [b'a' as c_char, 0xff_u8 as c_char, 0, 0];
        let read = fixed_to_str(&buf);
        assert!(matches!(read, Cow::Owned(_)));
        assert_eq!(read, "a\u{fffd}");
    }

    #[test]
    fn zero_capacity_copies_nothing() {
        let mut buf: [c_char; 0] = [];
        assert_eq!(copy_to_fixed(&mut buf, "abc"), 0);
    }
}
