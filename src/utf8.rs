//! UTF-8 helpers for string payloads.
//!
//! Short strings, which dominate map keys, go through a hand-rolled decoder; long ones
//! go through the standard library's lossy conversion. Both paths produce identical
//! output: every invalid sequence becomes U+FFFD.

/// Byte length above which [`utf8_decode`] delegates to the standard library.
pub const TEXT_DECODER_THRESHOLD: usize = 200;

/// Number of bytes `s` occupies once encoded.
#[inline]
#[must_use]
pub fn utf8_count(s: &str) -> usize {
    s.len()
}

/// Writes `s` into the front of `output`.
///
/// # Panics
///
/// Panics if `output` is shorter than [`utf8_count`] of `s`.
#[inline]
pub fn utf8_encode(s: &str, output: &mut [u8]) {
    output[..s.len()].copy_from_slice(s.as_bytes());
}

/// Decodes a UTF-8 payload, substituting U+FFFD for malformed sequences.
///
/// # Examples
///
/// ```rust
/// use msgpack_codec::utf8::utf8_decode;
///
/// assert_eq!(utf8_decode(b"caf\xc3\xa9"), "café");
/// assert_eq!(utf8_decode(b"a\xffb"), "a\u{fffd}b");
/// ```
#[must_use]
pub fn utf8_decode(bytes: &[u8]) -> String {
    if bytes.len() > TEXT_DECODER_THRESHOLD {
        String::from_utf8_lossy(bytes).into_owned()
    } else {
        utf8_decode_manual(bytes)
    }
}

/// Hand-rolled decoder for short payloads.
///
/// Falls back to lossy conversion as soon as a malformed sequence shows up so the
/// replacement behavior matches the standard library exactly.
#[must_use]
pub fn utf8_decode_manual(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut offset = 0;
    while offset < bytes.len() {
        let byte1 = bytes[offset];
        if byte1 < 0x80 {
            out.push(char::from(byte1));
            offset += 1;
            continue;
        }
        match decode_sequence(&bytes[offset..]) {
            Some((ch, width)) => {
                out.push(ch);
                offset += width;
            }
            None => return String::from_utf8_lossy(bytes).into_owned(),
        }
    }
    out
}

#[inline]
const fn is_continuation(byte: u8) -> bool {
    byte & 0xc0 == 0x80
}

// Decodes one multi-byte sequence, rejecting overlong forms and surrogates.
fn decode_sequence(bytes: &[u8]) -> Option<(char, usize)> {
    let byte1 = bytes[0];
    match byte1 {
        0xc2..=0xdf => {
            let byte2 = *bytes.get(1)?;
            if !is_continuation(byte2) {
                return None;
            }
            let unit = (u32::from(byte1 & 0x1f) << 6) | u32::from(byte2 & 0x3f);
            char::from_u32(unit).map(|ch| (ch, 2))
        }
        0xe0..=0xef => {
            let byte2 = *bytes.get(1)?;
            let byte3 = *bytes.get(2)?;
            let second_ok = match byte1 {
                0xe0 => (0xa0..=0xbf).contains(&byte2),
                0xed => (0x80..=0x9f).contains(&byte2),
                _ => is_continuation(byte2),
            };
            if !second_ok || !is_continuation(byte3) {
                return None;
            }
            let unit = (u32::from(byte1 & 0x0f) << 12)
                | (u32::from(byte2 & 0x3f) << 6)
                | u32::from(byte3 & 0x3f);
            char::from_u32(unit).map(|ch| (ch, 3))
        }
        0xf0..=0xf4 => {
            let byte2 = *bytes.get(1)?;
            let byte3 = *bytes.get(2)?;
            let byte4 = *bytes.get(3)?;
            let second_ok = match byte1 {
                0xf0 => (0x90..=0xbf).contains(&byte2),
                0xf4 => (0x80..=0x8f).contains(&byte2),
                _ => is_continuation(byte2),
            };
            if !second_ok || !is_continuation(byte3) || !is_continuation(byte4) {
                return None;
            }
            let unit = (u32::from(byte1 & 0x07) << 18)
                | (u32::from(byte2 & 0x3f) << 12)
                | (u32::from(byte3 & 0x3f) << 6)
                | u32::from(byte4 & 0x3f);
            char::from_u32(unit).map(|ch| (ch, 4))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_count() {
        assert_eq!(utf8_count(""), 0);
        assert_eq!(utf8_count("abc"), 3);
        assert_eq!(utf8_count("é"), 2);
        assert_eq!(utf8_count("€"), 3);
        assert_eq!(utf8_count("😀"), 4);
    }

    #[test]
    fn test_utf8_encode() {
        let mut buf = [0u8; 8];
        utf8_encode("hé", &mut buf);
        assert_eq!(&buf[..3], b"h\xc3\xa9");
    }

    #[test]
    fn test_manual_decode_matches_std() {
        let samples: [&[u8]; 9] = [
            b"",
            b"plain ascii",
            "日本語テキスト".as_bytes(),
            "emoji 😀 mix".as_bytes(),
            b"\xc0\x80",
            b"\xed\xa0\x80",
            b"\xe2\x82",
            b"ok\xf4\x90\x80\x80tail",
            b"\xf0\x9f\x98",
        ];
        for sample in samples {
            assert_eq!(
                utf8_decode_manual(sample),
                String::from_utf8_lossy(sample),
                "sample {:?}",
                sample
            );
        }
    }

    #[test]
    fn test_long_input_uses_std_path() {
        let long = "x".repeat(TEXT_DECODER_THRESHOLD + 1);
        assert_eq!(utf8_decode(long.as_bytes()), long);
    }
}
