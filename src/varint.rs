//! Unsigned LEB128 varint codec.
//!
//! Seven payload bits per byte, low-order first, continuation bit `0x80`.
//! Mirrors `original_source/ssot/cpp_index/src/common.h`'s
//! `write_varint`/`read_varint`.

use std::io::{self, Read, Write};

/// Maximum bytes a 64-bit varint can occupy before a read is considered malformed.
const MAX_VARINT_BYTES: usize = 10;

/// Encode `value` as a varint and write it to `out`.
pub fn write_varint<W: Write>(out: &mut W, mut value: u64) -> io::Result<()> {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            out.write_all(&[byte | 0x80])?;
        } else {
            out.write_all(&[byte])?;
            return Ok(());
        }
    }
}

/// Encode `value` into a freshly allocated byte vector.
pub fn encode(value: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(10);
    write_varint(&mut buf, value).expect("writing to a Vec cannot fail");
    buf
}

/// Decode a varint from `input`. Fails if the continuation run exceeds
/// [`MAX_VARINT_BYTES`] bytes or the reader runs out of data first.
pub fn read_varint<R: Read>(input: &mut R) -> io::Result<u64> {
    let mut value: u64 = 0;
    let mut shift: u32 = 0;
    for _ in 0..MAX_VARINT_BYTES {
        let mut byte = [0u8; 1];
        input.read_exact(&mut byte)?;
        let byte = byte[0];
        value |= ((byte & 0x7f) as u64) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
    Err(io::Error::new(
        io::ErrorKind::InvalidData,
        "varint did not terminate within 10 bytes",
    ))
}

/// Decode a single varint from the front of `bytes`, returning the value and
/// the number of bytes consumed.
pub fn decode(bytes: &[u8]) -> io::Result<(u64, usize)> {
    let mut cursor = bytes;
    let before = cursor.len();
    let value = read_varint(&mut cursor)?;
    Ok((value, before - cursor.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_boundaries() {
        let cases: &[(u64, usize)] = &[
            (0, 1),
            (127, 1),
            (128, 2),
            (16383, 2),
            (16384, 3),
            (u32::MAX as u64, 5),
            (u64::MAX, 10),
        ];
        for &(value, expected_len) in cases {
            let buf = encode(value);
            assert_eq!(buf.len(), expected_len, "length mismatch for {value}");
            let (decoded, consumed) = decode(&buf).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(consumed, buf.len());
        }
    }

    #[test]
    fn rejects_unterminated_varint() {
        let bytes = [0x80u8; 11];
        assert!(read_varint(&mut &bytes[..]).is_err());
    }

    #[test]
    fn rejects_short_read() {
        let bytes = [0x80u8, 0x80];
        assert!(read_varint(&mut &bytes[..]).is_err());
    }
}
