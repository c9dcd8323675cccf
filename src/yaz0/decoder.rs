// Yaz0 decoder.
//
// The header's uncompressed size is authoritative: decoding stops as soon
// as that many bytes exist, and a back-reference that would run past it is
// cut short. Every read of the token stream is bounds-checked.

use super::Yaz0Error;
use super::header::{HEADER_SIZE, Yaz0Header};

/// Upper bound on output bytes per input byte (a 3-byte token yields at
/// most 273 bytes). Caps the up-front allocation for hostile headers.
const MAX_EXPANSION: usize = 92;

/// Cursor over the token stream that reports the failing offset.
struct TokenReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl TokenReader<'_> {
    #[inline]
    fn byte(&mut self) -> Result<u8, Yaz0Error> {
        let b = *self
            .data
            .get(self.pos)
            .ok_or(Yaz0Error::Truncated { offset: self.pos })?;
        self.pos += 1;
        Ok(b)
    }
}

/// Decompress a complete Yaz0 stream.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, Yaz0Error> {
    let header = Yaz0Header::parse(data)?;
    let size = header.uncompressed_size as usize;
    let capacity = size.min((data.len() - HEADER_SIZE).saturating_mul(MAX_EXPANSION));
    let mut out = Vec::with_capacity(capacity);

    let mut r = TokenReader {
        data,
        pos: HEADER_SIZE,
    };
    let mut flags = 0u8;
    let mut remaining_bits = 0u32;

    while out.len() < size {
        if remaining_bits == 0 {
            flags = r.byte()?;
            remaining_bits = 8;
        }

        if flags & 0x80 != 0 {
            out.push(r.byte()?);
        } else {
            let b1 = r.byte()?;
            let b2 = r.byte()?;
            let distance = (((b1 & 0x0F) as usize) << 8 | b2 as usize) + 1;
            let length = match b1 >> 4 {
                0 => r.byte()? as usize + 0x12,
                n => n as usize + 2,
            };
            if distance > out.len() {
                return Err(Yaz0Error::InvalidDistance {
                    position: out.len(),
                    distance,
                });
            }

            let length = length.min(size - out.len());
            let start = out.len() - distance;
            if distance >= length {
                out.extend_from_within(start..start + length);
            } else {
                // Overlapping copy: each byte may be one just written.
                for i in 0..length {
                    let b = out[start + i];
                    out.push(b);
                }
            }
        }

        flags <<= 1;
        remaining_bits -= 1;
    }

    log::debug!(
        "yaz0: decompressed {} -> {} bytes",
        data.len(),
        out.len()
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(size: u32, tokens: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        Yaz0Header::new(size).encode(&mut out);
        out.extend_from_slice(tokens);
        out
    }

    #[test]
    fn literals() {
        let data = stream(3, &[0xE0, b'a', b'b', b'c']);
        assert_eq!(decompress(&data).unwrap(), b"abc");
    }

    #[test]
    fn short_overlapping_copy() {
        // 'a', then copy 5 from distance 1.
        let data = stream(6, &[0x80, b'a', 0x30, 0x00]);
        assert_eq!(decompress(&data).unwrap(), b"aaaaaa");
    }

    #[test]
    fn long_copy() {
        // "ab", then copy 0x12 + 2 = 20 bytes from distance 2.
        let data = stream(22, &[0xC0, b'a', b'b', 0x00, 0x01, 0x02]);
        assert_eq!(decompress(&data).unwrap(), b"ab".repeat(11));
    }

    #[test]
    fn copy_clamped_to_declared_size() {
        let data = stream(4, &[0x80, b'x', 0xF0, 0x00]);
        assert_eq!(decompress(&data).unwrap(), b"xxxx");
    }

    #[test]
    fn trailing_padding_ignored() {
        let data = stream(1, &[0x80, b'q', 0, 0]);
        assert_eq!(decompress(&data).unwrap(), b"q");
    }

    #[test]
    fn distance_before_start() {
        let data = stream(8, &[0x80, b'a', 0x10, 0x01]);
        assert_eq!(
            decompress(&data),
            Err(Yaz0Error::InvalidDistance {
                position: 1,
                distance: 2
            })
        );
    }

    #[test]
    fn truncated_token_stream() {
        let data = stream(4, &[0xF0, b'a', b'b']);
        assert_eq!(
            decompress(&data),
            Err(Yaz0Error::Truncated { offset: 19 })
        );
        // Missing third byte of a long-form copy.
        let data = stream(40, &[0x80, b'a', 0x00, 0x00]);
        assert_eq!(
            decompress(&data),
            Err(Yaz0Error::Truncated { offset: 20 })
        );
    }

    #[test]
    fn hostile_size_does_not_preallocate() {
        let data = stream(u32::MAX, &[]);
        assert_eq!(
            decompress(&data),
            Err(Yaz0Error::Truncated { offset: HEADER_SIZE })
        );
    }
}
