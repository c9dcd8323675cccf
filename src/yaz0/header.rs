// Yaz0 stream header.
//
//   0x00  magic "Yaz0"
//   0x04  uncompressed size, u32 big-endian
//   0x08  8 reserved bytes (zero on write, ignored on read)
//   0x10  token stream

use super::Yaz0Error;

pub const YAZ0_MAGIC: [u8; 4] = *b"Yaz0";
/// Bytes before the token stream.
pub const HEADER_SIZE: usize = 0x10;

/// Parsed Yaz0 header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Yaz0Header {
    pub uncompressed_size: u32,
}

impl Yaz0Header {
    pub fn new(uncompressed_size: u32) -> Self {
        Self { uncompressed_size }
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&YAZ0_MAGIC);
        out.extend_from_slice(&self.uncompressed_size.to_be_bytes());
        out.extend_from_slice(&[0u8; 8]);
    }

    pub fn parse(data: &[u8]) -> Result<Self, Yaz0Error> {
        if data.len() < HEADER_SIZE {
            return Err(Yaz0Error::Truncated { offset: data.len() });
        }
        let found = [data[0], data[1], data[2], data[3]];
        if found != YAZ0_MAGIC {
            return Err(Yaz0Error::BadMagic { found });
        }
        let uncompressed_size = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        Ok(Self { uncompressed_size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout() {
        let mut buf = Vec::new();
        Yaz0Header::new(0x0102_0304).encode(&mut buf);
        assert_eq!(buf.len(), HEADER_SIZE);
        assert_eq!(&buf[..8], b"Yaz0\x01\x02\x03\x04");
        assert!(buf[8..].iter().all(|&b| b == 0));
        assert_eq!(Yaz0Header::parse(&buf).unwrap().uncompressed_size, 0x0102_0304);
    }

    #[test]
    fn reserved_bytes_ignored() {
        let mut buf = b"Yaz0\x00\x00\x00\x05".to_vec();
        buf.extend_from_slice(&[0xAB; 8]);
        assert_eq!(Yaz0Header::parse(&buf).unwrap(), Yaz0Header::new(5));
    }

    #[test]
    fn rejects_short_and_foreign_input() {
        assert_eq!(
            Yaz0Header::parse(b"Yaz0"),
            Err(Yaz0Error::Truncated { offset: 4 })
        );
        assert_eq!(
            Yaz0Header::parse(&[b'N', b'A', b'R', b'C', 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]),
            Err(Yaz0Error::BadMagic { found: *b"NARC" })
        );
    }
}
