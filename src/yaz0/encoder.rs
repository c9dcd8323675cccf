// Yaz0 encoder.
//
// Tokens are emitted in groups of up to eight behind one flag byte
// (MSB first, 1 = literal). Output is deterministic for a given input and
// level.

use super::config::{self, DEFAULT_LEVEL, MAX_SHORT_MATCH, MIN_MATCH, SearchConfig};
use super::header::{HEADER_SIZE, Yaz0Header};
use super::matching::{self, Match};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for [`Yaz0Encoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressOptions {
    /// Compression level (1-9). Higher levels search further back.
    /// Out-of-range values are clamped.
    pub level: u32,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL,
        }
    }
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// One-shot Yaz0 encoder.
///
/// # Example
/// ```
/// use narcrs::yaz0::{self, CompressOptions, Yaz0Encoder};
/// let packed = Yaz0Encoder::new(CompressOptions { level: 6 }).compress(b"abcabcabcabc");
/// assert_eq!(yaz0::decompress(&packed).unwrap(), b"abcabcabcabc");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Yaz0Encoder {
    config: SearchConfig,
}

impl Default for Yaz0Encoder {
    fn default() -> Self {
        Self::new(CompressOptions::default())
    }
}

impl Yaz0Encoder {
    pub fn new(opts: CompressOptions) -> Self {
        Self {
            config: config::config_for_level(opts.level),
        }
    }

    /// Effective (clamped) level.
    pub fn level(&self) -> u32 {
        self.config.level
    }

    /// Search window in bytes.
    pub fn window(&self) -> usize {
        self.config.window
    }

    /// Compress `input` into a complete Yaz0 stream, zero-padded to a
    /// multiple of 4 bytes.
    ///
    /// Inputs longer than `u32::MAX` bytes cannot be described by the header;
    /// the declared size saturates at `u32::MAX` and a warning is logged.
    pub fn compress(&self, input: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE + input.len() + input.len() / 8 + 4);
        Yaz0Header::new(declared_size(input.len())).encode(&mut out);

        let mut pos = 0;
        while pos < input.len() {
            let flag_at = out.len();
            out.push(0);
            let mut flags = 0u8;
            for bit in 0..8 {
                if pos >= input.len() {
                    break;
                }
                match matching::find_longest(input, pos, self.config.window) {
                    Some(m) => {
                        emit_match(&mut out, m);
                        pos += m.length;
                    }
                    None => {
                        flags |= 0x80 >> bit;
                        out.push(input[pos]);
                        pos += 1;
                    }
                }
            }
            out[flag_at] = flags;
        }

        while out.len() % 4 != 0 {
            out.push(0);
        }

        log::debug!(
            "yaz0: {} -> {} bytes at level {} ({:.1}%)",
            input.len(),
            out.len(),
            self.config.level,
            ratio(out.len(), input.len())
        );
        out
    }
}

/// Back-reference token: two bytes for lengths up to 0x11, three beyond.
fn emit_match(out: &mut Vec<u8>, m: Match) {
    debug_assert!(m.length >= MIN_MATCH);
    let dist = m.distance - 1;
    let hi = (dist >> 8) as u8 & 0x0F;
    let lo = dist as u8;
    if m.length > MAX_SHORT_MATCH {
        out.extend_from_slice(&[hi, lo, (m.length - 0x12) as u8]);
    } else {
        out.extend_from_slice(&[((m.length - 2) as u8) << 4 | hi, lo]);
    }
}

/// Size field for the header, saturating at `u32::MAX`.
fn declared_size(len: usize) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| {
        log::warn!("yaz0: input of {len} bytes exceeds the 32-bit size field; stream will not decode in full");
        u32::MAX
    })
}

fn ratio(compressed: usize, original: usize) -> f64 {
    if original == 0 {
        return 100.0;
    }
    compressed as f64 * 100.0 / original as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compress(input: &[u8], level: u32) -> Vec<u8> {
        Yaz0Encoder::new(CompressOptions { level }).compress(input)
    }

    #[test]
    fn empty_input_is_header_only() {
        let out = compress(b"", 9);
        assert_eq!(out, b"Yaz0\0\0\0\0\0\0\0\0\0\0\0\0");
    }

    #[test]
    fn four_zero_bytes() {
        // Literal 0, then a 3-byte copy at distance 1.
        let out = compress(&[0, 0, 0, 0], 9);
        assert_eq!(&out[..8], b"Yaz0\0\0\0\x04");
        assert_eq!(&out[16..], &[0b1000_0000, 0x00, 0x10, 0x00]);
    }

    #[test]
    fn literals_only() {
        let out = compress(b"abcdefghij", 9);
        assert_eq!(out[16], 0xFF);
        assert_eq!(&out[17..25], b"abcdefgh");
        assert_eq!(out[25], 0xC0);
        assert_eq!(&out[26..28], b"ij");
        assert_eq!(out.len(), 28);
    }

    #[test]
    fn long_form_match() {
        let input = vec![b'z'; 101];
        let out = compress(&input, 9);
        // Literal, then a 100-byte copy at distance 1 in long form.
        assert_eq!(&out[16..21], &[0b1000_0000, b'z', 0x00, 0x00, 100 - 0x12]);
    }

    #[test]
    fn short_form_boundaries() {
        let mut out = Vec::new();
        emit_match(&mut out, Match { distance: 4096, length: 17 });
        assert_eq!(out, [0xFF, 0xFF]);
        out.clear();
        emit_match(&mut out, Match { distance: 1, length: 18 });
        assert_eq!(out, [0x00, 0x00, 0x00]);
        out.clear();
        emit_match(&mut out, Match { distance: 0x123, length: 273 });
        assert_eq!(out, [0x01, 0x22, 0xFF]);
    }

    #[test]
    fn output_is_word_padded() {
        for len in 0..20 {
            let input: Vec<u8> = (0..len as u8).collect();
            assert_eq!(compress(&input, 5).len() % 4, 0, "len {len}");
        }
    }

    #[test]
    fn declared_size_saturates() {
        assert_eq!(declared_size(0), 0);
        assert_eq!(declared_size(u32::MAX as usize), u32::MAX);
        #[cfg(target_pointer_width = "64")]
        assert_eq!(declared_size(u32::MAX as usize + 1), u32::MAX);
    }

    #[test]
    fn default_level() {
        let enc = Yaz0Encoder::default();
        assert_eq!(enc.level(), 9);
        assert_eq!(enc.window(), 0x1000);
        assert_eq!(Yaz0Encoder::new(CompressOptions { level: 0 }).level(), 1);
    }
}
