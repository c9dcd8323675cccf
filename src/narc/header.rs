// NARC file header, block headers and the bounds-checked byte cursor used
// by the block parsers.
//
// All multi-byte fields are little-endian. The byte order mark is stored as
// 0xFFFE; big-endian NARCs do not occur in practice and are rejected.

use super::NarcError;

// ---------------------------------------------------------------------------
// Magic values and fixed sizes
// ---------------------------------------------------------------------------

pub const NARC_MAGIC: [u8; 4] = *b"NARC";
pub const BTAF_MAGIC: [u8; 4] = *b"BTAF";
pub const BTNF_MAGIC: [u8; 4] = *b"BTNF";
pub const GMIF_MAGIC: [u8; 4] = *b"GMIF";

/// Byte order mark as read little-endian.
pub const BOM_LE: u16 = 0xFFFE;
pub const NARC_VERSION: u16 = 0x0100;

/// Size of the NARC file header.
pub const HEADER_SIZE: usize = 0x10;
/// Size of a block header (magic + block size).
pub const BLOCK_HEADER_SIZE: usize = 8;
/// A NARC always carries BTAF, BTNF and GMIF.
pub const BLOCK_COUNT: u16 = 3;

// ---------------------------------------------------------------------------
// Byte cursor
// ---------------------------------------------------------------------------

/// Forward-only cursor over one block. Every read either returns exactly
/// the requested bytes or fails with [`NarcError::Truncated`] naming the
/// block.
#[derive(Debug, Clone)]
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    block: &'static str,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8], block: &'static str) -> Self {
        Self {
            data,
            pos: 0,
            block,
        }
    }

    /// Cursor positioned at `pos` within `data`.
    pub fn at(data: &'a [u8], pos: usize, block: &'static str) -> Result<Self, NarcError> {
        if pos > data.len() {
            return Err(NarcError::Truncated { block });
        }
        Ok(Self { data, pos, block })
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn take(&mut self, len: usize) -> Result<&'a [u8], NarcError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(NarcError::Truncated { block: self.block })?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    #[inline]
    pub fn u8(&mut self) -> Result<u8, NarcError> {
        Ok(self.take(1)?[0])
    }

    #[inline]
    pub fn le_u16(&mut self) -> Result<u16, NarcError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    #[inline]
    pub fn le_u32(&mut self) -> Result<u32, NarcError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn magic(&mut self) -> Result<[u8; 4], NarcError> {
        let b = self.take(4)?;
        Ok([b[0], b[1], b[2], b[3]])
    }
}

// ---------------------------------------------------------------------------
// File header
// ---------------------------------------------------------------------------

/// Parsed NARC file header (0x10 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NarcHeader {
    pub byte_order: u16,
    pub version: u16,
    /// Total archive size in bytes, headers included.
    pub file_size: u32,
    pub header_size: u16,
    pub block_count: u16,
}

impl NarcHeader {
    pub fn new(file_size: u32) -> Self {
        Self {
            byte_order: BOM_LE,
            version: NARC_VERSION,
            file_size,
            header_size: HEADER_SIZE as u16,
            block_count: BLOCK_COUNT,
        }
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&NARC_MAGIC);
        out.extend_from_slice(&self.byte_order.to_le_bytes());
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.file_size.to_le_bytes());
        out.extend_from_slice(&self.header_size.to_le_bytes());
        out.extend_from_slice(&self.block_count.to_le_bytes());
    }

    /// Parse and validate the header at the start of `data`.
    ///
    /// The version field is informational and not checked.
    pub fn parse(data: &[u8]) -> Result<Self, NarcError> {
        let mut r = ByteReader::new(data, "NARC header");
        let found = r.magic()?;
        if found != NARC_MAGIC {
            return Err(NarcError::BadMagic {
                block: "NARC header",
                found,
            });
        }
        let byte_order = r.le_u16()?;
        if byte_order != BOM_LE {
            return Err(NarcError::UnsupportedByteOrder(byte_order));
        }
        let version = r.le_u16()?;
        let file_size = r.le_u32()?;
        let header_size = r.le_u16()?;
        let block_count = r.le_u16()?;

        if (header_size as usize) < HEADER_SIZE {
            return Err(NarcError::SizeMismatch {
                block: "NARC header",
                declared: header_size as u64,
                actual: HEADER_SIZE as u64,
            });
        }
        if block_count != BLOCK_COUNT {
            return Err(NarcError::Malformed {
                block: "NARC header",
                reason: "block count is not 3",
            });
        }
        if file_size as usize > data.len() {
            return Err(NarcError::SizeMismatch {
                block: "NARC header",
                declared: file_size as u64,
                actual: data.len() as u64,
            });
        }

        Ok(Self {
            byte_order,
            version,
            file_size,
            header_size,
            block_count,
        })
    }
}

// ---------------------------------------------------------------------------
// Block headers
// ---------------------------------------------------------------------------

/// Append a block (header + payload) to `out`.
pub(crate) fn write_block(out: &mut Vec<u8>, magic: [u8; 4], payload: &[u8]) {
    let size = (BLOCK_HEADER_SIZE + payload.len()) as u32;
    out.extend_from_slice(&magic);
    out.extend_from_slice(&size.to_le_bytes());
    out.extend_from_slice(payload);
}

/// Read the block starting at `offset`.
///
/// Returns the block payload (the bytes after the 8-byte block header) and
/// the offset of the next block.
pub(crate) fn read_block<'a>(
    data: &'a [u8],
    offset: usize,
    magic: [u8; 4],
    block: &'static str,
) -> Result<(&'a [u8], usize), NarcError> {
    let mut r = ByteReader::at(data, offset, block)?;
    let found = r.magic()?;
    if found != magic {
        return Err(NarcError::BadMagic { block, found });
    }
    let size = r.le_u32()? as usize;
    if size < BLOCK_HEADER_SIZE {
        return Err(NarcError::Malformed {
            block,
            reason: "block size smaller than its header",
        });
    }
    let end = offset
        .checked_add(size)
        .filter(|&end| end <= data.len())
        .ok_or(NarcError::SizeMismatch {
            block,
            declared: size as u64,
            actual: (data.len() - offset) as u64,
        })?;
    Ok((&data[offset + BLOCK_HEADER_SIZE..end], end))
}
