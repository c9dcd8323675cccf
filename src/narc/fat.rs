// BTAF: file allocation table.
//
// One (start, end) pair per file, indexed by file id. Offsets are relative
// to the start of the GMIF payload; `end` is exclusive. The table is the
// only authority on where a file's bytes live: alignment padding between
// files is skipped purely by these ranges.

use super::NarcError;
use super::header::ByteReader;

/// Byte range of one file inside the GMIF payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileRange {
    pub start: u32,
    pub end: u32,
}

impl FileRange {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Parsed BTAF block payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationTable {
    pub entries: Vec<FileRange>,
}

impl AllocationTable {
    /// Parse the payload of a BTAF block.
    pub fn parse(payload: &[u8]) -> Result<Self, NarcError> {
        let mut r = ByteReader::new(payload, "BTAF");
        let count = r.le_u16()? as usize;
        let _reserved = r.le_u16()?;

        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let start = r.le_u32()?;
            let end = r.le_u32()?;
            entries.push(FileRange { start, end });
        }
        Ok(Self { entries })
    }

    /// Serialize as a BTAF block payload.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.entries.len() * 8);
        out.extend_from_slice(&(self.entries.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        for e in &self.entries {
            out.extend_from_slice(&e.start.to_le_bytes());
            out.extend_from_slice(&e.end.to_le_bytes());
        }
        out
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check every range lies within a GMIF payload of `data_len` bytes.
    pub fn validate(&self, data_len: usize) -> Result<(), NarcError> {
        for (index, e) in self.entries.iter().enumerate() {
            if e.start > e.end || e.end as usize > data_len {
                return Err(NarcError::InvalidRange {
                    index,
                    start: e.start,
                    end: e.end,
                    len: data_len,
                });
            }
        }
        Ok(())
    }

    /// True when every file starts on a multiple of `alignment` and the
    /// GMIF payload (`data_len` bytes) is padded out to one as well.
    pub fn is_aligned(&self, alignment: u32, data_len: usize) -> bool {
        data_len % alignment as usize == 0 && self.entries.iter().all(|e| e.start % alignment == 0)
    }

    /// Slice file `index` out of the GMIF payload. Ranges must have been
    /// checked with [`validate`](Self::validate).
    pub fn slice<'a>(&self, index: usize, data: &'a [u8]) -> Option<&'a [u8]> {
        let e = self.entries.get(index)?;
        data.get(e.start as usize..e.end as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_encoded_table() {
        let table = AllocationTable {
            entries: vec![
                FileRange { start: 0, end: 3 },
                FileRange { start: 4, end: 4 },
                FileRange { start: 4, end: 10 },
            ],
        };
        let payload = table.encode();
        assert_eq!(payload.len(), 4 + 3 * 8);
        assert_eq!(&payload[..4], &[3, 0, 0, 0]);
        assert_eq!(AllocationTable::parse(&payload).unwrap(), table);
    }

    #[test]
    fn unpadded_data_is_not_aligned() {
        // One file at offset 0: only the data length tells the layouts apart.
        let table = AllocationTable {
            entries: vec![FileRange { start: 0, end: 3 }],
        };
        assert!(!table.is_aligned(4, 3));
        assert!(table.is_aligned(4, 4));
    }

    #[test]
    fn truncated_entries() {
        // Claims two entries, carries one.
        let payload = [2, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0];
        assert!(matches!(
            AllocationTable::parse(&payload),
            Err(NarcError::Truncated { block: "BTAF" })
        ));
    }

    #[test]
    fn validate_ranges() {
        let table = AllocationTable {
            entries: vec![FileRange { start: 0, end: 8 }, FileRange { start: 6, end: 2 }],
        };
        assert!(matches!(
            table.validate(8),
            Err(NarcError::InvalidRange { index: 1, .. })
        ));
        let table = AllocationTable {
            entries: vec![FileRange { start: 0, end: 9 }],
        };
        assert!(matches!(
            table.validate(8),
            Err(NarcError::InvalidRange { index: 0, len: 8, .. })
        ));
    }

    #[test]
    fn alignment_check() {
        let table = AllocationTable {
            entries: vec![FileRange { start: 0, end: 3 }, FileRange { start: 4, end: 5 }],
        };
        assert!(table.is_aligned(4, 8));
        let packed = AllocationTable {
            entries: vec![FileRange { start: 0, end: 3 }, FileRange { start: 3, end: 5 }],
        };
        assert!(!packed.is_aligned(4, 8));
        assert!(AllocationTable::default().is_aligned(4, 0));
        assert_eq!(packed.slice(1, b"abcde"), Some(&b"de"[..]));
    }
}
