// NARC (Nitro ARChive) codec.
//
// A NARC is a file header followed by exactly three blocks:
//
// - `header`: file header, block headers, bounds-checked byte cursor
// - `fat`: BTAF allocation table: (start, end) per file id
// - `fnt`: BTNF name table: directory hierarchy and names
// - `decoder`: bytes -> `Archive`
// - `encoder`: `Archive` -> bytes
//
// GMIF, the data block, has no structure of its own and is handled inline
// by the decoder and encoder.

pub mod decoder;
pub mod encoder;
pub mod fat;
pub mod fnt;
pub mod header;

use thiserror::Error;

use crate::tree::{NodeId, Tree, TreeError};

/// File starts in GMIF are rounded up to this when alignment is enabled.
pub const DATA_ALIGNMENT: usize = 4;
/// Fill byte for alignment gaps and BTNF padding.
pub const PADDING_BYTE: u8 = 0xFF;
/// BTAF stores the file count in a u16.
pub const MAX_FILES: usize = u16::MAX as usize;

pub use decoder::decode;
pub use encoder::encode;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Malformed archive data on decode, or an archive that cannot be
/// represented on encode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NarcError {
    #[error("{block}: bad magic {found:02X?}")]
    BadMagic { block: &'static str, found: [u8; 4] },
    #[error("unsupported byte order mark {0:#06X}")]
    UnsupportedByteOrder(u16),
    #[error("{block}: declared size {declared} does not fit (have {actual})")]
    SizeMismatch {
        block: &'static str,
        declared: u64,
        actual: u64,
    },
    #[error("{block}: unexpected end of data")]
    Truncated { block: &'static str },
    #[error("file {index}: range {start:#X}..{end:#X} outside {len} bytes of data")]
    InvalidRange {
        index: usize,
        start: u32,
        end: u32,
        len: usize,
    },
    #[error("file index {index} out of range ({count} files allocated)")]
    FileIndexOutOfRange { index: usize, count: usize },
    #[error("directory id {id:#06X} out of range ({count} directories)")]
    DirectoryIndexOutOfRange { id: u16, count: usize },
    #[error("{block}: {reason}")]
    Malformed {
        block: &'static str,
        reason: &'static str,
    },
    #[error("name {0:?} is longer than 127 bytes")]
    NameTooLong(String),
    #[error("stored name {0:?} is not a valid node name")]
    InvalidName(String),
    #[error("too many {what}: {count} (max {max})")]
    TooManyEntries {
        what: &'static str,
        count: usize,
        max: usize,
    },
    #[error("archive of {0} bytes exceeds the 4 GiB format limit")]
    TooLarge(u64),
    #[error(transparent)]
    Tree(#[from] TreeError),
}

// ---------------------------------------------------------------------------
// Archive
// ---------------------------------------------------------------------------

/// A NARC held in memory: the file tree plus the two layout flags that
/// decide how it is written back.
#[derive(Debug, Clone)]
pub struct Archive {
    pub tree: Tree,
    /// Drop the name table; files are addressed by index only.
    pub nameless: bool,
    /// Round every file start in the data block up to [`DATA_ALIGNMENT`].
    pub has_alignment: bool,
}

impl Default for Archive {
    fn default() -> Self {
        Self {
            tree: Tree::new(),
            nameless: false,
            has_alignment: true,
        }
    }
}

impl Archive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(data: &[u8]) -> Result<Self, NarcError> {
        decoder::decode(data)
    }

    pub fn encode(&self) -> Result<Vec<u8>, NarcError> {
        encoder::encode(self)
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    /// Number of files that would be written.
    pub fn file_count(&self) -> usize {
        self.tree.leaf_count(self.tree.root())
    }
}
