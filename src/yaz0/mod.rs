// Yaz0 compression.
//
// LZ77-family format used by Nintendo titles to wrap archives and other
// assets. Self-contained; knows nothing about NARC.
//
// - `header`: 16-byte stream header
// - `config`: level -> search window
// - `matching`: nearest-first back-reference search
// - `encoder`: token emission
// - `decoder`: token interpretation

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod header;
pub mod matching;

use thiserror::Error;

pub use config::DEFAULT_LEVEL;
pub use decoder::decompress;
pub use encoder::{CompressOptions, Yaz0Encoder};
pub use header::{YAZ0_MAGIC, Yaz0Header};

/// Malformed Yaz0 input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Yaz0Error {
    #[error("not a Yaz0 stream (magic {found:02X?})")]
    BadMagic { found: [u8; 4] },
    #[error("Yaz0 stream ends early at offset {offset:#X}")]
    Truncated { offset: usize },
    #[error("back-reference at output {position} reaches {distance} bytes back, before the start")]
    InvalidDistance { position: usize, distance: usize },
}

/// Compress `data` at `level` (1-9, clamped).
pub fn compress(data: &[u8], level: u32) -> Vec<u8> {
    Yaz0Encoder::new(CompressOptions { level }).compress(data)
}

/// True when `data` starts with the Yaz0 magic.
pub fn is_yaz0(data: &[u8]) -> bool {
    data.starts_with(&YAZ0_MAGIC)
}
