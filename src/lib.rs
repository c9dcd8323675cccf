//! narcrs: NARC archives and Yaz0 compression in Rust.
//!
//! The crate provides:
//! - An ordered, path-addressable file tree (`tree`)
//! - The NARC archive codec, named and nameless, aligned and packed (`narc`)
//! - A Yaz0 compressor/decompressor (`yaz0`)
//! - Host filesystem helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```
//! use narcrs::narc::{self, Archive};
//! use narcrs::yaz0;
//!
//! let mut archive = Archive::new();
//! let root = archive.root();
//! let dir = archive.tree.branch_or_create(root, "data").unwrap();
//! archive.tree.put_leaf(dir, "a.bin", vec![1, 2, 3]).unwrap();
//!
//! let bytes = yaz0::compress(&archive.encode().unwrap(), 9);
//! let back = narc::decode(&yaz0::decompress(&bytes).unwrap()).unwrap();
//! let leaf = back.tree.find(back.root(), "data/a.bin").unwrap();
//! assert_eq!(back.tree.contents(leaf).unwrap(), &[1, 2, 3]);
//! ```

pub mod io;
pub mod narc;
pub mod tree;
pub mod yaz0;

#[cfg(feature = "cli")]
pub mod cli;
