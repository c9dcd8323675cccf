// Host filesystem helpers.
//
// Provides archive file read/write with transparent Yaz0 detection, and
// conversion between host directory trees and archive branches. Archives
// are always encoded completely in memory before anything is written, so a
// failed encode never leaves a half-written file behind.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::narc::{Archive, NarcError};
use crate::tree::{NodeId, Tree, TreeError};
use crate::yaz0::{self, Yaz0Error};

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// An archive read from disk.
#[derive(Debug, Clone)]
pub struct LoadedArchive {
    pub archive: Archive,
    /// The file was wrapped in Yaz0.
    pub compressed: bool,
}

/// Statistics returned by [`write_archive_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteStats {
    /// Files stored in the archive.
    pub files: usize,
    /// Encoded NARC size in bytes.
    pub archive_size: u64,
    /// Bytes written to disk (after Yaz0, when enabled).
    pub written_size: u64,
    /// Yaz0 level used, if any.
    pub yaz0_level: Option<u32>,
}

/// Statistics returned by [`pack_path`] and [`extract_branch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferStats {
    pub files: usize,
    pub directories: usize,
    pub bytes: u64,
}

impl TransferStats {
    fn merge(&mut self, other: TransferStats) {
        self.files += other.files;
        self.directories += other.directories;
        self.bytes += other.bytes;
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for host file operations.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("archive error: {0}")]
    Narc(#[from] NarcError),
    #[error("Yaz0 error: {0}")]
    Yaz0(#[from] Yaz0Error),
    #[error("tree error: {0}")]
    Tree(#[from] TreeError),
    #[error("{} does not exist", .0.display())]
    NotFound(PathBuf),
    #[error("{} already exists (use --force to overwrite)", .0.display())]
    AlreadyExists(PathBuf),
    #[error("host file name {} is not valid UTF-8", .0.display())]
    NonUtf8Name(PathBuf),
    #[error("refusing to extract entry named {0:?}")]
    UnsafeName(String),
}

// ---------------------------------------------------------------------------
// Archive files
// ---------------------------------------------------------------------------

/// Read and decode an archive, unwrapping Yaz0 when the file starts with
/// its magic.
pub fn read_archive_file(path: &Path) -> Result<LoadedArchive, IoError> {
    let data = read_host_file(path)?;
    let compressed = yaz0::is_yaz0(&data);
    let archive = if compressed {
        log::debug!("{}: Yaz0-compressed", path.display());
        Archive::decode(&yaz0::decompress(&data)?)?
    } else {
        Archive::decode(&data)?
    };
    Ok(LoadedArchive {
        archive,
        compressed,
    })
}

/// Encode `archive` and write it to `path`, wrapped in Yaz0 at
/// `yaz0_level` when given.
pub fn write_archive_file(
    path: &Path,
    archive: &Archive,
    yaz0_level: Option<u32>,
) -> Result<WriteStats, IoError> {
    let encoded = archive.encode()?;
    let archive_size = encoded.len() as u64;
    let bytes = match yaz0_level {
        Some(level) => yaz0::compress(&encoded, level),
        None => encoded,
    };
    fs::write(path, &bytes)?;

    Ok(WriteStats {
        files: archive.file_count(),
        archive_size,
        written_size: bytes.len() as u64,
        yaz0_level,
    })
}

fn read_host_file(path: &Path) -> Result<Vec<u8>, IoError> {
    fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => IoError::NotFound(path.to_path_buf()),
        _ => IoError::Io(e),
    })
}

// ---------------------------------------------------------------------------
// Packing
// ---------------------------------------------------------------------------

fn host_name(path: &Path) -> Result<String, IoError> {
    // `Path::file_name` is `None` for paths ending in `..`; canonicalize so
    // such inputs still get their real directory name.
    let owned;
    let path = if path.file_name().is_none() {
        owned = fs::canonicalize(path)?;
        owned.as_path()
    } else {
        path
    };
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| IoError::NonUtf8Name(path.to_path_buf()))
}

/// Sorted directory listing, so packing is deterministic.
fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, IoError> {
    let mut entries = fs::read_dir(dir)?
        .map(|e| e.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort();
    Ok(entries)
}

/// Add `host_path` under `parent`.
///
/// A directory becomes a branch of the same name, merged into an existing
/// branch with that name; a file becomes a leaf, replacing the contents of
/// an existing leaf with that name.
pub fn pack_path(tree: &mut Tree, parent: NodeId, host_path: &Path) -> Result<TransferStats, IoError> {
    let meta = fs::metadata(host_path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => IoError::NotFound(host_path.to_path_buf()),
        _ => IoError::Io(e),
    })?;
    let name = host_name(host_path)?;

    if meta.is_dir() {
        let branch = tree.branch_or_create(parent, &name)?;
        let mut stats = pack_contents(tree, branch, host_path)?;
        stats.directories += 1;
        return Ok(stats);
    }

    let contents = fs::read(host_path)?;
    let bytes = contents.len() as u64;
    tree.put_leaf(parent, &name, contents)?;
    log::trace!("packed {} ({bytes} bytes)", host_path.display());
    Ok(TransferStats {
        files: 1,
        directories: 0,
        bytes,
    })
}

/// Add every entry of the host directory `dir` under `parent`, without a
/// branch for `dir` itself.
pub fn pack_contents(tree: &mut Tree, parent: NodeId, dir: &Path) -> Result<TransferStats, IoError> {
    let mut stats = TransferStats::default();
    for entry in sorted_entries(dir)? {
        stats.merge(pack_path(tree, parent, &entry)?);
    }
    Ok(stats)
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Names that would escape or alias the destination directory.
fn check_extract_name(name: &str) -> Result<(), IoError> {
    if name == "." || name == ".." || name.contains('\\') || name.contains('\0') {
        return Err(IoError::UnsafeName(name.to_string()));
    }
    Ok(())
}

/// Write everything below `branch` into the host directory `dest`,
/// creating directories as needed.
///
/// Existing files are only replaced when `overwrite` is set.
pub fn extract_branch(
    tree: &Tree,
    branch: NodeId,
    dest: &Path,
    overwrite: bool,
) -> Result<TransferStats, IoError> {
    fs::create_dir_all(dest)?;
    let mut stats = TransferStats::default();

    for &child in tree.children(branch)? {
        let name = tree.name(child)?;
        check_extract_name(name)?;
        let target = dest.join(name);

        if tree.is_branch(child) {
            stats.directories += 1;
            stats.merge(extract_branch(tree, child, &target, overwrite)?);
            continue;
        }

        if !overwrite && target.exists() {
            return Err(IoError::AlreadyExists(target));
        }
        let contents = tree.contents(child)?;
        fs::write(&target, contents)?;
        stats.files += 1;
        stats.bytes += contents.len() as u64;
    }
    Ok(stats)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
