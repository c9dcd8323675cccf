// NARC encoder: `Archive` -> bytes.
//
// Layout is planned first (directory ids, file ids), then the three block
// payloads are built and the header is written with the final size. No
// bytes are produced for an archive that breaks a format limit.

use std::collections::HashMap;

use super::fat::{AllocationTable, FileRange};
use super::fnt::{self, Directory, FntEntry, NameTable};
use super::header::{
    BLOCK_HEADER_SIZE, BTAF_MAGIC, BTNF_MAGIC, GMIF_MAGIC, HEADER_SIZE, NarcHeader, write_block,
};
use super::{Archive, DATA_ALIGNMENT, MAX_FILES, NarcError, PADDING_BYTE};
use crate::tree::{NodeId, Tree};

/// Encode `archive` as a complete NARC image.
pub fn encode(archive: &Archive) -> Result<Vec<u8>, NarcError> {
    let plan = Layout::plan(&archive.tree)?;

    let (fat, gmif) = build_data(&archive.tree, &plan.files, archive.has_alignment)?;
    let names = if archive.nameless {
        NameTable::Nameless
    } else {
        plan.name_table(&archive.tree)?
    };

    let btaf = fat.encode();
    let btnf = names.encode()?;

    let total = (HEADER_SIZE + 3 * BLOCK_HEADER_SIZE) as u64
        + btaf.len() as u64
        + btnf.len() as u64
        + gmif.len() as u64;
    let file_size = u32::try_from(total).map_err(|_| NarcError::TooLarge(total))?;

    let mut out = Vec::with_capacity(total as usize);
    NarcHeader::new(file_size).encode(&mut out);
    write_block(&mut out, BTAF_MAGIC, &btaf);
    write_block(&mut out, BTNF_MAGIC, &btnf);
    write_block(&mut out, GMIF_MAGIC, &gmif);

    log::debug!(
        "encoded NARC: {} files, {} directories, {} bytes, nameless={}, aligned={}",
        plan.files.len(),
        plan.dirs.len(),
        out.len(),
        archive.nameless,
        archive.has_alignment
    );
    Ok(out)
}

// ---------------------------------------------------------------------------
// Layout planning
// ---------------------------------------------------------------------------

/// One directory in id order.
struct PlannedDir {
    node: NodeId,
    /// Index of the parent directory; the root points at itself.
    parent: usize,
    first_file: usize,
}

/// Directory and file id assignment for one tree.
///
/// Directories are numbered in pre-order, root = 0. Files are numbered by
/// a depth-first pass in which each branch hands out ids to everything
/// below its child branches before its own leaves, so the leaves of one
/// directory always hold consecutive ids.
struct Layout {
    dirs: Vec<PlannedDir>,
    dir_ids: HashMap<NodeId, usize>,
    files: Vec<NodeId>,
}

impl Layout {
    fn plan(tree: &Tree) -> Result<Self, NarcError> {
        let root = tree.root();
        let mut dirs = Vec::new();
        let mut dir_ids = HashMap::new();

        // Directories are numbered as they come off the stack; children are
        // pushed in reverse so the first child is numbered first.
        let mut stack = vec![(root, 0usize)];
        while let Some((branch, parent)) = stack.pop() {
            let id = dirs.len();
            dirs.push(PlannedDir {
                node: branch,
                parent,
                first_file: 0,
            });
            dir_ids.insert(branch, id);
            for &child in tree.children(branch)?.iter().rev() {
                if tree.is_branch(child) {
                    stack.push((child, id));
                }
            }
        }
        if dirs.len() > fnt::MAX_DIRECTORIES {
            return Err(NarcError::TooManyEntries {
                what: "directories",
                count: dirs.len(),
                max: fnt::MAX_DIRECTORIES,
            });
        }

        let mut files = Vec::new();
        let mut pending = vec![(root, false)];
        while let Some((branch, expanded)) = pending.pop() {
            let children = tree.children(branch)?;
            if expanded {
                dirs[dir_ids[&branch]].first_file = files.len();
                files.extend(children.iter().copied().filter(|&c| tree.is_leaf(c)));
                continue;
            }
            pending.push((branch, true));
            for &child in children.iter().rev() {
                if tree.is_branch(child) {
                    pending.push((child, false));
                }
            }
        }
        if files.len() > MAX_FILES {
            return Err(NarcError::TooManyEntries {
                what: "files",
                count: files.len(),
                max: MAX_FILES,
            });
        }

        Ok(Self {
            dirs,
            dir_ids,
            files,
        })
    }

    /// Name table reflecting current names and child order.
    fn name_table(&self, tree: &Tree) -> Result<NameTable, NarcError> {
        let mut out = Vec::with_capacity(self.dirs.len());
        for (index, dir) in self.dirs.iter().enumerate() {
            let parent_id = if index == 0 {
                self.dirs.len() as u16
            } else {
                fnt::ROOT_DIR_ID | dir.parent as u16
            };
            let mut entries = Vec::new();
            for &child in tree.children(dir.node)? {
                let name = tree.name(child)?.to_string();
                if tree.is_branch(child) {
                    let id = fnt::ROOT_DIR_ID | self.dir_ids[&child] as u16;
                    entries.push(FntEntry::Directory { name, id });
                } else {
                    entries.push(FntEntry::File { name });
                }
            }
            out.push(Directory {
                first_file_id: dir.first_file as u16,
                parent_id,
                entries,
            });
        }
        Ok(NameTable::Named(out))
    }
}

// ---------------------------------------------------------------------------
// Data block
// ---------------------------------------------------------------------------

fn pad_to_alignment(data: &mut Vec<u8>) {
    let padded = data.len().next_multiple_of(DATA_ALIGNMENT);
    data.resize(padded, PADDING_BYTE);
}

/// Concatenate file contents in id order, recording each file's range.
fn build_data(
    tree: &Tree,
    files: &[NodeId],
    aligned: bool,
) -> Result<(AllocationTable, Vec<u8>), NarcError> {
    let mut gmif = Vec::new();
    let mut entries = Vec::with_capacity(files.len());
    for &leaf in files {
        if aligned {
            pad_to_alignment(&mut gmif);
        }
        let contents = tree.contents(leaf)?;
        let start = offset(gmif.len())?;
        gmif.extend_from_slice(contents);
        let end = offset(gmif.len())?;
        entries.push(FileRange { start, end });
    }
    if aligned {
        pad_to_alignment(&mut gmif);
    }
    Ok((AllocationTable { entries }, gmif))
}

fn offset(len: usize) -> Result<u32, NarcError> {
    u32::try_from(len).map_err(|_| NarcError::TooLarge(len as u64))
}
