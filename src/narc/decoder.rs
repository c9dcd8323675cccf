// NARC decoder: bytes -> `Archive`.
//
// Parse order: file header, BTAF, BTNF, GMIF. Every table index and range
// is checked before it is used, so corrupt input fails with a `NarcError`
// rather than a panic.

use std::collections::HashSet;

use super::fat::AllocationTable;
use super::fnt::{self, FntEntry, NameTable};
use super::header::{
    BTAF_MAGIC, BTNF_MAGIC, GMIF_MAGIC, NarcHeader, read_block,
};
use super::{Archive, DATA_ALIGNMENT, NarcError};
use crate::tree::{NodeId, Tree};

/// Decode a complete NARC image.
pub fn decode(data: &[u8]) -> Result<Archive, NarcError> {
    let header = NarcHeader::parse(data)?;
    let data = &data[..header.file_size as usize];

    let (btaf, next) = read_block(data, header.header_size as usize, BTAF_MAGIC, "BTAF")?;
    let (btnf, next) = read_block(data, next, BTNF_MAGIC, "BTNF")?;
    let (gmif, _) = read_block(data, next, GMIF_MAGIC, "GMIF")?;

    let fat = AllocationTable::parse(btaf)?;
    fat.validate(gmif.len())?;
    let names = NameTable::parse(btnf, fat.len())?;

    let mut tree = Tree::new();
    let nameless = match names {
        NameTable::Nameless => {
            build_nameless(&mut tree, &fat, gmif)?;
            true
        }
        NameTable::Named(dirs) => {
            build_named(&mut tree, &dirs, &fat, gmif)?;
            false
        }
    };

    let has_alignment = fat.is_aligned(DATA_ALIGNMENT as u32, gmif.len());
    log::debug!(
        "decoded NARC: {} files, {} bytes of data, nameless={nameless}, aligned={has_alignment}",
        fat.len(),
        gmif.len()
    );

    Ok(Archive {
        tree,
        nameless,
        has_alignment,
    })
}

/// One leaf per allocation entry, named by its decimal index.
fn build_nameless(tree: &mut Tree, fat: &AllocationTable, gmif: &[u8]) -> Result<(), NarcError> {
    let root = tree.root();
    for index in 0..fat.len() {
        let contents = file_slice(fat, index, gmif)?;
        let leaf = tree.new_leaf(index.to_string(), contents)?;
        tree.add_child(root, leaf)?;
    }
    Ok(())
}

/// Rebuild the directory hierarchy from the name table, preserving entry
/// order within every directory.
fn build_named(
    tree: &mut Tree,
    dirs: &[fnt::Directory],
    fat: &AllocationTable,
    gmif: &[u8],
) -> Result<(), NarcError> {
    let mut visited = HashSet::new();
    let mut used_files = 0usize;
    let mut pending: Vec<(usize, NodeId)> = vec![(0, tree.root())];

    while let Some((index, branch)) = pending.pop() {
        if !visited.insert(index) {
            return Err(NarcError::Malformed {
                block: "BTNF",
                reason: "directory referenced more than once",
            });
        }
        let dir = &dirs[index];
        let mut file_id = dir.first_file_id as usize;

        for entry in &dir.entries {
            match entry {
                FntEntry::File { name } => {
                    let contents = file_slice(fat, file_id, gmif)?;
                    let leaf = tree
                        .new_leaf(name.as_str(), contents)
                        .map_err(|_| NarcError::InvalidName(name.clone()))?;
                    tree.add_child(branch, leaf)?;
                    file_id += 1;
                    used_files += 1;
                }
                FntEntry::Directory { name, id } => {
                    let child = tree
                        .new_branch(name.as_str())
                        .map_err(|_| NarcError::InvalidName(name.clone()))?;
                    tree.add_child(branch, child)?;
                    pending.push((fnt::dir_index(*id), child));
                }
            }
        }
    }

    if used_files != fat.len() {
        log::warn!(
            "NARC name table covers {used_files} of {} allocated files",
            fat.len()
        );
    }
    Ok(())
}

fn file_slice(fat: &AllocationTable, index: usize, gmif: &[u8]) -> Result<Vec<u8>, NarcError> {
    fat.slice(index, gmif)
        .map(<[u8]>::to_vec)
        .ok_or(NarcError::FileIndexOutOfRange {
            index,
            count: fat.len(),
        })
}
