// BTNF: file name table.
//
// Layout of the block payload:
//
//   main table   dir_count × { sub_table_offset: u32, first_file_id: u16, parent_id: u16 }
//   sub-tables   one per directory, entries until a 0x00 terminator:
//                  0x01..=0x7F  file,      name length = tag
//                  0x81..=0xFF  directory, name length = tag & 0x7F, then id: u16
//
// Offsets are relative to the payload start. Directory ids are
// `0xF000 | index`; the root entry's `parent_id` holds the directory count.
// Files inside one directory have consecutive ids starting at
// `first_file_id`, in sub-table order.
//
// A nameless archive carries only the root main-table entry with a
// sub-table offset (4) that points inside the main table itself.

use super::NarcError;
use super::header::ByteReader;

/// Id of the root directory.
pub const ROOT_DIR_ID: u16 = 0xF000;
/// Directory ids use the low 12 bits.
pub const MAX_DIRECTORIES: usize = 0x1000;
/// Longest name a sub-table entry can hold.
pub const MAX_NAME_LEN: usize = 0x7F;

const NAMELESS_TABLE: [u8; 8] = [0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00];

/// One sub-table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FntEntry {
    File { name: String },
    Directory { name: String, id: u16 },
}

/// One main-table entry with its parsed sub-table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    pub first_file_id: u16,
    pub parent_id: u16,
    pub entries: Vec<FntEntry>,
}

/// Parsed BTNF payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameTable {
    /// No names: files are addressed by index only.
    Nameless,
    /// Directories indexed by `id & 0x0FFF`; index 0 is the root.
    Named(Vec<Directory>),
}

/// Index into the directory list for a directory id.
pub fn dir_index(id: u16) -> usize {
    (id & 0x0FFF) as usize
}

fn check_dir_id(id: u16, dir_count: usize) -> Result<(), NarcError> {
    if id & 0xF000 != ROOT_DIR_ID || dir_index(id) >= dir_count {
        return Err(NarcError::DirectoryIndexOutOfRange {
            id,
            count: dir_count,
        });
    }
    Ok(())
}

impl NameTable {
    /// Parse a BTNF payload for an archive holding `file_count` files.
    pub fn parse(payload: &[u8], file_count: usize) -> Result<Self, NarcError> {
        let mut main = ByteReader::new(payload, "BTNF");
        let root_offset = main.le_u32()? as usize;
        let _root_first_file = main.le_u16()?;
        let dir_count = main.le_u16()? as usize;

        if dir_count == 0 || dir_count > MAX_DIRECTORIES {
            return Err(NarcError::Malformed {
                block: "BTNF",
                reason: "directory count outside 1..=4096",
            });
        }
        if root_offset < dir_count * 8 {
            log::debug!("BTNF: no sub-tables, archive is nameless");
            return Ok(Self::Nameless);
        }

        let mut main = ByteReader::new(payload, "BTNF");
        let mut dirs = Vec::with_capacity(dir_count);
        for index in 0..dir_count {
            let sub_offset = main.le_u32()? as usize;
            let first_file_id = main.le_u16()?;
            let parent_id = main.le_u16()?;
            let entries = parse_sub_table(payload, sub_offset, first_file_id, dir_count, file_count)?;
            log::trace!(
                "BTNF: dir {:#06X} first_file={first_file_id} entries={}",
                ROOT_DIR_ID as usize | index,
                entries.len()
            );
            dirs.push(Directory {
                first_file_id,
                parent_id,
                entries,
            });
        }
        Ok(Self::Named(dirs))
    }

    /// Serialize as a BTNF payload, padded to 4 bytes with 0xFF.
    pub fn encode(&self) -> Result<Vec<u8>, NarcError> {
        let dirs = match self {
            Self::Nameless => return Ok(NAMELESS_TABLE.to_vec()),
            Self::Named(dirs) => dirs,
        };

        let main_len = dirs.len() * 8;
        let mut main = Vec::with_capacity(main_len);
        let mut subs = Vec::new();
        for dir in dirs {
            let offset = (main_len + subs.len()) as u32;
            main.extend_from_slice(&offset.to_le_bytes());
            main.extend_from_slice(&dir.first_file_id.to_le_bytes());
            main.extend_from_slice(&dir.parent_id.to_le_bytes());

            for entry in &dir.entries {
                match entry {
                    FntEntry::File { name } => {
                        let len = name_len(name)?;
                        subs.push(len);
                        subs.extend_from_slice(name.as_bytes());
                    }
                    FntEntry::Directory { name, id } => {
                        let len = name_len(name)?;
                        subs.push(0x80 | len);
                        subs.extend_from_slice(name.as_bytes());
                        subs.extend_from_slice(&id.to_le_bytes());
                    }
                }
            }
            subs.push(0x00);
        }

        main.extend_from_slice(&subs);
        while main.len() % 4 != 0 {
            main.push(0xFF);
        }
        Ok(main)
    }
}

fn name_len(name: &str) -> Result<u8, NarcError> {
    match name.len() {
        1..=MAX_NAME_LEN => Ok(name.len() as u8),
        _ => Err(NarcError::NameTooLong(name.to_string())),
    }
}

fn parse_sub_table(
    payload: &[u8],
    offset: usize,
    first_file_id: u16,
    dir_count: usize,
    file_count: usize,
) -> Result<Vec<FntEntry>, NarcError> {
    let mut r = ByteReader::at(payload, offset, "BTNF")?;
    let mut entries = Vec::new();
    let mut next_file = first_file_id as usize;
    loop {
        let tag = r.u8()?;
        match tag {
            0x00 => break,
            0x80 => {
                return Err(NarcError::Malformed {
                    block: "BTNF",
                    reason: "reserved sub-table entry type 0x80",
                });
            }
            0x01..=0x7F => {
                let name = r.take(tag as usize)?;
                if next_file >= file_count {
                    return Err(NarcError::FileIndexOutOfRange {
                        index: next_file,
                        count: file_count,
                    });
                }
                next_file += 1;
                entries.push(FntEntry::File {
                    name: String::from_utf8_lossy(name).into_owned(),
                });
            }
            _ => {
                let name = r.take((tag & 0x7F) as usize)?;
                let id = r.le_u16()?;
                check_dir_id(id, dir_count)?;
                entries.push(FntEntry::Directory {
                    name: String::from_utf8_lossy(name).into_owned(),
                    id,
                });
            }
        }
    }
    Ok(entries)
}
