//! Root directory slots: the 32-byte on-disk layout and the decoded record.

use alloc::string::String;
use bitflags::bitflags;

use crate::{
    error::FsError,
    time::{FatDate, FatTime},
    FsResult, DIRENT_SZ,
};

/// First name byte of a slot after which the directory holds nothing
pub const DIR_END_MARKER: u8 = 0x00;
/// First name byte of a deleted slot
pub const DIR_DELETED_MARKER: u8 = 0xE5;

const NAME_LEN: usize = 8;
const EXT_LEN: usize = 3;
pub const SHORT_NAME_LEN: usize = NAME_LEN + EXT_LEN;

bitflags! {
    pub struct FileAttributes: u8 {
        const READ_ONLY  = 0b00000001;
        const HIDDEN     = 0b00000010;
        const SYSTEM     = 0b00000100;
        const VOLUME_ID  = 0b00001000;
        const DIRECTORY  = 0b00010000;
        const ARCHIVE    = 0b00100000;
        const LONG_NAME  = 0b00001111;
    }
}

/// One 32-byte slot exactly as stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntryLayout {
    pub name: [u8; SHORT_NAME_LEN],
    pub attr: u8,
    pub reserved: u8,
    pub create_time_tenths: u8,
    pub create_time: u16,
    pub create_date: u16,
    pub last_access_date: u16,
    pub start_cluster_high: u16,
    pub last_modify_time: u16,
    pub last_modify_date: u16,
    pub start_cluster_low: u16,
    pub file_size: u32,
}

impl DirEntryLayout {
    pub fn parse(raw: &[u8]) -> FsResult<Self> {
        if raw.len() < DIRENT_SZ {
            return Err(FsError::InvalidArgument);
        }
        let le16 = |at: usize| u16::from_le_bytes([raw[at], raw[at + 1]]);
        let mut name = [0u8; SHORT_NAME_LEN];
        name.copy_from_slice(&raw[..SHORT_NAME_LEN]);
        Ok(Self {
            name,
            attr: raw[11],
            reserved: raw[12],
            create_time_tenths: raw[13],
            create_time: le16(14),
            create_date: le16(16),
            last_access_date: le16(18),
            start_cluster_high: le16(20),
            last_modify_time: le16(22),
            last_modify_date: le16(24),
            start_cluster_low: le16(26),
            file_size: u32::from_le_bytes([raw[28], raw[29], raw[30], raw[31]]),
        })
    }

    pub fn serialize(&self, raw: &mut [u8]) -> FsResult<()> {
        if raw.len() < DIRENT_SZ {
            return Err(FsError::InvalidArgument);
        }
        raw[..SHORT_NAME_LEN].copy_from_slice(&self.name);
        raw[11] = self.attr;
        raw[12] = self.reserved;
        raw[13] = self.create_time_tenths;
        let fields = [
            (14, self.create_time),
            (16, self.create_date),
            (18, self.last_access_date),
            (20, self.start_cluster_high),
            (22, self.last_modify_time),
            (24, self.last_modify_date),
            (26, self.start_cluster_low),
        ];
        for (at, value) in fields {
            raw[at..at + 2].copy_from_slice(&value.to_le_bytes());
        }
        raw[28..32].copy_from_slice(&self.file_size.to_le_bytes());
        Ok(())
    }

    pub fn is_end(&self) -> bool {
        self.name[0] == DIR_END_MARKER
    }

    pub fn is_deleted(&self) -> bool {
        self.name[0] == DIR_DELETED_MARKER
    }

    pub fn is_long(&self) -> bool {
        self.attr == FileAttributes::LONG_NAME.bits()
    }

    pub fn attributes(&self) -> FileAttributes {
        FileAttributes::from_bits_truncate(self.attr)
    }

    /// Directories and volume labels cannot be opened as files.
    pub fn is_dir_or_label(&self) -> bool {
        self.attributes()
            .intersects(FileAttributes::DIRECTORY | FileAttributes::VOLUME_ID)
    }

    /// First cluster; the high half is always zero on FAT12
    pub fn start_cluster(&self) -> u16 {
        self.start_cluster_low
    }
}

/// Pad `name` into the 11-byte on-disk form: up to 8 bytes before the first `.`,
/// up to 3 after it, both space padded. Case is kept as given.
pub fn short_name(name: &str) -> FsResult<[u8; SHORT_NAME_LEN]> {
    let (base, ext) = match name.split_once('.') {
        Some((base, ext)) => (base, ext),
        None => (name, ""),
    };
    if base.is_empty() || base.len() > NAME_LEN || ext.len() > EXT_LEN {
        return Err(FsError::InvalidArgument);
    }
    let mut out = [b' '; SHORT_NAME_LEN];
    out[..base.len()].copy_from_slice(base.as_bytes());
    out[NAME_LEN..NAME_LEN + ext.len()].copy_from_slice(ext.as_bytes());
    Ok(out)
}

/// Render an on-disk name as `NAME.EXT`.
///
/// Each part stops at its first non-alphabetic byte, and the dot is only
/// written when the extension keeps at least one character.
pub fn display_name(raw: &[u8; SHORT_NAME_LEN]) -> String {
    let mut name = String::new();
    for &b in raw[..NAME_LEN].iter().take_while(|b| b.is_ascii_alphabetic()) {
        name.push(b as char);
    }
    let mut ext = raw[NAME_LEN..]
        .iter()
        .take_while(|b| b.is_ascii_alphabetic())
        .peekable();
    if ext.peek().is_some() {
        name.push('.');
        for &b in ext {
            name.push(b as char);
        }
    }
    name
}

/// A root directory entry as handed out by [`crate::Dir`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub short_name: [u8; SHORT_NAME_LEN],
    pub size: u32,
    pub start_cluster: u16,
    pub is_archived: bool,
    pub is_readonly: bool,
    pub is_hidden: bool,
    pub is_system: bool,
    pub is_directory: bool,
    pub creation_date: FatDate,
    pub creation_time: FatTime,
    pub modified_date: FatDate,
    pub modified_time: FatTime,
}

impl DirEntry {
    pub fn from_layout(layout: &DirEntryLayout) -> Self {
        let attr = layout.attributes();
        Self {
            name: display_name(&layout.name),
            short_name: layout.name,
            size: layout.file_size,
            start_cluster: layout.start_cluster(),
            is_archived: attr.contains(FileAttributes::ARCHIVE),
            is_readonly: attr.contains(FileAttributes::READ_ONLY),
            is_hidden: attr.contains(FileAttributes::HIDDEN),
            is_system: attr.contains(FileAttributes::SYSTEM),
            is_directory: attr.contains(FileAttributes::DIRECTORY),
            creation_date: FatDate::decode(layout.create_date),
            creation_time: FatTime::decode(layout.create_time),
            modified_date: FatDate::decode(layout.last_modify_date),
            modified_time: FatTime::decode(layout.last_modify_time),
        }
    }
}
