use core::iter::FusedIterator;

use crate::{dentry::DirEntry, error::FsError, file_system::Volume, FsResult};

/// The only directory path a FAT12 volume can be opened at
pub const ROOT_DIR_PATH: &str = "\\";

/// Cursor over the root directory of a [`Volume`].
///
/// Deleted slots and long-name slots are skipped; the first slot whose name starts
/// with 0x00 ends the enumeration for good.
pub struct Dir<'a> {
    volume: &'a Volume,
    count: usize,
    position: usize,
    finished: bool,
}

impl<'a> Dir<'a> {
    pub fn open(volume: &'a Volume, path: &str) -> FsResult<Self> {
        if path.is_empty() {
            return Err(FsError::InvalidArgument);
        }
        if path != ROOT_DIR_PATH {
            warn!("open dir {}: only the root directory is supported", path);
            return Err(FsError::NotSupported);
        }
        Ok(Self {
            volume,
            count: volume.root_entry_count(),
            position: 0,
            finished: false,
        })
    }

    pub fn close(self) {}

    /// Index of the next slot to inspect
    pub fn position(&self) -> usize {
        self.position
    }
}

impl Iterator for Dir<'_> {
    type Item = DirEntry;

    fn next(&mut self) -> Option<DirEntry> {
        while !self.finished && self.position < self.count {
            let slot = match self.volume.dir_slot(self.position) {
                Some(slot) if !slot.is_end() => slot,
                _ => {
                    self.finished = true;
                    break;
                }
            };
            self.position += 1;
            if slot.is_deleted() || slot.is_long() {
                continue;
            }
            return Some(DirEntry::from_layout(&slot));
        }
        None
    }
}

impl FusedIterator for Dir<'_> {}
