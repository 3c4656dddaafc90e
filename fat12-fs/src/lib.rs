//! fat12-fs
//!
//! fat12-fs is a read-only reader for FAT12 volumes stored in a flat, sector-addressable container.
//!
//! [`Volume`] is produced by mounting: the boot sector is validated, both allocation tables are
//! loaded and compared, and the root directory region is kept in memory. Files are then opened by
//! their 8.3 name ([`File`]) and the root directory is enumerated through a [`Dir`] cursor. Both
//! handles borrow the volume, so they can never outlive it.
//!
//! The crate is split into levels, from bottom to top:
//!
//! - Block device interface layer ([`BlockDevice`])
//! - Sector cache layer
//! - On-disk layout layer (boot sector, 12-bit allocation table, directory slots, packed date/time)
//! - Volume layer (mount / unmount)
//! - File stream and directory cursor layer

#![no_std]

extern crate alloc;
#[macro_use]
extern crate log;

#[cfg(test)]
extern crate std;

pub mod block_cache;
pub mod block_dev;
pub mod dentry;
pub mod dir;
pub mod error;
pub mod fat;
pub mod file;
pub mod file_system;
pub mod super_block;
pub mod time;

#[cfg(test)]
mod test_image;

/// Sector size in bytes
pub const BLOCK_SZ: usize = 512;
/// On-disk directory slot size in bytes
pub const DIRENT_SZ: usize = 32;

pub use block_dev::BlockDevice;
pub use dentry::{DirEntry, FileAttributes};
pub use dir::{Dir, ROOT_DIR_PATH};
pub use error::{FsError, FsResult};
pub use fat::ClusterChain;
pub use file::{File, SeekFrom};
pub use file_system::Volume;
pub use super_block::BootSector;
pub use time::{FatDate, FatTime};
