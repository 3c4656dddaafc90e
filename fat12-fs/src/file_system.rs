use alloc::{sync::Arc, vec, vec::Vec};
use core::cmp::min;
use spin::Mutex;

use crate::{
    block_cache::BlockCacheManager,
    block_dev::BlockDevice,
    dentry::DirEntryLayout,
    error::FsError,
    fat::FIRST_DATA_CLUSTER,
    super_block::BootSector,
    FsResult, BLOCK_SZ, DIRENT_SZ,
};

/// A mounted FAT12 volume.
///
/// Owns the boot sector, both allocation tables and the root directory region. All of them
/// are read-only after [`Volume::mount`], so files and directory cursors borrow them freely.
pub struct Volume {
    bdev: Arc<dyn BlockDevice>,
    first_sector: usize,
    boot: BootSector,
    fat1: Vec<u8>,
    fat2: Vec<u8>,
    root_dir: Vec<u8>,
    cache: Mutex<BlockCacheManager>,
}

fn read_region(bdev: &Arc<dyn BlockDevice>, first: usize, count: usize) -> FsResult<Vec<u8>> {
    let mut buf = vec![0u8; count * BLOCK_SZ];
    bdev.read_blocks(first, &mut buf, count)?;
    Ok(buf)
}

impl Volume {
    /// Mount the volume whose boot sector is sector `first_sector` of `bdev`.
    ///
    /// Every later sector and byte offset is taken relative to `first_sector`.
    pub fn mount(bdev: Arc<dyn BlockDevice>, first_sector: usize) -> FsResult<Self> {
        let sector = read_region(&bdev, first_sector, 1)?;
        let boot = BootSector::parse(&sector)?;
        boot.validate()?;

        let fat_sectors = boot.fat_size as usize;
        let fat1 = read_region(&bdev, first_sector + boot.fat_sector(0), fat_sectors)?;
        let fat2 = read_region(&bdev, first_sector + boot.fat_sector(1), fat_sectors)?;
        if fat1 != fat2 {
            let at = fat1.iter().zip(fat2.iter()).position(|(a, b)| a != b);
            warn!("mount: allocation tables differ at byte {:?}", at);
            return Err(FsError::InvalidVolume);
        }

        let mut root_dir = read_region(
            &bdev,
            first_sector + boot.root_dir_sector(),
            boot.root_dir_sectors(),
        )?;
        root_dir.truncate(boot.root_dir_bytes());

        debug!(
            "mount: {} sectors, {} bytes/cluster, fat {}x2, {} root entries, data at {:#x}",
            boot.total_sectors(),
            boot.bytes_per_cluster(),
            boot.fat_size,
            boot.root_entry_count,
            boot.data_region_offset()
        );
        Ok(Self {
            bdev,
            first_sector,
            boot,
            fat1,
            fat2,
            root_dir,
            cache: Mutex::new(BlockCacheManager::new()),
        })
    }

    /// Release the tables and the directory region.
    pub fn unmount(self) {
        debug!("unmount: volume at sector {}", self.first_sector);
    }

    pub fn boot_sector(&self) -> &BootSector {
        &self.boot
    }

    pub fn first_sector(&self) -> usize {
        self.first_sector
    }

    /// The primary allocation table
    pub fn fat(&self) -> &[u8] {
        &self.fat1
    }

    /// The redundant copy, identical to [`Volume::fat`]
    pub fn backup_fat(&self) -> &[u8] {
        &self.fat2
    }

    /// The root directory region, `root_entry_count * 32` bytes
    pub fn root_dir(&self) -> &[u8] {
        &self.root_dir
    }

    pub fn root_entry_count(&self) -> usize {
        self.boot.root_entry_count as usize
    }

    pub fn bytes_per_cluster(&self) -> usize {
        self.boot.bytes_per_cluster()
    }

    /// Decode root directory slot `index`.
    pub fn dir_slot(&self, index: usize) -> Option<DirEntryLayout> {
        let start = index.checked_mul(DIRENT_SZ)?;
        let raw = self.root_dir.get(start..start + DIRENT_SZ)?;
        DirEntryLayout::parse(raw).ok()
    }

    /// Byte offset of data cluster `cluster` in the container
    pub fn cluster_offset(&self, cluster: u16) -> FsResult<usize> {
        let index = cluster
            .checked_sub(FIRST_DATA_CLUSTER)
            .ok_or(FsError::InvalidArgument)?;
        Ok(self.first_sector * BLOCK_SZ
            + self.boot.data_region_offset()
            + index as usize * self.bytes_per_cluster())
    }

    /// Fill `buf` from container byte `offset`, going through the sector cache.
    pub fn read_bytes(&self, offset: usize, buf: &mut [u8]) -> FsResult<()> {
        let mut cache = self.cache.lock();
        let mut done = 0;
        while done < buf.len() {
            let pos = offset + done;
            let in_block = pos % BLOCK_SZ;
            let len = min(buf.len() - done, BLOCK_SZ - in_block);
            let block = cache.get_block_cache(pos / BLOCK_SZ, &self.bdev)?;
            block.read(in_block, |data| {
                buf[done..done + len].copy_from_slice(&data[..len]);
            });
            done += len;
        }
        Ok(())
    }
}
