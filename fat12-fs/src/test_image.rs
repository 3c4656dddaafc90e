//! In-memory device and a small FAT12 image builder for unit tests.

use alloc::{vec, vec::Vec};

use crate::{
    block_dev::BlockDevice,
    dentry::{DirEntryLayout, DIR_DELETED_MARKER},
    error::FsError,
    fat::{set_fat12_entry, END_OF_CHAIN},
    super_block::{BootSector, BOOT_SIGNATURE},
    time::{FatDate, FatTime},
    FsResult, BLOCK_SZ, DIRENT_SZ,
};

pub struct RamDisk {
    data: Vec<u8>,
}

impl RamDisk {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl BlockDevice for RamDisk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> FsResult<()> {
        let start = block_id * BLOCK_SZ;
        let sector = self
            .data
            .get(start..start + BLOCK_SZ)
            .ok_or(FsError::Unavailable)?;
        buf.get_mut(..BLOCK_SZ)
            .ok_or(FsError::InvalidArgument)?
            .copy_from_slice(sector);
        Ok(())
    }

    fn num_blocks(&self) -> usize {
        self.data.len() / BLOCK_SZ
    }
}

/// 1.44MB floppy geometry: 1 reserved sector, 2 x 9 FAT sectors, 224 root entries
pub fn floppy_boot_sector() -> BootSector {
    BootSector {
        oem_name: *b"MSWIN4.1",
        bytes_per_sector: 512,
        sectors_per_cluster: 1,
        reserved_sectors: 1,
        fat_count: 2,
        root_entry_count: 224,
        total_sectors_16: 2880,
        media_type: 0xF0,
        fat_size: 9,
        sectors_per_track: 18,
        head_count: 2,
        hidden_sectors: 0,
        total_sectors_32: 0,
        drive_number: 0,
        ext_boot_signature: 0x29,
        volume_id: 0x1234_ABCD,
        volume_label: *b"NO NAME    ",
        fs_type: *b"FAT12   ",
        signature: BOOT_SIGNATURE,
    }
}

pub struct ImageBuilder {
    boot: BootSector,
    image: Vec<u8>,
    fat: Vec<u8>,
    next_cluster: u16,
    next_slot: usize,
}

impl ImageBuilder {
    pub fn new(boot: BootSector, sectors: usize) -> Self {
        let mut fat = vec![0u8; boot.fat_bytes()];
        if fat.len() >= 3 {
            set_fat12_entry(&mut fat, 0, 0xF00 | boot.media_type as u16).unwrap();
            set_fat12_entry(&mut fat, 1, END_OF_CHAIN).unwrap();
        }
        Self {
            boot,
            image: vec![0u8; sectors * BLOCK_SZ],
            fat,
            next_cluster: 2,
            next_slot: 0,
        }
    }

    fn cluster_offset(&self, cluster: u16) -> usize {
        self.boot.data_region_offset() + (cluster as usize - 2) * self.boot.bytes_per_cluster()
    }

    fn slot_offset(&self, index: usize) -> usize {
        self.boot.root_dir_sector() * BLOCK_SZ + index * DIRENT_SZ
    }

    /// Store `data` in fresh consecutive clusters and add its entry. Returns the first cluster.
    pub fn add_file(&mut self, name: &[u8; 11], attr: u8, data: &[u8]) -> u16 {
        let bpc = self.boot.bytes_per_cluster();
        let count = (data.len() + bpc - 1) / bpc;
        let clusters: Vec<u16> = (self.next_cluster..self.next_cluster + count as u16).collect();
        self.next_cluster += count as u16;
        self.add_file_at(name, attr, data, &clusters)
    }

    /// Store `data` in the given clusters, in order, and chain them.
    pub fn add_file_at(&mut self, name: &[u8; 11], attr: u8, data: &[u8], clusters: &[u16]) -> u16 {
        let bpc = self.boot.bytes_per_cluster();
        for (chunk, &cluster) in data.chunks(bpc).zip(clusters) {
            let at = self.cluster_offset(cluster);
            self.image[at..at + chunk.len()].copy_from_slice(chunk);
        }
        for pair in clusters.windows(2) {
            set_fat12_entry(&mut self.fat, pair[0], pair[1]).unwrap();
        }
        if let Some(&last) = clusters.last() {
            set_fat12_entry(&mut self.fat, last, END_OF_CHAIN).unwrap();
        }
        let start = clusters.first().copied().unwrap_or(0);
        self.add_entry(name, attr, start, data.len() as u32);
        start
    }

    /// Add a directory slot without touching the data region.
    pub fn add_entry(&mut self, name: &[u8; 11], attr: u8, start_cluster: u16, size: u32) {
        let layout = DirEntryLayout {
            name: *name,
            attr,
            reserved: 0,
            create_time_tenths: 0,
            create_time: FatTime {
                hours: 12,
                minutes: 34,
            }
            .encode(),
            create_date: FatDate {
                year: 2024,
                month: 2,
                day: 29,
            }
            .encode(),
            last_access_date: 0,
            start_cluster_high: 0,
            last_modify_time: 0,
            last_modify_date: 0,
            start_cluster_low: start_cluster,
            file_size: size,
        };
        let at = self.slot_offset(self.next_slot);
        layout.serialize(&mut self.image[at..at + DIRENT_SZ]).unwrap();
        self.next_slot += 1;
    }

    pub fn delete_slot(&mut self, index: usize) {
        let at = self.slot_offset(index);
        self.image[at] = DIR_DELETED_MARKER;
    }

    pub fn edit_fat(&mut self, f: impl FnOnce(&mut [u8])) {
        f(&mut self.fat);
    }

    pub fn build(mut self) -> Vec<u8> {
        self.boot.serialize(&mut self.image[..BLOCK_SZ]).unwrap();
        for index in 0..2 {
            let at = self.boot.fat_sector(index) * BLOCK_SZ;
            self.image[at..at + self.fat.len()].copy_from_slice(&self.fat);
        }
        self.image
    }
}
