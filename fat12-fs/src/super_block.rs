//! Boot sector of a FAT12 volume.

use crate::{error::FsError, FsResult, BLOCK_SZ, DIRENT_SZ};

const BS_OEM_NAME: usize = 3;
const BPB_BYTES_PER_SECTOR: usize = 11;
const BPB_SECTORS_PER_CLUSTER: usize = 13;
const BPB_RESERVED_SECTORS: usize = 14;
const BPB_NUM_FATS: usize = 16;
const BPB_ROOT_ENTRIES: usize = 17;
const BPB_TOTAL_SECTORS_16: usize = 19;
const BPB_MEDIA: usize = 21;
const BPB_FAT_SIZE_16: usize = 22;
const BPB_SECTORS_PER_TRACK: usize = 24;
const BPB_NUM_HEADS: usize = 26;
const BPB_HIDDEN_SECTORS: usize = 28;
const BPB_TOTAL_SECTORS_32: usize = 32;
const BS_DRIVE_NUMBER: usize = 36;
const BS_BOOT_SIGNATURE: usize = 38;
const BS_VOLUME_ID: usize = 39;
const BS_VOLUME_LABEL: usize = 43;
const BS_FS_TYPE: usize = 54;
const BS_SIGNATURE: usize = 510;

/// Trailing signature of every boot sector
pub const BOOT_SIGNATURE: u16 = 0xAA55;
/// Accepted extended boot signatures
pub const EXT_BOOT_SIGNATURES: [u8; 2] = [0x29, 0x28];
/// A FAT12 volume keeps exactly this many allocation tables
pub const FAT_COUNT: u8 = 2;

/// The boot sector of a FAT12 volume, decoded field by field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootSector {
    pub oem_name: [u8; 8],
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub fat_count: u8,
    pub root_entry_count: u16,
    pub total_sectors_16: u16,
    pub media_type: u8,
    pub fat_size: u16,
    pub sectors_per_track: u16,
    pub head_count: u16,
    pub hidden_sectors: u32,
    pub total_sectors_32: u32,
    pub drive_number: u8,
    pub ext_boot_signature: u8,
    pub volume_id: u32,
    pub volume_label: [u8; 11],
    pub fs_type: [u8; 8],
    pub signature: u16,
}

fn le16(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

fn le32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

impl BootSector {
    /// Decode a boot sector. Only the length is checked here, see [`BootSector::validate`].
    pub fn parse(buf: &[u8]) -> FsResult<Self> {
        if buf.len() < BLOCK_SZ {
            return Err(FsError::InvalidArgument);
        }
        let mut oem_name = [0u8; 8];
        oem_name.copy_from_slice(&buf[BS_OEM_NAME..BS_OEM_NAME + 8]);
        let mut volume_label = [0u8; 11];
        volume_label.copy_from_slice(&buf[BS_VOLUME_LABEL..BS_VOLUME_LABEL + 11]);
        let mut fs_type = [0u8; 8];
        fs_type.copy_from_slice(&buf[BS_FS_TYPE..BS_FS_TYPE + 8]);
        Ok(Self {
            oem_name,
            bytes_per_sector: le16(buf, BPB_BYTES_PER_SECTOR),
            sectors_per_cluster: buf[BPB_SECTORS_PER_CLUSTER],
            reserved_sectors: le16(buf, BPB_RESERVED_SECTORS),
            fat_count: buf[BPB_NUM_FATS],
            root_entry_count: le16(buf, BPB_ROOT_ENTRIES),
            total_sectors_16: le16(buf, BPB_TOTAL_SECTORS_16),
            media_type: buf[BPB_MEDIA],
            fat_size: le16(buf, BPB_FAT_SIZE_16),
            sectors_per_track: le16(buf, BPB_SECTORS_PER_TRACK),
            head_count: le16(buf, BPB_NUM_HEADS),
            hidden_sectors: le32(buf, BPB_HIDDEN_SECTORS),
            total_sectors_32: le32(buf, BPB_TOTAL_SECTORS_32),
            drive_number: buf[BS_DRIVE_NUMBER],
            ext_boot_signature: buf[BS_BOOT_SIGNATURE],
            volume_id: le32(buf, BS_VOLUME_ID),
            volume_label,
            fs_type,
            signature: le16(buf, BS_SIGNATURE),
        })
    }

    /// Encode into the first 512 bytes of `buf`. Boot code bytes are left untouched.
    pub fn serialize(&self, buf: &mut [u8]) -> FsResult<()> {
        if buf.len() < BLOCK_SZ {
            return Err(FsError::InvalidArgument);
        }
        buf[0..3].copy_from_slice(&[0xEB, 0x3C, 0x90]);
        buf[BS_OEM_NAME..BS_OEM_NAME + 8].copy_from_slice(&self.oem_name);
        buf[BPB_BYTES_PER_SECTOR..BPB_BYTES_PER_SECTOR + 2]
            .copy_from_slice(&self.bytes_per_sector.to_le_bytes());
        buf[BPB_SECTORS_PER_CLUSTER] = self.sectors_per_cluster;
        buf[BPB_RESERVED_SECTORS..BPB_RESERVED_SECTORS + 2]
            .copy_from_slice(&self.reserved_sectors.to_le_bytes());
        buf[BPB_NUM_FATS] = self.fat_count;
        buf[BPB_ROOT_ENTRIES..BPB_ROOT_ENTRIES + 2]
            .copy_from_slice(&self.root_entry_count.to_le_bytes());
        buf[BPB_TOTAL_SECTORS_16..BPB_TOTAL_SECTORS_16 + 2]
            .copy_from_slice(&self.total_sectors_16.to_le_bytes());
        buf[BPB_MEDIA] = self.media_type;
        buf[BPB_FAT_SIZE_16..BPB_FAT_SIZE_16 + 2].copy_from_slice(&self.fat_size.to_le_bytes());
        buf[BPB_SECTORS_PER_TRACK..BPB_SECTORS_PER_TRACK + 2]
            .copy_from_slice(&self.sectors_per_track.to_le_bytes());
        buf[BPB_NUM_HEADS..BPB_NUM_HEADS + 2].copy_from_slice(&self.head_count.to_le_bytes());
        buf[BPB_HIDDEN_SECTORS..BPB_HIDDEN_SECTORS + 4]
            .copy_from_slice(&self.hidden_sectors.to_le_bytes());
        buf[BPB_TOTAL_SECTORS_32..BPB_TOTAL_SECTORS_32 + 4]
            .copy_from_slice(&self.total_sectors_32.to_le_bytes());
        buf[BS_DRIVE_NUMBER] = self.drive_number;
        buf[BS_BOOT_SIGNATURE] = self.ext_boot_signature;
        buf[BS_VOLUME_ID..BS_VOLUME_ID + 4].copy_from_slice(&self.volume_id.to_le_bytes());
        buf[BS_VOLUME_LABEL..BS_VOLUME_LABEL + 11].copy_from_slice(&self.volume_label);
        buf[BS_FS_TYPE..BS_FS_TYPE + 8].copy_from_slice(&self.fs_type);
        buf[BS_SIGNATURE..BS_SIGNATURE + 2].copy_from_slice(&self.signature.to_le_bytes());
        Ok(())
    }

    /// Refuse anything this reader cannot mount.
    pub fn validate(&self) -> FsResult<()> {
        if self.signature != BOOT_SIGNATURE {
            warn!("boot sector: bad signature {:#06x}", self.signature);
            return Err(FsError::InvalidVolume);
        }
        if !EXT_BOOT_SIGNATURES.contains(&self.ext_boot_signature) {
            warn!(
                "boot sector: bad extended boot signature {:#04x}",
                self.ext_boot_signature
            );
            return Err(FsError::InvalidVolume);
        }
        if self.fat_count != FAT_COUNT {
            warn!("boot sector: {} allocation tables, expected 2", self.fat_count);
            return Err(FsError::InvalidVolume);
        }
        if self.bytes_per_sector as usize != BLOCK_SZ {
            warn!("boot sector: {} bytes per sector", self.bytes_per_sector);
            return Err(FsError::InvalidVolume);
        }
        if self.sectors_per_cluster == 0 {
            warn!("boot sector: zero sectors per cluster");
            return Err(FsError::InvalidVolume);
        }
        Ok(())
    }

    pub fn total_sectors(&self) -> u32 {
        if self.total_sectors_16 != 0 {
            self.total_sectors_16 as u32
        } else {
            self.total_sectors_32
        }
    }

    pub fn bytes_per_cluster(&self) -> usize {
        self.sectors_per_cluster as usize * self.bytes_per_sector as usize
    }

    /// Size of one allocation table in bytes
    pub fn fat_bytes(&self) -> usize {
        self.fat_size as usize * self.bytes_per_sector as usize
    }

    /// First sector of table `index` (0 or 1), relative to the volume start
    pub fn fat_sector(&self, index: usize) -> usize {
        self.reserved_sectors as usize + index * self.fat_size as usize
    }

    /// First sector of the root directory, relative to the volume start
    pub fn root_dir_sector(&self) -> usize {
        self.fat_sector(FAT_COUNT as usize)
    }

    /// Size of the root directory region in bytes
    pub fn root_dir_bytes(&self) -> usize {
        self.root_entry_count as usize * DIRENT_SZ
    }

    /// Sectors read to cover the root directory region
    pub fn root_dir_sectors(&self) -> usize {
        (self.root_dir_bytes() + BLOCK_SZ - 1) / BLOCK_SZ
    }

    /// Byte offset of the data region, relative to the volume start
    pub fn data_region_offset(&self) -> usize {
        self.root_dir_sector() * self.bytes_per_sector as usize + self.root_dir_bytes()
    }

    /// Volume label with its padding removed
    pub fn label(&self) -> &str {
        trim_padded(&self.volume_label)
    }

    /// File system type string with its padding removed, usually `FAT12`
    pub fn fs_type_str(&self) -> &str {
        trim_padded(&self.fs_type)
    }
}

fn trim_padded(bytes: &[u8]) -> &str {
    core::str::from_utf8(bytes)
        .unwrap_or("")
        .trim_end_matches(|c| c == ' ' || c == '\0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_image::floppy_boot_sector;

    #[test]
    fn parse_1440_boot_sector() {
        let mut buf = [0u8; BLOCK_SZ];
        floppy_boot_sector().serialize(&mut buf).unwrap();

        let bs = BootSector::parse(&buf).unwrap();
        assert_eq!(bs.bytes_per_sector, 512);
        assert_eq!(bs.sectors_per_cluster, 1);
        assert_eq!(bs.reserved_sectors, 1);
        assert_eq!(bs.fat_count, 2);
        assert_eq!(bs.root_entry_count, 224);
        assert_eq!(bs.total_sectors(), 2880);
        assert_eq!(bs.fat_size, 9);
        assert_eq!(bs.media_type, 0xF0);
        assert_eq!(bs.label(), "NO NAME");
        assert_eq!(bs.fs_type_str(), "FAT12");
        assert_eq!(bs.signature, BOOT_SIGNATURE);
        assert_eq!(bs.validate(), Ok(()));
    }

    #[test]
    fn layout_offsets() {
        let bs = floppy_boot_sector();
        assert_eq!(bs.fat_sector(0), 1);
        assert_eq!(bs.fat_sector(1), 10);
        assert_eq!(bs.root_dir_sector(), 19);
        assert_eq!(bs.root_dir_sectors(), 14);
        assert_eq!(bs.data_region_offset(), 33 * 512);
        assert_eq!(bs.bytes_per_cluster(), 512);
    }

    #[test]
    fn total_sectors_falls_back_to_32_bit_field() {
        let mut bs = floppy_boot_sector();
        bs.total_sectors_16 = 0;
        bs.total_sectors_32 = 70_000;
        assert_eq!(bs.total_sectors(), 70_000);
    }

    #[test]
    fn validate_rejects_bad_fields() {
        let good = floppy_boot_sector();

        let mut bs = good;
        bs.signature = 0x55AA;
        assert_eq!(bs.validate(), Err(FsError::InvalidVolume));

        let mut bs = good;
        bs.ext_boot_signature = 0x27;
        assert_eq!(bs.validate(), Err(FsError::InvalidVolume));

        let mut bs = good;
        bs.ext_boot_signature = 0x28;
        assert_eq!(bs.validate(), Ok(()));

        let mut bs = good;
        bs.fat_count = 1;
        assert_eq!(bs.validate(), Err(FsError::InvalidVolume));

        let mut bs = good;
        bs.bytes_per_sector = 1024;
        assert_eq!(bs.validate(), Err(FsError::InvalidVolume));

        let mut bs = good;
        bs.sectors_per_cluster = 0;
        assert_eq!(bs.validate(), Err(FsError::InvalidVolume));
    }

    #[test]
    fn parse_rejects_short_buffer() {
        assert_eq!(BootSector::parse(&[0u8; 100]), Err(FsError::InvalidArgument));
    }
}
