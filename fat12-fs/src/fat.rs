//! 12-bit packed allocation table and cluster-chain resolution.

use alloc::vec::Vec;
use core::ops::Deref;

use crate::{error::FsError, FsResult};

/// Clusters 0 and 1 are reserved, data starts at cluster 2
pub const FIRST_DATA_CLUSTER: u16 = 2;
/// Marker for a cluster that must not be used
pub const BAD_CLUSTER: u16 = 0xFF7;
/// Every table value from here up terminates a chain
pub const END_OF_CHAIN_MIN: u16 = 0xFF8;
/// The value written by formatters to close a chain
pub const END_OF_CHAIN: u16 = 0xFFF;

pub fn is_end_of_chain(value: u16) -> bool {
    value >= END_OF_CHAIN_MIN
}

fn entry_offset(index: u16) -> usize {
    index as usize + index as usize / 2
}

/// Number of 12-bit entries a table of `fat_bytes` bytes can hold
pub fn entry_count(fat_bytes: usize) -> usize {
    fat_bytes * 2 / 3
}

/// Decode the 12-bit entry of cluster `index`.
///
/// Even entries sit in the low 12 bits of the little-endian word at `index * 3 / 2`,
/// odd entries in its high 12 bits.
pub fn fat12_entry(fat: &[u8], index: u16) -> Option<u16> {
    let offset = entry_offset(index);
    let word = u16::from_le_bytes([*fat.get(offset)?, *fat.get(offset + 1)?]);
    if index % 2 == 0 {
        Some(word & 0x0FFF)
    } else {
        Some(word >> 4)
    }
}

/// Encode `value` as the 12-bit entry of cluster `index`, keeping the neighbouring nibble.
pub fn set_fat12_entry(fat: &mut [u8], index: u16, value: u16) -> FsResult<()> {
    let offset = entry_offset(index);
    if offset + 1 >= fat.len() {
        return Err(FsError::InvalidArgument);
    }
    let word = u16::from_le_bytes([fat[offset], fat[offset + 1]]);
    let word = if index % 2 == 0 {
        (word & 0xF000) | (value & 0x0FFF)
    } else {
        (word & 0x000F) | ((value & 0x0FFF) << 4)
    };
    fat[offset..offset + 2].copy_from_slice(&word.to_le_bytes());
    Ok(())
}

/// The clusters owned by a file, in file order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterChain {
    clusters: Vec<u16>,
}

impl ClusterChain {
    /// Walk the table from `start` until an end-of-chain value.
    ///
    /// The walk is bounded by the number of data clusters the table can describe, so a cycle
    /// fails with [`FsError::CorruptChain`] instead of looping. [`BAD_CLUSTER`] is followed like
    /// any other link.
    pub fn resolve(fat: &[u8], start: u16) -> FsResult<Self> {
        if start == 0 {
            return Err(FsError::InvalidChain);
        }
        let limit = entry_count(fat.len()).saturating_sub(FIRST_DATA_CLUSTER as usize);
        let mut clusters = Vec::new();
        let mut current = start;
        while !is_end_of_chain(current) {
            if current < FIRST_DATA_CLUSTER {
                warn!("cluster chain from {}: link to reserved cluster {}", start, current);
                return Err(FsError::CorruptChain);
            }
            if clusters.len() >= limit {
                warn!("cluster chain from {}: longer than {} clusters", start, limit);
                return Err(FsError::CorruptChain);
            }
            clusters.push(current);
            current = fat12_entry(fat, current).ok_or_else(|| {
                warn!("cluster chain from {}: cluster {} outside the table", start, current);
                FsError::CorruptChain
            })?;
        }
        if clusters.is_empty() {
            return Err(FsError::InvalidChain);
        }
        Ok(Self { clusters })
    }

    pub fn clusters(&self) -> &[u16] {
        &self.clusters
    }
}

impl Deref for ClusterChain {
    type Target = [u16];

    fn deref(&self) -> &[u16] {
        &self.clusters
    }
}
