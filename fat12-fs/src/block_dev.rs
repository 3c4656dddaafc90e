//! Block device interface.
//!
//! Define the sector read interface [BlockDevice] that a backing store needs to implement

use core::any::Any;

use crate::{error::FsError, FsResult, BLOCK_SZ};

pub trait BlockDevice: Send + Sync + Any {
    /// Read one sector into the first [`BLOCK_SZ`] bytes of `buf`.
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> FsResult<()>;
    /// Number of whole sectors held by the device.
    fn num_blocks(&self) -> usize;

    /// Read `count` consecutive sectors starting at `first` into `buf`.
    ///
    /// Fails without touching the device when the range runs past the last sector.
    fn read_blocks(&self, first: usize, buf: &mut [u8], count: usize) -> FsResult<usize> {
        let end = first.checked_add(count).ok_or(FsError::InvalidArgument)?;
        if end > self.num_blocks() {
            warn!(
                "read_blocks: sectors {}..{} past end of device ({} sectors)",
                first,
                end,
                self.num_blocks()
            );
            return Err(FsError::Unavailable);
        }
        if buf.len() < count * BLOCK_SZ {
            return Err(FsError::InvalidArgument);
        }
        for (i, chunk) in buf.chunks_exact_mut(BLOCK_SZ).take(count).enumerate() {
            self.read_block(first + i, chunk)?;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_image::RamDisk;
    use alloc::vec;

    #[test]
    fn read_blocks_copies_consecutive_sectors() {
        let mut data = vec![0u8; BLOCK_SZ * 4];
        for (i, sector) in data.chunks_mut(BLOCK_SZ).enumerate() {
            sector.fill(i as u8 + 1);
        }
        let disk = RamDisk::new(data);
        let mut buf = vec![0u8; BLOCK_SZ * 2];
        assert_eq!(disk.read_blocks(1, &mut buf, 2), Ok(2));
        assert!(buf[..BLOCK_SZ].iter().all(|&b| b == 2));
        assert!(buf[BLOCK_SZ..].iter().all(|&b| b == 3));
    }

    #[test]
    fn read_blocks_rejects_range_past_end() {
        let disk = RamDisk::new(vec![0u8; BLOCK_SZ * 4]);
        let mut buf = vec![0u8; BLOCK_SZ * 2];
        assert_eq!(disk.read_blocks(3, &mut buf, 2), Err(FsError::Unavailable));
        assert_eq!(disk.read_blocks(0, &mut buf, 3), Err(FsError::InvalidArgument));
        assert_eq!(disk.read_blocks(4, &mut buf, 0), Ok(0));
    }
}
