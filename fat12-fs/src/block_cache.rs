//! Sector cache layer.
//!
//! Byte-granular reads from the data region land here instead of hitting the device once per call.
//! The cache is read-only: a sector is loaded once and served from memory until it is evicted.

use alloc::{collections::VecDeque, sync::Arc};

use crate::{block_dev::BlockDevice, FsResult, BLOCK_SZ};

/// Number of sectors kept by one [`BlockCacheManager`]
pub const BLOCK_CACHE_SIZE: usize = 16;

/// A cached copy of one sector
pub struct BlockCache {
    cache: [u8; BLOCK_SZ],
    block_id: usize,
}

impl BlockCache {
    /// Load a sector from the device.
    pub fn new(block_id: usize, block_device: &Arc<dyn BlockDevice>) -> FsResult<Self> {
        let mut cache = [0u8; BLOCK_SZ];
        block_device.read_block(block_id, &mut cache)?;
        Ok(Self { cache, block_id })
    }

    pub fn block_id(&self) -> usize {
        self.block_id
    }

    /// Run `f` over the bytes from `offset` to the end of the sector.
    pub fn read<V>(&self, offset: usize, f: impl FnOnce(&[u8]) -> V) -> V {
        assert!(offset <= BLOCK_SZ);
        f(&self.cache[offset..])
    }
}

pub struct BlockCacheManager {
    queue: VecDeque<(usize, Arc<BlockCache>)>,
}

impl BlockCacheManager {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    pub fn get_block_cache(
        &mut self,
        block_id: usize,
        block_device: &Arc<dyn BlockDevice>,
    ) -> FsResult<Arc<BlockCache>> {
        if let Some(pair) = self.queue.iter().find(|pair| pair.0 == block_id) {
            return Ok(Arc::clone(&pair.1));
        }
        let block_cache = Arc::new(BlockCache::new(block_id, block_device)?);
        if self.queue.len() == BLOCK_CACHE_SIZE {
            self.queue.pop_front();
        }
        trace!("block cache: loaded sector {}", block_id);
        self.queue.push_back((block_id, Arc::clone(&block_cache)));
        Ok(block_cache)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Default for BlockCacheManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_image::RamDisk;
    use crate::FsError;
    use alloc::vec;

    fn disk(sectors: usize) -> Arc<dyn BlockDevice> {
        let mut data = vec![0u8; BLOCK_SZ * sectors];
        for (i, sector) in data.chunks_mut(BLOCK_SZ).enumerate() {
            sector.fill(i as u8);
        }
        Arc::new(RamDisk::new(data))
    }

    #[test]
    fn serves_repeated_reads_from_memory() {
        let bdev = disk(4);
        let mut manager = BlockCacheManager::new();
        let first = manager.get_block_cache(2, &bdev).unwrap();
        let again = manager.get_block_cache(2, &bdev).unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(manager.len(), 1);
        assert_eq!(first.read(510, |data| data.to_vec()), vec![2u8, 2]);
    }

    #[test]
    fn evicts_oldest_sector_when_full() {
        let bdev = disk(BLOCK_CACHE_SIZE + 1);
        let mut manager = BlockCacheManager::new();
        let oldest = manager.get_block_cache(0, &bdev).unwrap();
        for id in 1..=BLOCK_CACHE_SIZE {
            manager.get_block_cache(id, &bdev).unwrap();
        }
        assert_eq!(manager.len(), BLOCK_CACHE_SIZE);
        let reloaded = manager.get_block_cache(0, &bdev).unwrap();
        assert!(!Arc::ptr_eq(&oldest, &reloaded));
        assert_eq!(reloaded.block_id(), 0);
    }

    #[test]
    fn propagates_device_failure() {
        let bdev = disk(1);
        let mut manager = BlockCacheManager::new();
        assert_eq!(
            manager.get_block_cache(7, &bdev).err(),
            Some(FsError::Unavailable)
        );
        assert!(manager.is_empty());
    }
}
