use core::cmp::min;

use crate::{
    dentry::{short_name, DirEntryLayout},
    error::FsError,
    fat::ClusterChain,
    file_system::Volume,
    FsResult,
};

/// Where a [`File::seek`] is measured from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekFrom {
    Start(u64),
    Current(i64),
    End(i64),
}

/// A read-only stream over one file of the root directory.
///
/// The handle borrows its [`Volume`]; the cluster chain is resolved once at open and owned here.
pub struct File<'a> {
    volume: &'a Volume,
    entry: DirEntryLayout,
    chain: ClusterChain,
    position: usize,
}

impl<'a> File<'a> {
    /// Open `name` (`NAME.EXT`, matched byte for byte against the padded 8.3 form).
    pub fn open(volume: &'a Volume, name: &str) -> FsResult<Self> {
        let wanted = short_name(name)?;
        let entry = (0..volume.root_entry_count())
            .map_while(|index| volume.dir_slot(index))
            .take_while(|slot| !slot.is_end())
            .filter(|slot| !slot.is_deleted())
            .find(|slot| slot.name == wanted)
            .ok_or(FsError::NotFound)?;
        if entry.is_dir_or_label() || entry.file_size == 0 {
            return Err(FsError::IsDirectory);
        }
        let chain = ClusterChain::resolve(volume.fat(), entry.start_cluster()).map_err(|err| {
            warn!("open {}: {}", name, err);
            FsError::InvalidChain
        })?;
        debug!(
            "open {}: {} bytes in {} clusters from cluster {}",
            name,
            entry.file_size,
            chain.len(),
            entry.start_cluster()
        );
        Ok(Self {
            volume,
            entry,
            chain,
            position: 0,
        })
    }

    /// Read up to `buf.len()` bytes from the current position.
    ///
    /// Returns 0 at end of file. Stops early if the chain is shorter than the entry claims.
    /// On error the position is left where it was before the call.
    pub fn read(&mut self, buf: &mut [u8]) -> FsResult<usize> {
        let start = self.position;
        let result = self.read_clusters(buf);
        if result.is_err() {
            self.position = start;
        }
        result
    }

    fn read_clusters(&mut self, buf: &mut [u8]) -> FsResult<usize> {
        let bytes_per_cluster = self.volume.bytes_per_cluster();
        let size = self.size();
        let mut read_size = 0;
        while read_size < buf.len() && self.position < size {
            let Some(&cluster) = self.chain.get(self.position / bytes_per_cluster) else {
                warn!(
                    "read: chain of {} clusters ends before byte {}",
                    self.chain.len(),
                    self.position
                );
                break;
            };
            let in_cluster = self.position % bytes_per_cluster;
            let copy_size = min(
                buf.len() - read_size,
                min(bytes_per_cluster - in_cluster, size - self.position),
            );
            let offset = self.volume.cluster_offset(cluster)? + in_cluster;
            trace!(
                "read: cluster {} at {:#x}, {} bytes",
                cluster,
                offset,
                copy_size
            );
            self.volume
                .read_bytes(offset, &mut buf[read_size..read_size + copy_size])?;
            read_size += copy_size;
            self.position += copy_size;
        }
        Ok(read_size)
    }

    /// Read `count` items of `item_size` bytes each, returning how many whole items arrived.
    pub fn read_items(
        &mut self,
        buf: &mut [u8],
        item_size: usize,
        count: usize,
    ) -> FsResult<usize> {
        if item_size == 0 || count == 0 {
            return Err(FsError::InvalidArgument);
        }
        let total = item_size.checked_mul(count).ok_or(FsError::InvalidArgument)?;
        let buf = buf.get_mut(..total).ok_or(FsError::InvalidArgument)?;
        let read_size = self.read(buf)?;
        Ok(read_size / item_size)
    }

    /// Move the position. The result must stay within `[0, size]`.
    pub fn seek(&mut self, pos: SeekFrom) -> FsResult<usize> {
        let size = self.size() as i64;
        let target = match pos {
            SeekFrom::Start(offset) => i64::try_from(offset).ok(),
            SeekFrom::Current(offset) => (self.position as i64).checked_add(offset),
            SeekFrom::End(offset) => size.checked_add(offset),
        };
        match target {
            Some(target) if (0..=size).contains(&target) => {
                self.position = target as usize;
                Ok(self.position)
            }
            _ => Err(FsError::OutOfRange),
        }
    }

    /// Drop the handle and its chain.
    pub fn close(self) {}

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn size(&self) -> usize {
        self.entry.file_size as usize
    }

    pub fn chain(&self) -> &ClusterChain {
        &self.chain
    }
}
