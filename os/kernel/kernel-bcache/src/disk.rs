use crate::BlockKey;
use core::ops::{Deref, DerefMut};
use kernel_info::block::BLOCK_SIZE;

/// Payload of one cached block.
#[repr(C, align(8))]
#[derive(Clone, PartialEq, Eq)]
pub struct BlockData([u8; BLOCK_SIZE]);

impl BlockData {
    #[must_use]
    pub const fn zeroed() -> Self {
        Self([0; BLOCK_SIZE])
    }
}

impl Default for BlockData {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl Deref for BlockData {
    type Target = [u8; BLOCK_SIZE];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for BlockData {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl core::fmt::Debug for BlockData {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "BlockData({:02x?}..)", &self.0[..8])
    }
}

/// Synchronous block device.
///
/// Both calls return only once the transfer is complete. Device errors are
/// the driver's business; the cache assumes every transfer succeeds.
pub trait DiskDriver {
    fn read_block(&self, key: BlockKey, data: &mut BlockData);
    fn write_block(&self, key: BlockKey, data: &BlockData);
}

impl<D: DiskDriver + ?Sized> DiskDriver for &D {
    fn read_block(&self, key: BlockKey, data: &mut BlockData) {
        (**self).read_block(key, data);
    }

    fn write_block(&self, key: BlockKey, data: &BlockData) {
        (**self).write_block(key, data);
    }
}
