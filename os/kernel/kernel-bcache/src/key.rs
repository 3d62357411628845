use bitfield_struct::bitfield;
use core::fmt;
use kernel_info::block::BUCKETS;

/// Identity of a disk block: device number and block number packed into one word.
///
/// Packing lets a buffer slot publish its identity through a single
/// `AtomicU64`, so a bucket scan never observes a half-updated pair.
#[bitfield(u64)]
#[derive(PartialEq, Eq, Hash)]
pub struct BlockKey {
    /// Block number on the device (bits 0..31); selects the hash bucket.
    pub blockno: u32,
    /// Device number (bits 32..63).
    pub dev: u32,
}

impl BlockKey {
    #[inline]
    #[must_use]
    pub const fn of(dev: u32, blockno: u32) -> Self {
        Self::new().with_dev(dev).with_blockno(blockno)
    }

    /// Hash bucket this block lives in.
    #[inline]
    #[must_use]
    pub const fn bucket(self) -> usize {
        self.blockno() as usize % BUCKETS
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.dev(), self.blockno())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_both_halves() {
        let key = BlockKey::of(3, 0x1234_5678);
        assert_eq!(key.dev(), 3);
        assert_eq!(key.blockno(), 0x1234_5678);
        assert_eq!(key.into_bits(), (3u64 << 32) | 0x1234_5678);
        assert_eq!(BlockKey::from_bits(key.into_bits()), key);
    }

    #[test]
    fn bucket_follows_block_number_only() {
        assert_eq!(BlockKey::of(1, 27).bucket(), 1);
        assert_eq!(BlockKey::of(9, 27).bucket(), 1);
        assert_eq!(BlockKey::of(1, 12).bucket(), 12);
    }

    #[test]
    fn displays_as_dev_colon_block() {
        assert_eq!(format!("{}", BlockKey::of(1, 42)), "1:42");
    }
}
