//! # Block Layer Sizing

/// Size of one disk block (and of a cached buffer's payload) in bytes.
pub const BLOCK_SIZE: usize = 1024;

/// Largest number of blocks a single filesystem operation writes.
pub const MAX_OP_BLOCKS: usize = 10;

/// Number of buffer slots in the block cache.
///
/// Sized so that three concurrent filesystem operations can hold all of
/// their blocks at once.
pub const BUFFER_SLOTS: usize = MAX_OP_BLOCKS * 3;

/// Number of hash buckets the block cache partitions its lookup index into.
///
/// Prime, so that strided block numbers still spread across buckets.
pub const BUCKETS: usize = 13;

const _: () = {
    assert!(BLOCK_SIZE.is_power_of_two());
    assert!(BUFFER_SLOTS > 0);
    assert!(BUFFER_SLOTS < u16::MAX as usize);
    assert!(BUCKETS > 0);
};
