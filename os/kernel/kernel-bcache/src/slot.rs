use crate::{BlockData, BlockKey};
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use kernel_sync::{Scheduler, SleepMutex};

/// One entry of the fixed buffer pool.
///
/// Field ownership:
/// - `key` is rewritten only while the slot is idle, under its new bucket's
///   lock and the pool lock.
/// - `refcnt` drops to zero only under the bucket lock and leaves zero only
///   under bucket and pool lock.
/// - `valid` and `data` belong to whoever holds the sleep lock, except that a
///   claim clears `valid` on an idle slot.
pub(crate) struct Slot<S> {
    key: AtomicU64,
    pub(crate) refcnt: AtomicU32,
    /// Tick of the last release that left the slot idle; `0` if never used.
    pub(crate) last_used: AtomicU64,
    pub(crate) valid: AtomicBool,
    pub(crate) data: SleepMutex<BlockData, S>,
}

impl<S: Scheduler> Slot<S> {
    pub(crate) const fn new() -> Self {
        Self {
            key: AtomicU64::new(0),
            refcnt: AtomicU32::new(0),
            last_used: AtomicU64::new(0),
            valid: AtomicBool::new(false),
            data: SleepMutex::new(BlockData::zeroed()),
        }
    }

    #[inline]
    pub(crate) fn key(&self) -> BlockKey {
        BlockKey::from_bits(self.key.load(Ordering::Relaxed))
    }

    #[inline]
    pub(crate) fn set_key(&self, key: BlockKey) {
        self.key.store(key.into_bits(), Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn is_idle(&self) -> bool {
        self.refcnt.load(Ordering::Acquire) == 0
    }

    #[inline]
    pub(crate) fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }
}
