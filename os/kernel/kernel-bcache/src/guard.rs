use crate::{BlockData, BlockKey, BufferCache, DiskDriver};
use core::marker::PhantomData;
use core::mem::ManuallyDrop;
use core::ops::{Deref, DerefMut};
use kernel_sync::{Clock, Cpu, MutexGuard, RawSleep, Scheduler};

/// A buffer locked for exclusive use, as returned by [`BufferCache::read`].
///
/// Dropping the guard releases the buffer: the reference is dropped under
/// the bucket lock first and the buffer's sleep lock is unlocked last. The
/// guard is not `Send`; the lock remembers the thread that took it.
pub struct BufGuard<'c, D, K, S, C, const N: usize>
where
    D: DiskDriver,
    K: Clock,
    S: Scheduler,
    C: Cpu,
{
    cache: &'c BufferCache<D, K, S, C, N>,
    index: usize,
    key: BlockKey,
    data: ManuallyDrop<MutexGuard<'c, BlockData, RawSleep<S>>>,
    _not_send: PhantomData<*const ()>,
}

impl<'c, D, K, S, C, const N: usize> BufGuard<'c, D, K, S, C, N>
where
    D: DiskDriver,
    K: Clock,
    S: Scheduler,
    C: Cpu,
{
    pub(crate) const fn new(
        cache: &'c BufferCache<D, K, S, C, N>,
        index: usize,
        key: BlockKey,
        data: MutexGuard<'c, BlockData, RawSleep<S>>,
    ) -> Self {
        Self {
            cache,
            index,
            key,
            data: ManuallyDrop::new(data),
            _not_send: PhantomData,
        }
    }

    #[inline]
    pub const fn key(&self) -> BlockKey {
        self.key
    }

    #[inline]
    pub const fn dev(&self) -> u32 {
        self.key.dev()
    }

    #[inline]
    pub const fn blockno(&self) -> u32 {
        self.key.blockno()
    }

    /// Index of the pool slot backing this buffer.
    #[inline]
    pub const fn index(&self) -> usize {
        self.index
    }

    pub(crate) const fn cache(&self) -> &'c BufferCache<D, K, S, C, N> {
        self.cache
    }
}

impl<D, K, S, C, const N: usize> Deref for BufGuard<'_, D, K, S, C, N>
where
    D: DiskDriver,
    K: Clock,
    S: Scheduler,
    C: Cpu,
{
    type Target = BlockData;

    fn deref(&self) -> &BlockData {
        &self.data
    }
}

impl<D, K, S, C, const N: usize> DerefMut for BufGuard<'_, D, K, S, C, N>
where
    D: DiskDriver,
    K: Clock,
    S: Scheduler,
    C: Cpu,
{
    fn deref_mut(&mut self) -> &mut BlockData {
        &mut self.data
    }
}

impl<D, K, S, C, const N: usize> Drop for BufGuard<'_, D, K, S, C, N>
where
    D: DiskDriver,
    K: Clock,
    S: Scheduler,
    C: Cpu,
{
    fn drop(&mut self) {
        self.cache.put(self.index, self.key);
        // SAFETY: dropped exactly once, here, after the reference is gone.
        unsafe { ManuallyDrop::drop(&mut self.data) }
    }
}

/// Extra reference on a buffer's slot that keeps it from being recycled.
///
/// Obtained from [`BufferCache::pin`] and handed back to [`BufferCache::unpin`].
#[must_use = "a pin that is never unpinned keeps its slot resident forever"]
#[derive(Debug, PartialEq, Eq)]
pub struct BufPin {
    index: usize,
    key: BlockKey,
}

impl BufPin {
    pub(crate) const fn new(index: usize, key: BlockKey) -> Self {
        Self { index, key }
    }

    #[inline]
    pub const fn key(&self) -> BlockKey {
        self.key
    }

    pub(crate) const fn into_parts(self) -> (usize, BlockKey) {
        (self.index, self.key)
    }
}
