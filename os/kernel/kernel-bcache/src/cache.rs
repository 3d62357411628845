//! # Buffer cache
//!
//! ```text
//!            read(dev, blockno)
//!                   │
//!        ┌──────────▼──────────┐   hit: refcnt += 1
//!        │ bucket[blockno % 13]│─────────────────────────┐
//!        │   SpinMutex + list  │                         │
//!        └──────────┬──────────┘                         │
//!                   │ miss (bucket lock still held)      │
//!        ┌──────────▼──────────┐                         │
//!        │   pool TicketMutex  │ revive idle copy, or    │
//!        │                     │ recycle the LRU slot    │
//!        └──────────┬──────────┘                         │
//!                   │ drop both spin locks               │
//!        ┌──────────▼──────────┐◄────────────────────────┘
//!        │ slot SleepMutex     │ read from disk if invalid
//!        └─────────────────────┘
//! ```
//!
//! Lock order is bucket, then pool. Both spin locks are taken with the
//! caller pinned to its core ([`Cpu::pin`]), so a holder is never preempted
//! or interrupted while other cores spin on it. A slot's sleep lock is only
//! taken after both spin locks are released. Every slot with a non-zero reference count
//! is linked in exactly the bucket its key hashes to; idle slots are linked
//! nowhere, so recycling never has to reach into a foreign bucket.

use crate::bucket::Membership;
use crate::guard::{BufGuard, BufPin};
use crate::slot::Slot;
use crate::stats::{Counters, Event};
use crate::{BlockKey, CacheError, CacheStats, DiskDriver};
use core::marker::PhantomData;
use core::sync::atomic::Ordering;
use kernel_info::block::{BUCKETS, BUFFER_SLOTS};
use kernel_sync::{Clock, Cpu, Scheduler, SpinMutex, TicketMutex};

/// Fixed pool of `N` block buffers shared by all threads.
///
/// * `D` performs the actual disk transfers.
/// * `K` stamps released slots for least-recently-used recycling.
/// * `S` lets a thread waiting for a busy buffer give up the processor.
/// * `C` pins the caller while it holds a bucket or the pool lock.
pub struct BufferCache<D, K, S, C, const N: usize = BUFFER_SLOTS> {
    disk: D,
    clock: K,
    buckets: [SpinMutex<Membership<N>>; BUCKETS],
    /// Serializes slot claims across buckets.
    pool: TicketMutex<()>,
    slots: [Slot<S>; N],
    counters: Counters,
    _cpu: PhantomData<fn() -> C>,
}

impl<D, K, S, C, const N: usize> BufferCache<D, K, S, C, N>
where
    D: DiskDriver,
    K: Clock,
    S: Scheduler,
    C: Cpu,
{
    /// Creates a cache with every slot idle and invalid.
    pub fn new(disk: D, clock: K) -> Self {
        const { assert!(N > 0) };
        Self {
            disk,
            clock,
            buckets: core::array::from_fn(|_| SpinMutex::new(Membership::new())),
            pool: TicketMutex::new(()),
            slots: core::array::from_fn(|_| Slot::new()),
            counters: Counters::new(),
            _cpu: PhantomData,
        }
    }

    #[must_use]
    pub const fn disk(&self) -> &D {
        &self.disk
    }

    #[must_use]
    pub const fn clock(&self) -> &K {
        &self.clock
    }

    #[must_use]
    pub const fn slot_count(&self) -> usize {
        N
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }

    /// Returns the buffer for `(dev, blockno)`, locked for exclusive use and
    /// holding the block's current contents.
    ///
    /// Blocks while another thread holds the same buffer, and for the disk
    /// read if the block is not cached.
    ///
    /// # Panics
    /// If every slot is referenced and the block is not cached.
    pub fn read(&self, dev: u32, blockno: u32) -> BufGuard<'_, D, K, S, C, N> {
        let key = BlockKey::of(dev, blockno);
        let index = self.get(key);
        let slot = &self.slots[index];

        let mut data = slot.data.lock();
        if !slot.is_valid() {
            log::trace!("bcache: disk read {key} into slot {index}");
            self.disk.read_block(key, &mut data);
            slot.valid.store(true, Ordering::Release);
            self.counters.count(Event::Miss);
        }

        BufGuard::new(self, index, key, data)
    }

    /// Writes the buffer's contents to disk. The buffer stays locked.
    ///
    /// # Panics
    /// If the calling thread does not hold the buffer's lock.
    pub fn write(&self, buf: &BufGuard<'_, D, K, S, C, N>) {
        self.assert_own(buf);
        log::trace!("bcache: disk write {} from slot {}", buf.key(), buf.index());
        self.disk.write_block(buf.key(), buf);
        self.counters.count(Event::Write);
    }

    /// Unlocks the buffer and drops the caller's reference. Same as dropping the guard.
    ///
    /// # Panics
    /// If the calling thread does not hold the buffer's lock.
    pub fn release(&self, buf: BufGuard<'_, D, K, S, C, N>) {
        self.assert_own(&buf);
        drop(buf);
    }

    /// Keeps the buffer's slot from being recycled until [`unpin`](Self::unpin).
    ///
    /// Does not keep the buffer locked. A pin that is dropped instead of
    /// unpinned keeps the slot resident forever.
    ///
    /// # Panics
    /// If the calling thread does not hold the buffer's lock.
    pub fn pin(&self, buf: &BufGuard<'_, D, K, S, C, N>) -> BufPin {
        self.assert_own(buf);
        let index = buf.index();
        let _pool = self.pool.lock_pinned::<C>();
        self.slots[index].refcnt.fetch_add(1, Ordering::Relaxed);
        BufPin::new(index, buf.key())
    }

    /// Drops a reference taken by [`pin`](Self::pin).
    pub fn unpin(&self, pin: BufPin) {
        let (index, key) = pin.into_parts();
        let mut bucket = self.buckets[key.bucket()].lock_pinned::<C>();
        let _pool = self.pool.lock_pinned::<C>();
        debug_assert_eq!(self.slots[index].key(), key, "pin outlived its slot");
        self.unref(index, &mut bucket);
    }

    /// Whether bucket lists and reference counts agree.
    ///
    /// Only meaningful while no other thread uses the cache.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let mut linked = 0;
        for (b, bucket) in self.buckets.iter().enumerate() {
            let bucket = bucket.lock_pinned::<C>();
            if !bucket.is_well_formed() {
                log::debug!("bcache: bucket {b} list is corrupt");
                return false;
            }
            for index in bucket.iter() {
                let slot = &self.slots[index];
                if slot.key().bucket() != b || slot.is_idle() {
                    log::debug!("bcache: slot {index} misplaced in bucket {b}");
                    return false;
                }
            }
            linked += bucket.len();
        }

        let referenced = self.slots.iter().filter(|s| !s.is_idle()).count();
        if referenced != linked {
            return false;
        }

        // at most one resident or valid slot per block
        let holds_block = |s: &Slot<S>| !s.is_idle() || s.is_valid();
        self.slots.iter().enumerate().all(|(i, a)| {
            !holds_block(a)
                || self.slots[i + 1..]
                    .iter()
                    .all(|b| !holds_block(b) || a.key() != b.key())
        })
    }

    /// Finds or claims the slot for `key` and takes a reference on it.
    fn get(&self, key: BlockKey) -> usize {
        let mut bucket = self.buckets[key.bucket()].lock_pinned::<C>();

        let cached = bucket.iter().find(|&i| self.slots[i].key() == key);
        if let Some(index) = cached {
            self.slots[index].refcnt.fetch_add(1, Ordering::Relaxed);
            self.counters.count(Event::Hit);
            log::trace!("bcache: hit {key} in slot {index}");
            return index;
        }

        let _pool = self.pool.lock_pinned::<C>();
        let index = if let Some(index) = self.idle_copy_of(key) {
            self.counters.count(Event::Revival);
            log::trace!("bcache: revived {key} in slot {index}");
            index
        } else {
            let Some(index) = self.least_recently_used() else {
                panic!("{}", CacheError::Exhausted { slots: N });
            };
            let slot = &self.slots[index];
            log::trace!("bcache: slot {index} recycled from {} to {key}", slot.key());
            slot.set_key(key);
            slot.valid.store(false, Ordering::Relaxed);
            self.counters.count(Event::Recycle);
            index
        };

        self.slots[index].refcnt.store(1, Ordering::Relaxed);
        bucket.push_front(index);
        index
    }

    /// An idle slot still holding valid contents of `key`. Requires the pool lock.
    fn idle_copy_of(&self, key: BlockKey) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.is_idle() && s.is_valid() && s.key() == key)
    }

    /// The idle slot released longest ago, lowest index on ties. Requires the pool lock.
    fn least_recently_used(&self) -> Option<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_idle())
            .min_by_key(|&(i, s)| (s.last_used.load(Ordering::Relaxed), i))
            .map(|(i, _)| i)
    }

    /// Drops one reference under the slot's bucket lock. The last one unlinks
    /// the slot and stamps it.
    fn unref(&self, index: usize, bucket: &mut Membership<N>) {
        let slot = &self.slots[index];
        let mut current = slot.refcnt.load(Ordering::Relaxed);
        loop {
            if current == 0 {
                panic!("{}", CacheError::Underflow(slot.key()));
            }
            if current == 1 {
                // no one else can take a reference while this one is the last
                bucket.remove(index);
                slot.last_used.store(self.clock.now(), Ordering::Relaxed);
                slot.refcnt.store(0, Ordering::Release);
                return;
            }
            match slot.refcnt.compare_exchange_weak(
                current,
                current - 1,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    /// Releases the reference held by a guard. Called from its `Drop`.
    pub(crate) fn put(&self, index: usize, key: BlockKey) {
        let mut bucket = self.buckets[key.bucket()].lock_pinned::<C>();
        self.unref(index, &mut bucket);
    }

    fn assert_own(&self, buf: &BufGuard<'_, D, K, S, C, N>) {
        let owned = core::ptr::eq(buf.cache(), self)
            && self.slots[buf.index()].data.is_held_by_current();
        if !owned {
            panic!("{}", CacheError::NotHeld(buf.key()));
        }
    }
}
