//! # Sharded physical page allocator
//!
//! Every core owns a [`FreeList`] behind its own spin lock. `allocate` and
//! `free` only ever touch the calling core's shard, so in the common case
//! cores never contend. A core that runs dry steals the trailing half of the
//! first peer shard holding at least two pages.
//!
//! ```text
//!   core 0           core 1           core 2
//! ┌────────┐       ┌────────┐       ┌────────┐
//! │ shard0 │       │ shard1 │◄──────│ shard2 │  steal: cut len/2 pages
//! │ a→b→c  │       │ (empty)│       │ d→e→f→g│  off the back of shard2
//! └────────┘       └────────┘       └────────┘
//! ```
//!
//! The steal path never holds two shard locks at once: the peer is split and
//! unlocked before the caller's own shard is locked to receive the chain.

use crate::address::{MemoryLayout, Page};
use crate::free_list::{FreeList, Links, PageLink};
use crate::{PageAllocError, PhysMapper};
use core::marker::PhantomData;
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use kernel_info::memory::{MAX_CPUS, PAGE_SIZE};
use kernel_memory_addresses::{PageSize, PhysicalAddress, PhysicalPage, Size4K};
use kernel_sync::{Cpu, SpinMutex};

const _: () = assert!(Size4K::SIZE == PAGE_SIZE);

/// Byte written over a page when it is handed out.
pub const ALLOC_JUNK: u8 = 0x05;

/// Byte written over a page when it is returned.
pub const FREE_JUNK: u8 = 0x01;

/// Counters describing the steal path; see [`PageAllocator::stats`].
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct AllocStats {
    /// Allocations that found their own shard empty.
    pub steal_attempts: u64,
    /// Steal attempts that moved a chain from a peer.
    pub steals: u64,
    /// Pages moved between shards in total.
    pub stolen_pages: u64,
    /// Allocations that returned `None`.
    pub exhausted: u64,
}

#[derive(Default)]
struct Counters {
    steal_attempts: AtomicU64,
    steals: AtomicU64,
    stolen_pages: AtomicU64,
    exhausted: AtomicU64,
}

/// Physical page allocator with one free list per core.
///
/// * `M` maps pages into the current address space for junk filling.
/// * `C` identifies (and pins) the calling core.
/// * `NCPU` is the number of shards; [`Cpu::id`] must stay below it.
pub struct PageAllocator<'m, M, C, const NCPU: usize = MAX_CPUS> {
    layout: MemoryLayout,
    mapper: &'m M,
    links: Links<'m>,
    shards: [SpinMutex<FreeList>; NCPU],
    initialized: AtomicBool,
    counters: Counters,
    _cpu: PhantomData<fn() -> C>,
}

impl<'m, M, C, const NCPU: usize> PageAllocator<'m, M, C, NCPU>
where
    M: PhysMapper,
    C: Cpu,
{
    /// Creates an allocator with all shards empty; call [`init`](Self::init) next.
    ///
    /// # Errors
    /// [`PageAllocError::LinkTableTooSmall`] if `links` has fewer entries than
    /// the layout has pages.
    pub fn new(
        layout: MemoryLayout,
        mapper: &'m M,
        links: &'m [PageLink],
    ) -> Result<Self, PageAllocError> {
        const { assert!(NCPU > 0) };

        let needed = layout.page_count();
        if links.len() < needed {
            return Err(PageAllocError::LinkTableTooSmall {
                needed,
                got: links.len(),
            });
        }

        Ok(Self {
            layout,
            mapper,
            links: Links::new(links),
            shards: core::array::from_fn(|_| SpinMutex::new(FreeList::new())),
            initialized: AtomicBool::new(false),
            counters: Counters::default(),
            _cpu: PhantomData,
        })
    }

    #[must_use]
    pub const fn layout(&self) -> &MemoryLayout {
        &self.layout
    }

    #[must_use]
    pub const fn mapper(&self) -> &M {
        self.mapper
    }

    /// Hands every whole page in `[start, end)` to the allocator.
    ///
    /// `start` is rounded up to a page boundary. Pages land on the shard of
    /// the calling core; other cores obtain theirs by stealing.
    ///
    /// # Panics
    /// On a second call, or if the range contains a page outside the layout.
    pub fn init(&self, start: PhysicalAddress, end: PhysicalAddress) {
        if self.initialized.swap(true, Ordering::AcqRel) {
            panic!("{}", PageAllocError::AlreadyInitialized);
        }

        let whole = |p: &PhysicalPage<Size4K>| p.checked_step(1).is_some_and(|n| n.base() <= end);
        let mut next = start.align_up::<Size4K>().map(PhysicalAddress::page::<Size4K>);
        let mut pages = 0u64;
        while let Some(page) = next.filter(whole) {
            self.free(Page::from_page(page));
            next = page.checked_step(1);
            pages += 1;
        }

        log::info!(
            "page allocator: {pages} pages ({} KiB) in [{start}, {end}), {NCPU} shards",
            pages * PAGE_SIZE / 1024
        );
    }

    /// Takes one page, stealing from a peer shard if the local one is empty.
    ///
    /// Returns `None` if neither the local shard nor any peer could supply a
    /// page. Never blocks beyond spinning on shard locks.
    pub fn allocate(&self) -> Option<Page> {
        let pin = C::pin();
        let cpu = C::id(&pin);

        let local = self.shards[cpu].lock().pop(self.links);
        let Some(index) = local.or_else(|| self.steal(cpu)) else {
            self.counters.exhausted.fetch_add(1, Ordering::Relaxed);
            log::debug!("page allocator: out of pages on cpu {cpu}");
            return None;
        };
        drop(pin);

        let page = self.layout.page_at(index);
        self.fill(&page, ALLOC_JUNK);
        Some(page)
    }

    /// Refills the empty shard `cpu` from the first peer with at least two pages.
    ///
    /// Must be called without holding any shard lock.
    fn steal(&self, cpu: usize) -> Option<u32> {
        self.counters.steal_attempts.fetch_add(1, Ordering::Relaxed);

        let (victim, chain) = self
            .shards
            .iter()
            .enumerate()
            .filter(|&(peer, _)| peer != cpu)
            .find_map(|(peer, shard)| {
                let chain = shard.lock().split_off_back_half(self.links)?;
                Some((peer, chain))
            })?;

        self.counters.steals.fetch_add(1, Ordering::Relaxed);
        self.counters
            .stolen_pages
            .fetch_add(chain.len as u64, Ordering::Relaxed);
        log::debug!(
            "page allocator: cpu {cpu} stole {} pages from cpu {victim}",
            chain.len
        );

        let mut own = self.shards[cpu].lock();
        own.prepend(self.links, chain);
        own.pop(self.links)
    }

    /// Returns a page to the calling core's shard.
    ///
    /// # Panics
    /// If the page lies inside the kernel image or beyond the top of physical
    /// memory. Use [`try_free`](Self::try_free) to get the error instead.
    pub fn free(&self, page: Page) {
        if let Err(e) = self.try_free(page) {
            panic!("free: {e}");
        }
    }

    /// Returns a page to the calling core's shard.
    ///
    /// # Errors
    /// The violated address bound; the page is not linked in that case.
    pub fn try_free(&self, page: Page) -> Result<(), PageAllocError> {
        self.layout.check(&page)?;
        self.fill(&page, FREE_JUNK);

        let index = self.layout.index_of(&page);
        let pin = C::pin();
        self.shards[C::id(&pin)].lock().push(self.links, index);
        Ok(())
    }

    /// Free pages across all shards. Only exact while no other core allocates or frees.
    #[must_use]
    pub fn free_pages(&self) -> usize {
        self.shards
            .iter()
            .map(|s| s.lock_pinned::<C>().len())
            .sum()
    }

    /// Free pages in one core's shard.
    ///
    /// # Panics
    /// If `cpu >= NCPU`.
    #[must_use]
    pub fn shard_free_pages(&self, cpu: usize) -> usize {
        self.shards[cpu].lock_pinned::<C>().len()
    }

    #[must_use]
    pub fn stats(&self) -> AllocStats {
        let c = &self.counters;
        AllocStats {
            steal_attempts: c.steal_attempts.load(Ordering::Relaxed),
            steals: c.steals.load(Ordering::Relaxed),
            stolen_pages: c.stolen_pages.load(Ordering::Relaxed),
            exhausted: c.exhausted.load(Ordering::Relaxed),
        }
    }

    #[cfg(feature = "poison")]
    fn fill(&self, page: &Page, byte: u8) {
        #[allow(clippy::cast_possible_truncation)]
        const PAGE_BYTES: usize = PAGE_SIZE as usize;

        // SAFETY: the page passed the layout check and is owned by this call
        // (being freed or just popped), so nobody else references it.
        let bytes: &mut [u8; PAGE_BYTES] = unsafe { self.mapper.phys_to_mut(page.base()) };
        bytes.fill(byte);
    }

    #[cfg(not(feature = "poison"))]
    #[allow(clippy::unused_self)]
    const fn fill(&self, _page: &Page, _byte: u8) {}
}
