use kernel_alloc::{
    IdentityPhysMapper, MemoryLayout, Page, PageAllocError, PageAllocator, PageLink,
    PhysicalAddress,
};
use kernel_info::memory::PAGE_SIZE;
use kernel_sync::host::HostCpu;
use std::alloc::Layout;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Barrier;
use std::thread;

const PAGE: usize = PAGE_SIZE as usize;

type Alloc<'m> = PageAllocator<'m, IdentityPhysMapper, HostCpu, 4>;

static MAPPER: IdentityPhysMapper = IdentityPhysMapper;

/// Page-aligned heap block standing in for physical memory.
struct Arena {
    base: *mut u8,
    layout: Layout,
    links: Vec<PageLink>,
}

impl Arena {
    fn new(pages: usize) -> Self {
        let layout = Layout::from_size_align(pages * PAGE, PAGE).unwrap();
        let base = unsafe { std::alloc::alloc_zeroed(layout) };
        assert!(!base.is_null());
        Self {
            base,
            layout,
            links: (0..pages).map(|_| PageLink::new()).collect(),
        }
    }

    fn start(&self) -> PhysicalAddress {
        PhysicalAddress::from_ptr(self.base)
    }

    fn end(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.start().as_u64() + self.layout.size() as u64)
    }

    fn allocator(&self) -> Alloc<'_> {
        let layout = MemoryLayout::new(self.start(), self.end()).unwrap();
        PageAllocator::new(layout, &MAPPER, &self.links).unwrap()
    }

    fn index_of(&self, page: &Page) -> usize {
        ((page.base().as_u64() - self.start().as_u64()) / PAGE_SIZE) as usize
    }
}

// The arena is only written through pages handed out by the allocator.
unsafe impl Sync for Arena {}

impl Drop for Arena {
    fn drop(&mut self) {
        unsafe { std::alloc::dealloc(self.base, self.layout) }
    }
}

fn page_at(base: PhysicalAddress) -> Page {
    Page::from_addr(base).unwrap()
}

fn bytes(page: &Page) -> &'static mut [u8] {
    unsafe { std::slice::from_raw_parts_mut(page.base().as_u64() as *mut u8, PAGE) }
}

#[test]
fn init_frees_every_whole_page() {
    HostCpu::bind(0);
    let arena = Arena::new(16);
    let pages = arena.allocator();
    pages.init(arena.start(), arena.end());

    assert_eq!(pages.free_pages(), 16);
    assert_eq!(pages.shard_free_pages(0), 16);
    assert_eq!(pages.shard_free_pages(1), 0);
}

#[test]
fn init_ignores_partial_pages_at_both_ends() {
    HostCpu::bind(0);
    let arena = Arena::new(16);
    let pages = arena.allocator();
    let start = PhysicalAddress::new(arena.start().as_u64() + 1);
    let end = PhysicalAddress::new(arena.end().as_u64() - 1);
    pages.init(start, end);

    assert_eq!(pages.free_pages(), 14);
}

#[test]
#[should_panic(expected = "initialized twice")]
fn second_init_is_fatal() {
    let arena = Arena::new(4);
    let pages = arena.allocator();
    pages.init(arena.start(), arena.end());
    pages.init(arena.start(), arena.end());
}

#[test]
fn link_table_must_cover_layout() {
    let arena = Arena::new(4);
    let layout = MemoryLayout::new(arena.start(), arena.end()).unwrap();
    let short: Vec<PageLink> = (0..3).map(|_| PageLink::new()).collect();
    let result = Alloc::new(layout, &MAPPER, &short);
    assert!(matches!(
        result,
        Err(PageAllocError::LinkTableTooSmall { needed: 4, got: 3 })
    ));
}

#[test]
fn allocation_conserves_pages() {
    HostCpu::bind(0);
    let arena = Arena::new(16);
    let pages = arena.allocator();
    pages.init(arena.start(), arena.end());

    let mut held = Vec::new();
    while let Some(p) = pages.allocate() {
        held.push(p);
    }
    assert_eq!(held.len(), 16);
    assert_eq!(pages.free_pages(), 0);
    assert_eq!(pages.stats().exhausted, 1);

    let mut seen: Vec<usize> = held.iter().map(|p| arena.index_of(p)).collect();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), 16, "a page was handed out twice");

    for p in held.drain(..8) {
        pages.free(p);
    }
    assert_eq!(pages.free_pages() + held.len(), 16);

    for p in held {
        pages.free(p);
    }
    assert_eq!(pages.free_pages(), 16);
}

#[test]
fn empty_shard_steals_half_of_a_peer() {
    HostCpu::bind(0);
    let arena = Arena::new(4);
    let pages = arena.allocator();
    pages.init(arena.start(), arena.end());
    assert_eq!(pages.shard_free_pages(0), 4);

    let got = thread::scope(|s| {
        s.spawn(|| {
            HostCpu::bind(1);
            pages.allocate()
        })
        .join()
        .unwrap()
    });

    assert!(got.is_some());
    assert_eq!(pages.shard_free_pages(0), 2);
    assert_eq!(pages.shard_free_pages(1), 1);

    let stats = pages.stats();
    assert_eq!(stats.steal_attempts, 1);
    assert_eq!(stats.steals, 1);
    assert_eq!(stats.stolen_pages, 2);
}

#[test]
fn single_page_peer_cannot_be_robbed() {
    HostCpu::bind(0);
    let arena = Arena::new(2);
    let pages = arena.allocator();
    pages.init(arena.start(), arena.end());

    let (first, second) = thread::scope(|s| {
        let first = s
            .spawn(|| {
                HostCpu::bind(1);
                pages.allocate()
            })
            .join()
            .unwrap();
        let second = s
            .spawn(|| {
                HostCpu::bind(2);
                pages.allocate()
            })
            .join()
            .unwrap();
        (first, second)
    });

    // core 1 took one of core 0's two pages; core 0 is left with a single one
    assert!(first.is_some());
    assert!(second.is_none());
    assert_eq!(pages.shard_free_pages(0), 1);
    assert_eq!(pages.stats().exhausted, 1);

    pages.free(first.unwrap());
    assert_eq!(pages.free_pages(), 2);
}

#[test]
fn rejects_bad_addresses() {
    HostCpu::bind(0);
    let arena = Arena::new(4);
    let pages = arena.allocator();
    pages.init(arena.start(), arena.end());

    let unaligned = PhysicalAddress::new(arena.start().as_u64() + 8);
    let below = PhysicalAddress::new(arena.start().as_u64() - PAGE_SIZE);

    assert_eq!(
        Page::from_addr(unaligned),
        Err(PageAllocError::Unaligned(unaligned))
    );
    assert_eq!(
        pages.try_free(page_at(below)),
        Err(PageAllocError::BelowKernel(below))
    );
    assert_eq!(
        pages.try_free(page_at(arena.end())),
        Err(PageAllocError::AbovePhysTop(arena.end()))
    );
    assert_eq!(pages.free_pages(), 4);
}

#[test]
#[should_panic(expected = "inside the kernel image")]
fn freeing_a_kernel_page_is_fatal() {
    HostCpu::bind(0);
    let arena = Arena::new(2);
    let pages = arena.allocator();
    pages.free(page_at(PhysicalAddress::new(arena.start().as_u64() - PAGE_SIZE)));
}

#[cfg(feature = "poison")]
#[test]
fn pages_are_poisoned_on_both_transitions() {
    use kernel_alloc::{ALLOC_JUNK, FREE_JUNK};

    HostCpu::bind(0);
    let arena = Arena::new(2);
    let pages = arena.allocator();
    pages.init(arena.start(), arena.end());

    let page = pages.allocate().unwrap();
    let base = page.base();
    assert!(bytes(&page).iter().all(|&b| b == ALLOC_JUNK));

    bytes(&page).fill(0xAA);
    pages.free(page);

    let view = page_at(base);
    assert!(bytes(&view).iter().all(|&b| b == FREE_JUNK));
}

#[test]
fn concurrent_allocations_never_alias() {
    const CPUS: usize = 4;
    const PAGES: usize = 64;
    const ROUNDS: usize = 2_000;

    HostCpu::bind(0);
    let arena = Arena::new(PAGES);
    let pages = arena.allocator();
    pages.init(arena.start(), arena.end());

    let claimed: Vec<AtomicBool> = (0..PAGES).map(|_| AtomicBool::new(false)).collect();
    let start = Barrier::new(CPUS);

    thread::scope(|s| {
        for cpu in 0..CPUS {
            let (pages, arena, claimed, start) = (&pages, &arena, &claimed, &start);
            s.spawn(move || {
                HostCpu::bind(cpu);
                let tag = cpu as u8 + 1;
                let mut held: Vec<Page> = Vec::new();
                start.wait();

                for round in 0..ROUNDS {
                    if let Some(page) = pages.allocate() {
                        let idx = arena.index_of(&page);
                        assert!(
                            claimed[idx]
                                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                                .is_ok(),
                            "page {idx} handed out twice"
                        );
                        bytes(&page).fill(tag);
                        held.push(page);
                    }

                    if held.len() > 8 || (round % 3 == 0 && !held.is_empty()) {
                        let page = held.swap_remove(round % held.len());
                        assert!(bytes(&page).iter().all(|&b| b == tag), "page scribbled on");
                        claimed[arena.index_of(&page)].store(false, Ordering::Release);
                        pages.free(page);
                    }
                }

                for page in held {
                    claimed[arena.index_of(&page)].store(false, Ordering::Release);
                    pages.free(page);
                }
            });
        }
    });

    assert_eq!(pages.free_pages(), PAGES);
    assert!(claimed.iter().all(|c| !c.load(Ordering::Relaxed)));
}
