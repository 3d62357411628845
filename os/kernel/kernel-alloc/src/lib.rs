//! # Kernel Physical Page Allocation
//!
//! Hands out and reclaims 4 KiB physical pages for every other kernel
//! subsystem (page tables, kernel stacks, pipe buffers, ...).
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │               PageAllocator                  │
//! │   allocate() / free()  on the calling core   │
//! ├───────────┬───────────┬───────────┬──────────┤
//! │  shard 0  │  shard 1  │    ...    │ shard N-1│  one SpinMutex each
//! └─────┬─────┴─────┬─────┴───────────┴────┬─────┘
//!       │           │                      │
//! ┌─────▼───────────▼──────────────────────▼─────┐
//! │          link table (PageLink per page)      │
//! └──────────────────────────────────────────────┘
//! ┌──────────────────────────────────────────────┐
//! │ PhysMapper: physical address → pointer       │  junk fill only
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Free pages are chained through an index table rather than through the
//! page memory itself, so the allocator only touches page contents to
//! poison them (feature `poison`, on by default). Addresses are typed with
//! [`kernel_memory_addresses`]; a [`Page`] is always page aligned.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use kernel_alloc::{HhdmPhysMapper, MemoryLayout, PageAllocator, PageLink, PhysicalAddress};
//! use kernel_info::memory::{MAX_PAGES, PHYS_TOP};
//! use kernel_sync::irq::IrqCpu;
//!
//! static LINKS: [PageLink; MAX_PAGES] = [const { PageLink::new() }; MAX_PAGES];
//! static MAPPER: HhdmPhysMapper = HhdmPhysMapper;
//!
//! # fn kernel_end() -> PhysicalAddress { PhysicalAddress::new(0x0040_0000) }
//! let layout = MemoryLayout::new(kernel_end(), PhysicalAddress::new(PHYS_TOP)).unwrap();
//! let pages: PageAllocator<'_, _, IrqCpu> = PageAllocator::new(layout, &MAPPER, &LINKS).unwrap();
//! pages.init(layout.kernel_end(), layout.phys_top());
//!
//! if let Some(page) = pages.allocate() {
//!     pages.free(page);
//! }
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

mod address;
mod error;
mod free_list;
mod page_alloc;
pub mod phys_mapper;

pub use address::{MemoryLayout, Page};
pub use error::PageAllocError;
pub use free_list::PageLink;
pub use kernel_memory_addresses::{PhysicalAddress, PhysicalPage, Size4K};
pub use page_alloc::{ALLOC_JUNK, AllocStats, FREE_JUNK, PageAllocator};
pub use phys_mapper::{HhdmPhysMapper, IdentityPhysMapper, PhysMapper};
