//! # Physical Memory Address Types
//!
//! Strongly typed wrappers for physical addresses and page bases, shared by
//! the page allocator and anything that maps its pages.
//!
//! | Type | Generic | Description |
//! |------|---------|-------------|
//! | [`MemoryAddress`] | – | A raw 64-bit address. |
//! | [`MemoryPage<S>`] | [`S: PageSize`](PageSize) | A base address aligned to a page of size `S`. |
//! | [`MemoryAddressOffset<S>`] | [`S: PageSize`](PageSize) | An offset within a page of size `S`. |
//! | [`PhysicalAddress`] / [`PhysicalPage<S>`] | | Physical RAM, as seen before any mapping. |
//!
//! The page size is a type parameter rather than a constant, so a page base
//! can only be produced by an explicit conversion that either rounds down
//! ([`PhysicalAddress::page`]) or checks alignment ([`PhysicalPage::new_aligned`]).
//!
//! ```rust
//! # use kernel_memory_addresses::*;
//! let pa = PhysicalAddress::new(0x8002_1234);
//! let (page, off) = pa.split::<Size4K>();
//! assert_eq!(page.base().as_u64(), 0x8002_1000);
//! assert_eq!(page.join(off), pa);
//!
//! assert!(PhysicalPage::<Size4K>::new_aligned(pa).is_none());
//! assert_eq!(pa.align_up::<Size4K>(), Some(PhysicalAddress::new(0x8002_2000)));
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod memory_address;
mod memory_page;
mod page_size;
mod physical_address;
mod physical_page;

pub use memory_address::{MemoryAddress, MemoryAddressOffset};
pub use memory_page::MemoryPage;
pub use page_size::{PageSize, Size4K};
pub use physical_address::PhysicalAddress;
pub use physical_page::PhysicalPage;
