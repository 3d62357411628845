//! # Memory Layout

/// Size of one physical page in bytes.
pub const PAGE_SIZE: u64 = 4096;

/// `log2(PAGE_SIZE)`.
pub const PAGE_SHIFT: u32 = 12;

/// A simple Higher Half Direct Map (HHDM) base.
/// Anything you map at [`HHDM_BASE`] + `pa` lets the kernel
/// access physical memory via a fixed offset.
pub const HHDM_BASE: u64 = 0xffff_8880_0000_0000;

/// Where you place the bytes in *physical* memory (LMA) before paging.
pub const PHYS_LOAD: u64 = 0x0010_0000; // 1 MiB

/// Amount of RAM the kernel assumes to be present above [`PHYS_LOAD`].
pub const PHYS_RAM_BYTES: u64 = 128 * 1024 * 1024;

/// First physical address past usable RAM.
pub const PHYS_TOP: u64 = PHYS_LOAD + PHYS_RAM_BYTES;

/// Number of pages between [`PHYS_LOAD`] and [`PHYS_TOP`].
///
/// Upper bound for the page allocator's link table.
pub const MAX_PAGES: usize = (PHYS_RAM_BYTES / PAGE_SIZE) as usize;

/// Maximum number of processors; the page allocator keeps one shard per core.
pub const MAX_CPUS: usize = 8;

const _: () = {
    assert!(PAGE_SIZE == 1 << PAGE_SHIFT);
    assert!(PHYS_LOAD.is_multiple_of(PAGE_SIZE));
    assert!(PHYS_TOP.is_multiple_of(PAGE_SIZE));
    assert!(MAX_PAGES < u32::MAX as usize);
    assert!(MAX_CPUS > 0);
};
