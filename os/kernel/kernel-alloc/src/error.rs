use kernel_memory_addresses::PhysicalAddress;

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageAllocError {
    #[error("page address {0} is not page aligned")]
    Unaligned(PhysicalAddress),
    #[error("page address {0} lies inside the kernel image")]
    BelowKernel(PhysicalAddress),
    #[error("page address {0} lies beyond the top of physical memory")]
    AbovePhysTop(PhysicalAddress),
    #[error("top of physical memory {0} is not page aligned")]
    UnalignedPhysTop(PhysicalAddress),
    #[error("no whole page between the kernel image and the top of physical memory")]
    EmptyLayout,
    #[error("layout spans {0} pages, more than a link table can index")]
    TooManyPages(u64),
    #[error("link table holds {got} entries but the layout spans {needed} pages")]
    LinkTableTooSmall { needed: usize, got: usize },
    #[error("page allocator initialized twice")]
    AlreadyInitialized,
}
