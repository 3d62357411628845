//! Allocatable pages and the managed memory range.

use crate::PageAllocError;
use core::fmt;
use kernel_memory_addresses::{PageSize, PhysicalAddress, PhysicalPage, Size4K};

/// One 4 KiB physical page.
///
/// Obtaining a `Page` from [`PageAllocator::allocate`](crate::PageAllocator::allocate)
/// transfers ownership of the memory to the caller until it is handed back
/// with [`free`](crate::PageAllocator::free). `Page` is not `Clone`;
/// handing it back consumes the caller's handle.
#[repr(transparent)]
#[derive(Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Page(PhysicalPage<Size4K>);

impl Page {
    /// The page starting at `base`.
    ///
    /// # Errors
    /// [`PageAllocError::Unaligned`] if `base` is not a page boundary.
    #[inline]
    pub const fn from_addr(base: PhysicalAddress) -> Result<Self, PageAllocError> {
        match PhysicalPage::new_aligned(base) {
            Some(page) => Ok(Self(page)),
            None => Err(PageAllocError::Unaligned(base)),
        }
    }

    #[inline]
    #[must_use]
    pub const fn from_page(page: PhysicalPage<Size4K>) -> Self {
        Self(page)
    }

    #[inline]
    #[must_use]
    pub const fn base(&self) -> PhysicalAddress {
        self.0.base()
    }

    #[inline]
    #[must_use]
    pub const fn as_physical_page(&self) -> PhysicalPage<Size4K> {
        self.0
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page({})", self.0)
    }
}

/// Bounds of the physical memory the allocator may hand out.
///
/// `kernel_end` is the first byte after the kernel image (a linker symbol);
/// `phys_top` is the first byte past usable RAM.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct MemoryLayout {
    kernel_end: PhysicalAddress,
    first_page: PhysicalPage<Size4K>,
    phys_top: PhysicalAddress,
}

impl MemoryLayout {
    /// # Errors
    /// - [`PageAllocError::UnalignedPhysTop`] if `phys_top` is not page aligned.
    /// - [`PageAllocError::EmptyLayout`] if no whole page fits between the bounds.
    /// - [`PageAllocError::TooManyPages`] if the range has more pages than a
    ///   link table can index.
    pub fn new(
        kernel_end: PhysicalAddress,
        phys_top: PhysicalAddress,
    ) -> Result<Self, PageAllocError> {
        if !phys_top.is_aligned::<Size4K>() {
            return Err(PageAllocError::UnalignedPhysTop(phys_top));
        }
        let first = kernel_end
            .align_up::<Size4K>()
            .filter(|&first| first < phys_top)
            .ok_or(PageAllocError::EmptyLayout)?;

        let pages = (phys_top.as_u64() - first.as_u64()) >> Size4K::SHIFT;
        if pages >= u64::from(u32::MAX) {
            return Err(PageAllocError::TooManyPages(pages));
        }

        Ok(Self {
            kernel_end,
            first_page: first.page(),
            phys_top,
        })
    }

    #[inline]
    #[must_use]
    pub const fn kernel_end(&self) -> PhysicalAddress {
        self.kernel_end
    }

    #[inline]
    #[must_use]
    pub const fn phys_top(&self) -> PhysicalAddress {
        self.phys_top
    }

    /// First page the allocator can manage.
    #[inline]
    #[must_use]
    pub const fn first_page(&self) -> PhysicalPage<Size4K> {
        self.first_page
    }

    /// Number of whole pages in `[first_page, phys_top)`. Fits a `u32`.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn page_count(&self) -> usize {
        ((self.phys_top.as_u64() - self.first_page.base().as_u64()) >> Size4K::SHIFT) as usize
    }

    /// Checks a page the way `free` must: above the kernel image, below the top.
    ///
    /// # Errors
    /// The violated bound.
    pub fn check(&self, page: &Page) -> Result<(), PageAllocError> {
        let pa = page.base();
        if pa < self.kernel_end {
            Err(PageAllocError::BelowKernel(pa))
        } else if pa >= self.phys_top {
            Err(PageAllocError::AbovePhysTop(pa))
        } else {
            Ok(())
        }
    }

    /// Link-table index of a page that passed [`check`](Self::check).
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) const fn index_of(&self, page: &Page) -> u32 {
        // below page_count, which `new` bounds by u32::MAX
        ((page.base().as_u64() - self.first_page.base().as_u64()) >> Size4K::SHIFT) as u32
    }

    #[inline]
    pub(crate) fn page_at(&self, index: u32) -> Page {
        let base = self.first_page.base() + (u64::from(index) << Size4K::SHIFT);
        Page(base.page())
    }
}
