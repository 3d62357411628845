use crate::{MemoryAddressOffset, MemoryPage, PageSize, PhysicalAddress};
use core::fmt;

/// Base of a physical page of size `S`.
///
/// ```rust
/// # use kernel_memory_addresses::*;
/// let pa = PhysicalAddress::new(0x8000_3000);
/// let page = PhysicalPage::<Size4K>::new_aligned(pa).unwrap();
/// assert_eq!(page.base(), pa);
/// assert_eq!(page.checked_step(1).unwrap().base().as_u64(), 0x8000_4000);
/// ```
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PhysicalPage<S: PageSize>(MemoryPage<S>);

impl<S: PageSize> PhysicalPage<S> {
    /// The page containing `pa`.
    #[inline]
    #[must_use]
    pub const fn from_addr(pa: PhysicalAddress) -> Self {
        Self(MemoryPage::from_addr(pa.0))
    }

    /// The page starting at `pa`, or `None` if `pa` is not aligned to `S`.
    #[inline]
    #[must_use]
    pub const fn new_aligned(pa: PhysicalAddress) -> Option<Self> {
        match MemoryPage::new_aligned(pa.0) {
            Some(p) => Some(Self(p)),
            None => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn from_page(p: MemoryPage<S>) -> Self {
        Self(p)
    }

    #[inline]
    #[must_use]
    pub const fn base(self) -> PhysicalAddress {
        PhysicalAddress(self.0.base())
    }

    #[inline]
    #[must_use]
    pub const fn join(self, off: MemoryAddressOffset<S>) -> PhysicalAddress {
        PhysicalAddress(self.0.join(off))
    }

    #[inline]
    #[must_use]
    pub const fn checked_step(self, n: u64) -> Option<Self> {
        match self.0.checked_step(n) {
            Some(p) => Some(Self(p)),
            None => None,
        }
    }
}

impl<S: PageSize> fmt::Display for PhysicalPage<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl<S: PageSize> fmt::Debug for PhysicalPage<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhysicalPage<{}>(0x{:016X})", S::as_str(), self.base().as_u64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Size4K;

    #[test]
    fn page_of_an_interior_address_rounds_down() {
        let pa = PhysicalAddress::new(0x8000_3abc);
        let (page, off) = pa.split::<Size4K>();
        assert_eq!(page, PhysicalPage::from_addr(pa));
        assert_eq!(page.base().as_u64(), 0x8000_3000);
        assert_eq!(page.join(off), pa);
        assert_eq!(PhysicalPage::<Size4K>::new_aligned(pa), None);
    }

    #[test]
    fn formatting() {
        let page = PhysicalAddress::new(0x1000).page::<Size4K>();
        assert_eq!(format!("{page}"), "0x0000000000001000/4K");
        assert_eq!(format!("{:?}", page.base()), "PA(0x0000000000001000)");
        assert_eq!(format!("{}", page.base()), "0x0000000000001000");
    }
}
