use crate::{MemoryAddress, MemoryAddressOffset, PageSize};
use core::fmt;
use core::marker::PhantomData;

/// Base address of a page of size `S`; the low `S::SHIFT` bits are always zero.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MemoryPage<S: PageSize> {
    value: u64,
    _phantom: PhantomData<S>,
}

impl<S: PageSize> MemoryPage<S> {
    /// The page containing `addr`.
    #[inline]
    #[must_use]
    pub const fn from_addr(addr: MemoryAddress) -> Self {
        Self {
            value: addr.align_down::<S>().as_u64(),
            _phantom: PhantomData,
        }
    }

    /// The page starting at `addr`, or `None` if `addr` is not a page boundary.
    #[inline]
    #[must_use]
    pub const fn new_aligned(addr: MemoryAddress) -> Option<Self> {
        if addr.is_aligned::<S>() {
            Some(Self::from_addr(addr))
        } else {
            None
        }
    }

    #[inline]
    #[must_use]
    pub const fn base(self) -> MemoryAddress {
        MemoryAddress::new(self.value)
    }

    #[inline]
    #[must_use]
    pub const fn join(self, off: MemoryAddressOffset<S>) -> MemoryAddress {
        MemoryAddress::new(self.value + off.as_u64())
    }

    /// The page `n` pages above this one, if it is addressable.
    #[inline]
    #[must_use]
    pub const fn checked_step(self, n: u64) -> Option<Self> {
        let Some(bytes) = n.checked_mul(S::SIZE) else {
            return None;
        };
        match self.value.checked_add(bytes) {
            Some(value) => Some(Self {
                value,
                _phantom: PhantomData,
            }),
            None => None,
        }
    }
}

impl<S: PageSize> fmt::Display for MemoryPage<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}/{}", self.value, S::as_str())
    }
}

impl<S: PageSize> fmt::Debug for MemoryPage<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemoryPage<{}>(0x{:016X})", S::as_str(), self.value)
    }
}

impl<S: PageSize> From<MemoryAddress> for MemoryPage<S> {
    #[inline]
    fn from(addr: MemoryAddress) -> Self {
        Self::from_addr(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Size4K;

    #[test]
    fn new_aligned_rejects_interior_addresses() {
        assert!(MemoryPage::<Size4K>::new_aligned(MemoryAddress::new(0x1001)).is_none());
        let p = MemoryPage::<Size4K>::new_aligned(MemoryAddress::new(0x5000)).unwrap();
        assert_eq!(p.base().as_u64(), 0x5000);
    }

    #[test]
    fn step_moves_whole_pages() {
        let p = MemoryPage::<Size4K>::from_addr(MemoryAddress::new(0x5fff));
        assert_eq!(p.checked_step(3).unwrap().base().as_u64(), 0x8000);
        assert!(p.checked_step(u64::MAX).is_none());
    }
}
