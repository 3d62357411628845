use crate::{MemoryPage, PageSize};
use core::fmt;
use core::marker::PhantomData;
use core::ops::Add;

/// Raw 64-bit memory address.
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MemoryAddress(u64);

impl MemoryAddress {
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[inline]
    #[must_use]
    pub const fn from_ptr<T>(ptr: *const T) -> Self {
        const _: () = assert!(
            size_of::<*const ()>() == size_of::<u64>(),
            "pointer size mismatch"
        );

        // a union converts the pointer in const context
        union Ptr<T> {
            ptr: *const T,
            raw: u64,
        }

        let ptr = Ptr { ptr };
        Self::new(unsafe { ptr.raw })
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn is_aligned<S: PageSize>(self) -> bool {
        self.0 & (S::SIZE - 1) == 0
    }

    #[inline]
    #[must_use]
    pub const fn align_down<S: PageSize>(self) -> Self {
        Self(self.0 & !(S::SIZE - 1))
    }

    /// Next `S` boundary at or above this address; `None` if it does not fit in 64 bits.
    #[inline]
    #[must_use]
    pub const fn align_up<S: PageSize>(self) -> Option<Self> {
        match self.0.checked_add(S::SIZE - 1) {
            Some(v) => Some(Self(v & !(S::SIZE - 1))),
            None => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn checked_add(self, rhs: u64) -> Option<Self> {
        match self.0.checked_add(rhs) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn page<S: PageSize>(self) -> MemoryPage<S> {
        MemoryPage::from_addr(self)
    }

    #[inline]
    #[must_use]
    pub const fn offset<S: PageSize>(self) -> MemoryAddressOffset<S> {
        MemoryAddressOffset::from_addr(self)
    }

    #[inline]
    #[must_use]
    pub const fn split<S: PageSize>(self) -> (MemoryPage<S>, MemoryAddressOffset<S>) {
        (self.page::<S>(), self.offset::<S>())
    }
}

impl fmt::Debug for MemoryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemoryAddress(0x{:016X})", self.0)
    }
}

impl fmt::Display for MemoryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

impl From<u64> for MemoryAddress {
    #[inline]
    fn from(v: u64) -> Self {
        Self::new(v)
    }
}

impl Add<u64> for MemoryAddress {
    type Output = Self;

    #[inline]
    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0 + rhs)
    }
}

/// Offset of an address within its page of size `S`; always `< S::SIZE`.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MemoryAddressOffset<S: PageSize> {
    value: u64,
    _phantom: PhantomData<S>,
}

impl<S: PageSize> MemoryAddressOffset<S> {
    #[inline]
    #[must_use]
    pub const fn from_addr(addr: MemoryAddress) -> Self {
        Self {
            value: addr.as_u64() & (S::SIZE - 1),
            _phantom: PhantomData,
        }
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.value
    }
}

impl<S: PageSize> fmt::Debug for MemoryAddressOffset<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Offset<{}>({:#X})", S::as_str(), self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Size4K;

    #[test]
    fn alignment_helpers() {
        let a = MemoryAddress::new(0x1234);
        assert!(!a.is_aligned::<Size4K>());
        assert_eq!(a.align_down::<Size4K>().as_u64(), 0x1000);
        assert_eq!(a.align_up::<Size4K>(), Some(MemoryAddress::new(0x2000)));

        let b = MemoryAddress::new(0x3000);
        assert!(b.is_aligned::<Size4K>());
        assert_eq!(b.align_up::<Size4K>(), Some(b));
        assert_eq!(b.align_down::<Size4K>(), b);
    }

    #[test]
    fn align_up_near_the_top_overflows() {
        assert_eq!(MemoryAddress::new(u64::MAX - 10).align_up::<Size4K>(), None);
        assert_eq!(MemoryAddress::new(u64::MAX).checked_add(1), None);
    }

    #[test]
    fn split_separates_page_and_offset() {
        let (page, off) = MemoryAddress::new(0xABCD_E123).split::<Size4K>();
        assert_eq!(page.base().as_u64(), 0xABCD_E000);
        assert_eq!(off.as_u64(), 0x123);
        assert_eq!(page.join(off).as_u64(), 0xABCD_E123);
    }

    #[test]
    fn from_ptr_matches_address() {
        let x = 7u64;
        let p = core::ptr::from_ref(&x);
        assert_eq!(MemoryAddress::from_ptr(p).as_u64(), p.addr() as u64);
    }
}
