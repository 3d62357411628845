//! # Reaching physical pages from kernel code
//!
//! The allocator deals in [`PhysicalAddress`]es, but filling a page with junk
//! (and every client's later use of the page) needs a pointer in the current
//! address space. [`PhysMapper`] abstracts that translation:
//!
//! - [`HhdmPhysMapper`]: every physical address is mapped at `HHDM_BASE + pa`
//!   (the running kernel).
//! - [`IdentityPhysMapper`]: physical and virtual addresses coincide (early
//!   boot identity map, hosted tests).

use crate::PhysicalAddress;
use kernel_info::memory::HHDM_BASE;

pub trait PhysMapper {
    /// Turn a physical address into a mutable reference in the current address space.
    ///
    /// # Safety
    /// - `pa` must be mapped, suitably aligned for `T` and cover `size_of::<T>()` bytes.
    /// - The caller must own the memory for the returned lifetime; no other
    ///   reference to it may be live.
    unsafe fn phys_to_mut<'a, T>(&self, pa: PhysicalAddress) -> &'a mut T;
}

/// [`PhysMapper`] for kernels with a higher-half direct map (HHDM).
pub struct HhdmPhysMapper;

impl PhysMapper for HhdmPhysMapper {
    unsafe fn phys_to_mut<'a, T>(&self, pa: PhysicalAddress) -> &'a mut T {
        let va = (HHDM_BASE + pa.as_u64()) as *mut T;
        // SAFETY: Caller must ensure the physical address is valid and mapped via HHDM.
        unsafe { &mut *va }
    }
}

/// [`PhysMapper`] for identity-mapped memory.
pub struct IdentityPhysMapper;

impl PhysMapper for IdentityPhysMapper {
    unsafe fn phys_to_mut<'a, T>(&self, pa: PhysicalAddress) -> &'a mut T {
        let va = pa.as_u64() as *mut T;
        // SAFETY: Caller guarantees `pa` is directly addressable.
        unsafe { &mut *va }
    }
}
