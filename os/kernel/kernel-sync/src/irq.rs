//! Interrupt masking on `x86_64`.
//!
//! [`IrqGuard`] is the push/pop pair used to keep a thread on its core while
//! per-core state is inspected: with `IF` cleared the timer cannot preempt the
//! thread, so it cannot be migrated either. [`IrqCpu`] packages that guard as
//! the kernel's [`Cpu`] implementation, and [`Mutex::lock_irq`] takes a lock
//! with it held.
//!
//! All of these execute privileged instructions and must only be used at CPL0.

use crate::{Cpu, Mutex, PinnedGuard, RawLock, RawUnlock};

/// Disables hardware interrupts (`cli`).
#[inline]
pub fn cli_stop_interrupts() {
    unsafe { core::arch::asm!("cli", options(nomem, nostack, preserves_flags)) }
}

/// Enables hardware interrupts (`sti`).
#[inline]
pub fn sti_enable_interrupts() {
    unsafe { core::arch::asm!("sti", options(nomem, nostack, preserves_flags)) }
}

/// Returns the current `RFLAGS` value (via `pushfq/pop`).
///
/// Bit 9 (`IF`) indicates whether interrupts are enabled.
#[inline]
#[must_use]
pub fn rflags() -> u64 {
    let r: u64;
    unsafe { core::arch::asm!("pushfq; pop {}", out(reg) r, options(nostack, preserves_flags)) }
    r
}

const RFLAGS_IF: u64 = 1 << 9;

/// RAII guard that disables interrupts on creation and restores them on drop.
///
/// Nests correctly: an inner guard created while interrupts are already off
/// leaves them off when it is dropped.
pub struct IrqGuard {
    /// Whether interrupts were enabled (IF=1) when the guard was created.
    were_enabled: bool,
}

impl Default for IrqGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl IrqGuard {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        let enabled = (rflags() & RFLAGS_IF) != 0;
        if enabled {
            cli_stop_interrupts();
        }
        Self {
            were_enabled: enabled,
        }
    }
}

impl Drop for IrqGuard {
    fn drop(&mut self) {
        if self.were_enabled {
            sti_enable_interrupts();
        }
    }
}

/// Reads `IA32_TSC_AUX` through `rdtscp`.
///
/// The kernel programs `TSC_AUX` with the logical core index during bring-up.
#[inline]
#[must_use]
pub fn tsc_aux() -> u32 {
    let aux: u32;
    unsafe {
        core::arch::asm!(
            "rdtscp",
            out("eax") _,
            out("edx") _,
            out("ecx") aux,
            options(nomem, nostack, preserves_flags)
        );
    }
    aux
}

/// [`Cpu`] for the running kernel: pins with [`IrqGuard`], identifies the core via `TSC_AUX`.
pub struct IrqCpu;

impl Cpu for IrqCpu {
    type Pin = IrqGuard;

    #[inline]
    fn pin() -> IrqGuard {
        IrqGuard::new()
    }

    #[inline]
    fn id(_pin: &IrqGuard) -> usize {
        tsc_aux() as usize
    }
}

/// A mutex guard that also keeps interrupts disabled; see [`Mutex::lock_irq`].
pub type IrqMutex<'a, T, R> = PinnedGuard<'a, T, R, IrqGuard>;

impl<T, R: RawLock + RawUnlock> Mutex<T, R> {
    /// Disables interrupts, then acquires the lock. Dropping the guard unlocks
    /// first and restores the interrupt state afterwards.
    #[inline]
    pub fn lock_irq(&self) -> IrqMutex<'_, T, R> {
        self.lock_pinned::<IrqCpu>()
    }
}
