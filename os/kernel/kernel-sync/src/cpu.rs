use crate::{Mutex, MutexGuard, RawLock, RawUnlock};
use core::ops::{Deref, DerefMut};

/// Access to the identity of the processor the caller runs on.
///
/// The core index is only meaningful while the thread cannot migrate, so it
/// can only be read through a [`Pin`](Cpu::Pin) obtained from [`Cpu::pin`].
/// In the kernel pinning means disabling interrupts on the local core
/// (see [`IrqCpu`](crate::irq::IrqCpu)); dropping the pin restores them.
pub trait Cpu {
    /// Keeps the current thread on its core while alive. Pins nest.
    type Pin;

    /// Pin the calling thread to the core it is running on.
    fn pin() -> Self::Pin;

    /// Index of the pinned core, in `0..MAX_CPUS`.
    fn id(pin: &Self::Pin) -> usize;
}

/// A mutex guard that also keeps the holder pinned to its core.
///
/// Created by [`Mutex::lock_pinned`]. The pin is taken before the lock and
/// released after it, so neither preemption nor an interrupt handler on the
/// same core can observe the lock held by a thread that is not running.
pub struct PinnedGuard<'a, T, R: RawUnlock, P> {
    // field order is drop order: unlock first, then unpin
    guard: MutexGuard<'a, T, R>,
    _pin: P,
}

impl<T, R: RawLock + RawUnlock> Mutex<T, R> {
    /// Pins the caller with `C`, then acquires the lock.
    #[inline]
    pub fn lock_pinned<C: Cpu>(&self) -> PinnedGuard<'_, T, R, C::Pin> {
        let pin = C::pin();
        let guard = self.lock();
        PinnedGuard { guard, _pin: pin }
    }
}

impl<T, R: RawUnlock, P> Deref for PinnedGuard<'_, T, R, P> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T, R: RawUnlock, P> DerefMut for PinnedGuard<'_, T, R, P> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

#[cfg(test)]
mod tests {
    use crate::host::HostCpu;
    use crate::{Cpu, SpinMutex, TicketMutex};

    #[test]
    fn pinned_guard_holds_pin_and_lock() {
        let l = SpinMutex::new(1u32);
        assert!(!HostCpu::is_pinned());
        {
            let mut g = l.lock_pinned::<HostCpu>();
            *g += 1;
            assert!(HostCpu::is_pinned());
            assert!(l.is_locked());
        }
        assert!(!HostCpu::is_pinned());
        assert!(!l.is_locked());
        assert_eq!(*l.lock(), 2);
    }

    #[test]
    fn pins_nest() {
        let outer = TicketMutex::new(());
        let inner = SpinMutex::new(());
        let pin = HostCpu::pin();
        let a = outer.lock_pinned::<HostCpu>();
        let b = inner.lock_pinned::<HostCpu>();
        drop(b);
        assert!(HostCpu::is_pinned());
        drop(a);
        assert!(HostCpu::is_pinned());
        drop(pin);
        assert!(!HostCpu::is_pinned());
    }

    #[test]
    fn pinned_core_id_follows_binding() {
        std::thread::spawn(|| {
            HostCpu::bind(3);
            let pin = HostCpu::pin();
            assert_eq!(HostCpu::id(&pin), 3);
        })
        .join()
        .unwrap();
    }
}
