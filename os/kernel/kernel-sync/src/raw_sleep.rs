use crate::{RawLock, RawUnlock};
use core::marker::PhantomData;
use core::num::NonZeroUsize;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Hooks into the thread scheduler needed by blocking locks.
///
/// Implementations are zero-sized; the kernel provides one backed by its run
/// queue, tests use [`HostScheduler`](crate::host::HostScheduler).
pub trait Scheduler {
    /// Identifier of the running thread. Never zero; stable for the thread's lifetime.
    fn current_thread() -> NonZeroUsize;

    /// Put the calling thread to sleep on `channel` as long as `blocked()` holds.
    ///
    /// `blocked` is evaluated with the scheduler's own lock held, so a
    /// [`wake_all`](Self::wake_all) racing with the decision to sleep is
    /// never lost. Spurious returns are allowed; callers re-check.
    fn sleep(channel: usize, blocked: &dyn Fn() -> bool);

    /// Make every thread sleeping on `channel` runnable again.
    fn wake_all(channel: usize);
}

/// Blocking lock that records its holder.
///
/// A contended caller does not burn its time slice: it sleeps on the lock's
/// address through `S::sleep` and is woken by the holder's unlock. Holding a
/// `RawSleep` across a context switch or a disk transfer is allowed, which is
/// what distinguishes it from the spin variants.
pub struct RawSleep<S> {
    locked: AtomicBool,
    /// Thread id of the holder, `0` while unlocked.
    owner: AtomicUsize,
    /// Threads inside `S::sleep` on this lock, or about to be.
    sleepers: AtomicUsize,
    _scheduler: PhantomData<fn() -> S>,
}

impl<S: Scheduler> Default for RawSleep<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Scheduler> RawSleep<S> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
            owner: AtomicUsize::new(0),
            sleepers: AtomicUsize::new(0),
            _scheduler: PhantomData,
        }
    }

    #[inline]
    pub fn lock(&self) {
        while !self.try_lock() {
            // announce before sleeping so an unlock in between sees us
            self.sleepers.fetch_add(1, Ordering::SeqCst);
            S::sleep(self.channel(), &|| self.locked.load(Ordering::SeqCst));
            self.sleepers.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[inline]
    pub fn try_lock(&self) -> bool {
        if self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            self.owner.store(S::current_thread().get(), Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    #[inline]
    pub unsafe fn unlock(&self) {
        self.owner.store(0, Ordering::Relaxed);
        self.locked.store(false, Ordering::SeqCst);
        if self.sleepers.load(Ordering::SeqCst) > 0 {
            S::wake_all(self.channel());
        }
    }

    fn channel(&self) -> usize {
        core::ptr::from_ref(self).addr()
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }

    /// Whether the calling thread is the holder.
    #[inline]
    pub fn is_held_by_current(&self) -> bool {
        self.locked.load(Ordering::Acquire)
            && self.owner.load(Ordering::Relaxed) == S::current_thread().get()
    }
}

impl<S: Scheduler> RawLock for RawSleep<S> {
    fn raw_lock(&self) {
        self.lock();
    }

    fn raw_try_lock(&self) -> bool {
        self.try_lock()
    }

    fn raw_is_locked(&self) -> bool {
        self.is_locked()
    }
}

impl<S: Scheduler> RawUnlock for RawSleep<S> {
    unsafe fn raw_unlock(&self) {
        unsafe { self.unlock() }
    }
}
