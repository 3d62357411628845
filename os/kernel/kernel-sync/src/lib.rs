//! # Kernel synchronization primitives
//!
//! Lock types and the small set of scheduler/processor hooks the memory
//! management core is built on.
//!
//! * [`SpinMutex`] – test-and-test-and-set spin lock for short, non-blocking
//!   critical sections (allocator shards, cache buckets).
//! * [`TicketMutex`] – FIFO spin lock; used where many cores may queue up on
//!   the same arbiter.
//! * [`SleepMutex`] – blocking lock whose waiters sleep via [`Scheduler::sleep`]
//!   until the holder's unlock wakes them. Remembers its holder so callers can assert
//!   ownership with [`Mutex::is_held_by_current`].
//! * [`Cpu`] – pins the running thread to its core and reports the core index.
//!   [`Mutex::lock_pinned`] takes any of the spin locks with the holder pinned,
//!   so it cannot be preempted or interrupted while other cores wait on it.
//! * [`Ticks`] / [`Clock`] – lock-free tick counter used as a recency stamp.

#![cfg_attr(not(any(test, doctest, feature = "std")), no_std)]
#![allow(unsafe_code)]

mod cpu;
#[cfg(any(test, feature = "std"))]
pub mod host;
#[cfg(target_arch = "x86_64")]
pub mod irq;
mod mutex;
mod raw_sleep;
mod raw_spin;
mod raw_ticket;
mod ticks;

pub use cpu::{Cpu, PinnedGuard};
#[cfg(target_arch = "x86_64")]
pub use irq::IrqGuard;
pub use mutex::{Mutex, MutexGuard};
pub use raw_sleep::{RawSleep, Scheduler};
pub use raw_spin::RawSpin;
pub use raw_ticket::RawTicket;
pub use ticks::{Clock, Ticks};

pub type SpinMutex<T> = Mutex<T, RawSpin>;
pub type TicketMutex<T> = Mutex<T, RawTicket>;
pub type SleepMutex<T, S> = Mutex<T, RawSleep<S>>;

impl<T> SpinMutex<T> {
    pub const fn new(value: T) -> Self {
        Self::from_raw(RawSpin::new(), value)
    }
}

impl<T> TicketMutex<T> {
    pub const fn new(value: T) -> Self {
        Self::from_raw(RawTicket::new(), value)
    }
}

impl<T, S: Scheduler> SleepMutex<T, S> {
    pub const fn new(value: T) -> Self {
        Self::from_raw(RawSleep::new(), value)
    }

    /// Whether the calling thread currently holds this lock.
    #[inline]
    pub fn is_held_by_current(&self) -> bool {
        self.raw().is_held_by_current()
    }
}

pub trait RawLock {
    fn raw_lock(&self);
    fn raw_try_lock(&self) -> bool;
    /// Whether *someone* holds the lock right now. Racy unless the caller is the holder.
    fn raw_is_locked(&self) -> bool;
}

pub trait RawUnlock {
    unsafe fn raw_unlock(&self);
}
