//! Host-side [`Scheduler`] and [`Cpu`] for running kernel structures on
//! ordinary OS threads.
//!
//! Each OS thread stands in for a kernel thread. The "core" a thread runs on
//! is whatever it last passed to [`HostCpu::bind`] (core 0 by default), which
//! lets a test place threads on specific allocator shards deterministically.
//!
//! Sleeping threads share one wait queue; a wakeup on any channel wakes all
//! of them and each re-checks its own condition.

use crate::{Cpu, Scheduler};
use core::cell::Cell;
use core::marker::PhantomData;
use core::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};

static NEXT_THREAD_ID: AtomicUsize = AtomicUsize::new(1);

std::thread_local! {
    static THREAD_ID: NonZeroUsize = NonZeroUsize::new(NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed))
        .unwrap_or(NonZeroUsize::MIN);
    static CPU_ID: Cell<usize> = const { Cell::new(0) };
    static PIN_DEPTH: Cell<usize> = const { Cell::new(0) };
}

static WAIT_QUEUE: Mutex<()> = Mutex::new(());
static WAKEUP: Condvar = Condvar::new();

/// Scheduler backed by `std::thread`.
pub struct HostScheduler;

impl Scheduler for HostScheduler {
    fn current_thread() -> NonZeroUsize {
        THREAD_ID.with(|id| *id)
    }

    fn sleep(_channel: usize, blocked: &dyn Fn() -> bool) {
        let mut queue = WAIT_QUEUE.lock().unwrap_or_else(PoisonError::into_inner);
        while blocked() {
            queue = WAKEUP.wait(queue).unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn wake_all(_channel: usize) {
        let _queue = WAIT_QUEUE.lock().unwrap_or_else(PoisonError::into_inner);
        WAKEUP.notify_all();
    }
}

/// Processor identity backed by a thread-local core index.
pub struct HostCpu;

impl HostCpu {
    /// Declare that the calling thread runs on core `id` from now on.
    pub fn bind(id: usize) {
        CPU_ID.with(|c| c.set(id));
    }

    /// Whether the calling thread holds a [`HostPin`].
    #[must_use]
    pub fn is_pinned() -> bool {
        PIN_DEPTH.with(Cell::get) > 0
    }
}

/// Pin handle for [`HostCpu`]; not `Send`, like a real interrupt guard.
pub struct HostPin {
    id: usize,
    _not_send: PhantomData<*const ()>,
}

impl Cpu for HostCpu {
    type Pin = HostPin;

    fn pin() -> HostPin {
        PIN_DEPTH.with(|d| d.set(d.get() + 1));
        HostPin {
            id: CPU_ID.with(Cell::get),
            _not_send: PhantomData,
        }
    }

    fn id(pin: &HostPin) -> usize {
        pin.id
    }
}

impl Drop for HostPin {
    fn drop(&mut self) {
        PIN_DEPTH.with(|d| d.set(d.get() - 1));
    }
}
