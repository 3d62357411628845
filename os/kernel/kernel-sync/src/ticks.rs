use core::sync::atomic::{AtomicU64, Ordering};

/// Source of relative recency stamps.
pub trait Clock {
    /// Current tick. Monotonically non-decreasing; not wall-clock time.
    fn now(&self) -> u64;
}

/// Tick counter advanced by the periodic timer interrupt.
///
/// Lock-free: the timer handler may run on top of a thread that is in the
/// middle of [`now`](Clock::now) on the same core.
pub struct Ticks {
    count: AtomicU64,
}

impl Default for Ticks {
    fn default() -> Self {
        Self::new()
    }
}

impl Ticks {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
        }
    }

    /// Advance by one tick and return the new value. Called from the timer handler.
    pub fn tick(&self) -> u64 {
        self.count.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl Clock for Ticks {
    fn now(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> u64 {
        (**self).now()
    }
}
