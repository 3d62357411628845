//! # Kernel Block Buffer Cache
//!
//! A fixed pool of in-memory copies of disk blocks shared by every thread
//! of the kernel. The cache
//!
//! * keeps at most one copy of each `(device, block)` pair,
//! * hands a buffer to one thread at a time ([`BufGuard`] wraps a sleep lock),
//! * recycles the least recently released idle buffer when a block is not cached.
//!
//! Lookups are spread over [`BUCKETS`](kernel_info::block::BUCKETS) hash
//! buckets with one spin lock each, so threads working on different blocks
//! rarely contend. Only a miss takes the pool-wide lock. In the kernel the
//! cache is instantiated with [`IrqCpu`](kernel_sync::irq::IrqCpu), which
//! keeps interrupts off while a bucket or the pool lock is held.
//!
//! ```rust
//! use kernel_bcache::{BlockData, BlockKey, BufferCache, DiskDriver};
//! use kernel_sync::Ticks;
//! use kernel_sync::host::{HostCpu, HostScheduler};
//!
//! struct Zeroes;
//!
//! impl DiskDriver for Zeroes {
//!     fn read_block(&self, _key: BlockKey, data: &mut BlockData) {
//!         data.fill(0);
//!     }
//!     fn write_block(&self, _key: BlockKey, _data: &BlockData) {}
//! }
//!
//! let cache: BufferCache<_, _, HostScheduler, HostCpu, 4> = BufferCache::new(Zeroes, Ticks::new());
//! let mut buf = cache.read(1, 7);
//! buf[0] = 0xAB;
//! cache.write(&buf);
//! cache.release(buf);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

mod bucket;
mod cache;
mod disk;
mod error;
mod guard;
mod key;
mod slot;
mod stats;

pub use cache::BufferCache;
pub use disk::{BlockData, DiskDriver};
pub use error::CacheError;
pub use guard::{BufGuard, BufPin};
pub use key::BlockKey;
pub use stats::CacheStats;
