//! # Kernel Configuration
//!
//! This crate is the single source of truth for the sizing and layout constants
//! shared by the kernel's memory-management core. Everything here is a `const`
//! so that the page allocator and the buffer cache can size their fixed pools
//! at compile time without any runtime configuration step.
//!
//! ## Modules
//!
//! ### Memory Layout ([`memory`])
//! * **Page Granularity**: The 4 KiB unit handed out by the page allocator
//! * **Physical Range**: Where the kernel image is loaded and where RAM ends
//! * **Direct Mapping**: HHDM base used to touch physical pages
//! * **Processor Count**: Upper bound on cores, one allocator shard each
//!
//! ### Block Layer ([`block`])
//! * **Block Size**: Payload size of a cached disk block
//! * **Pool Size**: Number of buffer slots in the block cache
//! * **Hashing**: Number of lookup buckets the slot pool is partitioned into
//!
//! ## Physical Memory Layout
//!
//! ```text
//! 0x0000_0000 ┌─────────────────────────────────┐
//!             │     Low Memory (< 1MiB)         │
//! PHYS_LOAD   ├─────────────────────────────────┤ 0x0010_0000 (1 MiB)
//!             │       Kernel Image              │
//!             │   (Text, Data, BSS)             │
//! kernel end  ├─────────────────────────────────┤ (linker symbol)
//!             │    Available RAM                │
//!             │  (Managed by page allocator)    │
//! PHYS_TOP    └─────────────────────────────────┘ PHYS_LOAD + 128 MiB
//! ```
//!
//! The end of the kernel image is only known at link time and is therefore
//! passed to the allocator at runtime; the other bounds are fixed here.
//!
//! ## Usage
//!
//! ```rust
//! use kernel_info::block::{BUCKETS, BUFFER_SLOTS};
//! use kernel_info::memory::PAGE_SIZE;
//!
//! assert_eq!(PAGE_SIZE, 4096);
//! assert!(BUFFER_SLOTS > BUCKETS);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod block;
pub mod memory;
