//! A heap-free object pool with a capacity fixed at compile time.
//!
//! This crate provides [`RawPool`], an inline array of `N` slots shaped like `S`, and [`Pool`], a
//! typed facade over it. Slots are handed out and taken back in O(1) without touching the heap,
//! which makes the pools suitable as node storage for containers in embedded and real-time code.
//!
//! # Key Features
//!
//! - **No dynamic allocation**: all slots live inline in the pool value
//! - **O(1) allocate and release**: vacant slots form a free list threaded through their own
//!   storage
//! - **Lazy free list**: a slot is only written when it is about to be handed out for the first
//!   time
//! - **LIFO reuse**: the most recently released slot is the next one allocated
//! - **Index handles**: slots are addressed by [`SlotIndex`] rather than by raw pointer
//! - **Type erasure**: [`GenericPool`] serves any type that fits a size/alignment bound
//! - **Checked release**: releasing a foreign or already-released slot is an error that leaves the
//!   pool untouched
//!
//! # Examples
//!
//! ## Typed pool
//!
//! ```rust
//! use fixed_pool::Pool;
//!
//! let mut pool = Pool::<String, 4>::new();
//!
//! let greeting = pool.insert("Hello".to_string()).unwrap();
//! assert_eq!(pool.get(greeting).map(String::as_str), Some("Hello"));
//! assert_eq!(pool.len(), 1);
//! assert_eq!(pool.available(), 3);
//!
//! let value = pool.remove(greeting).unwrap();
//! assert_eq!(value, "Hello");
//! assert!(pool.is_empty());
//! ```
//!
//! ## Type-erased pool
//!
//! ```rust
//! use fixed_pool::{Align8, Error, GenericPool};
//!
//! // Three slots of 8 bytes each, aligned to 8 bytes.
//! let mut pool = GenericPool::<8, Align8, 3>::new();
//!
//! let a = pool.insert(1_u64).unwrap();
//! let b = pool.insert(2_i32).unwrap();
//! let c = pool.insert([3_u8; 8]).unwrap();
//! assert!(matches!(pool.allocate(), Err(Error::Full { capacity: 3 })));
//!
//! // The most recently released slot is reused first.
//! pool.release(b).unwrap();
//! assert_eq!(pool.allocate().unwrap(), b);
//!
//! pool.release_all();
//! assert_eq!(pool.available(), 3);
//! # _ = (a, c);
//! ```

mod aligned;
mod builder;
mod drop_policy;
mod error;
mod pool;
mod raw_pool;
mod slot_index;

pub use aligned::*;
pub use builder::*;
pub use drop_policy::*;
pub use error::Error;
pub(crate) use error::Result;
pub use pool::Pool;
pub use raw_pool::{GenericPool, RawPool};
pub use slot_index::SlotIndex;
