//! Bounded LRU Cache
//!
//! The storage primitive of the cluster. Every server owns two instances:
//! a small one as the hot document cache and a large one (capacity x1000)
//! as the authoritative local store.
//!
//! ## Core Concepts
//! - **Recency order**: all resident keys form a single sequence from
//!   least-recently-used to most-recently-used; every hit moves the key to
//!   the back.
//! - **Bounded eviction**: inserting into a full cache evicts the front of
//!   the recency order first and hands the evicted key back to the caller,
//!   so the caller can name it in its own logs.
//! - **Stable handles**: the key index stores a handle into a slot arena,
//!   so recency splicing never scans.

pub mod lru;

pub use lru::LruCache;
