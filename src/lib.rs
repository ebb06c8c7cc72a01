//! Distributed Document Store Library
//!
//! This library crate defines the core of an in-process document cluster:
//! a consistent-hashing load balancer in front of servers that combine a
//! hot LRU cache, an authoritative local store, and a lazy-edit queue.
//! It serves as the foundation for the binary driver (`main.rs`), which
//! feeds it a script of operations and renders the response transcript.
//!
//! ## Architecture Modules
//! The system is composed of four loosely coupled subsystems:
//!
//! - **`hash`**: The placement hashes. Deterministic, byte-exact functions
//!   mapping document names and server ids onto the ring.
//! - **`cache`**: The storage primitive. A bounded LRU mapping with an
//!   arena-backed recency order, used both as the hot cache and (scaled
//!   up) as each server's authoritative store.
//! - **`server`**: The per-server state machine. Edits are queued and
//!   acknowledged lazily; reads drain the queue before answering, so every
//!   acknowledged write is observed.
//! - **`balancer`**: The coordination layer. Owns the hash ring, routes
//!   requests to ring successors, and re-homes exactly the keys whose
//!   ownership changes when servers join or leave.

pub mod balancer;
pub mod cache;
pub mod hash;
pub mod server;
