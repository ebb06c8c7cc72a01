//! Load Balancer Module
//!
//! The coordination layer of the cluster: a consistent-hash ring of server
//! entries and the balancer that owns it.
//!
//! ## Core Concepts
//! - **Placement**: a document belongs to the first ring entry whose hash
//!   is at or after the document's hash, wrapping around the ring.
//! - **Virtual nodes**: with replication enabled, each server contributes
//!   three ring entries (the primary plus two id-offset aliases) to smooth
//!   key distribution; aliases forward all state access to the primary.
//! - **Rebalancing**: adding or removing a server moves exactly the keys
//!   whose ring ownership changed, after draining the donor's pending
//!   edits so acknowledged writes survive the move.
//!
//! ## Submodules
//! - **`ring`**: the sorted entry sequence, successor lookup, and the
//!   storage growth policy.
//! - **`service`**: add/remove server, key redistribution, and request
//!   routing.

pub mod ring;
pub mod service;
