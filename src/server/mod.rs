//! Document Server Module
//!
//! One server of the cluster: a hot LRU cache in front of an authoritative
//! local store, plus a queue of deferred edits.
//!
//! ## Lazy Edit Model
//! 1. **Submission**: edit requests are not applied on arrival; they are
//!    copied into the server's task queue and acknowledged immediately.
//! 2. **Drain**: any read (and any topology change touching the server)
//!    first executes every pending edit in FIFO order, delivering each
//!    edit's response to the caller's sink, so reads always observe every
//!    acknowledged write.
//! 3. **Identity**: a server reached through a virtual ring entry executes
//!    against the primary's state but answers with the virtual entry's id.
//!
//! ## Submodules
//! - **`protocol`**: request/response types, the fixed log and response
//!   message templates, and the response sink.
//! - **`queue`**: bounded FIFO of pending edits (drop-on-overflow).
//! - **`service`**: the server state machine itself.

pub mod protocol;
pub mod queue;
pub mod service;

#[cfg(test)]
mod tests;
