//! Request/response contract of the cluster.
//!
//! The templates here are fixed strings: driver transcripts are compared
//! verbatim against them, so any wording change is a breaking change.

use serde::{Deserialize, Serialize};
use std::io;

/// Largest document content (and response payload) the cluster accepts,
/// in bytes.
pub const MAX_DOC_SIZE: usize = 4096;

/// A client request routed by the load balancer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Request {
    /// Deferred edit: queued on the owning server, applied on next drain.
    Edit { doc_name: String, doc_content: String },
    /// Read: drains the owning server's queue, then answers from cache or
    /// store.
    Get { doc_name: String },
}

impl Request {
    pub fn doc_name(&self) -> &str {
        match self {
            Request::Edit { doc_name, .. } => doc_name,
            Request::Get { doc_name } => doc_name,
        }
    }

    pub fn is_get(&self) -> bool {
        matches!(self, Request::Get { .. })
    }
}

/// What a server hands back for one request: an internal log line, an
/// optional payload, and the id of the ring entry that answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub server_log: Option<String>,
    pub server_response: Option<String>,
    pub server_id: u32,
}

pub fn log_hit(doc: &str) -> String {
    format!("has cache entry for {doc}")
}

pub fn log_miss(doc: &str) -> String {
    format!("cache miss; fetched {doc} from local database")
}

pub fn log_evict(doc: &str, evicted: &str) -> String {
    format!("cache miss; evicted {evicted} and fetched {doc} from local database")
}

pub fn log_fault(doc: &str) -> String {
    format!("document {doc} is neither in cache, nor in local database")
}

pub fn log_lazy_exec(pending: usize) -> String {
    format!("task queue now has {pending} pending operations")
}

pub fn msg_queued(op: &str, doc: &str) -> String {
    format!("request {op} {doc} queued for execution")
}

pub fn msg_edited(doc: &str) -> String {
    format!("document {doc} edited successfully")
}

pub fn msg_created(doc: &str) -> String {
    format!("document {doc} created")
}

/// Receives every response produced while a server drains its queue.
///
/// The drain happens inside reads and topology changes, before their own
/// response exists, so the intermediate responses cannot be returned; they
/// are delivered here in execution order instead.
pub trait ResponseSink {
    fn deliver(&mut self, response: &Response);
}

/// Captures responses in memory; the sink used by tests and embedders.
impl ResponseSink for Vec<Response> {
    fn deliver(&mut self, response: &Response) {
        self.push(response.clone());
    }
}

/// Renders responses into the fixed two-line transcript format:
///
/// ```text
/// Server <id> has received <server_response>
/// Server <id> <server_log>
/// ```
///
/// Absent fields render as empty strings.
pub struct TranscriptWriter<W> {
    out: W,
}

impl<W: io::Write> TranscriptWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: io::Write> ResponseSink for TranscriptWriter<W> {
    fn deliver(&mut self, response: &Response) {
        let reply = response.server_response.as_deref().unwrap_or("");
        let log = response.server_log.as_deref().unwrap_or("");
        let _ = writeln!(
            self.out,
            "Server {} has received {}",
            response.server_id, reply
        );
        let _ = writeln!(self.out, "Server {} {}", response.server_id, log);
    }
}
