use super::protocol::{
    Request, Response, ResponseSink, log_evict, log_fault, log_hit, log_lazy_exec, log_miss,
    msg_created, msg_edited, msg_queued,
};
use super::queue::{EditTask, TaskQueue};
use crate::cache::LruCache;
use crate::hash::hash_server_id;

/// The authoritative store holds this many times the cache capacity.
pub const STORE_CAPACITY_FACTOR: usize = 1000;

/// One primary server: hot cache, authoritative store, pending-edit queue.
///
/// Virtual ring entries do not get servers of their own; the balancer
/// resolves them to their primary and passes the virtual entry's id as
/// `via_id`, so responses carry the identity the request arrived through
/// while all state lives here.
pub struct Server {
    id: u32,
    hash: u32,
    cache: LruCache,
    store: LruCache,
    queue: TaskQueue,
}

impl Server {
    pub fn new(id: u32, cache_size: usize) -> Self {
        Self {
            id,
            hash: hash_server_id(id),
            cache: LruCache::new(cache_size),
            store: LruCache::new(cache_size * STORE_CAPACITY_FACTOR),
            queue: TaskQueue::new(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn hash(&self) -> u32 {
        self.hash
    }

    /// Dispatches one request.
    ///
    /// Edits are queued and acknowledged; reads drain the queue first,
    /// delivering each executed edit's response to `sink`, then answer
    /// from cache or store.
    pub fn handle_request(
        &mut self,
        via_id: u32,
        request: Request,
        sink: &mut dyn ResponseSink,
    ) -> Response {
        match request {
            Request::Edit {
                doc_name,
                doc_content,
            } => {
                let accepted = self.queue.enqueue(EditTask {
                    doc_name: doc_name.clone(),
                    doc_content,
                });
                if !accepted {
                    tracing::warn!(doc = %doc_name, "task queue full, edit dropped");
                }
                Response {
                    server_log: Some(log_lazy_exec(self.queue.len())),
                    server_response: Some(msg_queued("EDIT", &doc_name)),
                    server_id: via_id,
                }
            }
            Request::Get { doc_name } => {
                self.drain(via_id, sink);
                self.get_document(via_id, &doc_name)
            }
        }
    }

    /// Executes every pending edit in FIFO order, delivering each response
    /// to `sink`. Reads and topology changes call this before touching the
    /// store, so the store is current whenever it is read or re-homed.
    pub fn drain(&mut self, via_id: u32, sink: &mut dyn ResponseSink) {
        while let Some(task) = self.queue.dequeue() {
            let response = self.edit_document(via_id, &task.doc_name, &task.doc_content);
            sink.deliver(&response);
        }
    }

    fn edit_document(&mut self, via_id: u32, name: &str, content: &str) -> Response {
        if self.cache.get(name).is_some() {
            // Present key: the cache put overwrites in place, no eviction.
            self.cache.put(name, content);
            self.store.put(name, content);
            return Response {
                server_log: Some(log_hit(name)),
                server_response: Some(msg_edited(name)),
                server_id: via_id,
            };
        }

        if self.store.get(name).is_some() {
            let evicted = self.cache.put(name, content);
            self.store.put(name, content);
            let log = match evicted {
                Some(victim) => log_evict(name, &victim),
                None => log_miss(name),
            };
            Response {
                server_log: Some(log),
                server_response: Some(msg_edited(name)),
                server_id: via_id,
            }
        } else {
            self.store.put(name, content);
            let evicted = self.cache.put(name, content);
            let log = match evicted {
                Some(victim) => log_evict(name, &victim),
                None => log_miss(name),
            };
            Response {
                server_log: Some(log),
                server_response: Some(msg_created(name)),
                server_id: via_id,
            }
        }
    }

    fn get_document(&mut self, via_id: u32, name: &str) -> Response {
        if let Some(content) = self.cache.get(name) {
            let content = content.to_owned();
            return Response {
                server_log: Some(log_hit(name)),
                server_response: Some(content),
                server_id: via_id,
            };
        }

        match self.store.get(name).map(str::to_owned) {
            Some(content) => {
                let evicted = self.cache.put(name, &content);
                let log = match evicted {
                    Some(victim) => log_evict(name, &victim),
                    None => log_miss(name),
                };
                Response {
                    server_log: Some(log),
                    server_response: Some(content),
                    server_id: via_id,
                }
            }
            None => Response {
                server_log: Some(log_fault(name)),
                server_response: None,
                server_id: via_id,
            },
        }
    }

    /// Number of edits waiting in the queue.
    pub fn pending_edits(&self) -> usize {
        self.queue.len()
    }

    // Store-level accessors used by the balancer while re-homing keys.

    /// Snapshot of every stored document name, least recently used first.
    pub fn store_keys(&self) -> Vec<String> {
        self.store.keys().map(str::to_owned).collect()
    }

    pub fn store_len(&self) -> usize {
        self.store.len()
    }

    /// Reads a document straight from the store (touching its recency),
    /// bypassing the cache.
    pub fn store_get(&mut self, name: &str) -> Option<String> {
        self.store.get(name).map(str::to_owned)
    }

    /// Adopts a document into the store without warming the cache; used
    /// when keys migrate in from another server.
    pub fn store_put(&mut self, name: &str, content: &str) {
        self.store.put(name, content);
    }

    pub fn store_remove(&mut self, name: &str) {
        self.store.remove(name);
    }

    /// Drops a document from the hot cache only; the store is untouched.
    pub fn invalidate_cached(&mut self, name: &str) {
        self.cache.remove(name);
    }
}
