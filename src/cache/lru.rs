use std::collections::HashMap;
use std::mem;

/// A slot of the recency arena: one resident document plus its links in
/// the doubly linked recency list. Slots are recycled through a free list
/// so handles held by the key index stay valid until the key is removed.
struct Slot {
    key: String,
    value: String,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Bounded string-to-string map with LRU eviction.
///
/// `put`, `get` and `remove` are O(1) amortized: the index maps each key
/// to its arena slot, and the slot carries the links needed to splice the
/// entry to the back of the recency list without scanning.
///
/// Values are copied in on insert and owned by the cache; `get` hands out
/// a borrow. The evicted key is returned by value from `put` and becomes
/// the caller's, while the evicted value is dropped internally.
pub struct LruCache {
    capacity: usize,
    index: HashMap<String, usize>,
    slots: Vec<Slot>,
    free: Vec<usize>,
    /// Least recently used end; evictions come from here.
    head: Option<usize>,
    /// Most recently used end; every access lands here.
    tail: Option<usize>,
}

impl LruCache {
    /// Creates a cache holding at most `capacity` documents.
    ///
    /// # Panics
    /// Panics if `capacity` is zero; a zero-capacity cache cannot satisfy
    /// the put contract.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "cache capacity must be at least 1");
        Self {
            capacity,
            index: HashMap::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.index.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Inserts or overwrites `key`, marking it most recently used.
    ///
    /// Returns the key evicted to make room, if any. Overwriting a present
    /// key never evicts; a full cache evicts its least-recently-used entry
    /// before the new key is inserted.
    pub fn put(&mut self, key: &str, value: &str) -> Option<String> {
        if let Some(&slot) = self.index.get(key) {
            self.slots[slot].value.clear();
            self.slots[slot].value.push_str(value);
            self.detach(slot);
            self.attach_back(slot);
            return None;
        }

        let evicted = if self.index.len() == self.capacity {
            self.evict_front()
        } else {
            None
        };

        let slot = self.alloc(key, value);
        self.index.insert(key.to_owned(), slot);
        self.attach_back(slot);
        evicted
    }

    /// Looks up `key`, marking it most recently used on a hit.
    pub fn get(&mut self, key: &str) -> Option<&str> {
        let slot = *self.index.get(key)?;
        self.detach(slot);
        self.attach_back(slot);
        Some(self.slots[slot].value.as_str())
    }

    /// Drops `key` from the cache; no-op when absent.
    pub fn remove(&mut self, key: &str) {
        if let Some(slot) = self.index.remove(key) {
            self.detach(slot);
            self.release(slot);
        }
    }

    /// Resident keys from least to most recently used.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        std::iter::successors(self.head, |&slot| self.slots[slot].next)
            .map(|slot| self.slots[slot].key.as_str())
    }

    /// Removes the least-recently-used entry and returns its key; the
    /// value is dropped here.
    fn evict_front(&mut self) -> Option<String> {
        let slot = self.head?;
        self.detach(slot);
        let key = mem::take(&mut self.slots[slot].key);
        self.index.remove(&key);
        self.release(slot);
        Some(key)
    }

    fn alloc(&mut self, key: &str, value: &str) -> usize {
        match self.free.pop() {
            Some(slot) => {
                let s = &mut self.slots[slot];
                s.key.push_str(key);
                s.value.push_str(value);
                slot
            }
            None => {
                self.slots.push(Slot {
                    key: key.to_owned(),
                    value: value.to_owned(),
                    prev: None,
                    next: None,
                });
                self.slots.len() - 1
            }
        }
    }

    fn release(&mut self, slot: usize) {
        self.slots[slot].key.clear();
        self.slots[slot].value.clear();
        self.free.push(slot);
    }

    /// Unlinks `slot` from the recency list.
    fn detach(&mut self, slot: usize) {
        let prev = self.slots[slot].prev;
        let next = self.slots[slot].next;
        match prev {
            Some(p) => self.slots[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slots[n].prev = prev,
            None => self.tail = prev,
        }
        self.slots[slot].prev = None;
        self.slots[slot].next = None;
    }

    /// Links `slot` at the most-recently-used end.
    fn attach_back(&mut self, slot: usize) {
        self.slots[slot].prev = self.tail;
        self.slots[slot].next = None;
        match self.tail {
            Some(t) => self.slots[t].next = Some(slot),
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
    }
}
