//! The hash ring: server entries sorted by (hash, id).

/// Id offset between a primary and its virtual ring entries: a server with
/// id `n` contributes aliases `n + 100000` and `n + 200000`.
pub const VNODE_ID_STRIDE: u32 = 100_000;

/// Ring storage starts here; it doubles whenever three free slots cannot
/// be guaranteed and halves when the ring is less than half full.
pub const INITIAL_RING_CAPACITY: usize = 8;

/// What backs a ring entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingSlot {
    /// The entry is a server in its own right.
    Primary,
    /// The entry aliases the primary with this id; all state access is
    /// forwarded there.
    VirtualOf(u32),
}

/// One position on the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingEntry {
    pub id: u32,
    pub hash: u32,
    pub slot: RingSlot,
}

impl RingEntry {
    pub fn primary(id: u32, hash: u32) -> Self {
        Self {
            id,
            hash,
            slot: RingSlot::Primary,
        }
    }

    pub fn virtual_of(primary_id: u32, id: u32, hash: u32) -> Self {
        Self {
            id,
            hash,
            slot: RingSlot::VirtualOf(primary_id),
        }
    }

    /// The id of the server actually holding this entry's state.
    pub fn primary_id(&self) -> u32 {
        match self.slot {
            RingSlot::Primary => self.id,
            RingSlot::VirtualOf(primary_id) => primary_id,
        }
    }

    pub fn is_primary(&self) -> bool {
        matches!(self.slot, RingSlot::Primary)
    }
}

/// Where an inserted entry landed relative to the pre-existing entries.
/// The key-redistribution predicate depends on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Before every existing entry.
    Front,
    /// Between two existing entries.
    Middle,
    /// After every existing entry.
    Back,
}

/// Sorted sequence of ring entries with an explicit storage capacity.
pub struct Ring {
    entries: Vec<RingEntry>,
    capacity: usize,
}

impl Ring {
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(INITIAL_RING_CAPACITY),
            capacity: INITIAL_RING_CAPACITY,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, index: usize) -> &RingEntry {
        &self.entries[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &RingEntry> {
        self.entries.iter()
    }

    /// Inserts `entry` at its sorted position: before the first existing
    /// entry whose (hash, id) strictly exceeds the candidate's. Returns
    /// the index and the placement class.
    ///
    /// Inserting a duplicate (hash, id) is not supported; well-formed
    /// workloads never produce one.
    pub fn insert(&mut self, entry: RingEntry) -> (usize, Placement) {
        let pos = self
            .entries
            .partition_point(|e| (e.hash, e.id) < (entry.hash, entry.id));
        let placement = if pos == self.entries.len() {
            Placement::Back
        } else if pos == 0 {
            Placement::Front
        } else {
            Placement::Middle
        };
        self.entries.insert(pos, entry);
        (pos, placement)
    }

    /// Drops every entry backed by `primary_id` (the primary and its
    /// aliases).
    pub fn remove_primary(&mut self, primary_id: u32) {
        self.entries.retain(|e| e.primary_id() != primary_id);
    }

    /// The entry owning `hash`: the first entry at or after it, wrapping
    /// to the front of the ring. `None` only when the ring is empty.
    pub fn successor_index(&self, hash: u32) -> Option<usize> {
        if self.entries.is_empty() {
            return None;
        }
        let idx = self.entries.partition_point(|e| e.hash < hash);
        Some(if idx == self.entries.len() { 0 } else { idx })
    }

    /// Walks clockwise from `from`, returning the first entry backed by a
    /// different primary. `None` when every entry shares one primary.
    pub fn next_with_other_primary(&self, from: usize) -> Option<usize> {
        let origin = self.entries[from].primary_id();
        let len = self.entries.len();
        let mut idx = (from + 1) % len;
        while idx != from {
            if self.entries[idx].primary_id() != origin {
                return Some(idx);
            }
            idx = (idx + 1) % len;
        }
        None
    }

    pub fn position_of_id(&self, id: u32) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// Grows the tracked capacity until `slots` more entries fit.
    pub fn reserve_slots(&mut self, slots: usize) {
        let mut grown = false;
        while self.capacity < self.entries.len() + slots {
            self.capacity *= 2;
            grown = true;
        }
        if grown {
            tracing::debug!(capacity = self.capacity, "ring storage grown");
            self.entries.reserve_exact(self.capacity - self.entries.len());
        }
    }

    /// Halves the tracked capacity once the ring is less than half full.
    pub fn shrink_if_sparse(&mut self) {
        if self.entries.len() < self.capacity / 2 {
            self.capacity /= 2;
            self.entries.shrink_to(self.capacity);
            tracing::debug!(capacity = self.capacity, "ring storage shrunk");
        }
    }
}

impl Default for Ring {
    fn default() -> Self {
        Self::new()
    }
}
