use super::ring::{Placement, Ring, RingEntry, VNODE_ID_STRIDE};
use crate::hash::{hash_doc_name, hash_server_id};
use crate::server::protocol::{Request, Response, ResponseSink};
use crate::server::service::Server;
use std::collections::HashMap;
use std::fmt::Write as _;

/// The consistent-hashing front of the cluster.
///
/// Owns the ring and the registry of primary servers behind it. Requests
/// are routed to the ring successor of the document's hash; topology
/// changes drain the affected donor and move exactly the keys whose ring
/// ownership changed, so edits acknowledged before a change are readable
/// after it.
pub struct LoadBalancer {
    ring: Ring,
    servers: HashMap<u32, Server>,
    vnodes_enabled: bool,
}

impl LoadBalancer {
    pub fn new(enable_vnodes: bool) -> Self {
        Self {
            ring: Ring::new(),
            servers: HashMap::new(),
            vnodes_enabled: enable_vnodes,
        }
    }

    pub fn server_count(&self) -> usize {
        self.servers.len()
    }

    pub fn ring_len(&self) -> usize {
        self.ring.len()
    }

    pub fn server(&self, id: u32) -> Option<&Server> {
        self.servers.get(&id)
    }

    pub fn server_mut(&mut self, id: u32) -> Option<&mut Server> {
        self.servers.get_mut(&id)
    }

    /// Adds a primary server (and, with virtual nodes enabled, its two
    /// alias entries) to the ring, re-homing the keys each new entry
    /// claims from its ring successor.
    ///
    /// Responses produced while donors drain are delivered to `sink`.
    pub fn add_server(&mut self, id: u32, cache_size: usize, sink: &mut dyn ResponseSink) {
        if self.servers.contains_key(&id) {
            tracing::warn!(id, "add of already-present server ignored");
            return;
        }
        tracing::info!(id, cache_size, vnodes = self.vnodes_enabled, "adding server");

        self.servers.insert(id, Server::new(id, cache_size));
        self.ring.reserve_slots(3);

        let hash = hash_server_id(id);
        self.insert_entry(RingEntry::primary(id, hash), sink);
        if self.vnodes_enabled {
            for offset in 1..=2 {
                let alias_id = id + offset * VNODE_ID_STRIDE;
                let entry = RingEntry::virtual_of(id, alias_id, hash_server_id(alias_id));
                self.insert_entry(entry, sink);
            }
        }
    }

    /// Places one entry on the ring and migrates the keys it now owns away
    /// from its donor (the nearest clockwise entry of another primary).
    fn insert_entry(&mut self, entry: RingEntry, sink: &mut dyn ResponseSink) {
        let (pos, placement) = self.ring.insert(entry);
        let Some(donor_idx) = self.ring.next_with_other_primary(pos) else {
            // First primary on the ring: nothing to claim keys from.
            return;
        };
        let donor = *self.ring.get(donor_idx);
        let donor_primary = donor.primary_id();

        // The donor's store must reflect every acknowledged edit before
        // its keys are inspected.
        let Some(server) = self.servers.get_mut(&donor_primary) else {
            tracing::error!(donor_primary, "ring entry without a backing server");
            return;
        };
        server.drain(donor.id, sink);

        let keys = server.store_keys();
        for key in keys {
            let key_hash = hash_doc_name(&key);
            let Some(owner_idx) = self.ring.successor_index(key_hash) else {
                break;
            };
            let owner_primary = self.ring.get(owner_idx).primary_id();
            if owner_primary == donor_primary {
                continue;
            }
            if !should_redistribute(placement, entry.hash, donor.hash, key_hash) {
                continue;
            }
            self.move_document(&key, donor_primary, owner_primary);
        }
    }

    /// Moves one document between primaries: copied into the new owner's
    /// store, dropped from the donor's store and hot cache.
    fn move_document(&mut self, key: &str, from: u32, to: u32) {
        let Some(value) = self
            .servers
            .get_mut(&from)
            .and_then(|server| server.store_get(key))
        else {
            return;
        };
        if let Some(owner) = self.servers.get_mut(&to) {
            owner.store_put(key, &value);
        }
        if let Some(donor) = self.servers.get_mut(&from) {
            donor.store_remove(key);
            donor.invalidate_cached(key);
        }
        tracing::debug!(key, from, to, "document re-homed");
    }

    /// Removes a server, donating its documents to the remaining ring.
    /// Unknown ids are ignored. Responses produced while the outgoing
    /// server drains are delivered to `sink`.
    pub fn remove_server(&mut self, id: u32, sink: &mut dyn ResponseSink) {
        if !self.servers.contains_key(&id) {
            tracing::debug!(id, "remove of unknown server ignored");
            return;
        }
        tracing::info!(id, "removing server");

        if let Some(idx) = self.ring.position_of_id(id) {
            if let Some(server) = self.servers.get_mut(&id) {
                server.drain(id, sink);
            }
            if self.vnodes_enabled {
                self.donate_replica_arcs(id);
            }
            self.merge_into_successor(id, idx);
        }

        self.ring.remove_primary(id);
        self.servers.remove(&id);
        self.ring.shrink_if_sparse();
    }

    /// Donates each virtual entry's arc: the outgoing primary's documents
    /// are copied to the successor of each alias entry. The copies left on
    /// the outgoing server are discarded with it.
    fn donate_replica_arcs(&mut self, primary_id: u32) {
        for offset in 1..=2 {
            let alias_id = primary_id + offset * VNODE_ID_STRIDE;
            let Some(alias_idx) = self.ring.position_of_id(alias_id) else {
                continue;
            };
            let Some(succ_idx) = self.ring.next_with_other_primary(alias_idx) else {
                continue;
            };
            let succ_primary = self.ring.get(succ_idx).primary_id();
            let Some(outgoing) = self.servers.get_mut(&primary_id) else {
                continue;
            };
            let keys = outgoing.store_keys();
            for key in keys {
                let Some(value) = self
                    .servers
                    .get_mut(&primary_id)
                    .and_then(|server| server.store_get(&key))
                else {
                    continue;
                };
                if let Some(successor) = self.servers.get_mut(&succ_primary) {
                    successor.store_put(&key, &value);
                }
            }
            tracing::debug!(alias_id, succ_primary, "replica arc donated");
        }
    }

    /// Moves every remaining document of the outgoing primary to its own
    /// ring successor.
    fn merge_into_successor(&mut self, primary_id: u32, idx: usize) {
        let Some(succ_idx) = self.ring.next_with_other_primary(idx) else {
            // Last server standing: its documents leave with it.
            return;
        };
        let succ_primary = self.ring.get(succ_idx).primary_id();
        let keys = match self.servers.get(&primary_id) {
            Some(server) => server.store_keys(),
            None => return,
        };
        for key in keys {
            let Some(value) = self
                .servers
                .get_mut(&primary_id)
                .and_then(|server| server.store_get(&key))
            else {
                continue;
            };
            if let Some(successor) = self.servers.get_mut(&succ_primary) {
                successor.store_put(&key, &value);
            }
            if let Some(outgoing) = self.servers.get_mut(&primary_id) {
                outgoing.store_remove(&key);
            }
        }
    }

    /// Routes one request to the ring successor of its document name.
    ///
    /// With virtual nodes, reads are answered by the entry of the owning
    /// primary whose own hash sits immediately after the key, so the
    /// observable identity is the replica that initiated the read.
    /// Returns `None` when the ring is empty.
    pub fn forward_request(
        &mut self,
        request: Request,
        sink: &mut dyn ResponseSink,
    ) -> Option<Response> {
        let key_hash = hash_doc_name(request.doc_name());
        let Some(mut idx) = self.ring.successor_index(key_hash) else {
            tracing::error!(doc = request.doc_name(), "request arrived on an empty ring");
            return None;
        };

        if self.vnodes_enabled && request.is_get() {
            let primary_id = self.ring.get(idx).primary_id();
            if let Some(replica_idx) = self
                .ring
                .iter()
                .position(|e| e.primary_id() == primary_id && e.hash > key_hash)
            {
                idx = replica_idx;
            }
        }

        let entry = *self.ring.get(idx);
        tracing::debug!(
            doc = request.doc_name(),
            primary = entry.primary_id(),
            via = entry.id,
            "routing request"
        );
        let server = self.servers.get_mut(&entry.primary_id())?;
        Some(server.handle_request(entry.id, request, sink))
    }

    /// Read-only topology summary: one header line, then one line per
    /// primary in id order.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "servers: {}, ring entries: {}",
            self.servers.len(),
            self.ring.len()
        );
        let mut ids: Vec<u32> = self.servers.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            let server = &self.servers[&id];
            let _ = writeln!(
                out,
                "  server {}: {} documents, {} pending edits",
                id,
                server.store_len(),
                server.pending_edits()
            );
        }
        out
    }
}

/// Whether a key found on the donor falls into the arc the new entry
/// claimed, expressed in terms of the entry's placement on the ring.
fn should_redistribute(
    placement: Placement,
    new_hash: u32,
    donor_hash: u32,
    key_hash: u32,
) -> bool {
    match placement {
        Placement::Front => key_hash > donor_hash || key_hash <= new_hash,
        Placement::Middle => key_hash <= new_hash,
        Placement::Back => key_hash > donor_hash && key_hash <= new_hash,
    }
}
