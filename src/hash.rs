//! Placement hashes.
//!
//! Both the document-name hash and the server-id hash decide positions on
//! the hash ring, so they must be stable and byte-exact across hosts and
//! test runs. They are deliberately written out instead of delegating to a
//! hasher crate: any change to either function silently remaps the whole
//! cluster.

/// Hashes a document name to its ring position (djb2 over the UTF-8 bytes).
pub fn hash_doc_name(name: &str) -> u32 {
    let mut hash: u32 = 5381;
    for &byte in name.as_bytes() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_add(hash)
            .wrapping_add(byte as u32);
    }
    hash
}

/// Hashes a server id to its ring position (xor-fold multiply).
///
/// Distinct from [`hash_doc_name`] so that servers and documents spread
/// independently over the ring.
pub fn hash_server_id(id: u32) -> u32 {
    let mut key = id;
    key = ((key >> 16) ^ key).wrapping_mul(0x45d9f3b);
    key = ((key >> 16) ^ key).wrapping_mul(0x45d9f3b);
    (key >> 16) ^ key
}
