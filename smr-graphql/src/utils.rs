use serde::Serialize;
use std::num::Wrapping;
use tracing::warn;

/// djb2 over the query text. Used as the base for operation keys.
pub fn hash_query(query: &str) -> u32 {
    let mut h = Wrapping(5381u32);
    for byte in query.bytes() {
        h = (h << 5) + h + Wrapping(byte as u32);
    }
    h.0
}

/// When we have separate values it's useful to run a progressive
/// version of djb2 where we pretend that we're still looping over
/// the same value.
///
/// Variables are hashed in their JSON form so the result is stable across platforms.
pub fn progressive_hash<V: Serialize>(h: u32, x: &V) -> u64 {
    let x = serde_json::to_vec(x).unwrap_or_else(|e| {
        warn!("Failed to serialize variables for hashing: {}", e);
        Vec::new()
    });

    let mut h = Wrapping(h as u64);

    for byte in x {
        h = (h << 5) + h + Wrapping(byte as u64)
    }

    h.0
}
