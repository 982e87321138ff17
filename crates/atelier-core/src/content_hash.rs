//! Content addressing over raw file bytes.
//!
//! The hash is recorded on the catalog row for caller-side change
//! detection only. It is never the asset's identity: two byte-identical
//! uploads still produce two distinct assets.

/// Compute the BLAKE3 hash of data with a "blake3:" prefix.
///
/// Returns a string in the format: `blake3:{64-char-hex}`
pub fn compute_content_hash(data: &[u8]) -> String {
    let hash = blake3::hash(data);
    format!("blake3:{}", hash.to_hex())
}
