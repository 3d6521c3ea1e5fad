//! Content-addressed key derivation.
//!
//! Two key forms are used by the materializer:
//!
//! - [`content_hash`]: SHA-256 over a canonical statement string, used for
//!   `edge_hash`.
//! - [`document_key`]: SHA-256 over the JCS (RFC 8785) canonical JSON bytes
//!   of a document, used for node and edge `_key`s. JCS sorts object keys,
//!   so field ordering in memory never leaks into the key.
//!
//! Identical content always yields the identical key — the deduplication
//! invariant the graph sink's upsert semantics rely on.

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors returned by [`document_key`].
#[derive(Debug, Error)]
pub enum HashError {
    #[error("canonicalization failed: {0}")]
    Canonicalization(String),
}

/// SHA-256 of a string, hex-encoded.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// SHA-256 of a document's JCS canonical bytes, hex-encoded.
pub fn document_key<T: Serialize>(document: &T) -> Result<String, HashError> {
    let value = serde_json::to_value(document)
        .map_err(|e| HashError::Canonicalization(e.to_string()))?;
    let canonical =
        serde_jcs::to_vec(&value).map_err(|e| HashError::Canonicalization(e.to_string()))?;
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    Ok(hex::encode(hasher.finalize()))
}

// --- tests -------------------------------------------------------------------
