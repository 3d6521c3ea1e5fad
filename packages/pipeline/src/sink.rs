//! Graph sink abstraction and implementations.
//!
//! The [`GraphSink`] trait is the write side of the pipeline: a linear
//! stream of `(collection, document)` pairs where every document carries a
//! content-derived `_key`. Sinks must treat writes as **idempotent upserts
//! by key** — duplicate keys arrive routinely (the same term appearing in
//! many edges, retried batches) and must collapse, never append.
//!
//! # Implementations
//!
//! | Type | When to use |
//! |------|-------------|
//! | [`MemorySink`] | Tests and in-process consumers |
//! | [`JsonlSink`] | Staging export for a downstream bulk loader |

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;

/// Target collection for one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Nodes,
    Edges,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Nodes => "nodes",
            Collection::Edges => "edges",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors a sink can return.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not acceptable (e.g. missing `_key`).
    #[error("rejected document: {0}")]
    Rejected(String),

    /// An unexpected error in the underlying store.
    #[error("sink backend error: {0}")]
    Backend(String),
}

/// The write contract for a graph store.
///
/// Implementations must be `Send + Sync + 'static` so they can be shared as
/// an `Arc<dyn GraphSink>` across processing tasks.
#[async_trait]
pub trait GraphSink: Send + Sync + 'static {
    /// Upsert one document by its `_key`. Re-submitting the same key must be
    /// safe and idempotent.
    async fn upsert(&self, collection: Collection, document: Value) -> Result<(), SinkError>;
}

/// Read the `_key` field a document must carry.
fn document_key(document: &Value) -> Result<String, SinkError> {
    document
        .get("_key")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| SinkError::Rejected("document has no _key field".into()))
}

// ---------------------------------------------------------------------------
// MemorySink
// ---------------------------------------------------------------------------

/// Thread-safe in-memory sink. Upserts by `(collection, _key)`.
#[derive(Debug, Default)]
pub struct MemorySink {
    inner: RwLock<HashMap<(Collection, String), Value>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct documents in a collection.
    pub fn len(&self, collection: Collection) -> usize {
        self.inner
            .read()
            .unwrap()
            .keys()
            .filter(|(c, _)| *c == collection)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().is_empty()
    }

    /// Fetch a document by key.
    pub fn get(&self, collection: Collection, key: &str) -> Option<Value> {
        self.inner
            .read()
            .unwrap()
            .get(&(collection, key.to_string()))
            .cloned()
    }

    /// All documents of a collection, in unspecified order.
    pub fn documents(&self, collection: Collection) -> Vec<Value> {
        self.inner
            .read()
            .unwrap()
            .iter()
            .filter(|((c, _), _)| *c == collection)
            .map(|(_, doc)| doc.clone())
            .collect()
    }
}

#[async_trait]
impl GraphSink for MemorySink {
    async fn upsert(&self, collection: Collection, document: Value) -> Result<(), SinkError> {
        let key = document_key(&document)?;
        self.inner
            .write()
            .unwrap()
            .insert((collection, key), document);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JsonlSink
// ---------------------------------------------------------------------------

/// Staging sink that appends `{"collection": …, "document": …}` lines to a
/// file for a downstream bulk loader.
///
/// The file is a write stream, so the upsert collapse happens at load time —
/// the loader keys on `_key` like any other sink. Duplicate lines are
/// therefore harmless, just redundant.
pub struct JsonlSink {
    writer: Mutex<BufWriter<File>>,
}

impl JsonlSink {
    /// Create (truncate) the staging file.
    pub async fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let file = File::create(path).await?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Flush buffered lines to disk.
    pub async fn flush(&self) -> Result<(), SinkError> {
        self.writer.lock().await.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl GraphSink for JsonlSink {
    async fn upsert(&self, collection: Collection, document: Value) -> Result<(), SinkError> {
        document_key(&document)?;
        let line = json!({
            "collection": collection.as_str(),
            "document": document,
        });
        let mut writer = self.writer.lock().await;
        writer
            .write_all(format!("{line}\n").as_bytes())
            .await?;
        Ok(())
    }
}

/// Drive a stream of documents into a sink. Returns how many documents were
/// submitted.
pub async fn load_documents(
    sink: &dyn GraphSink,
    documents: impl IntoIterator<Item = (Collection, Value)>,
) -> Result<usize, SinkError> {
    let mut count = 0;
    for (collection, document) in documents {
        sink.upsert(collection, document).await?;
        count += 1;
    }
    Ok(count)
}

// --- tests -------------------------------------------------------------------
