//! Async runtime layer for the `belgraph` engine.
//!
//! The core crate is pure and synchronous; this crate supplies everything
//! around it that touches the outside world:
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`parser`] | Spec-driven reference parser for BEL statement text |
//! | [`client`] | Term store HTTP client, bounded-concurrency prefetch, resolution cache |
//! | [`source`] | Lazy nanopub readers for `.json` / `.jsonl` files |
//! | [`sink`] | Graph sink trait with in-memory and JSON Lines implementations |
//! | [`processor`] | Concurrent nanopub-to-documents pipeline |
//! | [`config`] | Environment-driven configuration |
//!
//! Nanopubs have no ordering dependency on each other, so the processor runs
//! them in parallel tasks; the only shared state is the read-only
//! specification catalog and the term store client.

pub mod client;
pub mod config;
pub mod parser;
pub mod processor;
pub mod sink;
pub mod source;

pub use client::{ClientError, ResolutionCache, RetryPolicy, TermApiClient};
pub use config::{default_namespace_targets, PipelineConfig};
pub use parser::ReferenceParser;
pub use processor::{collect_terms, ProcessSummary, Processor};
pub use sink::{load_documents, Collection, GraphSink, JsonlSink, MemorySink, SinkError};
pub use source::{read_nanopubs, NanopubReader, SourceError};
