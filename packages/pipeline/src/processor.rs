//! Concurrent nanopub processing.
//!
//! [`Processor::run`] drains a nanopub source, processes nanopubs in
//! bounded-concurrency tasks, and streams the materialized node and edge
//! documents into the sink. Nanopubs are independent: a fatal version-gate
//! error on one is logged and counted, never propagated to its siblings.
//!
//! Per nanopub the flow is: parse once to collect namespace terms → prefetch
//! their resolutions (when a term store is configured) → `create_edges` →
//! materialize each edge → upsert documents. Because every document key is
//! content-derived, re-processing or retrying is safe — the sink collapses
//! duplicates.

use std::sync::Arc;

use belgraph::ast::NsArg;
use belgraph::edge::{materialize, StoreDocuments};
use belgraph::engine::{create_edges, EdgeOptions, EngineContext, MessageLevel};
use belgraph::nanopub::Nanopub;
use belgraph::spec::{SpecCatalog, Specification};
use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::client::{ResolutionCache, TermApiClient};
use crate::parser::ReferenceParser;
use crate::sink::{Collection, GraphSink, SinkError};
use crate::source::SourceError;

/// Summary counters for one processing run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessSummary {
    /// Nanopubs that produced an edge list (possibly with messages).
    pub nanopubs: usize,
    /// Nanopubs rejected at the version gate or by the source/sink.
    pub failed: usize,
    /// Edges produced (primary and computed).
    pub edges: usize,
    /// Documents submitted to the sink.
    pub documents: usize,
    /// Validation messages collected across all nanopubs.
    pub messages: usize,
}

impl ProcessSummary {
    fn absorb(&mut self, other: ProcessSummary) {
        self.nanopubs += other.nanopubs;
        self.failed += other.failed;
        self.edges += other.edges;
        self.documents += other.documents;
        self.messages += other.messages;
    }
}

/// Shared, read-only state for one processing run.
pub struct Processor {
    pub catalog: Arc<SpecCatalog>,
    pub parser: ReferenceParser,
    /// Term store client; `None` runs offline (terms pass through unchanged).
    pub client: Option<Arc<TermApiClient>>,
    pub sink: Arc<dyn GraphSink>,
    pub options: EdgeOptions,
    /// Maximum nanopubs processed concurrently.
    pub concurrency: usize,
}

impl Processor {
    /// Drain `source`, processing nanopubs concurrently, and return the
    /// combined summary.
    pub async fn run(
        &self,
        source: impl Iterator<Item = Result<belgraph::nanopub::NanopubDoc, SourceError>>,
    ) -> ProcessSummary {
        let semaphore = Arc::new(Semaphore::new(self.concurrency.max(1)));
        let mut tasks: JoinSet<ProcessSummary> = JoinSet::new();
        let mut summary = ProcessSummary::default();

        for document in source {
            let nanopub = match document {
                Ok(doc) => doc.nanopub,
                Err(e) => {
                    error!("skipping unreadable nanopub: {e}");
                    summary.failed += 1;
                    continue;
                }
            };

            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .expect("semaphore closed");
            let catalog = Arc::clone(&self.catalog);
            let parser = self.parser;
            let client = self.client.clone();
            let sink = Arc::clone(&self.sink);
            let options = self.options.clone();

            tasks.spawn(async move {
                let _permit = permit;
                process_one(&nanopub, &catalog, parser, client.as_ref(), &*sink, &options).await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(nanopub_summary) => summary.absorb(nanopub_summary),
                Err(e) => {
                    error!("nanopub task failed: {e}");
                    summary.failed += 1;
                }
            }
        }

        info!(
            "processed {} nanopubs ({} failed): {} edges, {} documents, {} messages",
            summary.nanopubs, summary.failed, summary.edges, summary.documents, summary.messages
        );
        summary
    }
}

/// Process one nanopub end to end.
async fn process_one(
    nanopub: &Nanopub,
    catalog: &SpecCatalog,
    parser: ReferenceParser,
    client: Option<&Arc<TermApiClient>>,
    sink: &dyn GraphSink,
    options: &EdgeOptions,
) -> ProcessSummary {
    let mut summary = ProcessSummary::default();
    let nanopub_id = nanopub.id.as_deref().unwrap_or("<unnamed>");

    // Prefetch resolutions for every term this nanopub mentions.
    let cache = match (client, catalog.get(&nanopub.kind.version)) {
        (Some(client), Ok(spec)) => {
            let terms = collect_terms(nanopub, parser, spec);
            Arc::clone(client)
                .prefetch(
                    terms,
                    &options.namespace_targets,
                    options.orthologize_target.as_deref(),
                )
                .await
        }
        _ => ResolutionCache::default(),
    };

    // Scoped so the context (which holds non-Sync trait objects) is gone
    // before the first sink await; the task future must stay Send.
    let result = {
        let ctx = EngineContext {
            catalog,
            parser: &parser,
            resolver: &cache,
            orthology: Some(&cache),
        };
        create_edges(nanopub, &ctx, options)
    };
    let output = match result {
        Ok(output) => output,
        Err(e) => {
            error!("nanopub {nanopub_id}: {e}");
            summary.failed += 1;
            return summary;
        }
    };

    for message in &output.messages {
        match message.level {
            MessageLevel::Error => warn!("nanopub {nanopub_id}: {}", message.message),
            _ => info!("nanopub {nanopub_id}: {}", message.message),
        }
    }
    summary.messages = output.messages.len();
    summary.edges = output.edges.len();
    summary.nanopubs = 1;

    for edge in &output.edges {
        let documents = match materialize(edge, Utc::now()) {
            Ok(documents) => documents,
            Err(e) => {
                error!("nanopub {nanopub_id}: failed to materialize edge: {e}");
                continue;
            }
        };
        match submit(sink, documents).await {
            Ok(count) => summary.documents += count,
            Err(e) => error!("nanopub {nanopub_id}: sink write failed: {e}"),
        }
    }

    summary
}

/// Submit one edge's documents to the sink, nodes before the relation that
/// references them.
async fn submit(sink: &dyn GraphSink, documents: StoreDocuments) -> Result<usize, SinkError> {
    let mut count = 0;
    sink.upsert(Collection::Nodes, documents.subject).await?;
    count += 1;
    if let Some(object) = documents.object {
        sink.upsert(Collection::Nodes, object).await?;
        count += 1;
    }
    sink.upsert(Collection::Edges, documents.relation).await?;
    count += 1;
    Ok(count)
}

/// Parse each assertion once and collect every namespace term, for the
/// resolution prefetch. Unparseable assertions contribute nothing here —
/// `create_edges` reports them properly.
pub fn collect_terms(
    nanopub: &Nanopub,
    parser: ReferenceParser,
    spec: &Specification,
) -> Vec<NsArg> {
    use belgraph::engine::AssertionParser;

    let mut terms = Vec::new();
    for assertion in &nanopub.assertions {
        if let Ok(statement) = parser.parse(&assertion.statement_text(), spec) {
            terms.extend(statement.namespace_terms().into_iter().cloned());
        }
    }
    terms
}

// --- tests -------------------------------------------------------------------
