//! HTTP client for the external term store, and the prefetched resolution
//! cache the engine consumes.
//!
//! The engine's resolver traits are synchronous; network resolution is not.
//! The bridge is [`TermApiClient::prefetch`]: given the distinct namespace
//! terms of a nanopub it resolves them **concurrently per term** under a
//! bounded semaphore (retrying with backoff at this boundary) and returns a
//! [`ResolutionCache`] — a plain map the engine can consult without
//! suspending. Errors for individual terms are logged and leave those terms
//! unresolved; they never fail the nanopub.
//!
//! # Term store endpoints
//!
//! | Request | Response |
//! |---------|----------|
//! | `GET {base}/terms/{term}/canonical?targets=EG,SP` | `{"term": "EG:207"}`, 404 when no mapping |
//! | `GET {base}/terms/{term}/label` | `{"term": "HGNC:AKT1"}`, 404 when none known |
//! | `GET {base}/terms/{term}/orthologs/{taxon}` | `{"term": "EG:11651", "scoped": true}`; `"term": null` with `"scoped": true` when no ortholog exists; `"scoped": false` or 404 when the namespace is not species-scoped |

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use belgraph::ast::NsArg;
use belgraph::resolve::{
    NamespaceTargets, Orthology, OrthologyResolver, ResolutionError, TermResolver,
};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Semaphore;
use tracing::warn;

/// Errors from the term store client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request or response failed after all retries.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The term store returned a non-2xx, non-404 status after all retries.
    #[error("term store returned status {0}")]
    BadStatus(u16),
}

/// Retry settings for term store requests. Backoff grows linearly with the
/// attempt number.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(250),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TermResponse {
    term: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrthologResponse {
    term: Option<String>,
    #[serde(default = "default_scoped")]
    scoped: bool,
}

fn default_scoped() -> bool {
    true
}

/// Client for the external term store.
///
/// Holds a cloneable [`reqwest::Client`] (which pools connections
/// internally); one instance is shared across all processing tasks.
pub struct TermApiClient {
    client: Client,
    api_base: String,
    retry: RetryPolicy,
    concurrency: Arc<Semaphore>,
}

impl TermApiClient {
    /// Create a client for `api_base` (e.g. `"https://api.bel.example/v1"`).
    ///
    /// `concurrency` bounds how many term resolutions are in flight at once
    /// during [`prefetch`](Self::prefetch).
    pub fn new(client: Client, api_base: impl Into<String>, retry: RetryPolicy, concurrency: usize) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            retry,
            concurrency: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Resolve every distinct term once and return the filled cache.
    ///
    /// Each term's chain (canonical → ortholog → labels) runs as its own
    /// task; failures are logged per term and leave the term unresolved.
    pub async fn prefetch(
        self: Arc<Self>,
        terms: impl IntoIterator<Item = NsArg>,
        targets: &NamespaceTargets,
        orthologize_target: Option<&str>,
    ) -> ResolutionCache {
        let distinct: HashSet<NsArg> = terms.into_iter().collect();
        let mut tasks = tokio::task::JoinSet::new();

        for term in distinct {
            let client = Arc::clone(&self);
            let targets = targets.clone();
            let taxon = orthologize_target.map(str::to_string);
            tasks.spawn(async move {
                let _permit = client
                    .concurrency
                    .acquire()
                    .await
                    .expect("semaphore closed");
                client.resolve_chain(term, &targets, taxon.as_deref()).await
            });
        }

        let mut cache = ResolutionCache::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entry) => cache.merge(entry),
                Err(e) => warn!("term resolution task failed: {e}"),
            }
        }
        cache
    }

    /// Resolve one term end to end: canonical form, ortholog in the target
    /// species, and labels for every form the engine may need to render.
    async fn resolve_chain(
        &self,
        term: NsArg,
        targets: &NamespaceTargets,
        taxon: Option<&str>,
    ) -> CacheEntry {
        let mut entry = CacheEntry::default();

        let canonical = match self.canonical(&term, targets).await {
            Ok(found) => found,
            Err(e) => {
                warn!("canonical lookup failed for {term}: {e}");
                let failure = ResolutionError::new(term.to_string(), e.to_string());
                entry.failed = Some((term, failure));
                return entry;
            }
        };
        let base = canonical.clone().unwrap_or_else(|| term.clone());
        if let Some(canonical) = canonical {
            entry.canonical.push((term.clone(), canonical));
        }

        if let Some(taxon) = taxon {
            match self.ortholog(&base, taxon).await {
                Ok(orthology) => {
                    if let Orthology::Translated(translated) = &orthology {
                        self.fetch_label(translated, &mut entry).await;
                    }
                    entry.orthologs.push((base.clone(), taxon.to_string(), orthology));
                }
                Err(e) => warn!("orthology lookup failed for {base}: {e}"),
            }
        }

        self.fetch_label(&base, &mut entry).await;
        entry
    }

    async fn fetch_label(&self, term: &NsArg, entry: &mut CacheEntry) {
        match self.label(term).await {
            Ok(Some(label)) => entry.labels.push((term.clone(), label)),
            Ok(None) => {}
            Err(e) => warn!("label lookup failed for {term}: {e}"),
        }
    }

    /// `GET /terms/{term}/canonical?targets=…`
    pub async fn canonical(
        &self,
        term: &NsArg,
        targets: &NamespaceTargets,
    ) -> Result<Option<NsArg>, ClientError> {
        let Some(prefixes) = targets.get(&term.namespace) else {
            // Namespace has no configured target; nothing to ask for.
            return Ok(None);
        };
        let url = format!(
            "{}/terms/{}/canonical?targets={}",
            self.api_base,
            urlencoding::encode(&term.to_string()),
            urlencoding::encode(&prefixes.join(","))
        );
        let response: Option<TermResponse> = self.get_json(&url).await?;
        Ok(response
            .and_then(|r| r.term)
            .and_then(|t| parse_term(&t)))
    }

    /// `GET /terms/{term}/label`
    pub async fn label(&self, term: &NsArg) -> Result<Option<NsArg>, ClientError> {
        let url = format!(
            "{}/terms/{}/label",
            self.api_base,
            urlencoding::encode(&term.to_string())
        );
        let response: Option<TermResponse> = self.get_json(&url).await?;
        Ok(response
            .and_then(|r| r.term)
            .and_then(|t| parse_term(&t)))
    }

    /// `GET /terms/{term}/orthologs/{taxon}`
    pub async fn ortholog(
        &self,
        term: &NsArg,
        taxon: &str,
    ) -> Result<Orthology, ClientError> {
        let url = format!(
            "{}/terms/{}/orthologs/{}",
            self.api_base,
            urlencoding::encode(&term.to_string()),
            urlencoding::encode(taxon)
        );
        let response: Option<OrthologResponse> = self.get_json(&url).await?;
        Ok(match response {
            None => Orthology::NotSpeciesScoped,
            Some(r) if !r.scoped => Orthology::NotSpeciesScoped,
            Some(r) => match r.term.as_deref().and_then(parse_term) {
                Some(translated) => Orthology::Translated(translated),
                None => Orthology::NotFound,
            },
        })
    }

    /// GET with retry/backoff. 404 is `Ok(None)`; other non-2xx statuses and
    /// transport errors are retried up to the policy's attempt count.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
    ) -> Result<Option<T>, ClientError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let outcome = self.client.get(url).send().await;
            match outcome {
                Ok(response) if response.status().as_u16() == 404 => return Ok(None),
                Ok(response) if response.status().is_success() => {
                    return Ok(Some(response.json().await?));
                }
                Ok(response) if attempt >= self.retry.attempts => {
                    return Err(ClientError::BadStatus(response.status().as_u16()));
                }
                Err(e) if attempt >= self.retry.attempts => return Err(ClientError::Http(e)),
                _ => {}
            }
            tokio::time::sleep(self.retry.backoff * attempt).await;
        }
    }
}

/// Parse a `"PREFIX:value"` response string into a term. Quotes around the
/// value are stripped.
fn parse_term(s: &str) -> Option<NsArg> {
    let (prefix, value) = s.split_once(':')?;
    if prefix.is_empty() || value.is_empty() {
        return None;
    }
    Some(NsArg::new(prefix, value.trim_matches('"')))
}

// ---------------------------------------------------------------------------
// ResolutionCache
// ---------------------------------------------------------------------------

/// One term's contribution to the cache.
#[derive(Debug, Default)]
struct CacheEntry {
    canonical: Vec<(NsArg, NsArg)>,
    labels: Vec<(NsArg, NsArg)>,
    orthologs: Vec<(NsArg, String, Orthology)>,
    failed: Option<(NsArg, ResolutionError)>,
}

/// A prefetched, synchronous view of the term store.
///
/// Implements the engine's resolver traits over plain maps: a canonical or
/// label miss resolves to "no mapping known" (term kept as-is), an orthology
/// miss to "not species-scoped". The namespace-target preference was applied
/// when the cache was filled, so `canonical` ignores its `targets` argument.
///
/// Doubles as the static resolver for tests and offline runs — build one
/// with the `with_*` methods.
#[derive(Debug, Default, Clone)]
pub struct ResolutionCache {
    canonical: HashMap<NsArg, NsArg>,
    labels: HashMap<NsArg, NsArg>,
    orthologs: HashMap<(NsArg, String), Orthology>,
    failed: HashMap<NsArg, ResolutionError>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_canonical(mut self, from: NsArg, to: NsArg) -> Self {
        self.canonical.insert(from, to);
        self
    }

    pub fn with_label(mut self, from: NsArg, to: NsArg) -> Self {
        self.labels.insert(from, to);
        self
    }

    pub fn with_ortholog(mut self, from: NsArg, taxon: impl Into<String>, result: Orthology) -> Self {
        self.orthologs.insert((from, taxon.into()), result);
        self
    }

    fn merge(&mut self, entry: CacheEntry) {
        for (from, to) in entry.canonical {
            self.canonical.insert(from, to);
        }
        for (from, to) in entry.labels {
            self.labels.insert(from, to);
        }
        for (from, taxon, result) in entry.orthologs {
            self.orthologs.insert((from, taxon), result);
        }
        if let Some((term, failure)) = entry.failed {
            self.failed.insert(term, failure);
        }
    }
}

impl TermResolver for ResolutionCache {
    fn canonical(
        &self,
        term: &NsArg,
        _targets: &NamespaceTargets,
    ) -> Result<Option<NsArg>, ResolutionError> {
        if let Some(failure) = self.failed.get(term) {
            return Err(failure.clone());
        }
        Ok(self.canonical.get(term).cloned())
    }

    fn label(&self, term: &NsArg) -> Result<Option<NsArg>, ResolutionError> {
        Ok(self.labels.get(term).cloned())
    }
}

impl OrthologyResolver for ResolutionCache {
    fn ortholog(
        &self,
        term: &NsArg,
        target_taxon: &str,
    ) -> Result<Orthology, ResolutionError> {
        Ok(self
            .orthologs
            .get(&(term.clone(), target_taxon.to_string()))
            .cloned()
            .unwrap_or(Orthology::NotSpeciesScoped))
    }
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn parse_term_strips_quotes() {
        assert_eq!(
            parse_term("GO:\"kinase activity\""),
            Some(NsArg::new("GO", "kinase activity"))
        );
        assert_eq!(parse_term("EG:207"), Some(NsArg::new("EG", "207")));
        assert_eq!(parse_term("no-colon"), None);
    }

    #[test]
    fn cache_resolves_configured_terms() {
        let cache = ResolutionCache::new()
            .with_canonical(NsArg::new("HGNC", "AKT1"), NsArg::new("EG", "207"))
            .with_label(NsArg::new("EG", "207"), NsArg::new("HGNC", "AKT1"));

        let targets = BTreeMap::new();
        assert_eq!(
            cache
                .canonical(&NsArg::new("HGNC", "AKT1"), &targets)
                .unwrap(),
            Some(NsArg::new("EG", "207"))
        );
        assert_eq!(
            cache.canonical(&NsArg::new("HGNC", "TP53"), &targets).unwrap(),
            None
        );
        assert_eq!(
            cache.label(&NsArg::new("EG", "207")).unwrap(),
            Some(NsArg::new("HGNC", "AKT1"))
        );
    }

    #[test]
    fn cache_orthology_defaults_to_not_scoped() {
        let cache = ResolutionCache::new().with_ortholog(
            NsArg::new("EG", "207"),
            "TAX:10090",
            Orthology::Translated(NsArg::new("EG", "11651")),
        );
        assert_eq!(
            cache
                .ortholog(&NsArg::new("EG", "207"), "TAX:10090")
                .unwrap(),
            Orthology::Translated(NsArg::new("EG", "11651"))
        );
        assert_eq!(
            cache
                .ortholog(&NsArg::new("GO", "apoptotic process"), "TAX:10090")
                .unwrap(),
            Orthology::NotSpeciesScoped
        );
    }
}
