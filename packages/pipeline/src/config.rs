//! Pipeline configuration, populated from environment variables.

use std::collections::BTreeMap;

use belgraph::resolve::NamespaceTargets;

/// Runtime configuration for the nanopub pipeline.
///
/// All fields are populated from environment variables with defaults, so the
/// CLI runs with zero configuration (offline, no term store).
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `BELGRAPH_API` | (absent = offline) | Base URL of the term store API |
/// | `BELGRAPH_BEL_VERSION` | `2.0.0` | BEL version assumed for bare statements |
/// | `BELGRAPH_NAMESPACE_TARGETS` | `HGNC=EG,SP;MGI=EG,SP;RGD=EG,SP` | Canonicalization targets, `PREFIX=T1,T2;…` |
/// | `BELGRAPH_CONCURRENCY` | `4` | Nanopubs processed concurrently |
/// | `BELGRAPH_TIMEOUT_SECS` | `30` | Per-request term store timeout |
/// | `BELGRAPH_RETRY_ATTEMPTS` | `3` | Term store attempts before giving up |
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Term store base URL. `None` runs offline: terms pass through
    /// unresolved.
    pub api_base: Option<String>,

    /// Default BEL version for statements outside a nanopub.
    pub default_version: String,

    /// Canonicalization targets per namespace prefix.
    pub namespace_targets: NamespaceTargets,

    /// Maximum nanopubs in flight at once.
    pub concurrency: usize,

    pub request_timeout_secs: u64,

    pub retry_attempts: u32,
}

impl PipelineConfig {
    /// Populate config from environment variables, applying defaults where
    /// absent.
    pub fn from_env() -> Self {
        let namespace_targets = std::env::var("BELGRAPH_NAMESPACE_TARGETS")
            .map(|raw| parse_namespace_targets(&raw))
            .unwrap_or_else(|_| default_namespace_targets());

        Self {
            api_base: std::env::var("BELGRAPH_API").ok(),
            default_version: std::env::var("BELGRAPH_BEL_VERSION")
                .unwrap_or_else(|_| "2.0.0".into()),
            namespace_targets,
            concurrency: std::env::var("BELGRAPH_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4),
            request_timeout_secs: std::env::var("BELGRAPH_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            retry_attempts: std::env::var("BELGRAPH_RETRY_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
        }
    }
}

/// The stock canonicalization preferences: species gene namespaces resolve
/// to Entrez Gene, falling back to SwissProt.
pub fn default_namespace_targets() -> NamespaceTargets {
    let mut targets = BTreeMap::new();
    for prefix in ["HGNC", "MGI", "RGD"] {
        targets.insert(prefix.to_string(), vec!["EG".to_string(), "SP".to_string()]);
    }
    targets
}

/// Parse `PREFIX=T1,T2;PREFIX2=T3` into a target map. Empty segments are
/// ignored.
fn parse_namespace_targets(raw: &str) -> NamespaceTargets {
    let mut targets = BTreeMap::new();
    for entry in raw.split(';') {
        let Some((prefix, list)) = entry.split_once('=') else {
            continue;
        };
        let prefixes: Vec<String> = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if !prefix.trim().is_empty() && !prefixes.is_empty() {
            targets.insert(prefix.trim().to_string(), prefixes);
        }
    }
    targets
}

// --- tests -------------------------------------------------------------------
