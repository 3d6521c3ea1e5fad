//! Collaborator contracts for namespace-term resolution and orthology
//! mapping.
//!
//! The engine never talks to a term store directly; it goes through these
//! traits. Implementations live outside this crate (an HTTP client, a
//! prefetched cache, a test fixture). Resolution failures are recoverable:
//! the engine leaves the term unresolved and records a message rather than
//! aborting the statement.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::ast::NsArg;

/// Ordered canonicalization targets per namespace prefix, e.g.
/// `{"HGNC": ["EG", "SP"]}`: rewrite HGNC terms to EG, falling back to SP.
///
/// A `BTreeMap` keeps iteration deterministic, which keeps downstream
/// hashing reproducible across runs.
pub type NamespaceTargets = BTreeMap<String, Vec<String>>;

/// A term-level resolution failure. Recoverable: the engine keeps the
/// original term.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("term resolution failed for {term}: {reason}")]
pub struct ResolutionError {
    pub term: String,
    pub reason: String,
}

impl ResolutionError {
    pub fn new(term: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            reason: reason.into(),
        }
    }
}

/// Maps namespace terms to canonical and preferred (label) forms.
pub trait TermResolver {
    /// The canonical form of `term`, preferring the ordered namespace list
    /// configured for its prefix in `targets`.
    ///
    /// `Ok(None)` means no mapping is configured or known — the caller keeps
    /// the term unchanged. Resolving an already-canonical term must return
    /// the term itself (or `None`), so canonicalization is idempotent.
    fn canonical(
        &self,
        term: &NsArg,
        targets: &NamespaceTargets,
    ) -> Result<Option<NsArg>, ResolutionError>;

    /// The preferred human-readable form of `term`, used for labels only.
    /// `Ok(None)` means no preferred form is known.
    fn label(&self, term: &NsArg) -> Result<Option<NsArg>, ResolutionError>;
}

/// Result of an orthology lookup for one term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Orthology {
    /// An equivalent term exists in the target species.
    Translated(NsArg),
    /// The term's namespace is not species-scoped; nothing to translate.
    NotSpeciesScoped,
    /// The namespace is species-scoped but no ortholog is known. The caller
    /// keeps the term and flags the statement as partially orthologized.
    NotFound,
}

/// Maps species-scoped terms across species.
pub trait OrthologyResolver {
    fn ortholog(&self, term: &NsArg, target_taxon: &str)
        -> Result<Orthology, ResolutionError>;
}

/// A resolver that resolves nothing. Canonicalization and labels pass every
/// term through unchanged; useful for offline runs and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullResolver;

impl TermResolver for NullResolver {
    fn canonical(
        &self,
        _term: &NsArg,
        _targets: &NamespaceTargets,
    ) -> Result<Option<NsArg>, ResolutionError> {
        Ok(None)
    }

    fn label(&self, _term: &NsArg) -> Result<Option<NsArg>, ResolutionError> {
        Ok(None)
    }
}

impl OrthologyResolver for NullResolver {
    fn ortholog(
        &self,
        _term: &NsArg,
        _target_taxon: &str,
    ) -> Result<Orthology, ResolutionError> {
        Ok(Orthology::NotSpeciesScoped)
    }
}
