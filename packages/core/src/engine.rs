//! The engine entry point: nanopub in, edges and validation messages out.
//!
//! [`create_edges`] runs every assertion of a nanopub through the pipeline
//!
//! ```text
//! PARSE → VALIDATE → CANONICALIZE → (ORTHOLOGIZE?) → EMIT_PRIMARY
//!       → INFER_COMPUTED → EMIT_COMPUTED
//! ```
//!
//! Assertions are independent: a parse or validation failure moves that
//! assertion to a terminal skipped state (recorded as a message) without
//! affecting its siblings. Only the nanopub-level version gate is fatal —
//! a non-BEL document or an unsupported BEL version aborts the whole nanopub
//! with a typed error.
//!
//! For a fixed specification version and namespace targets this function is
//! pure: the same nanopub always yields the byte-identical edge list,
//! content hashes included.

use serde::Serialize;
use thiserror::Error;

use crate::ast::Statement;
use crate::canon::{canonicalize, orthologize, orthologize_context};
use crate::compute::compute_edges;
use crate::edge::{make_edge, Edge, EdgeType};
use crate::nanopub::{enhance_annotations, Nanopub};
use crate::resolve::{NamespaceTargets, OrthologyResolver, TermResolver};
use crate::spec::{SpecCatalog, SpecError, Specification};
use crate::validate::validate_statement;

/// Parser collaborator contract. The text either matches the grammar of the
/// given specification's version and yields a statement tree with long-form
/// function and relation names, or fails with a positioned error.
pub trait AssertionParser {
    fn parse(&self, text: &str, spec: &Specification) -> Result<Statement, ParseError>;
}

/// A per-assertion parse failure. Recoverable: the assertion is skipped.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message} (position {position})")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// Fatal failures for a whole nanopub.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The document's type header does not declare a BEL nanopub.
    #[error("not a BEL nanopub (type name {0:?})")]
    NotBel(String),

    /// The declared BEL version is not in the catalog.
    #[error(transparent)]
    Spec(#[from] SpecError),
}

/// Severity of a collected validation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Warning,
    Error,
}

/// A recoverable condition observed while processing a nanopub, reported
/// alongside the edge list rather than thrown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationMessage {
    pub level: MessageLevel,
    pub message: String,
    /// Index of the assertion the message refers to, when assertion-scoped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertion: Option<usize>,
}

impl ValidationMessage {
    fn new(level: MessageLevel, message: impl Into<String>, assertion: Option<usize>) -> Self {
        Self {
            level,
            message: message.into(),
            assertion,
        }
    }
}

/// The collaborators the engine calls out to.
pub struct EngineContext<'a> {
    pub catalog: &'a SpecCatalog,
    pub parser: &'a dyn AssertionParser,
    pub resolver: &'a dyn TermResolver,
    /// Required only when an orthologize target is requested.
    pub orthology: Option<&'a dyn OrthologyResolver>,
}

/// Per-call options for [`create_edges`].
#[derive(Debug, Default, Clone)]
pub struct EdgeOptions {
    /// Canonicalization targets per namespace prefix.
    pub namespace_targets: NamespaceTargets,
    /// Computed-edge rule filter; see [`compute_edges`].
    pub rule_filter: Vec<String>,
    /// Species to orthologize into, e.g. `"TAX:10090"`. `None` disables
    /// orthologization.
    pub orthologize_target: Option<String>,
}

/// Everything a nanopub produced: the edge list (primary and computed,
/// assertion order) and the messages collected along the way. Treat as
/// partial success — messages may explain skipped assertions.
#[derive(Debug, Default)]
pub struct EngineOutput {
    pub edges: Vec<Edge>,
    pub messages: Vec<ValidationMessage>,
}

/// Process one nanopub into its edge list.
pub fn create_edges(
    nanopub: &Nanopub,
    ctx: &EngineContext<'_>,
    opts: &EdgeOptions,
) -> Result<EngineOutput, EngineError> {
    if !nanopub.kind.name.eq_ignore_ascii_case("BEL") {
        return Err(EngineError::NotBel(nanopub.kind.name.clone()));
    }
    let spec = ctx.catalog.get(&nanopub.kind.version)?;

    let mut annotations = enhance_annotations(nanopub.annotations.clone());
    if let Some(taxon) = &opts.orthologize_target {
        orthologize_context(taxon, &mut annotations);
    }

    let nanopub_id = nanopub.id.as_deref();
    let mut out = EngineOutput::default();

    for (index, assertion) in nanopub.assertions.iter().enumerate() {
        let text = assertion.statement_text();

        let mut statement = match ctx.parser.parse(&text, spec) {
            Ok(statement) => statement,
            Err(e) => {
                out.messages.push(ValidationMessage::new(
                    MessageLevel::Error,
                    format!("invalid statement {text:?}: {e}"),
                    Some(index),
                ));
                continue;
            }
        };

        if let Err(e) = validate_statement(&statement, spec) {
            out.messages.push(ValidationMessage::new(
                MessageLevel::Error,
                format!("statement {text:?} failed validation: {e}"),
                Some(index),
            ));
            continue;
        }

        let report = canonicalize(&mut statement, ctx.resolver, &opts.namespace_targets);
        for failure in &report.failures {
            out.messages.push(ValidationMessage::new(
                MessageLevel::Warning,
                format!("term left unresolved: {failure}"),
                Some(index),
            ));
        }

        if let Some(taxon) = &opts.orthologize_target {
            match ctx.orthology {
                Some(resolver) => {
                    let outcome = orthologize(&mut statement, resolver, taxon);
                    if !outcome.complete() {
                        let mut unchanged = outcome.missing.clone();
                        unchanged.extend(outcome.failures.iter().map(|f| f.term.clone()));
                        out.messages.push(ValidationMessage::new(
                            MessageLevel::Info,
                            format!(
                                "partially orthologized to {taxon}; terms left unchanged: {}",
                                unchanged.join(", ")
                            ),
                            Some(index),
                        ));
                    }
                }
                None => {
                    out.messages.push(ValidationMessage::new(
                        MessageLevel::Warning,
                        format!(
                            "orthologize target {taxon} requested but no orthology \
                             resolver is configured"
                        ),
                        Some(index),
                    ));
                }
            }
        }

        out.edges.push(make_edge(
            &statement,
            nanopub_id,
            EdgeType::Primary,
            &annotations,
            ctx.resolver,
        ));

        for computed in compute_edges(&statement, spec, &opts.rule_filter) {
            out.edges.push(make_edge(
                &computed,
                nanopub_id,
                EdgeType::Computed,
                &annotations,
                ctx.resolver,
            ));
        }
    }

    Ok(out)
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{FuncCall, FunctionClass, NsArg, StatementObject, Term};
    use crate::nanopub::{Annotation, Assertion, NanopubType};
    use crate::resolve::NullResolver;

    /// A parser stub good enough for engine-level tests: it understands the
    /// handful of fixture statements and rejects the literal `"<bad>"`.
    struct StubParser;

    fn p(value: &str) -> FuncCall {
        FuncCall::new(
            "proteinAbundance",
            FunctionClass::Primary,
            vec![Term::Namespace(NsArg::new("HGNC", value))],
        )
    }

    impl AssertionParser for StubParser {
        fn parse(&self, text: &str, _spec: &Specification) -> Result<Statement, ParseError> {
            match text {
                "p(HGNC:AKT1) increases p(HGNC:FOXO3)" => Ok(Statement::new(
                    p("AKT1"),
                    "increases",
                    StatementObject::Term(Term::Function(p("FOXO3"))),
                )),
                "complex(p(HGNC:MYD88), p(HGNC:IRAK1)) increases p(HGNC:AKT1)" => {
                    Ok(Statement::new(
                        FuncCall::new(
                            "complexAbundance",
                            FunctionClass::Primary,
                            vec![Term::Function(p("MYD88")), Term::Function(p("IRAK1"))],
                        ),
                        "increases",
                        StatementObject::Term(Term::Function(p("AKT1"))),
                    ))
                }
                "p(HGNC:TP53)" => Ok(Statement::subject_only(p("TP53"))),
                _ => Err(ParseError::new("failed parse", 0)),
            }
        }
    }

    fn nanopub(assertions: Vec<Assertion>) -> Nanopub {
        Nanopub {
            id: Some("np-test".into()),
            kind: NanopubType {
                name: "BEL".into(),
                version: "2.0.0".into(),
            },
            citation: None,
            assertions,
            annotations: vec![Annotation::new("Species", Some("TAX:9606".into()), None)],
            metadata: None,
        }
    }

    fn assertion(subject: &str, relation: Option<&str>, object: Option<&str>) -> Assertion {
        Assertion {
            subject: subject.into(),
            relation: relation.map(str::to_string),
            object: object.map(str::to_string),
        }
    }

    fn ctx<'a>(catalog: &'a SpecCatalog) -> EngineContext<'a> {
        EngineContext {
            catalog,
            parser: &StubParser,
            resolver: &NullResolver,
            orthology: None,
        }
    }

    #[test]
    fn non_bel_nanopub_is_fatal() {
        let catalog = SpecCatalog::builtin();
        let mut np = nanopub(vec![]);
        np.kind.name = "OpenBEL".into();
        assert!(matches!(
            create_edges(&np, &ctx(&catalog), &EdgeOptions::default()),
            Err(EngineError::NotBel(_))
        ));
    }

    #[test]
    fn unknown_version_is_fatal() {
        let catalog = SpecCatalog::builtin();
        let mut np = nanopub(vec![]);
        np.kind.version = "1.0.0".into();
        assert!(matches!(
            create_edges(&np, &ctx(&catalog), &EdgeOptions::default()),
            Err(EngineError::Spec(SpecError::UnknownVersion { .. }))
        ));
    }

    #[test]
    fn partial_failure_skips_only_the_bad_assertion() {
        let catalog = SpecCatalog::builtin();
        let np = nanopub(vec![
            assertion("p(HGNC:AKT1)", Some("increases"), Some("p(HGNC:FOXO3)")),
            assertion("<bad>", None, None),
            assertion("p(HGNC:TP53)", None, None),
        ]);
        let out = create_edges(&np, &ctx(&catalog), &EdgeOptions::default()).unwrap();
        // assertions #1 and #3 produce one primary edge each
        assert_eq!(out.edges.len(), 2);
        assert_eq!(out.messages.len(), 1);
        assert_eq!(out.messages[0].level, MessageLevel::Error);
        assert_eq!(out.messages[0].assertion, Some(1));
    }

    #[test]
    fn subject_only_assertion_yields_relationless_primary_edge() {
        let catalog = SpecCatalog::builtin();
        let np = nanopub(vec![assertion("p(HGNC:TP53)", None, None)]);
        let out = create_edges(&np, &ctx(&catalog), &EdgeOptions::default()).unwrap();
        assert_eq!(out.edges.len(), 1);
        assert!(out.edges[0].relation.relation.is_none());
        assert_eq!(out.edges[0].relation.edge_type, EdgeType::Primary);
    }

    #[test]
    fn computed_edges_follow_primary() {
        let catalog = SpecCatalog::builtin();
        let np = nanopub(vec![assertion(
            "complex(p(HGNC:MYD88), p(HGNC:IRAK1))",
            Some("increases"),
            Some("p(HGNC:AKT1)"),
        )]);
        let out = create_edges(&np, &ctx(&catalog), &EdgeOptions::default()).unwrap();
        assert_eq!(out.edges.len(), 3);
        assert_eq!(out.edges[0].relation.edge_type, EdgeType::Primary);
        assert!(out.edges[1..].iter().all(|e| {
            e.relation.edge_type == EdgeType::Computed
                && e.relation.relation.as_deref() == Some("hasComponent")
        }));
    }

    #[test]
    fn skip_filter_suppresses_computed_edges() {
        let catalog = SpecCatalog::builtin();
        let np = nanopub(vec![assertion(
            "complex(p(HGNC:MYD88), p(HGNC:IRAK1))",
            Some("increases"),
            Some("p(HGNC:AKT1)"),
        )]);
        let opts = EdgeOptions {
            rule_filter: vec!["skip".into()],
            ..Default::default()
        };
        let out = create_edges(&np, &ctx(&catalog), &opts).unwrap();
        assert_eq!(out.edges.len(), 1);
        assert_eq!(out.edges[0].relation.edge_type, EdgeType::Primary);
    }

    #[test]
    fn annotations_are_backfilled_onto_edges() {
        let catalog = SpecCatalog::builtin();
        let np = nanopub(vec![assertion("p(HGNC:TP53)", None, None)]);
        let out = create_edges(&np, &ctx(&catalog), &EdgeOptions::default()).unwrap();
        let annos = &out.edges[0].relation.annotations;
        assert_eq!(annos.len(), 1);
        // label backfilled from id
        assert_eq!(annos[0].id.as_deref(), Some("TAX:9606"));
        assert_eq!(annos[0].label.as_deref(), Some("TAX:9606"));
    }

    #[test]
    fn deterministic_output() {
        let catalog = SpecCatalog::builtin();
        let np = nanopub(vec![assertion(
            "complex(p(HGNC:MYD88), p(HGNC:IRAK1))",
            Some("increases"),
            Some("p(HGNC:AKT1)"),
        )]);
        let a = create_edges(&np, &ctx(&catalog), &EdgeOptions::default()).unwrap();
        let b = create_edges(&np, &ctx(&catalog), &EdgeOptions::default()).unwrap();
        assert_eq!(a.edges, b.edges);
    }

    #[test]
    fn missing_orthology_resolver_reports_warning() {
        let catalog = SpecCatalog::builtin();
        let np = nanopub(vec![assertion("p(HGNC:TP53)", None, None)]);
        let opts = EdgeOptions {
            orthologize_target: Some("TAX:10090".into()),
            ..Default::default()
        };
        let out = create_edges(&np, &ctx(&catalog), &opts).unwrap();
        assert_eq!(out.edges.len(), 1);
        assert!(out
            .messages
            .iter()
            .any(|m| m.level == MessageLevel::Warning));
        // species context still rewritten
        let annos = &out.edges[0].relation.annotations;
        assert!(annos.iter().any(|a| a.kind == "OrthologizedFrom"));
    }
}
