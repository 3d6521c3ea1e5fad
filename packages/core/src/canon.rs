//! Canonicalization and orthologization of parsed statements.
//!
//! Both transforms rewrite namespace terms in place, walking every argument
//! recursively through nested functions and nested statements. String
//! arguments and function names are untouched — the term tree's shape never
//! changes, only the `(namespace, value)` pairs at its leaves.
//!
//! Canonicalization is idempotent: running it on an already-canonical
//! statement is a no-op, because resolving a canonical term yields the term
//! itself.

use crate::ast::{FuncCall, NsArg, Statement, StatementObject, Term};
use crate::nanopub::Annotation;
use crate::resolve::{
    NamespaceTargets, Orthology, OrthologyResolver, ResolutionError, TermResolver,
};

/// Annotation type recording the original species after
/// [`orthologize_context`].
pub const ORTHOLOGIZED_FROM: &str = "OrthologizedFrom";

/// Annotation type carrying the species context of a nanopub.
pub const SPECIES_ANNOTATION: &str = "Species";

/// What happened while canonicalizing one statement.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CanonicalizeReport {
    /// Terms left unresolved because the resolver failed for them.
    pub failures: Vec<ResolutionError>,
}

impl CanonicalizeReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Rewrite every namespace term of `statement` into canonical form.
///
/// Terms whose namespace has no configured target are left unchanged
/// (`Ok(None)` from the resolver). Resolver failures leave the term
/// unchanged too and are collected in the report — a statement is never
/// aborted over a term.
pub fn canonicalize(
    statement: &mut Statement,
    resolver: &dyn TermResolver,
    targets: &NamespaceTargets,
) -> CanonicalizeReport {
    let mut report = CanonicalizeReport::default();
    rewrite_statement(statement, &mut |ns| {
        match resolver.canonical(ns, targets) {
            Ok(Some(canonical)) => *ns = canonical,
            Ok(None) => {}
            Err(e) => report.failures.push(e),
        }
    });
    report
}

/// Render the decanonicalized (human-readable) form of a statement.
///
/// Each namespace term is replaced by its preferred label form where one is
/// known. The input is not mutated — the canonical tree used for hashing
/// stays exactly as it was.
pub fn decanonicalize_statement(statement: &Statement, resolver: &dyn TermResolver) -> String {
    let mut labeled = statement.clone();
    rewrite_statement(&mut labeled, &mut |ns| {
        if let Ok(Some(label)) = resolver.label(ns) {
            *ns = label;
        }
    });
    labeled.to_string()
}

/// Render the decanonicalized form of a single function call.
pub fn decanonicalize_term(call: &FuncCall, resolver: &dyn TermResolver) -> String {
    let mut labeled = call.clone();
    rewrite_call(&mut labeled, &mut |ns| {
        if let Ok(Some(label)) = resolver.label(ns) {
            *ns = label;
        }
    });
    labeled.to_string()
}

/// Outcome of orthologizing one statement.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OrthologyOutcome {
    /// Species-scoped terms that had no ortholog in the target species and
    /// were left unchanged. Non-empty means the statement is only partially
    /// orthologized; it is still emitted.
    pub missing: Vec<String>,
    /// Lookup failures, also left unchanged.
    pub failures: Vec<ResolutionError>,
}

impl OrthologyOutcome {
    /// Every species-scoped term was translated.
    pub fn complete(&self) -> bool {
        self.missing.is_empty() && self.failures.is_empty()
    }
}

/// Rewrite every species-scoped namespace term of `statement` into the
/// orthologous term in `target_taxon`.
///
/// Terms with no ortholog stay unchanged and are recorded in the outcome;
/// the statement itself is always kept.
pub fn orthologize(
    statement: &mut Statement,
    resolver: &dyn OrthologyResolver,
    target_taxon: &str,
) -> OrthologyOutcome {
    let mut outcome = OrthologyOutcome::default();
    rewrite_statement(statement, &mut |ns| {
        match resolver.ortholog(ns, target_taxon) {
            Ok(Orthology::Translated(translated)) => *ns = translated,
            Ok(Orthology::NotSpeciesScoped) => {}
            Ok(Orthology::NotFound) => outcome.missing.push(ns.to_string()),
            Err(e) => outcome.failures.push(e),
        }
    });
    outcome
}

/// Rewrite a nanopub's annotation context for orthologization: every
/// `Species` annotation's value becomes the target taxon, and one
/// `OrthologizedFrom` annotation per original species is appended.
///
/// Annotations are append-only here — nothing is deleted.
pub fn orthologize_context(target_taxon: &str, annotations: &mut Vec<Annotation>) {
    let mut origins = Vec::new();
    for anno in annotations.iter_mut() {
        if anno.kind == SPECIES_ANNOTATION {
            origins.push(Annotation::new(
                ORTHOLOGIZED_FROM,
                anno.id.take(),
                anno.label.take(),
            ));
            anno.id = Some(target_taxon.to_string());
            anno.label = Some(target_taxon.to_string());
        }
    }
    annotations.extend(origins);
}

// ---------------------------------------------------------------------------
// Traversal
// ---------------------------------------------------------------------------

/// Apply `f` to every namespace term of the statement, subject first, then
/// the object, recursing into nested functions and nested statements.
fn rewrite_statement(statement: &mut Statement, f: &mut impl FnMut(&mut NsArg)) {
    rewrite_call(&mut statement.subject, f);
    match &mut statement.object {
        None => {}
        Some(StatementObject::Term(term)) => rewrite_term(term, f),
        Some(StatementObject::Statement(inner)) => rewrite_statement(inner, f),
    }
}

fn rewrite_call(call: &mut FuncCall, f: &mut impl FnMut(&mut NsArg)) {
    for arg in &mut call.args {
        rewrite_term(arg, f);
    }
}

fn rewrite_term(term: &mut Term, f: &mut impl FnMut(&mut NsArg)) {
    match term {
        Term::Namespace(ns) => f(ns),
        Term::Str(_) => {}
        Term::Function(call) => rewrite_call(call, f),
    }
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::FunctionClass;
    use std::collections::BTreeMap;

    /// Maps HGNC symbols to EG ids, like the canonical term store does.
    struct FixtureResolver;

    fn eg_of(value: &str) -> Option<&'static str> {
        match value {
            "AKT1" => Some("207"),
            "MYD88" => Some("4615"),
            "IRAK1" => Some("3654"),
            "IRAK4" => Some("51135"),
            _ => None,
        }
    }

    fn hgnc_of(value: &str) -> Option<&'static str> {
        match value {
            "207" => Some("AKT1"),
            "4615" => Some("MYD88"),
            "3654" => Some("IRAK1"),
            "51135" => Some("IRAK4"),
            _ => None,
        }
    }

    impl TermResolver for FixtureResolver {
        fn canonical(
            &self,
            term: &NsArg,
            targets: &NamespaceTargets,
        ) -> Result<Option<NsArg>, ResolutionError> {
            if !targets.contains_key(term.namespace.as_str()) {
                return Ok(None);
            }
            Ok(eg_of(&term.value).map(|id| NsArg::new("EG", id)))
        }

        fn label(&self, term: &NsArg) -> Result<Option<NsArg>, ResolutionError> {
            if term.namespace != "EG" {
                return Ok(None);
            }
            Ok(hgnc_of(&term.value).map(|sym| NsArg::new("HGNC", sym)))
        }
    }

    fn targets() -> NamespaceTargets {
        let mut t = BTreeMap::new();
        t.insert("HGNC".to_string(), vec!["EG".to_string()]);
        t
    }

    fn p(ns: &str, value: &str) -> FuncCall {
        FuncCall::new(
            "proteinAbundance",
            FunctionClass::Primary,
            vec![Term::Namespace(NsArg::new(ns, value))],
        )
    }

    fn act_akt1(ns: &str, value: &str) -> Statement {
        Statement::subject_only(FuncCall::new(
            "activity",
            FunctionClass::Primary,
            vec![
                Term::Function(p(ns, value)),
                Term::Function(FuncCall::new(
                    "molecularActivity",
                    FunctionClass::Modifier,
                    vec![Term::Str("kinase activity".into())],
                )),
            ],
        ))
    }

    #[test]
    fn canonicalize_rewrites_namespace_terms() {
        let mut s = act_akt1("HGNC", "AKT1");
        let report = canonicalize(&mut s, &FixtureResolver, &targets());
        assert!(report.is_clean());
        assert_eq!(
            s.to_string(),
            "activity(proteinAbundance(EG:207), molecularActivity(\"kinase activity\"))"
        );
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let mut once = act_akt1("HGNC", "AKT1");
        canonicalize(&mut once, &FixtureResolver, &targets());
        let mut twice = once.clone();
        canonicalize(&mut twice, &FixtureResolver, &targets());
        assert_eq!(once, twice);
    }

    #[test]
    fn unconfigured_namespace_left_unchanged() {
        let mut s = Statement::subject_only(FuncCall::new(
            "biologicalProcess",
            FunctionClass::Primary,
            vec![Term::Namespace(NsArg::new("GO", "apoptotic process"))],
        ));
        let report = canonicalize(&mut s, &FixtureResolver, &targets());
        assert!(report.is_clean());
        assert_eq!(
            s.to_string(),
            "biologicalProcess(GO:\"apoptotic process\")"
        );
    }

    #[test]
    fn canonicalize_reaches_nested_statements() {
        let inner = Statement::new(
            p("HGNC", "MYD88"),
            "directlyIncreases",
            StatementObject::Term(Term::Function(p("HGNC", "IRAK1"))),
        );
        let mut outer = Statement::new(
            p("HGNC", "AKT1"),
            "increases",
            StatementObject::Statement(Box::new(inner)),
        );
        canonicalize(&mut outer, &FixtureResolver, &targets());
        assert_eq!(
            outer.to_string(),
            "proteinAbundance(EG:207) increases \
             (proteinAbundance(EG:4615) directlyIncreases proteinAbundance(EG:3654))"
        );
    }

    #[test]
    fn decanonicalize_renders_labels_without_mutating() {
        let mut s = act_akt1("HGNC", "AKT1");
        canonicalize(&mut s, &FixtureResolver, &targets());
        let before = s.clone();
        let label = decanonicalize_statement(&s, &FixtureResolver);
        assert_eq!(
            label,
            "activity(proteinAbundance(HGNC:AKT1), molecularActivity(\"kinase activity\"))"
        );
        assert_eq!(s, before);
    }

    struct MouseOrthologs;

    impl OrthologyResolver for MouseOrthologs {
        fn ortholog(
            &self,
            term: &NsArg,
            _target_taxon: &str,
        ) -> Result<Orthology, ResolutionError> {
            match (term.namespace.as_str(), term.value.as_str()) {
                ("EG", "207") => Ok(Orthology::Translated(NsArg::new("EG", "11651"))),
                ("EG", _) => Ok(Orthology::NotFound),
                _ => Ok(Orthology::NotSpeciesScoped),
            }
        }
    }

    #[test]
    fn orthologize_translates_and_flags_missing() {
        let mut s = Statement::new(
            p("EG", "207"),
            "increases",
            StatementObject::Term(Term::Function(p("EG", "4615"))),
        );
        let outcome = orthologize(&mut s, &MouseOrthologs, "TAX:10090");
        assert!(!outcome.complete());
        assert_eq!(outcome.missing, vec!["EG:4615".to_string()]);
        assert_eq!(
            s.to_string(),
            "proteinAbundance(EG:11651) increases proteinAbundance(EG:4615)"
        );
    }

    #[test]
    fn orthologize_context_rewrites_species_and_appends_origin() {
        let mut annotations = vec![
            Annotation::new("Species", Some("TAX:9606".into()), Some("human".into())),
            Annotation::new("Tissue", Some("UBERON:0002107".into()), Some("liver".into())),
        ];
        orthologize_context("TAX:10090", &mut annotations);
        assert_eq!(annotations.len(), 3);
        assert_eq!(annotations[0].kind, "Species");
        assert_eq!(annotations[0].id.as_deref(), Some("TAX:10090"));
        assert_eq!(annotations[0].label.as_deref(), Some("TAX:10090"));
        assert_eq!(annotations[1].kind, "Tissue");
        assert_eq!(annotations[2].kind, ORTHOLOGIZED_FROM);
        assert_eq!(annotations[2].id.as_deref(), Some("TAX:9606"));
        assert_eq!(annotations[2].label.as_deref(), Some("human"));
    }
}
