//! Semantic validation of a parsed statement against the specification's
//! function signatures.
//!
//! The parser guarantees the text matched the grammar; this pass checks that
//! every function call satisfies one of its declared signatures — argument
//! count, argument kinds, permitted nested functions, and default-namespace
//! values. The first violation found is returned; a statement with a
//! violation is skipped by the engine, not repaired.

use thiserror::Error;

use crate::ast::{FuncCall, FunctionClass, Statement, StatementObject, Term};
use crate::spec::{ArgKind, ArgSlot, Signature, Specification};

/// A semantic violation in a statement.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unknown function {0:?}")]
    UnknownFunction(String),

    #[error("unknown relation {0:?}")]
    UnknownRelation(String),

    #[error("{function}: too few arguments, expected at least {expected}")]
    TooFewArguments { function: String, expected: usize },

    #[error("{function}: argument {index} does not match any declared slot")]
    UnexpectedArgument { function: String, index: usize },

    #[error("{function}: argument {index} must be {expected}")]
    ArgumentMismatch {
        function: String,
        index: usize,
        expected: String,
    },

    #[error("{function}: {value:?} is not a member of the {namespace} namespace")]
    UnknownNamespaceValue {
        function: String,
        namespace: String,
        value: String,
    },
}

/// Validate a statement: subject, relation, and object (recursing into
/// nested functions and nested statements).
pub fn validate_statement(
    statement: &Statement,
    spec: &Specification,
) -> Result<(), ValidationError> {
    validate_call(&statement.subject, spec)?;

    if let Some(relation) = &statement.relation {
        if !spec.relations().contains(relation) {
            return Err(ValidationError::UnknownRelation(relation.clone()));
        }
    }

    match &statement.object {
        None => Ok(()),
        Some(StatementObject::Term(Term::Function(call))) => validate_call(call, spec),
        Some(StatementObject::Term(_)) => Ok(()),
        Some(StatementObject::Statement(inner)) => validate_statement(inner, spec),
    }
}

/// Validate one function call against its declared signatures. The call is
/// valid when any signature accepts it; the error of the first signature is
/// reported otherwise.
pub fn validate_call(call: &FuncCall, spec: &Specification) -> Result<(), ValidationError> {
    let Some(signatures) = spec.signatures(&call.name) else {
        return Err(ValidationError::UnknownFunction(call.name.clone()));
    };

    let mut first_error = None;
    let mut accepted = false;
    for signature in signatures {
        match check_signature(call, signature, spec) {
            Ok(()) => {
                accepted = true;
                break;
            }
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    if !accepted {
        return Err(first_error.unwrap_or(ValidationError::TooFewArguments {
            function: call.name.clone(),
            expected: 0,
        }));
    }

    // nested calls validate against their own signatures
    for arg in &call.args {
        if let Term::Function(inner) = arg {
            validate_call(inner, spec)?;
        }
    }
    Ok(())
}

/// Match a call's arguments against one signature.
///
/// Required slots consume arguments positionally; the remainder may match
/// position-dependent optional slots (in declared order, each at most once),
/// then position-independent optional slots (each at most once), then
/// multiple slots (unbounded).
fn check_signature(
    call: &FuncCall,
    signature: &Signature,
    spec: &Specification,
) -> Result<(), ValidationError> {
    let mut args = call.args.iter().enumerate();

    for slot in &signature.required {
        match args.next() {
            None => {
                return Err(ValidationError::TooFewArguments {
                    function: call.name.clone(),
                    expected: signature.required.len(),
                })
            }
            Some((index, arg)) => check_slot(call, index, arg, slot, spec)?,
        }
    }

    let mut positional = signature.positional_optional.iter();
    let mut optional_used = vec![false; signature.optional.len()];

    'args: for (index, arg) in args {
        for slot in positional.by_ref() {
            if slot_accepts(arg, slot, spec) {
                continue 'args;
            }
        }
        for (used, slot) in optional_used.iter_mut().zip(&signature.optional) {
            if !*used && slot_accepts(arg, slot, spec) {
                *used = true;
                continue 'args;
            }
        }
        if signature.multiple.iter().any(|s| slot_accepts(arg, s, spec)) {
            continue 'args;
        }
        return Err(ValidationError::UnexpectedArgument {
            function: call.name.clone(),
            index,
        });
    }

    Ok(())
}

/// Check a required slot, producing a descriptive error on mismatch.
fn check_slot(
    call: &FuncCall,
    index: usize,
    arg: &Term,
    slot: &ArgSlot,
    spec: &Specification,
) -> Result<(), ValidationError> {
    if slot_accepts(arg, slot, spec) {
        return Ok(());
    }
    // Distinguish a namespace-membership failure from a kind mismatch.
    if slot.kind == ArgKind::StrArgNSArg {
        if let Term::Str(value) = arg {
            if let Some(ns) = declared_namespace(slot, spec) {
                return Err(ValidationError::UnknownNamespaceValue {
                    function: call.name.clone(),
                    namespace: ns.to_string(),
                    value: value.clone(),
                });
            }
        }
    }
    Err(ValidationError::ArgumentMismatch {
        function: call.name.clone(),
        index,
        expected: expected_description(slot),
    })
}

fn expected_description(slot: &ArgSlot) -> String {
    match slot.kind {
        ArgKind::Function => format!("one of the functions [{}]", slot.values.join(", ")),
        ArgKind::Modifier => format!("one of the modifiers [{}]", slot.values.join(", ")),
        ArgKind::NSArg => "a namespace argument".to_string(),
        ArgKind::StrArg => "a string argument".to_string(),
        ArgKind::StrArgNSArg => "a namespace or string argument".to_string(),
    }
}

/// The spec-declared default namespace of a slot, when its `values` name one.
fn declared_namespace<'s>(slot: &'s ArgSlot, spec: &Specification) -> Option<&'s str> {
    slot.values
        .iter()
        .map(String::as_str)
        .find(|v| spec.namespace(v).is_some())
}

/// Whether a nested function name is in the slot's permitted set. An empty
/// set permits any function of the right class.
fn value_permits(slot: &ArgSlot, name: &str) -> bool {
    slot.values.is_empty() || slot.values.iter().any(|v| v == name)
}

/// Whether `arg` satisfies `slot`.
fn slot_accepts(arg: &Term, slot: &ArgSlot, spec: &Specification) -> bool {
    match (slot.kind, arg) {
        (ArgKind::Function, Term::Function(f)) => {
            f.class == FunctionClass::Primary && value_permits(slot, &f.name)
        }
        (ArgKind::Modifier, Term::Function(f)) => {
            f.class == FunctionClass::Modifier && value_permits(slot, &f.name)
        }
        (ArgKind::NSArg, Term::Namespace(_)) => true,
        (ArgKind::StrArg, Term::Str(_)) => true,
        (ArgKind::StrArgNSArg, Term::Namespace(_)) => true,
        (ArgKind::StrArgNSArg, Term::Str(value)) => {
            // Default-namespace values must be members of a declared
            // namespace when the slot names one the spec knows.
            match declared_namespace(slot, spec) {
                Some(ns) => spec
                    .namespace(ns)
                    .map(|table| table.contains(value))
                    .unwrap_or(false),
                None => true,
            }
        }
        _ => false,
    }
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NsArg;
    use crate::spec::SpecCatalog;

    fn spec() -> &'static Specification {
        static CATALOG: std::sync::OnceLock<SpecCatalog> = std::sync::OnceLock::new();
        CATALOG
            .get_or_init(SpecCatalog::builtin)
            .get("2.0.0")
            .unwrap()
    }

    fn p(value: &str) -> FuncCall {
        FuncCall::new(
            "proteinAbundance",
            FunctionClass::Primary,
            vec![Term::Namespace(NsArg::new("HGNC", value))],
        )
    }

    fn ma(value: &str) -> FuncCall {
        FuncCall::new(
            "molecularActivity",
            FunctionClass::Modifier,
            vec![Term::Str(value.into())],
        )
    }

    #[test]
    fn valid_activity_statement() {
        let stmt = Statement::subject_only(FuncCall::new(
            "activity",
            FunctionClass::Primary,
            vec![Term::Function(p("AKT1")), Term::Function(ma("kin"))],
        ));
        assert_eq!(validate_statement(&stmt, spec()), Ok(()));
    }

    #[test]
    fn unknown_function_rejected() {
        let stmt = Statement::subject_only(FuncCall::new(
            "atrocious",
            FunctionClass::Primary,
            vec![Term::Namespace(NsArg::new("CHEBI", "nitric oxide"))],
        ));
        assert_eq!(
            validate_statement(&stmt, spec()),
            Err(ValidationError::UnknownFunction("atrocious".into()))
        );
    }

    #[test]
    fn unknown_relation_rejected() {
        let stmt = Statement::new(
            p("AKT1"),
            "hello",
            StatementObject::Term(Term::Function(p("FOXO3"))),
        );
        assert_eq!(
            validate_statement(&stmt, spec()),
            Err(ValidationError::UnknownRelation("hello".into()))
        );
    }

    #[test]
    fn extra_argument_rejected() {
        // rnaAbundance(MGI:Mir21, extra)
        let stmt = Statement::subject_only(FuncCall::new(
            "rnaAbundance",
            FunctionClass::Primary,
            vec![
                Term::Namespace(NsArg::new("MGI", "Mir21")),
                Term::Str("extra".into()),
            ],
        ));
        assert!(matches!(
            validate_statement(&stmt, spec()),
            Err(ValidationError::UnexpectedArgument { .. })
        ));
    }

    #[test]
    fn too_few_arguments_rejected() {
        let stmt = Statement::subject_only(FuncCall::new(
            "degradation",
            FunctionClass::Primary,
            vec![],
        ));
        assert!(matches!(
            validate_statement(&stmt, spec()),
            Err(ValidationError::TooFewArguments { .. })
        ));
    }

    #[test]
    fn activity_value_checked_against_namespace() {
        let good = Statement::subject_only(FuncCall::new(
            "activity",
            FunctionClass::Primary,
            vec![Term::Function(p("AKT1")), Term::Function(ma("tscript"))],
        ));
        assert_eq!(validate_statement(&good, spec()), Ok(()));

        let bad = Statement::subject_only(FuncCall::new(
            "activity",
            FunctionClass::Primary,
            vec![Term::Function(p("AKT1")), Term::Function(ma("juggling"))],
        ));
        assert!(matches!(
            validate_statement(&bad, spec()),
            Err(ValidationError::UnknownNamespaceValue { .. })
        ));
    }

    #[test]
    fn pmod_amino_acid_alternate_abbreviation_accepted() {
        // pmod(Ph, S, 473): "S" is the single-letter Serine abbreviation
        let pmod = FuncCall::new(
            "proteinModification",
            FunctionClass::Modifier,
            vec![
                Term::Str("Ph".into()),
                Term::Str("S".into()),
                Term::Str("473".into()),
            ],
        );
        let stmt = Statement::subject_only(FuncCall::new(
            "proteinAbundance",
            FunctionClass::Primary,
            vec![
                Term::Namespace(NsArg::new("HGNC", "AKT1")),
                Term::Function(pmod),
            ],
        ));
        assert_eq!(validate_statement(&stmt, spec()), Ok(()));
    }

    #[test]
    fn complex_accepts_both_signatures() {
        // named complex
        let named = Statement::subject_only(FuncCall::new(
            "complexAbundance",
            FunctionClass::Primary,
            vec![Term::Namespace(NsArg::new("SCOMP", "NFKB Complex"))],
        ));
        assert_eq!(validate_statement(&named, spec()), Ok(()));

        // enumerated complex
        let enumerated = Statement::subject_only(FuncCall::new(
            "complexAbundance",
            FunctionClass::Primary,
            vec![Term::Function(p("MYD88")), Term::Function(p("IRAK1"))],
        ));
        assert_eq!(validate_statement(&enumerated, spec()), Ok(()));
    }

    #[test]
    fn nested_statement_object_validated() {
        let inner = Statement::new(
            p("MYD88"),
            "hello",
            StatementObject::Term(Term::Function(p("IRAK1"))),
        );
        let outer = Statement::new(
            p("AKT1"),
            "increases",
            StatementObject::Statement(Box::new(inner)),
        );
        assert_eq!(
            validate_statement(&outer, spec()),
            Err(ValidationError::UnknownRelation("hello".into()))
        );
    }
}
