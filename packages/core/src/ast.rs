//! In-memory representation of a parsed BEL statement.
//!
//! A statement is a tree: a subject function call, an optional relation, and
//! an optional object that is either a term or a full nested statement. The
//! four node kinds ([`NsArg`], string argument, [`FuncCall`], nested
//! [`Statement`]) form a closed set; every traversal in this crate matches
//! on them exhaustively.
//!
//! The `Display` implementations define the **canonical serialization**: long
//! function names, arguments joined by `", "`, values quoted exactly when
//! they contain a character outside `[A-Za-z0-9_]`. The same tree always
//! serializes to the same string, which is what the content hashes in
//! [`edge`](crate::edge) are derived from.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Matches values that can be printed without surrounding quotes.
static BARE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("invalid bare-value regex"));

/// Quote `value` for canonical output when it is not a bare token.
fn quoted(value: &str) -> String {
    if BARE_RE.is_match(value) {
        value.to_string()
    } else {
        format!("\"{}\"", value)
    }
}

/// Whether a function is a standalone statement function or a modifier that
/// only appears inside another function's argument list.
///
/// Serialises lowercase (`"primary"` / `"modifier"`), matching the
/// specification document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionClass {
    Primary,
    Modifier,
}

impl fmt::Display for FunctionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionClass::Primary => write!(f, "primary"),
            FunctionClass::Modifier => write!(f, "modifier"),
        }
    }
}

/// A namespace term: `(prefix, value)`, e.g. `HGNC:AKT1`. Identity is the
/// pair; two terms with the same prefix and value are the same term wherever
/// they appear.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NsArg {
    pub namespace: String,
    pub value: String,
}

impl NsArg {
    pub fn new(namespace: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for NsArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, quoted(&self.value))
    }
}

/// A function call: long-form name, class, and ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncCall {
    /// Long-form function name (e.g. `proteinAbundance`).
    pub name: String,
    pub class: FunctionClass,
    pub args: Vec<Term>,
}

impl FuncCall {
    pub fn new(name: impl Into<String>, class: FunctionClass, args: Vec<Term>) -> Self {
        Self {
            name: name.into(),
            class,
            args,
        }
    }

    /// Leaf namespace terms reachable from this call, in tree order.
    /// Duplicates are retained.
    pub fn subcomponents(&self, out: &mut Vec<String>) {
        for arg in &self.args {
            match arg {
                Term::Namespace(ns) => out.push(ns.to_string()),
                Term::Str(_) => {}
                Term::Function(inner) => inner.subcomponents(out),
            }
        }
    }

    /// Namespace terms reachable from this call, in tree order.
    pub fn namespace_terms<'a>(&'a self, out: &mut Vec<&'a NsArg>) {
        for arg in &self.args {
            match arg {
                Term::Namespace(ns) => out.push(ns),
                Term::Str(_) => {}
                Term::Function(inner) => inner.namespace_terms(out),
            }
        }
    }
}

impl fmt::Display for FuncCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self.args.iter().map(|a| a.to_string()).collect();
        write!(f, "{}({})", self.name, args.join(", "))
    }
}

/// One argument in a function call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// A namespace term, e.g. `HGNC:AKT1`.
    Namespace(NsArg),
    /// A string literal, e.g. `"p.1_426"` or a default-namespace value like `kin`.
    Str(String),
    /// A nested function call, e.g. `pmod(Ph, Ser, 473)`.
    Function(FuncCall),
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Namespace(ns) => write!(f, "{}", ns),
            Term::Str(s) => write!(f, "{}", quoted(s)),
            Term::Function(func) => write!(f, "{}", func),
        }
    }
}

/// The object position of a statement: a term, or a full nested statement
/// (`a(X) increases (b(Y) decreases c(Z))`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementObject {
    Term(Term),
    Statement(Box<Statement>),
}

impl fmt::Display for StatementObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementObject::Term(t) => write!(f, "{}", t),
            StatementObject::Statement(s) => write!(f, "({})", s),
        }
    }
}

/// A parsed BEL statement: subject, optional relation, optional object.
///
/// A statement with no relation is a subject-only assertion; it has no
/// object either.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub subject: FuncCall,
    /// Long-form relation name. `None` for subject-only assertions.
    pub relation: Option<String>,
    pub object: Option<StatementObject>,
}

impl Statement {
    /// A subject-only assertion.
    pub fn subject_only(subject: FuncCall) -> Self {
        Self {
            subject,
            relation: None,
            object: None,
        }
    }

    pub fn new(subject: FuncCall, relation: impl Into<String>, object: StatementObject) -> Self {
        Self {
            subject,
            relation: Some(relation.into()),
            object: Some(object),
        }
    }

    /// Every namespace term of the statement, subject first then object, in
    /// tree order.
    pub fn namespace_terms(&self) -> Vec<&NsArg> {
        let mut out = Vec::new();
        self.subject.namespace_terms(&mut out);
        match &self.object {
            None => {}
            Some(StatementObject::Term(Term::Namespace(ns))) => out.push(ns),
            Some(StatementObject::Term(Term::Str(_))) => {}
            Some(StatementObject::Term(Term::Function(f))) => f.namespace_terms(&mut out),
            Some(StatementObject::Statement(inner)) => out.extend(inner.namespace_terms()),
        }
        out
    }

    /// Leaf namespace terms of the object position, in tree order.
    ///
    /// For a nested-statement object this walks the inner subject first and
    /// then the inner object, the order the canonical serialization prints
    /// them in.
    pub fn object_subcomponents(&self, out: &mut Vec<String>) {
        match &self.object {
            None => {}
            Some(StatementObject::Term(Term::Namespace(ns))) => out.push(ns.to_string()),
            Some(StatementObject::Term(Term::Str(_))) => {}
            Some(StatementObject::Term(Term::Function(f))) => f.subcomponents(out),
            Some(StatementObject::Statement(inner)) => {
                inner.subject.subcomponents(out);
                inner.object_subcomponents(out);
            }
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.relation, &self.object) {
            (Some(rel), Some(obj)) => write!(f, "{} {} {}", self.subject, rel, obj),
            _ => write!(f, "{}", self.subject),
        }
    }
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn p(value: &str) -> FuncCall {
        FuncCall::new(
            "proteinAbundance",
            FunctionClass::Primary,
            vec![Term::Namespace(NsArg::new("HGNC", value))],
        )
    }

    #[test]
    fn bare_values_unquoted() {
        assert_eq!(NsArg::new("HGNC", "AKT1").to_string(), "HGNC:AKT1");
        assert_eq!(NsArg::new("EG", "207").to_string(), "EG:207");
    }

    #[test]
    fn special_values_quoted() {
        assert_eq!(
            NsArg::new("GO", "kinase activity").to_string(),
            "GO:\"kinase activity\""
        );
        assert_eq!(
            Term::Str("c.1521_1523delCTT".into()).to_string(),
            "\"c.1521_1523delCTT\""
        );
    }

    #[test]
    fn function_call_canonical_form() {
        let complex = FuncCall::new(
            "complexAbundance",
            FunctionClass::Primary,
            vec![
                Term::Function(p("MYD88")),
                Term::Function(p("IRAK1")),
            ],
        );
        assert_eq!(
            complex.to_string(),
            "complexAbundance(proteinAbundance(HGNC:MYD88), proteinAbundance(HGNC:IRAK1))"
        );
    }

    #[test]
    fn statement_with_relation() {
        let s = Statement::new(
            p("AKT1"),
            "increases",
            StatementObject::Term(Term::Function(p("FOXO3"))),
        );
        assert_eq!(
            s.to_string(),
            "proteinAbundance(HGNC:AKT1) increases proteinAbundance(HGNC:FOXO3)"
        );
    }

    #[test]
    fn subject_only_statement() {
        let s = Statement::subject_only(p("AKT1"));
        assert_eq!(s.to_string(), "proteinAbundance(HGNC:AKT1)");
    }

    #[test]
    fn nested_statement_parenthesized() {
        let inner = Statement::new(
            p("MYD88"),
            "directlyIncreases",
            StatementObject::Term(Term::Function(p("IRAK1"))),
        );
        let outer = Statement::new(
            p("AKT1"),
            "increases",
            StatementObject::Statement(Box::new(inner)),
        );
        assert_eq!(
            outer.to_string(),
            "proteinAbundance(HGNC:AKT1) increases \
             (proteinAbundance(HGNC:MYD88) directlyIncreases proteinAbundance(HGNC:IRAK1))"
        );
    }

    #[test]
    fn subcomponents_in_tree_order_with_duplicates() {
        let complex = FuncCall::new(
            "complexAbundance",
            FunctionClass::Primary,
            vec![
                Term::Function(p("MYD88")),
                Term::Function(p("MYD88")),
                Term::Function(p("IRAK4")),
            ],
        );
        let mut out = vec![];
        complex.subcomponents(&mut out);
        assert_eq!(out, vec!["HGNC:MYD88", "HGNC:MYD88", "HGNC:IRAK4"]);
    }
}
