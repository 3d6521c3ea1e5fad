//! Reference BEL statement parser.
//!
//! Implements the [`AssertionParser`] collaborator contract with a
//! spec-driven recursive-descent parser. The grammar is derived from the
//! same specification tables a generated parser would be built from:
//! function and relation tokens that are not in the active specification are
//! grammar failures, with the failing position reported.
//!
//! The parser normalizes as it goes — function and relation names come out
//! in long form, so the tree is already in the canonical spelling the
//! engine's serialization uses.

use belgraph::ast::{FuncCall, NsArg, Statement, StatementObject, Term};
use belgraph::engine::{AssertionParser, ParseError};
use belgraph::spec::Specification;

/// The spec-driven reference parser. Stateless; one instance serves any
/// number of threads.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceParser;

impl ReferenceParser {
    pub fn new() -> Self {
        Self
    }
}

impl AssertionParser for ReferenceParser {
    fn parse(&self, text: &str, spec: &Specification) -> Result<Statement, ParseError> {
        let prepared = preprocess(text);
        if prepared.is_empty() {
            return Err(ParseError::new("empty statement", 0));
        }
        let mut cursor = Cursor::new(&prepared, spec);
        let statement = cursor.statement(None)?;
        cursor.skip_ws();
        if !cursor.at_end() {
            return Err(cursor.error("unexpected trailing input"));
        }
        Ok(statement)
    }
}

/// Trim the line and collapse whitespace runs outside quoted strings, so
/// positions are stable however the source file was formatted.
pub fn preprocess(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_quotes = false;
    let mut pending_space = false;
    for c in line.trim().chars() {
        if c == '"' {
            in_quotes = !in_quotes;
        }
        if c.is_whitespace() && !in_quotes {
            pending_space = true;
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(c);
    }
    out
}

/// Characters allowed in an unquoted token (function names, namespace
/// prefixes, bare values).
fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-'
}

struct Cursor<'s> {
    chars: Vec<char>,
    pos: usize,
    spec: &'s Specification,
}

impl<'s> Cursor<'s> {
    fn new(text: &str, spec: &'s Specification) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            spec,
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.pos)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn expect(&mut self, expected: char) -> Result<(), ParseError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected {expected:?}, found {c:?}"))),
            None => Err(self.error(format!("expected {expected:?}, found end of input"))),
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn token(&mut self) -> String {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if is_token_char(c)) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    /// A whitespace-delimited run, used for relation tokens (which include
    /// symbol forms like `=|` that are not token characters).
    fn word(&mut self) -> String {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if !c.is_whitespace()) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn quoted(&mut self) -> Result<String, ParseError> {
        self.expect('"')?;
        let start = self.pos;
        loop {
            match self.bump() {
                Some('"') => break,
                Some(_) => {}
                None => return Err(self.error("unterminated quoted string")),
            }
        }
        Ok(self.chars[start..self.pos - 1].iter().collect())
    }

    /// `statement := function (relation (nested-statement | function))?`
    ///
    /// `end` is `Some(')')` when parsing a parenthesized nested statement.
    fn statement(&mut self, end: Option<char>) -> Result<Statement, ParseError> {
        let subject = self.function()?;
        self.skip_ws();

        if self.at_end() || self.peek() == end {
            return Ok(Statement::subject_only(subject));
        }

        let at = self.pos;
        let word = self.word();
        let Some(relation) = self.spec.relations().to_long(&word) else {
            return Err(ParseError::new(format!("unknown relation {word:?}"), at));
        };
        let relation = relation.to_string();

        self.skip_ws();
        let object = if self.peek() == Some('(') {
            self.expect('(')?;
            let inner = self.statement(Some(')'))?;
            self.skip_ws();
            self.expect(')')?;
            StatementObject::Statement(Box::new(inner))
        } else {
            StatementObject::Term(Term::Function(self.function()?))
        };

        Ok(Statement::new(subject, relation, object))
    }

    /// `function := NAME '(' arg (',' arg)* ')'`
    fn function(&mut self) -> Result<FuncCall, ParseError> {
        let at = self.pos;
        let name = self.token();
        if name.is_empty() {
            return Err(self.error("expected a function name"));
        }
        let Some(info) = self.spec.function_info(&name) else {
            return Err(ParseError::new(format!("unknown function {name:?}"), at));
        };
        let (long, class) = (info.long.clone(), info.class);

        self.expect('(')?;
        let args = self.arguments()?;
        self.expect(')')?;

        Ok(FuncCall::new(long, class, args))
    }

    fn arguments(&mut self) -> Result<Vec<Term>, ParseError> {
        let mut args = Vec::new();
        loop {
            self.skip_ws();
            args.push(self.argument()?);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                }
                Some(')') => break,
                Some(c) => return Err(self.error(format!("expected ',' or ')', found {c:?}"))),
                None => return Err(self.error("expected ',' or ')', found end of input")),
            }
        }
        Ok(args)
    }

    /// `arg := function | namespace-term | quoted-string | bare-value`
    fn argument(&mut self) -> Result<Term, ParseError> {
        if self.peek() == Some('"') {
            return Ok(Term::Str(self.quoted()?));
        }

        let at = self.pos;
        let token = self.token();
        if token.is_empty() {
            return Err(self.error("expected an argument"));
        }

        match self.peek() {
            Some('(') => {
                // rewind and reparse as a function call so the name is
                // validated with its position
                self.pos = at;
                Ok(Term::Function(self.function()?))
            }
            Some(':') => {
                self.pos += 1;
                let value = if self.peek() == Some('"') {
                    self.quoted()?
                } else {
                    let v = self.token();
                    if v.is_empty() {
                        return Err(self.error("expected a namespace value"));
                    }
                    v
                };
                if self.peek() == Some(':') {
                    return Err(self.error("unexpected ':' after namespace value"));
                }
                Ok(Term::Namespace(NsArg::new(token, value)))
            }
            _ => Ok(Term::Str(token)),
        }
    }
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use belgraph::spec::SpecCatalog;

    fn spec() -> &'static Specification {
        static CATALOG: std::sync::OnceLock<SpecCatalog> = std::sync::OnceLock::new();
        CATALOG
            .get_or_init(SpecCatalog::builtin)
            .get("2.0.0")
            .unwrap()
    }

    fn parse(text: &str) -> Result<Statement, ParseError> {
        ReferenceParser.parse(text, spec())
    }

    #[test]
    fn empty_statement_rejected() {
        let err = parse("").unwrap_err();
        assert_eq!(err.message, "empty statement");
        assert_eq!(err.position, 0);
    }

    #[test]
    fn garbage_rejected_at_position_zero() {
        let err = parse("$$!@$").unwrap_err();
        assert_eq!(err.position, 0);
    }

    #[test]
    fn simple_term_parses_and_normalizes() {
        let s = parse("a(CHEBI:\"nitrogen atom\")").unwrap();
        assert_eq!(s.to_string(), "abundance(CHEBI:\"nitrogen atom\")");
        assert!(s.relation.is_none());
    }

    #[test]
    fn full_statement_with_symbol_relation() {
        let s = parse("act(p(HGNC:FOXO3), ma(tscript)) =| r(HGNC:MIR21)").unwrap();
        assert_eq!(s.relation.as_deref(), Some("directlyDecreases"));
        assert_eq!(
            s.to_string(),
            "activity(proteinAbundance(HGNC:FOXO3), molecularActivity(tscript)) \
             directlyDecreases rnaAbundance(HGNC:MIR21)"
        );
    }

    #[test]
    fn variant_string_argument() {
        let s = parse("g(HGNC:CFTR, var(\"c.1521_1523delCTT\"))").unwrap();
        assert_eq!(
            s.to_string(),
            "geneAbundance(HGNC:CFTR, variant(\"c.1521_1523delCTT\"))"
        );
    }

    #[test]
    fn fusion_arguments() {
        let s = parse("p(fus(HGNC:BCR, \"p.1_426\", HGNC:JAK2, \"p.812_1132\"))").unwrap();
        assert_eq!(
            s.to_string(),
            "proteinAbundance(fusion(HGNC:BCR, \"p.1_426\", HGNC:JAK2, \"p.812_1132\"))"
        );
    }

    #[test]
    fn nested_statement_object() {
        let s = parse(
            "a(CHEBI:\"nitric oxide\") decreases \
             (r(HGNC:CFTR) directlyIncreases p(HGNC:CFTR))",
        )
        .unwrap();
        match s.object {
            Some(StatementObject::Statement(inner)) => {
                assert_eq!(inner.relation.as_deref(), Some("directlyIncreases"));
            }
            other => panic!("expected nested statement, got {other:?}"),
        }
    }

    #[test]
    fn unknown_function_rejected_with_position() {
        let err = parse("atrocious(CHEBI:\"nitric oxide\")").unwrap_err();
        assert!(err.message.contains("atrocious"));
        assert_eq!(err.position, 0);
    }

    #[test]
    fn unknown_relation_rejected() {
        let err = parse("p(HGNC:CYCS) hello bp(GO:\"apoptotic process\")").unwrap_err();
        assert!(err.message.contains("hello"));
    }

    #[test]
    fn missing_parenthesis_rejected() {
        assert!(parse("a((CHEBI:\"oxygen atom\")").is_err());
        assert!(parse("a(CHEBI:\"nitric oxide\")) decreases r(HGNC:CFTR)").is_err());
    }

    #[test]
    fn namespace_term_object_rejected() {
        // object must be a function call, not a bare namespace term
        assert!(parse("act(p(MGI:Akt1), ma(kin)) decreases MGI:Cdkn1b").is_err());
    }

    #[test]
    fn missing_comma_rejected() {
        assert!(parse("act(p(HGNC:FOXO3) ma(tscript)) =| r(HGNC:MIR21)").is_err());
    }

    #[test]
    fn whitespace_collapsed_outside_quotes() {
        let s = parse("p(HGNC:AKT1)   increases    p(HGNC:FOXO3)").unwrap();
        assert_eq!(
            s.to_string(),
            "proteinAbundance(HGNC:AKT1) increases proteinAbundance(HGNC:FOXO3)"
        );
        let q = parse("bp(GO:\"apoptotic  process\")").unwrap();
        assert_eq!(q.to_string(), "biologicalProcess(GO:\"apoptotic  process\")");
    }

    #[test]
    fn roundtrips_through_canonical_serialization() {
        let canonical = "complexAbundance(proteinAbundance(HGNC:MYD88), \
                         proteinAbundance(HGNC:IRAK1)) directlyIncreases \
                         proteinAbundance(HGNC:AKT1)";
        let s = parse(canonical).unwrap();
        let reparsed = parse(&s.to_string()).unwrap();
        assert_eq!(s, reparsed);
    }
}
