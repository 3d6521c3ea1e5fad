//! Rule-based computed-edge inference.
//!
//! Given a canonicalized statement, this module applies the declarative
//! per-function rule sets of the [`Specification`] and synthesizes the
//! implied secondary statements — e.g. a `complexAbundance` occurrence
//! implies one `hasComponent` statement per component.
//!
//! Rules are data, not code: a new BEL version ships a new rule table in its
//! specification document. The traversal is depth-first (subject before
//! object, arguments in order, nested statements recursed on both sides), so
//! the output order is deterministic for a given input — which keeps
//! downstream content hashing reproducible.
//!
//! The input statement is never mutated; every synthesized statement is an
//! independent tree.

use crate::ast::{FuncCall, FunctionClass, Statement, StatementObject, Term};
use crate::spec::{ComputedRule, RuleTransform, Specification};

/// Rule-filter sentinel that disables inference entirely.
pub const SKIP_RULE: &str = "skip";

/// Derive the computed statements implied by `statement`.
///
/// `rule_filter` semantics: empty applies every declared rule; containing
/// [`SKIP_RULE`] yields nothing; otherwise only rules whose name appears in
/// the filter are applied.
pub fn compute_edges(
    statement: &Statement,
    spec: &Specification,
    rule_filter: &[String],
) -> Vec<Statement> {
    if rule_filter.iter().any(|r| r == SKIP_RULE) {
        return vec![];
    }

    let mut out = Vec::new();
    walk_statement(statement, spec, rule_filter, &mut out);
    out
}

fn walk_statement(
    statement: &Statement,
    spec: &Specification,
    filter: &[String],
    out: &mut Vec<Statement>,
) {
    walk_call(&statement.subject, None, spec, filter, out);
    match &statement.object {
        None => {}
        Some(StatementObject::Term(Term::Function(call))) => {
            walk_call(call, None, spec, filter, out)
        }
        Some(StatementObject::Term(_)) => {}
        Some(StatementObject::Statement(inner)) => walk_statement(inner, spec, filter, out),
    }
}

fn walk_call(
    call: &FuncCall,
    parent: Option<&FuncCall>,
    spec: &Specification,
    filter: &[String],
    out: &mut Vec<Statement>,
) {
    if let Some(rules) = spec.rules_for(&call.name) {
        for rule in rules {
            if !filter.is_empty() && !filter.iter().any(|r| r == &rule.name) {
                continue;
            }
            apply_rule(rule, call, parent, out);
        }
    }
    for arg in &call.args {
        if let Term::Function(inner) = arg {
            walk_call(inner, Some(call), spec, filter, out);
        }
    }
}

/// Synthesize the statements of one rule firing: expand the subject and
/// object transforms, then emit the cross product. A transform that yields
/// nothing (e.g. `parent` on a top-level occurrence) silently cancels the
/// firing.
fn apply_rule(
    rule: &ComputedRule,
    trigger: &FuncCall,
    parent: Option<&FuncCall>,
    out: &mut Vec<Statement>,
) {
    let subjects = expand(rule.subject, trigger, parent);
    let objects = expand(rule.object, trigger, parent);

    for subject in &subjects {
        for object in &objects {
            out.push(Statement::new(
                subject.clone(),
                rule.relation.clone(),
                StatementObject::Term(Term::Function(object.clone())),
            ));
        }
    }
}

/// The terms a transform yields for one trigger occurrence.
fn expand(
    transform: RuleTransform,
    trigger: &FuncCall,
    parent: Option<&FuncCall>,
) -> Vec<FuncCall> {
    match transform {
        RuleTransform::Trigger => vec![trigger.clone()],
        RuleTransform::TriggerArgs => trigger
            .args
            .iter()
            .filter_map(|arg| match arg {
                Term::Function(f) => Some(f.clone()),
                _ => None,
            })
            .collect(),
        RuleTransform::Parent => parent.cloned().into_iter().collect(),
        RuleTransform::ParentStripped => parent
            .map(|p| FuncCall {
                name: p.name.clone(),
                class: p.class,
                args: p
                    .args
                    .iter()
                    .filter(|arg| {
                        !matches!(
                            arg,
                            Term::Function(f) if f.class == FunctionClass::Modifier
                        )
                    })
                    .cloned()
                    .collect(),
            })
            .into_iter()
            .collect(),
        RuleTransform::PartnerWrapped => {
            let Some(p) = parent else { return vec![] };
            trigger
                .args
                .iter()
                .filter_map(|arg| match arg {
                    Term::Namespace(ns) => Some(FuncCall {
                        name: p.name.clone(),
                        class: p.class,
                        args: vec![Term::Namespace(ns.clone())],
                    }),
                    _ => None,
                })
                .collect()
        }
    }
}

// --- tests -------------------------------------------------------------------
