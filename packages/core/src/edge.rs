//! Edge materialization: canonical statements → content-addressed graph
//! documents.
//!
//! [`make_edge`] turns a canonicalized statement plus its provenance into an
//! [`Edge`], the serialization-ready record carrying canonical strings,
//! decanonicalized labels, decomposed subcomponents, and the statement-level
//! `edge_hash`. [`materialize`] then derives the node and relation documents
//! the graph sink consumes, with `_key`s hashed from the documents
//! themselves.
//!
//! Everything here is pure and produces owned value types — an emitted
//! document never aliases the statement it came from.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::ast::{Statement, StatementObject, Term};
use crate::canon::{decanonicalize_statement, decanonicalize_term};
use crate::hash::{content_hash, document_key, HashError};
use crate::nanopub::Annotation;
use crate::resolve::TermResolver;

/// Whether an edge was asserted by the source text or inferred by a
/// computed-edge rule. Serialises lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
    Primary,
    Computed,
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeType::Primary => write!(f, "primary"),
            EdgeType::Computed => write!(f, "computed"),
        }
    }
}

/// Canonical name, decanonicalized label, and leaf subcomponents of one end
/// of an edge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodePayload {
    pub name: String,
    pub label: String,
    pub components: Vec<String>,
}

/// The relation block of an edge: the asserted or computed relation plus the
/// provenance and the canonical/label strings of both ends.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelationPayload {
    /// Long-form relation name. `None` for subject-only assertions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,

    /// Hash of the canonical `"{subject} {relation} {object}"` string
    /// (subject string alone for subject-only assertions).
    pub edge_hash: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nanopub_id: Option<String>,

    pub edge_type: EdgeType,

    pub subject_canon: String,
    /// Decanonicalized subject label.
    pub subject: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_canon: Option<String>,
    /// Decanonicalized object label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,

    pub annotations: Vec<Annotation>,
}

/// A materialized edge, the unit handed to [`materialize`]. Wire format
/// nests under an `"edge"` key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Edge {
    pub subject: NodePayload,
    pub relation: RelationPayload,
    /// Absent for subject-only assertions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<NodePayload>,
}

/// Top-level wrapper matching the on-disk edge document shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EdgeDoc {
    pub edge: Edge,
}

/// Build an [`Edge`] from a canonicalized statement.
///
/// The resolver is used only to render decanonicalized labels; the statement
/// itself is read, never written.
pub fn make_edge(
    statement: &Statement,
    nanopub_id: Option<&str>,
    edge_type: EdgeType,
    annotations: &[Annotation],
    resolver: &dyn TermResolver,
) -> Edge {
    let subject_canon = statement.subject.to_string();
    let subject_label = decanonicalize_term(&statement.subject, resolver);
    let mut subject_components = Vec::new();
    statement.subject.subcomponents(&mut subject_components);

    let object = statement.object.as_ref().map(|obj| {
        let (canon, label) = match obj {
            StatementObject::Term(term) => (
                term.to_string(),
                match term {
                    Term::Function(call) => decanonicalize_term(call, resolver),
                    other => other.to_string(),
                },
            ),
            StatementObject::Statement(inner) => (
                inner.to_string(),
                decanonicalize_statement(inner, resolver),
            ),
        };
        let mut components = Vec::new();
        statement.object_subcomponents(&mut components);
        NodePayload {
            name: canon,
            label,
            components,
        }
    });

    let edge_hash = match (&statement.relation, &object) {
        (Some(relation), Some(obj)) => {
            content_hash(&format!("{} {} {}", subject_canon, relation, obj.name))
        }
        _ => content_hash(&subject_canon),
    };

    Edge {
        subject: NodePayload {
            name: subject_canon.clone(),
            label: subject_label.clone(),
            components: subject_components,
        },
        relation: RelationPayload {
            relation: statement.relation.clone(),
            edge_hash,
            nanopub_id: nanopub_id.map(str::to_string),
            edge_type,
            subject_canon,
            subject: subject_label,
            object_canon: object.as_ref().map(|o| o.name.clone()),
            object: object.as_ref().map(|o| o.label.clone()),
            annotations: annotations.to_vec(),
        },
        object,
    }
}

/// The node and relation documents for one edge, ready for the graph sink.
/// Every document carries its content-derived `_key`.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreDocuments {
    pub subject: Value,
    /// Absent for subject-only edges.
    pub object: Option<Value>,
    pub relation: Value,
}

/// Derive the store documents for `edge`.
///
/// Node keys hash the annotation- and provenance-free node document, so the
/// same term collapses to the same node no matter which statement produced
/// it. The relation key hashes the relation document *without* `edge_dt`;
/// the timestamp is attached afterwards so re-materializing the same logical
/// edge later yields the same key (idempotent upsert). `nanopub_id` moves
/// under `metadata` on the relation document rather than staying top-level.
pub fn materialize(edge: &Edge, edge_dt: DateTime<Utc>) -> Result<StoreDocuments, HashError> {
    let (subject, subject_key) = node_document(&edge.subject)?;
    let object = edge.object.as_ref().map(node_document).transpose()?;

    let mut relation: Map<String, Value> = match serde_json::to_value(&edge.relation) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            return Err(HashError::Canonicalization(format!(
                "relation payload serialised to a non-object value: {other}"
            )))
        }
        Err(e) => return Err(HashError::Canonicalization(e.to_string())),
    };

    if let Some(Value::String(nanopub_id)) = relation.remove("nanopub_id") {
        relation.insert("metadata".into(), json!({ "nanopub_id": nanopub_id }));
    }

    relation.insert("_from".into(), json!(format!("nodes/{subject_key}")));
    if let Some((_, object_key)) = &object {
        relation.insert("_to".into(), json!(format!("nodes/{object_key}")));
    }

    let relation_key = document_key(&relation)?;
    relation.insert("_key".into(), json!(relation_key));
    relation.insert(
        "edge_dt".into(),
        json!(edge_dt.to_rfc3339_opts(SecondsFormat::Secs, true)),
    );

    Ok(StoreDocuments {
        subject,
        object: object.map(|(doc, _)| doc),
        relation: Value::Object(relation),
    })
}

/// Build one keyed node document from a payload.
fn node_document(payload: &NodePayload) -> Result<(Value, String), HashError> {
    let doc = json!({
        "name": payload.name,
        "label": payload.label,
        "components": payload.components,
    });
    let key = document_key(&doc)?;
    let mut map = doc.as_object().cloned().unwrap_or_default();
    map.insert("_key".into(), json!(key));
    Ok((Value::Object(map), key))
}

// --- tests -------------------------------------------------------------------
