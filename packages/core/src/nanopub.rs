//! Nanopub wire-format types.
//!
//! A nanopub is a provenance-bearing document wrapping one or more BEL
//! assertions plus contextual annotations (species, tissue, citation, …).
//! The JSON shape nests everything under a top-level `"nanopub"` key:
//!
//! ```json
//! { "nanopub": {
//!     "id": "np-001",
//!     "type": { "name": "BEL", "version": "2.0.0" },
//!     "assertions": [ { "subject": "p(HGNC:AKT1)", "relation": "increases", "object": "bp(GO:\"apoptotic process\")" } ],
//!     "annotations": [ { "type": "Species", "id": "TAX:9606", "label": "human" } ]
//! } }
//! ```
//!
//! Nanopubs are immutable once read; their lifetime is one processing pass.

use serde::{Deserialize, Serialize};

/// Top-level wrapper matching the on-disk document shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NanopubDoc {
    pub nanopub: Nanopub,
}

/// A nanopub: typed header, assertions, annotations, free-form metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Nanopub {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Document type gate: `name` must be `"BEL"` and `version` a supported
    /// specification version for the nanopub to be processed.
    #[serde(rename = "type")]
    pub kind: NanopubType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation: Option<serde_json::Value>,

    #[serde(default)]
    pub assertions: Vec<Assertion>,

    #[serde(default)]
    pub annotations: Vec<Annotation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// The `type` header of a nanopub.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NanopubType {
    pub name: String,
    pub version: String,
}

/// One assertion: subject text, optional relation and object text.
/// A missing relation makes this a subject-only assertion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assertion {
    pub subject: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
}

impl Assertion {
    /// The full statement text handed to the parser:
    /// `"{subject} {relation} {object}"`, or the subject alone.
    pub fn statement_text(&self) -> String {
        match (&self.relation, &self.object) {
            (Some(relation), Some(object)) => {
                format!("{} {} {}", self.subject, relation, object)
            }
            _ => self.subject.clone(),
        }
    }
}

/// A contextual annotation carried by a nanopub onto every edge it produces.
///
/// A persisted annotation must have a type and at least one of id/label;
/// [`enhance_annotations`] enforces that.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Annotation {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Annotation {
    pub fn new(
        kind: impl Into<String>,
        id: Option<String>,
        label: Option<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            id,
            label,
        }
    }
}

/// Repair annotations for persistence: backfill a missing id from the label
/// (and vice versa), drop annotations with no type or with neither id nor
/// label.
pub fn enhance_annotations(annotations: Vec<Annotation>) -> Vec<Annotation> {
    let mut kept = Vec::with_capacity(annotations.len());
    for mut anno in annotations {
        if anno.kind.is_empty() {
            continue;
        }
        match (&anno.id, &anno.label) {
            (Some(_), Some(_)) => {}
            (Some(id), None) => anno.label = Some(id.clone()),
            (None, Some(label)) => anno.id = Some(label.clone()),
            (None, None) => continue,
        }
        kept.push(anno);
    }
    kept
}

// --- tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statement_text_full_and_subject_only() {
        let full = Assertion {
            subject: "p(HGNC:AKT1)".into(),
            relation: Some("increases".into()),
            object: Some("bp(GO:\"apoptotic process\")".into()),
        };
        assert_eq!(
            full.statement_text(),
            "p(HGNC:AKT1) increases bp(GO:\"apoptotic process\")"
        );

        let subject_only = Assertion {
            subject: "act(p(HGNC:AKT1), ma(kin))".into(),
            relation: None,
            object: None,
        };
        assert_eq!(subject_only.statement_text(), "act(p(HGNC:AKT1), ma(kin))");
    }

    #[test]
    fn backfill_label_from_id() {
        let out = enhance_annotations(vec![Annotation::new("Species", Some("9606".into()), None)]);
        assert_eq!(
            out,
            vec![Annotation::new(
                "Species",
                Some("9606".into()),
                Some("9606".into())
            )]
        );
    }

    #[test]
    fn backfill_id_from_label() {
        let out = enhance_annotations(vec![Annotation::new("Tissue", None, Some("liver".into()))]);
        assert_eq!(out[0].id.as_deref(), Some("liver"));
        assert_eq!(out[0].label.as_deref(), Some("liver"));
    }

    #[test]
    fn annotation_without_id_or_label_dropped() {
        let out = enhance_annotations(vec![
            Annotation::new("Species", None, None),
            Annotation::new("Tissue", Some("UBERON:0002107".into()), Some("liver".into())),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, "Tissue");
    }

    #[test]
    fn annotation_without_type_dropped() {
        let out = enhance_annotations(vec![Annotation::new("", Some("9606".into()), None)]);
        assert!(out.is_empty());
    }

    #[test]
    fn nanopub_roundtrip_json() {
        let json = r#"{
            "nanopub": {
                "id": "np-001",
                "type": { "name": "BEL", "version": "2.0.0" },
                "assertions": [
                    { "subject": "p(HGNC:AKT1)", "relation": "increases", "object": "p(HGNC:FOXO3)" },
                    { "subject": "act(p(HGNC:AKT1), ma(kin))" }
                ],
                "annotations": [
                    { "type": "Species", "id": "TAX:9606", "label": "human" }
                ]
            }
        }"#;
        let doc: NanopubDoc = serde_json::from_str(json).unwrap();
        assert_eq!(doc.nanopub.kind.name, "BEL");
        assert_eq!(doc.nanopub.assertions.len(), 2);
        assert!(doc.nanopub.assertions[1].relation.is_none());
        let re = serde_json::to_string(&doc).unwrap();
        let doc2: NanopubDoc = serde_json::from_str(&re).unwrap();
        assert_eq!(doc, doc2);
    }
}
