//! The versioned BEL specification model.
//!
//! A specification document enumerates the relations, functions (with
//! argument signatures), default namespaces, and computed-edge rule sets of
//! one BEL language version. [`SpecCatalog`] holds the documents shipped with
//! this crate; [`Specification`] is the fast lookup structure built from one
//! document.
//!
//! The model is read-only once built. Build once at startup, share by
//! reference everywhere — concurrent readers need no locking.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use thiserror::Error;

use crate::ast::FunctionClass;

/// Specification documents compiled into this crate, one per supported
/// BEL version.
const BUILTIN_DOCUMENTS: &[&str] = &[include_str!("../specifications/bel_v2_0_0.json")];

/// Errors returned while loading or building a [`Specification`].
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("unknown BEL version {version:?}; supported versions: {supported:?}")]
    UnknownVersion {
        version: String,
        supported: Vec<String>,
    },

    #[error("invalid specification document: {0}")]
    InvalidDocument(String),
}

// ---------------------------------------------------------------------------
// Raw document shape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawSpec {
    version: String,
    relations: RawRelations,
    functions: RawFunctions,
    #[serde(default)]
    namespaces: BTreeMap<String, RawNamespace>,
    #[serde(default)]
    computed_signatures: BTreeMap<String, Vec<ComputedRule>>,
}

#[derive(Debug, Deserialize)]
struct RawRelations {
    info: BTreeMap<String, RawRelationInfo>,
}

#[derive(Debug, Deserialize)]
struct RawRelationInfo {
    abbreviation: String,
}

#[derive(Debug, Deserialize)]
struct RawFunctions {
    info: BTreeMap<String, RawFunctionInfo>,
    signatures: BTreeMap<String, RawSignatureSet>,
}

#[derive(Debug, Deserialize)]
struct RawFunctionInfo {
    abbreviation: String,
    #[serde(rename = "type")]
    class: FunctionClass,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct RawSignatureSet {
    signatures: Vec<RawSignature>,
}

#[derive(Debug, Deserialize)]
struct RawSignature {
    arguments: Vec<ArgSlot>,
}

#[derive(Debug, Deserialize)]
struct RawNamespace {
    info: Vec<RawNamespaceEntry>,
}

#[derive(Debug, Deserialize)]
struct RawNamespaceEntry {
    name: String,
    abbreviation: String,
    /// Alternate single-letter abbreviation (amino acids).
    #[serde(default)]
    abbrev1: Option<String>,
}

// ---------------------------------------------------------------------------
// Built model
// ---------------------------------------------------------------------------

/// The type of one argument slot in a function signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ArgKind {
    /// A nested primary-function call.
    Function,
    /// A nested modifier-function call.
    Modifier,
    /// A namespace term.
    NSArg,
    /// A string literal.
    StrArg,
    /// A string literal or a namespace term.
    StrArgNSArg,
}

/// One argument slot of a function signature, as declared in the
/// specification document.
#[derive(Debug, Clone, Deserialize)]
pub struct ArgSlot {
    #[serde(rename = "type")]
    pub kind: ArgKind,
    /// Permitted nested function names (for `Function`/`Modifier` slots) or
    /// entity/namespace type names (for value slots).
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub multiple: bool,
    /// 1-based position for position-dependent optional slots.
    #[serde(default)]
    pub position: Option<u32>,
}

/// A declarative computed-edge rule: when its trigger function appears in a
/// canonicalized statement, a new statement with `relation` is synthesized
/// from the trigger and its enclosing function.
#[derive(Debug, Clone, Deserialize)]
pub struct ComputedRule {
    /// Rule name, the key used by the rule filter (e.g. `"component"`).
    pub name: String,
    /// Long-form relation of the synthesized statement.
    pub relation: String,
    pub subject: RuleTransform,
    pub object: RuleTransform,
}

/// How one side of a synthesized statement is derived from a rule's trigger
/// occurrence. A closed set: adding a transform means changing this enum,
/// adding a rule does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleTransform {
    /// The triggering function call itself.
    Trigger,
    /// One term per function-call argument of the trigger.
    TriggerArgs,
    /// The enclosing function call; the rule does not fire when the trigger
    /// is top-level.
    Parent,
    /// The enclosing function call with modifier-function arguments removed.
    ParentStripped,
    /// One term per namespace argument of the trigger, each wrapped in a
    /// fresh call of the enclosing function.
    PartnerWrapped,
}

/// Bidirectional long/short name lookup built from a document section.
#[derive(Debug, Default)]
pub struct NameTable {
    to_long: HashMap<String, String>,
    to_short: HashMap<String, String>,
    list_long: Vec<String>,
    list_short: Vec<String>,
}

impl NameTable {
    fn insert(&mut self, long: &str, short: &str) {
        self.list_long.push(long.to_string());
        self.list_short.push(short.to_string());
        self.to_long.insert(long.to_string(), long.to_string());
        self.to_long.insert(short.to_string(), long.to_string());
        self.to_short.insert(long.to_string(), short.to_string());
        self.to_short.insert(short.to_string(), short.to_string());
    }

    /// Add an alternate spelling that maps to an already-inserted pair.
    fn insert_alias(&mut self, alias: &str, long: &str, short: &str) {
        self.to_long.insert(alias.to_string(), long.to_string());
        self.to_short.insert(alias.to_string(), short.to_string());
    }

    /// Long form for any known spelling.
    pub fn to_long(&self, name: &str) -> Option<&str> {
        self.to_long.get(name).map(String::as_str)
    }

    /// Short form for any known spelling.
    pub fn to_short(&self, name: &str) -> Option<&str> {
        self.to_short.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.to_long.contains_key(name)
    }

    /// Long forms in document order.
    pub fn list_long(&self) -> &[String] {
        &self.list_long
    }

    /// Short forms in document order.
    pub fn list_short(&self) -> &[String] {
        &self.list_short
    }
}

/// Metadata for one function.
#[derive(Debug, Clone)]
pub struct FunctionInfo {
    pub long: String,
    pub short: String,
    pub class: FunctionClass,
    pub description: String,
}

/// One validated signature of a function: the declared slots plus the
/// classified views used by semantic validation, and the presentation
/// strings used by editor/CLI help.
///
/// Every slot lands in exactly one of the four classified lists.
#[derive(Debug, Clone)]
pub struct Signature {
    pub arguments: Vec<ArgSlot>,
    pub required: Vec<ArgSlot>,
    pub positional_optional: Vec<ArgSlot>,
    pub optional: Vec<ArgSlot>,
    pub multiple: Vec<ArgSlot>,
    /// `name(NSArg, var()*, loc()?)`-style one-line summary. Presentation
    /// only; no effect on parsing or inference.
    pub summary: String,
    /// One help sentence per declared slot, in slot order.
    pub help: Vec<String>,
}

/// Signature help for one function, as returned by
/// [`Specification::function_help`].
#[derive(Debug, Clone)]
pub struct FunctionHelp {
    pub summary: String,
    pub argument_help: Vec<String>,
    pub description: String,
}

/// The fast lookup model for one BEL version. Immutable once built.
#[derive(Debug)]
pub struct Specification {
    version: String,
    relations: NameTable,
    functions: NameTable,
    function_info: HashMap<String, FunctionInfo>,
    signatures: HashMap<String, Vec<Signature>>,
    primary_long: Vec<String>,
    modifier_long: Vec<String>,
    namespaces: BTreeMap<String, NameTable>,
    rules: BTreeMap<String, Vec<ComputedRule>>,
}

impl Specification {
    /// Build a specification from a raw JSON document.
    pub fn from_document(document: &str) -> Result<Self, SpecError> {
        let raw: RawSpec = serde_json::from_str(document)
            .map_err(|e| SpecError::InvalidDocument(e.to_string()))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSpec) -> Result<Self, SpecError> {
        // (a) relation maps
        let mut relations = NameTable::default();
        for (long, info) in &raw.relations.info {
            relations.insert(long, &info.abbreviation);
        }

        // (b) function maps and primary/modifier partition
        let mut functions = NameTable::default();
        let mut function_info = HashMap::new();
        let mut primary_long = Vec::new();
        let mut modifier_long = Vec::new();
        for (long, info) in &raw.functions.info {
            functions.insert(long, &info.abbreviation);
            match info.class {
                FunctionClass::Primary => primary_long.push(long.clone()),
                FunctionClass::Modifier => modifier_long.push(long.clone()),
            }
            function_info.insert(
                long.clone(),
                FunctionInfo {
                    long: long.clone(),
                    short: info.abbreviation.clone(),
                    class: info.class,
                    description: info.description.clone(),
                },
            );
        }

        // (c) + (d) per-signature slot classification and presentation help
        let mut signatures = HashMap::new();
        for (name, set) in &raw.functions.signatures {
            if !function_info.contains_key(name) {
                return Err(SpecError::InvalidDocument(format!(
                    "signature declared for unknown function {name:?}"
                )));
            }
            let built: Vec<Signature> = set
                .signatures
                .iter()
                .map(|sig| build_signature(name, sig, &functions))
                .collect();
            signatures.insert(name.clone(), built);
        }

        // namespace tables, with the alternate-abbreviation fallback
        let mut namespaces = BTreeMap::new();
        for (ns_name, ns) in &raw.namespaces {
            let mut table = NameTable::default();
            for entry in &ns.info {
                table.insert(&entry.name, &entry.abbreviation);
                if let Some(alt) = &entry.abbrev1 {
                    table.insert_alias(alt, &entry.name, &entry.abbreviation);
                }
            }
            namespaces.insert(ns_name.clone(), table);
        }

        // computed-edge rules, keyed by trigger long name; rule order is
        // document order
        let mut rules = BTreeMap::new();
        for (trigger, rule_list) in raw.computed_signatures {
            if !function_info.contains_key(&trigger) {
                return Err(SpecError::InvalidDocument(format!(
                    "computed rule declared for unknown function {trigger:?}"
                )));
            }
            for rule in &rule_list {
                if !relations.contains(&rule.relation) {
                    return Err(SpecError::InvalidDocument(format!(
                        "computed rule {:?} uses unknown relation {:?}",
                        rule.name, rule.relation
                    )));
                }
            }
            rules.insert(trigger, rule_list);
        }

        Ok(Self {
            version: raw.version,
            relations,
            functions,
            function_info,
            signatures,
            primary_long,
            modifier_long,
            namespaces,
            rules,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn relations(&self) -> &NameTable {
        &self.relations
    }

    pub fn functions(&self) -> &NameTable {
        &self.functions
    }

    /// Metadata for a function, by any known spelling.
    pub fn function_info(&self, name: &str) -> Option<&FunctionInfo> {
        self.functions
            .to_long(name)
            .and_then(|long| self.function_info.get(long))
    }

    /// Signatures for a function, by any known spelling.
    pub fn signatures(&self, name: &str) -> Option<&[Signature]> {
        self.functions
            .to_long(name)
            .and_then(|long| self.signatures.get(long))
            .map(Vec::as_slice)
    }

    /// Long names of primary functions, in document order.
    pub fn primary_functions(&self) -> &[String] {
        &self.primary_long
    }

    /// Long names of modifier functions, in document order.
    pub fn modifier_functions(&self) -> &[String] {
        &self.modifier_long
    }

    /// Lookup table for a default namespace (e.g. `"Activity"`).
    pub fn namespace(&self, name: &str) -> Option<&NameTable> {
        self.namespaces.get(name)
    }

    /// Computed-edge rules triggered by `function` (long name), in document
    /// order.
    pub fn rules_for(&self, function: &str) -> Option<&[ComputedRule]> {
        self.rules.get(function).map(Vec::as_slice)
    }

    /// Signature summaries and per-argument help for `function` (any known
    /// spelling). Empty when the function is unknown.
    pub fn function_help(&self, function: &str) -> Vec<FunctionHelp> {
        let Some(info) = self.function_info(function) else {
            return vec![];
        };
        let Some(signatures) = self.signatures.get(&info.long) else {
            return vec![];
        };
        signatures
            .iter()
            .map(|sig| FunctionHelp {
                summary: sig.summary.clone(),
                argument_help: sig.help.clone(),
                description: info.description.clone(),
            })
            .collect()
    }
}

/// Classify a raw signature's slots and build its presentation strings.
///
/// Classification order mirrors the specification: `multiple` wins, then
/// position-dependent optional, then position-independent optional, then
/// required — each slot lands in exactly one class.
fn build_signature(function: &str, raw: &RawSignature, functions: &NameTable) -> Signature {
    let mut required = Vec::new();
    let mut positional_optional = Vec::new();
    let mut optional = Vec::new();
    let mut multiple = Vec::new();

    let mut summary_parts: Vec<String> = Vec::new();
    let mut help = Vec::new();

    for slot in &raw.arguments {
        match slot {
            s if s.multiple => multiple.push(s.clone()),
            s if s.optional && s.position.is_some() => positional_optional.push(s.clone()),
            s if s.optional => optional.push(s.clone()),
            s => required.push(s.clone()),
        }

        let marker = if slot.optional && !slot.multiple {
            "?"
        } else if slot.optional {
            "*"
        } else {
            ""
        };

        match slot.kind {
            ArgKind::Function | ArgKind::Modifier => {
                let shorts: Vec<&str> = slot
                    .values
                    .iter()
                    .map(|v| functions.to_short(v).unwrap_or(v.as_str()))
                    .collect();
                summary_parts.push(format!("{}(){}", shorts.join("|"), marker));
                let listing = slot.values.join(", ");
                help.push(match (slot.optional, slot.multiple) {
                    (true, false) => format!("Zero or one of each function(s): {listing}"),
                    (true, true) => format!("Zero or more of each function(s): {listing}"),
                    _ => format!("One of following function(s): {listing}"),
                });
            }
            ArgKind::NSArg | ArgKind::StrArg | ArgKind::StrArgNSArg => {
                let label = match slot.kind {
                    ArgKind::NSArg => "NSArg",
                    ArgKind::StrArg => "StrArg",
                    _ => "StrArgNSArg",
                };
                summary_parts.push(format!("{label}{marker}"));
                let listing = slot.values.join(", ");
                let noun = match slot.kind {
                    ArgKind::NSArg => "namespace argument",
                    ArgKind::StrArgNSArg => "namespace argument or default namespace argument",
                    _ => "string argument",
                };
                help.push(match (slot.optional, slot.multiple) {
                    (true, false) => {
                        format!("Zero or one {noun} of following type(s): {listing}")
                    }
                    (true, true) => {
                        format!("Zero or more {noun}s of following type(s): {listing}")
                    }
                    _ => format!("{noun} of following type(s): {listing}"),
                });
            }
        }
    }

    Signature {
        arguments: raw.arguments.clone(),
        required,
        positional_optional,
        optional,
        multiple,
        summary: format!("{}({})", function, summary_parts.join(", ")),
        help,
    }
}

// ---------------------------------------------------------------------------
// SpecCatalog
// ---------------------------------------------------------------------------

/// The set of BEL versions this process can handle.
///
/// Built once at startup and shared by reference; see the crate-level notes
/// on concurrency.
#[derive(Debug)]
pub struct SpecCatalog {
    specs: BTreeMap<String, Specification>,
}

impl SpecCatalog {
    /// Catalog of the specification documents compiled into this crate.
    ///
    /// # Panics
    ///
    /// Panics if a bundled document is malformed — a build defect, not a
    /// runtime condition.
    pub fn builtin() -> Self {
        let mut specs = BTreeMap::new();
        for document in BUILTIN_DOCUMENTS {
            let spec = Specification::from_document(document)
                .expect("bundled specification document is invalid");
            specs.insert(spec.version.clone(), spec);
        }
        Self { specs }
    }

    /// Build a catalog from caller-provided documents.
    pub fn from_documents<'a>(
        documents: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, SpecError> {
        let mut specs = BTreeMap::new();
        for document in documents {
            let spec = Specification::from_document(document)?;
            specs.insert(spec.version.clone(), spec);
        }
        Ok(Self { specs })
    }

    /// Supported versions, ascending.
    pub fn versions(&self) -> Vec<String> {
        self.specs.keys().cloned().collect()
    }

    /// The specification for `version`, or [`SpecError::UnknownVersion`].
    pub fn get(&self, version: &str) -> Result<&Specification, SpecError> {
        self.specs
            .get(version)
            .ok_or_else(|| SpecError::UnknownVersion {
                version: version.to_string(),
                supported: self.versions(),
            })
    }
}

impl Default for SpecCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

// --- tests -------------------------------------------------------------------
