//! BEL semantic engine.
//!
//! This crate turns parsed BEL statements into canonical, content-addressed
//! graph documents. It is pure and synchronous: parsing text, talking to a
//! term store, and writing to a graph store are collaborator concerns,
//! reached through the traits in [`engine`] and [`resolve`]. The async
//! runtime around those collaborators lives in the `belgraph-pipeline`
//! crate; the `belgraph` CLI sits on top of both.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`spec`] | Versioned specification model: relations, functions, signatures, computed-edge rules |
//! | [`ast`] | Statement tree: namespace terms, string arguments, function calls, nested statements |
//! | [`nanopub`] | Nanopub wire types and annotation repair |
//! | [`resolve`] | Term-resolution and orthology collaborator traits |
//! | [`canon`] | Canonicalization, decanonicalized labels, orthologization |
//! | [`compute`] | Rule-based computed-edge inference |
//! | [`validate`] | Semantic signature validation |
//! | [`edge`] | Edge materialization and store documents |
//! | [`hash`] | Content-addressed key derivation |
//! | [`engine`] | The `create_edges` entry point |
//!
//! # Quick start
//!
//! ```rust,ignore
//! use belgraph::{create_edges, EdgeOptions, EngineContext, NullResolver, SpecCatalog};
//!
//! let catalog = SpecCatalog::builtin();
//! let ctx = EngineContext {
//!     catalog: &catalog,
//!     parser: &my_parser,
//!     resolver: &NullResolver,
//!     orthology: None,
//! };
//! let output = create_edges(&nanopub, &ctx, &EdgeOptions::default())?;
//! for edge in &output.edges {
//!     println!("{} [{}]", edge.relation.edge_hash, edge.relation.edge_type);
//! }
//! ```

pub mod ast;
pub mod canon;
pub mod compute;
pub mod edge;
pub mod engine;
pub mod hash;
pub mod nanopub;
pub mod resolve;
pub mod spec;
pub mod validate;

pub use ast::{FuncCall, FunctionClass, NsArg, Statement, StatementObject, Term};
pub use canon::{
    canonicalize, decanonicalize_statement, decanonicalize_term, orthologize,
    orthologize_context, CanonicalizeReport, OrthologyOutcome,
};
pub use compute::{compute_edges, SKIP_RULE};
pub use edge::{make_edge, materialize, Edge, EdgeDoc, EdgeType, StoreDocuments};
pub use engine::{
    create_edges, AssertionParser, EdgeOptions, EngineContext, EngineError, EngineOutput,
    MessageLevel, ParseError, ValidationMessage,
};
pub use hash::{content_hash, document_key, HashError};
pub use nanopub::{enhance_annotations, Annotation, Assertion, Nanopub, NanopubDoc, NanopubType};
pub use resolve::{
    NamespaceTargets, NullResolver, Orthology, OrthologyResolver, ResolutionError, TermResolver,
};
pub use spec::{SpecCatalog, SpecError, Specification};
pub use validate::{validate_statement, ValidationError};
