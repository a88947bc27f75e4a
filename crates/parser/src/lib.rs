//! Swagger 2.0 / OpenAPI 3.x document processing
//!
//! This crate turns a directory of raw API documents into processed
//! documents ready for cataloguing.
//!
//! ## Pipeline
//!
//! 1. [`DocumentLoader::discover`] walks the tree for `.json`/`.yaml`/`.yml`
//! 2. [`DocumentLoader::load_files`] parses and validates each file,
//!    skipping (and logging) the ones that fail
//! 3. [`DocumentLoader::process`] resolves every local `$ref` with
//!    [`ReferenceResolver`] and enriches every operation
//!
//! [`SchemaProcessor`] is applied later, per schema, when endpoints are built.

pub mod document;
pub mod naming;
pub mod resolver;
pub mod schema;

pub use document::{
    describe_parameter, ApiDocument, DocumentLoader, HttpMethod, Operation, Parameter,
    ParameterLocation, ParameterOrRef, PathItem, ProcessedDocument, RequestBody, Response,
    SourceDocument, SpecVersion,
};
pub use resolver::{is_circular, ref_name, ReferenceResolver, DEFAULT_MAX_DEPTH, ORIGINAL_REF};
pub use schema::{describe_type, SchemaProcessor, TYPE_DESCRIPTION};
