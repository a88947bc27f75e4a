//! API document model and loading
//!
//! - [`types`]: typed Swagger 2.0 / OpenAPI 3.x document
//! - [`loader`]: discovery, parsing, validation and processing
//! - [`enrich`]: derived operation and parameter fields

pub mod enrich;
pub mod loader;
pub mod types;

pub use enrich::{describe_parameter, enrich_operations};
pub use loader::{
    validate_document, DocumentLoader, ProcessedDocument, SourceDocument, DOCUMENT_EXTENSIONS,
};
pub use types::{
    ApiDocument, Components, HttpMethod, Info, MediaType, Operation, Parameter,
    ParameterLocation, ParameterOrRef, PathItem, RequestBody, Response, Schema, SpecVersion,
    TagInfo,
};
