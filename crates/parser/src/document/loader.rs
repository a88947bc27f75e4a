//! Document discovery, parsing and processing
//!
//! Discovery walks a directory tree for `.json`, `.yaml` and `.yml` files.
//! Each candidate is parsed into a `serde_json::Value`, checked for the
//! minimum shape of an API document and then typed. Failures on individual
//! files are logged and the file is skipped; only an unusable root
//! directory fails a load.

use super::enrich::enrich_operations;
use super::types::ApiDocument;
use crate::resolver::{ReferenceResolver, DEFAULT_MAX_DEPTH};
use api_catalog_common::{CatalogError, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// File extensions considered API documents
pub const DOCUMENT_EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

/// One parsed, validated file
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    /// File path, used as the document identity
    pub path: PathBuf,

    /// Raw document tree, the target of `$ref` pointers
    pub root: Value,

    /// Typed view of `root`
    pub document: ApiDocument,
}

/// A document with every reference resolved and every operation enriched
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedDocument {
    pub path: PathBuf,
    pub document: ApiDocument,
}

impl SourceDocument {
    /// Validate and type an already-parsed document tree
    pub fn from_value(path: impl Into<PathBuf>, root: Value) -> Result<Self> {
        let path = path.into();
        validate_document(&path, &root)?;

        let document: ApiDocument =
            serde_json::from_value(root.clone()).map_err(|e| CatalogError::Validation {
                path: path.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            path,
            root,
            document,
        })
    }

    pub fn identity(&self) -> String {
        self.path.display().to_string()
    }
}

impl ProcessedDocument {
    /// Document identity (its file path)
    pub fn identity(&self) -> String {
        self.path.display().to_string()
    }

    /// File name without extension (e.g., "ordersV0")
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.identity())
    }

    /// Path below `root` without extension, segments joined by `_`
    /// (e.g., "v2/ordersV0.json" -> "v2_ordersV0")
    ///
    /// Falls back to [`stem`](Self::stem) when the document is not under `root`.
    pub fn relative_name(&self, root: &Path) -> String {
        let Ok(relative) = self.path.strip_prefix(root) else {
            return self.stem();
        };

        let segments: Vec<String> = relative
            .with_extension("")
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        if segments.is_empty() {
            self.stem()
        } else {
            segments.join("_")
        }
    }
}

/// Check the minimum shape of a Swagger/OpenAPI document
pub fn validate_document(path: &Path, root: &Value) -> Result<()> {
    let invalid = |message: &str| CatalogError::Validation {
        path: path.to_path_buf(),
        message: message.to_string(),
    };

    let Value::Object(map) = root else {
        return Err(invalid("document root is not an object"));
    };

    let has_marker = ["swagger", "openapi"]
        .iter()
        .any(|key| map.get(*key).is_some_and(|v| v.is_string()));
    if !has_marker {
        return Err(invalid("missing 'swagger' or 'openapi' version marker"));
    }

    let info = map
        .get("info")
        .and_then(Value::as_object)
        .ok_or_else(|| invalid("missing 'info' object"))?;
    for field in ["title", "version"] {
        if !info.get(field).is_some_and(Value::is_string) {
            return Err(invalid(&format!("missing 'info.{}'", field)));
        }
    }

    if !map.get("paths").is_some_and(Value::is_object) {
        return Err(invalid("missing 'paths' object"));
    }

    Ok(())
}

/// Loads API documents from disk and turns them into processed documents
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    max_depth: usize,
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLoader {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Override the resolver's nesting ceiling
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Find candidate document files under `root`, sorted by path
    pub fn discover(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !root.is_dir() {
            return Err(CatalogError::Discovery {
                path: root.to_path_buf(),
                message: if root.exists() {
                    "not a directory".to_string()
                } else {
                    "directory does not exist".to_string()
                },
            });
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            if has_document_extension(entry.path()) {
                files.push(entry.into_path());
            } else {
                debug!(path = %entry.path().display(), "Skipping non-document file");
            }
        }

        files.sort();
        info!(root = %root.display(), count = files.len(), "Discovered API documents");
        Ok(files)
    }

    /// Parse and validate every file, skipping the ones that fail
    pub fn load_files(&self, files: &[PathBuf]) -> BTreeMap<PathBuf, SourceDocument> {
        let mut documents = BTreeMap::new();

        for path in files {
            match self.load_file(path) {
                Ok(document) => {
                    debug!(
                        path = %path.display(),
                        title = %document.document.info.title,
                        "Loaded API document"
                    );
                    documents.insert(path.clone(), document);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping API document"),
            }
        }

        info!(
            loaded = documents.len(),
            skipped = files.len() - documents.len(),
            "Loaded API documents"
        );
        documents
    }

    /// Discover and load every document under `root`
    pub fn load_all(&self, root: &Path) -> Result<BTreeMap<PathBuf, SourceDocument>> {
        let files = self.discover(root)?;
        Ok(self.load_files(&files))
    }

    /// Read, parse and validate one file
    pub fn load_file(&self, path: &Path) -> Result<SourceDocument> {
        let content = fs::read_to_string(path).map_err(|e| CatalogError::Parse {
            path: path.to_path_buf(),
            message: format!("failed to read file: {}", e),
        })?;

        self.parse_document(path, &content)
    }

    /// Parse file content according to its extension
    pub fn parse_document(&self, path: &Path, content: &str) -> Result<SourceDocument> {
        let parse_error = |message: String| CatalogError::Parse {
            path: path.to_path_buf(),
            message,
        };

        let root: Value = match extension(path).as_deref() {
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string()))?
            }
            _ => serde_json::from_str(content).map_err(|e| parse_error(e.to_string()))?,
        };

        SourceDocument::from_value(path, root)
    }

    /// Resolve every reference and enrich every operation
    ///
    /// The source document is left untouched.
    pub fn process(&self, source: &SourceDocument) -> Result<ProcessedDocument> {
        let resolved = ReferenceResolver::new(&source.root)
            .with_max_depth(self.max_depth)
            .resolve(&source.root);

        let mut document: ApiDocument =
            serde_json::from_value(resolved).map_err(|e| CatalogError::Resolve {
                path: source.path.clone(),
                message: format!("resolved document no longer matches the model: {}", e),
            })?;

        enrich_operations(&mut document);
        document.processed = true;

        debug!(
            path = %source.path.display(),
            operations = document.operation_count(),
            "Processed API document"
        );

        Ok(ProcessedDocument {
            path: source.path.clone(),
            document,
        })
    }

    /// Process every loaded document in path order
    pub fn process_all(
        &self,
        documents: &BTreeMap<PathBuf, SourceDocument>,
    ) -> Result<Vec<ProcessedDocument>> {
        documents.values().map(|doc| self.process(doc)).collect()
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
}

fn has_document_extension(path: &Path) -> bool {
    extension(path).is_some_and(|e| DOCUMENT_EXTENSIONS.contains(&e.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_requires_marker_info_and_paths() {
        let path = Path::new("a.json");
        let ok = json!({"openapi": "3.0.0", "info": {"title": "T", "version": "1"}, "paths": {}});
        assert!(validate_document(path, &ok).is_ok());

        let cases = [
            json!({"info": {"title": "T", "version": "1"}, "paths": {}}),
            json!({"swagger": "2.0", "info": {"version": "1"}, "paths": {}}),
            json!({"swagger": "2.0", "info": {"title": "T"}, "paths": {}}),
            json!({"swagger": "2.0", "info": {"title": "T", "version": "1"}}),
            json!([1, 2, 3]),
        ];
        for case in cases {
            let err = validate_document(path, &case).unwrap_err();
            assert!(matches!(err, CatalogError::Validation { .. }), "{:?}", case);
        }
    }

    #[test]
    fn test_parse_yaml_document() {
        let yaml = r#"
swagger: "2.0"
info:
  title: Sellers
  version: v1
paths:
  /sellers/v1/marketplaceParticipations:
    get:
      operationId: getMarketplaceParticipations
      responses:
        "200":
          description: Success
"#;
        let doc = DocumentLoader::new()
            .parse_document(Path::new("sellers.yaml"), yaml)
            .unwrap();

        assert_eq!(doc.document.info.title, "Sellers");
        assert_eq!(doc.document.operation_count(), 1);
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = DocumentLoader::new()
            .parse_document(Path::new("broken.json"), "{ not json")
            .unwrap_err();

        match err {
            CatalogError::Parse { path, .. } => assert_eq!(path, PathBuf::from("broken.json")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_process_leaves_source_untouched() {
        let source = SourceDocument::from_value(
            "widgets.json",
            json!({
                "swagger": "2.0",
                "info": {"title": "Widgets", "version": "1"},
                "paths": {
                    "/widgets": {
                        "get": {
                            "responses": {"200": {"schema": {"$ref": "#/definitions/W"}}}
                        }
                    }
                },
                "definitions": {"W": {"type": "string"}}
            }),
        )
        .unwrap();
        let before = source.clone();

        let processed = DocumentLoader::new().process(&source).unwrap();

        assert_eq!(source, before);
        assert!(processed.document.processed);
        let get = processed.document.paths["/widgets"].get.as_ref().unwrap();
        assert_eq!(get.method.as_deref(), Some("GET"));
        assert_eq!(
            get.responses["200"].schema.as_ref().unwrap()["_originalRef"],
            "#/definitions/W"
        );
    }

    #[test]
    fn test_stem() {
        let doc = ProcessedDocument {
            path: PathBuf::from("/models/orders-api-model/ordersV0.json"),
            document: serde_json::from_value(json!({
                "swagger": "2.0",
                "info": {"title": "T", "version": "1"},
                "paths": {}
            }))
            .unwrap(),
        };
        assert_eq!(doc.stem(), "ordersV0");
        assert_eq!(doc.relative_name(Path::new("/models")), "orders-api-model_ordersV0");
        assert_eq!(
            doc.relative_name(Path::new("/models/orders-api-model")),
            "ordersV0"
        );
        assert_eq!(doc.relative_name(Path::new("/elsewhere")), "ordersV0");
    }
}
