//! Integration tests for catalog loading, caching and id collisions

use api_catalog::{CatalogLoader, CatalogState};
use api_catalog_common::{CatalogConfig, CatalogError, CollisionPolicy, LoadStage};
use pretty_assertions::assert_eq;
use std::fs::{self, File};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

const WIDGETS: &str = r##"{
  "swagger": "2.0",
  "info": {"title": "Widget API", "version": "v1"},
  "paths": {
    "/widgets/{id}": {
      "get": {
        "operationId": "getWidget",
        "parameters": [{"name": "id", "in": "path", "required": true, "type": "string"}],
        "responses": {"200": {"description": "OK", "schema": {"$ref": "#/definitions/Widget"}}}
      }
    }
  },
  "definitions": {
    "Widget": {
      "type": "object",
      "properties": {
        "id": {"type": "string"},
        "parent": {"$ref": "#/definitions/Widget"}
      },
      "required": ["id"]
    }
  }
}"##;

fn orders(title: &str) -> String {
    format!(
        r#"{{
  "swagger": "2.0",
  "info": {{"title": "{}", "version": "v0"}},
  "paths": {{
    "/orders": {{"get": {{"operationId": "getOrders", "responses": {{"200": {{"description": "OK"}}}}}}}}
  }}
}}"#,
        title
    )
}

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn config(models: &Path, cache: &Path) -> CatalogConfig {
    let mut config = CatalogConfig::default();
    config.catalog_path = models.to_path_buf();
    config.cache.dir = cache.to_path_buf();
    config
}

#[test]
fn test_lookups_fail_before_load() {
    let dir = TempDir::new().unwrap();
    let loader = CatalogLoader::new(config(dir.path(), &dir.path().join("cache")));

    assert_eq!(loader.state(), CatalogState::Unloaded);
    assert!(matches!(loader.catalog(), Err(CatalogError::NotLoaded)));
    assert!(matches!(
        loader.category_by_name("Widget API"),
        Err(CatalogError::NotLoaded)
    ));
    assert!(matches!(
        loader.endpoint_by_id("widgetApi_getWidget"),
        Err(CatalogError::NotLoaded)
    ));
}

#[test]
fn test_load_and_lookup() {
    let models = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    write(models.path(), "widgets.json", WIDGETS);
    write(models.path(), "broken.json", "{ nope");

    let mut loader = CatalogLoader::new(config(models.path(), cache.path()));
    let catalog = loader.load_catalog().unwrap();
    assert_eq!(catalog.categories.len(), 1);
    assert_eq!(loader.state(), CatalogState::Loaded);

    let category = loader.category_by_name("widget api").unwrap().unwrap();
    assert_eq!(category.name, "Widget API");
    assert_eq!(category.description, "APIs for Widget API");

    let found = loader.endpoint_by_id("widgetApi_getWidget").unwrap().unwrap();
    assert_eq!(found.category, "Widget API");
    let schema = found.endpoint.responses[0].schema.as_ref().unwrap();
    assert_eq!(schema["example"], serde_json::json!({"id": "string value"}));
    assert_eq!(schema["properties"]["parent"]["_circularRef"], true);

    assert_eq!(loader.total_endpoints().unwrap(), 1);
}

#[test]
fn test_second_loader_is_served_from_cache() {
    let models = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    write(models.path(), "widgets.json", WIDGETS);
    let config = config(models.path(), cache.path());

    let mut first = CatalogLoader::new(config.clone());
    let compiled = first.load_catalog().unwrap().clone();
    assert_eq!(fs::read_dir(cache.path()).unwrap().count(), 1);

    // Same name and mtime, unparseable content: only a cache hit can return the catalog
    let source = models.path().join("widgets.json");
    let modified = fs::metadata(&source).unwrap().modified().unwrap();
    fs::write(&source, "{ broken").unwrap();
    File::options()
        .write(true)
        .open(&source)
        .unwrap()
        .set_modified(modified)
        .unwrap();

    let mut second = CatalogLoader::new(config);
    assert_eq!(second.load_catalog().unwrap(), &compiled);

    assert_eq!(first.load_catalog().unwrap(), &compiled);
    assert_eq!(first.refresh_catalog().unwrap(), &compiled);
}

#[test]
fn test_touched_source_forces_recompile() {
    let models = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    write(models.path(), "widgets.json", WIDGETS);
    let config = config(models.path(), cache.path());

    CatalogLoader::new(config.clone()).load_catalog().unwrap();

    let source = models.path().join("widgets.json");
    let later = fs::metadata(&source).unwrap().modified().unwrap() + Duration::from_secs(5);
    fs::write(&source, orders("Orders")).unwrap();
    File::options()
        .write(true)
        .open(&source)
        .unwrap()
        .set_modified(later)
        .unwrap();

    let mut loader = CatalogLoader::new(config);
    let catalog = loader.load_catalog().unwrap();
    assert_eq!(catalog.categories[0].name, "Orders");
}

#[test]
fn test_cache_disabled_writes_nothing() {
    let models = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    write(models.path(), "widgets.json", WIDGETS);
    let mut config = config(models.path(), &cache.path().join("entries"));
    config.cache.enabled = false;

    let mut loader = CatalogLoader::new(config);
    loader.load_catalog().unwrap();

    assert!(!cache.path().join("entries").exists());
    assert_eq!(loader.invalidate_cache(), 0);
}

#[test]
fn test_invalidate_cache_removes_entries() {
    let models = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    write(models.path(), "widgets.json", WIDGETS);

    let mut loader = CatalogLoader::new(config(models.path(), cache.path()));
    loader.load_catalog().unwrap();

    assert_eq!(loader.invalidate_cache(), 1);
    assert_eq!(fs::read_dir(cache.path()).unwrap().count(), 0);
    assert_eq!(loader.state(), CatalogState::Loaded);
}

#[test]
fn test_missing_root_fails_at_discovery() {
    let dir = TempDir::new().unwrap();
    let mut loader = CatalogLoader::new(config(&dir.path().join("missing"), dir.path()));

    let err = loader.load_catalog().unwrap_err();

    assert_eq!(err.stage(), LoadStage::Discovery);
    assert_eq!(loader.state(), CatalogState::Unloaded);
}

#[test]
fn test_duplicate_operation_ids_are_disambiguated() {
    let models = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    write(models.path(), "ordersV0.json", &orders("Selling Partner API for Orders"));
    write(models.path(), "legacy/ordersLegacy.json", &orders("Orders"));

    let mut loader = CatalogLoader::new(config(models.path(), cache.path()));
    let catalog = loader.load_catalog().unwrap();

    let ids: Vec<&str> = catalog.endpoints().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["orders_getOrders", "orders_ordersV0_getOrders"]);
    assert!(catalog
        .endpoints()
        .all(|e| e.original_operation_id == "getOrders"));
}

#[test]
fn test_same_file_name_in_two_directories_is_disambiguated() {
    let models = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    write(models.path(), "v1/openapi.json", &orders("Orders"));
    write(models.path(), "v2/openapi.json", &orders("Orders"));

    let now = SystemTime::now();
    let newer = models.path().join("v1/openapi.json");
    set_modified(&newer, now - Duration::from_secs(1));
    set_modified(&models.path().join("v2/openapi.json"), now - Duration::from_secs(60));

    let mut loader = CatalogLoader::new(config(models.path(), cache.path()));
    let compiled = loader.load_catalog().unwrap().clone();

    let ids: Vec<&str> = compiled.endpoints().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["orders_getOrders", "orders_v2_openapi_getOrders"]);

    // Unparseable content under the same mtime: only a cache hit succeeds
    fs::write(&newer, "{ broken").unwrap();
    set_modified(&newer, now - Duration::from_secs(1));

    let mut again = CatalogLoader::new(config(models.path(), cache.path()));
    assert_eq!(again.load_catalog().unwrap(), &compiled);
}

fn set_modified(path: &Path, time: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

#[test]
fn test_duplicate_operation_ids_are_rejected() {
    let models = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    write(models.path(), "ordersV0.json", &orders("Selling Partner API for Orders"));
    write(models.path(), "legacy/ordersLegacy.json", &orders("Orders"));

    let mut config = config(models.path(), cache.path());
    config.ids.on_collision = CollisionPolicy::Reject;
    let mut loader = CatalogLoader::new(config);

    let err = loader.load_catalog().unwrap_err();

    match &err {
        CatalogError::DuplicateEndpointId { id, first, second } => {
            assert_eq!(id, "orders_getOrders");
            assert!(first.ends_with("ordersLegacy.json"));
            assert!(second.ends_with("ordersV0.json"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.stage(), LoadStage::Map);
    assert_eq!(loader.state(), CatalogState::Unloaded);
    assert_eq!(fs::read_dir(cache.path()).unwrap().count(), 0);
}
