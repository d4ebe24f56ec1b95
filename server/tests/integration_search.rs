use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use catalog_core::EngineConfig;
use catalog_server::{build_app, build_search, CatalogPaths};
use http_body_util::BodyExt;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;
use tower::ServiceExt;

fn write_catalog(dir: &Path) -> CatalogPaths {
    fs::create_dir_all(dir.join("ebooks")).unwrap();
    fs::write(
        dir.join("primary.jsonl"),
        concat!(
            "{\"id\":1,\"title\":\"Dragon Sky\",\"author\":\"An\",\"genres\":[\"fantasy\"]}\n",
            "{\"id\":2,\"title\":\"Dragon Moon\",\"author\":\"Bao\",\"genres\":[\"fantasy\",\"romance\"]}\n",
            "{\"id\":3,\"title\":\"Rohan's Journey\",\"author\":\"Mai\",\"genres\":[]}\n",
        ),
    )
    .unwrap();
    fs::write(
        dir.join("licensed.json"),
        r#"[{"id":"L-1","title":"Dragon Atlas","author":"Kim","purchase_links":["https://shop.example/atlas"]}]"#,
    )
    .unwrap();
    fs::write(dir.join("ebooks/a.json"), r#"{"id":9,"title":"Cooking for Dragons","author":"Phuong"}"#).unwrap();
    CatalogPaths {
        primary: dir.join("primary.jsonl"),
        licensed: dir.join("licensed.json"),
        ebooks: dir.join("ebooks"),
    }
}

fn app(paths: &CatalogPaths) -> Router {
    build_app(Arc::new(build_search(paths, EngineConfig::default())))
}

async fn call(app: Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn search_merges_all_sources() {
    let dir = tempdir().unwrap();
    let app = app(&write_catalog(dir.path()));

    let (status, json) = call(app, "GET", "/search?q=dragon").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["degraded"], false);
    let combined = json["combined_hits"].as_array().unwrap();
    let tags: Vec<(&str, &str)> = combined
        .iter()
        .map(|h| (h["source_type"].as_str().unwrap(), h["record_id"].as_str().unwrap()))
        .collect();
    assert_eq!(tags, vec![("primary", "1"), ("primary", "2"), ("licensed", "L-1"), ("ebook", "9")]);
    assert_eq!(json["licensed_hits"][0]["purchase_links"][0], "https://shop.example/atlas");
    assert_eq!(json["total_hits"], 4);
}

#[tokio::test]
async fn search_degrades_when_primary_is_unreadable() {
    let dir = tempdir().unwrap();
    let mut paths = write_catalog(dir.path());
    paths.primary = dir.path().join("missing.jsonl");
    let app = app(&paths);

    let (status, json) = call(app, "GET", "/search?q=dragon").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["degraded"], true);
    assert!(json["primary_hits"].as_array().unwrap().is_empty());
    assert_eq!(json["licensed_hits"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn suggest_returns_titles() {
    let dir = tempdir().unwrap();
    let app = app(&write_catalog(dir.path()));

    let (status, json) = call(app.clone(), "GET", "/suggest?q=roh").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["suggestions"], serde_json::json!(["Rohan's Journey"]));

    let (_, json) = call(app, "GET", "/suggest?q=").await;
    assert!(json["suggestions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn rebuild_picks_up_edited_files() {
    let dir = tempdir().unwrap();
    let paths = write_catalog(dir.path());
    let app = app(&paths);

    let (_, status) = call(app.clone(), "GET", "/index/status").await;
    assert_eq!(status["state"], "uninitialized");
    let (_, json) = call(app.clone(), "GET", "/search?q=lantern").await;
    assert!(json["primary_hits"].as_array().unwrap().is_empty());

    let mut content = fs::read_to_string(&paths.primary).unwrap();
    content.push_str("{\"id\":4,\"title\":\"Paper Lantern\",\"author\":\"Thu\"}\n");
    fs::write(&paths.primary, content).unwrap();

    let (code, status) = call(app.clone(), "POST", "/index/rebuild").await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(status["state"], "ready");
    assert_eq!(status["snapshot"]["records"], 4);
    assert_eq!(status["builds"], 2);

    let (_, json) = call(app, "GET", "/search?q=lantern").await;
    assert_eq!(json["primary_hits"][0]["title"], "Paper Lantern");
}

#[tokio::test]
async fn rebuild_failure_is_reported() {
    let dir = tempdir().unwrap();
    let mut paths = write_catalog(dir.path());
    paths.primary = dir.path().join("missing.jsonl");

    let (code, _) = call(app(&paths), "POST", "/index/rebuild").await;
    assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
}
