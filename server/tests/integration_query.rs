use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use invert_core::build::build_from_entries;
use invert_core::catalog::{write_doc_catalog, write_forward_index, write_term_catalog};
use invert_core::persist::IndexPaths;
use invert_core::{DocId, ForwardEntry};
use serde_json::Value;
use tempfile::tempdir;
use tower::ServiceExt;

fn build_tiny_index(dir: &std::path::Path) {
    let paths = IndexPaths::new(dir);
    // "rust" appears twice in docs/0.html and once in docs/1.html
    let entries = vec![
        ForwardEntry::new(1, 1, vec![1, 4]),
        ForwardEntry::new(1, 2, vec![2]),
        ForwardEntry::new(2, 1, vec![3]),
    ];
    let docs: [(DocId, String); 2] = [(1, "docs/0.html".into()), (2, "docs/1.html".into())];
    write_doc_catalog(&paths.doc_ids, &docs).unwrap();
    write_term_catalog(&paths.term_ids, &[(1, "rust".into()), (2, "system".into())]).unwrap();
    write_forward_index(&paths.forward, &entries).unwrap();
    build_from_entries(&paths, entries).unwrap();
}

async fn call(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::get(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

fn app_for(dir: &std::path::Path) -> Router {
    server::build_app(dir.to_string_lossy().to_string()).unwrap()
}

#[tokio::test]
async fn doc_stats_by_name() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());

    let (status, json) = call(app_for(dir.path()), "/doc/docs/0.html").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["doc_id"], 1);
    assert_eq!(json["distinct_terms"], 2);
    assert_eq!(json["total_terms"], 3);
}

#[tokio::test]
async fn term_stats_normalize_the_query() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());

    let (status, json) = call(app_for(dir.path()), "/term/Systems").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["term_id"], 2);
    assert_eq!(json["document_count"], 1);

    let (status, json) = call(app_for(dir.path()), "/term/rust").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_occurrences"], 3);
    assert_eq!(json["document_count"], 2);
}

#[tokio::test]
async fn postings_lookup() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());

    let (status, json) = call(app_for(dir.path()), "/postings?term=rust&doc=docs/0.html").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["frequency"], 2);
    assert_eq!(json["positions"], serde_json::json!([1, 4]));

    let (status, json) = call(app_for(dir.path()), "/postings?term=system&doc=docs/1.html").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["frequency"], 0);
    assert_eq!(json["positions"], serde_json::json!([]));
}

#[tokio::test]
async fn unknown_names_are_404() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());

    let (status, json) = call(app_for(dir.path()), "/doc/nope.html").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("nope.html"));

    let (status, _) = call(app_for(dir.path()), "/term/zebra").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[test]
fn missing_index_fails_to_load() {
    let dir = tempdir().unwrap();
    assert!(server::build_app(dir.path().join("none")).is_err());
}
