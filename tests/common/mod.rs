#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, header};
use http_body_util::BodyExt;
use issue_lib::{InMemoryStore, IssueCollection};
use issue_tracker::api::{AppState, router};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Router over a fresh in-memory collection.
pub fn memory_app() -> Router {
    app_with(Box::new(InMemoryStore::new()))
}

pub fn app_with(collection: Box<dyn IssueCollection + Send>) -> Router {
    router(AppState::new(collection))
}

/// Send a request and decode the JSON response body.
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Value {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), 200, "every response is 200 OK");
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Send a urlencoded form body.
pub async fn send_form(app: &Router, method: Method, uri: &str, form: &str) -> Value {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), 200);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Create an issue and return the stored record.
pub async fn create(app: &Router, project: &str, title: &str, creator: &str) -> Value {
    let issue = send(
        app,
        Method::POST,
        &format!("/api/issues/{project}"),
        Some(json!({
            "issue_title": title,
            "issue_text": format!("text for {title}"),
            "created_by": creator,
        })),
    )
    .await;
    assert!(issue.get("error").is_none(), "create failed: {issue}");
    issue
}

pub async fn list(app: &Router, project: &str, query: &str) -> Vec<Value> {
    let uri = if query.is_empty() {
        format!("/api/issues/{project}")
    } else {
        format!("/api/issues/{project}?{query}")
    };
    match send(app, Method::GET, &uri, None).await {
        Value::Array(items) => items,
        other => panic!("expected array, got {other}"),
    }
}

pub fn id_of(issue: &Value) -> String {
    issue["_id"].as_str().unwrap().to_string()
}
