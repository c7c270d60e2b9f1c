//! HTTP surface for the issue tracker.
//!
//! # Endpoints
//!
//! - `GET /api/issues/{project}` - list issues, query parameters filter by exact match
//! - `POST /api/issues/{project}` - create an issue
//! - `PUT /api/issues/{project}` - update fields of the issue named by `_id`
//! - `DELETE /api/issues/{project}` - delete the issue named by `_id`
//! - `GET /health` - liveness probe
//!
//! Every response is `200 OK` with a JSON body; failures carry an `error`
//! field (see [`response`]).

pub mod issues;
pub mod payload;
pub mod response;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use issue_lib::IssueCollection;
use tokio::sync::Mutex;

/// Shared handler state: the process-wide issue collection.
#[derive(Clone)]
pub struct AppState {
    collection: Arc<Mutex<Box<dyn IssueCollection + Send>>>,
}

impl AppState {
    #[must_use]
    pub fn new(collection: Box<dyn IssueCollection + Send>) -> Self {
        Self {
            collection: Arc::new(Mutex::new(collection)),
        }
    }
}

/// Build the application router.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/issues/:project",
            get(issues::list)
                .post(issues::create)
                .put(issues::update)
                .delete(issues::remove),
        )
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
