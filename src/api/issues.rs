//! Issue route handlers.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use issue_lib::{CreatePayload, DeletePayload, IssueError, IssueFilter, UpdatePayload, tracker};
use serde_json::Value;
use tracing::{debug, warn};

use super::AppState;
use super::payload::{Payload, RawPayload};
use super::response::ErrorBody;

/// `GET /api/issues/{project}`
pub async fn list(
    State(state): State<AppState>,
    Path(project): Path<String>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Response {
    let filter = match IssueFilter::from_query(&project, &params) {
        Ok(filter) => filter,
        Err(e) => {
            debug!(%project, error = %e, "Rejected list filter");
            return ErrorBody::from_error(&e).into_response();
        }
    };

    let collection = state.collection.lock().await;
    match tracker::list_issues(&**collection, &filter) {
        Ok(issues) => Json(issues).into_response(),
        Err(e) => ErrorBody::from_error(&e).into_response(),
    }
}

/// `POST /api/issues/{project}`
pub async fn create(
    State(state): State<AppState>,
    Path(project): Path<String>,
    Payload(payload): Payload<CreatePayload>,
) -> Response {
    let mut collection = state.collection.lock().await;
    match tracker::create_issue(&mut **collection, &project, &payload) {
        Ok(issue) => Json(issue).into_response(),
        Err(e) => ErrorBody::from_error(&e).into_response(),
    }
}

/// `PUT /api/issues/{project}`
pub async fn update(
    State(state): State<AppState>,
    Path(project): Path<String>,
    raw: RawPayload,
) -> Response {
    let echo = raw.id().cloned();
    let payload: UpdatePayload = match raw.decode() {
        Ok(payload) => payload,
        Err(e) => {
            let failed = |id| IssueError::UpdateFailed { id };
            let err = undecodable(&project, echo.as_ref(), &e, failed);
            return ErrorBody::for_target(&err, echo.as_ref()).into_response();
        }
    };

    let mut collection = state.collection.lock().await;
    match tracker::update_issue(&mut **collection, &project, &payload) {
        Ok(confirmation) => Json(confirmation).into_response(),
        Err(e) => ErrorBody::for_target(&e, echo.as_ref()).into_response(),
    }
}

/// `DELETE /api/issues/{project}`
pub async fn remove(
    State(state): State<AppState>,
    Path(project): Path<String>,
    raw: RawPayload,
) -> Response {
    let echo = raw.id().cloned();
    let payload: DeletePayload = match raw.decode() {
        Ok(payload) => payload,
        Err(e) => {
            let failed = |id| IssueError::DeleteFailed { id };
            let err = undecodable(&project, echo.as_ref(), &e, failed);
            return ErrorBody::for_target(&err, echo.as_ref()).into_response();
        }
    };

    let mut collection = state.collection.lock().await;
    match tracker::delete_issue(&mut **collection, &project, &payload) {
        Ok(confirmation) => Json(confirmation).into_response(),
        Err(e) => ErrorBody::for_target(&e, echo.as_ref()).into_response(),
    }
}

/// Error for a body whose fields did not fit the payload type.
///
/// Without an `_id` this is still `MissingId`; otherwise the target cannot
/// be addressed and the operation fails like any other store fault.
fn undecodable(
    project: &str,
    id: Option<&Value>,
    detail: &serde_json::Error,
    failed: impl FnOnce(String) -> IssueError,
) -> IssueError {
    let Some(id) = id else {
        return IssueError::MissingId;
    };
    let id = match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    warn!(project, %id, %detail, "Payload fields have the wrong type");
    failed(id)
}
