//! Response shaping.
//!
//! Failures render as `{ "error": message }`, plus `"_id"` for update and
//! delete whenever the caller's payload carried one. Messages of validation
//! and operation failures are exact; any other fault is hidden behind a
//! generic message.

use axum::Json;
use axum::response::{IntoResponse, Response};
use issue_lib::IssueError;
use serde::Serialize;
use serde_json::Value;

/// Message shown for faults whose detail stays in the logs.
pub const UNEXPECTED_ERROR: &str = "unexpected error occurred";

/// Error response body.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

impl ErrorBody {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            id: None,
        }
    }

    /// Echo the caller's `_id` as it was sent.
    #[must_use]
    pub fn with_id(mut self, id: Option<&Value>) -> Self {
        self.id = id.cloned();
        self
    }

    /// Body for an operation error.
    #[must_use]
    pub fn from_error(err: &IssueError) -> Self {
        Self::new(public_message(err))
    }

    /// Body for an update or delete error, echoing `id` or else the id the
    /// error names.
    #[must_use]
    pub fn for_target(err: &IssueError, id: Option<&Value>) -> Self {
        let body = Self::from_error(err);
        match id {
            Some(id) => body.with_id(Some(id)),
            None => {
                let named = err.issue_id().map(Value::from);
                body.with_id(named.as_ref())
            }
        }
    }
}

impl IntoResponse for ErrorBody {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Caller-visible text for an operation error.
#[must_use]
pub fn public_message(err: &IssueError) -> String {
    match err {
        IssueError::UpdateFailed { .. } | IssueError::DeleteFailed { .. } => err.to_string(),
        _ if err.is_validation() => err.to_string(),
        _ => UNEXPECTED_ERROR.to_string(),
    }
}
