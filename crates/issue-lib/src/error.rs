//! Error types for `issue-lib`.
//!
//! The `Display` text of the validation and failure variants is part of the
//! observable contract: callers render it verbatim as the `error` field.

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for issue operations.
#[derive(Error, Debug)]
pub enum IssueError {
    // === Validation Errors ===
    /// A required creation field (`issue_title`, `issue_text`, `created_by`) is absent or empty.
    #[error("required field(s) missing")]
    Validation,

    /// An update or delete payload carried no `_id`.
    #[error("missing _id")]
    MissingId,

    /// An update payload carried `_id` and nothing else.
    #[error("no update field(s) sent")]
    NoUpdateFields,

    /// A list filter named an unknown field or carried an unparseable value.
    #[error("invalid filter '{field}': {reason}")]
    InvalidFilter { field: String, reason: String },

    // === Operation Failures ===
    /// Update found no record, or the store faulted while updating.
    #[error("could not update")]
    UpdateFailed { id: String },

    /// Delete found no record, or the store faulted while deleting.
    #[error("could not delete")]
    DeleteFailed { id: String },

    // === Storage Errors ===
    /// Unclassified persistence fault.
    #[error("Storage error: {0}")]
    Storage(String),

    /// JSONL line could not be parsed.
    #[error("JSONL parse error at line {line}: {reason}")]
    JsonlParse { line: usize, reason: String },

    /// File not found at the specified path.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IssueError {
    #[must_use]
    pub fn invalid_filter(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFilter {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error is caller input validation rather than an operation failure.
    ///
    /// Validation errors always reach the caller with their exact text.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation | Self::MissingId | Self::NoUpdateFields | Self::InvalidFilter { .. }
        )
    }

    /// The issue id this error refers to, if any.
    #[must_use]
    pub fn issue_id(&self) -> Option<&str> {
        match self {
            Self::UpdateFailed { id } | Self::DeleteFailed { id } => Some(id),
            _ => None,
        }
    }
}

/// Result type using `IssueError`.
pub type Result<T> = std::result::Result<T, IssueError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_messages() {
        assert_eq!(IssueError::Validation.to_string(), "required field(s) missing");
        assert_eq!(IssueError::MissingId.to_string(), "missing _id");
        assert_eq!(IssueError::NoUpdateFields.to_string(), "no update field(s) sent");
        assert_eq!(
            IssueError::UpdateFailed { id: "x".into() }.to_string(),
            "could not update"
        );
        assert_eq!(
            IssueError::DeleteFailed { id: "x".into() }.to_string(),
            "could not delete"
        );
    }

    #[test]
    fn test_classification() {
        assert!(IssueError::MissingId.is_validation());
        assert!(IssueError::invalid_filter("foo", "unknown field").is_validation());
        assert!(!IssueError::Storage("boom".into()).is_validation());
        assert_eq!(
            IssueError::DeleteFailed { id: "abc".into() }.issue_id(),
            Some("abc")
        );
        assert_eq!(IssueError::NoUpdateFields.issue_id(), None);
    }
}
