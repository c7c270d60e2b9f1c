//! Issue lifecycle operations: create, list, update, delete.
//!
//! Each operation takes the collection it works against; the collection's
//! lifetime belongs to the caller. Validation errors reach the caller
//! verbatim. Update and delete failures of any other kind are normalized to
//! `UpdateFailed` / `DeleteFailed`, with the hidden detail logged.

use tracing::{debug, error, info, warn};

use crate::error::{IssueError, Result};
use crate::model::{Confirmation, CreatePayload, DeletePayload, Issue, UpdatePayload};
use crate::query::{IssueChanges, IssueFilter};
use crate::store::{IssueCollection, Lookup};
use crate::util::now;

fn required(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

/// Create an issue in `project`.
///
/// # Errors
///
/// Returns `Validation` if `issue_title`, `issue_text` or `created_by` is
/// absent or empty, or the collection's error if the insert fails.
pub fn create_issue<C>(collection: &mut C, project: &str, payload: &CreatePayload) -> Result<Issue>
where
    C: IssueCollection + ?Sized,
{
    let (Some(title), Some(text), Some(creator)) = (
        required(payload.issue_title.as_ref()),
        required(payload.issue_text.as_ref()),
        required(payload.created_by.as_ref()),
    ) else {
        debug!(project, "Create rejected: required field(s) missing");
        return Err(IssueError::Validation);
    };

    let mut issue = Issue::new(project, title, text, creator, now());
    if let Some(ref assignee) = payload.assigned_to {
        issue.assigned_to.clone_from(assignee);
    }

    let created = collection.insert(issue).inspect_err(|e| {
        error!(project, error = %e, "Failed to insert issue");
    })?;
    info!(project, id = %created.id, "Created issue");
    Ok(created)
}

/// List the issues matching `filter`.
///
/// # Errors
///
/// Returns `Storage` if the collection cannot be read.
pub fn list_issues<C>(collection: &C, filter: &IssueFilter) -> Result<Vec<Issue>>
where
    C: IssueCollection + ?Sized,
{
    match collection.find(filter) {
        Ok(issues) => {
            debug!(project = %filter.project, count = issues.len(), "Listed issues");
            Ok(issues)
        }
        Err(e) => {
            error!(project = %filter.project, error = %e, "Failed to list issues");
            Err(match e {
                IssueError::Storage(_) => e,
                other => IssueError::Storage(other.to_string()),
            })
        }
    }
}

/// Overwrite the supplied fields of the issue named by `payload._id`.
///
/// `project` is informational only: it neither selects nor rewrites the record.
///
/// # Errors
///
/// Returns `MissingId`, `NoUpdateFields`, or `UpdateFailed` for a missing
/// record or any store fault.
pub fn update_issue<C>(
    collection: &mut C,
    project: &str,
    payload: &UpdatePayload,
) -> Result<Confirmation>
where
    C: IssueCollection + ?Sized,
{
    let Some(id) = required(payload.id.as_ref()) else {
        return Err(IssueError::MissingId);
    };

    let changes = IssueChanges::from_payload(payload);
    if changes.is_empty() {
        return Err(IssueError::NoUpdateFields);
    }

    match collection.find_by_id_and_update(id, &changes, now()) {
        Lookup::Found(_) => {
            info!(project, id, "Updated issue");
            Ok(Confirmation::updated(id))
        }
        Lookup::NotFound => {
            warn!(project, id, "Update target not found");
            Err(IssueError::UpdateFailed { id: id.to_string() })
        }
        Lookup::Fault(detail) => {
            warn!(project, id, %detail, "Update failed");
            Err(IssueError::UpdateFailed { id: id.to_string() })
        }
    }
}

/// Permanently remove the issue named by `payload._id`.
///
/// `project` is informational only.
///
/// # Errors
///
/// Returns `MissingId`, or `DeleteFailed` for a missing record or any store fault.
pub fn delete_issue<C>(
    collection: &mut C,
    project: &str,
    payload: &DeletePayload,
) -> Result<Confirmation>
where
    C: IssueCollection + ?Sized,
{
    let Some(id) = required(payload.id.as_ref()) else {
        return Err(IssueError::MissingId);
    };

    match collection.find_by_id_and_delete(id) {
        Lookup::Found(_) => {
            info!(project, id, "Deleted issue");
            Ok(Confirmation::deleted(id))
        }
        Lookup::NotFound => {
            warn!(project, id, "Delete target not found");
            Err(IssueError::DeleteFailed { id: id.to_string() })
        }
        Lookup::Fault(detail) => {
            warn!(project, id, %detail, "Delete failed");
            Err(IssueError::DeleteFailed { id: id.to_string() })
        }
    }
}
