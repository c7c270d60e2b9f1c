//! Issue collections: the persistence seam beneath the lifecycle operations.
//!
//! [`IssueCollection`] is the document-store contract. [`InMemoryStore`] is
//! the built-in implementation; it keeps issues in insertion order and, when
//! opened on a path, rewrites a JSONL file after every mutation.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{IssueError, Result};
use crate::jsonl;
use crate::model::Issue;
use crate::query::{IssueChanges, IssueFilter};
use crate::util::{generate_id, is_valid_id_format};

/// Outcome of a lookup-then-mutate by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// The record existed; carries its state after the operation.
    Found(T),
    /// No record has this id.
    NotFound,
    /// The store failed; carries the fault detail.
    Fault(String),
}

impl<T> From<Result<Option<T>>> for Lookup<T> {
    fn from(result: Result<Option<T>>) -> Self {
        match result {
            Ok(Some(value)) => Self::Found(value),
            Ok(None) => Self::NotFound,
            Err(e) => Self::Fault(e.to_string()),
        }
    }
}

/// Document collection holding issues of every project.
pub trait IssueCollection {
    /// Persist a new issue, assigning its id when empty.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on id collision or persistence failure.
    fn insert(&mut self, issue: Issue) -> Result<Issue>;

    /// All issues matching `filter`, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the backing store cannot be read.
    fn find(&self, filter: &IssueFilter) -> Result<Vec<Issue>>;

    /// Apply `changes` to the issue with `id`, stamping `updated_on`.
    fn find_by_id_and_update(
        &mut self,
        id: &str,
        changes: &IssueChanges,
        updated_on: DateTime<Utc>,
    ) -> Lookup<Issue>;

    /// Remove the issue with `id`, returning the removed record.
    fn find_by_id_and_delete(&mut self, id: &str) -> Lookup<Issue>;
}

/// In-memory issue collection with optional JSONL persistence.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    issues: Vec<Issue>,
    jsonl_path: Option<PathBuf>,
}

impl InMemoryStore {
    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Create a new empty, volatile store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store persisted at `path`.
    ///
    /// A missing file yields an empty store that creates the file on the
    /// first mutation.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let issues = match jsonl::load(path) {
            Ok(issues) => issues,
            Err(IssueError::FileNotFound(_)) => Vec::new(),
            Err(e) => return Err(e),
        };
        debug!(path = %path.display(), count = issues.len(), "Loaded issue collection");

        Ok(Self {
            issues,
            jsonl_path: Some(path.to_path_buf()),
        })
    }

    /// The file this store persists to, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.jsonl_path.as_deref()
    }

    /// Save to a specific file path.
    ///
    /// # Errors
    ///
    /// Returns `Io` on write failure.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        jsonl::save(path.as_ref(), &self.issues)
    }

    /// Get a single issue by ID.
    #[must_use]
    pub fn get_issue(&self, id: &str) -> Option<&Issue> {
        self.issues.iter().find(|issue| issue.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    // ========================================================================
    // Internal Helpers
    // ========================================================================

    fn persist(&self) -> Result<()> {
        match self.jsonl_path {
            Some(ref path) => self.save_to(path),
            None => Ok(()),
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.issues.iter().position(|issue| issue.id == id)
    }
}

impl IssueCollection for InMemoryStore {
    fn insert(&mut self, issue: Issue) -> Result<Issue> {
        let mut new_issue = issue;

        if new_issue.id.is_empty() {
            new_issue.id = generate_id(
                &new_issue.project,
                &new_issue.issue_title,
                &new_issue.created_by,
                new_issue.created_on,
                |id| self.position(id).is_some(),
            );
        } else if self.position(&new_issue.id).is_some() {
            return Err(IssueError::Storage(format!(
                "duplicate id: {}",
                new_issue.id
            )));
        }

        self.issues.push(new_issue.clone());
        if let Err(e) = self.persist() {
            self.issues.pop();
            return Err(IssueError::Storage(e.to_string()));
        }

        Ok(new_issue)
    }

    fn find(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
        Ok(self
            .issues
            .iter()
            .filter(|issue| filter.matches(issue))
            .cloned()
            .collect())
    }

    fn find_by_id_and_update(
        &mut self,
        id: &str,
        changes: &IssueChanges,
        updated_on: DateTime<Utc>,
    ) -> Lookup<Issue> {
        if !is_valid_id_format(id) {
            return Lookup::Fault(format!("malformed id: {id}"));
        }
        let Some(index) = self.position(id) else {
            return Lookup::NotFound;
        };

        let previous = self.issues[index].clone();
        changes.apply_to(&mut self.issues[index], updated_on);

        if let Err(e) = self.persist() {
            self.issues[index] = previous;
            return Lookup::Fault(e.to_string());
        }
        Lookup::Found(self.issues[index].clone())
    }

    fn find_by_id_and_delete(&mut self, id: &str) -> Lookup<Issue> {
        if !is_valid_id_format(id) {
            return Lookup::Fault(format!("malformed id: {id}"));
        }
        let Some(index) = self.position(id) else {
            return Lookup::NotFound;
        };

        let removed = self.issues.remove(index);
        if let Err(e) = self.persist() {
            self.issues.insert(index, removed);
            return Lookup::Fault(e.to_string());
        }
        Lookup::Found(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::now;

    fn make_issue(project: &str, title: &str) -> Issue {
        Issue::new(project, title, "text", "user", now())
    }

    #[test]
    fn test_insert_assigns_id() {
        let mut store = InMemoryStore::new();
        let created = store.insert(make_issue("p", "Test issue")).unwrap();
        assert!(is_valid_id_format(&created.id));
        assert_eq!(store.get_issue(&created.id).unwrap().issue_title, "Test issue");
    }

    #[test]
    fn test_insert_with_explicit_id_collision() {
        let mut store = InMemoryStore::new();
        let mut issue = make_issue("p", "First");
        issue.id = "0123456789abcdef01234567".to_string();
        store.insert(issue.clone()).unwrap();

        let result = store.insert(issue);
        assert!(matches!(result, Err(IssueError::Storage(_))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_identical_inserts_get_distinct_ids() {
        let mut store = InMemoryStore::new();
        let issue = make_issue("p", "Same");
        let a = store.insert(issue.clone()).unwrap();
        let b = store.insert(issue).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_find_keeps_insertion_order_and_scopes_project() {
        let mut store = InMemoryStore::new();
        store.insert(make_issue("p", "one")).unwrap();
        store.insert(make_issue("q", "other")).unwrap();
        store.insert(make_issue("p", "two")).unwrap();

        let found = store.find(&IssueFilter::for_project("p")).unwrap();
        let titles: Vec<&str> = found.iter().map(|i| i.issue_title.as_str()).collect();
        assert_eq!(titles, vec!["one", "two"]);
    }

    #[test]
    fn test_update_found_and_not_found() {
        let mut store = InMemoryStore::new();
        let created = store.insert(make_issue("p", "Original")).unwrap();
        let changes = IssueChanges {
            issue_title: Some("Updated".into()),
            ..Default::default()
        };

        match store.find_by_id_and_update(&created.id, &changes, now()) {
            Lookup::Found(updated) => assert_eq!(updated.issue_title, "Updated"),
            other => panic!("expected Found, got {other:?}"),
        }

        let missing = store.find_by_id_and_update("ffffffffffffffffffffffff", &changes, now());
        assert_eq!(missing, Lookup::NotFound);
    }

    #[test]
    fn test_malformed_id_is_fault() {
        let mut store = InMemoryStore::new();
        let changes = IssueChanges {
            open: Some(false),
            ..Default::default()
        };
        assert!(matches!(
            store.find_by_id_and_update("i2un3489", &changes, now()),
            Lookup::Fault(_)
        ));
        assert!(matches!(
            store.find_by_id_and_delete("29384jfq938jf94"),
            Lookup::Fault(_)
        ));
    }

    #[test]
    fn test_delete_issue() {
        let mut store = InMemoryStore::new();
        let created = store.insert(make_issue("p", "Doomed")).unwrap();

        assert!(matches!(store.find_by_id_and_delete(&created.id), Lookup::Found(_)));
        assert!(store.get_issue(&created.id).is_none());
        assert_eq!(store.find_by_id_and_delete(&created.id), Lookup::NotFound);
    }

    #[test]
    fn test_lookup_from_result() {
        assert_eq!(Lookup::from(Ok(Some(1))), Lookup::Found(1));
        assert_eq!(Lookup::<i32>::from(Ok(None)), Lookup::NotFound);
        assert!(matches!(
            Lookup::<i32>::from(Err(IssueError::Storage("x".into()))),
            Lookup::Fault(_)
        ));
    }

    #[test]
    fn test_open_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("issues.jsonl");
        let store = InMemoryStore::open(&path).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.path(), Some(path.as_path()));
        assert!(!path.exists());
    }

    #[test]
    fn test_mutations_persist_to_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("issues.jsonl");

        let mut store = InMemoryStore::open(&path).unwrap();
        let keep = store.insert(make_issue("p", "Keep")).unwrap();
        let doomed = store.insert(make_issue("p", "Drop")).unwrap();
        let changes = IssueChanges {
            status_text: Some("in qa".into()),
            ..Default::default()
        };
        assert!(matches!(
            store.find_by_id_and_update(&keep.id, &changes, now()),
            Lookup::Found(_)
        ));
        assert!(matches!(store.find_by_id_and_delete(&doomed.id), Lookup::Found(_)));

        let reopened = InMemoryStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.get_issue(&keep.id).unwrap().status_text, "in qa");
    }

    #[test]
    fn test_failed_persist_rolls_back_insert() {
        let dir = tempfile::tempdir().unwrap();
        // A directory squatting on the temp path makes every save fail.
        let path = dir.path().join("issues.jsonl");
        std::fs::create_dir(path.with_extension("jsonl.tmp")).unwrap();

        let mut store = InMemoryStore::open(&path).unwrap();
        let result = store.insert(make_issue("p", "Lost"));
        assert!(matches!(result, Err(IssueError::Storage(_))));
        assert!(store.is_empty());
    }
}
