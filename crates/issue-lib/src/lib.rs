//! `issue-lib`: project-scoped issue records.
//!
//! Provides the issue data model, the four lifecycle operations, typed list
//! filters, and the [`IssueCollection`] persistence seam with a built-in
//! in-memory collection that can persist to JSONL.
//!
//! # Quick Start
//!
//! ```no_run
//! use issue_lib::{CreatePayload, InMemoryStore, IssueFilter, UpdatePayload, tracker};
//!
//! let mut store = InMemoryStore::open("data/issues.jsonl").unwrap();
//!
//! // Create
//! let issue = tracker::create_issue(
//!     &mut store,
//!     "apitest",
//!     &CreatePayload {
//!         issue_title: Some("Fix login".into()),
//!         issue_text: Some("Button does nothing".into()),
//!         created_by: Some("alice".into()),
//!         ..Default::default()
//!     },
//! )
//! .unwrap();
//!
//! // Query
//! let filter = IssueFilter::from_query("apitest", [("created_by", "alice")]).unwrap();
//! let mine = tracker::list_issues(&store, &filter).unwrap();
//!
//! // Update
//! tracker::update_issue(
//!     &mut store,
//!     "apitest",
//!     &UpdatePayload {
//!         id: Some(issue.id.clone()),
//!         open: Some(false),
//!         ..Default::default()
//!     },
//! )
//! .unwrap();
//! ```

pub mod error;
pub mod jsonl;
pub mod model;
pub mod query;
pub mod store;
pub mod tracker;
pub mod util;

pub use error::{IssueError, Result};
pub use model::{Confirmation, CreatePayload, DeletePayload, Issue, UpdatePayload};
pub use query::{IssueChanges, IssueFilter};
pub use store::{InMemoryStore, IssueCollection, Lookup};
