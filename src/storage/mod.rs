//! `SQLite` storage layer for `issue_tracker`.
//!
//! Provides [`SqliteStore`], an [`issue_lib::IssueCollection`] backed by a
//! single `issues` table. The in-memory/JSONL collection lives in `issue_lib`.

pub mod sqlite;

pub use sqlite::{ISSUES_TABLE_SCHEMA, SqliteStore};
