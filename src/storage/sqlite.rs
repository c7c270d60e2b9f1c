//! `SQLite` storage implementation.

use std::path::Path;

use chrono::{DateTime, Utc};
use issue_lib::util::{format_timestamp, generate_id, is_millisecond_precision, is_valid_id_format};
use issue_lib::{Issue, IssueChanges, IssueCollection, IssueError, IssueFilter, Lookup, Result};
use rusqlite::types::{Type, Value};
use rusqlite::{Connection, OptionalExtension, Transaction, params, params_from_iter};
use tracing::debug;

/// Schema for the issues table.
///
/// Row order (`rowid`) is insertion order.
pub const ISSUES_TABLE_SCHEMA: &str = r"
    CREATE TABLE IF NOT EXISTS issues (
        id TEXT PRIMARY KEY,
        project TEXT NOT NULL,
        issue_title TEXT NOT NULL,
        issue_text TEXT NOT NULL,
        created_by TEXT NOT NULL,
        assigned_to TEXT NOT NULL DEFAULT '',
        status_text TEXT NOT NULL DEFAULT '',
        open INTEGER NOT NULL DEFAULT 1,
        created_on TEXT NOT NULL,
        updated_on TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_issues_project ON issues(project);
";

const ISSUE_COLUMNS: &str = "id, project, issue_title, issue_text, created_by, assigned_to, \
                             status_text, open, created_on, updated_on";

/// SQLite-based issue collection.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

#[allow(clippy::needless_pass_by_value)]
fn storage_err(e: rusqlite::Error) -> IssueError {
    IssueError::Storage(e.to_string())
}

impl SqliteStore {
    /// Open (creating if needed) the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the connection cannot be established or the schema
    /// cannot be applied.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(storage_err)?;
        debug!(path = %path.display(), "Opened SQLite issue store");
        Self::with_connection(conn)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory().map_err(storage_err)?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(ISSUES_TABLE_SCHEMA).map_err(storage_err)?;
        Ok(Self { conn })
    }

    /// Get a single issue by ID.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the query fails.
    pub fn get_issue(&self, id: &str) -> Result<Option<Issue>> {
        select_by_id(&self.conn, id).map_err(storage_err)
    }

    /// Check whether an issue ID exists.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the query fails.
    pub fn id_exists(&self, id: &str) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM issues WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .map_err(storage_err)?;
        Ok(count > 0)
    }

    /// Count every stored issue.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the query fails.
    pub fn count_issues(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM issues", [], |row| row.get(0))
            .map_err(storage_err)?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn update_in_tx(
        tx: &Transaction,
        id: &str,
        changes: &IssueChanges,
        updated_on: DateTime<Utc>,
    ) -> rusqlite::Result<Option<Issue>> {
        let Some(mut issue) = select_by_id(tx, id)? else {
            return Ok(None);
        };
        changes.apply_to(&mut issue, updated_on);

        tx.execute(
            "UPDATE issues SET issue_title = ?1, issue_text = ?2, created_by = ?3,
                 assigned_to = ?4, status_text = ?5, open = ?6, updated_on = ?7
             WHERE id = ?8",
            params![
                issue.issue_title,
                issue.issue_text,
                issue.created_by,
                issue.assigned_to,
                issue.status_text,
                issue.open,
                format_timestamp(issue.updated_on),
                id,
            ],
        )?;
        Ok(Some(issue))
    }

    fn delete_in_tx(tx: &Transaction, id: &str) -> rusqlite::Result<Option<Issue>> {
        let Some(issue) = select_by_id(tx, id)? else {
            return Ok(None);
        };
        tx.execute("DELETE FROM issues WHERE id = ?1", [id])?;
        Ok(Some(issue))
    }
}

impl IssueCollection for SqliteStore {
    fn insert(&mut self, issue: Issue) -> Result<Issue> {
        let mut new_issue = issue;
        if new_issue.id.is_empty() {
            new_issue.id = generate_id(
                &new_issue.project,
                &new_issue.issue_title,
                &new_issue.created_by,
                new_issue.created_on,
                |id| self.id_exists(id).unwrap_or(false),
            );
        }

        self.conn
            .execute(
                &format!(
                    "INSERT INTO issues ({ISSUE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
                ),
                params![
                    new_issue.id,
                    new_issue.project,
                    new_issue.issue_title,
                    new_issue.issue_text,
                    new_issue.created_by,
                    new_issue.assigned_to,
                    new_issue.status_text,
                    new_issue.open,
                    format_timestamp(new_issue.created_on),
                    format_timestamp(new_issue.updated_on),
                ],
            )
            .map_err(storage_err)?;

        Ok(new_issue)
    }

    fn find(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
        let (clause, values) = where_clause(filter);
        let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE {clause} ORDER BY rowid");

        let mut stmt = self.conn.prepare(&sql).map_err(storage_err)?;
        let issues = stmt
            .query_map(params_from_iter(values), issue_from_row)
            .map_err(storage_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(storage_err)?;
        Ok(issues)
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
        let result = self.conn.transaction().and_then(|tx| {
            let updated = Self::update_in_tx(&tx, id, changes, updated_on)?;
            tx.commit()?;
            Ok(updated)
        });
        result.map_err(storage_err).into()
    }

    fn find_by_id_and_delete(&mut self, id: &str) -> Lookup<Issue> {
        if !is_valid_id_format(id) {
            return Lookup::Fault(format!("malformed id: {id}"));
        }
        let result = self.conn.transaction().and_then(|tx| {
            let removed = Self::delete_in_tx(&tx, id)?;
            tx.commit()?;
            Ok(removed)
        });
        result.map_err(storage_err).into()
    }
}

/// Compile a filter into a parameterized `WHERE` clause.
fn where_clause(filter: &IssueFilter) -> (String, Vec<Value>) {
    let mut clauses = vec!["project = ?".to_string()];
    let mut values = vec![Value::Text(filter.project.clone())];

    let text_fields = [
        ("id", &filter.id),
        ("issue_title", &filter.issue_title),
        ("issue_text", &filter.issue_text),
        ("created_by", &filter.created_by),
        ("assigned_to", &filter.assigned_to),
        ("status_text", &filter.status_text),
    ];
    for (column, expected) in text_fields {
        if let Some(value) = expected {
            clauses.push(format!("{column} = ?"));
            values.push(Value::Text(value.clone()));
        }
    }

    if let Some(open) = filter.open {
        clauses.push("open = ?".to_string());
        values.push(Value::Integer(i64::from(open)));
    }

    for (column, expected) in [
        ("created_on", filter.created_on),
        ("updated_on", filter.updated_on),
    ] {
        if let Some(ts) = expected {
            if is_millisecond_precision(ts) {
                clauses.push(format!("{column} = ?"));
                values.push(Value::Text(format_timestamp(ts)));
            } else {
                // Stored text has millisecond precision; a finer instant never matches.
                clauses.push("0".to_string());
            }
        }
    }

    (clauses.join(" AND "), values)
}

fn select_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<Issue>> {
    conn.query_row(
        &format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE id = ?1"),
        [id],
        issue_from_row,
    )
    .optional()
}

fn parse_timestamp(idx: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn issue_from_row(row: &rusqlite::Row) -> rusqlite::Result<Issue> {
    let created_on: String = row.get(8)?;
    let updated_on: String = row.get(9)?;
    Ok(Issue {
        id: row.get(0)?,
        project: row.get(1)?,
        issue_title: row.get(2)?,
        issue_text: row.get(3)?,
        created_by: row.get(4)?,
        assigned_to: row.get(5)?,
        status_text: row.get(6)?,
        open: row.get(7)?,
        created_on: parse_timestamp(8, &created_on)?,
        updated_on: parse_timestamp(9, &updated_on)?,
    })
}
