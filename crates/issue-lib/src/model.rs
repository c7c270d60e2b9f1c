//! Core data types for issue-lib.
//!
//! The serde shape of [`Issue`] is the wire format: the id travels as `_id`,
//! timestamps as RFC 3339 strings.

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The primary issue entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Issue {
    /// Storage-generated unique ID.
    #[serde(rename = "_id")]
    pub id: String,

    /// Project namespace, fixed at creation.
    pub project: String,

    pub issue_title: String,

    pub issue_text: String,

    /// Creator name.
    pub created_by: String,

    /// Assignee name, empty when unassigned.
    #[serde(default)]
    pub assigned_to: String,

    /// Free-form status line, empty at creation.
    #[serde(default)]
    pub status_text: String,

    /// Whether the issue is still open.
    #[serde(default = "default_open")]
    pub open: bool,

    /// Creation timestamp.
    pub created_on: DateTime<Utc>,

    /// Last update timestamp.
    pub updated_on: DateTime<Utc>,
}

const fn default_open() -> bool {
    true
}

impl Issue {
    /// Build a fresh, not yet persisted issue with creation defaults applied.
    ///
    /// The id is left empty; the collection assigns it on insert.
    #[must_use]
    pub fn new(
        project: impl Into<String>,
        issue_title: impl Into<String>,
        issue_text: impl Into<String>,
        created_by: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: String::new(),
            project: project.into(),
            issue_title: issue_title.into(),
            issue_text: issue_text.into(),
            created_by: created_by.into(),
            assigned_to: String::new(),
            status_text: String::new(),
            open: true,
            created_on: now,
            updated_on: now,
        }
    }
}

/// Create request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePayload {
    #[serde(default)]
    pub issue_title: Option<String>,
    #[serde(default)]
    pub issue_text: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    /// Accepted for compatibility with form clients; new issues always start with an
    /// empty status line.
    #[serde(default)]
    pub status_text: Option<String>,
}

/// Update request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePayload {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub issue_title: Option<String>,
    #[serde(default)]
    pub issue_text: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub status_text: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_bool")]
    pub open: Option<bool>,
}

/// Delete request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeletePayload {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
}

/// Confirmation returned by update and delete.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Confirmation {
    pub result: String,
    #[serde(rename = "_id")]
    pub id: String,
}

impl Confirmation {
    #[must_use]
    pub fn updated(id: impl Into<String>) -> Self {
        Self {
            result: "successfully updated".to_string(),
            id: id.into(),
        }
    }

    #[must_use]
    pub fn deleted(id: impl Into<String>) -> Self {
        Self {
            result: "successfully deleted".to_string(),
            id: id.into(),
        }
    }
}

/// Parse the textual booleans form clients send.
///
/// Empty text means "not sent".
pub fn parse_bool(value: &str) -> Option<Option<bool>> {
    match value.trim().to_lowercase().as_str() {
        "" => Some(None),
        "true" => Some(Some(true)),
        "false" => Some(Some(false)),
        _ => None,
    }
}

/// Accept `true`, `false`, `"true"`, `"false"`, `""` or `null`.
fn deserialize_loose_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    struct LooseBool;

    impl Visitor<'_> for LooseBool {
        type Value = Option<bool>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a boolean or the strings \"true\"/\"false\"")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            parse_bool(v).ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(LooseBool)
}
