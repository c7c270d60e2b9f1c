//! Query and change types for issue operations.

use chrono::{DateTime, Utc};

use crate::error::{IssueError, Result};
use crate::model::{Issue, UpdatePayload, parse_bool};
use crate::util::is_millisecond_precision;

/// Fields to overwrite on an issue.
///
/// Each `Some` replaces the stored value wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueChanges {
    pub issue_title: Option<String>,
    pub issue_text: Option<String>,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
    pub status_text: Option<String>,
    pub open: Option<bool>,
}

impl IssueChanges {
    /// Collect the change fields of an update payload.
    ///
    /// Empty strings count as not sent, so the required text fields can never be
    /// blanked by an update.
    #[must_use]
    pub fn from_payload(payload: &UpdatePayload) -> Self {
        let sent = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());
        Self {
            issue_title: sent(&payload.issue_title),
            issue_text: sent(&payload.issue_text),
            created_by: sent(&payload.created_by),
            assigned_to: sent(&payload.assigned_to),
            status_text: sent(&payload.status_text),
            open: payload.open,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.issue_title.is_none()
            && self.issue_text.is_none()
            && self.created_by.is_none()
            && self.assigned_to.is_none()
            && self.status_text.is_none()
            && self.open.is_none()
    }

    /// Overwrite the supplied fields and stamp `updated_on`.
    ///
    /// `updated_on` never moves before `created_on`.
    pub fn apply_to(&self, issue: &mut Issue, updated_on: DateTime<Utc>) {
        if let Some(ref title) = self.issue_title {
            issue.issue_title.clone_from(title);
        }
        if let Some(ref text) = self.issue_text {
            issue.issue_text.clone_from(text);
        }
        if let Some(ref creator) = self.created_by {
            issue.created_by.clone_from(creator);
        }
        if let Some(ref assignee) = self.assigned_to {
            issue.assigned_to.clone_from(assignee);
        }
        if let Some(ref status) = self.status_text {
            issue.status_text.clone_from(status);
        }
        if let Some(open) = self.open {
            issue.open = open;
        }
        issue.updated_on = updated_on.max(issue.created_on);
    }
}

/// Exact-match filter for listing the issues of one project.
///
/// Every `Some` field must equal the issue's value for the issue to match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueFilter {
    pub project: String,
    pub id: Option<String>,
    pub issue_title: Option<String>,
    pub issue_text: Option<String>,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
    pub status_text: Option<String>,
    pub open: Option<bool>,
    pub created_on: Option<DateTime<Utc>>,
    pub updated_on: Option<DateTime<Utc>>,
}

impl IssueFilter {
    /// Filter matching every issue of `project`.
    #[must_use]
    pub fn for_project(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            ..Default::default()
        }
    }

    /// Build a filter from raw query parameters.
    ///
    /// A `project` parameter is ignored; the caller's project always wins.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFilter` for an unknown field name or an unparseable
    /// `open`/timestamp value.
    pub fn from_query<I, K, V>(project: impl Into<String>, params: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut filter = Self::for_project(project);
        for (key, value) in params {
            filter.set(key.as_ref(), value.as_ref())?;
        }
        Ok(filter)
    }

    fn set(&mut self, field: &str, value: &str) -> Result<()> {
        match field {
            "project" => {}
            "_id" => self.id = Some(value.to_string()),
            "issue_title" => self.issue_title = Some(value.to_string()),
            "issue_text" => self.issue_text = Some(value.to_string()),
            "created_by" => self.created_by = Some(value.to_string()),
            "assigned_to" => self.assigned_to = Some(value.to_string()),
            "status_text" => self.status_text = Some(value.to_string()),
            "open" => {
                self.open = match parse_bool(value) {
                    Some(Some(open)) => Some(open),
                    _ => {
                        return Err(IssueError::invalid_filter(
                            field,
                            format!("expected true or false, got '{value}'"),
                        ));
                    }
                };
            }
            "created_on" => self.created_on = Some(parse_timestamp(field, value)?),
            "updated_on" => self.updated_on = Some(parse_timestamp(field, value)?),
            other => return Err(IssueError::invalid_filter(other, "unknown field")),
        }
        Ok(())
    }

    #[must_use]
    pub fn matches(&self, issue: &Issue) -> bool {
        fn eq<T: PartialEq + ?Sized>(expected: Option<&T>, actual: &T) -> bool {
            expected.is_none_or(|e| e == actual)
        }

        issue.project == self.project
            && eq(self.id.as_deref(), issue.id.as_str())
            && eq(self.issue_title.as_deref(), issue.issue_title.as_str())
            && eq(self.issue_text.as_deref(), issue.issue_text.as_str())
            && eq(self.created_by.as_deref(), issue.created_by.as_str())
            && eq(self.assigned_to.as_deref(), issue.assigned_to.as_str())
            && eq(self.status_text.as_deref(), issue.status_text.as_str())
            && eq(self.open.as_ref(), &issue.open)
            && eq(self.created_on.as_ref(), &issue.created_on)
            && eq(self.updated_on.as_ref(), &issue.updated_on)
    }
}

/// Stored timestamps are whole milliseconds, so a finer instant can never
/// match exactly and is rejected.
fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>> {
    let ts = DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            IssueError::invalid_filter(field, format!("expected RFC 3339 timestamp: {e}"))
        })?;
    if !is_millisecond_precision(ts) {
        return Err(IssueError::invalid_filter(field, "timestamps have millisecond precision"));
    }
    Ok(ts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn issue(project: &str, title: &str, creator: &str) -> Issue {
        let mut issue = Issue::new(project, title, "text", creator, Utc::now());
        issue.id = format!("{title}-id");
        issue
    }

    #[test]
    fn test_project_only_filter() {
        let filter = IssueFilter::for_project("alpha");
        assert!(filter.matches(&issue("alpha", "one", "bob")));
        assert!(!filter.matches(&issue("beta", "one", "bob")));
    }

    #[test]
    fn test_from_query_compound() {
        let filter = IssueFilter::from_query(
            "alpha",
            [("created_by", "bob"), ("issue_text", "text"), ("open", "true")],
        )
        .unwrap();
        assert!(filter.matches(&issue("alpha", "one", "bob")));
        assert!(!filter.matches(&issue("alpha", "one", "jim")));

        let mut closed = issue("alpha", "two", "bob");
        closed.open = false;
        assert!(!filter.matches(&closed));
    }

    #[test]
    fn test_from_query_ignores_project_param() {
        let filter = IssueFilter::from_query("alpha", [("project", "beta")]).unwrap();
        assert_eq!(filter, IssueFilter::for_project("alpha"));
    }

    #[test]
    fn test_from_query_by_id() {
        let filter = IssueFilter::from_query("alpha", [("_id", "one-id")]).unwrap();
        assert!(filter.matches(&issue("alpha", "one", "bob")));
        assert!(!filter.matches(&issue("alpha", "two", "bob")));
    }

    #[test]
    fn test_from_query_rejects_unknown_field() {
        let err = IssueFilter::from_query("alpha", [("priority", "high")]).unwrap_err();
        assert!(matches!(err, IssueError::InvalidFilter { ref field, .. } if field == "priority"));
    }

    #[test]
    fn test_from_query_rejects_bad_values() {
        assert!(IssueFilter::from_query("a", [("open", "yes")]).is_err());
        assert!(IssueFilter::from_query("a", [("open", "")]).is_err());
        assert!(IssueFilter::from_query("a", [("created_on", "yesterday")]).is_err());
    }

    #[test]
    fn test_timestamp_filter_exact_instant() {
        let mut target = issue("alpha", "one", "bob");
        target.created_on = crate::util::now();
        let stamp = target.created_on.to_rfc3339();
        let filter = IssueFilter::from_query("alpha", [("created_on", stamp.as_str())]).unwrap();
        assert!(filter.matches(&target));
    }

    #[test]
    fn test_timestamp_filter_rejects_sub_millisecond() {
        let finer = crate::util::now() + chrono::Duration::microseconds(400);
        let stamp = finer.to_rfc3339();
        let err = IssueFilter::from_query("alpha", [("created_on", stamp.as_str())]).unwrap_err();
        assert!(
            matches!(err, IssueError::InvalidFilter { ref field, .. } if field == "created_on")
        );
    }

    #[test]
    fn test_changes_from_payload_drops_empty_strings() {
        let payload = UpdatePayload {
            id: Some("x".into()),
            issue_title: Some(String::new()),
            status_text: Some("in qa".into()),
            ..Default::default()
        };
        let changes = IssueChanges::from_payload(&payload);
        assert_eq!(changes.issue_title, None);
        assert_eq!(changes.status_text.as_deref(), Some("in qa"));
        assert!(!changes.is_empty());

        let only_id = UpdatePayload {
            id: Some("x".into()),
            issue_text: Some(String::new()),
            ..Default::default()
        };
        assert!(IssueChanges::from_payload(&only_id).is_empty());
    }

    #[test]
    fn test_apply_overwrites_only_supplied_fields() {
        let mut target = issue("alpha", "one", "bob");
        let before = target.clone();
        let changes = IssueChanges {
            issue_title: Some("renamed".into()),
            open: Some(false),
            ..Default::default()
        };
        let later = before.created_on + chrono::Duration::seconds(5);
        changes.apply_to(&mut target, later);

        assert_eq!(target.issue_title, "renamed");
        assert!(!target.open);
        assert_eq!(target.issue_text, before.issue_text);
        assert_eq!(target.created_by, before.created_by);
        assert_eq!(target.created_on, before.created_on);
        assert_eq!(target.updated_on, later);
    }

    #[test]
    fn test_apply_never_moves_updated_before_created() {
        let mut target = issue("alpha", "one", "bob");
        let earlier = target.created_on - chrono::Duration::seconds(5);
        IssueChanges {
            status_text: Some("x".into()),
            ..Default::default()
        }
        .apply_to(&mut target, earlier);
        assert_eq!(target.updated_on, target.created_on);
    }

    proptest! {
        #[test]
        fn prop_filter_on_own_fields_always_matches(
            title in "[a-z]{1,8}",
            creator in "[a-z]{1,8}",
            assignee in "[a-z]{0,8}",
            open in any::<bool>(),
        ) {
            let mut target = issue("proj", &title, &creator);
            target.assigned_to = assignee.clone();
            target.open = open;
            let open_text = open.to_string();
            let filter = IssueFilter::from_query(
                "proj",
                [
                    ("issue_title", title.as_str()),
                    ("created_by", creator.as_str()),
                    ("assigned_to", assignee.as_str()),
                    ("open", open_text.as_str()),
                ],
            )
            .unwrap();
            prop_assert!(filter.matches(&target));
        }

        #[test]
        fn prop_filter_on_other_creator_never_matches(
            creator in "[a-z]{1,8}",
            other in "[A-Z]{1,8}",
        ) {
            let target = issue("proj", "title", &creator);
            let filter = IssueFilter::from_query("proj", [("created_by", other.as_str())]).unwrap();
            prop_assert!(!filter.matches(&target));
        }
    }
}
