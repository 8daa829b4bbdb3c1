//! Shared value types for the issue tracking domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! the data the tool surface reads and writes: issues, comments, labels,
//! Projects (v2) boards and the parameter objects handed to the
//! [`crate::ports`] traits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    IssueNodeId, IssueNumber, LabelId, MilestoneId, ProjectFieldId, ProjectId, ProjectItemId,
    RepositoryNodeId, TrackerError, UserId,
};

// ---------------------------------------------------------------------------
// Issue type taxonomy
// ---------------------------------------------------------------------------

/// Keyword-derived category of an issue.
///
/// Never stored on GitHub as a field; it is recomputed from title and body by
/// [`crate::classify`]. The only persisted trace is a label of the same name
/// added at creation time. "Unclassified" is represented as `Option::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    Epic,
    Feature,
    Bug,
    Task,
    Story,
    Documentation,
}

impl IssueType {
    /// Returns the tag used as a label name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Epic => "epic",
            Self::Feature => "feature",
            Self::Bug => "bug",
            Self::Task => "task",
            Self::Story => "story",
            Self::Documentation => "documentation",
        }
    }
}

impl std::fmt::Display for IssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Relationship kinds
// ---------------------------------------------------------------------------

/// Kind of a directed parent → child relationship between two issues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// The parent tracks the child as a sub-task. The only kind the hierarchy
    /// read path reconstructs.
    #[default]
    Tracks,
    /// The parent blocks the child.
    Blocks,
    /// The issues are related without direction semantics.
    Related,
}

impl LinkKind {
    /// Returns the lower-case wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tracks => "tracks",
            Self::Blocks => "blocks",
            Self::Related => "related",
        }
    }
}

impl std::fmt::Display for LinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LinkKind {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tracks" => Ok(Self::Tracks),
            "blocks" => Ok(Self::Blocks),
            "related" => Ok(Self::Related),
            other => Err(TrackerError::InvalidInput {
                message: format!("unknown link type '{other}' (expected tracks, blocks or related)"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Issues
// ---------------------------------------------------------------------------

/// Open/closed state of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl std::str::FromStr for IssueState {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            other => Err(TrackerError::InvalidInput {
                message: format!("unknown issue state '{other}' (expected open or closed)"),
            }),
        }
    }
}

/// A repository label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: LabelId,
    pub name: String,
}

/// A single comment on an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Login of the author. `None` for comments by deleted accounts.
    pub author: Option<String>,
    pub body: String,
    pub created_at: Timestamp,
}

/// An issue as fetched from GitHub.
///
/// `comments` holds whatever window the fetch asked for (most recent first
/// is not guaranteed; GitHub returns the last `N` in chronological order).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: IssueNodeId,
    pub number: IssueNumber,
    pub title: String,
    /// Markdown body. An issue without a description has an empty body.
    pub body: String,
    pub state: IssueState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub labels: Vec<String>,
    pub assignees: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
}

/// Filter for listing repository issues.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueQuery {
    pub state: Option<IssueState>,
    pub labels: Vec<String>,
    pub first: PageSize,
}

/// Parameters for the issue-creation port call. All references are already
/// resolved to node ids.
#[derive(Debug, Clone, PartialEq)]
pub struct NewIssue {
    pub repository_id: RepositoryNodeId,
    pub title: String,
    pub body: Option<String>,
    pub label_ids: Vec<LabelId>,
    pub assignee_ids: Vec<UserId>,
    pub milestone_id: Option<MilestoneId>,
}

/// Parameters for the issue-update port call. `None` leaves a field as is;
/// `Some` replaces it (label and assignee sets are replaced wholesale).
#[derive(Debug, Clone, PartialEq)]
pub struct IssueUpdate {
    pub id: IssueNodeId,
    pub title: Option<String>,
    pub body: Option<String>,
    pub state: Option<IssueState>,
    pub label_ids: Option<Vec<LabelId>>,
    pub assignee_ids: Option<Vec<UserId>>,
    pub milestone_id: Option<MilestoneId>,
}

impl IssueUpdate {
    /// An update that changes nothing.
    pub fn new(id: IssueNodeId) -> Self {
        Self {
            id,
            title: None,
            body: None,
            state: None,
            label_ids: None,
            assignee_ids: None,
            milestone_id: None,
        }
    }

    /// An update that rewrites only the body.
    pub fn body(id: IssueNodeId, body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            ..Self::new(id)
        }
    }
}

// ---------------------------------------------------------------------------
// Page size
// ---------------------------------------------------------------------------

/// Number of records fetched in a single page, always within `1..=100`.
///
/// Pagination beyond one page is not supported; callers ask for at most
/// [`PageSize::MAX`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageSize(u32);

impl PageSize {
    /// Upper bound GitHub accepts for a connection's `first` argument.
    pub const MAX: u32 = 100;
    /// Size used when the caller does not ask for one.
    pub const DEFAULT: u32 = 20;

    /// Creates a page size, clamping to `1..=100`.
    pub fn new(first: u32) -> Self {
        Self(first.clamp(1, Self::MAX))
    }

    /// Creates a page size from an optional request value.
    pub fn from_request(first: Option<u32>) -> Self {
        Self::new(first.unwrap_or(Self::DEFAULT))
    }

    /// Returns the size as a `u32`.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

// ---------------------------------------------------------------------------
// Projects (v2)
// ---------------------------------------------------------------------------

/// A Projects (v2) board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub number: u64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub closed: bool,
    /// Only populated by a single-project fetch.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<ProjectField>,
}

/// A field definition on a project board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectField {
    pub id: ProjectFieldId,
    pub name: String,
    /// GitHub's data type tag (`TEXT`, `NUMBER`, `DATE`, `SINGLE_SELECT`, ...).
    pub data_type: String,
    /// Options of a single-select field; empty for other field kinds.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ProjectFieldOption>,
}

/// One option of a single-select project field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFieldOption {
    pub id: String,
    pub name: String,
}

/// An item on a project board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectItem {
    pub id: ProjectItemId,
    /// `None` when the item's content is not visible to the token.
    pub content: Option<ProjectItemContent>,
}

/// Summary of what a project item points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectItemContent {
    /// GraphQL typename: `Issue`, `PullRequest` or `DraftIssue`.
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// New value for a project item field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProjectFieldValue {
    Text(String),
    Number(f64),
    /// ISO-8601 date (`YYYY-MM-DD`).
    Date(String),
    SingleSelectOptionId(String),
    IterationId(String),
}

impl ProjectFieldValue {
    /// Interprets a loosely typed tool argument.
    ///
    /// A string becomes a text value, a number a number value, and an object
    /// with exactly one of `text`, `number`, `date`, `singleSelectOptionId` or
    /// `iterationId` selects that kind explicitly.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, TrackerError> {
        use serde_json::Value;

        let invalid = |message: String| TrackerError::InvalidInput { message };
        match value {
            Value::String(s) => Ok(Self::Text(s.clone())),
            Value::Number(n) => n
                .as_f64()
                .map(Self::Number)
                .ok_or_else(|| invalid(format!("number {n} is not representable"))),
            Value::Object(map) if map.len() == 1 => {
                serde_json::from_value(value.clone()).map_err(|e| invalid(e.to_string()))
            }
            other => Err(invalid(format!(
                "unsupported field value {other}: expected a string, a number, or an object \
                 with one of text, number, date, singleSelectOptionId, iterationId"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(PageSize::new(0).get(), 1);
        assert_eq!(PageSize::new(500).get(), 100);
        assert_eq!(PageSize::from_request(None).get(), 20);
    }

    #[test]
    fn link_kind_parses_case_insensitively() {
        assert_eq!("Blocks".parse::<LinkKind>().unwrap(), LinkKind::Blocks);
        assert!("parent-of".parse::<LinkKind>().is_err());
        assert_eq!(LinkKind::default(), LinkKind::Tracks);
    }

    #[test]
    fn field_value_from_plain_json() {
        assert_eq!(
            ProjectFieldValue::from_json(&json!("In progress")).unwrap(),
            ProjectFieldValue::Text("In progress".into())
        );
        assert_eq!(
            ProjectFieldValue::from_json(&json!(3)).unwrap(),
            ProjectFieldValue::Number(3.0)
        );
    }

    #[test]
    fn field_value_from_tagged_object() {
        assert_eq!(
            ProjectFieldValue::from_json(&json!({ "singleSelectOptionId": "opt_1" })).unwrap(),
            ProjectFieldValue::SingleSelectOptionId("opt_1".into())
        );
        assert_eq!(
            ProjectFieldValue::from_json(&json!({ "date": "2026-01-31" })).unwrap(),
            ProjectFieldValue::Date("2026-01-31".into())
        );
    }

    #[test]
    fn field_value_rejects_ambiguous_input() {
        assert!(ProjectFieldValue::from_json(&json!(true)).is_err());
        assert!(ProjectFieldValue::from_json(&json!({ "text": "a", "number": 1 })).is_err());
        assert!(ProjectFieldValue::from_json(&json!({ "colour": "red" })).is_err());
    }

    #[test]
    fn issue_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&IssueType::Documentation).unwrap(), "\"documentation\"");
    }
}
