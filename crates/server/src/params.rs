//! Tool input schemas.
//!
//! Field names are camelCase on the wire. Doc comments become the schema
//! descriptions the host shows to the model.

use rmcp::schemars;
use serde::Deserialize;
use tracker::{
    CreateIssueRequest, IssueNumber, IssueQuery, IssueState, LinkKind, MilestoneNumber, Owner,
    PageSize, ProjectFieldId, ProjectId, ProjectItemId, RepositoryRef, TrackerError,
    UpdateIssueRequest,
};

fn invalid(message: impl Into<String>) -> TrackerError {
    TrackerError::InvalidInput {
        message: message.into(),
    }
}

pub(crate) fn repository(owner: &str, repo: &str) -> Result<RepositoryRef, TrackerError> {
    RepositoryRef::new(owner, repo).ok_or_else(|| invalid("owner and repo must not be blank"))
}

fn owner(login: &str) -> Result<Owner, TrackerError> {
    Owner::new(login).ok_or_else(|| invalid("owner must not be blank"))
}

fn project_id(id: &str) -> Result<ProjectId, TrackerError> {
    ProjectId::new(id).ok_or_else(|| invalid("projectId must not be blank"))
}

fn state(value: Option<&str>) -> Result<Option<IssueState>, TrackerError> {
    value.map(str::parse).transpose()
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListProjectsInput {
    /// User or organization login.
    pub owner: String,
    /// Number of projects to return (1-100, default 20).
    pub first: Option<u32>,
}

impl ListProjectsInput {
    pub(crate) fn owner(&self) -> Result<Owner, TrackerError> {
        owner(&self.owner)
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInput {
    /// Project node id (e.g. `PVT_kwDO...`).
    pub project_id: String,
}

impl ProjectInput {
    pub(crate) fn project_id(&self) -> Result<ProjectId, TrackerError> {
        project_id(&self.project_id)
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListProjectItemsInput {
    /// Project node id.
    pub project_id: String,
    /// Number of items to return (1-100, default 20).
    pub first: Option<u32>,
}

impl ListProjectItemsInput {
    pub(crate) fn project_id(&self) -> Result<ProjectId, TrackerError> {
        project_id(&self.project_id)
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddIssueToProjectInput {
    /// Project node id.
    pub project_id: String,
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Number of the issue to add.
    pub issue_number: u64,
}

impl AddIssueToProjectInput {
    pub(crate) fn project_id(&self) -> Result<ProjectId, TrackerError> {
        project_id(&self.project_id)
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectItemFieldInput {
    /// Project node id.
    pub project_id: String,
    /// Project item node id.
    pub item_id: String,
    /// Project field node id.
    pub field_id: String,
    /// New value: a string (text field), a number (number field), or an
    /// object with exactly one of `text`, `number`, `date`,
    /// `singleSelectOptionId`, `iterationId`.
    pub value: serde_json::Value,
}

impl UpdateProjectItemFieldInput {
    pub(crate) fn ids(&self) -> Result<(ProjectId, ProjectItemId, ProjectFieldId), TrackerError> {
        Ok((
            project_id(&self.project_id)?,
            ProjectItemId::new(&self.item_id).ok_or_else(|| invalid("itemId must not be blank"))?,
            ProjectFieldId::new(&self.field_id)
                .ok_or_else(|| invalid("fieldId must not be blank"))?,
        ))
    }
}

// ---------------------------------------------------------------------------
// Issues
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListIssuesInput {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// `open` or `closed`; both when omitted.
    pub state: Option<String>,
    /// Only issues carrying all of these labels.
    pub labels: Option<Vec<String>>,
    /// Number of issues to return (1-100, default 20).
    pub first: Option<u32>,
}

impl ListIssuesInput {
    pub(crate) fn query(&self) -> Result<IssueQuery, TrackerError> {
        Ok(IssueQuery {
            state: state(self.state.as_deref())?,
            labels: self.labels.clone().unwrap_or_default(),
            first: PageSize::from_request(self.first),
        })
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueInput {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Issue number.
    pub issue_number: u64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateIssueInput {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Issue title. Also used to infer the issue type label.
    pub title: String,
    /// Markdown body.
    pub body: Option<String>,
    /// Label names; the inferred type label is added automatically.
    pub labels: Option<Vec<String>>,
    /// Logins to assign.
    pub assignees: Option<Vec<String>>,
    /// Milestone number.
    pub milestone: Option<u64>,
    /// Issue that should track the new issue.
    pub parent_issue_number: Option<u64>,
}

impl From<CreateIssueInput> for CreateIssueRequest {
    fn from(input: CreateIssueInput) -> Self {
        CreateIssueRequest {
            title: input.title,
            body: input.body,
            labels: input.labels.unwrap_or_default(),
            assignees: input.assignees.unwrap_or_default(),
            milestone: input.milestone.map(MilestoneNumber::new),
            parent: input.parent_issue_number.map(IssueNumber::new),
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIssueInput {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Issue number.
    pub issue_number: u64,
    /// New title.
    pub title: Option<String>,
    /// New markdown body.
    pub body: Option<String>,
    /// `open` or `closed`.
    pub state: Option<String>,
    /// Replaces the label set.
    pub labels: Option<Vec<String>>,
    /// Replaces the assignee set.
    pub assignees: Option<Vec<String>>,
    /// Milestone number.
    pub milestone: Option<u64>,
}

impl UpdateIssueInput {
    pub(crate) fn request(self) -> Result<UpdateIssueRequest, TrackerError> {
        Ok(UpdateIssueRequest {
            state: state(self.state.as_deref())?,
            title: self.title,
            body: self.body,
            labels: self.labels,
            assignees: self.assignees,
            milestone: self.milestone.map(MilestoneNumber::new),
            ..UpdateIssueRequest::new(IssueNumber::new(self.issue_number))
        })
    }
}

// ---------------------------------------------------------------------------
// Relationships
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkIssuesInput {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Parent issue number.
    pub parent_issue_number: u64,
    /// Child issue number.
    pub child_issue_number: u64,
    /// `tracks` (default), `blocks` or `related`.
    pub link_type: Option<String>,
}

impl LinkIssuesInput {
    pub(crate) fn kind(&self) -> Result<LinkKind, TrackerError> {
        self.link_type
            .as_deref()
            .map(str::parse)
            .transpose()
            .map(Option::unwrap_or_default)
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetParentInput {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Issue that gets a parent.
    pub issue_number: u64,
    /// Parent issue number.
    pub parent_issue_number: u64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddSubIssueInput {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Parent issue number.
    pub parent_issue_number: u64,
    /// Sub-issue number.
    pub child_issue_number: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn link_type_defaults_to_tracks() {
        let input: LinkIssuesInput = serde_json::from_value(json!({
            "owner": "acme", "repo": "widgets",
            "parentIssueNumber": 1, "childIssueNumber": 2
        }))
        .unwrap();
        assert_eq!(input.kind().unwrap(), LinkKind::Tracks);
    }

    #[test]
    fn unknown_link_type_is_invalid_input() {
        let input: LinkIssuesInput = serde_json::from_value(json!({
            "owner": "acme", "repo": "widgets",
            "parentIssueNumber": 1, "childIssueNumber": 2, "linkType": "duplicates"
        }))
        .unwrap();
        assert!(matches!(input.kind(), Err(TrackerError::InvalidInput { .. })));
    }

    #[test]
    fn list_issues_query_clamps_and_parses_state() {
        let input: ListIssuesInput = serde_json::from_value(json!({
            "owner": "acme", "repo": "widgets", "state": "CLOSED", "first": 1000
        }))
        .unwrap();
        let query = input.query().unwrap();
        assert_eq!(query.state, Some(IssueState::Closed));
        assert_eq!(query.first.get(), 100);
    }

    #[test]
    fn blank_repository_is_rejected() {
        assert!(repository("acme", " ").is_err());
    }
}
