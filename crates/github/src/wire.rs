//! Response shapes of the GraphQL documents in [`crate::queries`] and their
//! conversion into domain types.
//!
//! Field names follow GitHub's schema (camelCase). Nullable schema fields are
//! `Option`s here; a `null` where the domain needs a value becomes
//! [`tracker::TrackerError::NotFound`] at the call site.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracker::{
    Comment, Issue, IssueNodeId, IssueNumber, IssueState, Label, LabelId, MilestoneId, Project,
    ProjectField, ProjectFieldId, ProjectFieldOption, ProjectId, ProjectItem, ProjectItemContent,
    ProjectItemId, RepositoryNodeId, Timestamp, UserId,
};

/// Any GraphQL connection queried for `nodes` only.
#[derive(Debug, Deserialize)]
pub(crate) struct Connection<T> {
    pub nodes: Vec<Option<T>>,
}

impl<T> Connection<T> {
    /// Drops `null` entries (items hidden from the token).
    pub fn into_vec(self) -> Vec<T> {
        self.nodes.into_iter().flatten().collect()
    }
}

// ---------------------------------------------------------------------------
// Issues
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct Name {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Login {
    pub login: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommentNode {
    pub author: Option<Login>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IssueNode {
    pub id: IssueNodeId,
    pub number: IssueNumber,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
    pub url: Option<String>,
    pub labels: Option<Connection<Name>>,
    pub assignees: Option<Connection<Login>>,
    #[serde(default)]
    pub comments: Option<Connection<CommentNode>>,
}

impl From<IssueNode> for Issue {
    fn from(node: IssueNode) -> Self {
        Issue {
            id: node.id,
            number: node.number,
            title: node.title,
            body: node.body.unwrap_or_default(),
            state: if node.state.eq_ignore_ascii_case("closed") {
                IssueState::Closed
            } else {
                IssueState::Open
            },
            url: node.url,
            labels: node
                .labels
                .map(|c| c.into_vec().into_iter().map(|l| l.name).collect())
                .unwrap_or_default(),
            assignees: node
                .assignees
                .map(|c| c.into_vec().into_iter().map(|u| u.login).collect())
                .unwrap_or_default(),
            comments: node
                .comments
                .map(|c| {
                    c.into_vec()
                        .into_iter()
                        .map(|c| Comment {
                            author: c.author.map(|a| a.login),
                            body: c.body,
                            created_at: Timestamp::from_utc(c.created_at),
                        })
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct NodeId<T> {
    pub id: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepositoryIdData {
    pub repository: Option<NodeId<RepositoryNodeId>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IssueRepository {
    pub issue: Option<IssueNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GetIssueData {
    pub repository: Option<IssueRepository>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IssuesRepository {
    pub issues: Connection<IssueNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListIssuesData {
    pub repository: Option<IssuesRepository>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LabelNode {
    pub id: LabelId,
    pub name: String,
}

impl From<LabelNode> for Label {
    fn from(node: LabelNode) -> Self {
        Label {
            id: node.id,
            name: node.name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LabelsRepository {
    pub labels: Connection<LabelNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListLabelsData {
    pub repository: Option<LabelsRepository>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserIdData {
    pub user: Option<NodeId<UserId>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MilestoneRepository {
    pub milestone: Option<NodeId<MilestoneId>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MilestoneIdData {
    pub repository: Option<MilestoneRepository>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IssuePayload {
    pub issue: Option<IssueNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateIssueData {
    pub create_issue: Option<IssuePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateIssueData {
    pub update_issue: Option<IssuePayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TypeData {
    #[serde(rename = "__type")]
    pub type_: Option<Name>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddSubIssueData {
    pub add_sub_issue: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Projects (v2)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProjectNode {
    pub id: ProjectId,
    pub number: u64,
    pub title: String,
    pub short_description: Option<String>,
    pub url: Option<String>,
    pub closed: bool,
    #[serde(default)]
    pub fields: Option<Connection<FieldNode>>,
}

impl From<ProjectNode> for Project {
    fn from(node: ProjectNode) -> Self {
        Project {
            id: node.id,
            number: node.number,
            title: node.title,
            short_description: node.short_description.filter(|d| !d.is_empty()),
            url: node.url,
            closed: node.closed,
            fields: node
                .fields
                .map(|c| c.into_vec().into_iter().filter_map(FieldNode::into_field).collect())
                .unwrap_or_default(),
        }
    }
}

/// A field definition. Every field type implements `ProjectV2FieldCommon`,
/// but the fragment spread still yields `{}` for types the token cannot see.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FieldNode {
    pub id: Option<ProjectFieldId>,
    pub name: Option<String>,
    pub data_type: Option<String>,
    #[serde(default)]
    pub options: Vec<ProjectFieldOptionNode>,
}

impl FieldNode {
    fn into_field(self) -> Option<ProjectField> {
        Some(ProjectField {
            id: self.id?,
            name: self.name?,
            data_type: self.data_type.unwrap_or_default(),
            options: self
                .options
                .into_iter()
                .map(|o| ProjectFieldOption {
                    id: o.id,
                    name: o.name,
                })
                .collect(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectFieldOptionNode {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProjectsOwner {
    pub projects_v2: Option<Connection<ProjectNode>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListProjectsData {
    pub repository_owner: Option<ProjectsOwner>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GetProjectData {
    /// `{}` when the id names a node of another type.
    pub node: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ItemContentNode {
    #[serde(rename = "__typename")]
    pub typename: String,
    pub number: Option<u64>,
    pub title: Option<String>,
    pub state: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ItemNode {
    pub id: ProjectItemId,
    pub content: Option<ItemContentNode>,
}

impl From<ItemNode> for ProjectItem {
    fn from(node: ItemNode) -> Self {
        ProjectItem {
            id: node.id,
            content: node.content.map(|c| ProjectItemContent {
                kind: c.typename,
                number: c.number,
                title: c.title.unwrap_or_default(),
                state: c.state,
                url: c.url,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectItems {
    pub items: Option<Connection<ItemNode>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListProjectItemsData {
    pub node: Option<ProjectItems>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ItemPayload {
    pub item: Option<NodeId<ProjectItemId>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddProjectItemData {
    pub add_project_v2_item_by_id: Option<ItemPayload>,
}
