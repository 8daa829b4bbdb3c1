//! Port traits implemented by infrastructure adapters.
//!
//! The domain services only ever talk to GitHub through these traits. The
//! `github` crate implements both against the GraphQL API; tests use the
//! in-memory fake from [`crate::testing`].
//!
//! Every method is a single logical upstream request. Implementations must
//! map a missing entity to [`TrackerError::NotFound`] and an absent optional
//! API capability to [`TrackerError::CapabilityAbsent`].

use async_trait::async_trait;

use crate::{
    Issue, IssueNodeId, IssueNumber, IssueQuery, IssueUpdate, Label, MilestoneId, MilestoneNumber,
    NewIssue, Owner, PageSize, Project, ProjectFieldId, ProjectFieldValue, ProjectId, ProjectItem,
    ProjectItemId, RepositoryNodeId, RepositoryRef, TrackerError, UserId,
};

/// Issue-level access to a GitHub repository.
#[async_trait]
pub trait IssueClient: Send + Sync {
    /// Resolves the repository's node id.
    async fn repository_id(&self, repo: &RepositoryRef) -> Result<RepositoryNodeId, TrackerError>;

    /// Lists one page of issues.
    async fn list_issues(
        &self,
        repo: &RepositoryRef,
        query: &IssueQuery,
    ) -> Result<Vec<Issue>, TrackerError>;

    /// Fetches an issue with its labels, assignees and up to `comments` of
    /// its most recent comments (`0` skips comments).
    async fn get_issue(
        &self,
        repo: &RepositoryRef,
        number: IssueNumber,
        comments: u32,
    ) -> Result<Issue, TrackerError>;

    /// Lists the repository's labels (single page).
    async fn list_labels(&self, repo: &RepositoryRef) -> Result<Vec<Label>, TrackerError>;

    /// Resolves a user login to its node id.
    async fn user_id(&self, login: &str) -> Result<UserId, TrackerError>;

    /// Resolves a milestone number to its node id.
    async fn milestone_id(
        &self,
        repo: &RepositoryRef,
        number: MilestoneNumber,
    ) -> Result<MilestoneId, TrackerError>;

    /// Creates an issue and returns it as stored.
    async fn create_issue(&self, issue: &NewIssue) -> Result<Issue, TrackerError>;

    /// Applies an update and returns the issue as stored.
    async fn update_issue(&self, update: &IssueUpdate) -> Result<Issue, TrackerError>;

    /// Adds a comment to an issue.
    async fn add_comment(&self, subject: &IssueNodeId, body: &str) -> Result<(), TrackerError>;

    /// Explicit capability probe for GitHub's native sub-issue API.
    async fn supports_native_sub_issues(&self) -> Result<bool, TrackerError>;

    /// Creates a native parent/sub-issue relationship.
    ///
    /// Fails with [`TrackerError::CapabilityAbsent`] when the API rejects the
    /// operation as unknown.
    async fn add_native_sub_issue(
        &self,
        parent: &IssueNodeId,
        child: &IssueNodeId,
    ) -> Result<(), TrackerError>;
}

/// Access to Projects (v2) boards.
#[async_trait]
pub trait ProjectBoard: Send + Sync {
    /// Lists one page of an owner's (user or organization) projects.
    async fn list_projects(&self, owner: &Owner, first: PageSize)
        -> Result<Vec<Project>, TrackerError>;

    /// Fetches a project with its field definitions.
    async fn get_project(&self, id: &ProjectId) -> Result<Project, TrackerError>;

    /// Lists one page of a project's items.
    async fn list_project_items(
        &self,
        id: &ProjectId,
        first: PageSize,
    ) -> Result<Vec<ProjectItem>, TrackerError>;

    /// Adds an issue to a project, returning the new item's id.
    async fn add_project_item(
        &self,
        project: &ProjectId,
        content: &IssueNodeId,
    ) -> Result<ProjectItemId, TrackerError>;

    /// Sets a field value on a project item.
    async fn update_project_item_field(
        &self,
        project: &ProjectId,
        item: &ProjectItemId,
        field: &ProjectFieldId,
        value: &ProjectFieldValue,
    ) -> Result<(), TrackerError>;
}
