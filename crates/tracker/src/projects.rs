//! Projects (v2) board operations.

use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;

use crate::{
    IssueClient, IssueNumber, Owner, PageSize, Project, ProjectBoard, ProjectFieldId,
    ProjectFieldValue, ProjectId, ProjectItem, ProjectItemId, RepositoryRef, TrackerError,
};

/// Result of adding to or updating a project item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectItemRef {
    pub item_id: ProjectItemId,
}

/// Thin façade over [`ProjectBoard`] that resolves issue numbers through the
/// [`IssueClient`].
#[derive(Clone)]
pub struct ProjectService {
    board: Arc<dyn ProjectBoard>,
    issues: Arc<dyn IssueClient>,
}

impl ProjectService {
    pub fn new(board: Arc<dyn ProjectBoard>, issues: Arc<dyn IssueClient>) -> Self {
        Self { board, issues }
    }

    #[instrument(skip_all, fields(owner = %owner))]
    pub async fn list(&self, owner: &Owner, first: PageSize) -> Result<Vec<Project>, TrackerError> {
        self.board.list_projects(owner, first).await
    }

    #[instrument(skip_all, fields(project = %id))]
    pub async fn get(&self, id: &ProjectId) -> Result<Project, TrackerError> {
        self.board.get_project(id).await
    }

    #[instrument(skip_all, fields(project = %id))]
    pub async fn items(
        &self,
        id: &ProjectId,
        first: PageSize,
    ) -> Result<Vec<ProjectItem>, TrackerError> {
        self.board.list_project_items(id, first).await
    }

    /// Adds an existing issue to a project.
    #[instrument(skip_all, fields(project = %project, repo = %repo, issue = %number))]
    pub async fn add_issue(
        &self,
        project: &ProjectId,
        repo: &RepositoryRef,
        number: IssueNumber,
    ) -> Result<ProjectItemRef, TrackerError> {
        let issue = self.issues.get_issue(repo, number, 0).await?;
        let item_id = self.board.add_project_item(project, &issue.id).await?;
        Ok(ProjectItemRef { item_id })
    }

    #[instrument(skip_all, fields(project = %project, item = %item, field = %field))]
    pub async fn update_field(
        &self,
        project: &ProjectId,
        item: &ProjectItemId,
        field: &ProjectFieldId,
        value: &ProjectFieldValue,
    ) -> Result<ProjectItemRef, TrackerError> {
        self.board
            .update_project_item_field(project, item, field, value)
            .await?;
        Ok(ProjectItemRef {
            item_id: item.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryGithub;

    fn repo() -> RepositoryRef {
        RepositoryRef::new("acme", "widgets").unwrap()
    }

    fn service(github: &Arc<InMemoryGithub>) -> ProjectService {
        ProjectService::new(github.clone(), github.clone())
    }

    #[tokio::test]
    async fn add_issue_then_set_field() {
        let github = Arc::new(InMemoryGithub::new(repo()));
        github.add_project("acme", "PVT_1", 1, "Roadmap");
        github.add_issue(8, "Feature: dark mode", "");
        let project = ProjectId::new("PVT_1").unwrap();

        let added = service(&github)
            .add_issue(&project, &repo(), IssueNumber::new(8))
            .await
            .unwrap();
        let items = github.project_items("PVT_1");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, added.item_id);

        let field = ProjectFieldId::new("PVTF_status").unwrap();
        let value = ProjectFieldValue::SingleSelectOptionId("opt_done".into());
        service(&github)
            .update_field(&project, &added.item_id, &field, &value)
            .await
            .unwrap();
        assert_eq!(github.field_updates(), vec![(added.item_id, field, value)]);
    }

    #[tokio::test]
    async fn adding_missing_issue_is_not_found() {
        let github = Arc::new(InMemoryGithub::new(repo()));
        github.add_project("acme", "PVT_1", 1, "Roadmap");
        let err = service(&github)
            .add_issue(&ProjectId::new("PVT_1").unwrap(), &repo(), IssueNumber::new(3))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(github.project_items("PVT_1").is_empty());
    }

    #[tokio::test]
    async fn lists_projects_of_normalized_owner() {
        let github = Arc::new(InMemoryGithub::new(repo()));
        github.add_project("Acme", "PVT_1", 1, "Roadmap");
        let owner = Owner::new("ACME").unwrap();
        let projects = service(&github).list(&owner, PageSize::default()).await.unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].title, "Roadmap");
    }
}
