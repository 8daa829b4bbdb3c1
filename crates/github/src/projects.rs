//! [`ProjectBoard`] over the GitHub GraphQL API.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::instrument;
use tracker::{
    IssueNodeId, Owner, PageSize, Project, ProjectBoard, ProjectFieldId, ProjectFieldValue,
    ProjectId, ProjectItem, ProjectItemId, TrackerError,
};

use crate::client::GithubClient;
use crate::queries;
use crate::wire::{
    AddProjectItemData, GetProjectData, ListProjectItemsData, ListProjectsData, ProjectNode,
};

fn project_missing(id: &ProjectId) -> TrackerError {
    TrackerError::not_found(format!("project {id}"))
}

/// Encodes a field value as a `ProjectV2FieldValue` input object.
fn field_value(value: &ProjectFieldValue) -> Value {
    match value {
        ProjectFieldValue::Text(text) => json!({ "text": text }),
        ProjectFieldValue::Number(number) => json!({ "number": number }),
        ProjectFieldValue::Date(date) => json!({ "date": date }),
        ProjectFieldValue::SingleSelectOptionId(id) => json!({ "singleSelectOptionId": id }),
        ProjectFieldValue::IterationId(id) => json!({ "iterationId": id }),
    }
}

#[async_trait]
impl ProjectBoard for GithubClient {
    #[instrument(skip_all, fields(owner = %owner, first = first.get()))]
    async fn list_projects(
        &self,
        owner: &Owner,
        first: PageSize,
    ) -> Result<Vec<Project>, TrackerError> {
        let data: ListProjectsData = self
            .execute(
                "ListProjects",
                queries::LIST_PROJECTS,
                json!({ "login": owner.as_str(), "first": first.get() }),
            )
            .await?;
        let owner_node = data
            .repository_owner
            .ok_or_else(|| TrackerError::not_found(format!("owner {owner}")))?;
        Ok(owner_node
            .projects_v2
            .map(|c| c.into_vec().into_iter().map(Project::from).collect())
            .unwrap_or_default())
    }

    #[instrument(skip_all, fields(project = %id))]
    async fn get_project(&self, id: &ProjectId) -> Result<Project, TrackerError> {
        let data: GetProjectData = self
            .execute("GetProject", queries::GET_PROJECT, json!({ "id": id }))
            .await?;
        // A node of another type comes back as `{}`.
        let node = match data.node {
            Some(Value::Object(map)) if map.contains_key("id") => Value::Object(map),
            _ => return Err(project_missing(id)),
        };
        let project: ProjectNode = serde_json::from_value(node).map_err(|e| {
            TrackerError::upstream(format!("GetProject: unexpected response shape: {e}"))
        })?;
        Ok(project.into())
    }

    #[instrument(skip_all, fields(project = %id, first = first.get()))]
    async fn list_project_items(
        &self,
        id: &ProjectId,
        first: PageSize,
    ) -> Result<Vec<ProjectItem>, TrackerError> {
        let data: ListProjectItemsData = self
            .execute(
                "ListProjectItems",
                queries::LIST_PROJECT_ITEMS,
                json!({ "id": id, "first": first.get() }),
            )
            .await?;
        let items = data
            .node
            .and_then(|n| n.items)
            .ok_or_else(|| project_missing(id))?;
        Ok(items.into_vec().into_iter().map(ProjectItem::from).collect())
    }

    #[instrument(skip_all, fields(project = %project, content = %content))]
    async fn add_project_item(
        &self,
        project: &ProjectId,
        content: &IssueNodeId,
    ) -> Result<ProjectItemId, TrackerError> {
        let data: AddProjectItemData = self
            .execute(
                "AddProjectItem",
                queries::ADD_PROJECT_ITEM,
                json!({ "projectId": project, "contentId": content }),
            )
            .await?;
        data.add_project_v2_item_by_id
            .and_then(|p| p.item)
            .map(|i| i.id)
            .ok_or_else(|| TrackerError::upstream("AddProjectItem: no item in response"))
    }

    #[instrument(skip_all, fields(project = %project, item = %item, field = %field))]
    async fn update_project_item_field(
        &self,
        project: &ProjectId,
        item: &ProjectItemId,
        field: &ProjectFieldId,
        value: &ProjectFieldValue,
    ) -> Result<(), TrackerError> {
        let _: Value = self
            .execute(
                "UpdateProjectItemField",
                queries::UPDATE_PROJECT_ITEM_FIELD,
                json!({
                    "projectId": project,
                    "itemId": item,
                    "fieldId": field,
                    "value": field_value(value),
                }),
            )
            .await?;
        Ok(())
    }
}
