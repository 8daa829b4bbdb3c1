//! [`IssueClient`] over the GitHub GraphQL API.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, instrument};
use tracker::{
    Issue, IssueClient, IssueNodeId, IssueNumber, IssueQuery, IssueState, IssueUpdate, Label,
    LabelId, MilestoneId, MilestoneNumber, NewIssue, RepositoryNodeId, RepositoryRef,
    TrackerError, UserId,
};

use crate::client::{GithubClient, SUB_ISSUES_FEATURE};
use crate::errors::sniff_capability_absent;
use crate::queries;
use crate::wire::{
    AddSubIssueData, CreateIssueData, GetIssueData, ListIssuesData, ListLabelsData,
    MilestoneIdData, RepositoryIdData, TypeData, UpdateIssueData, UserIdData,
};

const SUB_ISSUES_CAPABILITY: &str = "sub-issues";

fn state_name(state: IssueState) -> &'static str {
    match state {
        IssueState::Open => "OPEN",
        IssueState::Closed => "CLOSED",
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateIssueInput<'a> {
    repository_id: &'a RepositoryNodeId,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
    #[serde(skip_serializing_if = "is_empty")]
    label_ids: &'a [LabelId],
    #[serde(skip_serializing_if = "is_empty")]
    assignee_ids: &'a [UserId],
    #[serde(skip_serializing_if = "Option::is_none")]
    milestone_id: Option<&'a MilestoneId>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateIssueInput<'a> {
    id: &'a IssueNodeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    label_ids: Option<&'a [LabelId]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee_ids: Option<&'a [UserId]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    milestone_id: Option<&'a MilestoneId>,
}

fn is_empty<T>(items: &&[T]) -> bool {
    items.is_empty()
}

fn repository_missing(repo: &RepositoryRef) -> TrackerError {
    TrackerError::not_found(format!("repository {repo}"))
}

fn to_variables(input: impl Serialize) -> Result<serde_json::Value, TrackerError> {
    serde_json::to_value(input)
        .map_err(|e| TrackerError::upstream(format!("failed to encode mutation input: {e}")))
}

#[async_trait]
impl IssueClient for GithubClient {
    #[instrument(skip_all, fields(repo = %repo))]
    async fn repository_id(&self, repo: &RepositoryRef) -> Result<RepositoryNodeId, TrackerError> {
        let data: RepositoryIdData = self
            .execute(
                "RepositoryId",
                queries::REPOSITORY_ID,
                json!({ "owner": repo.owner().as_str(), "name": repo.name() }),
            )
            .await?;
        data.repository
            .map(|r| r.id)
            .ok_or_else(|| repository_missing(repo))
    }

    #[instrument(skip_all, fields(repo = %repo, first = query.first.get()))]
    async fn list_issues(
        &self,
        repo: &RepositoryRef,
        query: &IssueQuery,
    ) -> Result<Vec<Issue>, TrackerError> {
        let states = query.state.map(|s| vec![state_name(s)]);
        let labels = (!query.labels.is_empty()).then_some(&query.labels);
        let data: ListIssuesData = self
            .execute(
                "ListIssues",
                &queries::list_issues(),
                json!({
                    "owner": repo.owner().as_str(),
                    "name": repo.name(),
                    "first": query.first.get(),
                    "states": states,
                    "labels": labels,
                }),
            )
            .await?;
        let repository = data.repository.ok_or_else(|| repository_missing(repo))?;
        Ok(repository
            .issues
            .into_vec()
            .into_iter()
            .map(Issue::from)
            .collect())
    }

    #[instrument(skip_all, fields(repo = %repo, issue = %number))]
    async fn get_issue(
        &self,
        repo: &RepositoryRef,
        number: IssueNumber,
        comments: u32,
    ) -> Result<Issue, TrackerError> {
        let data: GetIssueData = self
            .execute(
                "GetIssue",
                &queries::get_issue(),
                json!({
                    "owner": repo.owner().as_str(),
                    "name": repo.name(),
                    "number": number.as_u64(),
                    "comments": comments.max(1),
                    "withComments": comments > 0,
                }),
            )
            .await?;
        data.repository
            .ok_or_else(|| repository_missing(repo))?
            .issue
            .map(Issue::from)
            .ok_or_else(|| TrackerError::not_found(format!("issue #{number} in {repo}")))
    }

    #[instrument(skip_all, fields(repo = %repo))]
    async fn list_labels(&self, repo: &RepositoryRef) -> Result<Vec<Label>, TrackerError> {
        let data: ListLabelsData = self
            .execute(
                "ListLabels",
                queries::LIST_LABELS,
                json!({ "owner": repo.owner().as_str(), "name": repo.name() }),
            )
            .await?;
        let repository = data.repository.ok_or_else(|| repository_missing(repo))?;
        Ok(repository
            .labels
            .into_vec()
            .into_iter()
            .map(Label::from)
            .collect())
    }

    #[instrument(skip_all, fields(login = %login))]
    async fn user_id(&self, login: &str) -> Result<UserId, TrackerError> {
        let data: UserIdData = self
            .execute("UserId", queries::USER_ID, json!({ "login": login }))
            .await?;
        data.user
            .map(|u| u.id)
            .ok_or_else(|| TrackerError::not_found(format!("user {login}")))
    }

    #[instrument(skip_all, fields(repo = %repo, milestone = %number))]
    async fn milestone_id(
        &self,
        repo: &RepositoryRef,
        number: MilestoneNumber,
    ) -> Result<MilestoneId, TrackerError> {
        let data: MilestoneIdData = self
            .execute(
                "MilestoneId",
                queries::MILESTONE_ID,
                json!({
                    "owner": repo.owner().as_str(),
                    "name": repo.name(),
                    "number": number.as_u64(),
                }),
            )
            .await?;
        data.repository
            .ok_or_else(|| repository_missing(repo))?
            .milestone
            .map(|m| m.id)
            .ok_or_else(|| TrackerError::not_found(format!("milestone {number} in {repo}")))
    }

    #[instrument(skip_all, fields(repository = %issue.repository_id))]
    async fn create_issue(&self, issue: &NewIssue) -> Result<Issue, TrackerError> {
        let input = to_variables(CreateIssueInput {
            repository_id: &issue.repository_id,
            title: &issue.title,
            body: issue.body.as_deref(),
            label_ids: &issue.label_ids,
            assignee_ids: &issue.assignee_ids,
            milestone_id: issue.milestone_id.as_ref(),
        })?;
        let data: CreateIssueData = self
            .execute("CreateIssue", &queries::create_issue(), json!({ "input": input }))
            .await?;
        data.create_issue
            .and_then(|p| p.issue)
            .map(Issue::from)
            .ok_or_else(|| TrackerError::upstream("CreateIssue: no issue in response"))
    }

    #[instrument(skip_all, fields(issue = %update.id))]
    async fn update_issue(&self, update: &IssueUpdate) -> Result<Issue, TrackerError> {
        let input = to_variables(UpdateIssueInput {
            id: &update.id,
            title: update.title.as_deref(),
            body: update.body.as_deref(),
            state: update.state.map(state_name),
            label_ids: update.label_ids.as_deref(),
            assignee_ids: update.assignee_ids.as_deref(),
            milestone_id: update.milestone_id.as_ref(),
        })?;
        let data: UpdateIssueData = self
            .execute("UpdateIssue", &queries::update_issue(), json!({ "input": input }))
            .await?;
        data.update_issue
            .and_then(|p| p.issue)
            .map(Issue::from)
            .ok_or_else(|| TrackerError::not_found(format!("issue {}", update.id)))
    }

    #[instrument(skip_all, fields(subject = %subject))]
    async fn add_comment(&self, subject: &IssueNodeId, body: &str) -> Result<(), TrackerError> {
        let _: serde_json::Value = self
            .execute(
                "AddComment",
                queries::ADD_COMMENT,
                json!({ "subjectId": subject, "body": body }),
            )
            .await?;
        Ok(())
    }

    #[instrument(skip_all)]
    async fn supports_native_sub_issues(&self) -> Result<bool, TrackerError> {
        let data: TypeData = self
            .execute_with_features(
                "SubIssueCapability",
                queries::SUB_ISSUE_CAPABILITY,
                json!({}),
                &[SUB_ISSUES_FEATURE],
            )
            .await?;
        let supported = data.type_.is_some();
        debug!(supported, "sub-issue capability probed");
        Ok(supported)
    }

    #[instrument(skip_all, fields(parent = %parent, child = %child))]
    async fn add_native_sub_issue(
        &self,
        parent: &IssueNodeId,
        child: &IssueNodeId,
    ) -> Result<(), TrackerError> {
        let data: AddSubIssueData = self
            .execute_with_features(
                "AddSubIssue",
                queries::ADD_SUB_ISSUE,
                json!({ "issueId": parent, "subIssueId": child }),
                &[SUB_ISSUES_FEATURE],
            )
            .await
            .map_err(|e| sniff_capability_absent(SUB_ISSUES_CAPABILITY, e))?;
        match data.add_sub_issue {
            Some(_) => Ok(()),
            None => Err(TrackerError::upstream("AddSubIssue: empty payload")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::GithubConfig;
    use httpmock::prelude::*;
    use tracker::PageSize;

    fn client(server: &MockServer) -> GithubClient {
        GithubClient::new(&GithubConfig {
            token: "t".into(),
            api_url: server.url("/graphql"),
        })
        .unwrap()
    }

    fn repo() -> RepositoryRef {
        RepositoryRef::new("Acme", "widgets").unwrap()
    }

    fn issue_json(number: u64, title: &str) -> serde_json::Value {
        json!({
            "id": format!("I_{number}"),
            "number": number,
            "title": title,
            "body": "",
            "state": "OPEN",
            "url": format!("https://github.com/acme/widgets/issues/{number}"),
            "labels": { "nodes": [] },
            "assignees": { "nodes": [] }
        })
    }

    #[tokio::test]
    async fn get_issue_sends_lower_cased_owner_and_comment_window() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql").json_body_partial(
                    r#"{ "variables": { "owner": "acme", "name": "widgets", "number": 4,
                         "comments": 100, "withComments": true } }"#,
                );
                then.status(200).json_body(json!({
                    "data": { "repository": { "issue": issue_json(4, "Task: wire it") } }
                }));
            })
            .await;

        let issue = client(&server)
            .get_issue(&repo(), IssueNumber::new(4), 100)
            .await
            .unwrap();
        assert_eq!(issue.title, "Task: wire it");
        assert!(issue.comments.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_issue_is_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql");
                then.status(200)
                    .json_body(json!({ "data": { "repository": { "issue": null } } }));
            })
            .await;

        let err = client(&server)
            .get_issue(&repo(), IssueNumber::new(99), 0)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn list_issues_passes_filters() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql").json_body_partial(
                    r#"{ "variables": { "first": 5, "states": ["CLOSED"], "labels": ["bug"] } }"#,
                );
                then.status(200).json_body(json!({
                    "data": { "repository": { "issues": { "nodes": [
                        issue_json(1, "Bug: a"), null, issue_json(2, "Bug: b")
                    ] } } }
                }));
            })
            .await;

        let query = IssueQuery {
            state: Some(IssueState::Closed),
            labels: vec!["bug".into()],
            first: PageSize::new(5),
        };
        let issues = client(&server).list_issues(&repo(), &query).await.unwrap();
        assert_eq!(issues.len(), 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn update_omits_untouched_fields() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/graphql")
                    .json_body_partial(r#"{ "variables": { "input": { "id": "I_3", "body": "new" } } }"#)
                    .matches(|req| {
                        let body = String::from_utf8_lossy(req.body.as_deref().unwrap_or_default());
                        !body.contains("\"title\"") && !body.contains("labelIds")
                    });
                then.status(200).json_body(json!({
                    "data": { "updateIssue": { "issue": issue_json(3, "x") } }
                }));
            })
            .await;

        let update = IssueUpdate::body(IssueNodeId::new("I_3").unwrap(), "new");
        client(&server).update_issue(&update).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn probe_reads_type_presence() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/graphql")
                    .header("graphql-features", "sub_issues");
                then.status(200).json_body(json!({ "data": { "__type": null } }));
            })
            .await;

        assert!(!client(&server).supports_native_sub_issues().await.unwrap());
    }

    #[tokio::test]
    async fn unknown_sub_issue_mutation_is_capability_absent() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql").body_contains("addSubIssue");
                then.status(200).json_body(json!({
                    "errors": [{
                        "message": "Field 'addSubIssue' doesn't exist on type 'Mutation'",
                        "extensions": { "code": "undefinedField" }
                    }]
                }));
            })
            .await;

        let err = client(&server)
            .add_native_sub_issue(&IssueNodeId::new("I_1").unwrap(), &IssueNodeId::new("I_2").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::CapabilityAbsent { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn other_sub_issue_failures_stay_upstream() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql");
                then.status(200).json_body(json!({
                    "errors": [{ "type": "FORBIDDEN", "message": "Resource not accessible by integration" }]
                }));
            })
            .await;

        let err = client(&server)
            .add_native_sub_issue(&IssueNodeId::new("I_1").unwrap(), &IssueNodeId::new("I_2").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::Upstream { .. }));
    }
}
