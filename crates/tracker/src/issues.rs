//! Issue listing, retrieval, creation and update.
//!
//! [`IssueService`] turns tool-level requests (label names, logins, milestone
//! numbers) into port calls (node ids). Creation runs the classifier to add a
//! type label and, when a parent is named, links the new issue under it.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{
    apply_type_label, classify, HierarchyManager, Issue, IssueClient, IssueNumber, IssueQuery,
    IssueState, IssueType, IssueUpdate, LabelId, LinkKind, LinkOutcome, MilestoneId,
    MilestoneNumber, NewIssue, PageSize, RepositoryRef, TrackerError, UserId,
};

/// Number of most recent comments returned with a single issue.
pub const ISSUE_COMMENT_WINDOW: u32 = PageSize::DEFAULT;

/// An issue annotated with its classified type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedIssue {
    #[serde(flatten)]
    pub issue: Issue,
    #[serde(rename = "type")]
    pub issue_type: Option<IssueType>,
}

impl From<Issue> for ClassifiedIssue {
    fn from(issue: Issue) -> Self {
        let issue_type = classify(&issue.title, Some(&issue.body));
        Self { issue, issue_type }
    }
}

/// Tool-level request to create an issue.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateIssueRequest {
    pub title: String,
    pub body: Option<String>,
    pub labels: Vec<String>,
    pub assignees: Vec<String>,
    pub milestone: Option<MilestoneNumber>,
    /// Issue that should track the new one.
    pub parent: Option<IssueNumber>,
}

/// Result of an issue creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedIssue {
    #[serde(flatten)]
    pub issue: ClassifiedIssue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_link: Option<LinkOutcome>,
}

/// Tool-level request to update an issue. `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateIssueRequest {
    pub number: IssueNumber,
    pub title: Option<String>,
    pub body: Option<String>,
    pub state: Option<IssueState>,
    pub labels: Option<Vec<String>>,
    pub assignees: Option<Vec<String>>,
    pub milestone: Option<MilestoneNumber>,
}

impl UpdateIssueRequest {
    pub fn new(number: IssueNumber) -> Self {
        Self {
            number,
            title: None,
            body: None,
            state: None,
            labels: None,
            assignees: None,
            milestone: None,
        }
    }
}

/// Issue operations over an [`IssueClient`].
#[derive(Clone)]
pub struct IssueService {
    client: Arc<dyn IssueClient>,
    hierarchy: HierarchyManager,
}

impl IssueService {
    pub fn new(client: Arc<dyn IssueClient>, hierarchy: HierarchyManager) -> Self {
        Self { client, hierarchy }
    }

    #[instrument(skip_all, fields(repo = %repo))]
    pub async fn list(
        &self,
        repo: &RepositoryRef,
        query: &IssueQuery,
    ) -> Result<Vec<ClassifiedIssue>, TrackerError> {
        let issues = self.client.list_issues(repo, query).await?;
        Ok(issues.into_iter().map(ClassifiedIssue::from).collect())
    }

    #[instrument(skip_all, fields(repo = %repo, issue = %number))]
    pub async fn get(
        &self,
        repo: &RepositoryRef,
        number: IssueNumber,
    ) -> Result<ClassifiedIssue, TrackerError> {
        let issue = self
            .client
            .get_issue(repo, number, ISSUE_COMMENT_WINDOW)
            .await?;
        Ok(ClassifiedIssue::from(issue))
    }

    /// Creates an issue, labelling it with its classified type and linking it
    /// under `request.parent` when given.
    ///
    /// A link failure is returned as the call's error; the issue itself has
    /// already been created at that point. After a successful link the issue
    /// is read back so the returned body carries the parent block. The type
    /// stays the one computed from the caller's title and body.
    #[instrument(skip_all, fields(repo = %repo))]
    pub async fn create(
        &self,
        repo: &RepositoryRef,
        request: CreateIssueRequest,
    ) -> Result<CreatedIssue, TrackerError> {
        if request.title.trim().is_empty() {
            return Err(TrackerError::InvalidInput {
                message: "title must not be empty".into(),
            });
        }

        let issue_type = classify(&request.title, request.body.as_deref());
        let mut labels = request.labels;
        apply_type_label(&mut labels, issue_type);

        let repository_id = self.client.repository_id(repo).await?;
        let label_ids = self.resolve_labels(repo, &labels).await?;
        let assignee_ids = self.resolve_assignees(&request.assignees).await?;
        let milestone_id = self.resolve_milestone(repo, request.milestone).await?;

        let issue = self
            .client
            .create_issue(&NewIssue {
                repository_id,
                title: request.title,
                body: request.body,
                label_ids,
                assignee_ids,
                milestone_id,
            })
            .await?;
        info!(issue = %issue.number, issue_type = ?issue_type, "issue created");

        let (issue, parent_link) = match request.parent {
            Some(parent) => {
                let link = self
                    .hierarchy
                    .link(repo, parent, issue.number, LinkKind::Tracks)
                    .await?;
                // The link rewrote the body with the parent block.
                let issue = self.client.get_issue(repo, issue.number, 0).await?;
                (issue, Some(link))
            }
            None => (issue, None),
        };

        Ok(CreatedIssue {
            issue: ClassifiedIssue { issue, issue_type },
            parent_link,
        })
    }

    #[instrument(skip_all, fields(repo = %repo, issue = %request.number))]
    pub async fn update(
        &self,
        repo: &RepositoryRef,
        request: UpdateIssueRequest,
    ) -> Result<ClassifiedIssue, TrackerError> {
        let existing = self.client.get_issue(repo, request.number, 0).await?;

        let label_ids = match &request.labels {
            Some(names) => Some(self.resolve_labels(repo, names).await?),
            None => None,
        };
        let assignee_ids = match &request.assignees {
            Some(logins) => Some(self.resolve_assignees(logins).await?),
            None => None,
        };
        let milestone_id = self.resolve_milestone(repo, request.milestone).await?;

        let updated = self
            .client
            .update_issue(&IssueUpdate {
                id: existing.id,
                title: request.title,
                body: request.body,
                state: request.state,
                label_ids,
                assignee_ids,
                milestone_id,
            })
            .await?;
        Ok(ClassifiedIssue::from(updated))
    }

    /// Maps label names to the repository's label ids. Names with no matching
    /// label are skipped.
    async fn resolve_labels(
        &self,
        repo: &RepositoryRef,
        names: &[String],
    ) -> Result<Vec<LabelId>, TrackerError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let available = self.client.list_labels(repo).await?;
        let mut ids: Vec<LabelId> = Vec::with_capacity(names.len());
        for name in names {
            match available
                .iter()
                .find(|label| label.name.eq_ignore_ascii_case(name))
            {
                Some(label) if !ids.contains(&label.id) => ids.push(label.id.clone()),
                Some(_) => {}
                None => warn!(label = %name, "label not defined in repository; skipping"),
            }
        }
        Ok(ids)
    }

    async fn resolve_assignees(&self, logins: &[String]) -> Result<Vec<UserId>, TrackerError> {
        let mut ids = Vec::with_capacity(logins.len());
        for login in logins {
            ids.push(self.client.user_id(login).await?);
        }
        Ok(ids)
    }

    async fn resolve_milestone(
        &self,
        repo: &RepositoryRef,
        milestone: Option<MilestoneNumber>,
    ) -> Result<Option<MilestoneId>, TrackerError> {
        match milestone {
            Some(number) => Ok(Some(self.client.milestone_id(repo, number).await?)),
            None => Ok(None),
        }
    }
}
