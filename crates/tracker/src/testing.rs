//! In-memory GitHub used by tests across the workspace.
//!
//! [`InMemoryGithub`] implements [`IssueClient`] and [`ProjectBoard`] for a
//! single repository. Issues get node ids of the form `I_<number>`. Failure
//! switches let tests exercise the partial-failure paths of the services.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    Comment, Issue, IssueClient, IssueNodeId, IssueNumber, IssueQuery, IssueState, IssueUpdate,
    Label, LabelId, MilestoneId, MilestoneNumber, NewIssue, Owner, PageSize, Project,
    ProjectBoard, ProjectFieldId, ProjectFieldValue, ProjectId, ProjectItem, ProjectItemContent,
    ProjectItemId, RepositoryNodeId, RepositoryRef, Timestamp, TrackerError, UserId,
};

/// How the fake answers native sub-issue requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum NativeSubIssues {
    /// Probe says yes, mutation succeeds.
    #[default]
    Supported,
    /// Probe says no.
    Unsupported,
    /// Probe says yes, mutation is rejected as an unknown field.
    Rejected(String),
    /// Probe says yes, mutation fails with an ordinary upstream error.
    Failing(String),
}

#[derive(Default)]
struct State {
    issues: BTreeMap<u64, Issue>,
    labels: Vec<Label>,
    users: Vec<String>,
    milestones: Vec<u64>,
    native: NativeSubIssues,
    native_links: Vec<(IssueNumber, IssueNumber)>,
    failing_fetches: HashSet<u64>,
    failing_updates: HashSet<u64>,
    failing_comments: HashSet<u64>,
    projects: Vec<(Owner, Project)>,
    project_items: BTreeMap<String, Vec<ProjectItem>>,
    field_updates: Vec<(ProjectItemId, ProjectFieldId, ProjectFieldValue)>,
}

/// A single-repository GitHub fake.
pub struct InMemoryGithub {
    repo: RepositoryRef,
    state: Mutex<State>,
}

fn node_id(number: u64) -> IssueNodeId {
    IssueNodeId::new(format!("I_{number}")).expect("non-empty id")
}

fn number_of(id: &IssueNodeId) -> Option<u64> {
    id.as_str().strip_prefix("I_")?.parse().ok()
}

impl InMemoryGithub {
    pub fn new(repo: RepositoryRef) -> Self {
        Self {
            repo,
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("fake state poisoned")
    }

    /// Seeds an open issue.
    pub fn add_issue(&self, number: u64, title: &str, body: &str) {
        let issue = Issue {
            id: node_id(number),
            number: IssueNumber::new(number),
            title: title.to_string(),
            body: body.to_string(),
            state: IssueState::Open,
            url: Some(format!("https://github.com/{}/issues/{number}", self.repo)),
            labels: Vec::new(),
            assignees: Vec::new(),
            comments: Vec::new(),
        };
        self.state().issues.insert(number, issue);
    }

    /// Appends a comment to a seeded issue.
    pub fn seed_comment(&self, number: u64, body: &str) {
        if let Some(issue) = self.state().issues.get_mut(&number) {
            issue.comments.push(Comment {
                author: Some("octocat".into()),
                body: body.to_string(),
                created_at: Timestamp::now(),
            });
        }
    }

    /// Seeds repository labels; ids are `L_<name>`.
    pub fn add_labels(&self, names: &[&str]) {
        let mut state = self.state();
        for name in names {
            state.labels.push(Label {
                id: LabelId::new(format!("L_{name}")).expect("non-empty id"),
                name: name.to_string(),
            });
        }
    }

    /// Seeds a user login; its id is `U_<login>`.
    pub fn add_user(&self, login: &str) {
        self.state().users.push(login.to_string());
    }

    /// Seeds a milestone; its id is `M_<number>`.
    pub fn add_milestone(&self, number: u64) {
        self.state().milestones.push(number);
    }

    /// Seeds a project board owned by `owner`.
    pub fn add_project(&self, owner: &str, id: &str, number: u64, title: &str) {
        let project = Project {
            id: ProjectId::new(id).expect("non-empty id"),
            number,
            title: title.to_string(),
            short_description: None,
            url: None,
            closed: false,
            fields: Vec::new(),
        };
        let owner = Owner::new(owner).expect("non-empty owner");
        let mut state = self.state();
        state.project_items.insert(id.to_string(), Vec::new());
        state.projects.push((owner, project));
    }

    pub fn set_native_sub_issues(&self, native: NativeSubIssues) {
        self.state().native = native;
    }

    /// Makes every fetch of `number` fail with an upstream error.
    pub fn fail_fetches_of(&self, number: u64) {
        self.state().failing_fetches.insert(number);
    }

    /// Makes every update of `number` fail with an upstream error.
    pub fn fail_updates_of(&self, number: u64) {
        self.state().failing_updates.insert(number);
    }

    /// Makes every comment on `number` fail with an upstream error.
    pub fn fail_comments_on(&self, number: u64) {
        self.state().failing_comments.insert(number);
    }

    /// Snapshot of an issue with all of its comments.
    pub fn issue(&self, number: u64) -> Option<Issue> {
        self.state().issues.get(&number).cloned()
    }

    /// Native relationships created so far, as `(parent, child)`.
    pub fn native_links(&self) -> Vec<(IssueNumber, IssueNumber)> {
        self.state().native_links.clone()
    }

    /// Items currently on a project.
    pub fn project_items(&self, project: &str) -> Vec<ProjectItem> {
        self.state()
            .project_items
            .get(project)
            .cloned()
            .unwrap_or_default()
    }

    /// Field updates applied so far.
    pub fn field_updates(&self) -> Vec<(ProjectItemId, ProjectFieldId, ProjectFieldValue)> {
        self.state().field_updates.clone()
    }

    fn check_repo(&self, repo: &RepositoryRef) -> Result<(), TrackerError> {
        if repo == &self.repo {
            Ok(())
        } else {
            Err(TrackerError::not_found(format!(
                "Could not resolve to a Repository with the name '{repo}'."
            )))
        }
    }

    fn label_names(state: &State, ids: &[LabelId]) -> Vec<String> {
        ids.iter()
            .filter_map(|id| {
                state
                    .labels
                    .iter()
                    .find(|label| &label.id == id)
                    .map(|label| label.name.clone())
            })
            .collect()
    }

    fn logins(ids: &[UserId]) -> Vec<String> {
        ids.iter()
            .filter_map(|id| id.as_str().strip_prefix("U_").map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl IssueClient for InMemoryGithub {
    async fn repository_id(&self, repo: &RepositoryRef) -> Result<RepositoryNodeId, TrackerError> {
        self.check_repo(repo)?;
        Ok(RepositoryNodeId::new("R_1").expect("non-empty id"))
    }

    async fn list_issues(
        &self,
        repo: &RepositoryRef,
        query: &IssueQuery,
    ) -> Result<Vec<Issue>, TrackerError> {
        self.check_repo(repo)?;
        let state = self.state();
        Ok(state
            .issues
            .values()
            .filter(|issue| query.state.is_none_or(|s| issue.state == s))
            .filter(|issue| query.labels.iter().all(|l| issue.labels.contains(l)))
            .take(query.first.get() as usize)
            .map(|issue| Issue {
                comments: Vec::new(),
                ..issue.clone()
            })
            .collect())
    }

    async fn get_issue(
        &self,
        repo: &RepositoryRef,
        number: IssueNumber,
        comments: u32,
    ) -> Result<Issue, TrackerError> {
        self.check_repo(repo)?;
        let state = self.state();
        if state.failing_fetches.contains(&number.as_u64()) {
            return Err(TrackerError::upstream("Something went wrong"));
        }
        let issue = state.issues.get(&number.as_u64()).ok_or_else(|| {
            TrackerError::not_found(format!(
                "Could not resolve to an Issue with the number of {number}."
            ))
        })?;
        let mut issue = issue.clone();
        let keep = comments as usize;
        let skip = issue.comments.len().saturating_sub(keep);
        issue.comments = issue.comments.split_off(skip);
        Ok(issue)
    }

    async fn list_labels(&self, repo: &RepositoryRef) -> Result<Vec<Label>, TrackerError> {
        self.check_repo(repo)?;
        Ok(self.state().labels.clone())
    }

    async fn user_id(&self, login: &str) -> Result<UserId, TrackerError> {
        if self.state().users.iter().any(|u| u.eq_ignore_ascii_case(login)) {
            Ok(UserId::new(format!("U_{login}")).expect("non-empty id"))
        } else {
            Err(TrackerError::not_found(format!(
                "Could not resolve to a User with the login of '{login}'."
            )))
        }
    }

    async fn milestone_id(
        &self,
        repo: &RepositoryRef,
        number: MilestoneNumber,
    ) -> Result<MilestoneId, TrackerError> {
        self.check_repo(repo)?;
        if self.state().milestones.contains(&number.as_u64()) {
            Ok(MilestoneId::new(format!("M_{number}")).expect("non-empty id"))
        } else {
            Err(TrackerError::not_found(format!("milestone {number} in {repo}")))
        }
    }

    async fn create_issue(&self, new: &NewIssue) -> Result<Issue, TrackerError> {
        let mut state = self.state();
        let number = state.issues.keys().next_back().copied().unwrap_or(0) + 1;
        let issue = Issue {
            id: node_id(number),
            number: IssueNumber::new(number),
            title: new.title.clone(),
            body: new.body.clone().unwrap_or_default(),
            state: IssueState::Open,
            url: Some(format!("https://github.com/{}/issues/{number}", self.repo)),
            labels: Self::label_names(&state, &new.label_ids),
            assignees: Self::logins(&new.assignee_ids),
            comments: Vec::new(),
        };
        state.issues.insert(number, issue.clone());
        Ok(issue)
    }

    async fn update_issue(&self, update: &IssueUpdate) -> Result<Issue, TrackerError> {
        let number = number_of(&update.id)
            .ok_or_else(|| TrackerError::not_found(format!("node {}", update.id)))?;
        let mut state = self.state();
        if state.failing_updates.contains(&number) {
            return Err(TrackerError::upstream("Something went wrong"));
        }
        let labels = update
            .label_ids
            .as_ref()
            .map(|ids| Self::label_names(&state, ids));
        let issue = state
            .issues
            .get_mut(&number)
            .ok_or_else(|| TrackerError::not_found(format!("node {}", update.id)))?;
        if let Some(title) = &update.title {
            issue.title = title.clone();
        }
        if let Some(body) = &update.body {
            issue.body = body.clone();
        }
        if let Some(s) = update.state {
            issue.state = s;
        }
        if let Some(labels) = labels {
            issue.labels = labels;
        }
        if let Some(ids) = &update.assignee_ids {
            issue.assignees = Self::logins(ids);
        }
        Ok(Issue {
            comments: Vec::new(),
            ..issue.clone()
        })
    }

    async fn add_comment(&self, subject: &IssueNodeId, body: &str) -> Result<(), TrackerError> {
        let number = number_of(subject)
            .ok_or_else(|| TrackerError::not_found(format!("node {subject}")))?;
        if self.state().failing_comments.contains(&number) {
            return Err(TrackerError::upstream("Something went wrong"));
        }
        self.seed_comment(number, body);
        Ok(())
    }

    async fn supports_native_sub_issues(&self) -> Result<bool, TrackerError> {
        Ok(self.state().native != NativeSubIssues::Unsupported)
    }

    async fn add_native_sub_issue(
        &self,
        parent: &IssueNodeId,
        child: &IssueNodeId,
    ) -> Result<(), TrackerError> {
        let mut state = self.state();
        match state.native.clone() {
            NativeSubIssues::Supported | NativeSubIssues::Unsupported => {
                let (Some(parent), Some(child)) = (number_of(parent), number_of(child)) else {
                    return Err(TrackerError::not_found("sub-issue node"));
                };
                state
                    .native_links
                    .push((IssueNumber::new(parent), IssueNumber::new(child)));
                Ok(())
            }
            NativeSubIssues::Rejected(message) => Err(TrackerError::CapabilityAbsent {
                capability: "sub-issues".into(),
                message,
            }),
            NativeSubIssues::Failing(message) => Err(TrackerError::upstream(message)),
        }
    }
}

#[async_trait]
impl ProjectBoard for InMemoryGithub {
    async fn list_projects(
        &self,
        owner: &Owner,
        first: PageSize,
    ) -> Result<Vec<Project>, TrackerError> {
        let state = self.state();
        let owned: Vec<Project> = state
            .projects
            .iter()
            .filter(|(o, _)| o == owner)
            .map(|(_, p)| p.clone())
            .take(first.get() as usize)
            .collect();
        if owned.is_empty() && owner != self.repo.owner() {
            return Err(TrackerError::not_found(format!(
                "Could not resolve to a ProjectV2Owner with the login of '{owner}'."
            )));
        }
        Ok(owned)
    }

    async fn get_project(&self, id: &ProjectId) -> Result<Project, TrackerError> {
        self.state()
            .projects
            .iter()
            .find(|(_, p)| &p.id == id)
            .map(|(_, p)| p.clone())
            .ok_or_else(|| TrackerError::not_found(format!("project {id}")))
    }

    async fn list_project_items(
        &self,
        id: &ProjectId,
        first: PageSize,
    ) -> Result<Vec<ProjectItem>, TrackerError> {
        self.state()
            .project_items
            .get(id.as_str())
            .map(|items| items.iter().take(first.get() as usize).cloned().collect())
            .ok_or_else(|| TrackerError::not_found(format!("project {id}")))
    }

    async fn add_project_item(
        &self,
        project: &ProjectId,
        content: &IssueNodeId,
    ) -> Result<ProjectItemId, TrackerError> {
        let mut state = self.state();
        let issue = number_of(content)
            .and_then(|n| state.issues.get(&n).cloned())
            .ok_or_else(|| TrackerError::not_found(format!("node {content}")))?;
        let items = state
            .project_items
            .get_mut(project.as_str())
            .ok_or_else(|| TrackerError::not_found(format!("project {project}")))?;
        let id = ProjectItemId::new(format!("PVTI_{}", items.len() + 1)).expect("non-empty id");
        items.push(ProjectItem {
            id: id.clone(),
            content: Some(ProjectItemContent {
                kind: "Issue".into(),
                number: Some(issue.number.as_u64()),
                title: issue.title,
                state: Some("OPEN".into()),
                url: issue.url,
            }),
        });
        Ok(id)
    }

    async fn update_project_item_field(
        &self,
        project: &ProjectId,
        item: &ProjectItemId,
        field: &ProjectFieldId,
        value: &ProjectFieldValue,
    ) -> Result<(), TrackerError> {
        let mut state = self.state();
        let known = state
            .project_items
            .get(project.as_str())
            .is_some_and(|items| items.iter().any(|i| &i.id == item));
        if !known {
            return Err(TrackerError::not_found(format!("item {item} in project {project}")));
        }
        state
            .field_updates
            .push((item.clone(), field.clone(), value.clone()));
        Ok(())
    }
}
