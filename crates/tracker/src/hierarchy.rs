//! Parent/child hierarchy management.
//!
//! [`HierarchyManager`] is the write and read side of issue relationships:
//! [`link`](HierarchyManager::link) records an edge through the
//! [`RelationshipStore`], [`hierarchy`](HierarchyManager::hierarchy) rebuilds a
//! fresh [`HierarchyView`] from comments and body text on every call, and
//! [`add_sub_issue`](HierarchyManager::add_sub_issue) tries GitHub's native
//! sub-issue API before falling back to a manual `tracks` link.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::{
    classify, Issue, IssueClient, IssueNumber, IssueState, IssueType, LinkKind, RelationshipStore,
    RepositoryRef, TrackerError,
};

/// Number of most recent comments scanned for `Tracks #N` tokens.
pub const HIERARCHY_COMMENT_WINDOW: u32 = 100;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Minimal reference to one side of an edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRef {
    pub number: IssueNumber,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl From<&Issue> for IssueRef {
    fn from(issue: &Issue) -> Self {
        Self {
            number: issue.number,
            title: issue.title.clone(),
            url: issue.url.clone(),
        }
    }
}

/// Result of recording an edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkOutcome {
    pub parent: IssueRef,
    pub child: IssueRef,
    pub kind: LinkKind,
}

/// Result of a native sub-issue attempt.
///
/// Serialized untagged: a fallback is indistinguishable from a direct
/// `tracks` link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SubIssueOutcome {
    /// GitHub recorded the relationship natively.
    Native {
        parent: IssueRef,
        child: IssueRef,
        native: bool,
    },
    /// The manual encoding was written instead.
    Linked(LinkOutcome),
}

/// One participant of a hierarchy view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyEntry {
    pub number: IssueNumber,
    pub title: String,
    pub state: IssueState,
    pub labels: Vec<String>,
    #[serde(rename = "type")]
    pub issue_type: Option<IssueType>,
}

impl From<&Issue> for HierarchyEntry {
    fn from(issue: &Issue) -> Self {
        Self {
            number: issue.number,
            title: issue.title.clone(),
            state: issue.state,
            labels: issue.labels.clone(),
            issue_type: classify(&issue.title, Some(&issue.body)),
        }
    }
}

/// Which side of an edge a discovered reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeRole {
    Parent,
    Child,
}

/// An edge whose target could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedEdge {
    pub role: EdgeRole,
    pub number: IssueNumber,
    pub error: TrackerError,
}

/// Request-scoped view of an issue's parents and children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HierarchyView {
    pub current: HierarchyEntry,
    pub parents: Vec<HierarchyEntry>,
    pub children: Vec<HierarchyEntry>,
    /// Edges whose target was deleted or inaccessible. Not serialized: to the
    /// tool caller a dangling edge looks like no edge.
    #[serde(skip)]
    pub unresolved: Vec<UnresolvedEdge>,
}

/// Sort rank of a type within a children list.
pub fn type_priority(issue_type: Option<IssueType>) -> u8 {
    match issue_type {
        Some(IssueType::Epic) => 0,
        Some(IssueType::Feature) => 1,
        Some(IssueType::Story) => 2,
        Some(IssueType::Task) => 3,
        Some(IssueType::Bug) => 4,
        Some(IssueType::Documentation) => 5,
        None => 6,
    }
}

/// Stable sort by [`type_priority`]; equal ranks keep discovery order.
pub fn sort_by_type_priority(entries: &mut [HierarchyEntry]) {
    entries.sort_by_key(|entry| type_priority(entry.issue_type));
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

/// Maintains parent/child relationships between issues of one GitHub
/// installation.
#[derive(Clone)]
pub struct HierarchyManager {
    client: Arc<dyn IssueClient>,
    store: RelationshipStore,
}

impl HierarchyManager {
    pub fn new(client: Arc<dyn IssueClient>) -> Self {
        let store = RelationshipStore::new(Arc::clone(&client));
        Self { client, store }
    }

    /// Records a `parent → child` edge of the given kind.
    ///
    /// Both issues are resolved first; a missing issue fails the call before
    /// anything is written.
    #[instrument(skip_all, fields(repo = %repo, parent = %parent, child = %child, kind = %kind))]
    pub async fn link(
        &self,
        repo: &RepositoryRef,
        parent: IssueNumber,
        child: IssueNumber,
        kind: LinkKind,
    ) -> Result<LinkOutcome, TrackerError> {
        if parent == child {
            return Err(TrackerError::InvalidInput {
                message: format!("issue #{parent} cannot be linked to itself"),
            });
        }

        let parent_issue = self.client.get_issue(repo, parent, 0).await?;
        let child_issue = self.client.get_issue(repo, child, 0).await?;

        self.store
            .record_edge(&parent_issue, &child_issue, kind)
            .await?;
        info!("issues linked");

        Ok(LinkOutcome {
            parent: IssueRef::from(&parent_issue),
            child: IssueRef::from(&child_issue),
            kind,
        })
    }

    /// Makes `parent` track `issue`.
    pub async fn set_parent(
        &self,
        repo: &RepositoryRef,
        issue: IssueNumber,
        parent: IssueNumber,
    ) -> Result<LinkOutcome, TrackerError> {
        self.link(repo, parent, issue, LinkKind::Tracks).await
    }

    /// Rebuilds the hierarchy around `number`.
    ///
    /// Parents and children that cannot be fetched are left out of the view
    /// and recorded in [`HierarchyView::unresolved`].
    #[instrument(skip_all, fields(repo = %repo, issue = %number))]
    pub async fn hierarchy(
        &self,
        repo: &RepositoryRef,
        number: IssueNumber,
    ) -> Result<HierarchyView, TrackerError> {
        let issue = self
            .client
            .get_issue(repo, number, HIERARCHY_COMMENT_WINDOW)
            .await?;
        let edges = RelationshipStore::discover_edges(&issue);

        let mut view = HierarchyView {
            current: HierarchyEntry::from(&issue),
            parents: Vec::new(),
            children: Vec::new(),
            unresolved: Vec::new(),
        };

        let targets = edges
            .parent
            .map(|parent| (EdgeRole::Parent, parent))
            .into_iter()
            .chain(edges.children.into_iter().map(|child| (EdgeRole::Child, child)));

        for (role, target) in targets {
            match self.client.get_issue(repo, target, 0).await {
                Ok(found) => {
                    let entry = HierarchyEntry::from(&found);
                    match role {
                        EdgeRole::Parent => view.parents.push(entry),
                        EdgeRole::Child => view.children.push(entry),
                    }
                }
                Err(error) => {
                    warn!(target = %target, role = ?role, error = %error,
                        "skipping unresolved hierarchy edge");
                    view.unresolved.push(UnresolvedEdge {
                        role,
                        number: target,
                        error,
                    });
                }
            }
        }

        sort_by_type_priority(&mut view.children);
        Ok(view)
    }

    /// Makes `child` a sub-issue of `parent`, natively when GitHub supports
    /// it and through a manual `tracks` link otherwise.
    #[instrument(skip_all, fields(repo = %repo, parent = %parent, child = %child))]
    pub async fn add_sub_issue(
        &self,
        repo: &RepositoryRef,
        parent: IssueNumber,
        child: IssueNumber,
    ) -> Result<SubIssueOutcome, TrackerError> {
        let parent_issue = self.client.get_issue(repo, parent, 0).await?;
        let child_issue = self.client.get_issue(repo, child, 0).await?;

        let supported = match self.client.supports_native_sub_issues().await {
            Ok(supported) => supported,
            Err(error) => {
                warn!(error = %error, "sub-issue capability probe failed; attempting native call");
                true
            }
        };

        if supported {
            match self
                .client
                .add_native_sub_issue(&parent_issue.id, &child_issue.id)
                .await
            {
                Ok(()) => {
                    info!("native sub-issue created");
                    return Ok(SubIssueOutcome::Native {
                        parent: IssueRef::from(&parent_issue),
                        child: IssueRef::from(&child_issue),
                        native: true,
                    });
                }
                Err(TrackerError::CapabilityAbsent { message, .. }) => {
                    info!(reason = %message, "native sub-issues rejected; falling back to tracks link");
                }
                Err(other) => return Err(other),
            }
        } else {
            info!("native sub-issues unavailable; falling back to tracks link");
        }

        self.link(repo, parent, child, LinkKind::Tracks)
            .await
            .map(SubIssueOutcome::Linked)
    }
}
