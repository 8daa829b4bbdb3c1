//! Issue tracking domain for the GitHub Projects tool server.
//!
//! This crate contains every domain concept, newtype identifier and error type
//! used by the tool surface, together with the only non-trivial logic in the
//! system: the keyword [`classify`]er and the [`HierarchyManager`] that
//! emulates parent/child relationships on top of issue comments and bodies.
//! Infrastructure crates implement the traits in [`ports`]; they never add
//! domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; the `github` crate defines *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`IssueNumber`, `IssueNodeId`, `RepositoryRef`, ...) |
//! | [`types`] | Shared value types (`Issue`, `IssueType`, `LinkKind`, `Project`, ...) |
//! | [`errors`] | [`TrackerError`] |
//! | [`classifier`] | Keyword-based issue type classification |
//! | [`relationship`] | Comment/body encodings of edges ([`RelationshipStore`]) |
//! | [`hierarchy`] | [`HierarchyManager`]: link, hierarchy view, native sub-issues |
//! | [`issues`] | [`IssueService`]: list, get, create, update |
//! | [`projects`] | [`ProjectService`]: Projects (v2) boards |
//! | [`ports`] | [`IssueClient`] and [`ProjectBoard`] traits |

pub mod classifier;
pub mod errors;
pub mod hierarchy;
pub mod identifiers;
pub mod issues;
pub mod ports;
pub mod projects;
pub mod relationship;
pub mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use classifier::{apply_type_label, classify};
pub use errors::{TrackerError, SCOPE_HINT};
pub use hierarchy::{
    sort_by_type_priority, type_priority, EdgeRole, HierarchyEntry, HierarchyManager,
    HierarchyView, IssueRef, LinkOutcome, SubIssueOutcome, UnresolvedEdge,
    HIERARCHY_COMMENT_WINDOW,
};
pub use identifiers::{
    InvocationId, IssueNodeId, IssueNumber, LabelId, MilestoneId, MilestoneNumber, Owner,
    ProjectFieldId, ProjectId, ProjectItemId, RepositoryNodeId, RepositoryRef, UserId,
};
pub use issues::{
    ClassifiedIssue, CreateIssueRequest, CreatedIssue, IssueService, UpdateIssueRequest,
    ISSUE_COMMENT_WINDOW,
};
pub use ports::{IssueClient, ProjectBoard};
pub use projects::{ProjectItemRef, ProjectService};
pub use relationship::{DiscoveredEdges, RelationshipStore};
pub use types::{
    Comment, Issue, IssueQuery, IssueState, IssueType, IssueUpdate, Label, LinkKind, NewIssue,
    PageSize, Project, ProjectField, ProjectFieldOption, ProjectFieldValue, ProjectItem,
    ProjectItemContent, Timestamp,
};
