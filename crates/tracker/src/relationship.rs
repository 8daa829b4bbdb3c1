//! Parent/child relationship encoding.
//!
//! GitHub has no reliable relational field between issues, so an edge is
//! written twice:
//!
//! 1. a comment pair, `Tracks #C` on the parent and `Tracked by #P` on the
//!    child (with `Blocks`/`Related to` variants for the other kinds);
//! 2. for `tracks` edges only, a `**Parent:** #P - <title>` block at the end
//!    of the child's body plus a `- [ ] #C <title>` line in the parent's task
//!    list.
//!
//! The encodings are not reconciled after creation. Reading goes through
//! [`RelationshipStore::discover_edges`], which understands the `Tracks #N`
//! comment token and the body marker and nothing else.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use regex::{NoExpand, Regex};
use tracing::{debug, warn};

use crate::{Issue, IssueClient, IssueNumber, IssueUpdate, LinkKind, TrackerError};

/// Literal used to detect an existing parent block in a child's body.
const PARENT_MARKER: &str = "**Parent:**";

/// Heading of the task-list section prepended to a parent's body.
const TASKS_HEADING: &str = "### Tasks";

static PARENT_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*Parent:\*\* #(\d+)").expect("valid regex"));

// An existing block, with its separator when it was written by us.
static PARENT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\n\n---\n)?\*\*Parent:\*\*[^\r\n]*").expect("valid regex"));

static TRACKS_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Tracks #(\d+)").expect("valid regex"));

static TASK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^- \[[ xX]\] #(\d+)\b[^\r\n]*").expect("valid regex"));

// ---------------------------------------------------------------------------
// Comment templates
// ---------------------------------------------------------------------------

/// Comment posted on the parent side of an edge.
pub fn parent_comment(kind: LinkKind, child: IssueNumber) -> String {
    match kind {
        LinkKind::Tracks => format!("Tracks #{child}"),
        LinkKind::Blocks => format!("Blocks #{child}"),
        LinkKind::Related => format!("Related to #{child}"),
    }
}

/// Comment posted on the child side of an edge.
pub fn child_comment(kind: LinkKind, parent: IssueNumber) -> String {
    match kind {
        LinkKind::Tracks => format!("Tracked by #{parent}"),
        LinkKind::Blocks => format!("Blocked by #{parent}"),
        LinkKind::Related => format!("Related to #{parent}"),
    }
}

// ---------------------------------------------------------------------------
// Body rewrites
// ---------------------------------------------------------------------------

/// Returns `body` with its parent block pointing at `parent`.
///
/// An existing block is replaced in place; otherwise the block is appended.
pub fn with_parent_marker(body: &str, parent: IssueNumber, parent_title: &str) -> String {
    let block = format!("\n\n---\n{PARENT_MARKER} #{parent} - {parent_title}");
    if body.contains(PARENT_MARKER) {
        PARENT_BLOCK.replace(body, NoExpand(&block)).into_owned()
    } else {
        format!("{body}{block}")
    }
}

/// Returns `body` with an unchecked task-list entry for `child`, or `None`
/// when a task-list line already references the child.
///
/// The entry joins the first existing task-list block. Without one, a new
/// `### Tasks` section is prepended ahead of the existing body.
pub fn with_task_entry(body: &str, child: IssueNumber, child_title: &str) -> Option<String> {
    let lines: Vec<_> = TASK_LINE.captures_iter(body).collect();
    let already_listed = lines
        .iter()
        .any(|caps| caps[1].parse::<u64>().ok() == Some(child.as_u64()));
    if already_listed {
        return None;
    }

    let entry = format!("- [ ] #{child} {child_title}");
    let Some(first) = lines.first().and_then(|caps| caps.get(0)) else {
        return Some(if body.is_empty() {
            format!("{TASKS_HEADING}\n{entry}\n")
        } else {
            format!("{TASKS_HEADING}\n{entry}\n\n{body}")
        });
    };

    let newline = if body[first.end()..].starts_with("\r\n") {
        "\r\n"
    } else {
        "\n"
    };

    // Walk to the end of the contiguous block that starts at the first line.
    let mut block_end = first.end();
    for caps in lines.iter().skip(1) {
        let Some(line) = caps.get(0) else { continue };
        let gap = &body[block_end..line.start()];
        if gap == "\n" || gap == "\r\n" {
            block_end = line.end();
        } else {
            break;
        }
    }

    let mut updated = String::with_capacity(body.len() + entry.len() + newline.len());
    updated.push_str(&body[..block_end]);
    updated.push_str(newline);
    updated.push_str(&entry);
    updated.push_str(&body[block_end..]);
    Some(updated)
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Edge endpoints recovered from one issue's body and comments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredEdges {
    /// Parent named by the body marker (first match only).
    pub parent: Option<IssueNumber>,
    /// Distinct children named by `Tracks #N` comments, in order of first
    /// appearance.
    pub children: Vec<IssueNumber>,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Reads and writes relationship edges through an [`IssueClient`].
#[derive(Clone)]
pub struct RelationshipStore {
    client: Arc<dyn IssueClient>,
}

impl RelationshipStore {
    pub fn new(client: Arc<dyn IssueClient>) -> Self {
        Self { client }
    }

    /// Writes every encoding of `parent → child`.
    ///
    /// Steps run in a fixed order and are not transactional: a failure after
    /// the parent comment leaves that comment in place. A failure to update
    /// the parent's task list is logged and absorbed since the edge is
    /// already recoverable from the comment and the child's body.
    pub async fn record_edge(
        &self,
        parent: &Issue,
        child: &Issue,
        kind: LinkKind,
    ) -> Result<(), TrackerError> {
        self.client
            .add_comment(&parent.id, &parent_comment(kind, child.number))
            .await?;
        self.client
            .add_comment(&child.id, &child_comment(kind, parent.number))
            .await?;

        if kind != LinkKind::Tracks {
            return Ok(());
        }

        let child_body = with_parent_marker(&child.body, parent.number, &parent.title);
        if child_body != child.body {
            self.client
                .update_issue(&IssueUpdate::body(child.id.clone(), child_body))
                .await?;
        }

        match with_task_entry(&parent.body, child.number, &child.title) {
            Some(parent_body) => {
                if let Err(err) = self
                    .client
                    .update_issue(&IssueUpdate::body(parent.id.clone(), parent_body))
                    .await
                {
                    warn!(parent = %parent.number, child = %child.number, error = %err,
                        "failed to update parent task list");
                }
            }
            None => debug!(parent = %parent.number, child = %child.number, "child already in task list"),
        }
        Ok(())
    }

    /// Recovers the edges encoded on `issue`: the parent from its body marker
    /// and the children from `Tracks #N` tokens in its comments.
    pub fn discover_edges(issue: &Issue) -> DiscoveredEdges {
        let parent = PARENT_REFERENCE
            .captures(&issue.body)
            .and_then(|caps| caps[1].parse().ok())
            .map(IssueNumber::new);

        let mut seen = HashSet::new();
        let children = issue
            .comments
            .iter()
            .flat_map(|comment| TRACKS_REFERENCE.captures_iter(&comment.body))
            .filter_map(|caps| caps[1].parse().ok())
            .map(IssueNumber::new)
            .filter(|number| seen.insert(*number))
            .collect();

        DiscoveredEdges { parent, children }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Comment, IssueNodeId, IssueState, Timestamp};

    fn n(value: u64) -> IssueNumber {
        IssueNumber::new(value)
    }

    fn issue_with(body: &str, comments: &[&str]) -> Issue {
        Issue {
            id: IssueNodeId::new("I_1").unwrap(),
            number: n(1),
            title: "Issue".into(),
            body: body.into(),
            state: IssueState::Open,
            url: None,
            labels: vec![],
            assignees: vec![],
            comments: comments
                .iter()
                .map(|body| Comment {
                    author: Some("octocat".into()),
                    body: body.to_string(),
                    created_at: Timestamp::now(),
                })
                .collect(),
        }
    }

    #[test]
    fn comment_templates_per_kind() {
        assert_eq!(parent_comment(LinkKind::Tracks, n(5)), "Tracks #5");
        assert_eq!(parent_comment(LinkKind::Blocks, n(5)), "Blocks #5");
        assert_eq!(parent_comment(LinkKind::Related, n(5)), "Related to #5");
        assert_eq!(child_comment(LinkKind::Tracks, n(4)), "Tracked by #4");
        assert_eq!(child_comment(LinkKind::Blocks, n(4)), "Blocked by #4");
        assert_eq!(child_comment(LinkKind::Related, n(4)), "Related to #4");
    }

    #[test]
    fn parent_marker_appended() {
        assert_eq!(
            with_parent_marker("Do the thing", n(100), "Epic: Auth"),
            "Do the thing\n\n---\n**Parent:** #100 - Epic: Auth"
        );
    }

    #[test]
    fn parent_marker_replaced() {
        let body = "Do the thing\n\n---\n**Parent:** #100 - Old parent";
        assert_eq!(
            with_parent_marker(body, n(200), "New parent"),
            "Do the thing\n\n---\n**Parent:** #200 - New parent"
        );
    }

    #[test]
    fn parent_marker_title_is_not_a_replacement_pattern() {
        let body = "x\n\n---\n**Parent:** #1 - a";
        assert_eq!(
            with_parent_marker(body, n(2), "Costs $1"),
            "x\n\n---\n**Parent:** #2 - Costs $1"
        );
    }

    #[test]
    fn task_section_prepended_when_missing() {
        assert_eq!(
            with_task_entry("Overview text", n(101), "Login form").unwrap(),
            "### Tasks\n- [ ] #101 Login form\n\nOverview text"
        );
        assert_eq!(
            with_task_entry("", n(101), "Login form").unwrap(),
            "### Tasks\n- [ ] #101 Login form\n"
        );
    }

    #[test]
    fn task_entry_appended_to_existing_block() {
        let body = "### Tasks\n- [x] #101 Login form\n- [ ] #102 Logout\n\nNotes";
        assert_eq!(
            with_task_entry(body, n(103), "Reset password").unwrap(),
            "### Tasks\n- [x] #101 Login form\n- [ ] #102 Logout\n- [ ] #103 Reset password\n\nNotes"
        );
    }

    #[test]
    fn task_entry_joins_first_block_only() {
        let body = "- [ ] #1 a\n\ntext\n\n- [ ] #2 b";
        assert_eq!(
            with_task_entry(body, n(3), "c").unwrap(),
            "- [ ] #1 a\n- [ ] #3 c\n\ntext\n\n- [ ] #2 b"
        );
    }

    #[test]
    fn task_entry_keeps_crlf_line_endings() {
        let body = "### Tasks\r\n- [ ] #1 a\r\n- [ ] #2 b\r\n\r\nNotes";
        assert_eq!(
            with_task_entry(body, n(3), "c").unwrap(),
            "### Tasks\r\n- [ ] #1 a\r\n- [ ] #2 b\r\n- [ ] #3 c\r\n\r\nNotes"
        );
        assert_eq!(with_task_entry(body, n(2), "b"), None);
    }

    #[test]
    fn task_entry_not_duplicated() {
        let body = "### Tasks\n- [ ] #101 Login form\n";
        assert_eq!(with_task_entry(body, n(101), "Login form"), None);
        let checked = "### Tasks\n- [x] #101 Login form\n";
        assert_eq!(with_task_entry(checked, n(101), "Login form"), None);
    }

    #[test]
    fn task_entry_number_prefix_is_not_a_match() {
        let body = "- [ ] #1010 Other";
        assert!(with_task_entry(body, n(101), "Mine").is_some());
    }

    #[test]
    fn discovers_parent_from_body() {
        let issue = issue_with("text\n\n---\n**Parent:** #42 - Epic", &[]);
        assert_eq!(RelationshipStore::discover_edges(&issue).parent, Some(n(42)));
    }

    #[test]
    fn discovers_children_deduplicated_in_first_appearance_order() {
        let issue = issue_with(
            "",
            &["Tracks #7", "Tracks #3 and Tracks #7", "Blocks #9", "Tracked by #1", "Tracks #5"],
        );
        let edges = RelationshipStore::discover_edges(&issue);
        assert_eq!(edges.parent, None);
        assert_eq!(edges.children, vec![n(7), n(3), n(5)]);
    }
}
