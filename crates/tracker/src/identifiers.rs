//! Newtype domain identifiers.
//!
//! Every GitHub concept that has an identity is represented as a distinct
//! newtype wrapping a primitive. This prevents accidentally interchanging, for
//! example, an [`IssueNodeId`] with a [`ProjectItemId`] even though both are
//! opaque strings under the hood.
//!
//! GitHub gives issues two identities: the repository-scoped integer
//! ([`IssueNumber`]) that humans type, and the global opaque node id
//! ([`IssueNodeId`]) that every GraphQL mutation expects.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is blank.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.trim().is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Macro for u64-wrapped newtypes (GitHub-assigned integers).
// Generates: struct (Copy), new(), as_u64(), Display.
// ---------------------------------------------------------------------------
macro_rules! u64_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new identifier from a raw integer.
            pub fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the underlying integer value.
            pub fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: GitHub-integer-backed
// ---------------------------------------------------------------------------

u64_id! {
    /// Repository-scoped issue number (the `#42` in `owner/repo#42`).
    IssueNumber
}

u64_id! {
    /// Repository-scoped milestone number.
    MilestoneNumber
}

// ---------------------------------------------------------------------------
// Identifiers: GitHub global node ids
// ---------------------------------------------------------------------------

string_id! {
    /// Global GraphQL node id of an issue (e.g. `"I_kwDOAbc123"`).
    IssueNodeId
}

string_id! {
    /// Global GraphQL node id of a repository.
    RepositoryNodeId
}

string_id! {
    /// Global GraphQL node id of a label.
    LabelId
}

string_id! {
    /// Global GraphQL node id of a user, used for assignment.
    UserId
}

string_id! {
    /// Global GraphQL node id of a milestone.
    MilestoneId
}

string_id! {
    /// Global GraphQL node id of a Projects (v2) board.
    ProjectId
}

string_id! {
    /// Global GraphQL node id of an item on a Projects (v2) board.
    ProjectItemId
}

string_id! {
    /// Global GraphQL node id of a Projects (v2) field.
    ProjectFieldId
}

// ---------------------------------------------------------------------------
// Owner and repository
// ---------------------------------------------------------------------------

/// A GitHub user or organization login.
///
/// Logins are case-insensitive on GitHub; the value is lower-cased on
/// construction so every outbound call sees the same spelling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Owner(String);

impl Owner {
    /// Creates an owner login, returning `None` if the value is blank.
    pub fn new(login: impl AsRef<str>) -> Option<Self> {
        let login = login.as_ref().trim();
        if login.is_empty() {
            None
        } else {
            Some(Self(login.to_lowercase()))
        }
    }

    /// Returns the normalized login.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies a GitHub repository as `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryRef {
    owner: Owner,
    name: String,
}

impl RepositoryRef {
    /// Creates a repository reference, returning `None` if either part is blank.
    pub fn new(owner: impl AsRef<str>, name: impl AsRef<str>) -> Option<Self> {
        let owner = Owner::new(owner)?;
        let name = name.as_ref().trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            owner,
            name: name.to_string(),
        })
    }

    /// Returns the (lower-cased) owner login.
    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    /// Returns the repository name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single tool invocation.
///
/// Generated fresh for every tool call and attached to its tracing span so all
/// outbound GitHub calls made on behalf of one invocation can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvocationId(Uuid);

impl InvocationId {
    /// Generates a new random invocation identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for InvocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
