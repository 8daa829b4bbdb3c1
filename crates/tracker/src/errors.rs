//! Error taxonomy for the issue tracking domain.
//!
//! [`TrackerError`] is shared by the domain services and the port traits in
//! [`crate::ports`]: infrastructure adapters translate transport failures into
//! one of its variants so the services can decide, close to the origin, whether
//! to fail fast ([`TrackerError::NotFound`]), fall back
//! ([`TrackerError::CapabilityAbsent`]) or propagate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Substrings (lower-case) that mark an upstream message as a credential
/// failure.
const CREDENTIAL_FAILURE_MARKERS: &[&str] = &[
    "bad credentials",
    "http 401",
    "unauthorized",
    "requires authentication",
    "resource not accessible",
    "insufficient scopes",
    "your token has not been granted the required scopes",
];

/// Hint appended to credential failures.
pub const SCOPE_HINT: &str =
    "Make sure GITHUB_TOKEN is valid and has the 'repo', 'project' and 'read:org' scopes.";

/// Errors surfaced by the domain services.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum TrackerError {
    /// A repository, issue, owner, project or milestone does not exist or is
    /// not visible to the token.
    #[error("Not found: {message}")]
    NotFound {
        /// Human-readable description naming the missing entity.
        message: String,
    },

    /// The caller supplied an argument the domain cannot interpret.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of the rejected argument.
        message: String,
    },

    /// The upstream API does not offer an optional capability.
    ///
    /// Recognised by the adapter; the service that asked for the capability
    /// decides on a fallback instead of propagating.
    #[error("GitHub API does not support {capability}: {message}")]
    CapabilityAbsent {
        /// Short name of the missing capability (e.g. `"sub-issues"`).
        capability: String,
        /// The upstream message that revealed the absence.
        message: String,
    },

    /// The upstream call itself failed (authentication, schema, transport).
    #[error("GitHub API error: {message}{}", .hint.as_deref().map(|h| format!(". {h}")).unwrap_or_default())]
    Upstream {
        /// Upstream message.
        message: String,
        /// Remediation hint for recognised failure classes.
        hint: Option<String>,
    },
}

impl TrackerError {
    /// Builds a [`TrackerError::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Builds a [`TrackerError::Upstream`], attaching the token-scope hint when
    /// the message looks like a credential failure.
    pub fn upstream(message: impl Into<String>) -> Self {
        let message = message.into();
        let hint = is_credential_failure(&message).then(|| SCOPE_HINT.to_string());
        Self::Upstream { message, hint }
    }

    /// Returns `true` for [`TrackerError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

fn is_credential_failure(message: &str) -> bool {
    let lower = message.to_lowercase();
    CREDENTIAL_FAILURE_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_failures_get_scope_hint() {
        let err = TrackerError::upstream("Bad credentials");
        assert_eq!(
            err.to_string(),
            format!("GitHub API error: Bad credentials. {SCOPE_HINT}")
        );
    }

    #[test]
    fn other_upstream_failures_have_no_hint() {
        let err = TrackerError::upstream("Something went wrong while executing your query");
        assert_eq!(
            err,
            TrackerError::Upstream {
                message: "Something went wrong while executing your query".into(),
                hint: None
            }
        );
        assert_eq!(
            err.to_string(),
            "GitHub API error: Something went wrong while executing your query"
        );
    }

    #[test]
    fn digits_401_inside_ids_are_not_credential_failures() {
        let err =
            TrackerError::upstream("UpdateIssue: Argument 'body' on node I_kwDOA4015 is too long");
        assert!(matches!(err, TrackerError::Upstream { hint: None, .. }));

        let err = TrackerError::upstream("HTTP 401: {\"message\":\"Requires login\"}");
        assert!(matches!(err, TrackerError::Upstream { hint: Some(_), .. }));
    }

    #[test]
    fn not_found_names_entity() {
        let err = TrackerError::not_found("issue #7 in acme/widgets");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found: issue #7 in acme/widgets");
    }
}
