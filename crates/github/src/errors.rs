//! Translation of GraphQL errors into [`TrackerError`].

use serde::Deserialize;
use tracker::TrackerError;

/// Substrings (lower-case) GitHub uses when a schema element is unknown.
const CAPABILITY_ABSENT_MARKERS: &[&str] = &[
    "doesn't exist on type",
    "does not exist on type",
    "unknown field",
    "undefinedfield",
    "isn't a defined input type",
];

/// One entry of a GraphQL `errors` array.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GraphqlError {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Maps a non-empty GraphQL error list.
///
/// All-`NOT_FOUND` lists become [`TrackerError::NotFound`] carrying GitHub's
/// own message (which names the missing entity); anything else is an upstream
/// failure.
pub(crate) fn from_graphql(operation: &str, errors: &[GraphqlError]) -> TrackerError {
    let message = errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    let all_not_found = errors
        .iter()
        .all(|e| e.kind.as_deref() == Some("NOT_FOUND"));
    if all_not_found {
        TrackerError::not_found(message)
    } else {
        TrackerError::upstream(format!("{operation}: {message}"))
    }
}

/// Returns `true` when an upstream message says the requested field or type
/// is not part of the schema.
pub fn is_capability_absent(message: &str) -> bool {
    let lower = message.to_lowercase();
    CAPABILITY_ABSENT_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
}

/// Re-labels an upstream failure of an optional-capability call as
/// [`TrackerError::CapabilityAbsent`] when its message says so.
///
/// This is the only place that inspects upstream error text.
pub(crate) fn sniff_capability_absent(capability: &str, error: TrackerError) -> TrackerError {
    match error {
        TrackerError::Upstream { message, .. } if is_capability_absent(&message) => {
            TrackerError::CapabilityAbsent {
                capability: capability.to_string(),
                message,
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(kind: Option<&str>, message: &str) -> GraphqlError {
        GraphqlError {
            message: message.into(),
            kind: kind.map(str::to_string),
        }
    }

    #[test]
    fn recognises_schema_absence_messages() {
        assert!(is_capability_absent(
            "Field 'addSubIssue' doesn't exist on type 'Mutation'"
        ));
        assert!(is_capability_absent("Unknown field subIssues"));
        assert!(is_capability_absent("AddSubIssueInput isn't a defined input type"));
        assert!(!is_capability_absent("Bad credentials"));
        assert!(!is_capability_absent("Could not resolve to an Issue"));
    }

    #[test]
    fn all_not_found_is_not_found() {
        let err = from_graphql(
            "GetIssue",
            &[error(
                Some("NOT_FOUND"),
                "Could not resolve to an Issue with the number of 9.",
            )],
        );
        assert_eq!(
            err,
            TrackerError::not_found("Could not resolve to an Issue with the number of 9.")
        );
    }

    #[test]
    fn mixed_errors_are_upstream() {
        let err = from_graphql(
            "GetIssue",
            &[
                error(Some("NOT_FOUND"), "missing"),
                error(Some("FORBIDDEN"), "Resource not accessible by integration"),
            ],
        );
        assert!(matches!(err, TrackerError::Upstream { hint: Some(_), .. }));
    }

    #[test]
    fn sniffing_only_touches_matching_upstream_errors() {
        let absent = sniff_capability_absent(
            "sub-issues",
            TrackerError::upstream("AddSubIssue: Field 'addSubIssue' doesn't exist on type 'Mutation'"),
        );
        assert!(matches!(absent, TrackerError::CapabilityAbsent { .. }));

        let other = sniff_capability_absent("sub-issues", TrackerError::upstream("Bad credentials"));
        assert!(matches!(other, TrackerError::Upstream { .. }));

        let missing = sniff_capability_absent("sub-issues", TrackerError::not_found("x"));
        assert!(missing.is_not_found());
    }
}
