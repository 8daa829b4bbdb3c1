//! Keyword-based issue type classification.
//!
//! A deliberately simple rule list: the lower-cased title and body are tested
//! against one keyword set per [`IssueType`], in a fixed order, and the first
//! set with a substring hit wins. The order is the tie-break policy, so an
//! issue mentioning both "bug" and "feature" is a feature.

use crate::IssueType;

/// Keyword sets in evaluation order.
const RULES: &[(IssueType, &[&str])] = &[
    (IssueType::Epic, &["epic", "initiative", "milestone", "parent"]),
    (
        IssueType::Feature,
        &["feature", "enhancement", "new functionality", "add support", "implement"],
    ),
    (IssueType::Bug, &["bug", "fix", "error", "issue", "broken", "crash"]),
    (IssueType::Task, &["task", "chore", "refactor", "update", "clean"]),
    (IssueType::Story, &["story", "user story", "as a user", "i want"]),
    (IssueType::Documentation, &["documentation", "docs", "readme", "guide"]),
];

/// Classifies an issue from its title and optional body.
///
/// Returns `None` when no keyword matches.
pub fn classify(title: &str, body: Option<&str>) -> Option<IssueType> {
    let text = format!("{} {}", title, body.unwrap_or_default()).to_lowercase();
    RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| text.contains(keyword)))
        .map(|(issue_type, _)| *issue_type)
}

/// Appends the classified type tag to `labels` unless it is already present.
///
/// Containment is case-sensitive: a caller-supplied `"Bug"` label does not
/// stop `"bug"` from being added.
pub fn apply_type_label(labels: &mut Vec<String>, issue_type: Option<IssueType>) {
    if let Some(issue_type) = issue_type {
        let tag = issue_type.as_str();
        if !labels.iter().any(|label| label == tag) {
            labels.push(tag.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epic_wins_over_feature_keyword() {
        assert_eq!(
            classify("Epic: Implement user authentication system", None),
            Some(IssueType::Epic)
        );
    }

    #[test]
    fn bug_from_title_and_body() {
        assert_eq!(
            classify("Bug: Application crashes on startup", Some("crash when launching")),
            Some(IssueType::Bug)
        );
    }

    #[test]
    fn refactor_is_a_task() {
        assert_eq!(classify("Refactor old code", None), Some(IssueType::Task));
    }

    #[test]
    fn no_keywords_is_unclassified() {
        assert_eq!(classify("Random title with no keywords", None), None);
    }

    #[test]
    fn earlier_category_wins_ties() {
        assert_eq!(classify("Bug in new feature", None), Some(IssueType::Feature));
        assert_eq!(classify("Update the readme", None), Some(IssueType::Task));
        assert_eq!(
            classify("As a user I want a guide", None),
            Some(IssueType::Story)
        );
    }

    #[test]
    fn body_keywords_count() {
        assert_eq!(
            classify("Write it down", Some("See the DOCS folder")),
            Some(IssueType::Documentation)
        );
    }

    #[test]
    fn classification_is_deterministic() {
        for (title, body) in [
            ("Crash on save", Some("stack trace attached")),
            ("Initiative: platform", None),
            ("nothing to see", Some("really")),
        ] {
            assert_eq!(classify(title, body), classify(title, body));
        }
    }

    #[test]
    fn every_rule_is_reachable() {
        let cases = [
            ("initiative", IssueType::Epic),
            ("add support for x", IssueType::Feature),
            ("broken link", IssueType::Bug),
            ("chore", IssueType::Task),
            ("user story", IssueType::Story),
            ("readme", IssueType::Documentation),
        ];
        for (title, expected) in cases {
            assert_eq!(classify(title, None), Some(expected), "title: {title}");
        }
    }

    #[test]
    fn type_label_appended_once() {
        let mut labels = vec!["priority:high".to_string()];
        apply_type_label(&mut labels, Some(IssueType::Bug));
        apply_type_label(&mut labels, Some(IssueType::Bug));
        assert_eq!(labels, vec!["priority:high", "bug"]);
    }

    #[test]
    fn type_label_containment_is_case_sensitive() {
        let mut labels = vec!["Bug".to_string()];
        apply_type_label(&mut labels, Some(IssueType::Bug));
        assert_eq!(labels, vec!["Bug", "bug"]);
    }

    #[test]
    fn unclassified_adds_no_label() {
        let mut labels = Vec::new();
        apply_type_label(&mut labels, None);
        assert!(labels.is_empty());
    }
}
