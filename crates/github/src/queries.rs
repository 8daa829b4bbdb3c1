//! GraphQL documents.

const ISSUE_FIELDS: &str = r#"
fragment IssueFields on Issue {
  id
  number
  title
  body
  state
  url
  labels(first: 100) { nodes { name } }
  assignees(first: 100) { nodes { login } }
}
"#;

pub(crate) const REPOSITORY_ID: &str = r#"
query RepositoryId($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) { id }
}
"#;

pub(crate) fn get_issue() -> String {
    format!(
        r#"
query GetIssue($owner: String!, $name: String!, $number: Int!, $comments: Int!, $withComments: Boolean!) {{
  repository(owner: $owner, name: $name) {{
    issue(number: $number) {{
      ...IssueFields
      comments(last: $comments) @include(if: $withComments) {{
        nodes {{ author {{ login }} body createdAt }}
      }}
    }}
  }}
}}
{ISSUE_FIELDS}"#
    )
}

pub(crate) fn list_issues() -> String {
    format!(
        r#"
query ListIssues($owner: String!, $name: String!, $first: Int!, $states: [IssueState!], $labels: [String!]) {{
  repository(owner: $owner, name: $name) {{
    issues(first: $first, states: $states, labels: $labels, orderBy: {{field: CREATED_AT, direction: DESC}}) {{
      nodes {{ ...IssueFields }}
    }}
  }}
}}
{ISSUE_FIELDS}"#
    )
}

pub(crate) fn create_issue() -> String {
    format!(
        r#"
mutation CreateIssue($input: CreateIssueInput!) {{
  createIssue(input: $input) {{ issue {{ ...IssueFields }} }}
}}
{ISSUE_FIELDS}"#
    )
}

pub(crate) fn update_issue() -> String {
    format!(
        r#"
mutation UpdateIssue($input: UpdateIssueInput!) {{
  updateIssue(input: $input) {{ issue {{ ...IssueFields }} }}
}}
{ISSUE_FIELDS}"#
    )
}

pub(crate) const LIST_LABELS: &str = r#"
query ListLabels($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    labels(first: 100) { nodes { id name } }
  }
}
"#;

pub(crate) const USER_ID: &str = r#"
query UserId($login: String!) {
  user(login: $login) { id }
}
"#;

pub(crate) const MILESTONE_ID: &str = r#"
query MilestoneId($owner: String!, $name: String!, $number: Int!) {
  repository(owner: $owner, name: $name) {
    milestone(number: $number) { id }
  }
}
"#;

pub(crate) const ADD_COMMENT: &str = r#"
mutation AddComment($subjectId: ID!, $body: String!) {
  addComment(input: {subjectId: $subjectId, body: $body}) { clientMutationId }
}
"#;

pub(crate) const SUB_ISSUE_CAPABILITY: &str = r#"
query SubIssueCapability {
  __type(name: "AddSubIssueInput") { name }
}
"#;

pub(crate) const ADD_SUB_ISSUE: &str = r#"
mutation AddSubIssue($issueId: ID!, $subIssueId: ID!) {
  addSubIssue(input: {issueId: $issueId, subIssueId: $subIssueId}) {
    issue { number }
    subIssue { number }
  }
}
"#;

pub(crate) const LIST_PROJECTS: &str = r#"
query ListProjects($login: String!, $first: Int!) {
  repositoryOwner(login: $login) {
    ... on ProjectV2Owner {
      projectsV2(first: $first) {
        nodes { id number title shortDescription url closed }
      }
    }
  }
}
"#;

pub(crate) const GET_PROJECT: &str = r#"
query GetProject($id: ID!) {
  node(id: $id) {
    ... on ProjectV2 {
      id
      number
      title
      shortDescription
      url
      closed
      fields(first: 100) {
        nodes {
          ... on ProjectV2FieldCommon { id name dataType }
          ... on ProjectV2SingleSelectField { options { id name } }
        }
      }
    }
  }
}
"#;

pub(crate) const LIST_PROJECT_ITEMS: &str = r#"
query ListProjectItems($id: ID!, $first: Int!) {
  node(id: $id) {
    ... on ProjectV2 {
      items(first: $first) {
        nodes {
          id
          content {
            __typename
            ... on Issue { number title state url }
            ... on PullRequest { number title state url }
            ... on DraftIssue { title }
          }
        }
      }
    }
  }
}
"#;

pub(crate) const ADD_PROJECT_ITEM: &str = r#"
mutation AddProjectItem($projectId: ID!, $contentId: ID!) {
  addProjectV2ItemById(input: {projectId: $projectId, contentId: $contentId}) {
    item { id }
  }
}
"#;

pub(crate) const UPDATE_PROJECT_ITEM_FIELD: &str = r#"
mutation UpdateProjectItemField($projectId: ID!, $itemId: ID!, $fieldId: ID!, $value: ProjectV2FieldValue!) {
  updateProjectV2ItemFieldValue(
    input: {projectId: $projectId, itemId: $itemId, fieldId: $fieldId, value: $value}
  ) {
    projectV2Item { id }
  }
}
"#;
