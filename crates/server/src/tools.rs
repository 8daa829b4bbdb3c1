//! The tool router.
//!
//! Every tool parses its input into domain values, calls one service
//! operation and returns the JSON-encoded result as a single text block.
//! Each call runs inside a `tool` span carrying a fresh [`InvocationId`].

use std::future::Future;
use std::sync::Arc;

use rmcp::{
    handler::server::tool::{ToolCallContext, ToolRouter},
    handler::server::wrapper::Parameters,
    model::*,
    service::RequestContext,
    tool, tool_router, ErrorData as McpError, RoleServer, ServerHandler,
};
use serde::Serialize;
use tracing::{info_span, warn, Instrument};
use tracker::{
    HierarchyManager, InvocationId, IssueClient, IssueNumber, IssueService, PageSize,
    ProjectBoard, ProjectFieldValue, ProjectService, TrackerError,
};

use crate::params::{
    repository, AddIssueToProjectInput, AddSubIssueInput, CreateIssueInput, IssueInput,
    LinkIssuesInput, ListIssuesInput, ListProjectItemsInput, ListProjectsInput, ProjectInput,
    SetParentInput, UpdateIssueInput, UpdateProjectItemFieldInput,
};

const INSTRUCTIONS: &str = "GitHub Projects (v2) and Issues. Issue types (epic, feature, story, \
task, bug, documentation) are inferred from title and body. Parent/child relationships are \
recorded as comments and a task list so they survive without GitHub's sub-issue feature; \
use get_issue_hierarchy to read them back.";

/// Maps a domain error onto the protocol's error codes.
pub fn to_mcp_error(error: TrackerError) -> McpError {
    let message = error.to_string();
    match error {
        TrackerError::NotFound { .. } => McpError::invalid_request(message, None),
        TrackerError::InvalidInput { .. } => McpError::invalid_params(message, None),
        _ => McpError::internal_error(message, None),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string(value)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Runs one tool body inside its invocation span.
async fn invoke<T, F>(tool: &'static str, body: F) -> Result<CallToolResult, McpError>
where
    T: Serialize,
    F: Future<Output = Result<T, TrackerError>>,
{
    let invocation = InvocationId::new_random();
    let span = info_span!("tool", tool, invocation = %invocation);
    async move {
        match body.await {
            Ok(value) => to_json(&value),
            Err(error) => {
                warn!(error = %error, "tool call failed");
                Err(to_mcp_error(error))
            }
        }
    }
    .instrument(span)
    .await
}

/// GitHub Projects / Issues tool server.
#[derive(Clone)]
pub struct ProjectsServer {
    issues: IssueService,
    hierarchy: HierarchyManager,
    projects: ProjectService,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl ProjectsServer {
    /// Builds the server from the two ports. The GraphQL client implements
    /// both, so callers usually pass the same `Arc` twice.
    pub fn new(issues: Arc<dyn IssueClient>, board: Arc<dyn ProjectBoard>) -> Self {
        let hierarchy = HierarchyManager::new(issues.clone());
        Self {
            issues: IssueService::new(issues.clone(), hierarchy.clone()),
            projects: ProjectService::new(board, issues),
            hierarchy,
            tool_router: Self::tool_router(),
        }
    }

    /// Names of every registered tool.
    pub fn tool_names(&self) -> Vec<String> {
        self.tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    #[tool(description = "List the Projects (v2) boards of a user or organization.")]
    async fn list_projects(
        &self,
        Parameters(input): Parameters<ListProjectsInput>,
    ) -> Result<CallToolResult, McpError> {
        invoke("list_projects", async {
            let owner = input.owner()?;
            self.projects
                .list(&owner, PageSize::from_request(input.first))
                .await
        })
        .await
    }

    #[tool(description = "Get a project board with its field definitions and single-select options.")]
    async fn get_project(
        &self,
        Parameters(input): Parameters<ProjectInput>,
    ) -> Result<CallToolResult, McpError> {
        invoke("get_project", async {
            self.projects.get(&input.project_id()?).await
        })
        .await
    }

    #[tool(description = "List the items on a project board with a summary of their content.")]
    async fn list_project_items(
        &self,
        Parameters(input): Parameters<ListProjectItemsInput>,
    ) -> Result<CallToolResult, McpError> {
        invoke("list_project_items", async {
            self.projects
                .items(&input.project_id()?, PageSize::from_request(input.first))
                .await
        })
        .await
    }

    #[tool(description = "Add an existing issue to a project board. Returns the new item id.")]
    async fn add_issue_to_project(
        &self,
        Parameters(input): Parameters<AddIssueToProjectInput>,
    ) -> Result<CallToolResult, McpError> {
        invoke("add_issue_to_project", async {
            let project = input.project_id()?;
            let repo = repository(&input.owner, &input.repo)?;
            self.projects
                .add_issue(&project, &repo, IssueNumber::new(input.issue_number))
                .await
        })
        .await
    }

    #[tool(
        description = "Set a field on a project item. value is a string (text), a number, or an object with exactly one of text, number, date, singleSelectOptionId, iterationId."
    )]
    async fn update_project_item_field(
        &self,
        Parameters(input): Parameters<UpdateProjectItemFieldInput>,
    ) -> Result<CallToolResult, McpError> {
        invoke("update_project_item_field", async {
            let (project, item, field) = input.ids()?;
            let value = ProjectFieldValue::from_json(&input.value)?;
            self.projects
                .update_field(&project, &item, &field, &value)
                .await
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Issues
    // -----------------------------------------------------------------------

    #[tool(description = "List repository issues, newest first, each with its inferred type.")]
    async fn list_issues(
        &self,
        Parameters(input): Parameters<ListIssuesInput>,
    ) -> Result<CallToolResult, McpError> {
        invoke("list_issues", async {
            let repo = repository(&input.owner, &input.repo)?;
            self.issues.list(&repo, &input.query()?).await
        })
        .await
    }

    #[tool(description = "Get an issue with its labels, assignees, recent comments and inferred type.")]
    async fn get_issue(
        &self,
        Parameters(input): Parameters<IssueInput>,
    ) -> Result<CallToolResult, McpError> {
        invoke("get_issue", async {
            let repo = repository(&input.owner, &input.repo)?;
            self.issues
                .get(&repo, IssueNumber::new(input.issue_number))
                .await
        })
        .await
    }

    #[tool(
        description = "Create an issue. Its type (epic, feature, story, task, bug, documentation) is inferred from title and body and added as a label. With parentIssueNumber the new issue is linked under that parent."
    )]
    async fn create_issue(
        &self,
        Parameters(input): Parameters<CreateIssueInput>,
    ) -> Result<CallToolResult, McpError> {
        invoke("create_issue", async {
            let repo = repository(&input.owner, &input.repo)?;
            self.issues.create(&repo, input.into()).await
        })
        .await
    }

    #[tool(
        description = "Update an issue. Only supplied fields change; labels and assignees replace the existing sets."
    )]
    async fn update_issue(
        &self,
        Parameters(input): Parameters<UpdateIssueInput>,
    ) -> Result<CallToolResult, McpError> {
        invoke("update_issue", async {
            let repo = repository(&input.owner, &input.repo)?;
            self.issues.update(&repo, input.request()?).await
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Relationships
    // -----------------------------------------------------------------------

    #[tool(
        description = "Link two issues. linkType is tracks (default), blocks or related. A tracks link also marks the parent in the child's body and adds the child to the parent's task list."
    )]
    async fn link_issues(
        &self,
        Parameters(input): Parameters<LinkIssuesInput>,
    ) -> Result<CallToolResult, McpError> {
        invoke("link_issues", async {
            let repo = repository(&input.owner, &input.repo)?;
            self.hierarchy
                .link(
                    &repo,
                    IssueNumber::new(input.parent_issue_number),
                    IssueNumber::new(input.child_issue_number),
                    input.kind()?,
                )
                .await
        })
        .await
    }

    #[tool(description = "Make parentIssueNumber track issueNumber.")]
    async fn set_parent(
        &self,
        Parameters(input): Parameters<SetParentInput>,
    ) -> Result<CallToolResult, McpError> {
        invoke("set_parent", async {
            let repo = repository(&input.owner, &input.repo)?;
            self.hierarchy
                .set_parent(
                    &repo,
                    IssueNumber::new(input.issue_number),
                    IssueNumber::new(input.parent_issue_number),
                )
                .await
        })
        .await
    }

    #[tool(
        description = "Make an issue a sub-issue using GitHub's native sub-issues, falling back to a tracks link when the API does not support them."
    )]
    async fn add_sub_issue(
        &self,
        Parameters(input): Parameters<AddSubIssueInput>,
    ) -> Result<CallToolResult, McpError> {
        invoke("add_sub_issue", async {
            let repo = repository(&input.owner, &input.repo)?;
            self.hierarchy
                .add_sub_issue(
                    &repo,
                    IssueNumber::new(input.parent_issue_number),
                    IssueNumber::new(input.child_issue_number),
                )
                .await
        })
        .await
    }

    #[tool(
        description = "Get an issue's parent and children as recorded by link_issues, children ordered epic, feature, story, task, bug, documentation."
    )]
    async fn get_issue_hierarchy(
        &self,
        Parameters(input): Parameters<IssueInput>,
    ) -> Result<CallToolResult, McpError> {
        invoke("get_issue_hierarchy", async {
            let repo = repository(&input.owner, &input.repo)?;
            self.hierarchy
                .hierarchy(&repo, IssueNumber::new(input.issue_number))
                .await
        })
        .await
    }
}

impl ServerHandler for ProjectsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.tool_router.list_all()))
    }

    /// Unknown names are answered with method-not-found before the router
    /// sees them.
    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        if !self.tool_router.has_route(&request.name) {
            warn!(tool = %request.name, "unknown tool");
            return Err(McpError::new(
                ErrorCode::METHOD_NOT_FOUND,
                format!("Unknown tool: {}", request.name),
                None,
            ));
        }
        let call = ToolCallContext::new(self, request, context);
        self.tool_router.call(call).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tracker::testing::{InMemoryGithub, NativeSubIssues};
    use tracker::RepositoryRef;

    fn github() -> Arc<InMemoryGithub> {
        Arc::new(InMemoryGithub::new(RepositoryRef::new("acme", "widgets").unwrap()))
    }

    fn server(github: &Arc<InMemoryGithub>) -> ProjectsServer {
        ProjectsServer::new(github.clone(), github.clone())
    }

    fn params<T: serde::de::DeserializeOwned>(value: Value) -> Parameters<T> {
        Parameters(serde_json::from_value(value).unwrap())
    }

    /// Decodes the single text block of a tool result.
    fn text_json(result: CallToolResult) -> Value {
        let encoded = serde_json::to_value(&result).unwrap();
        let text = encoded["content"][0]["text"].as_str().unwrap();
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn registers_every_tool() {
        let mut names = server(&github()).tool_names();
        names.sort();
        assert_eq!(
            names,
            vec![
                "add_issue_to_project",
                "add_sub_issue",
                "create_issue",
                "get_issue",
                "get_issue_hierarchy",
                "get_project",
                "link_issues",
                "list_issues",
                "list_project_items",
                "list_projects",
                "set_parent",
                "update_issue",
                "update_project_item_field",
            ]
        );
    }

    /// Serves `server` over an in-process pipe and returns the client end
    /// after the initialize handshake.
    async fn connect(
        server: ProjectsServer,
    ) -> (
        tokio::io::Lines<tokio::io::BufReader<tokio::io::ReadHalf<tokio::io::DuplexStream>>>,
        tokio::io::WriteHalf<tokio::io::DuplexStream>,
    ) {
        use rmcp::ServiceExt;
        use tokio::io::AsyncBufReadExt;

        let (client, transport) = tokio::io::duplex(64 * 1024);
        tokio::spawn(async move {
            if let Ok(service) = server.serve(transport).await {
                let _ = service.waiting().await;
            }
        });

        let (read, mut write) = tokio::io::split(client);
        let mut lines = tokio::io::BufReader::new(read).lines();
        send(
            &mut write,
            json!({
                "jsonrpc": "2.0", "id": 1, "method": "initialize",
                "params": {
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": { "name": "test-client", "version": "0.0.0" }
                }
            }),
        )
        .await;
        let initialized = lines.next_line().await.unwrap().unwrap();
        assert!(initialized.contains("\"result\""));
        send(
            &mut write,
            json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }),
        )
        .await;
        (lines, write)
    }

    async fn send(write: &mut tokio::io::WriteHalf<tokio::io::DuplexStream>, message: Value) {
        use tokio::io::AsyncWriteExt;
        let mut line = message.to_string();
        line.push('\n');
        write.write_all(line.as_bytes()).await.unwrap();
        write.flush().await.unwrap();
    }

    #[tokio::test]
    async fn unknown_tool_is_method_not_found() {
        let (mut lines, mut write) = connect(server(&github())).await;

        send(
            &mut write,
            json!({
                "jsonrpc": "2.0", "id": 2, "method": "tools/call",
                "params": { "name": "no_such_tool", "arguments": {} }
            }),
        )
        .await;
        let reply: Value = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert_eq!(reply["id"], 2);
        assert_eq!(reply["error"]["code"], -32601);
        assert_eq!(reply["error"]["message"], "Unknown tool: no_such_tool");

        send(
            &mut write,
            json!({
                "jsonrpc": "2.0", "id": 3, "method": "tools/call",
                "params": {
                    "name": "get_issue",
                    "arguments": { "owner": "acme", "repo": "widgets", "issueNumber": 404 }
                }
            }),
        )
        .await;
        let reply: Value = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert_eq!(reply["id"], 3);
        assert_eq!(reply["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn link_then_hierarchy_round_trip() {
        let github = github();
        github.add_issue(1, "Epic: platform", "");
        github.add_issue(2, "Task: wire the client", "");
        let server = server(&github);

        let linked = text_json(
            server
                .link_issues(params(json!({
                    "owner": "Acme", "repo": "widgets",
                    "parentIssueNumber": 1, "childIssueNumber": 2
                })))
                .await
                .unwrap(),
        );
        assert_eq!(linked["kind"], "tracks");
        assert_eq!(linked["parent"]["number"], 1);
        assert_eq!(linked["child"]["number"], 2);

        let view = text_json(
            server
                .get_issue_hierarchy(params(json!({
                    "owner": "acme", "repo": "widgets", "issueNumber": 1
                })))
                .await
                .unwrap(),
        );
        assert_eq!(view["current"]["type"], "epic");
        assert_eq!(view["children"][0]["number"], 2);
        assert_eq!(view["children"][0]["title"], "Task: wire the client");
        assert!(view.get("unresolved").is_none());
    }

    #[tokio::test]
    async fn create_issue_adds_type_label() {
        let github = github();
        github.add_labels(&["bug"]);
        let server = server(&github);

        let created = text_json(
            server
                .create_issue(params(json!({
                    "owner": "acme", "repo": "widgets",
                    "title": "App crashes on launch"
                })))
                .await
                .unwrap(),
        );
        assert_eq!(created["type"], "bug");
        assert_eq!(created["labels"], json!(["bug"]));
    }

    #[tokio::test]
    async fn missing_issue_is_invalid_request() {
        let server = server(&github());
        let err = server
            .get_issue(params(json!({ "owner": "acme", "repo": "widgets", "issueNumber": 404 })))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_REQUEST);
    }

    #[tokio::test]
    async fn bad_link_type_is_invalid_params() {
        let github = github();
        github.add_issue(1, "a", "");
        github.add_issue(2, "b", "");
        let err = server(&github)
            .link_issues(params(json!({
                "owner": "acme", "repo": "widgets",
                "parentIssueNumber": 1, "childIssueNumber": 2, "linkType": "duplicates"
            })))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn sub_issue_fallback_looks_like_a_link() {
        let github = github();
        github.add_issue(1, "Feature: search", "");
        github.add_issue(2, "Task: index", "");
        github.set_native_sub_issues(NativeSubIssues::Rejected(
            "Unknown field 'addSubIssue'".into(),
        ));

        let result = text_json(
            server(&github)
                .add_sub_issue(params(json!({
                    "owner": "acme", "repo": "widgets",
                    "parentIssueNumber": 1, "childIssueNumber": 2
                })))
                .await
                .unwrap(),
        );
        assert_eq!(result["kind"], "tracks");
        assert!(result.get("native").is_none());
    }

    #[tokio::test]
    async fn upstream_failure_is_internal_error() {
        let github = github();
        github.add_issue(1, "a", "");
        github.add_issue(2, "b", "");
        github.set_native_sub_issues(NativeSubIssues::Failing("Bad credentials".into()));

        let err = server(&github)
            .add_sub_issue(params(json!({
                "owner": "acme", "repo": "widgets",
                "parentIssueNumber": 1, "childIssueNumber": 2
            })))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::INTERNAL_ERROR);
    }

    #[tokio::test]
    async fn project_field_value_is_validated() {
        let github = github();
        github.add_project("acme", "PVT_1", 1, "Roadmap");
        let err = server(&github)
            .update_project_item_field(params(json!({
                "projectId": "PVT_1", "itemId": "PVTI_1", "fieldId": "F_1", "value": true
            })))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    }
}
