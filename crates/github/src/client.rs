//! GraphQL transport.
//!
//! One [`GithubClient`] value is built by the binary and shared (behind an
//! `Arc`) by every service. It holds the authenticated `reqwest` client and
//! nothing else; no request state survives between calls.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use tracker::TrackerError;

use crate::errors::{from_graphql, GraphqlError};

/// Public GitHub GraphQL endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com/graphql";

/// Preview feature flag that enables the sub-issue mutations.
pub const SUB_ISSUES_FEATURE: &str = "sub_issues";

const USER_AGENT: &str = concat!("gh-projects-mcp/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`GithubClient`].
#[derive(Clone)]
pub struct GithubConfig {
    /// Personal access token or app installation token.
    pub token: String,
    /// GraphQL endpoint; GitHub Enterprise uses `https://<host>/api/graphql`.
    pub api_url: String,
}

impl std::fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubConfig")
            .field("token", &"<redacted>")
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Errors raised while constructing a [`GithubClient`].
#[derive(Debug, Error)]
pub enum GithubClientError {
    /// The token cannot be carried in an HTTP header.
    #[error("GitHub token contains characters not allowed in an HTTP header")]
    InvalidToken,

    /// The underlying HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

// Body of non-2xx responses, e.g. `{"message": "Bad credentials"}`.
#[derive(Deserialize)]
struct RestError {
    message: String,
}

/// Authenticated GitHub GraphQL client.
#[derive(Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_url: String,
}

impl GithubClient {
    /// Builds a client that sends `Authorization: Bearer <token>` on every
    /// request.
    pub fn new(config: &GithubConfig) -> Result<Self, GithubClientError> {
        use reqwest::header::{self, HeaderMap, HeaderValue};

        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token.trim()))
            .map_err(|_| GithubClientError::InvalidToken)?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Runs a GraphQL document and decodes its `data`.
    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        query: &str,
        variables: Value,
    ) -> Result<T, TrackerError> {
        self.execute_with_features(operation, query, variables, &[])
            .await
    }

    /// Like [`execute`](Self::execute), opting into GraphQL preview features.
    pub(crate) async fn execute_with_features<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        query: &str,
        variables: Value,
        features: &[&str],
    ) -> Result<T, TrackerError> {
        let mut request = self
            .http
            .post(&self.api_url)
            .json(&GraphqlRequest { query, variables });
        if !features.is_empty() {
            request = request.header("GraphQL-Features", features.join(","));
        }

        debug!(operation, "sending GraphQL request");
        let response = request
            .send()
            .await
            .map_err(|e| TrackerError::upstream(format!("{operation}: {e}")))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TrackerError::upstream(format!("{operation}: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<RestError>(&text)
                .map(|e| e.message)
                .unwrap_or(text);
            return Err(TrackerError::upstream(format!(
                "{operation} failed with HTTP {status}: {message}"
            )));
        }

        let body: GraphqlResponse<T> = serde_json::from_str(&text).map_err(|e| {
            TrackerError::upstream(format!("{operation}: unexpected response shape: {e}"))
        })?;
        if !body.errors.is_empty() {
            return Err(from_graphql(operation, &body.errors));
        }
        body.data
            .ok_or_else(|| TrackerError::upstream(format!("{operation}: response has no data")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> GithubClient {
        GithubClient::new(&GithubConfig {
            token: "t0k3n".into(),
            api_url: server.url("/graphql"),
        })
        .unwrap()
    }

    #[derive(Debug, Deserialize)]
    struct Viewer {
        viewer: Login,
    }

    #[derive(Debug, Deserialize)]
    struct Login {
        login: String,
    }

    #[tokio::test]
    async fn sends_bearer_token_and_decodes_data() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/graphql")
                    .header("authorization", "Bearer t0k3n")
                    .body_contains("viewer");
                then.status(200)
                    .json_body(json!({ "data": { "viewer": { "login": "octocat" } } }));
            })
            .await;

        let viewer: Viewer = client(&server)
            .execute("Viewer", "query { viewer { login } }", json!({}))
            .await
            .unwrap();
        assert_eq!(viewer.viewer.login, "octocat");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn http_unauthorized_is_upstream_with_scope_hint() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql");
                then.status(401).json_body(json!({
                    "message": "Bad credentials",
                    "documentation_url": "https://docs.github.com/graphql"
                }));
            })
            .await;

        let err = client(&server)
            .execute::<Viewer>("Viewer", "query { viewer { login } }", json!({}))
            .await
            .unwrap_err();
        match err {
            TrackerError::Upstream { message, hint } => {
                assert!(message.contains("Bad credentials"), "{message}");
                assert!(hint.is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn not_found_errors_map_to_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/graphql");
                then.status(200).json_body(json!({
                    "data": { "viewer": null },
                    "errors": [{
                        "type": "NOT_FOUND",
                        "message": "Could not resolve to a Repository with the name 'acme/nope'."
                    }]
                }));
            })
            .await;

        let err = client(&server)
            .execute::<Value>("Viewer", "query { viewer { login } }", json!({}))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TrackerError::not_found("Could not resolve to a Repository with the name 'acme/nope'.")
        );
    }

    #[tokio::test]
    async fn preview_features_are_sent_as_header() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/graphql")
                    .header("graphql-features", "sub_issues");
                then.status(200).json_body(json!({ "data": {} }));
            })
            .await;

        client(&server)
            .execute_with_features::<Value>("Probe", "query { __typename }", json!({}), &[
                SUB_ISSUES_FEATURE,
            ])
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[test]
    fn config_debug_redacts_token() {
        let config = GithubConfig {
            token: "secret".into(),
            api_url: DEFAULT_API_URL.into(),
        };
        assert!(!format!("{config:?}").contains("secret"));
    }
}
