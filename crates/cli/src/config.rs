//! Command-line and environment configuration.
//!
//! Every setting can come from a flag or its environment variable; flags win.
//! [`Config::try_from`] validates the raw values once at start-up so the
//! process never runs with an unusable configuration.

use clap::{Parser, ValueEnum};
use github::{GithubConfig, DEFAULT_API_URL};
use thiserror::Error;

/// Raw command line.
#[derive(Debug, Parser)]
#[command(
    name = "gh-projects-mcp",
    version,
    about = "GitHub Projects and Issues tools for MCP hosts, served over stdio"
)]
pub struct Cli {
    /// GitHub token with `repo` and `project` scopes.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: String,

    /// GraphQL endpoint. GitHub Enterprise uses `https://<host>/api/graphql`.
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Log line format written to stderr.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// OTLP/gRPC collector endpoint; traces are exported when set.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Observability settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,
    pub otlp_endpoint: Option<String>,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub github: GithubConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("a GitHub token is required (--token or GITHUB_TOKEN)")]
    MissingToken,

    #[error("API URL '{0}' must start with http:// or https://")]
    InvalidApiUrl(String),

    #[error("OTLP endpoint '{0}' must start with http:// or https://")]
    InvalidOtlpEndpoint(String),
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("https://") || value.starts_with("http://")
}

impl TryFrom<Cli> for Config {
    type Error = ConfigError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let token = cli.token.trim().to_string();
        if token.is_empty() {
            return Err(ConfigError::MissingToken);
        }

        let api_url = cli.api_url.trim().to_string();
        if !is_http_url(&api_url) {
            return Err(ConfigError::InvalidApiUrl(api_url));
        }

        let otlp_endpoint = cli
            .otlp_endpoint
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        if let Some(endpoint) = &otlp_endpoint {
            if !is_http_url(endpoint) {
                return Err(ConfigError::InvalidOtlpEndpoint(endpoint.clone()));
            }
        }

        Ok(Config {
            github: GithubConfig { token, api_url },
            observability: ObservabilityConfig {
                log_format: cli.log_format,
                otlp_endpoint,
            },
        })
    }
}
