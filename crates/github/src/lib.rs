//! GitHub infrastructure adapter.
//!
//! Implements the [`tracker::IssueClient`] and [`tracker::ProjectBoard`]
//! traits on [`GithubClient`] using the GitHub GraphQL API.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules.
//! All GitHub API details (authentication, GraphQL documents, preview feature
//! headers, error translation) are handled here; the [`tracker`] crate never
//! sees them.
//!
//! ## Error translation
//!
//! * GraphQL errors whose type is `NOT_FOUND`, and `null` results for a
//!   requested entity, become [`tracker::TrackerError::NotFound`].
//! * A sub-issue mutation rejected because the schema lacks it becomes
//!   [`tracker::TrackerError::CapabilityAbsent`]. This is the only call that
//!   inspects error text.
//! * Everything else is [`tracker::TrackerError::Upstream`], carrying a scope
//!   hint when the message points at the token's permissions.

mod client;
mod errors;
mod issues;
mod projects;
mod queries;
mod wire;

pub use client::{GithubClient, GithubClientError, GithubConfig, DEFAULT_API_URL, SUB_ISSUES_FEATURE};
pub use errors::is_capability_absent;
