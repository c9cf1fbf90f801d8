pub(crate) mod client;
pub(crate) mod issue;
mod webhook;

pub use client::{GithubClient, default_token_from_env};
pub use issue::*;
pub use webhook::webhook;

use async_trait::async_trait;

/// The platform operations the bot performs.
///
/// [`GithubClient`] is the production implementation; tests substitute a
/// recording double. Queries report their value in `Ok`; an `Err` means the
/// call itself failed.
#[async_trait]
pub trait GithubApi: Send + Sync {
    /// Posts a comment on an issue.
    async fn create_issue_comment(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> anyhow::Result<()>;

    /// Posts a comment on a pull request.
    async fn create_pull_comment(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> anyhow::Result<()>;

    /// Whether `username` may manage issues and pull requests in the
    /// repository.
    async fn has_permission(
        &self,
        org: &str,
        repo: &str,
        username: &str,
    ) -> anyhow::Result<bool>;

    /// Sets the state of an issue.
    async fn update_issue_state(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        state: &str,
    ) -> anyhow::Result<()>;

    /// Sets the state of a pull request.
    async fn update_pull_state(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        state: &str,
    ) -> anyhow::Result<()>;

    /// The number of pull requests linked to an issue.
    async fn linked_pull_count(&self, org: &str, repo: &str, number: u64) -> anyhow::Result<u64>;
}
