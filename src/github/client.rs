use anyhow::Context as _;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use tracing as log;

use super::GithubApi;

/// Finds the token in the user's environment, panicking if no suitable token
/// can be found.
pub fn default_token_from_env() -> SecretString {
    std::env::var("GITHUB_TOKEN")
        .or_else(|_| std::env::var("GITHUB_API_TOKEN"))
        .expect("could not find token in GITHUB_TOKEN or GITHUB_API_TOKEN")
        .into()
}

#[derive(Clone)]
pub struct GithubClient {
    token: SecretString,
    client: Client,
    api_url: String,
    graphql_url: String,
}

impl GithubClient {
    pub fn new(token: SecretString, api_url: String, graphql_url: String) -> Self {
        GithubClient {
            client: Client::new(),
            token,
            api_url,
            graphql_url,
        }
    }

    pub fn new_from_env() -> Self {
        Self::new(
            default_token_from_env(),
            std::env::var("GITHUB_API_URL")
                .unwrap_or_else(|_| "https://api.github.com".to_string()),
            std::env::var("GITHUB_GRAPHQL_API_URL")
                .unwrap_or_else(|_| "https://api.github.com/graphql".to_string()),
        )
    }

    async fn send_req(&self, req: RequestBuilder) -> anyhow::Result<Bytes> {
        log::debug!("send_req with {:?}", req);
        let req_dbg = format!("{req:?}");
        let req = req
            .build()
            .with_context(|| format!("building reqwest {req_dbg}"))?;

        let resp = self.client.execute(req).await?;
        let maybe_err = resp.error_for_status_ref().err();
        let body = resp
            .bytes()
            .await
            .with_context(|| format!("failed to read response body {req_dbg}"))?;
        if let Some(e) = maybe_err {
            return Err(anyhow::Error::new(e))
                .with_context(|| format!("response: {}", String::from_utf8_lossy(&body)));
        }

        Ok(body)
    }

    async fn json<T>(&self, req: RequestBuilder) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let body = self.send_req(req).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    fn get(&self, url: &str) -> RequestBuilder {
        log::trace!("get {:?}", url);
        self.client.get(url).configure(self)
    }

    fn patch(&self, url: &str) -> RequestBuilder {
        log::trace!("patch {:?}", url);
        self.client.patch(url).configure(self)
    }

    fn post(&self, url: &str) -> RequestBuilder {
        log::trace!("post {:?}", url);
        self.client.post(url).configure(self)
    }

    /// Issues an ad-hoc GraphQL query.
    async fn graphql_query(
        &self,
        query: &str,
        vars: serde_json::Value,
    ) -> anyhow::Result<serde_json::Value> {
        let result: serde_json::Value = self
            .json(self.post(&self.graphql_url).json(&serde_json::json!({
                "query": query,
                "variables": vars,
            })))
            .await?;
        if let Some(errors) = result["errors"].as_array() {
            let messages: Vec<_> = errors
                .iter()
                .map(|err| err["message"].as_str().unwrap_or_default())
                .collect();
            anyhow::bail!("error: {}", messages.join("\n"));
        }
        Ok(result)
    }
}

#[async_trait]
impl GithubApi for GithubClient {
    async fn create_issue_comment(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> anyhow::Result<()> {
        #[derive(serde::Serialize)]
        struct PostComment<'a> {
            body: &'a str,
        }
        self.send_req(
            self.post(&format!(
                "{}/repos/{org}/{repo}/issues/{number}/comments",
                self.api_url
            ))
            .json(&PostComment { body }),
        )
        .await
        .context("failed to post comment")?;
        Ok(())
    }

    async fn create_pull_comment(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> anyhow::Result<()> {
        // Conversation comments on pull requests go through the issues
        // endpoint; the pulls comment endpoints are for review comments.
        self.create_issue_comment(org, repo, number, body).await
    }

    async fn has_permission(
        &self,
        org: &str,
        repo: &str,
        username: &str,
    ) -> anyhow::Result<bool> {
        #[derive(Debug, serde::Deserialize)]
        struct CollaboratorPermission {
            permission: String,
        }
        let perm: CollaboratorPermission = self
            .json(self.get(&format!(
                "{}/repos/{org}/{repo}/collaborators/{username}/permission",
                self.api_url
            )))
            .await
            .context("failed to query collaborator permission")?;
        Ok(matches!(perm.permission.as_str(), "admin" | "write"))
    }

    async fn update_issue_state(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        state: &str,
    ) -> anyhow::Result<()> {
        #[derive(serde::Serialize)]
        struct UpdateIssue<'a> {
            state: &'a str,
        }
        self.send_req(
            self.patch(&format!(
                "{}/repos/{org}/{repo}/issues/{number}",
                self.api_url
            ))
            .json(&UpdateIssue { state }),
        )
        .await
        .context("failed to update issue state")?;
        Ok(())
    }

    async fn update_pull_state(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        state: &str,
    ) -> anyhow::Result<()> {
        #[derive(serde::Serialize)]
        struct UpdatePull<'a> {
            state: &'a str,
        }
        self.send_req(
            self.patch(&format!(
                "{}/repos/{org}/{repo}/pulls/{number}",
                self.api_url
            ))
            .json(&UpdatePull { state }),
        )
        .await
        .context("failed to update pull request state")?;
        Ok(())
    }

    async fn linked_pull_count(&self, org: &str, repo: &str, number: u64) -> anyhow::Result<u64> {
        let result = self
            .graphql_query(
                "query($owner: String!, $repo: String!, $number: Int!) {
                    repository(owner: $owner, name: $repo) {
                        issue(number: $number) {
                            closedByPullRequestsReferences(includeClosedPrs: false, first: 1) {
                                totalCount
                            }
                        }
                    }
                }",
                serde_json::json!({
                    "owner": org,
                    "repo": repo,
                    "number": number,
                }),
            )
            .await
            .context("failed to list linked pull requests")?;
        result["data"]["repository"]["issue"]["closedByPullRequestsReferences"]["totalCount"]
            .as_u64()
            .ok_or_else(|| anyhow::anyhow!("linked pull request count missing from response"))
    }
}

trait RequestSend: Sized {
    fn configure(self, g: &GithubClient) -> Self;
}

impl RequestSend for RequestBuilder {
    fn configure(self, g: &GithubClient) -> RequestBuilder {
        let mut auth = reqwest::header::HeaderValue::from_maybe_shared(format!(
            "token {}",
            g.token.expose_secret()
        ))
        .unwrap();
        auth.set_sensitive(true);
        self.header(USER_AGENT, "lifecyclebot").header(AUTHORIZATION, &auth)
    }
}
