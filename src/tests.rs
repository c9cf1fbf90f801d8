//! Support for tests: event fixtures and a recording double for the
//! platform API.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bon::builder;

use crate::config::Config;
use crate::github::{
    Comment, GithubApi, Issue, IssueCommentAction, IssueCommentEvent, PullRequestDetails,
    Repository, User,
};

/// The configuration the fixtures are built against: `octo-org` closes
/// freely, `link-org` requires a linked pull request.
pub(crate) fn config() -> Config {
    let config = r#"
        [[policy]]
        repos = ["octo-org"]

        [[policy]]
        repos = ["link-org/*"]
        require-linked-pull = true

        [templates]
        issue-no-permission = "@{commenter} you can't {action} this issue, it needs write access."
        pull-no-permission = "@{commenter} you can't {action} this pull request, it needs write access."
        needs-linked-pull = "@{commenter} this issue has no linked pull request and stays open."
        linked-pull-query-failed = "@{commenter} listing linked pull requests failed, please retry later."
        internal-error = "@{commenter} something went wrong, sorry about that."
    "#;
    let mut config = toml::from_str::<Config>(config).unwrap();
    config.validate().unwrap();
    config
}

pub(crate) fn user(login: &str, id: u64) -> User {
    User {
        login: login.to_string(),
        id,
    }
}

#[builder]
pub(crate) fn issue_comment(
    body: Option<&str>,
    state: Option<&str>,
    number: Option<u64>,
    pr: Option<bool>,
    author: Option<&str>,
    commenter: Option<&str>,
    repo: Option<&str>,
    action: Option<IssueCommentAction>,
) -> IssueCommentEvent {
    let pull_request = if pr.unwrap_or(false) {
        Some(PullRequestDetails::default())
    } else {
        None
    };

    IssueCommentEvent {
        action: action.unwrap_or(IssueCommentAction::Created),
        issue: Issue {
            number: number.unwrap_or(1),
            state: state.unwrap_or("open").to_string(),
            user: user(author.unwrap_or("opener"), 1),
            pull_request,
        },
        comment: Comment {
            body: body.unwrap_or("").to_string(),
            user: user(commenter.unwrap_or("committer"), 2),
        },
        repository: Repository {
            full_name: repo.unwrap_or("octo-org/octo-repo").to_string(),
        },
    }
}

/// What the double answers to a permission check.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Permission {
    Allow,
    Deny,
    /// The query itself errors.
    Fail,
    /// The check must not run at all; panics the test if it does.
    Unreachable,
}

/// One outbound call, as observed by [`RecordingApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ApiCall {
    IssueComment {
        repo: String,
        number: u64,
        body: String,
    },
    PullComment {
        repo: String,
        number: u64,
        body: String,
    },
    Permission {
        repo: String,
        username: String,
    },
    UpdateIssue {
        repo: String,
        number: u64,
        state: String,
    },
    UpdatePull {
        repo: String,
        number: u64,
        state: String,
    },
    LinkedPulls {
        repo: String,
        number: u64,
    },
}

/// A `GithubApi` double that records every outbound call in order.
#[derive(Clone)]
pub(crate) struct RecordingApi {
    permission: Permission,
    /// `None` makes the linked pull request query fail.
    linked_pulls: Option<u64>,
    calls: Arc<Mutex<Vec<ApiCall>>>,
}

impl RecordingApi {
    pub(crate) fn new() -> RecordingApi {
        RecordingApi {
            permission: Permission::Allow,
            linked_pulls: Some(0),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn permission(mut self, permission: Permission) -> RecordingApi {
        self.permission = permission;
        self
    }

    pub(crate) fn linked_pulls(mut self, linked_pulls: Option<u64>) -> RecordingApi {
        self.linked_pulls = linked_pulls;
        self
    }

    pub(crate) fn recorded(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: ApiCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl GithubApi for RecordingApi {
    async fn create_issue_comment(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> anyhow::Result<()> {
        self.record(ApiCall::IssueComment {
            repo: format!("{org}/{repo}"),
            number,
            body: body.to_string(),
        });
        Ok(())
    }

    async fn create_pull_comment(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        body: &str,
    ) -> anyhow::Result<()> {
        self.record(ApiCall::PullComment {
            repo: format!("{org}/{repo}"),
            number,
            body: body.to_string(),
        });
        Ok(())
    }

    async fn has_permission(
        &self,
        org: &str,
        repo: &str,
        username: &str,
    ) -> anyhow::Result<bool> {
        self.record(ApiCall::Permission {
            repo: format!("{org}/{repo}"),
            username: username.to_string(),
        });
        match self.permission {
            Permission::Allow => Ok(true),
            Permission::Deny => Ok(false),
            Permission::Fail => Err(anyhow::anyhow!("permission query failed")),
            Permission::Unreachable => {
                panic!("the permission check must not run for this event")
            }
        }
    }

    async fn update_issue_state(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        state: &str,
    ) -> anyhow::Result<()> {
        self.record(ApiCall::UpdateIssue {
            repo: format!("{org}/{repo}"),
            number,
            state: state.to_string(),
        });
        Ok(())
    }

    async fn update_pull_state(
        &self,
        org: &str,
        repo: &str,
        number: u64,
        state: &str,
    ) -> anyhow::Result<()> {
        self.record(ApiCall::UpdatePull {
            repo: format!("{org}/{repo}"),
            number,
            state: state.to_string(),
        });
        Ok(())
    }

    async fn linked_pull_count(&self, org: &str, repo: &str, number: u64) -> anyhow::Result<u64> {
        self.record(ApiCall::LinkedPulls {
            repo: format!("{org}/{repo}"),
            number,
        });
        self.linked_pulls
            .ok_or_else(|| anyhow::anyhow!("linked pull request query failed"))
    }
}
