//! The `issue_comment` webhook payload, reduced to the fields the bot acts
//! on. One event is deserialized per delivery and discarded after handling.

/// A GitHub user.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct User {
    pub login: String,
    pub id: u64,
}

#[derive(PartialEq, Eq, Debug, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueCommentAction {
    Created,
    Edited,
    Deleted,
}

/// An indicator used to differentiate between an issue and a pull request.
///
/// The `issue_comment` payload includes a `pull_request` field in the issue
/// object when the comment was left on a pull request, and omits it for
/// plain issues. GitHub does include a few fields here, but they aren't
/// needed at this time.
#[derive(Debug, Default, serde::Deserialize)]
pub struct PullRequestDetails {}

/// An issue or pull request.
///
/// For convenience, since issues and pull requests share their comment
/// stream, this struct is used for both. The `pull_request` field can be
/// used to determine which it is.
#[derive(Debug, serde::Deserialize)]
pub struct Issue {
    pub number: u64,
    /// The state reported by the platform at event time. Compared against
    /// the configured state labels; never re-queried while handling.
    pub state: String,
    /// The user that opened the issue or pull request.
    pub user: User,
    pub pull_request: Option<PullRequestDetails>,
}

impl Issue {
    pub fn is_pr(&self) -> bool {
        self.pull_request.is_some()
    }
}

/// A comment on an issue or pull request.
#[derive(Debug, serde::Deserialize)]
pub struct Comment {
    #[serde(deserialize_with = "opt_string")]
    pub body: String,
    /// The user that wrote the comment.
    pub user: User,
}

#[derive(Debug, serde::Deserialize)]
pub struct Repository {
    /// `org/repo`.
    pub full_name: String,
}

impl Repository {
    pub fn org_and_repo(&self) -> anyhow::Result<(&str, &str)> {
        self.full_name
            .split_once('/')
            .ok_or_else(|| anyhow::anyhow!("repository name `{}` is not org/repo", self.full_name))
    }
}

/// One `issue_comment` webhook delivery.
#[derive(Debug, serde::Deserialize)]
pub struct IssueCommentEvent {
    pub action: IssueCommentAction,
    pub issue: Issue,
    pub comment: Comment,
    pub repository: Repository,
}

fn opt_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    use serde::Deserialize;

    match <Option<String>>::deserialize(deserializer) {
        Ok(v) => Ok(v.unwrap_or_default()),
        Err(e) => Err(e),
    }
}
