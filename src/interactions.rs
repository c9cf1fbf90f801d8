//! Comments the bot posts back to the tracker.

use crate::github::{GithubApi, IssueCommentEvent};

/// Substitutes placeholder tokens in a configured template.
///
/// Substitution is literal find-and-replace, not a template engine; tokens
/// the template does not carry are simply not replaced.
pub(crate) fn render(template: &str, substitutions: &[(&str, &str)]) -> String {
    let mut body = template.to_string();
    for (token, value) in substitutions {
        body = body.replace(&format!("{{{token}}}"), value);
    }
    body
}

/// A best-effort comment telling the commenter the bot failed internally.
pub struct ErrorComment<'a> {
    event: &'a IssueCommentEvent,
    body: String,
}

impl<'a> ErrorComment<'a> {
    pub fn new(event: &'a IssueCommentEvent, template: &str) -> ErrorComment<'a> {
        ErrorComment {
            event,
            body: render(template, &[("commenter", &event.comment.user.login)]),
        }
    }

    pub async fn post(&self, client: &dyn GithubApi) -> anyhow::Result<()> {
        let (org, repo) = self.event.repository.org_and_repo()?;
        let number = self.event.issue.number;
        if self.event.issue.is_pr() {
            client.create_pull_comment(org, repo, number, &self.body).await
        } else {
            client.create_issue_comment(org, repo, number, &self.body).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitution_is_literal() {
        assert_eq!(
            render(
                "@{commenter} you can't {action} this issue.",
                &[("commenter", "octocat"), ("action", "close")],
            ),
            "@octocat you can't close this issue."
        );
    }

    #[test]
    fn every_occurrence_is_replaced() {
        assert_eq!(
            render("{commenter} {commenter}", &[("commenter", "octocat")]),
            "octocat octocat"
        );
    }

    #[test]
    fn unknown_tokens_are_left_alone() {
        assert_eq!(
            render("hello {somebody}", &[("commenter", "octocat")]),
            "hello {somebody}"
        );
    }
}
