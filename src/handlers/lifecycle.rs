//! Purpose: Allow closing and reopening issues and pull requests via comments.
//!
//! `/close` works on open issues and pull requests; `/reopen` works on
//! closed issues only. Commenters other than the original author must hold
//! write access to the repository, and a policy may additionally require an
//! issue to have a linked pull request before it can be closed.
//!
//! Matching of the command text is done in the `parser::command` module.

use crate::config::{RepoPolicy, StateLabels};
use crate::github::{GithubApi, IssueCommentEvent};
use crate::handlers::Context;
use crate::interactions::render;
use parser::command::Command;
use tracing as log;

/// Outcome of the permission check for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AuthDecision {
    pub(crate) allowed: bool,
    /// Whether the permission lookup itself succeeded. A failed lookup
    /// counts as a denial.
    pub(crate) checked: bool,
}

/// The single side effect chosen for one event.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Action {
    /// Move the item to the given state.
    UpdateState(String),
    /// Tell the commenter why nothing happened.
    PostComment(String),
    NoOp,
}

pub(super) async fn handle(
    ctx: &Context,
    policy: &RepoPolicy,
    event: &IssueCommentEvent,
    org: &str,
    repo: &str,
) -> anyhow::Result<()> {
    let action = match classify(event, &ctx.config.states) {
        Some(cmd) => {
            let auth = authorize(
                &*ctx.github,
                org,
                repo,
                &event.issue.user.login,
                &event.comment.user.login,
            )
            .await;
            decide(ctx, policy, event, org, repo, cmd, auth).await
        }
        // Not a command for the item's current state; drop silently.
        None => Action::NoOp,
    };
    execute(ctx, event, org, repo, action).await;
    Ok(())
}

/// Determines which command, if any, the comment carries for the item's
/// current state. Pure; the state guards make close and reopen mutually
/// exclusive, so checking reopen first also resolves a comment that
/// textually contains both.
pub(crate) fn classify(event: &IssueCommentEvent, states: &StateLabels) -> Option<Command> {
    if Command::Reopen.matches(&event.comment.body)
        && event.issue.state == states.closed
        && !event.issue.is_pr()
    {
        return Some(Command::Reopen);
    }
    if Command::Close.matches(&event.comment.body) && event.issue.state == states.open {
        return Some(Command::Close);
    }
    None
}

/// Whether the commenter may act on the item. The original author always
/// may; anyone else needs the platform's say-so.
pub(crate) async fn authorize(
    github: &dyn GithubApi,
    org: &str,
    repo: &str,
    author: &str,
    commenter: &str,
) -> AuthDecision {
    if commenter == author {
        return AuthDecision {
            allowed: true,
            checked: true,
        };
    }
    match github.has_permission(org, repo, commenter).await {
        Ok(allowed) => AuthDecision {
            allowed,
            checked: true,
        },
        Err(err) => {
            log::warn!("permission check for {commenter} on {org}/{repo} failed: {err:?}");
            AuthDecision {
                allowed: false,
                checked: false,
            }
        }
    }
}

/// Decides the one action to take for a classified, authorization-checked
/// event. Read-only; the chosen action is performed by [`execute`].
async fn decide(
    ctx: &Context,
    policy: &RepoPolicy,
    event: &IssueCommentEvent,
    org: &str,
    repo: &str,
    cmd: Command,
    auth: AuthDecision,
) -> Action {
    let commenter = &event.comment.user.login;
    let templates = &ctx.config.templates;

    if !auth.allowed {
        // A failed permission lookup is messaged the same as an explicit
        // denial; authorize already logged the failure.
        if auth.checked {
            log::info!(
                "{commenter} may not {cmd} {org}/{repo}#{}",
                event.issue.number
            );
        }
        let template = if event.issue.is_pr() {
            &templates.pull_no_permission
        } else {
            &templates.issue_no_permission
        };
        return Action::PostComment(render(
            template,
            &[("commenter", commenter), ("action", &cmd.to_string())],
        ));
    }

    match cmd {
        Command::Reopen => Action::UpdateState(ctx.config.states.open.clone()),
        Command::Close => {
            // The author closing their own issue is still held to the
            // link requirement.
            if !event.issue.is_pr() && policy.require_linked_pull {
                match ctx
                    .github
                    .linked_pull_count(org, repo, event.issue.number)
                    .await
                {
                    Err(err) => {
                        log::warn!(
                            "listing linked pull requests for {org}/{repo}#{} failed: {err:?}",
                            event.issue.number
                        );
                        Action::PostComment(render(
                            &templates.linked_pull_query_failed,
                            &[("commenter", commenter)],
                        ))
                    }
                    Ok(0) => Action::PostComment(render(
                        &templates.needs_linked_pull,
                        &[("commenter", commenter)],
                    )),
                    Ok(_) => Action::UpdateState(ctx.config.states.closed.clone()),
                }
            } else {
                Action::UpdateState(ctx.config.states.closed.clone())
            }
        }
    }
}

/// Performs the chosen side effect, at most one per event. Failures are
/// logged and not retried; the event counts as handled once the attempt
/// was made.
async fn execute(ctx: &Context, event: &IssueCommentEvent, org: &str, repo: &str, action: Action) {
    let number = event.issue.number;
    let res = match &action {
        Action::NoOp => return,
        Action::UpdateState(state) => {
            if event.issue.is_pr() {
                ctx.github.update_pull_state(org, repo, number, state).await
            } else {
                ctx.github.update_issue_state(org, repo, number, state).await
            }
        }
        Action::PostComment(body) => {
            if event.issue.is_pr() {
                ctx.github.create_pull_comment(org, repo, number, body).await
            } else {
                ctx.github.create_issue_comment(org, repo, number, body).await
            }
        }
    };
    match res {
        Ok(()) => log::info!("{action:?} on {org}/{repo}#{number} done"),
        Err(err) => log::error!("{action:?} on {org}/{repo}#{number} failed: {err:?}"),
    }
}
