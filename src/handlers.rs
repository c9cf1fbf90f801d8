use crate::config::Config;
use crate::github::{GithubApi, IssueCommentAction, IssueCommentEvent};
use tracing as log;

mod lifecycle;

pub struct Context {
    pub github: Box<dyn GithubApi>,
    pub config: Config,
}

/// Routes one comment event through the close/reopen pipeline.
///
/// Events without a matching policy are dropped; so are comment edits and
/// deletions. Neither is an error.
pub async fn handle(ctx: &Context, event: &IssueCommentEvent) -> anyhow::Result<()> {
    if event.action != IssueCommentAction::Created {
        // Commands only fire from newly created comments; edits and
        // deletions must not retrigger them.
        log::debug!("skipping event, comment was {:?}", event.action);
        return Ok(());
    }

    let (org, repo) = event.repository.org_and_repo()?;
    let Some(policy) = ctx.config.policy_for(org, repo) else {
        log::info!(
            "no policy matches {}, dropping event",
            event.repository.full_name
        );
        return Ok(());
    };

    lifecycle::handle(ctx, policy, event, org, repo).await
}
