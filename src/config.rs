//! Process configuration, loaded once at startup.
//!
//! The configuration file carries the per-repository policies, the state
//! labels used to recognize and set item states, and the comment templates
//! the bot replies with. The file is validated before the server starts
//! serving events; a bad file aborts startup.

use std::path::Path;

use anyhow::{Context as _, bail};
use globset::{Glob, GlobMatcher};

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    #[serde(rename = "policy", default)]
    pub(crate) policies: Vec<RepoPolicy>,
    #[serde(default)]
    pub(crate) states: StateLabels,
    pub(crate) templates: Templates,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RepoPolicy {
    /// Patterns this policy applies to, either `org` or `org/repo`.
    /// Glob syntax is allowed in both forms.
    pub(crate) repos: Vec<String>,
    /// Whether an issue must have a linked pull request before `/close`
    /// takes effect.
    #[serde(default)]
    pub(crate) require_linked_pull: bool,
    #[serde(skip)]
    filters: Vec<RepoFilter>,
}

#[derive(Debug)]
struct RepoFilter {
    /// `true` when the pattern names a repository (`org/repo`), `false`
    /// when it covers a whole organization.
    qualified: bool,
    matcher: GlobMatcher,
}

/// The state strings the platform reports and accepts for issues and pull
/// requests.
#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateLabels {
    pub(crate) open: String,
    pub(crate) closed: String,
}

impl Default for StateLabels {
    fn default() -> StateLabels {
        StateLabels {
            open: "open".to_string(),
            closed: "closed".to_string(),
        }
    }
}

/// Reply templates. `{commenter}` and `{action}` are substituted literally,
/// see [`crate::interactions::render`].
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Templates {
    pub(crate) issue_no_permission: String,
    pub(crate) pull_no_permission: String,
    pub(crate) needs_linked_pull: String,
    pub(crate) linked_pull_query_failed: String,
    pub(crate) internal_error: String,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut config: Config = toml::from_str(&contents)
            .with_context(|| format!("malformed configuration in {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Compiles the repository filters and checks the constraints the type
    /// system cannot express. Runs once, before the server starts.
    pub(crate) fn validate(&mut self) -> anyhow::Result<()> {
        if self.policies.is_empty() {
            bail!("at least one [[policy]] entry is required");
        }
        for policy in &mut self.policies {
            policy.compile()?;
        }
        if self.states.open.is_empty() || self.states.closed.is_empty() {
            bail!("state labels must not be empty");
        }
        self.templates.validate()
    }

    /// Returns the first policy whose filter matches the repository, in
    /// declaration order.
    pub(crate) fn policy_for(&self, org: &str, repo: &str) -> Option<&RepoPolicy> {
        self.policies.iter().find(|policy| policy.matches(org, repo))
    }
}

impl RepoPolicy {
    fn compile(&mut self) -> anyhow::Result<()> {
        if self.repos.is_empty() {
            bail!("a [[policy]] entry must list at least one repository");
        }
        self.filters = self
            .repos
            .iter()
            .map(|pattern| {
                let matcher = Glob::new(pattern)
                    .with_context(|| format!("invalid repository pattern `{pattern}`"))?
                    .compile_matcher();
                Ok(RepoFilter {
                    qualified: pattern.contains('/'),
                    matcher,
                })
            })
            .collect::<anyhow::Result<_>>()?;
        Ok(())
    }

    pub(crate) fn matches(&self, org: &str, repo: &str) -> bool {
        self.filters.iter().any(|filter| {
            if filter.qualified {
                filter.matcher.is_match(format!("{org}/{repo}"))
            } else {
                filter.matcher.is_match(org)
            }
        })
    }
}

impl Templates {
    fn validate(&self) -> anyhow::Result<()> {
        let templates = [
            ("issue-no-permission", &self.issue_no_permission),
            ("pull-no-permission", &self.pull_no_permission),
            ("needs-linked-pull", &self.needs_linked_pull),
            ("linked-pull-query-failed", &self.linked_pull_query_failed),
            ("internal-error", &self.internal_error),
        ];
        for (name, template) in templates {
            if template.is_empty() {
                bail!("template `{name}` must not be empty");
            }
        }
        Ok(())
    }
}
