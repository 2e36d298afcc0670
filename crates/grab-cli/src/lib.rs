//! grab - resolve the release asset for a platform
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
//!
//! Looks up a repository's release on GitHub, GitLab, Codeberg or a Forgejo
//! instance, classifies every asset by OS and architecture from its filename,
//! and reports the one that fits the requested platform.
//!
//! Results are cached in-process for an hour, keyed by the whole request, so
//! repeating a target within one invocation costs no extra API calls.

pub mod cmd;

use clap::{Args, Parser, Subcommand};
use grab_core::request::{RequestDefaults, parse_target, token_from_authorization};
use grab_core::ResolveError;
use grab_schema::Query;

#[derive(Debug, Parser)]
#[command(name = "grab")]
#[command(author, version, about = "grab - resolve the release asset for a platform")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve the best release asset for one or more repositories
    Resolve(ResolveArgs),
    /// Show how asset filenames are classified
    Classify {
        /// File names to classify
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Repositories to resolve: `[user/]program[@release]`
    #[arg(required = true)]
    pub targets: Vec<String>,

    /// Provider type: github, gitlab, codeberg or forgejo
    #[arg(long, env = "GRAB_PROVIDER", default_value = "github")]
    pub provider: String,

    /// Provider base URL (required for forgejo, optional for gitlab)
    #[arg(long, env = "GRAB_BASE_URL")]
    pub base_url: Option<String>,

    /// API token, bare or as an `Authorization: Bearer` value
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Owner to use when a target names only a program
    #[arg(long, env = "GRAB_USER")]
    pub user: Option<String>,

    /// Resolve every target under this owner
    #[arg(long, env = "GRAB_FORCE_USER")]
    pub force_user: Option<String>,

    /// Resolve every target as this repository
    #[arg(long, env = "GRAB_FORCE_REPO")]
    pub force_repo: Option<String>,

    /// Target operating system
    #[arg(long, default_value = grab_schema::DEFAULT_PLATFORM)]
    pub platform: String,

    /// Target architecture (any if omitted)
    #[arg(long)]
    pub arch: Option<String>,

    /// Only consider assets whose name contains this text
    #[arg(long)]
    pub include: Option<String>,

    /// Install the binary under this name
    #[arg(long = "as")]
    pub as_program: Option<String>,

    /// Skip TLS verification when downloading
    #[arg(long)]
    pub insecure: bool,

    /// Leave the binary in the current directory instead of moving it onto PATH
    #[arg(long)]
    pub no_move: bool,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

impl ResolveArgs {
    pub fn defaults(&self) -> RequestDefaults {
        RequestDefaults {
            user: self.user.clone().unwrap_or_default(),
            force_user: self.force_user.clone().unwrap_or_default(),
            force_repo: self.force_repo.clone().unwrap_or_default(),
        }
    }

    /// Build the query for one target.
    pub fn query_for(&self, target: &str, defaults: &RequestDefaults) -> Result<Query, ResolveError> {
        let repo = parse_target(target, defaults)?;
        let mut query = Query::new(repo.user, repo.program);
        query.release = repo.release;
        query.provider.clone_from(&self.provider);
        query.base_url = self.base_url.clone().unwrap_or_default();
        query.token = self
            .token
            .as_deref()
            .map(|t| token_from_authorization(t).unwrap_or(t).trim().to_string())
            .unwrap_or_default();
        query.platform.clone_from(&self.platform);
        query.arch = self.arch.clone().unwrap_or_default();
        query.include = self.include.clone().unwrap_or_default();
        query.as_program = self.as_program.clone().unwrap_or_default();
        query.insecure = self.insecure;
        query.move_to_path = !self.no_move;
        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> ResolveArgs {
        let mut argv = vec!["grab", "resolve"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Resolve(args) => args,
            Commands::Classify { .. } => unreachable!(),
        }
    }

    #[test]
    fn test_query_from_flags() {
        let a = args(&[
            "acme/tool@v1.0.0",
            "--provider",
            "gitlab",
            "--arch",
            "arm64",
            "--include",
            "musl",
            "--as",
            "t",
            "--no-move",
            "--token",
            "abc",
        ]);
        let q = a.query_for(&a.targets[0], &a.defaults()).unwrap();
        assert_eq!(q.user, "acme");
        assert_eq!(q.program, "tool");
        assert_eq!(q.release, "v1.0.0");
        assert_eq!(q.provider, "gitlab");
        assert_eq!(q.arch, "arm64");
        assert_eq!(q.include, "musl");
        assert_eq!(q.display_name(), "t");
        assert_eq!(q.token, "abc");
        assert!(!q.move_to_path);
    }

    #[test]
    fn test_bearer_token_value_is_unwrapped() {
        let a = args(&["acme/tool", "--token", "Bearer glpat-123"]);
        let q = a.query_for("acme/tool", &a.defaults()).unwrap();
        assert_eq!(q.token, "glpat-123");
    }

    #[test]
    fn test_default_user_applies() {
        let a = args(&["tool", "--user", "acme"]);
        let q = a.query_for("tool", &a.defaults()).unwrap();
        assert_eq!(q.user, "acme");
        assert_eq!(q.release, "latest");
        assert_eq!(q.platform, "linux");
        assert!(q.move_to_path);
    }
}
