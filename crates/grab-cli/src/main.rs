//! grab CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use grab_cli::cmd;
use grab_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve(args) => {
            if let Some(user) = args.force_user.as_deref().filter(|u| !u.is_empty()) {
                tracing::info!("locked to user: {user}");
            }
            if let Some(repo) = args.force_repo.as_deref().filter(|r| !r.is_empty()) {
                tracing::info!("locked to repo: {repo}");
            }
            cmd::resolve::resolve(&args).await
        }
        Commands::Classify { names } => cmd::classify::classify(&names),
    }
}
