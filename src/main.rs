use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc::unbounded_channel;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use url::Url;

mod bot;
use bot::{commands::CommandRegistry, CommandBot};

mod config;
use config::{Config, ConfigOverrides, FileConfig};

mod github;
use github::{GitHubApi, GitHubClient};

mod webhooks;

#[cfg(test)]
mod test_utils;

/// Runs the slash commands posted in GitHub issue and pull request comments
#[derive(Parser)]
#[command(version)]
struct Opts {
    /// Configuration file for github-command
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Webhook key GitHub will use when sending requests
    #[arg(long, env = "WEBHOOK_KEY", hide_env_values = true)]
    webhook_key: Option<String>,

    /// Access token used to call the GitHub API
    #[arg(long, env = "GH_ACCESS_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Root of the GitHub REST API
    #[arg(long, env = "GITHUB_API_URL")]
    github_api_url: Option<Url>,

    /// Address to listen on
    #[arg(long, env = "ADDRESS", default_value = "0.0.0.0")]
    address: IpAddr,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,
}

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let opts = Opts::parse();
    let file = match &opts.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let overrides = ConfigOverrides {
        webhook_key: opts.webhook_key,
        github_token: opts.github_token,
        github_api_url: opts.github_api_url,
    };
    let config = Config::resolve(overrides, file)?;

    if config.github_token.is_none() {
        warn!("no GitHub access token provided, API calls will be unauthenticated");
    }

    let github: Arc<dyn GitHubApi> = Arc::new(
        GitHubClient::new(&config.github_api_url, config.github_token.clone())
            .context("failed to create GitHub client")?,
    );
    let registry =
        CommandRegistry::standard(github.clone()).context("failed to register commands")?;
    let bot = Arc::new(CommandBot::new(github, registry));

    let (sender, receiver) = unbounded_channel();
    tokio::spawn(bot.run(receiver));

    let figment = rocket::Config::figment()
        .merge(("address", opts.address))
        .merge(("port", opts.port));
    let rocket = webhooks::mount(rocket::custom(figment), config.webhook_key, sender);
    rocket
        .launch()
        .await
        .map(|_| ())
        .map_err(|err| anyhow::anyhow!("rocket failed: {}", err))
}
