use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context;
use serde::Deserialize;
use url::Url;

use crate::github::DEFAULT_API_URL;

/// Contents of the optional YAML configuration file. Every key can also be given on the command
/// line or through the environment, which take precedence.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Secret GitHub signs webhook deliveries with
    pub webhook_key: Option<String>,
    /// Access token for the GitHub API
    pub github_token: Option<String>,
    /// Root of the GitHub REST API, for GitHub Enterprise
    pub github_api_url: Option<Url>,
}

impl FileConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config_file =
            File::open(path).with_context(|| format!("couldn't open {}:", path.display()))?;
        serde_yaml::from_reader(BufReader::new(config_file)).context("couldn't parse config file")
    }
}

/// Values given on the command line or through the environment.
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub webhook_key: Option<String>,
    pub github_token: Option<String>,
    pub github_api_url: Option<Url>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub webhook_key: String,
    pub github_token: Option<String>,
    pub github_api_url: Url,
}

impl Config {
    /// Merges both sources, overrides first. Empty strings count as unset.
    ///
    /// Fails when no webhook key is found: unsigned deliveries must never be accepted.
    pub fn resolve(overrides: ConfigOverrides, file: FileConfig) -> anyhow::Result<Self> {
        let webhook_key = non_empty(overrides.webhook_key)
            .or_else(|| non_empty(file.webhook_key))
            .context("no webhook key provided")?;

        let github_token =
            non_empty(overrides.github_token).or_else(|| non_empty(file.github_token));

        let github_api_url = match overrides.github_api_url.or(file.github_api_url) {
            Some(url) => url,
            None => Url::parse(DEFAULT_API_URL).context("invalid default GitHub API url")?,
        };

        Ok(Self {
            webhook_key,
            github_token,
            github_api_url,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}
