//! Run configuration: target user, repository list, output path, credential.

use std::path::PathBuf;

use crate::error::{Result, StatsError};
use crate::github::DEFAULT_API_URL;
use crate::repository::RepositoryId;

pub const DEFAULT_USERNAME: &str = "BigChief45";
pub const DEFAULT_OUTPUT_PATH: &str = "data/open_source.json";
pub const DEFAULT_REPOSITORIES: &[&str] = &[
    "rails/rails",
    "aws/chalice",
    "aws/aws-sdk-java",
    "serverless/serverless",
    "encode/httpx",
    "ajaxorg/ace",
    "timgrossmann/InstaPy",
    "jneen/rouge",
    "gnocchixyz/gnocchi",
    "openstack-dev/pbr",
];

#[derive(Debug, Clone)]
pub struct Config {
    /// Bearer credential sent with every request.
    pub token: String,
    pub username: String,
    pub repositories: Vec<RepositoryId>,
    pub output_path: PathBuf,
    /// Repositories resolved at once; 1 is strictly sequential.
    pub concurrency: usize,
    pub api_url: String,
}

impl Config {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` for every variable. Unset or blank optional
    /// variables fall back to the built-in defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = get("GITHUB_TOKEN")
            .ok_or_else(|| StatsError::configuration("GITHUB_TOKEN environment variable not set"))?;

        let username = get("CONTRIBUTIONS_USERNAME")
            .map(|u| u.trim().to_string())
            .unwrap_or_else(|| DEFAULT_USERNAME.to_string());
        if username.contains(char::is_whitespace) {
            return Err(StatsError::configuration(format!(
                "username {username:?} contains whitespace"
            )));
        }

        let repositories = match get("CONTRIBUTIONS_REPOSITORIES") {
            Some(list) => RepositoryId::parse_all(list.split(','))?,
            None => RepositoryId::parse_all(DEFAULT_REPOSITORIES)?,
        };

        let output_path = get("CONTRIBUTIONS_OUTPUT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH));

        let concurrency = match get("CONTRIBUTIONS_CONCURRENCY") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    return Err(StatsError::configuration(format!(
                        "CONTRIBUTIONS_CONCURRENCY must be a positive integer, got {raw:?}"
                    )));
                }
            },
            None => 1,
        };

        let api_url = get("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Ok(Self {
            token,
            username,
            repositories,
            output_path,
            concurrency,
            api_url,
        })
    }
}
