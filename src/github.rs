use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, LINK, RETRY_AFTER, USER_AGENT};
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{Result, StatsError};
use crate::repository::RepositoryId;
use crate::stats::{ContributorStats, ContributorWeeklyStat, RepositoryMetadata};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const AGENT: &str = "oss-contributions";
const DEFAULT_MAX_ATTEMPTS: usize = 4;

/// The three hosting-service queries a resolution needs.
#[async_trait]
pub trait HostingApi: Send + Sync {
    async fn repository(&self, repo: &RepositoryId) -> Result<RepositoryMetadata>;

    /// Contributor-statistics collection. Empty while the service is still
    /// computing it.
    async fn contributor_stats(&self, repo: &RepositoryId) -> Result<Vec<ContributorStats>>;

    /// Number of commits on the default branch authored by `author`.
    async fn commit_count(&self, repo: &RepositoryId, author: &str) -> Result<u64>;
}

#[derive(Deserialize)]
struct RepoResponse {
    description: Option<String>,
}

#[derive(Deserialize)]
struct ContributorResponse {
    author: Option<AuthorResponse>,
    #[serde(default)]
    weeks: Vec<WeekResponse>,
}

#[derive(Deserialize)]
struct AuthorResponse {
    login: String,
}

#[derive(Deserialize)]
struct WeekResponse {
    #[serde(with = "chrono::serde::ts_seconds")]
    w: DateTime<Utc>,
    #[serde(default)]
    a: u64,
    #[serde(default)]
    d: u64,
    #[serde(default)]
    c: u64,
}

impl From<ContributorResponse> for ContributorStats {
    fn from(raw: ContributorResponse) -> Self {
        Self {
            author: raw.author.map(|a| a.login),
            weeks: raw
                .weeks
                .into_iter()
                .map(|w| ContributorWeeklyStat {
                    week: w.w,
                    additions: w.a,
                    deletions: w.d,
                    commits: w.c,
                })
                .collect(),
        }
    }
}

/// GitHub REST client. Cheap to clone; one instance is built at startup and
/// shared by every resolution.
#[derive(Clone)]
pub struct GithubClient {
    token: Arc<String>,
    http: Arc<Client>,
    api_url: Arc<String>,
    max_attempts: usize,
}

impl GithubClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Arc::new(token.into()),
            http: Arc::new(Client::new()),
            api_url: Arc::new(DEFAULT_API_URL.to_string()),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Arc::new(api_url.into().trim_end_matches('/').to_string());
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// GET `/repos/{repo}{path}` with retry on rate limiting and server errors.
    ///
    /// 404, 401 and non rate-limit 403 are mapped to errors here; any other
    /// non-retryable response is handed back for the caller to inspect.
    async fn get(
        &self,
        operation: &str,
        repo: &RepositoryId,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Response> {
        let url = format!("{}/repos/{}{}", self.api_url, repo, path);
        let mut attempt = 0usize;

        loop {
            attempt += 1;
            debug!(%url, attempt, "GET");

            let resp = self
                .http
                .get(&url)
                .query(query)
                .bearer_auth(&*self.token)
                .header(USER_AGENT, AGENT)
                .header(ACCEPT, "application/vnd.github+json")
                .send()
                .await
                .map_err(|e| StatsError::unavailable(operation, format!("network error: {e}")))?;

            let status = resp.status();
            let headers = resp.headers();
            let retry_after = headers
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            let quota_exhausted = headers
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.trim() == "0");

            match status {
                StatusCode::NOT_FOUND => return Err(StatsError::not_found(repo.as_str())),
                StatusCode::UNAUTHORIZED => {
                    return Err(StatsError::configuration(format!(
                        "{operation}: credential rejected by {}",
                        self.api_url
                    )));
                }
                StatusCode::TOO_MANY_REQUESTS | StatusCode::FORBIDDEN
                    if status == StatusCode::TOO_MANY_REQUESTS
                        || quota_exhausted
                        || retry_after.is_some() =>
                {
                    // A 403 for an exhausted hourly quota has no Retry-After
                    // and fails the run.
                    let wait = match retry_after {
                        Some(secs) => Some(secs),
                        None if status == StatusCode::TOO_MANY_REQUESTS => Some(2),
                        None => None,
                    };
                    match wait {
                        Some(secs) if attempt < self.max_attempts => {
                            warn!(%repo, secs, "rate limited, waiting");
                            sleep(Duration::from_secs(secs)).await;
                            continue;
                        }
                        _ => {
                            return Err(StatsError::unavailable(
                                operation,
                                format!("rate limited (HTTP {})", status.as_u16()),
                            ));
                        }
                    }
                }
                StatusCode::FORBIDDEN => return Err(StatsError::not_found(repo.as_str())),
                s if s.is_server_error() => {
                    if attempt < self.max_attempts {
                        sleep(backoff(attempt)).await;
                        continue;
                    }
                    return Err(StatsError::unavailable(
                        operation,
                        format!("HTTP {} and retries exhausted", s.as_u16()),
                    ));
                }
                _ => return Ok(resp),
            }
        }
    }
}

/// Exponential delay before retrying a server error, doubling from 250ms.
fn backoff(attempt: usize) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16) as u32;
    Duration::from_millis(250u64.saturating_mul(1u64 << exponent))
}

fn expect_success(operation: &str, resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(StatsError::unexpected(
            operation,
            format!("HTTP {}", status.as_u16()),
        ))
    }
}

async fn decode<T: serde::de::DeserializeOwned>(operation: &str, resp: Response) -> Result<T> {
    resp.json()
        .await
        .map_err(|e| StatsError::unexpected(operation, format!("failed to parse JSON: {e}")))
}

/// Page number of the `rel="last"` entry of a GitHub `Link` header.
fn last_page(link: &str) -> Option<u64> {
    let part = link.split(',').find(|p| p.contains(r#"rel="last""#))?;
    let start = part.find('<')? + 1;
    let end = part.find('>')?;
    let url = Url::parse(part.get(start..end)?).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "page")
        .and_then(|(_, v)| v.parse().ok())
}

#[async_trait]
impl HostingApi for GithubClient {
    async fn repository(&self, repo: &RepositoryId) -> Result<RepositoryMetadata> {
        let operation = format!("repository metadata for {repo}");
        let resp = self.get(&operation, repo, "", &[]).await?;
        let parsed: RepoResponse = decode(&operation, expect_success(&operation, resp)?).await?;

        Ok(RepositoryMetadata {
            description: parsed.description,
        })
    }

    async fn contributor_stats(&self, repo: &RepositoryId) -> Result<Vec<ContributorStats>> {
        let operation = format!("contributor statistics for {repo}");
        let resp = self.get(&operation, repo, "/stats/contributors", &[]).await?;

        match resp.status() {
            StatusCode::ACCEPTED => {
                warn!(%repo, "contributor statistics are still being computed");
                Ok(Vec::new())
            }
            StatusCode::NO_CONTENT => Ok(Vec::new()),
            _ => {
                let parsed: Vec<ContributorResponse> =
                    decode(&operation, expect_success(&operation, resp)?).await?;
                Ok(parsed.into_iter().map(ContributorStats::from).collect())
            }
        }
    }

    async fn commit_count(&self, repo: &RepositoryId, author: &str) -> Result<u64> {
        let operation = format!("commit count for {repo}");
        let resp = self
            .get(
                &operation,
                repo,
                "/commits",
                &[("author", author), ("per_page", "1")],
            )
            .await?;

        // Listing commits of an empty repository answers 409.
        if resp.status() == StatusCode::CONFLICT {
            return Ok(0);
        }
        let resp = expect_success(&operation, resp)?;

        if let Some(count) = resp
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(last_page)
        {
            return Ok(count);
        }

        let commits: Vec<serde_json::Value> = decode(&operation, resp).await?;
        Ok(commits.len() as u64)
    }
}
