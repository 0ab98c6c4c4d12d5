//! Per-repository statistics resolution.
//!
//! Commits come from a direct count query; additions and deletions come from
//! the contributor-statistics collection. The collection is empty while the
//! hosting service is still computing it, and it has no entry for a user who
//! never committed. Both cases leave the line counts absent rather than zero.

use tracing::debug;

use crate::error::Result;
use crate::github::HostingApi;
use crate::repository::RepositoryId;
use crate::stats::{ContributionRecord, ContributorStats};

pub struct StatsResolver<'a, A: ?Sized> {
    api: &'a A,
}

impl<'a, A: HostingApi + ?Sized> StatsResolver<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Build the record for `username` on `repo`. Issues exactly three
    /// remote queries.
    pub async fn resolve(&self, repo: &RepositoryId, username: &str) -> Result<ContributionRecord> {
        let metadata = self.api.repository(repo).await?;
        let contributors = self.api.contributor_stats(repo).await?;
        let commits = self.api.commit_count(repo, username).await?;

        let lines = find_user_stats(&contributors, username).map(ContributorStats::line_totals);
        debug!(%repo, commits, found = lines.is_some(), "resolved");

        Ok(ContributionRecord {
            url: repo.clone(),
            description: metadata.description,
            commits,
            lines,
        })
    }
}

/// Entry whose author login equals `username` exactly.
pub fn find_user_stats<'s>(
    contributors: &'s [ContributorStats],
    username: &str,
) -> Option<&'s ContributorStats> {
    contributors
        .iter()
        .find(|c| c.author.as_deref() == Some(username))
}
