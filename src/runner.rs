use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::info;

use crate::error::Result;
use crate::github::HostingApi;
use crate::repository::RepositoryId;
use crate::resolver::StatsResolver;
use crate::stats::ContributionRecord;

/// Drives the resolver over an ordered repository list.
pub struct Runner<'a, A: ?Sized> {
    resolver: StatsResolver<'a, A>,
    concurrency: usize,
}

impl<'a, A: HostingApi + ?Sized> Runner<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self {
            resolver: StatsResolver::new(api),
            concurrency: 1,
        }
    }

    /// Resolve up to `limit` repositories at once. Output order stays the
    /// input order.
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit.max(1);
        self
    }

    /// One record per identifier, in input order, duplicates kept. The first
    /// failure aborts the whole run.
    pub async fn run(
        &self,
        repositories: &[RepositoryId],
        username: &str,
    ) -> Result<Vec<ContributionRecord>> {
        info!(
            count = repositories.len(),
            username, "Obtaining contributions"
        );

        let records = if self.concurrency == 1 {
            let mut out = Vec::with_capacity(repositories.len());
            for repo in repositories {
                info!(%repo, "Getting contributions for repository");
                out.push(self.resolver.resolve(repo, username).await?);
            }
            out
        } else {
            stream::iter(repositories)
                .map(|repo| async move {
                    info!(%repo, "Getting contributions for repository");
                    self.resolver.resolve(repo, username).await
                })
                .buffered(self.concurrency)
                .try_collect::<Vec<_>>()
                .await?
        };

        info!(count = records.len(), "Finished obtaining contributions");
        Ok(records)
    }
}
