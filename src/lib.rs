pub mod config;
pub mod error;
pub mod github;
pub mod output;
pub mod repository;
pub mod resolver;
pub mod runner;
pub mod stats;

pub use config::Config;
pub use error::{Result, StatsError};
pub use github::{GithubClient, HostingApi};
pub use output::write_records;
pub use repository::RepositoryId;
pub use resolver::StatsResolver;
pub use runner::Runner;
pub use stats::{
    ContributionRecord, ContributorStats, ContributorWeeklyStat, LineTotals, RepositoryMetadata,
};
