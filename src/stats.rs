use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::repository::RepositoryId;

/// One ISO week of a contributor's activity on a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributorWeeklyStat {
    pub week: DateTime<Utc>,
    pub additions: u64,
    pub deletions: u64,
    pub commits: u64,
}

/// One entry of a repository's contributor-statistics collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributorStats {
    /// Account login, `None` for deleted accounts.
    pub author: Option<String>,
    pub weeks: Vec<ContributorWeeklyStat>,
}

impl ContributorStats {
    pub fn line_totals(&self) -> LineTotals {
        self.weeks.iter().fold(LineTotals::default(), |acc, w| LineTotals {
            additions: acc.additions.saturating_add(w.additions),
            deletions: acc.deletions.saturating_add(w.deletions),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryMetadata {
    pub description: Option<String>,
}

/// Lines added and removed by one user, summed over every week.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineTotals {
    pub additions: u64,
    pub deletions: u64,
}

/// One user's aggregated activity on one repository.
///
/// `lines` is `None` when the contributor-statistics collection had no entry
/// for the user; additions and deletions are then both serialized as `null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributionRecord {
    pub url: RepositoryId,
    pub description: Option<String>,
    pub commits: u64,
    pub lines: Option<LineTotals>,
}

impl ContributionRecord {
    pub fn additions(&self) -> Option<u64> {
        self.lines.map(|l| l.additions)
    }

    pub fn deletions(&self) -> Option<u64> {
        self.lines.map(|l| l.deletions)
    }

    pub fn image(&self) -> &str {
        self.url.name()
    }
}

impl Serialize for ContributionRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ContributionRecord", 6)?;
        s.serialize_field("url", &self.url)?;
        s.serialize_field("description", &self.description)?;
        s.serialize_field("commits", &self.commits)?;
        s.serialize_field("additions", &self.additions())?;
        s.serialize_field("deletions", &self.deletions())?;
        s.serialize_field("image", self.image())?;
        s.end()
    }
}
