use std::fmt;

use serde::Serialize;

use crate::error::{Result, StatsError};

/// `owner/name` identifier of a remote repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RepositoryId(String);

impl RepositoryId {
    pub fn parse(raw: &str) -> Result<Self> {
        let id = raw.trim();
        if !id.contains('/') {
            return Err(StatsError::configuration(format!(
                "repository identifier {id:?} is not of the form owner/name"
            )));
        }
        if id.split('/').any(str::is_empty) {
            return Err(StatsError::configuration(format!(
                "repository identifier {id:?} has an empty path segment"
            )));
        }
        Ok(Self(id.to_string()))
    }

    /// Parse every identifier, failing on the first malformed one.
    pub fn parse_all<I, S>(raw: I) -> Result<Vec<Self>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        raw.into_iter().map(|s| Self::parse(s.as_ref())).collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment; used as the record's `image`.
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
