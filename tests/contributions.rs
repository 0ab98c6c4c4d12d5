//! End-to-end runs against an in-memory hosting service.

use async_trait::async_trait;
use chrono::DateTime;
use oss_contributions::{
    ContributionRecord, ContributorStats, ContributorWeeklyStat, HostingApi, RepositoryId,
    RepositoryMetadata, Result, Runner, StatsError, StatsResolver, write_records,
};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::tempdir;

#[derive(Default)]
struct FakeRepo {
    description: Option<String>,
    contributors: Vec<ContributorStats>,
    commits: HashMap<String, u64>,
    delay_ms: u64,
}

#[derive(Default)]
struct FakeApi {
    repos: HashMap<String, FakeRepo>,
    calls: AtomicUsize,
}

impl FakeApi {
    fn with(mut self, id: &str, repo: FakeRepo) -> Self {
        self.repos.insert(id.to_string(), repo);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn lookup(&self, repo: &RepositoryId) -> Result<&FakeRepo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let found = self
            .repos
            .get(repo.as_str())
            .ok_or_else(|| StatsError::not_found(repo.as_str()))?;
        if found.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(found.delay_ms)).await;
        }
        Ok(found)
    }
}

#[async_trait]
impl HostingApi for FakeApi {
    async fn repository(&self, repo: &RepositoryId) -> Result<RepositoryMetadata> {
        let found = self.lookup(repo).await?;
        Ok(RepositoryMetadata {
            description: found.description.clone(),
        })
    }

    async fn contributor_stats(&self, repo: &RepositoryId) -> Result<Vec<ContributorStats>> {
        Ok(self.lookup(repo).await?.contributors.clone())
    }

    async fn commit_count(&self, repo: &RepositoryId, author: &str) -> Result<u64> {
        let found = self.lookup(repo).await?;
        Ok(found.commits.get(author).copied().unwrap_or(0))
    }
}

fn contributor(author: &str, weeks: &[(u64, u64)]) -> ContributorStats {
    ContributorStats {
        author: Some(author.to_string()),
        weeks: weeks
            .iter()
            .enumerate()
            .map(|(i, &(additions, deletions))| ContributorWeeklyStat {
                week: DateTime::from_timestamp(1_367_712_000 + i as i64 * 604_800, 0).unwrap(),
                additions,
                deletions,
                commits: 1,
            })
            .collect(),
    }
}

fn ids(raw: &[&str]) -> Vec<RepositoryId> {
    RepositoryId::parse_all(raw).unwrap()
}

/// `a/b` has stats for `u`; `c/d` has none.
fn scenario_api() -> FakeApi {
    FakeApi::default()
        .with(
            "a/b",
            FakeRepo {
                description: Some("first".into()),
                contributors: vec![
                    contributor("someone", &[(1_000, 1_000)]),
                    contributor("u", &[(100, 10), (20, 20)]),
                ],
                commits: HashMap::from([("u".to_string(), 5)]),
                ..Default::default()
            },
        )
        .with(
            "c/d",
            FakeRepo {
                description: None,
                contributors: vec![contributor("someone", &[(7, 7)])],
                ..Default::default()
            },
        )
}

#[tokio::test]
async fn records_reconcile_commit_counts_and_weekly_stats() {
    let api = scenario_api();
    let records = Runner::new(&api)
        .run(&ids(&["a/b", "c/d"]), "u")
        .await
        .unwrap();

    let json = serde_json::to_value(&records).unwrap();
    assert_eq!(
        json,
        serde_json::json!([
            {"url": "a/b", "description": "first", "commits": 5,
             "additions": 120, "deletions": 30, "image": "b"},
            {"url": "c/d", "description": null, "commits": 0,
             "additions": null, "deletions": null, "image": "d"}
        ])
    );
}

#[tokio::test]
async fn each_resolution_issues_three_queries() {
    let api = scenario_api();
    let resolver = StatsResolver::new(&api);
    resolver
        .resolve(&RepositoryId::parse("a/b").unwrap(), "u")
        .await
        .unwrap();
    assert_eq!(api.calls(), 3);
}

#[tokio::test]
async fn duplicates_are_kept_in_order() {
    let api = scenario_api();
    let records = Runner::new(&api)
        .run(&ids(&["c/d", "a/b", "c/d"]), "u")
        .await
        .unwrap();
    let urls: Vec<_> = records.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls, vec!["c/d", "a/b", "c/d"]);
}

#[tokio::test]
async fn empty_list_makes_no_calls() {
    let api = scenario_api();
    let records = Runner::new(&api).run(&[], "u").await.unwrap();
    assert!(records.is_empty());
    assert_eq!(api.calls(), 0);
    assert_eq!(serde_json::to_string(&records).unwrap(), "[]");
}

#[tokio::test]
async fn unknown_user_has_zero_commits_and_absent_lines() {
    let api = scenario_api();
    let records = Runner::new(&api)
        .run(&ids(&["a/b"]), "nobody")
        .await
        .unwrap();
    assert_eq!(records[0].commits, 0);
    assert_eq!(records[0].additions(), None);
    assert_eq!(records[0].deletions(), None);
}

#[tokio::test]
async fn image_is_last_segment_for_nested_identifiers() {
    let api = FakeApi::default().with("group/sub/project", FakeRepo::default());
    let records = Runner::new(&api)
        .run(&ids(&["group/sub/project"]), "u")
        .await
        .unwrap();
    assert_eq!(records[0].image(), "project");
}

#[tokio::test]
async fn repeated_runs_are_identical() {
    let api = scenario_api();
    let runner = Runner::new(&api);
    let repos = ids(&["a/b", "c/d"]);
    let first = serde_json::to_string(&runner.run(&repos, "u").await.unwrap()).unwrap();
    let second = serde_json::to_string(&runner.run(&repos, "u").await.unwrap()).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn not_found_aborts_run_and_nothing_is_written() {
    let api = scenario_api();
    let dir = tempdir().unwrap();
    let path = dir.path().join("open_source.json");

    let result = Runner::new(&api)
        .run(&ids(&["a/b", "missing/repo", "c/d"]), "u")
        .await;
    if let Ok(records) = &result {
        write_records(&path, records).unwrap();
    }

    let err = result.unwrap_err();
    assert!(
        matches!(err, StatsError::NotFound { ref repository } if repository == "missing/repo"),
        "{err}"
    );
    assert!(!path.exists());
    // a/b resolved (3 calls), then the metadata lookup for missing/repo failed.
    assert_eq!(api.calls(), 4);
}

#[tokio::test]
async fn concurrent_run_keeps_input_order() {
    let slow = |delay_ms| FakeRepo {
        delay_ms,
        ..Default::default()
    };
    let api = FakeApi::default()
        .with("o/slow", slow(40))
        .with("o/medium", slow(20))
        .with("o/fast", slow(0));

    let repos = ids(&["o/slow", "o/medium", "o/fast", "o/slow"]);
    let records: Vec<ContributionRecord> = Runner::new(&api)
        .with_concurrency(3)
        .run(&repos, "u")
        .await
        .unwrap();

    let urls: Vec<_> = records.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls, vec!["o/slow", "o/medium", "o/fast", "o/slow"]);
    assert_eq!(api.calls(), 12);
}

#[tokio::test]
async fn written_file_round_trips_records() {
    let api = scenario_api();
    let records = Runner::new(&api)
        .run(&ids(&["a/b", "c/d"]), "u")
        .await
        .unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("open_source.json");
    write_records(&path, &records).unwrap();

    let on_disk: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk, serde_json::to_value(&records).unwrap());
}
