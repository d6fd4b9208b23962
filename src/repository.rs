//! Stats Repository
//!
//! Runs the four statistics queries against the store and maps rows into
//! records. Time bounds are resolved against the injected clock at call
//! time; each operation is a single read-only round trip.

use crate::clock::{Clock, SystemClock};
use crate::query::{builder, HashtagExpression, Interval, QueryResult, DEFAULT_TOP_LIMIT};
use crate::storage::{
    HashtagUsage, IntervalStats, Metadata, StatsStore, StorageResult, TimeRange, TimeSpanStats,
};
use rusqlite::Row;
use std::sync::Arc;

/// Executes statistics queries against a [`StatsStore`]
#[derive(Clone)]
pub struct StatsRepository {
    store: StatsStore,
    clock: Arc<dyn Clock>,
}

impl StatsRepository {
    /// Create a repository reading the system clock
    pub fn new(store: StatsStore) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Create a repository with an explicit clock
    pub fn with_clock(store: StatsStore, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Aggregates for one hashtag over a time range
    ///
    /// Always yields one record; with no matching rows the counts are zero
    /// and `roads` / `latest` are null.
    pub async fn stats_for_time_span(
        &self,
        expr: &HashtagExpression,
        range: TimeRange,
    ) -> QueryResult<TimeSpanStats> {
        let resolved = range.resolve(self.clock.as_ref());
        let rendered = self.store.dialect().render(&builder::time_span(expr, &resolved));

        let hashtag = expr.normalized_tag().to_string();
        let stats = self
            .store
            .fetch_one(rendered, move |row| {
                Ok(TimeSpanStats {
                    changesets: row.get("changesets")?,
                    users: row.get("users")?,
                    roads: row.get("roads")?,
                    buildings: row.get("buildings")?,
                    edits: row.get("edits")?,
                    latest: row.get("latest")?,
                    hashtag: hashtag.clone(),
                })
            })
            .await?;

        Ok(stats)
    }

    /// Aggregates for one hashtag, one record per populated bucket
    ///
    /// The interval token is validated before anything is sent to the store.
    /// Buckets without matching rows are not returned.
    pub async fn stats_for_time_span_interval(
        &self,
        expr: &HashtagExpression,
        range: TimeRange,
        interval: &str,
    ) -> QueryResult<Vec<IntervalStats>> {
        let interval = Interval::parse(interval)?;
        let resolved = range.resolve(self.clock.as_ref());
        let rendered = self
            .store
            .dialect()
            .render(&builder::time_span_interval(expr, &resolved, interval));

        let buckets = self.store.fetch_all(rendered, map_interval_row).await?;
        Ok(buckets)
    }

    /// Hashtags with the most distinct users, at most `limit` of them
    pub async fn most_used_hashtags(
        &self,
        range: TimeRange,
        limit: Option<u32>,
    ) -> QueryResult<Vec<HashtagUsage>> {
        let resolved = range.resolve(self.clock.as_ref());
        let limit = limit.unwrap_or(DEFAULT_TOP_LIMIT);
        let rendered = self
            .store
            .dialect()
            .render(&builder::most_used_hashtags(&resolved, limit));

        let usage = self
            .store
            .fetch_all(rendered, |row| {
                Ok(HashtagUsage {
                    hashtag: row.get("hashtag")?,
                    number_of_users: row.get("number_of_users")?,
                })
            })
            .await?;

        Ok(usage)
    }

    /// Earliest and latest timestamp in the whole dataset
    pub async fn metadata(&self) -> QueryResult<Metadata> {
        let rendered = self.store.dialect().render(&builder::metadata());

        let metadata = self
            .store
            .fetch_one(rendered, |row| {
                Ok(Metadata {
                    min_timestamp: row.get("min_timestamp")?,
                    max_timestamp: row.get("max_timestamp")?,
                })
            })
            .await?;

        Ok(metadata)
    }

    /// Check the store is reachable
    pub async fn ping(&self) -> StorageResult<()> {
        self.store.ping().await
    }
}

fn map_interval_row(row: &Row<'_>) -> rusqlite::Result<IntervalStats> {
    Ok(IntervalStats {
        changesets: row.get("changesets")?,
        users: row.get("users")?,
        roads: row.get("roads")?,
        buildings: row.get("buildings")?,
        edits: row.get("edits")?,
        startdate: row.get("startdate")?,
        enddate: row.get("enddate")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::query::QueryError;
    use crate::storage::{parse_timestamp, StatsRow};
    use chrono::{NaiveDateTime, TimeZone, Utc};
    use tempfile::{tempdir, TempDir};

    fn ts(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    async fn repository_with(rows: Vec<StatsRow>) -> (StatsRepository, TempDir) {
        let dir = tempdir().unwrap();
        let store = StatsStore::open(dir.path().join("stats.db"), 2).await.unwrap();
        store.insert_rows(rows).await.unwrap();

        let clock = FixedClock(Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap());
        (StatsRepository::with_clock(store, Arc::new(clock)), dir)
    }

    fn uganda_row() -> StatsRow {
        StatsRow::new(1, 1, "#&uganda", ts("2017-12-19T00:52:03"))
            .road_length(140.0)
            .building_area(33.0)
    }

    #[tokio::test]
    async fn test_single_row_point_query() {
        let (repo, _dir) = repository_with(vec![uganda_row()]).await;

        let stats = repo
            .stats_for_time_span(&HashtagExpression::parse("&uganda"), TimeRange::all())
            .await
            .unwrap();

        assert_eq!(
            stats,
            TimeSpanStats {
                changesets: 1,
                users: 1,
                roads: Some(140.0),
                buildings: 1,
                edits: 1,
                latest: Some(ts("2017-12-19T00:52:03")),
                hashtag: "&uganda".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_point_query_without_rows() {
        let (repo, _dir) = repository_with(vec![uganda_row()]).await;

        let stats = repo
            .stats_for_time_span(&HashtagExpression::parse("missing"), TimeRange::all())
            .await
            .unwrap();

        assert_eq!(stats.changesets, 0);
        assert_eq!(stats.users, 0);
        assert_eq!(stats.roads, None);
        assert_eq!(stats.buildings, 0);
        assert_eq!(stats.edits, 0);
        assert_eq!(stats.latest, None);
        assert_eq!(stats.hashtag, "missing");

        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_bounds_are_exclusive() {
        let (repo, _dir) = repository_with(vec![uganda_row()]).await;
        let expr = HashtagExpression::parse("&uganda");

        let at = repo
            .stats_for_time_span(&expr, TimeRange::new(Some(ts("2017-12-19T00:52:03")), None))
            .await
            .unwrap();
        assert_eq!(at.edits, 0);

        let after = repo
            .stats_for_time_span(&expr, TimeRange::new(Some(ts("2018-01-01")), None))
            .await
            .unwrap();
        assert_eq!(after.edits, 0);

        let ending_at = repo
            .stats_for_time_span(&expr, TimeRange::new(None, Some(ts("2017-12-19T00:52:03"))))
            .await
            .unwrap();
        assert_eq!(ending_at.edits, 0);
    }

    #[tokio::test]
    async fn test_fractional_bounds_keep_subsecond_precision() {
        let (repo, _dir) = repository_with(vec![uganda_row()]).await;
        let expr = HashtagExpression::parse("&uganda");

        let before_end = repo
            .stats_for_time_span(&expr, TimeRange::new(None, Some(ts("2017-12-19T00:52:03.5"))))
            .await
            .unwrap();
        assert_eq!(before_end.edits, 1);

        let after_start = repo
            .stats_for_time_span(&expr, TimeRange::new(Some(ts("2017-12-19T00:52:02.9")), None))
            .await
            .unwrap();
        assert_eq!(after_start.edits, 1);

        let start_past_row = repo
            .stats_for_time_span(&expr, TimeRange::new(Some(ts("2017-12-19T00:52:03.1")), None))
            .await
            .unwrap();
        assert_eq!(start_past_row.edits, 0);
    }

    #[tokio::test]
    async fn test_clock_end_within_same_second() {
        let dir = tempdir().unwrap();
        let store = StatsStore::open(dir.path().join("stats.db"), 1).await.unwrap();
        store.insert_rows(vec![uganda_row()]).await.unwrap();

        let now = Utc.with_ymd_and_hms(2017, 12, 19, 0, 52, 3).unwrap()
            + chrono::Duration::milliseconds(700);
        let repo = StatsRepository::with_clock(store, Arc::new(FixedClock(now)));

        let stats = repo
            .stats_for_time_span(&HashtagExpression::parse("&uganda"), TimeRange::all())
            .await
            .unwrap();
        assert_eq!(stats.edits, 1);
    }

    #[tokio::test]
    async fn test_inverted_range_is_empty() {
        let (repo, _dir) = repository_with(vec![uganda_row()]).await;

        let stats = repo
            .stats_for_time_span(
                &HashtagExpression::parse("&uganda"),
                TimeRange::new(Some(ts("2019-01-01")), Some(ts("2016-01-01"))),
            )
            .await
            .unwrap();
        assert_eq!(stats.edits, 0);
    }

    #[tokio::test]
    async fn test_end_defaults_to_clock() {
        let rows = vec![
            StatsRow::new(1, 1, "#future", ts("2021-06-01")),
            StatsRow::new(2, 1, "#future", ts("2023-06-01")),
        ];
        let (repo, _dir) = repository_with(rows).await;

        let stats = repo
            .stats_for_time_span(&HashtagExpression::parse("future"), TimeRange::all())
            .await
            .unwrap();
        assert_eq!(stats.edits, 1);
    }

    #[tokio::test]
    async fn test_wildcard_matches_prefix_only() {
        let rows = vec![
            StatsRow::new(1, 1, "#hotosm-project-1", ts("2020-01-01T10:00:00")),
            StatsRow::new(2, 2, "#hotosm-project-2", ts("2020-01-02T10:00:00")),
            StatsRow::new(3, 3, "#HOTOSM-project-3", ts("2020-01-03T10:00:00")),
            StatsRow::new(4, 4, "#other-hotosm-project", ts("2020-01-04T10:00:00")),
        ];
        let (repo, _dir) = repository_with(rows).await;

        let wildcard = repo
            .stats_for_time_span(&HashtagExpression::parse("hotosm-project-*"), TimeRange::all())
            .await
            .unwrap();
        assert_eq!(wildcard.edits, 2);
        assert_eq!(wildcard.hashtag, "hotosm-project-");

        let exact = repo
            .stats_for_time_span(&HashtagExpression::parse("hotosm-project-1"), TimeRange::all())
            .await
            .unwrap();
        assert_eq!(exact.edits, 1);
    }

    #[tokio::test]
    async fn test_distinct_counts() {
        let rows = vec![
            StatsRow::new(1, 1, "#a", ts("2020-01-01T10:00:00")).road_length(1.5),
            StatsRow::new(1, 1, "#a", ts("2020-01-01T10:00:01")).building_area(10.0),
            StatsRow::new(2, 1, "#a", ts("2020-01-02T10:00:00")).road_length(2.0),
            StatsRow::new(3, 2, "#a", ts("2020-01-03T10:00:00")),
        ];
        let (repo, _dir) = repository_with(rows).await;

        let stats = repo
            .stats_for_time_span(&HashtagExpression::parse("a"), TimeRange::all())
            .await
            .unwrap();

        assert_eq!(stats.changesets, 3);
        assert_eq!(stats.users, 2);
        assert_eq!(stats.roads, Some(3.5));
        assert_eq!(stats.buildings, 1);
        assert_eq!(stats.edits, 4);
        assert_eq!(stats.latest, Some(ts("2020-01-03T10:00:00")));
    }

    #[tokio::test]
    async fn test_interval_buckets_skip_gaps() {
        let rows = vec![
            StatsRow::new(1, 1, "#a", ts("2020-01-05T10:00:00")),
            StatsRow::new(2, 2, "#a", ts("2020-01-20T10:00:00")).road_length(4.0),
            StatsRow::new(3, 1, "#a", ts("2020-03-02T10:00:00")),
        ];
        let (repo, _dir) = repository_with(rows).await;

        let buckets = repo
            .stats_for_time_span_interval(&HashtagExpression::parse("a"), TimeRange::all(), "P1M")
            .await
            .unwrap();

        assert_eq!(buckets.len(), 2);

        assert_eq!(buckets[0].startdate, ts("2020-01-01"));
        assert_eq!(buckets[0].enddate, ts("2020-02-01"));
        assert_eq!(buckets[0].changesets, 2);
        assert_eq!(buckets[0].users, 2);
        assert_eq!(buckets[0].roads, Some(4.0));

        assert_eq!(buckets[1].startdate, ts("2020-03-01"));
        assert_eq!(buckets[1].enddate, ts("2020-04-01"));
        assert_eq!(buckets[1].edits, 1);
        assert!(buckets.iter().all(|b| b.edits > 0));
    }

    #[tokio::test]
    async fn test_interval_hour_and_week_buckets() {
        let rows = vec![
            StatsRow::new(1, 1, "#a", ts("2020-01-08T10:15:00")),
            StatsRow::new(2, 1, "#a", ts("2020-01-08T17:45:00")),
        ];
        let (repo, _dir) = repository_with(rows).await;
        let expr = HashtagExpression::parse("a");

        let hours = repo
            .stats_for_time_span_interval(&expr, TimeRange::all(), "PT6H")
            .await
            .unwrap();
        assert_eq!(hours.len(), 2);
        assert_eq!(hours[0].startdate, ts("2020-01-08T06:00:00"));
        assert_eq!(hours[0].enddate, ts("2020-01-08T12:00:00"));
        assert_eq!(hours[1].startdate, ts("2020-01-08T12:00:00"));

        // 2020-01-08 is a Wednesday
        let weeks = repo
            .stats_for_time_span_interval(&expr, TimeRange::all(), "P1W")
            .await
            .unwrap();
        assert_eq!(weeks.len(), 1);
        assert_eq!(weeks[0].startdate, ts("2020-01-06"));
        assert_eq!(weeks[0].enddate, ts("2020-01-13"));
        assert_eq!(weeks[0].edits, 2);
    }

    #[tokio::test]
    async fn test_buckets_before_epoch_round_down() {
        // 1969-12-31 is a Wednesday
        let rows = vec![
            StatsRow::new(1, 1, "#old", ts("1969-12-31T12:30:00")),
            StatsRow::new(2, 1, "#old", ts("1969-12-25T08:00:00")),
        ];
        let (repo, _dir) = repository_with(rows).await;
        let expr = HashtagExpression::parse("old");
        let range = TimeRange::new(Some(ts("1960-01-01")), None);

        let days = repo
            .stats_for_time_span_interval(&expr, range, "P1D")
            .await
            .unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[1].startdate, ts("1969-12-31"));
        assert_eq!(days[1].enddate, ts("1970-01-01"));
        assert!(days.iter().all(|b| b.startdate < b.enddate));

        let hours = repo
            .stats_for_time_span_interval(&expr, range, "PT6H")
            .await
            .unwrap();
        assert_eq!(hours[1].startdate, ts("1969-12-31T12:00:00"));

        let weeks = repo
            .stats_for_time_span_interval(&expr, range, "P1W")
            .await
            .unwrap();
        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].startdate, ts("1969-12-22"));
        assert_eq!(weeks[1].startdate, ts("1969-12-29"));
        assert_eq!(weeks[1].enddate, ts("1970-01-05"));
    }

    #[tokio::test]
    async fn test_invalid_interval_fails_fast() {
        let (repo, _dir) = repository_with(vec![uganda_row()]).await;

        let err = repo
            .stats_for_time_span_interval(
                &HashtagExpression::parse("&uganda"),
                TimeRange::all(),
                "P1Y2M",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, QueryError::InvalidInterval { .. }));
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_oversized_interval_is_client_error() {
        let (repo, _dir) = repository_with(vec![uganda_row()]).await;
        let expr = HashtagExpression::parse("&uganda");

        for token in ["P10000Y", "P200000M", "PT4294967295H"] {
            let err = repo
                .stats_for_time_span_interval(&expr, TimeRange::all(), token)
                .await
                .unwrap_err();
            assert!(err.is_client_error(), "{token}: {err}");
        }

        let widest = repo
            .stats_for_time_span_interval(&expr, TimeRange::all(), "P1000Y")
            .await
            .unwrap();
        assert_eq!(widest.len(), 1);
        assert_eq!(widest[0].startdate, ts("2000-01-01"));
        assert_eq!(widest[0].enddate, ts("3000-01-01"));
    }

    #[tokio::test]
    async fn test_most_used_hashtags() {
        let rows = vec![
            StatsRow::new(1, 1, "#a", ts("2020-01-01T10:00:00")),
            StatsRow::new(2, 2, "#a", ts("2020-01-01T10:00:00")),
            StatsRow::new(3, 3, "#a", ts("2020-01-01T10:00:00")),
            StatsRow::new(4, 1, "#b", ts("2020-01-01T10:00:00")),
            StatsRow::new(5, 2, "#b", ts("2020-01-01T10:00:00")),
            StatsRow::new(6, 1, "#c", ts("2020-01-01T10:00:00")),
            StatsRow::new(7, 1, "#d", ts("2020-01-01T10:00:00")),
        ];
        let (repo, _dir) = repository_with(rows).await;

        let top = repo.most_used_hashtags(TimeRange::all(), Some(3)).await.unwrap();
        assert_eq!(
            top,
            vec![
                HashtagUsage { hashtag: "#a".to_string(), number_of_users: 3 },
                HashtagUsage { hashtag: "#b".to_string(), number_of_users: 2 },
                HashtagUsage { hashtag: "#c".to_string(), number_of_users: 1 },
            ]
        );

        let all = repo.most_used_hashtags(TimeRange::all(), None).await.unwrap();
        assert_eq!(all.len(), 4);
        assert!(all
            .windows(2)
            .all(|w| w[0].number_of_users >= w[1].number_of_users));
    }

    #[tokio::test]
    async fn test_most_used_hashtags_respects_range() {
        let rows = vec![
            StatsRow::new(1, 1, "#old", ts("2015-01-01T00:00:00")),
            StatsRow::new(2, 1, "#new", ts("2020-01-01T00:00:00")),
        ];
        let (repo, _dir) = repository_with(rows).await;

        let top = repo
            .most_used_hashtags(TimeRange::new(Some(ts("2019-01-01")), None), None)
            .await
            .unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].hashtag, "#new");
    }

    #[tokio::test]
    async fn test_metadata() {
        let rows = vec![
            StatsRow::new(1, 1, "#a", ts("2019-07-01T00:00:00")),
            StatsRow::new(2, 1, "#b", ts("2016-03-05T14:00:20")),
            StatsRow::new(3, 1, "#c", ts("2021-12-09T13:01:28")),
        ];
        let (repo, _dir) = repository_with(rows).await;

        let metadata = repo.metadata().await.unwrap();
        assert_eq!(metadata.min_timestamp, Some(ts("2016-03-05T14:00:20")));
        assert_eq!(metadata.max_timestamp, Some(ts("2021-12-09T13:01:28")));
    }

    #[tokio::test]
    async fn test_metadata_on_empty_dataset() {
        let (repo, _dir) = repository_with(Vec::new()).await;

        let metadata = repo.metadata().await.unwrap();
        assert_eq!(metadata.min_timestamp, None);
        assert_eq!(metadata.max_timestamp, None);
        repo.ping().await.unwrap();
    }
}
