//! Query shapes
//!
//! The four queries the repository runs, built from a hashtag expression,
//! a resolved time range and, for bucketed queries, a validated interval.
//!
//! Time bounds are strictly exclusive on both ends: a row stamped exactly
//! at `start` or `end` is not counted.

use crate::query::ast::{Column, Grouping, Predicate, SortOrder, StatsQuery};
use crate::query::hashtag::HashtagExpression;
use crate::query::interval::Interval;
use crate::storage::ResolvedRange;

/// Aggregate columns shared by point and interval queries
const AGGREGATES: [Column; 5] = [
    Column::Changesets,
    Column::Users,
    Column::Roads,
    Column::Buildings,
    Column::Edits,
];

/// Default number of hashtags returned by the top-N query
pub const DEFAULT_TOP_LIMIT: u32 = 10;

/// Aggregates for one hashtag over one time range
pub fn time_span(expr: &HashtagExpression, range: &ResolvedRange) -> StatsQuery {
    let mut columns = AGGREGATES.to_vec();
    columns.push(Column::Latest);

    StatsQuery::select(&columns)
        .filter(expr.predicate())
        .filter(Predicate::After(range.start))
        .filter(Predicate::Before(range.end))
}

/// Aggregates for one hashtag, one row per populated bucket
pub fn time_span_interval(
    expr: &HashtagExpression,
    range: &ResolvedRange,
    interval: Interval,
) -> StatsQuery {
    let mut columns = AGGREGATES.to_vec();
    columns.push(Column::BucketStart(interval));
    columns.push(Column::BucketEnd(interval));

    StatsQuery::select(&columns)
        .filter(expr.predicate())
        .filter(Predicate::After(range.start))
        .filter(Predicate::Before(range.end))
        .group_by(Grouping::Bucket(interval))
        .order_by(Column::BucketStart(interval), SortOrder::Ascending)
}

/// Hashtags with the most distinct users in the range
///
/// Ties on the user count are broken by hashtag so the result is stable.
pub fn most_used_hashtags(range: &ResolvedRange, limit: u32) -> StatsQuery {
    StatsQuery::select(&[Column::Hashtag, Column::NumberOfUsers])
        .filter(Predicate::After(range.start))
        .filter(Predicate::Before(range.end))
        .group_by(Grouping::Hashtag)
        .order_by(Column::NumberOfUsers, SortOrder::Descending)
        .order_by(Column::Hashtag, SortOrder::Ascending)
        .limit(limit)
}

/// Dataset-wide timestamp bounds
pub fn metadata() -> StatsQuery {
    StatsQuery::select(&[Column::MinTimestamp, Column::MaxTimestamp])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::interval::IntervalUnit;
    use chrono::NaiveDate;

    fn range() -> ResolvedRange {
        ResolvedRange {
            start: NaiveDate::from_ymd_opt(2020, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            end: NaiveDate::from_ymd_opt(2021, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_time_span_shape() {
        let query = time_span(&HashtagExpression::parse("hot"), &range());

        assert_eq!(
            query.column_names(),
            vec!["changesets", "users", "roads", "buildings", "edits", "latest"]
        );
        assert_eq!(
            query.filters,
            vec![
                Predicate::HashtagEquals("#hot".to_string()),
                Predicate::After(range().start),
                Predicate::Before(range().end),
            ]
        );
        assert!(query.grouping.is_none());
        assert!(query.limit.is_none());
    }

    #[test]
    fn test_wildcard_uses_prefix_predicate() {
        let query = time_span(&HashtagExpression::parse("hot*"), &range());
        assert_eq!(query.filters[0], Predicate::HashtagPrefix("#hot".to_string()));
    }

    #[test]
    fn test_interval_shape() {
        let interval = Interval::new(1, IntervalUnit::Month);
        let query = time_span_interval(&HashtagExpression::parse("hot"), &range(), interval);

        assert_eq!(
            query.column_names(),
            vec!["changesets", "users", "roads", "buildings", "edits", "startdate", "enddate"]
        );
        assert_eq!(query.grouping, Some(Grouping::Bucket(interval)));
        assert_eq!(query.ordering[0].column, Column::BucketStart(interval));
    }

    #[test]
    fn test_most_used_shape() {
        let query = most_used_hashtags(&range(), 3);

        assert_eq!(query.column_names(), vec!["hashtag", "number_of_users"]);
        assert_eq!(query.filters.len(), 2);
        assert_eq!(query.grouping, Some(Grouping::Hashtag));
        assert_eq!(query.ordering.len(), 2);
        assert_eq!(query.ordering[1].column, Column::Hashtag);
        assert_eq!(query.limit, Some(3));
    }

    #[test]
    fn test_metadata_is_unfiltered() {
        let query = metadata();
        assert_eq!(query.column_names(), vec!["min_timestamp", "max_timestamp"]);
        assert!(query.filters.is_empty());
    }
}
