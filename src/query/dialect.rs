//! SQL dialects
//!
//! Renders a [`StatsQuery`] into engine SQL plus the ordered list of bound
//! values. Placeholders are numbered as they are emitted, so the parameter
//! list always lines up with the placeholders in the text.
//!
//! Only the engine-specific pieces (placeholders, timestamp parsing, prefix
//! matching and interval bucketing) vary between dialects; aggregates and
//! clause layout are shared.
//!
//! Intervals are rendered inline. They reach the renderer as a validated
//! magnitude and unit, never as caller text.

use crate::query::ast::{
    Column, Grouping, Predicate, SortOrder, SqlParam, StatsQuery, HASHTAG_COLUMN, STATS_TABLE,
    TIMESTAMP_COLUMN,
};
use crate::query::interval::{Interval, IntervalUnit};
use crate::storage::TIMESTAMP_FORMAT;

/// Rendered SQL with its bound values in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedQuery {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl std::fmt::Display for RenderedQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.sql)?;
        for (i, param) in self.params.iter().enumerate() {
            match param {
                SqlParam::Text(s) => writeln!(f, "-- ${} = '{}'", i + 1, s)?,
                SqlParam::Integer(n) => writeln!(f, "-- ${} = {}", i + 1, n)?,
                SqlParam::Timestamp(ts) => {
                    writeln!(f, "-- ${} = '{}'", i + 1, ts.format(TIMESTAMP_FORMAT))?
                }
            }
        }
        Ok(())
    }
}

/// Engine-specific rendering hooks
pub trait Dialect: Send + Sync {
    /// Dialect name, as accepted by [`dialect_for`]
    fn name(&self) -> &'static str;

    /// Placeholder for the bound value at 1-based `position`
    fn placeholder(&self, position: usize) -> String;

    /// Expression turning a bound timestamp string into an engine timestamp
    fn timestamp_value(&self, placeholder: &str) -> String;

    /// Predicate: `column` starts with the bound value
    fn prefix_match(&self, column: &str, placeholder: &str) -> String;

    /// Start of the interval bucket containing the row timestamp
    fn bucket_start(&self, interval: &Interval) -> String;

    /// Bucket start plus one interval width
    fn bucket_end(&self, interval: &Interval) -> String;

    /// Render a query
    fn render(&self, query: &StatsQuery) -> RenderedQuery {
        render_query(self, query)
    }
}

/// Look up a built-in dialect by name
pub fn dialect_for(name: &str) -> Option<&'static dyn Dialect> {
    static SQLITE: SqliteDialect = SqliteDialect;
    static CLICKHOUSE: ClickHouseDialect = ClickHouseDialect;

    match name.to_lowercase().as_str() {
        "sqlite" => Some(&SQLITE),
        "clickhouse" => Some(&CLICKHOUSE),
        _ => None,
    }
}

/// Collects bound values while rendering
struct Binder<'a, D: Dialect + ?Sized> {
    dialect: &'a D,
    params: Vec<SqlParam>,
}

impl<'a, D: Dialect + ?Sized> Binder<'a, D> {
    fn bind(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        self.dialect.placeholder(self.params.len())
    }
}

fn render_query<D: Dialect + ?Sized>(dialect: &D, query: &StatsQuery) -> RenderedQuery {
    let mut binder = Binder {
        dialect,
        params: Vec::new(),
    };

    let projection = query
        .projection
        .iter()
        .map(|column| format!("{} AS {}", column_expr(dialect, column), column.alias()))
        .collect::<Vec<_>>()
        .join(",\n       ");

    let mut sql = format!("SELECT {}\nFROM {}", projection, STATS_TABLE);

    if !query.filters.is_empty() {
        let conditions = query
            .filters
            .iter()
            .map(|predicate| predicate_expr(&mut binder, predicate))
            .collect::<Vec<_>>();
        sql.push_str("\nWHERE ");
        sql.push_str(&conditions.join("\n  AND "));
    }

    match query.grouping {
        Some(Grouping::Bucket(interval)) => {
            sql.push_str(&format!(
                "\nGROUP BY {}, {}",
                Column::BucketStart(interval).alias(),
                Column::BucketEnd(interval).alias()
            ));
        }
        Some(Grouping::Hashtag) => {
            sql.push_str(&format!("\nGROUP BY {}", HASHTAG_COLUMN));
        }
        None => {}
    }

    if !query.ordering.is_empty() {
        let keys = query
            .ordering
            .iter()
            .map(|o| {
                let direction = match o.order {
                    SortOrder::Ascending => "ASC",
                    SortOrder::Descending => "DESC",
                };
                format!("{} {}", o.column.alias(), direction)
            })
            .collect::<Vec<_>>();
        sql.push_str("\nORDER BY ");
        sql.push_str(&keys.join(", "));
    }

    if let Some(limit) = query.limit {
        let placeholder = binder.bind(SqlParam::Integer(i64::from(limit)));
        sql.push_str(&format!("\nLIMIT {}", placeholder));
    }

    RenderedQuery {
        sql,
        params: binder.params,
    }
}

fn column_expr<D: Dialect + ?Sized>(dialect: &D, column: &Column) -> String {
    match column {
        Column::Changesets => "COUNT(DISTINCT changeset_id)".to_string(),
        Column::Users | Column::NumberOfUsers => "COUNT(DISTINCT user_id)".to_string(),
        Column::Roads => "SUM(road_length)".to_string(),
        Column::Buildings => "COUNT(building_area)".to_string(),
        Column::Edits => "COUNT(*)".to_string(),
        Column::Latest | Column::MaxTimestamp => format!("MAX({})", TIMESTAMP_COLUMN),
        Column::MinTimestamp => format!("MIN({})", TIMESTAMP_COLUMN),
        Column::BucketStart(interval) => dialect.bucket_start(interval),
        Column::BucketEnd(interval) => dialect.bucket_end(interval),
        Column::Hashtag => HASHTAG_COLUMN.to_string(),
    }
}

fn predicate_expr<D: Dialect + ?Sized>(binder: &mut Binder<'_, D>, predicate: &Predicate) -> String {
    match predicate {
        Predicate::HashtagEquals(tag) => {
            let placeholder = binder.bind(SqlParam::Text(tag.clone()));
            format!("{} = {}", HASHTAG_COLUMN, placeholder)
        }
        Predicate::HashtagPrefix(prefix) => {
            let placeholder = binder.bind(SqlParam::Text(prefix.clone()));
            binder.dialect.prefix_match(HASHTAG_COLUMN, &placeholder)
        }
        Predicate::After(ts) => {
            let placeholder = binder.bind(SqlParam::Timestamp(*ts));
            format!(
                "{} > {}",
                TIMESTAMP_COLUMN,
                binder.dialect.timestamp_value(&placeholder)
            )
        }
        Predicate::Before(ts) => {
            let placeholder = binder.bind(SqlParam::Timestamp(*ts));
            format!(
                "{} < {}",
                TIMESTAMP_COLUMN,
                binder.dialect.timestamp_value(&placeholder)
            )
        }
    }
}

/// SQLite, used by the bundled store
///
/// Timestamps are stored as canonical `YYYY-MM-DD HH:MM:SS[.f]` text and
/// bounds are bound in the same form, so they compare lexically as-is.
/// Passing a bound through `datetime()` would drop its fractional seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

/// Seconds between 1969-12-29 (a Monday) and the Unix epoch
const MONDAY_OFFSET_SECS: i64 = 3 * 24 * 3600;

impl SqliteDialect {
    fn epoch_seconds() -> String {
        format!("CAST(strftime('%s', {}) AS INTEGER)", TIMESTAMP_COLUMN)
    }

    /// `value` rounded down to a multiple of `width`
    ///
    /// SQLite's `/` and `%` truncate toward zero, which rounds negative
    /// (pre-1970) values up.
    fn floor_to(value: &str, width: i64) -> String {
        format!(
            "({v} - (({v} % {w}) + {w}) % {w})",
            v = value,
            w = width
        )
    }

    fn date_part(format: &str) -> String {
        format!("CAST(strftime('{}', {}) AS INTEGER)", format, TIMESTAMP_COLUMN)
    }

    fn modifier(interval: &Interval) -> String {
        let amount = interval.amount;
        match interval.unit {
            IntervalUnit::Year => format!("+{} years", amount),
            IntervalUnit::Month => format!("+{} months", amount),
            IntervalUnit::Week => format!("+{} days", u64::from(amount) * 7),
            IntervalUnit::Day => format!("+{} days", amount),
            IntervalUnit::Hour => format!("+{} hours", amount),
            IntervalUnit::Minute => format!("+{} minutes", amount),
        }
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn placeholder(&self, position: usize) -> String {
        format!("?{}", position)
    }

    fn timestamp_value(&self, placeholder: &str) -> String {
        placeholder.to_string()
    }

    fn prefix_match(&self, column: &str, placeholder: &str) -> String {
        // instr is case-sensitive, unlike LIKE
        format!("instr({}, {}) = 1", column, placeholder)
    }

    fn bucket_start(&self, interval: &Interval) -> String {
        let amount = i64::from(interval.amount);
        match interval.unit {
            IntervalUnit::Year => format!(
                "printf('%04d-01-01 00:00:00', {} / {} * {})",
                Self::date_part("%Y"),
                amount,
                amount
            ),
            IntervalUnit::Month => {
                let months = format!(
                    "(({} * 12 + {} - 1) / {} * {})",
                    Self::date_part("%Y"),
                    Self::date_part("%m"),
                    amount,
                    amount
                );
                format!(
                    "printf('%04d-%02d-01 00:00:00', {} / 12, {} % 12 + 1)",
                    months, months
                )
            }
            IntervalUnit::Week => {
                let width = amount * 7 * 24 * 3600;
                let shifted = format!("({} + {})", Self::epoch_seconds(), MONDAY_OFFSET_SECS);
                format!(
                    "datetime({} - {}, 'unixepoch')",
                    Self::floor_to(&shifted, width),
                    MONDAY_OFFSET_SECS
                )
            }
            IntervalUnit::Day | IntervalUnit::Hour | IntervalUnit::Minute => {
                let width = amount * interval.unit.fixed_seconds().unwrap_or(1);
                format!(
                    "datetime({}, 'unixepoch')",
                    Self::floor_to(&Self::epoch_seconds(), width)
                )
            }
        }
    }

    fn bucket_end(&self, interval: &Interval) -> String {
        format!(
            "datetime({}, '{}')",
            self.bucket_start(interval),
            Self::modifier(interval)
        )
    }
}

/// ClickHouse, for deployments backed by an external ClickHouse server
#[derive(Debug, Clone, Copy, Default)]
pub struct ClickHouseDialect;

impl Dialect for ClickHouseDialect {
    fn name(&self) -> &'static str {
        "clickhouse"
    }

    fn placeholder(&self, _position: usize) -> String {
        "?".to_string()
    }

    fn timestamp_value(&self, placeholder: &str) -> String {
        format!("parseDateTimeBestEffort({})", placeholder)
    }

    fn prefix_match(&self, column: &str, placeholder: &str) -> String {
        format!("startsWith({}, {})", column, placeholder)
    }

    fn bucket_start(&self, interval: &Interval) -> String {
        format!("toStartOfInterval({}, INTERVAL {})", TIMESTAMP_COLUMN, interval)
    }

    fn bucket_end(&self, interval: &Interval) -> String {
        format!("{} + INTERVAL {}", self.bucket_start(interval), interval)
    }
}
