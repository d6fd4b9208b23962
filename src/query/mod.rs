//! Query Construction
//!
//! Turns request inputs into engine SQL:
//!
//! - **hashtag**: exact vs. prefix-wildcard hashtag expressions
//! - **interval**: ISO-8601 duration tokens to native intervals
//! - **ast**: Dialect-neutral query representation
//! - **builder**: The four statistics query shapes
//! - **dialect**: SQL rendering for SQLite and ClickHouse
//!
//! # Example
//!
//! ```rust
//! use hashtag_stats::query::{builder, Dialect, HashtagExpression, Interval, SqliteDialect};
//! use hashtag_stats::storage::{epoch, ResolvedRange};
//!
//! let expr = HashtagExpression::parse("hotosm-project-*");
//! let interval = Interval::parse("P1M").unwrap();
//! let range = ResolvedRange { start: epoch(), end: epoch() };
//!
//! let rendered = SqliteDialect.render(&builder::time_span_interval(&expr, &range, interval));
//! assert_eq!(rendered.params.len(), 3);
//! ```

mod ast;
pub mod builder;
mod dialect;
mod error;
mod hashtag;
mod interval;

pub use ast::{
    Column, Grouping, Ordering, Predicate, SortOrder, SqlParam, StatsQuery, HASHTAG_COLUMN,
    STATS_TABLE, TIMESTAMP_COLUMN,
};
pub use builder::DEFAULT_TOP_LIMIT;
pub use dialect::{dialect_for, ClickHouseDialect, Dialect, RenderedQuery, SqliteDialect};
pub use error::{QueryError, QueryResult};
pub use hashtag::{HashtagExpression, HASHTAG_MARKER, WILDCARD_SUFFIX};
pub use interval::{translate_interval, Interval, IntervalUnit};
