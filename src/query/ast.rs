//! Statistics query representation
//!
//! A dialect-neutral description of a query against the `stats` relation:
//! what to project, how to filter, how to group and order, and how many
//! rows to return. Dialects turn this into engine SQL.
//!
//! # Example
//!
//! ```text
//! StatsQuery::select(&[Column::Hashtag, Column::NumberOfUsers])
//!     .filter(Predicate::After(start))
//!     .filter(Predicate::Before(end))
//!     .group_by(Grouping::Hashtag)
//!     .order_by(Column::NumberOfUsers, SortOrder::Descending)
//!     .limit(10)
//! ```

use crate::query::interval::Interval;
use chrono::NaiveDateTime;

/// Relation holding one row per tagged edit
pub const STATS_TABLE: &str = "stats";

/// Column holding the changeset timestamp
pub const TIMESTAMP_COLUMN: &str = "changeset_timestamp";

/// Column holding the (marker-prefixed) hashtag
pub const HASHTAG_COLUMN: &str = "hashtag";

/// A projected output column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    /// Distinct changesets
    Changesets,
    /// Distinct users
    Users,
    /// Summed road length
    Roads,
    /// Edits carrying a building area
    Buildings,
    /// All edits
    Edits,
    /// Latest changeset timestamp
    Latest,
    /// Start of the bucket a row falls into
    BucketStart(Interval),
    /// Start of the bucket plus the interval width
    BucketEnd(Interval),
    /// The stored hashtag
    Hashtag,
    /// Distinct users per hashtag
    NumberOfUsers,
    /// Earliest timestamp in the relation
    MinTimestamp,
    /// Latest timestamp in the relation
    MaxTimestamp,
}

impl Column {
    /// Output name of the column
    pub fn alias(&self) -> &'static str {
        match self {
            Self::Changesets => "changesets",
            Self::Users => "users",
            Self::Roads => "roads",
            Self::Buildings => "buildings",
            Self::Edits => "edits",
            Self::Latest => "latest",
            Self::BucketStart(_) => "startdate",
            Self::BucketEnd(_) => "enddate",
            Self::Hashtag => "hashtag",
            Self::NumberOfUsers => "number_of_users",
            Self::MinTimestamp => "min_timestamp",
            Self::MaxTimestamp => "max_timestamp",
        }
    }
}

/// A row filter
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Hashtag equals the bound value
    HashtagEquals(String),
    /// Hashtag starts with the bound value
    HashtagPrefix(String),
    /// Timestamp strictly after the bound instant
    After(NaiveDateTime),
    /// Timestamp strictly before the bound instant
    Before(NaiveDateTime),
}

/// GROUP BY specification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    /// Group by bucket start (and end) of the interval
    Bucket(Interval),
    /// Group by stored hashtag
    Hashtag,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// ORDER BY key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
    pub column: Column,
    pub order: SortOrder,
}

/// A value bound to a placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Integer(i64),
    Timestamp(NaiveDateTime),
}

/// A query ready for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct StatsQuery {
    pub projection: Vec<Column>,
    pub filters: Vec<Predicate>,
    pub grouping: Option<Grouping>,
    pub ordering: Vec<Ordering>,
    pub limit: Option<u32>,
}

impl StatsQuery {
    /// Start a query projecting the given columns
    pub fn select(columns: &[Column]) -> Self {
        Self {
            projection: columns.to_vec(),
            filters: Vec::new(),
            grouping: None,
            ordering: Vec::new(),
            limit: None,
        }
    }

    /// Add a filter (all filters are AND-ed)
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filters.push(predicate);
        self
    }

    /// Set the grouping
    pub fn group_by(mut self, grouping: Grouping) -> Self {
        self.grouping = Some(grouping);
        self
    }

    /// Append an ORDER BY key
    pub fn order_by(mut self, column: Column, order: SortOrder) -> Self {
        self.ordering.push(Ordering { column, order });
        self
    }

    /// Limit the number of rows
    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    /// Output names in projection order
    pub fn column_names(&self) -> Vec<&'static str> {
        self.projection.iter().map(Column::alias).collect()
    }
}
