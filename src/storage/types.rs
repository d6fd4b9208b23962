//! Core data types for the statistics store
//!
//! This module defines the types that flow in and out of the store:
//! - `TimeRange` / `ResolvedRange`: optional and resolved query windows
//! - `TimeSpanStats`, `IntervalStats`: aggregate records
//! - `HashtagUsage`, `Metadata`: top-N and dataset bound records
//! - `StatsRow`: one edit row, as loaded into the `stats` relation
//!
//! Field order of the record types is the key order of their serialized form.

use crate::clock::Clock;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Canonical text form of a timestamp inside the store
///
/// Fractional seconds are written only when non-zero. Values in this form
/// order lexically the same way they order in time.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Optional query window
///
/// Bounds are not ordered against each other: an inverted range is valid
/// and simply matches nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl TimeRange {
    /// Create a time range from optional bounds
    pub fn new(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        Self { start, end }
    }

    /// Open range: from the epoch until now
    pub fn all() -> Self {
        Self::default()
    }

    /// Resolve missing bounds
    ///
    /// A missing start becomes the Unix epoch; a missing end becomes the
    /// clock's current instant, read at the time of this call.
    pub fn resolve(&self, clock: &dyn Clock) -> ResolvedRange {
        ResolvedRange {
            start: self.start.unwrap_or_else(epoch),
            end: self.end.unwrap_or_else(|| clock.now().naive_utc()),
        }
    }
}

/// Query window with both bounds fixed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// The Unix epoch as a naive UTC timestamp
pub fn epoch() -> NaiveDateTime {
    NaiveDateTime::default()
}

/// Parse a timestamp leniently
///
/// Accepts RFC 3339 (converted to UTC), `YYYY-MM-DDTHH:MM:SS[.f]`,
/// `YYYY-MM-DD HH:MM:SS[.f]` and bare dates (midnight).
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Aggregates for one hashtag over a time range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSpanStats {
    /// Distinct changesets
    pub changesets: i64,
    /// Distinct users
    pub users: i64,
    /// Summed road length, null when nothing matched
    pub roads: Option<f64>,
    /// Edits carrying a building area
    pub buildings: i64,
    /// All matching edits
    pub edits: i64,
    /// Latest matching timestamp, null when nothing matched
    pub latest: Option<NaiveDateTime>,
    /// Normalized hashtag the stats were requested for
    pub hashtag: String,
}

/// Aggregates for one populated bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalStats {
    pub changesets: i64,
    pub users: i64,
    pub roads: Option<f64>,
    pub buildings: i64,
    pub edits: i64,
    /// Bucket start (inclusive)
    pub startdate: NaiveDateTime,
    /// Bucket start plus one interval width
    pub enddate: NaiveDateTime,
}

/// Distinct users per hashtag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashtagUsage {
    pub hashtag: String,
    pub number_of_users: i64,
}

/// Dataset-wide timestamp bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub min_timestamp: Option<NaiveDateTime>,
    pub max_timestamp: Option<NaiveDateTime>,
}

/// One edit row in the `stats` relation
#[derive(Debug, Clone, PartialEq)]
pub struct StatsRow {
    pub changeset_id: i64,
    pub user_id: i64,
    pub road_length: Option<f64>,
    pub building_area: Option<f64>,
    /// Stored hashtag, including the `#` marker
    pub hashtag: String,
    pub changeset_timestamp: NaiveDateTime,
}

impl StatsRow {
    /// Create a row without road or building measurements
    pub fn new(
        changeset_id: i64,
        user_id: i64,
        hashtag: impl Into<String>,
        changeset_timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            changeset_id,
            user_id,
            road_length: None,
            building_area: None,
            hashtag: hashtag.into(),
            changeset_timestamp,
        }
    }

    /// Builder method: set road length
    pub fn road_length(mut self, length: f64) -> Self {
        self.road_length = Some(length);
        self
    }

    /// Builder method: set building area
    pub fn building_area(mut self, area: f64) -> Self {
        self.building_area = Some(area);
        self
    }
}
