//! Data Transfer Objects
//!
//! Query-string parameters accepted by the stats endpoints and the `query`
//! echo block returned with each response.

use crate::api::error::{ApiError, ApiResult};
use crate::storage::{parse_timestamp, TimeRange};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Interval used when a bucketed request names none
pub const DEFAULT_INTERVAL: &str = "P1M";

// ============================================
// REQUEST PARAMETERS
// ============================================

/// `?startdate&enddate`
#[derive(Debug, Default, Deserialize)]
pub struct TimeSpanParams {
    pub startdate: Option<String>,
    pub enddate: Option<String>,
}

/// `?startdate&enddate&interval`
#[derive(Debug, Default, Deserialize)]
pub struct IntervalParams {
    pub startdate: Option<String>,
    pub enddate: Option<String>,
    pub interval: Option<String>,
}

/// `?startdate&enddate&limit`
#[derive(Debug, Default, Deserialize)]
pub struct TopHashtagsParams {
    pub startdate: Option<String>,
    pub enddate: Option<String>,
    pub limit: Option<u32>,
}

/// Parsed start/end bounds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateBounds {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl DateBounds {
    /// Validate raw `startdate` / `enddate` values
    ///
    /// Missing or blank values stay unset; anything else must parse.
    pub fn parse(startdate: Option<&str>, enddate: Option<&str>) -> ApiResult<Self> {
        Ok(Self {
            start: parse_date_param("startdate", startdate)?,
            end: parse_date_param("enddate", enddate)?,
        })
    }

    pub fn time_range(&self) -> TimeRange {
        TimeRange::new(self.start, self.end)
    }
}

fn parse_date_param(name: &str, value: Option<&str>) -> ApiResult<Option<NaiveDateTime>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_timestamp(raw).map(Some).ok_or_else(|| {
            ApiError::Validation(format!(
                "Invalid {} '{}': expected an ISO-8601 date or date-time",
                name, raw
            ))
        }),
    }
}

// ============================================
// QUERY ECHO
// ============================================

/// Echo for `/stats/:hashtag` and `/stats_static/:hashtag`
#[derive(Debug, Clone, Serialize)]
pub struct TimeSpanEcho {
    pub hashtag: String,
    pub startdate: Option<NaiveDateTime>,
    pub enddate: Option<NaiveDateTime>,
}

/// Echo for `/stats/:hashtag/interval`
#[derive(Debug, Clone, Serialize)]
pub struct IntervalEcho {
    pub hashtag: String,
    pub startdate: Option<NaiveDateTime>,
    pub enddate: Option<NaiveDateTime>,
    pub interval: String,
}

/// Echo for `/most-used-hashtags`
#[derive(Debug, Clone, Serialize)]
pub struct TopHashtagsEcho {
    pub startdate: Option<NaiveDateTime>,
    pub enddate: Option<NaiveDateTime>,
    pub limit: u32,
}

/// Echo for endpoints without parameters
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct NoParams {}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy" or "unhealthy"
    pub status: String,
    /// "ok" or "error"
    pub database: String,
    pub uptime_seconds: u64,
    pub version: String,
}
