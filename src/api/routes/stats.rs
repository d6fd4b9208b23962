//! Hashtag Stats Routes
//!
//! - GET /stats/:hashtag - Aggregates over a time range
//! - GET /stats/:hashtag/interval - Aggregates per time bucket
//!
//! A hashtag ending in `*` matches every hashtag with that prefix.

use axum::{
    extract::{OriginalUri, Path, Query, State},
    Json,
};
use std::sync::Arc;
use std::time::Instant;

use crate::api::dto::{
    DateBounds, IntervalEcho, IntervalParams, TimeSpanEcho, TimeSpanParams, DEFAULT_INTERVAL,
};
use crate::api::error::ApiResult;
use crate::api::response::StatsResponse;
use crate::api::state::AppState;
use crate::query::HashtagExpression;
use crate::storage::{IntervalStats, TimeSpanStats};

/// GET /stats/:hashtag
pub async fn time_span(
    State(state): State<Arc<AppState>>,
    Path(hashtag): Path<String>,
    Query(params): Query<TimeSpanParams>,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<Json<StatsResponse<TimeSpanEcho, TimeSpanStats>>> {
    let started = Instant::now();
    let bounds = DateBounds::parse(params.startdate.as_deref(), params.enddate.as_deref())?;
    let expr = HashtagExpression::parse(&hashtag);

    let stats = state
        .repository
        .stats_for_time_span(&expr, bounds.time_range())
        .await?;

    let echo = TimeSpanEcho {
        hashtag,
        startdate: bounds.start,
        enddate: bounds.end,
    };

    Ok(Json(state.assembler.assemble(started, uri.to_string(), echo, stats)))
}

/// GET /stats/:hashtag/interval
///
/// `interval` defaults to one month.
pub async fn time_span_interval(
    State(state): State<Arc<AppState>>,
    Path(hashtag): Path<String>,
    Query(params): Query<IntervalParams>,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<Json<StatsResponse<IntervalEcho, Vec<IntervalStats>>>> {
    let started = Instant::now();
    let bounds = DateBounds::parse(params.startdate.as_deref(), params.enddate.as_deref())?;
    let expr = HashtagExpression::parse(&hashtag);
    let interval = params
        .interval
        .filter(|token| !token.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_INTERVAL.to_string());

    let buckets = state
        .repository
        .stats_for_time_span_interval(&expr, bounds.time_range(), &interval)
        .await?;

    let echo = IntervalEcho {
        hashtag,
        startdate: bounds.start,
        enddate: bounds.end,
        interval,
    };

    Ok(Json(state.assembler.assemble(started, uri.to_string(), echo, buckets)))
}
