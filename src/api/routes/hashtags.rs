//! Top Hashtags Route
//!
//! - GET /most-used-hashtags - Hashtags ranked by distinct users

use axum::{
    extract::{OriginalUri, Query, State},
    Json,
};
use std::sync::Arc;
use std::time::Instant;

use crate::api::dto::{DateBounds, TopHashtagsEcho, TopHashtagsParams};
use crate::api::error::ApiResult;
use crate::api::response::StatsResponse;
use crate::api::state::AppState;
use crate::storage::HashtagUsage;

/// GET /most-used-hashtags
pub async fn most_used_hashtags(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TopHashtagsParams>,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<Json<StatsResponse<TopHashtagsEcho, Vec<HashtagUsage>>>> {
    let started = Instant::now();
    let bounds = DateBounds::parse(params.startdate.as_deref(), params.enddate.as_deref())?;
    let limit = params.limit.unwrap_or(state.config.default_top_limit);

    let usage = state
        .repository
        .most_used_hashtags(bounds.time_range(), Some(limit))
        .await?;

    let echo = TopHashtagsEcho {
        startdate: bounds.start,
        enddate: bounds.end,
        limit,
    };

    Ok(Json(state.assembler.assemble(started, uri.to_string(), echo, usage)))
}
