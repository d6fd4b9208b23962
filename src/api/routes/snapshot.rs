//! Static Snapshot Route
//!
//! - GET /stats_static/:hashtag - Fixed statistics, no database access
//!
//! Lets clients keep rendering while the database is offline.

use axum::{
    extract::{OriginalUri, Path, State},
    Json,
};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Instant;

use crate::api::dto::TimeSpanEcho;
use crate::api::response::StatsResponse;
use crate::api::state::AppState;
use crate::query::HashtagExpression;
use crate::storage::TimeSpanStats;

/// Snapshot figures for `hashtag`
pub fn snapshot_stats(hashtag: &str) -> TimeSpanStats {
    TimeSpanStats {
        changesets: 65_009_011,
        users: 3_003_842,
        roads: Some(45_964_973.052),
        buildings: 844_294_167,
        edits: 1_095_608_574,
        latest: NaiveDate::from_ymd_opt(2021, 12, 9).and_then(|d| d.and_hms_opt(13, 1, 28)),
        hashtag: hashtag.to_string(),
    }
}

/// GET /stats_static/:hashtag
pub async fn static_stats(
    State(state): State<Arc<AppState>>,
    Path(hashtag): Path<String>,
    OriginalUri(uri): OriginalUri,
) -> Json<StatsResponse<TimeSpanEcho, TimeSpanStats>> {
    let started = Instant::now();
    let expr = HashtagExpression::parse(&hashtag);
    let stats = snapshot_stats(expr.normalized_tag());

    let echo = TimeSpanEcho {
        hashtag,
        startdate: None,
        enddate: None,
    };

    Json(state.assembler.assemble(started, uri.to_string(), echo, stats))
}
