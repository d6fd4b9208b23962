//! Metadata Route
//!
//! - GET /metadata - Earliest and latest timestamp in the dataset

use axum::{
    extract::{OriginalUri, State},
    Json,
};
use std::sync::Arc;
use std::time::Instant;

use crate::api::dto::NoParams;
use crate::api::error::ApiResult;
use crate::api::response::StatsResponse;
use crate::api::state::AppState;
use crate::storage::Metadata;

/// GET /metadata
pub async fn metadata(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
) -> ApiResult<Json<StatsResponse<NoParams, Metadata>>> {
    let started = Instant::now();
    let metadata = state.repository.metadata().await?;

    Ok(Json(state.assembler.assemble(started, uri.to_string(), NoParams {}, metadata)))
}
