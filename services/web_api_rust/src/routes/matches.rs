//! Active-matchday fixture list.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use quiniela_rust_core::matchday::present_matches;
use quiniela_rust_core::models::MatchInfo;
use std::sync::Arc;

pub async fn matches_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MatchInfo>>, ApiError> {
    let current = state.store.query_current_matchday(&state.season).await?;

    let Some(matchday) = current else {
        return Err(ApiError::NotFound("No matches available".to_string()));
    };

    let rows = state
        .store
        .query_matches(&state.season, Some(matchday))
        .await?;

    if rows.is_empty() {
        return Err(ApiError::NotFound("No matches available".to_string()));
    }

    Ok(Json(present_matches(&rows)))
}
