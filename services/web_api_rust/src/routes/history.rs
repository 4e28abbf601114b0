//! Per-player history views.
//!
//! Both endpoints degrade to an empty list on store failure: a broken
//! history page is worse than a momentarily empty one.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::Json;
use quiniela_rust_core::scoring::{points_by_matchday, summarize_history, MatchdayPoints, MatchdaySummary};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    #[serde(default)]
    pub jugador: Option<String>,
}

pub async fn history_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<MatchdaySummary>>, ApiError> {
    let Some(jugador) = params.jugador else {
        return Err(ApiError::Validation("Missing jugador parameter".to_string()));
    };

    let history = match state.store.query_history(Some(&jugador)).await {
        Ok(history) => history,
        Err(e) => {
            warn!("History lookup failed for {}: {}", jugador, e);
            return Ok(Json(Vec::new()));
        }
    };

    Ok(Json(summarize_history(&history)))
}

pub async fn points_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<MatchdayPoints>>, ApiError> {
    let Some(jugador) = params.jugador else {
        return Err(ApiError::Validation("Missing jugador parameter".to_string()));
    };

    let history = match state.store.query_history(Some(&jugador)).await {
        Ok(history) => history,
        Err(e) => {
            warn!("Points lookup failed for {}: {}", jugador, e);
            return Ok(Json(Vec::new()));
        }
    };

    Ok(Json(points_by_matchday(&history)))
}
