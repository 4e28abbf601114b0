//! Submission, bet lookup and archival endpoints.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use quiniela_rust_core::matchday::parse_matchday;
use quiniela_rust_core::models::{string_or_number, MatchRow, Outcome, SubmittedBet};
use quiniela_rust_core::scoring::{archive_matchday, results_from_matches};
use quiniela_rust_core::store::PredictionQuery;
use quiniela_rust_core::submission::submit_predictions;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

// ============================================================================
// POST /api/predictions
// ============================================================================

pub async fn submit_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Vec<SubmittedBet>>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    // A body that is not a JSON array of bets is a 400, not a 422
    let Json(bets) = payload.map_err(|_| ApiError::Validation("Invalid data format".to_string()))?;

    let receipt = submit_predictions(state.store.as_ref(), &bets).await?;

    Ok(Json(json!({
        "success": true,
        "message": "ok",
        "matchday": receipt.matchday,
    })))
}

// ============================================================================
// GET /api/check-bet
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CheckBetParams {
    #[serde(default)]
    pub jugador: Option<String>,
    #[serde(default)]
    pub jornada: Option<String>,
}

/// Fast-path lookup the frontend uses before rendering the submission form.
/// A store failure degrades to "no bet yet" instead of failing the page.
pub async fn check_bet_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CheckBetParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (Some(jugador), Some(jornada)) = (params.jugador, params.jornada) else {
        return Err(ApiError::Validation("Faltan parámetros".to_string()));
    };

    let Some(matchday) = parse_matchday(&jornada) else {
        return Err(ApiError::Validation(format!("Invalid jornada '{}'", jornada)));
    };

    let has_bet = match state.store.has_submission(&jugador, matchday).await {
        Ok(has_bet) => has_bet,
        Err(e) => {
            warn!("check-bet lookup failed for {}: {}", jugador, e);
            false
        }
    };

    Ok(Json(json!({ "hasBet": has_bet })))
}

// ============================================================================
// GET /api/current-bet
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CurrentBetParams {
    #[serde(default)]
    pub jugador: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentBetLine {
    pub match_id: i64,
    pub home_team: String,
    pub away_team: String,
    pub home_team_id: Option<i64>,
    pub away_team_id: Option<i64>,
    pub prediction: Outcome,
    pub odds: f64,
    pub actual_result: Option<Outcome>,
    pub correct: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct CurrentBetResponse {
    pub matchday: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub bets: Vec<CurrentBetLine>,
}

/// The player's live batch, joined with the fixture rows so the frontend
/// gets team ids for logos and provisional correctness for matches that
/// already finished.
pub async fn current_bet_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CurrentBetParams>,
) -> Result<Json<CurrentBetResponse>, ApiError> {
    let Some(jugador) = params.jugador else {
        return Err(ApiError::Validation("Falta jugador".to_string()));
    };

    let predictions = state
        .store
        .query_predictions(PredictionQuery::for_user(&jugador))
        .await?;

    let Some(first) = predictions.first() else {
        return Ok(Json(CurrentBetResponse {
            matchday: None,
            timestamp: None,
            bets: Vec::new(),
        }));
    };

    let matchday = first.matchday;
    let timestamp = first.created_at;

    let fixtures = state
        .store
        .query_matches(&state.season, Some(matchday))
        .await?;
    let by_match: HashMap<i64, &MatchRow> =
        fixtures.iter().map(|m| (m.match_id, m)).collect();

    let bets = predictions
        .iter()
        .map(|p| {
            let fixture = by_match.get(&p.match_id);
            let actual_result = fixture.and_then(|m| m.result);
            CurrentBetLine {
                match_id: p.match_id,
                home_team: p.home_team.clone(),
                away_team: p.away_team.clone(),
                home_team_id: fixture.map(|m| m.home_team_id),
                away_team_id: fixture.map(|m| m.away_team_id),
                prediction: p.pick,
                odds: p.odds,
                actual_result,
                correct: actual_result.map(|r| p.pick == r),
            }
        })
        .collect();

    Ok(Json(CurrentBetResponse {
        matchday: Some(matchday),
        timestamp: Some(timestamp),
        bets,
    }))
}

// ============================================================================
// POST /api/archive
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ArchiveRequest {
    #[serde(deserialize_with = "string_or_number")]
    pub jornada: String,
}

/// Move a finished matchday into history. Final results are read from the
/// fixtures table, not trusted from the request.
pub async fn archive_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ArchiveRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(body) = payload.map_err(|_| ApiError::Validation("Invalid data format".to_string()))?;

    let Some(matchday) = parse_matchday(&body.jornada) else {
        return Err(ApiError::Validation(format!(
            "Invalid jornada '{}'",
            body.jornada
        )));
    };

    let fixtures = state
        .store
        .query_matches(&state.season, Some(matchday))
        .await?;
    let results = results_from_matches(&fixtures);

    let report = archive_matchday(state.store.as_ref(), matchday, &results).await?;

    Ok(Json(json!({
        "success": true,
        "matchday": report.matchday,
        "archived": report.archived,
        "deleted": report.deleted,
    })))
}
