//! Player leaderboard and league table.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use quiniela_rust_core::models::TeamRef;
use quiniela_rust_core::scoring::compute_standings;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// One leaderboard entry with the legacy column names the frontend renders.
#[derive(Debug, Serialize)]
pub struct PlayerStandingEntry {
    #[serde(rename = "Posicion")]
    pub position: u32,
    #[serde(rename = "Jugador")]
    pub player: String,
    #[serde(rename = "Puntos ganados")]
    pub points: f64,
    #[serde(rename = "Aciertos")]
    pub hits: u32,
    #[serde(rename = "Apuestas realizadas")]
    pub matchdays_played: u32,
}

/// Standings are derived: every read scans history and recomputes, so the
/// leaderboard can never drift from the archived rows. A store failure
/// degrades to an empty table.
pub async fn players_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PlayerStandingEntry>>, ApiError> {
    let history = match state.store.query_history(None).await {
        Ok(history) => history,
        Err(e) => {
            warn!("Standings history scan failed: {}", e);
            return Ok(Json(Vec::new()));
        }
    };

    let entries = compute_standings(&history)
        .into_iter()
        .map(|row| PlayerStandingEntry {
            position: row.rank,
            player: row.username,
            points: row.points,
            hits: row.correct_predictions,
            matchdays_played: row.matchdays_played,
        })
        .collect();

    Ok(Json(entries))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueEntry {
    pub position: i32,
    pub team: TeamRef,
    pub played: i32,
    pub won: i32,
    pub drawn: i32,
    pub lost: i32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub goal_difference: i32,
    pub points: i32,
}

pub async fn league_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LeagueEntry>>, ApiError> {
    let rows = state.store.query_league_standings().await?;

    if rows.is_empty() {
        return Err(ApiError::NotFound("Standings not available".to_string()));
    }

    let entries = rows
        .into_iter()
        .map(|row| LeagueEntry {
            position: row.position,
            team: TeamRef {
                id: row.team_id,
                name: row.team_name,
            },
            played: row.played,
            won: row.won,
            drawn: row.drawn,
            lost: row.lost,
            goals_for: row.goals_for,
            goals_against: row.goals_against,
            goal_difference: row.goal_difference,
            points: row.points,
        })
        .collect();

    Ok(Json(entries))
}
