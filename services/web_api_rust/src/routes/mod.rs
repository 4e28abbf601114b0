//! Route handlers, one module per concern.

pub mod auth;
pub mod history;
pub mod matches;
pub mod predictions;
pub mod standings;

use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/login", post(auth::login_handler))
        .route("/api/matches", get(matches::matches_handler))
        .route("/api/predictions", post(predictions::submit_handler))
        .route("/api/check-bet", get(predictions::check_bet_handler))
        .route("/api/current-bet", get(predictions::current_bet_handler))
        .route("/api/archive", post(predictions::archive_handler))
        .route("/api/history", get(history::history_handler))
        .route("/api/points", get(history::points_handler))
        .route("/api/standings/players", get(standings::players_handler))
        .route("/api/standings/league", get(standings::league_handler))
        .with_state(state)
}
