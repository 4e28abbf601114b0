//! Prediction store abstraction.
//!
//! All reads and writes go through the [`PredictionStore`] trait so handlers
//! receive an injected client object (constructed once at process start) and
//! tests can substitute an in-memory double. The production implementation
//! is [`postgres::PgPredictionStore`].

pub mod postgres;

use crate::matchday;
use crate::models::{
    HistoryInsert, HistoryRow, LeagueRow, MatchRow, NewPrediction, PredictionRow,
};
use async_trait::async_trait;
use thiserror::Error;

pub use postgres::PgPredictionStore;

/// Store failure taxonomy.
///
/// `Conflict` is the unique-constraint signal the submission guard maps to
/// an "already submitted" response; everything else is a generic store
/// failure, terminal for the request that hit it.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate row for an existing (player, matchday) submission")]
    Conflict,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        // Postgres unique_violation
        let is_unique = e
            .as_database_error()
            .and_then(|db| db.code())
            .map(|code| code == "23505")
            .unwrap_or(false);
        if is_unique {
            StoreError::Conflict
        } else {
            StoreError::Other(e.into())
        }
    }
}

/// Filter for live prediction queries. Usernames are normalized inside the
/// store implementations, so callers may pass any casing.
#[derive(Debug, Clone, Default)]
pub struct PredictionQuery {
    pub username: Option<String>,
    pub matchday: Option<i32>,
}

impl PredictionQuery {
    pub fn for_user(username: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            matchday: None,
        }
    }

    pub fn for_matchday(matchday: i32) -> Self {
        Self {
            username: None,
            matchday: Some(matchday),
        }
    }

    pub fn for_user_matchday(username: &str, matchday: i32) -> Self {
        Self {
            username: Some(username.to_string()),
            matchday: Some(matchday),
        }
    }
}

/// Operations the prediction-pool workflow needs from the backing store.
#[async_trait]
pub trait PredictionStore: Send + Sync {
    /// Bulk-insert live prediction rows. Fails with [`StoreError::Conflict`]
    /// when any row violates the one-batch-per-(player, matchday) unique
    /// constraint; no rows are kept in that case.
    async fn insert_predictions(&self, rows: &[NewPrediction]) -> Result<(), StoreError>;

    /// Live prediction rows matching the filter, ordered by match id.
    async fn query_predictions(
        &self,
        filter: PredictionQuery,
    ) -> Result<Vec<PredictionRow>, StoreError>;

    /// Fast-path existence check for the submission guard.
    async fn has_submission(&self, username: &str, matchday: i32) -> Result<bool, StoreError> {
        let rows = self
            .query_predictions(PredictionQuery::for_user_matchday(username, matchday))
            .await?;
        Ok(!rows.is_empty())
    }

    /// Insert archived rows, ignoring duplicates so an archival re-run after
    /// a partial failure stays idempotent. Returns the number of rows
    /// actually inserted.
    async fn insert_history(&self, rows: &[HistoryInsert]) -> Result<u64, StoreError>;

    /// Delete the live rows of an archived matchday. Returns the number of
    /// rows removed.
    async fn delete_live_predictions(&self, matchday: i32) -> Result<u64, StoreError>;

    /// Archived rows, optionally restricted to one player, newest matchday
    /// first.
    async fn query_history(&self, username: Option<&str>) -> Result<Vec<HistoryRow>, StoreError>;

    /// Fixtures of a season, optionally restricted to one matchday, ordered
    /// by kickoff.
    async fn query_matches(
        &self,
        season: &str,
        matchday: Option<i32>,
    ) -> Result<Vec<MatchRow>, StoreError>;

    /// The active matchday of a season: the earliest round with an
    /// unfinished match, the last round once everything is finished, `None`
    /// for an empty season.
    async fn query_current_matchday(&self, season: &str) -> Result<Option<i32>, StoreError> {
        let rows = self.query_matches(season, None).await?;
        Ok(matchday::resolve_current_matchday(&rows))
    }

    /// The externally maintained league table, ordered by position.
    async fn query_league_standings(&self) -> Result<Vec<LeagueRow>, StoreError>;
}
