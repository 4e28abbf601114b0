//! Postgres implementation of the prediction store.
//!
//! Expected schema (managed out of band, next to the results-ingestion
//! process):
//!
//! ```sql
//! CREATE TABLE matches (
//!     match_id      BIGINT PRIMARY KEY,
//!     season        TEXT NOT NULL,
//!     matchday      INT NOT NULL,
//!     kickoff       TIMESTAMPTZ NOT NULL,
//!     home_team_id  BIGINT NOT NULL,
//!     home_team     TEXT NOT NULL,
//!     away_team_id  BIGINT NOT NULL,
//!     away_team     TEXT NOT NULL,
//!     status        TEXT NOT NULL DEFAULT 'SCHEDULED',
//!     home_goals    INT,
//!     away_goals    INT,
//!     result        TEXT,
//!     odds_home     DOUBLE PRECISION,
//!     odds_draw     DOUBLE PRECISION,
//!     odds_away     DOUBLE PRECISION
//! );
//!
//! CREATE TABLE predictions (
//!     id         BIGSERIAL PRIMARY KEY,
//!     username   TEXT NOT NULL,
//!     matchday   INT NOT NULL,
//!     match_id   BIGINT NOT NULL,
//!     home_team  TEXT NOT NULL,
//!     away_team  TEXT NOT NULL,
//!     pick       TEXT NOT NULL,
//!     odds       DOUBLE PRECISION NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     UNIQUE (username, matchday, match_id)
//! );
//!
//! CREATE TABLE predictions_history (
//!     id          BIGSERIAL PRIMARY KEY,
//!     username    TEXT NOT NULL,
//!     matchday    INT NOT NULL,
//!     match_id    BIGINT NOT NULL,
//!     home_team   TEXT NOT NULL,
//!     away_team   TEXT NOT NULL,
//!     pick        TEXT NOT NULL,
//!     odds        DOUBLE PRECISION NOT NULL,
//!     actual_result TEXT,
//!     correct     BOOLEAN,
//!     points_earned DOUBLE PRECISION,
//!     created_at  TIMESTAMPTZ NOT NULL,
//!     archived_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     UNIQUE (username, matchday, match_id)
//! );
//!
//! CREATE TABLE league_standings (
//!     position      INT PRIMARY KEY,
//!     team_id       BIGINT NOT NULL,
//!     team_name     TEXT NOT NULL,
//!     played        INT NOT NULL,
//!     won           INT NOT NULL,
//!     drawn         INT NOT NULL,
//!     lost          INT NOT NULL,
//!     goals_for     INT NOT NULL,
//!     goals_against INT NOT NULL,
//!     goal_difference INT NOT NULL,
//!     points        INT NOT NULL
//! );
//! ```
//!
//! The `predictions` unique constraint is the authoritative backstop for the
//! one-batch-per-(player, matchday) invariant; the application-level
//! existence check is only a fast path.

use crate::db::retry::execute_with_retry;
use crate::models::{
    HistoryInsert, HistoryRow, LeagueRow, MatchRow, NewPrediction, PredictionRow,
};
use crate::store::{PredictionQuery, PredictionStore, StoreError};
use crate::utils::normalize_username;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

const READ_ATTEMPTS: u32 = 3;

/// Prediction store backed by a shared Postgres pool.
#[derive(Clone)]
pub struct PgPredictionStore {
    pool: PgPool,
}

impl PgPredictionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PredictionStore for PgPredictionStore {
    async fn insert_predictions(&self, rows: &[NewPrediction]) -> Result<(), StoreError> {
        // Single transaction: either the whole batch lands or none of it.
        // A unique violation aborts the transaction and surfaces as Conflict.
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;

        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO predictions
                    (username, matchday, match_id, home_team, away_team, pick, odds)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(normalize_username(&row.username))
            .bind(row.matchday)
            .bind(row.match_id)
            .bind(&row.home_team)
            .bind(&row.away_team)
            .bind(row.pick)
            .bind(row.odds)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await.map_err(StoreError::from)?;
        debug!("Inserted {} prediction rows", rows.len());
        Ok(())
    }

    async fn query_predictions(
        &self,
        filter: PredictionQuery,
    ) -> Result<Vec<PredictionRow>, StoreError> {
        let username = filter.username.as_deref().map(normalize_username);
        let rows = execute_with_retry(
            || async {
                match (username.as_deref(), filter.matchday) {
                    (Some(user), Some(matchday)) => {
                        sqlx::query_as::<_, PredictionRow>(
                            r#"
                            SELECT id, username, matchday, match_id, home_team,
                                   away_team, pick, odds, created_at
                            FROM predictions
                            WHERE username = $1 AND matchday = $2
                            ORDER BY match_id
                            "#,
                        )
                        .bind(user)
                        .bind(matchday)
                        .fetch_all(&self.pool)
                        .await
                    }
                    (Some(user), None) => {
                        sqlx::query_as::<_, PredictionRow>(
                            r#"
                            SELECT id, username, matchday, match_id, home_team,
                                   away_team, pick, odds, created_at
                            FROM predictions
                            WHERE username = $1
                            ORDER BY match_id
                            "#,
                        )
                        .bind(user)
                        .fetch_all(&self.pool)
                        .await
                    }
                    (None, Some(matchday)) => {
                        sqlx::query_as::<_, PredictionRow>(
                            r#"
                            SELECT id, username, matchday, match_id, home_team,
                                   away_team, pick, odds, created_at
                            FROM predictions
                            WHERE matchday = $1
                            ORDER BY username, match_id
                            "#,
                        )
                        .bind(matchday)
                        .fetch_all(&self.pool)
                        .await
                    }
                    (None, None) => {
                        sqlx::query_as::<_, PredictionRow>(
                            r#"
                            SELECT id, username, matchday, match_id, home_team,
                                   away_team, pick, odds, created_at
                            FROM predictions
                            ORDER BY username, match_id
                            "#,
                        )
                        .fetch_all(&self.pool)
                        .await
                    }
                }
            },
            READ_ATTEMPTS,
        )
        .await?;
        Ok(rows)
    }

    async fn has_submission(&self, username: &str, matchday: i32) -> Result<bool, StoreError> {
        let user = normalize_username(username);
        let exists: Option<i64> = execute_with_retry(
            || async {
                sqlx::query_scalar(
                    r#"
                    SELECT id FROM predictions
                    WHERE username = $1 AND matchday = $2
                    LIMIT 1
                    "#,
                )
                .bind(&user)
                .bind(matchday)
                .fetch_optional(&self.pool)
                .await
            },
            READ_ATTEMPTS,
        )
        .await?;
        Ok(exists.is_some())
    }

    async fn insert_history(&self, rows: &[HistoryInsert]) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;

        let mut inserted = 0u64;
        for row in rows {
            // DO NOTHING keeps archival re-runs idempotent after a partial
            // failure of the delete step.
            let result = sqlx::query(
                r#"
                INSERT INTO predictions_history
                    (username, matchday, match_id, home_team, away_team,
                     pick, odds, actual_result, correct, points_earned, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                ON CONFLICT (username, matchday, match_id) DO NOTHING
                "#,
            )
            .bind(normalize_username(&row.username))
            .bind(row.matchday)
            .bind(row.match_id)
            .bind(&row.home_team)
            .bind(&row.away_team)
            .bind(row.pick)
            .bind(row.odds)
            .bind(row.actual_result)
            .bind(row.correct)
            .bind(row.points_earned)
            .bind(row.created_at)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        tx.commit().await.map_err(StoreError::from)?;
        debug!("Archived {} of {} history rows", inserted, rows.len());
        Ok(inserted)
    }

    async fn delete_live_predictions(&self, matchday: i32) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM predictions WHERE matchday = $1")
            .bind(matchday)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn query_history(&self, username: Option<&str>) -> Result<Vec<HistoryRow>, StoreError> {
        let username = username.map(normalize_username);
        let rows = execute_with_retry(
            || async {
                match username.as_deref() {
                    Some(user) => {
                        sqlx::query_as::<_, HistoryRow>(
                            r#"
                            SELECT id, username, matchday, match_id, home_team,
                                   away_team, pick, odds, actual_result, correct,
                                   points_earned, created_at, archived_at
                            FROM predictions_history
                            WHERE username = $1
                            ORDER BY matchday DESC, match_id
                            "#,
                        )
                        .bind(user)
                        .fetch_all(&self.pool)
                        .await
                    }
                    None => {
                        sqlx::query_as::<_, HistoryRow>(
                            r#"
                            SELECT id, username, matchday, match_id, home_team,
                                   away_team, pick, odds, actual_result, correct,
                                   points_earned, created_at, archived_at
                            FROM predictions_history
                            ORDER BY matchday DESC, username, match_id
                            "#,
                        )
                        .fetch_all(&self.pool)
                        .await
                    }
                }
            },
            READ_ATTEMPTS,
        )
        .await?;
        Ok(rows)
    }

    async fn query_matches(
        &self,
        season: &str,
        matchday: Option<i32>,
    ) -> Result<Vec<MatchRow>, StoreError> {
        let rows = execute_with_retry(
            || async {
                match matchday {
                    Some(matchday) => {
                        sqlx::query_as::<_, MatchRow>(
                            r#"
                            SELECT match_id, season, matchday, kickoff,
                                   home_team_id, home_team, away_team_id, away_team,
                                   status, home_goals, away_goals, result,
                                   odds_home, odds_draw, odds_away
                            FROM matches
                            WHERE season = $1 AND matchday = $2
                            ORDER BY kickoff, match_id
                            "#,
                        )
                        .bind(season)
                        .bind(matchday)
                        .fetch_all(&self.pool)
                        .await
                    }
                    None => {
                        sqlx::query_as::<_, MatchRow>(
                            r#"
                            SELECT match_id, season, matchday, kickoff,
                                   home_team_id, home_team, away_team_id, away_team,
                                   status, home_goals, away_goals, result,
                                   odds_home, odds_draw, odds_away
                            FROM matches
                            WHERE season = $1
                            ORDER BY kickoff, match_id
                            "#,
                        )
                        .bind(season)
                        .fetch_all(&self.pool)
                        .await
                    }
                }
            },
            READ_ATTEMPTS,
        )
        .await?;
        Ok(rows)
    }

    async fn query_league_standings(&self) -> Result<Vec<LeagueRow>, StoreError> {
        let rows = execute_with_retry(
            || async {
                sqlx::query_as::<_, LeagueRow>(
                    r#"
                    SELECT position, team_id, team_name, played, won, drawn,
                           lost, goals_for, goals_against, goal_difference, points
                    FROM league_standings
                    ORDER BY position
                    "#,
                )
                .fetch_all(&self.pool)
                .await
            },
            READ_ATTEMPTS,
        )
        .await?;
        Ok(rows)
    }
}
