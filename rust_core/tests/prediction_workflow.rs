//! End-to-end workflow tests over an in-memory store double.
//!
//! The double enforces the same unique constraints as the Postgres store so
//! the guard-then-insert flow, archival idempotence and the standings read
//! model can be exercised without a database.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use quiniela_rust_core::models::{
    HistoryInsert, HistoryRow, LeagueRow, MatchRow, MatchStatus, NewPrediction, Outcome,
    PredictionRow, SubmittedBet,
};
use quiniela_rust_core::scoring::{self, MatchResult};
use quiniela_rust_core::store::{PredictionQuery, PredictionStore, StoreError};
use quiniela_rust_core::submission::{submit_predictions, SubmitError};
use quiniela_rust_core::utils::normalize_username;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct MemoryStore {
    predictions: Mutex<Vec<PredictionRow>>,
    history: Mutex<Vec<HistoryRow>>,
    matches: Mutex<Vec<MatchRow>>,
    /// Pretend the fast-path existence check sees nothing, so the unique
    /// constraint is the only guard (simulates the submission race).
    suppress_fast_path: AtomicBool,
    /// Make the archival delete step fail once.
    fail_next_delete: AtomicBool,
}

#[async_trait]
impl PredictionStore for MemoryStore {
    async fn insert_predictions(&self, rows: &[NewPrediction]) -> Result<(), StoreError> {
        let mut live = self.predictions.lock().unwrap();
        // Unique (username, matchday, match_id), all-or-nothing
        for row in rows {
            let duplicate = live.iter().any(|p| {
                p.username == normalize_username(&row.username)
                    && p.matchday == row.matchday
                    && p.match_id == row.match_id
            });
            if duplicate {
                return Err(StoreError::Conflict);
            }
        }
        let base_id = live.len() as i64 + 1;
        for (offset, row) in rows.iter().enumerate() {
            live.push(PredictionRow {
                id: base_id + offset as i64,
                username: normalize_username(&row.username),
                matchday: row.matchday,
                match_id: row.match_id,
                home_team: row.home_team.clone(),
                away_team: row.away_team.clone(),
                pick: row.pick,
                odds: row.odds,
                created_at: Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap(),
            });
        }
        Ok(())
    }

    async fn query_predictions(
        &self,
        filter: PredictionQuery,
    ) -> Result<Vec<PredictionRow>, StoreError> {
        let live = self.predictions.lock().unwrap();
        let username = filter.username.as_deref().map(normalize_username);
        Ok(live
            .iter()
            .filter(|p| username.as_deref().map_or(true, |u| p.username == u))
            .filter(|p| filter.matchday.map_or(true, |md| p.matchday == md))
            .cloned()
            .collect())
    }

    async fn has_submission(&self, username: &str, matchday: i32) -> Result<bool, StoreError> {
        if self.suppress_fast_path.load(Ordering::SeqCst) {
            return Ok(false);
        }
        let rows = self
            .query_predictions(PredictionQuery::for_user_matchday(username, matchday))
            .await?;
        Ok(!rows.is_empty())
    }

    async fn insert_history(&self, rows: &[HistoryInsert]) -> Result<u64, StoreError> {
        let mut history = self.history.lock().unwrap();
        let mut inserted = 0u64;
        for row in rows {
            let duplicate = history.iter().any(|h| {
                h.username == normalize_username(&row.username)
                    && h.matchday == row.matchday
                    && h.match_id == row.match_id
            });
            if duplicate {
                continue; // ON CONFLICT DO NOTHING
            }
            let id = history.len() as i64 + 1;
            history.push(HistoryRow {
                id,
                username: normalize_username(&row.username),
                matchday: row.matchday,
                match_id: row.match_id,
                home_team: row.home_team.clone(),
                away_team: row.away_team.clone(),
                pick: row.pick,
                odds: row.odds,
                actual_result: row.actual_result,
                correct: row.correct,
                points_earned: row.points_earned,
                created_at: row.created_at,
                archived_at: Utc::now(),
            });
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn delete_live_predictions(&self, matchday: i32) -> Result<u64, StoreError> {
        if self.fail_next_delete.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Other(anyhow::anyhow!(
                "connection closed before delete"
            )));
        }
        let mut live = self.predictions.lock().unwrap();
        let before = live.len();
        live.retain(|p| p.matchday != matchday);
        Ok((before - live.len()) as u64)
    }

    async fn query_history(&self, username: Option<&str>) -> Result<Vec<HistoryRow>, StoreError> {
        let history = self.history.lock().unwrap();
        let username = username.map(normalize_username);
        let mut rows: Vec<HistoryRow> = history
            .iter()
            .filter(|h| username.as_deref().map_or(true, |u| h.username == u))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.matchday.cmp(&a.matchday).then(a.match_id.cmp(&b.match_id)));
        Ok(rows)
    }

    async fn query_matches(
        &self,
        season: &str,
        matchday: Option<i32>,
    ) -> Result<Vec<MatchRow>, StoreError> {
        let matches = self.matches.lock().unwrap();
        Ok(matches
            .iter()
            .filter(|m| m.season == season)
            .filter(|m| matchday.map_or(true, |md| m.matchday == md))
            .cloned()
            .collect())
    }

    async fn query_league_standings(&self) -> Result<Vec<LeagueRow>, StoreError> {
        Ok(Vec::new())
    }
}

fn bet(player: &str, matchday: &str, match_id: &str, pick: &str, odds: &str) -> SubmittedBet {
    SubmittedBet {
        player: player.to_string(),
        matchday: matchday.to_string(),
        match_id: match_id.to_string(),
        home_team: format!("Home {}", match_id),
        away_team: format!("Away {}", match_id),
        pick: Some(pick.to_string()),
        odds: odds.to_string(),
    }
}

fn fixture(match_id: i64, matchday: i32, status: MatchStatus) -> MatchRow {
    MatchRow {
        match_id,
        season: "2025-2026".to_string(),
        matchday,
        kickoff: Utc.with_ymd_and_hms(2026, 1, 10, 18, 0, 0).unwrap(),
        home_team_id: match_id * 10,
        home_team: format!("Home {}", match_id),
        away_team_id: match_id * 10 + 1,
        away_team: format!("Away {}", match_id),
        status,
        home_goals: None,
        away_goals: None,
        result: None,
        odds_home: Some(1.9),
        odds_draw: Some(3.3),
        odds_away: Some(4.1),
    }
}

#[tokio::test]
async fn test_submit_then_duplicate_rejected_any_casing() {
    let store = MemoryStore::default();

    let bets = vec![
        bet("Ana", "17", "1", "1", "1.85"),
        bet("Ana", "17", "2", "X", "3,25"),
    ];
    let receipt = submit_predictions(&store, &bets).await.unwrap();
    assert_eq!(receipt.username, "ana");
    assert_eq!(receipt.matches, 2);

    // Same player, shouting this time
    let again = vec![
        bet("ANA", "17", "1", "2", "4.10"),
        bet("ANA", "17", "2", "1", "1.95"),
    ];
    let err = submit_predictions(&store, &again).await.unwrap_err();
    assert!(matches!(err, SubmitError::AlreadySubmitted));

    // No extra rows were written
    let rows = store
        .query_predictions(PredictionQuery::for_user("ana"))
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].pick, Outcome::Home);
}

#[tokio::test]
async fn test_incomplete_batch_persists_nothing() {
    let store = MemoryStore::default();

    let mut bets = vec![
        bet("Ana", "17", "1", "1", "1.85"),
        bet("Ana", "17", "2", "X", "3.25"),
    ];
    bets[1].pick = None;

    let err = submit_predictions(&store, &bets).await.unwrap_err();
    assert!(matches!(err, SubmitError::IncompleteSelection(2)));

    let rows = store
        .query_predictions(PredictionQuery::default())
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_racing_duplicate_maps_to_already_submitted() {
    let store = MemoryStore::default();

    let bets = vec![bet("Ana", "17", "1", "1", "1.85")];
    submit_predictions(&store, &bets).await.unwrap();

    // Fast path sees nothing; only the unique constraint stands
    store.suppress_fast_path.store(true, Ordering::SeqCst);
    let err = submit_predictions(&store, &bets).await.unwrap_err();
    assert!(matches!(err, SubmitError::AlreadySubmitted));

    store.suppress_fast_path.store(false, Ordering::SeqCst);
    let rows = store
        .query_predictions(PredictionQuery::for_user("ana"))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn test_archive_scores_and_moves_rows() {
    let store = MemoryStore::default();

    let bets = vec![
        bet("Ana", "17", "1", "1", "1.85"),
        bet("Ana", "17", "2", "X", "3.25"),
    ];
    submit_predictions(&store, &bets).await.unwrap();
    let created_at = store
        .query_predictions(PredictionQuery::for_user("ana"))
        .await
        .unwrap()[0]
        .created_at;

    let results = vec![
        MatchResult {
            match_id: 1,
            result: Outcome::Home, // Ana called it
        },
        MatchResult {
            match_id: 2,
            result: Outcome::Away, // Ana missed
        },
    ];
    let report = scoring::archive_matchday(&store, 17, &results).await.unwrap();
    assert_eq!(report.archived, 2);
    assert_eq!(report.deleted, 2);

    let history = store.query_history(Some("ana")).await.unwrap();
    assert_eq!(history.len(), 2);

    let hit = history.iter().find(|h| h.match_id == 1).unwrap();
    assert_eq!(hit.correct, Some(true));
    assert_eq!(hit.points_earned, Some(1.85));
    assert_eq!(hit.actual_result, Some(Outcome::Home));
    assert_eq!(hit.created_at, created_at);

    let miss = history.iter().find(|h| h.match_id == 2).unwrap();
    assert_eq!(miss.correct, Some(false));
    assert_eq!(miss.points_earned, Some(0.0));

    // Live set is empty after the move
    let live = store
        .query_predictions(PredictionQuery::for_matchday(17))
        .await
        .unwrap();
    assert!(live.is_empty());
}

#[tokio::test]
async fn test_archive_unknown_result_stays_pending() {
    let store = MemoryStore::default();

    let bets = vec![
        bet("Ana", "17", "1", "1", "1.85"),
        bet("Ana", "17", "2", "2", "4.10"),
    ];
    submit_predictions(&store, &bets).await.unwrap();

    // Only match 1 has a final result
    let results = vec![MatchResult {
        match_id: 1,
        result: Outcome::Home,
    }];
    scoring::archive_matchday(&store, 17, &results).await.unwrap();

    let history = store.query_history(Some("Ana")).await.unwrap();
    let pending = history.iter().find(|h| h.match_id == 2).unwrap();
    assert_eq!(pending.actual_result, None);
    assert_eq!(pending.correct, None);
    assert_eq!(pending.points_earned, None);
}

#[tokio::test]
async fn test_archive_without_live_rows_is_noop() {
    let store = MemoryStore::default();
    let report = scoring::archive_matchday(&store, 17, &[]).await.unwrap();
    assert_eq!(report.archived, 0);
    assert_eq!(report.deleted, 0);
    assert!(store.query_history(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_archive_delete_failure_is_non_fatal_and_rerun_safe() {
    let store = MemoryStore::default();

    let bets = vec![bet("Ana", "17", "1", "1", "1.85")];
    submit_predictions(&store, &bets).await.unwrap();

    let results = vec![MatchResult {
        match_id: 1,
        result: Outcome::Home,
    }];

    // First run: history lands, delete blows up, call still succeeds
    store.fail_next_delete.store(true, Ordering::SeqCst);
    let report = scoring::archive_matchday(&store, 17, &results).await.unwrap();
    assert_eq!(report.archived, 1);
    assert_eq!(report.deleted, 0);
    assert_eq!(
        store
            .query_predictions(PredictionQuery::for_matchday(17))
            .await
            .unwrap()
            .len(),
        1
    );

    // Re-run: no duplicate history rows, live rows cleaned up this time
    let report = scoring::archive_matchday(&store, 17, &results).await.unwrap();
    assert_eq!(report.archived, 0);
    assert_eq!(report.deleted, 1);
    assert_eq!(store.query_history(None).await.unwrap().len(), 1);
    assert!(store
        .query_predictions(PredictionQuery::for_matchday(17))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_standings_from_archived_history() {
    let store = MemoryStore::default();

    submit_predictions(
        &store,
        &[
            bet("Ana", "1", "1", "1", "2.5"),
            bet("Ana", "1", "2", "X", "3.0"),
        ],
    )
    .await
    .unwrap();
    submit_predictions(&store, &[bet("Bob", "1", "1", "2", "1.8")])
        .await
        .unwrap();

    let results = vec![
        MatchResult {
            match_id: 1,
            result: Outcome::Home,
        },
        MatchResult {
            match_id: 2,
            result: Outcome::Away,
        },
    ];
    scoring::archive_matchday(&store, 1, &results).await.unwrap();

    let history = store.query_history(None).await.unwrap();
    let standings = scoring::compute_standings(&history);

    assert_eq!(standings.len(), 2);
    assert_eq!(standings[0].username, "ana");
    assert_eq!(standings[0].points, 2.5);
    assert_eq!(standings[1].username, "bob");
    assert_eq!(standings[1].points, 0.0);

    // Recomputing without intervening changes is identical
    let again = scoring::compute_standings(&store.query_history(None).await.unwrap());
    assert_eq!(standings, again);
}

#[tokio::test]
async fn test_current_matchday_through_store_default_impl() {
    let store = MemoryStore::default();
    {
        let mut matches = store.matches.lock().unwrap();
        matches.push(fixture(1, 1, MatchStatus::Finished));
        matches.push(fixture(2, 2, MatchStatus::Scheduled));
    }

    let current = store.query_current_matchday("2025-2026").await.unwrap();
    assert_eq!(current, Some(2));

    // Empty season resolves to nothing
    let none = store.query_current_matchday("1999-2000").await.unwrap();
    assert_eq!(none, None);
}
