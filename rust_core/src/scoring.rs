//! Scoring aggregator: archival, standings and history rollups.
//!
//! Archival moves a finished matchday's live predictions into history with
//! the actual result and points attached. Standings and the per-matchday
//! rollups are derived read models: they are recomputed from history on
//! every read, never stored.

use crate::models::{HistoryInsert, HistoryRow, MatchRow, Outcome, StandingsRow};
use crate::store::{PredictionQuery, PredictionStore, StoreError};
use crate::utils::{normalize_username, round_points};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{error, info};

// ============================================================================
// Pick Scoring
// ============================================================================

/// Score one pick against the actual result.
///
/// Unknown result: both values stay `None`. Known result: the pick earns its
/// snapshotted odds when correct and zero otherwise.
pub fn score_pick(
    pick: Outcome,
    odds: f64,
    actual: Option<Outcome>,
) -> (Option<bool>, Option<f64>) {
    match actual {
        None => (None, None),
        Some(result) => {
            let correct = pick == result;
            let points = if correct { odds } else { 0.0 };
            (Some(correct), Some(points))
        }
    }
}

// ============================================================================
// Matchday Archival
// ============================================================================

/// Final result of one match, as fed to the archival step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult {
    pub match_id: i64,
    pub result: Outcome,
}

/// Extract final results from fixture rows: finished matches with a known
/// outcome.
pub fn results_from_matches(rows: &[MatchRow]) -> Vec<MatchResult> {
    rows.iter()
        .filter(|m| m.status.is_finished())
        .filter_map(|m| {
            m.result.map(|result| MatchResult {
                match_id: m.match_id,
                result,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveReport {
    pub matchday: i32,
    pub archived: u64,
    pub deleted: u64,
}

/// Move a matchday's live predictions into history.
///
/// Matches without a known result are archived with an unknown outcome
/// rather than dropped. The delete of the live rows is best-effort: history
/// is already written, and the history table's uniqueness handling absorbs a
/// re-run after a partial failure.
pub async fn archive_matchday(
    store: &dyn PredictionStore,
    matchday: i32,
    results: &[MatchResult],
) -> Result<ArchiveReport, StoreError> {
    let live = store
        .query_predictions(PredictionQuery::for_matchday(matchday))
        .await?;

    if live.is_empty() {
        info!("No live predictions for matchday {}, nothing to archive", matchday);
        return Ok(ArchiveReport {
            matchday,
            archived: 0,
            deleted: 0,
        });
    }

    let result_by_match: HashMap<i64, Outcome> = results
        .iter()
        .map(|r| (r.match_id, r.result))
        .collect();

    let rows: Vec<HistoryInsert> = live
        .iter()
        .map(|p| {
            let actual = result_by_match.get(&p.match_id).copied();
            let (correct, points_earned) = score_pick(p.pick, p.odds, actual);
            HistoryInsert {
                username: p.username.clone(),
                matchday: p.matchday,
                match_id: p.match_id,
                home_team: p.home_team.clone(),
                away_team: p.away_team.clone(),
                pick: p.pick,
                odds: p.odds,
                actual_result: actual,
                correct,
                points_earned,
                created_at: p.created_at,
            }
        })
        .collect();

    let archived = store.insert_history(&rows).await?;

    let deleted = match store.delete_live_predictions(matchday).await {
        Ok(n) => n,
        Err(e) => {
            // History is already written; leaving stale live rows is
            // recoverable, losing archived points is not.
            error!(
                "Failed to delete live predictions for matchday {}: {}",
                matchday, e
            );
            0
        }
    };

    info!(
        "Archived matchday {}: {} history rows, {} live rows removed",
        matchday, archived, deleted
    );

    Ok(ArchiveReport {
        matchday,
        archived,
        deleted,
    })
}

// ============================================================================
// Standings
// ============================================================================

/// Compute the leaderboard from archived history.
///
/// Points: sum of `points_earned` over correct rows, rounded to two
/// decimals. Participation counts distinct matchdays, not rows. Order:
/// points descending, then correct predictions descending, then username —
/// a deterministic tie-break instead of incidental grouping order.
pub fn compute_standings(history: &[HistoryRow]) -> Vec<StandingsRow> {
    struct Acc {
        username: String,
        points: f64,
        correct: u32,
        matchdays: HashSet<i32>,
    }

    let mut groups: HashMap<String, Acc> = HashMap::new();
    for row in history {
        let key = normalize_username(&row.username);
        let acc = groups.entry(key.clone()).or_insert_with(|| Acc {
            username: key,
            points: 0.0,
            correct: 0,
            matchdays: HashSet::new(),
        });

        if row.correct == Some(true) {
            acc.points += row.points_earned.unwrap_or(0.0);
            acc.correct += 1;
        }
        acc.matchdays.insert(row.matchday);
    }

    let mut rows: Vec<StandingsRow> = groups
        .into_values()
        .map(|acc| StandingsRow {
            rank: 0,
            username: acc.username,
            points: round_points(acc.points),
            correct_predictions: acc.correct,
            matchdays_played: acc.matchdays.len() as u32,
        })
        .collect();

    rows.sort_by(|a, b| {
        b.points
            .total_cmp(&a.points)
            .then(b.correct_predictions.cmp(&a.correct_predictions))
            .then(a.username.cmp(&b.username))
    });

    for (index, row) in rows.iter_mut().enumerate() {
        row.rank = (index + 1) as u32;
    }

    rows
}

// ============================================================================
// History Rollups
// ============================================================================

/// Hit/miss/pending tally of one matchday.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchdayTally {
    #[serde(rename = "aciertos")]
    pub hits: u32,
    #[serde(rename = "fallos")]
    pub misses: u32,
    #[serde(rename = "pendientes")]
    pub pending: u32,
    #[serde(rename = "puntos")]
    pub points: f64,
}

/// One archived prediction line in the per-matchday view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryLine {
    #[serde(rename = "equipo_local")]
    pub home_team: String,
    #[serde(rename = "equipo_visitante")]
    pub away_team: String,
    #[serde(rename = "pronostico")]
    pub pick: Outcome,
    #[serde(rename = "cuota")]
    pub odds: f64,
    #[serde(rename = "resultado_real")]
    pub actual_result: Option<Outcome>,
    #[serde(rename = "acierto")]
    pub correct: Option<bool>,
}

/// One player's archived matchday with its tally.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchdaySummary {
    #[serde(rename = "jornada")]
    pub matchday: i32,
    #[serde(rename = "fecha")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(rename = "resumen")]
    pub tally: MatchdayTally,
    #[serde(rename = "partidos")]
    pub matches: Vec<HistoryLine>,
}

/// Group one player's history rows per matchday, newest first.
pub fn summarize_history(history: &[HistoryRow]) -> Vec<MatchdaySummary> {
    let mut grouped: BTreeMap<i32, MatchdaySummary> = BTreeMap::new();

    for row in history {
        let entry = grouped.entry(row.matchday).or_insert_with(|| MatchdaySummary {
            matchday: row.matchday,
            submitted_at: Some(row.created_at),
            tally: MatchdayTally {
                hits: 0,
                misses: 0,
                pending: 0,
                points: 0.0,
            },
            matches: Vec::new(),
        });

        if row.created_at < entry.submitted_at.unwrap_or(row.created_at) {
            entry.submitted_at = Some(row.created_at);
        }

        match row.correct {
            Some(true) => {
                entry.tally.hits += 1;
                entry.tally.points += row.points_earned.unwrap_or(0.0);
            }
            Some(false) => entry.tally.misses += 1,
            None => entry.tally.pending += 1,
        }

        entry.matches.push(HistoryLine {
            home_team: row.home_team.clone(),
            away_team: row.away_team.clone(),
            pick: row.pick,
            odds: row.odds,
            actual_result: row.actual_result,
            correct: row.correct,
        });
    }

    grouped
        .into_values()
        .rev()
        .map(|mut summary| {
            summary.tally.points = round_points(summary.tally.points);
            summary
        })
        .collect()
}

/// One player's point total for one matchday.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchdayPoints {
    #[serde(rename = "jornada")]
    pub matchday: i32,
    #[serde(rename = "puntos")]
    pub points: f64,
    #[serde(rename = "aciertos")]
    pub hits: u32,
}

/// Per-matchday point totals of one player's history, newest first.
pub fn points_by_matchday(history: &[HistoryRow]) -> Vec<MatchdayPoints> {
    let mut grouped: BTreeMap<i32, MatchdayPoints> = BTreeMap::new();

    for row in history {
        let entry = grouped.entry(row.matchday).or_insert_with(|| MatchdayPoints {
            matchday: row.matchday,
            points: 0.0,
            hits: 0,
        });
        if row.correct == Some(true) {
            entry.points += row.points_earned.unwrap_or(0.0);
            entry.hits += 1;
        }
    }

    grouped
        .into_values()
        .rev()
        .map(|mut entry| {
            entry.points = round_points(entry.points);
            entry
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchStatus;

    fn history_row(
        id: i64,
        username: &str,
        matchday: i32,
        correct: Option<bool>,
        points_earned: Option<f64>,
    ) -> HistoryRow {
        HistoryRow {
            id,
            username: username.to_string(),
            matchday,
            match_id: id,
            home_team: "Local".to_string(),
            away_team: "Visitante".to_string(),
            pick: Outcome::Home,
            odds: points_earned.filter(|p| *p > 0.0).unwrap_or(2.0),
            actual_result: correct.map(|c| if c { Outcome::Home } else { Outcome::Away }),
            correct,
            points_earned,
            created_at: Utc::now(),
            archived_at: Utc::now(),
        }
    }

    #[test]
    fn test_score_pick() {
        assert_eq!(
            score_pick(Outcome::Home, 1.85, Some(Outcome::Home)),
            (Some(true), Some(1.85))
        );
        assert_eq!(
            score_pick(Outcome::Draw, 3.25, Some(Outcome::Away)),
            (Some(false), Some(0.0))
        );
        assert_eq!(score_pick(Outcome::Away, 4.0, None), (None, None));
    }

    #[test]
    fn test_results_from_matches_skips_unfinished() {
        let finished = MatchRow {
            match_id: 1,
            season: "2025-2026".to_string(),
            matchday: 1,
            kickoff: Utc::now(),
            home_team_id: 10,
            home_team: "A".to_string(),
            away_team_id: 11,
            away_team: "B".to_string(),
            status: MatchStatus::Finished,
            home_goals: Some(1),
            away_goals: Some(1),
            result: Some(Outcome::Draw),
            odds_home: None,
            odds_draw: None,
            odds_away: None,
        };
        let mut in_play = finished.clone();
        in_play.match_id = 2;
        in_play.status = MatchStatus::InPlay;
        in_play.result = None;
        // Finished but the result column has not landed yet
        let mut finished_no_result = finished.clone();
        finished_no_result.match_id = 3;
        finished_no_result.result = None;

        let results = results_from_matches(&[finished, in_play, finished_no_result]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].match_id, 1);
        assert_eq!(results[0].result, Outcome::Draw);
    }

    #[test]
    fn test_standings_worked_example() {
        let history = vec![
            history_row(1, "ana", 1, Some(true), Some(2.5)),
            history_row(2, "ana", 2, Some(false), Some(0.0)),
            history_row(3, "bob", 1, Some(true), Some(1.8)),
        ];

        let standings = compute_standings(&history);
        assert_eq!(standings.len(), 2);

        assert_eq!(standings[0].rank, 1);
        assert_eq!(standings[0].username, "ana");
        assert_eq!(standings[0].points, 2.5);
        assert_eq!(standings[0].correct_predictions, 1);
        assert_eq!(standings[0].matchdays_played, 2);

        assert_eq!(standings[1].rank, 2);
        assert_eq!(standings[1].username, "bob");
        assert_eq!(standings[1].points, 1.8);
        assert_eq!(standings[1].correct_predictions, 1);
        assert_eq!(standings[1].matchdays_played, 1);
    }

    #[test]
    fn test_standings_case_insensitive_grouping() {
        let history = vec![
            history_row(1, "Ana", 1, Some(true), Some(2.0)),
            history_row(2, "ANA", 2, Some(true), Some(1.5)),
        ];

        let standings = compute_standings(&history);
        assert_eq!(standings.len(), 1);
        assert_eq!(standings[0].username, "ana");
        assert_eq!(standings[0].points, 3.5);
        assert_eq!(standings[0].matchdays_played, 2);
    }

    #[test]
    fn test_standings_pending_rows_count_participation_only() {
        let history = vec![
            history_row(1, "ana", 1, Some(true), Some(2.0)),
            history_row(2, "ana", 3, None, None),
        ];

        let standings = compute_standings(&history);
        assert_eq!(standings[0].points, 2.0);
        assert_eq!(standings[0].correct_predictions, 1);
        assert_eq!(standings[0].matchdays_played, 2);
    }

    #[test]
    fn test_standings_tie_break() {
        // Same points; carol has more correct picks, dave and erin fall back
        // to name order.
        let history = vec![
            history_row(1, "dave", 1, Some(true), Some(3.0)),
            history_row(2, "carol", 1, Some(true), Some(1.5)),
            history_row(3, "carol", 2, Some(true), Some(1.5)),
            history_row(4, "erin", 1, Some(true), Some(3.0)),
        ];

        let standings = compute_standings(&history);
        assert_eq!(standings[0].username, "carol");
        assert_eq!(standings[1].username, "dave");
        assert_eq!(standings[2].username, "erin");
        assert_eq!(standings[1].rank, 2);
        assert_eq!(standings[2].rank, 3);
    }

    #[test]
    fn test_standings_rounding() {
        let history = vec![
            history_row(1, "ana", 1, Some(true), Some(1.1)),
            history_row(2, "ana", 1, Some(true), Some(2.2)),
            history_row(3, "ana", 2, Some(true), Some(0.333)),
        ];

        let standings = compute_standings(&history);
        assert_eq!(standings[0].points, 3.63);
    }

    #[test]
    fn test_standings_idempotent() {
        let history = vec![
            history_row(1, "ana", 1, Some(true), Some(2.5)),
            history_row(2, "bob", 1, Some(true), Some(1.8)),
            history_row(3, "bob", 2, Some(true), Some(2.1)),
        ];

        let first = compute_standings(&history);
        let second = compute_standings(&history);
        assert_eq!(first, second);
    }

    #[test]
    fn test_summarize_history_groups_and_tallies() {
        let history = vec![
            history_row(1, "ana", 2, Some(true), Some(1.85)),
            history_row(2, "ana", 2, Some(false), Some(0.0)),
            history_row(3, "ana", 2, None, None),
            history_row(4, "ana", 1, Some(true), Some(2.4)),
        ];

        let summaries = summarize_history(&history);
        assert_eq!(summaries.len(), 2);

        // Newest matchday first
        assert_eq!(summaries[0].matchday, 2);
        assert_eq!(summaries[0].tally.hits, 1);
        assert_eq!(summaries[0].tally.misses, 1);
        assert_eq!(summaries[0].tally.pending, 1);
        assert_eq!(summaries[0].tally.points, 1.85);
        assert_eq!(summaries[0].matches.len(), 3);

        assert_eq!(summaries[1].matchday, 1);
        assert_eq!(summaries[1].tally.points, 2.4);
    }

    #[test]
    fn test_points_by_matchday() {
        let history = vec![
            history_row(1, "ana", 1, Some(true), Some(2.0)),
            history_row(2, "ana", 1, Some(false), Some(0.0)),
            history_row(3, "ana", 2, Some(true), Some(1.5)),
            history_row(4, "ana", 2, Some(true), Some(1.5)),
        ];

        let points = points_by_matchday(&history);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].matchday, 2);
        assert_eq!(points[0].points, 3.0);
        assert_eq!(points[0].hits, 2);
        assert_eq!(points[1].matchday, 1);
        assert_eq!(points[1].points, 2.0);
        assert_eq!(points[1].hits, 1);
    }
}
