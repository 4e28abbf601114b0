// Shared models for the quiniela services
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ============================================================================
// Outcome & Match Status Enums
// ============================================================================

/// A 1/X/2 call: home win, draw or away win.
///
/// Serialized with the legacy wire symbols (`"1"`, `"X"`, `"2"`), which are
/// also the values stored in the `pick`, `result` and `actual_result`
/// columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum Outcome {
    #[serde(rename = "1")]
    #[sqlx(rename = "1")]
    Home,
    #[serde(rename = "X")]
    #[sqlx(rename = "X")]
    Draw,
    #[serde(rename = "2")]
    #[sqlx(rename = "2")]
    Away,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Home => "1",
            Outcome::Draw => "X",
            Outcome::Away => "2",
        }
    }

    /// Parse a wire symbol. Accepts a lowercase `x` as a draw.
    pub fn parse(symbol: &str) -> Option<Self> {
        match symbol.trim() {
            "1" => Some(Outcome::Home),
            "X" | "x" => Some(Outcome::Draw),
            "2" => Some(Outcome::Away),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixture lifecycle as written by the results-ingestion process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Scheduled,
    Timed,
    InPlay,
    Paused,
    Finished,
}

impl MatchStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, MatchStatus::Finished)
    }
}

// ============================================================================
// Match Rows & Presentation Records
// ============================================================================

/// One fixture as stored in the `matches` table.
///
/// Goals, result and odds are nullable: results arrive as matches finish and
/// odds ingestion is best-effort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MatchRow {
    pub match_id: i64,
    pub season: String,
    pub matchday: i32,
    pub kickoff: DateTime<Utc>,
    pub home_team_id: i64,
    pub home_team: String,
    pub away_team_id: i64,
    pub away_team: String,
    pub status: MatchStatus,
    pub home_goals: Option<i32>,
    pub away_goals: Option<i32>,
    pub result: Option<Outcome>,
    pub odds_home: Option<f64>,
    pub odds_draw: Option<f64>,
    pub odds_away: Option<f64>,
}

impl MatchRow {
    /// Formatted score, or `None` while the match has not been played.
    pub fn score_string(&self) -> Option<String> {
        match (self.home_goals, self.away_goals) {
            (Some(h), Some(a)) => Some(format!("{} - {}", h, a)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamRef {
    pub id: i64,
    pub name: String,
}

/// Decimal odds shown to the player and snapshotted on submission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchOdds {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl MatchOdds {
    /// Fallbacks for missing or invalid ingested odds; display must never
    /// block on the odds feed.
    pub const FALLBACK: MatchOdds = MatchOdds {
        home: 2.0,
        draw: 3.25,
        away: 3.5,
    };
}

/// Frontend-friendly view of one fixture.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchInfo {
    pub id: i64,
    pub matchday: i32,
    /// Full round label, e.g. `"Regular season - 17"`.
    pub jornada: String,
    pub kickoff: DateTime<Utc>,
    pub home_team: TeamRef,
    pub away_team: TeamRef,
    pub status: MatchStatus,
    pub score: Option<String>,
    pub result: Option<Outcome>,
    pub odds: MatchOdds,
}

// ============================================================================
// Prediction Rows
// ============================================================================

/// A prediction entry ready to be persisted. The username must already be
/// normalized (see `utils::ident::normalize_username`).
#[derive(Debug, Clone, PartialEq)]
pub struct NewPrediction {
    pub username: String,
    pub matchday: i32,
    pub match_id: i64,
    pub home_team: String,
    pub away_team: String,
    pub pick: Outcome,
    pub odds: f64,
}

/// A live prediction entry as stored in the `predictions` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PredictionRow {
    pub id: i64,
    pub username: String,
    pub matchday: i32,
    pub match_id: i64,
    pub home_team: String,
    pub away_team: String,
    pub pick: Outcome,
    pub odds: f64,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// History Rows
// ============================================================================

/// An archived prediction with its outcome attached, ready for insertion.
///
/// `correct` and `points_earned` stay `None` while the actual result is
/// unknown. `created_at` carries the original submission timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryInsert {
    pub username: String,
    pub matchday: i32,
    pub match_id: i64,
    pub home_team: String,
    pub away_team: String,
    pub pick: Outcome,
    pub odds: f64,
    pub actual_result: Option<Outcome>,
    pub correct: Option<bool>,
    pub points_earned: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// An archived prediction as stored in the `predictions_history` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct HistoryRow {
    pub id: i64,
    pub username: String,
    pub matchday: i32,
    pub match_id: i64,
    pub home_team: String,
    pub away_team: String,
    pub pick: Outcome,
    pub odds: f64,
    pub actual_result: Option<Outcome>,
    pub correct: Option<bool>,
    pub points_earned: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub archived_at: DateTime<Utc>,
}

// ============================================================================
// Standings
// ============================================================================

/// One leaderboard row, recomputed from history on every read.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingsRow {
    pub rank: u32,
    pub username: String,
    pub points: f64,
    pub correct_predictions: u32,
    pub matchdays_played: u32,
}

/// One league-table row, maintained by an external process and read-only
/// here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeagueRow {
    pub position: i32,
    pub team_id: i64,
    pub team_name: String,
    pub played: i32,
    pub won: i32,
    pub drawn: i32,
    pub lost: i32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub goal_difference: i32,
    pub points: i32,
}

// ============================================================================
// Submission Wire Format
// ============================================================================

/// One entry of the submission request body, with the legacy field names the
/// frontend sends. Numeric fields arrive as strings or numbers depending on
/// the client, so they are deserialized leniently and validated by the
/// submission guard.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmittedBet {
    #[serde(rename = "jugador")]
    pub player: String,
    #[serde(rename = "jornada", deserialize_with = "string_or_number")]
    pub matchday: String,
    #[serde(rename = "idpartido", deserialize_with = "string_or_number")]
    pub match_id: String,
    #[serde(rename = "equipo_Local")]
    pub home_team: String,
    #[serde(rename = "equipo_Visitante")]
    pub away_team: String,
    #[serde(rename = "pronostico", default)]
    pub pick: Option<String>,
    #[serde(rename = "cuota", deserialize_with = "string_or_number")]
    pub odds: String,
}

/// Accept a JSON string or number and keep it as a string for validation.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(f) => f.to_string(),
    })
}
