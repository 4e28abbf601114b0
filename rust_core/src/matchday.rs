//! Matchday resolution and fixture presentation.
//!
//! The "active" matchday is the earliest round that still has an unfinished
//! match. Once the whole season is finished the last round stays on display
//! rather than showing nothing.

use crate::models::{MatchInfo, MatchOdds, MatchRow, TeamRef};

const LABEL_PREFIX: &str = "Regular season - ";

/// Full round label as the frontend and legacy store rows carry it.
pub fn format_matchday_label(matchday: i32) -> String {
    format!("{}{}", LABEL_PREFIX, matchday)
}

/// Parse a matchday from either a bare ordinal (`"17"`) or the full label
/// (`"Regular season - 17"`).
pub fn parse_matchday(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    let ordinal = trimmed.strip_prefix(LABEL_PREFIX).unwrap_or(trimmed);
    ordinal.trim().parse().ok()
}

/// Determine the active matchday from a season's fixtures.
pub fn resolve_current_matchday(rows: &[MatchRow]) -> Option<i32> {
    if rows.is_empty() {
        return None;
    }

    rows.iter()
        .filter(|m| !m.status.is_finished())
        .map(|m| m.matchday)
        .min()
        .or_else(|| rows.iter().map(|m| m.matchday).max())
}

/// Reshape fixtures into presentation records, ordered by kickoff.
///
/// Missing or non-positive odds fall back to fixed defaults so a gap in the
/// odds feed never blocks the matchday display.
pub fn present_matches(rows: &[MatchRow]) -> Vec<MatchInfo> {
    let mut rows: Vec<&MatchRow> = rows.iter().collect();
    rows.sort_by(|a, b| a.kickoff.cmp(&b.kickoff).then(a.match_id.cmp(&b.match_id)));

    rows.into_iter().map(present_match).collect()
}

fn present_match(row: &MatchRow) -> MatchInfo {
    MatchInfo {
        id: row.match_id,
        matchday: row.matchday,
        jornada: format_matchday_label(row.matchday),
        kickoff: row.kickoff,
        home_team: TeamRef {
            id: row.home_team_id,
            name: row.home_team.clone(),
        },
        away_team: TeamRef {
            id: row.away_team_id,
            name: row.away_team.clone(),
        },
        status: row.status,
        score: row.score_string(),
        result: row.result,
        odds: MatchOdds {
            home: odds_or(row.odds_home, MatchOdds::FALLBACK.home),
            draw: odds_or(row.odds_draw, MatchOdds::FALLBACK.draw),
            away: odds_or(row.odds_away, MatchOdds::FALLBACK.away),
        },
    }
}

fn odds_or(value: Option<f64>, fallback: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 1.0 => v,
        _ => fallback,
    }
}
