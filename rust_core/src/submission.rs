//! Submission guard: at most one prediction batch per (player, matchday).
//!
//! Validation happens before any store access and rejects the whole batch —
//! there is no partial persistence. The existence check against the store is
//! only a fast path; the store's unique constraint is the authoritative
//! backstop, and a racing duplicate insert is reported with the same
//! "already submitted" signal as the fast path.

use crate::matchday::parse_matchday;
use crate::models::{NewPrediction, Outcome, SubmittedBet};
use crate::store::{PredictionStore, StoreError};
use crate::utils::{normalize_username, parse_decimal_odds};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("empty submission batch")]
    EmptyBatch,
    #[error("missing player or matchday")]
    MissingIdentity,
    #[error("mixed players or matchdays in one batch")]
    MixedBatch,
    #[error("invalid match id '{0}'")]
    InvalidMatchId(String),
    #[error("duplicate prediction for match {0}")]
    DuplicateMatch(i64),
    #[error("incomplete selection: no pick for match {0}")]
    IncompleteSelection(i64),
    #[error("invalid odds value '{0}'")]
    InvalidOdds(String),
    #[error("a bet for this matchday was already submitted")]
    AlreadySubmitted,
    #[error(transparent)]
    Store(StoreError),
}

impl SubmitError {
    /// True for errors the client caused (rejected before any write).
    pub fn is_validation(&self) -> bool {
        !matches!(self, SubmitError::AlreadySubmitted | SubmitError::Store(_))
    }
}

/// A batch that passed validation: one player, one matchday, a complete
/// pick and parsed odds for every match.
#[derive(Debug, Clone)]
pub struct ValidatedSubmission {
    /// Normalized player identity.
    pub username: String,
    pub matchday: i32,
    pub rows: Vec<NewPrediction>,
}

/// Confirmation returned once the whole batch is durably written.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitReceipt {
    pub username: String,
    pub matchday: i32,
    pub matches: usize,
}

/// Validate a submission batch without touching the store.
pub fn validate_batch(bets: &[SubmittedBet]) -> Result<ValidatedSubmission, SubmitError> {
    let first = bets.first().ok_or(SubmitError::EmptyBatch)?;

    let username = normalize_username(&first.player);
    let matchday = parse_matchday(&first.matchday);
    if username.is_empty() || matchday.is_none() {
        return Err(SubmitError::MissingIdentity);
    }
    let matchday = matchday.unwrap_or_default();

    let mut rows = Vec::with_capacity(bets.len());
    let mut seen_matches = HashSet::new();

    for bet in bets {
        if normalize_username(&bet.player) != username || parse_matchday(&bet.matchday) != Some(matchday)
        {
            return Err(SubmitError::MixedBatch);
        }

        let match_id: i64 = bet
            .match_id
            .trim()
            .parse()
            .map_err(|_| SubmitError::InvalidMatchId(bet.match_id.clone()))?;

        if !seen_matches.insert(match_id) {
            return Err(SubmitError::DuplicateMatch(match_id));
        }

        let pick = bet
            .pick
            .as_deref()
            .and_then(Outcome::parse)
            .ok_or(SubmitError::IncompleteSelection(match_id))?;

        let odds = parse_decimal_odds(&bet.odds)
            .ok_or_else(|| SubmitError::InvalidOdds(bet.odds.clone()))?;

        rows.push(NewPrediction {
            username: username.clone(),
            matchday,
            match_id,
            home_team: bet.home_team.clone(),
            away_team: bet.away_team.clone(),
            pick,
            odds,
        });
    }

    Ok(ValidatedSubmission {
        username,
        matchday,
        rows,
    })
}

/// Validate and persist a submission batch.
pub async fn submit_predictions(
    store: &dyn PredictionStore,
    bets: &[SubmittedBet],
) -> Result<SubmitReceipt, SubmitError> {
    let batch = validate_batch(bets)?;

    // Fast path; not atomic with the insert below.
    let already = store
        .has_submission(&batch.username, batch.matchday)
        .await
        .map_err(SubmitError::Store)?;
    if already {
        return Err(SubmitError::AlreadySubmitted);
    }

    match store.insert_predictions(&batch.rows).await {
        Ok(()) => {
            info!(
                "Saved bet from {} for matchday {} ({} matches)",
                batch.username,
                batch.matchday,
                batch.rows.len()
            );
            Ok(SubmitReceipt {
                username: batch.username,
                matchday: batch.matchday,
                matches: batch.rows.len(),
            })
        }
        // Lost the race against a concurrent submission: same signal as the
        // fast path.
        Err(StoreError::Conflict) => {
            warn!(
                "Concurrent duplicate submission from {} for matchday {}",
                batch.username, batch.matchday
            );
            Err(SubmitError::AlreadySubmitted)
        }
        Err(e) => Err(SubmitError::Store(e)),
    }
}
