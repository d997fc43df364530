//! Decide whether a finished run deserves the top-3 celebration.

use std::time::Duration;

use serde_json::Map;
use tracing::{debug, warn};

use crate::{
    error::ServiceError,
    rank::{self, TOP_K},
    services::leaderboard_service,
    state::SharedState,
};

/// How long to wait for the identity provider's first answer before treating
/// the session as signed out.
const AUTH_RESOLVE_WAIT: Duration = Duration::from_millis(180);

/// Verdict of a celebration check.
#[derive(Debug, Clone, Copy)]
pub struct CelebrationOutcome {
    /// Whether the score enters the current top-3.
    pub celebrate: bool,
    /// Whether the score was also recorded by the best-effort auto-save.
    pub saved: bool,
}

/// Check a score against the game's current top-3 and, when it qualifies,
/// record the score.
///
/// Signed-out sessions never celebrate. The auto-save is best-effort: a
/// failed write still celebrates, since the player earned the moment either
/// way.
pub async fn check_and_celebrate(
    state: &SharedState,
    game_id: &str,
    score: f64,
) -> Result<CelebrationOutcome, ServiceError> {
    if state.config().game(game_id).is_none() {
        return Err(ServiceError::NotFound(format!("unknown game `{game_id}`")));
    }
    let score = rank::normalize_score(score).ok_or(ServiceError::InvalidScore)?;

    // Give a still-resolving session a beat before deciding it is signed out.
    let _ = state.auth().wait_known(AUTH_RESOLVE_WAIT).await;
    if state.provider().current_identity().is_none() {
        debug!(game_id, score, "celebration skipped; no signed-in identity");
        return Ok(CelebrationOutcome {
            celebrate: false,
            saved: false,
        });
    }

    // The lock is taken before the ranking check: one verdict per
    // (game, score) pair per session, qualifying or not.
    if !state.celebration_guard(game_id, score) {
        return Ok(CelebrationOutcome {
            celebrate: false,
            saved: false,
        });
    }

    let rows = leaderboard_service::get_top_scores(state, game_id, Some(TOP_K), false).await;
    let qualifies = rows.len() < TOP_K || rows.last().is_none_or(|worst| score > worst.score);
    if !qualifies {
        return Ok(CelebrationOutcome {
            celebrate: false,
            saved: false,
        });
    }

    let saved = match leaderboard_service::save_score(state, game_id, None, score, Map::new()).await
    {
        Ok(_) => true,
        Err(err) => {
            warn!(game_id, score, error = %err, "celebration auto-save failed");
            false
        }
    };

    Ok(CelebrationOutcome {
        celebrate: true,
        saved,
    })
}
