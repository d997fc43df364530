//! Nickname changes: rate limiting, the profile write, and the rename
//! fan-out over historical leaderboard entries.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::warn;

use crate::{
    dao::{
        identity::Identity,
        models::{ProfileUpdateEntity, now_millis},
        rank_store::RankStore,
    },
    error::ServiceError,
    rank,
    services::{nickname_limit, snapshot_service},
    state::SharedState,
};

/// Concurrent per-game rename passes during the fan-out.
const RENAME_CONCURRENCY: usize = 3;

/// Result of an accepted nickname change.
#[derive(Debug, Clone)]
pub struct NicknameOutcome {
    pub nickname: String,
    /// Whether the profile store took the write (false means the identity
    /// provider's display name was updated instead).
    pub wrote_server: bool,
    /// Per-game result of the rename fan-out, in no particular order.
    pub renames: Vec<GameRename>,
}

impl NicknameOutcome {
    /// Historical leaderboard entries renamed across the catalog.
    pub fn renamed_entries(&self) -> usize {
        self.renames.iter().map(|r| r.renamed).sum()
    }
}

/// Outcome of the rename pass over one game. A failed pass is reported,
/// never propagated; the nickname change itself stands regardless.
#[derive(Debug, Clone)]
pub struct GameRename {
    pub game_id: String,
    pub renamed: usize,
    pub error: Option<String>,
}

/// Stored nickname for an identity, read through the in-process cache.
/// Best-effort: a storage failure reads as "no stored nickname".
pub async fn server_nickname(state: &SharedState, uid: &str) -> Option<String> {
    if let Some(cached) = state.cached_nickname(uid) {
        return Some(cached);
    }

    let store = state.rank_store().await?;
    match store.read_profile(uid).await {
        Ok(profile) => {
            let nickname = profile
                .nickname
                .map(|n| rank::normalize_nickname(&n))
                .filter(|n| !n.is_empty())?;
            state.cache_nickname(uid, &nickname);
            Some(nickname)
        }
        Err(err) => {
            warn!(uid, error = %err, "profile read failed; treating nickname as unset");
            None
        }
    }
}

/// Name to put on a score for a signed-in player: stored nickname first,
/// then the provider's display name, then the placeholder.
pub async fn preferred_display_name(state: &SharedState, identity: &Identity) -> String {
    match server_nickname(state, &identity.uid).await {
        Some(nickname) => nickname,
        None => rank::sanitize_name(&identity.display_name),
    }
}

/// Change the signed-in player's nickname.
///
/// The profile store is the preferred destination; when it rejects the
/// write the change degrades to the identity provider's display name,
/// accounted against the device-local limiter ledger instead of the
/// server-side one. Renaming the same nickname again is a no-op that
/// consumes no quota.
pub async fn set_nickname(
    state: &SharedState,
    requested: &str,
) -> Result<NicknameOutcome, ServiceError> {
    let identity = state
        .provider()
        .current_identity()
        .ok_or(ServiceError::AuthRequired)?;

    let nickname = rank::normalize_nickname(requested);
    if nickname.is_empty() {
        return Err(ServiceError::InvalidName(
            "nickname is empty after trimming".to_owned(),
        ));
    }

    let store = state
        .ensure_remote()
        .await
        .ok_or(ServiceError::RemoteUnavailable)?;

    // Compare against the name the player already renders under, stored
    // nickname or provider name; repeating it consumes no quota.
    if preferred_display_name(state, &identity).await == nickname {
        return Ok(NicknameOutcome {
            nickname,
            wrote_server: false,
            renames: Vec::new(),
        });
    }

    let now = now_millis();
    let config = state.config();

    let server_meta = match store.read_profile(&identity.uid).await {
        Ok(profile) => profile.nickname_limit.unwrap_or_default(),
        Err(err) => {
            warn!(uid = %identity.uid, error = %err, "limiter read failed; using empty state");
            Default::default()
        }
    };
    let advanced = nickname_limit::check_limit(
        &server_meta,
        now,
        config.nickname_cooldown_ms,
        config.nickname_daily_limit,
    )?;

    let update = ProfileUpdateEntity {
        nickname: nickname.clone(),
        updated_at: now,
        email: identity.email.clone(),
        nickname_limit: Some(advanced.clone()),
    };

    let wrote_server = match store.update_profile(&identity.uid, update).await {
        Ok(()) => {
            state.local().set_nickname_limit(&identity.uid, &advanced);
            true
        }
        Err(err) => {
            warn!(uid = %identity.uid, error = %err, "profile write failed; degrading to provider");

            // The server ledger is unreachable, so account against the
            // device-local one before touching the provider profile.
            let local_meta = state.local().nickname_limit(&identity.uid);
            let advanced = nickname_limit::check_limit(
                &local_meta,
                now,
                config.nickname_cooldown_ms,
                config.nickname_daily_limit,
            )?;

            match state.provider().update_display_name(nickname.clone()).await {
                Ok(()) => {
                    state.local().set_nickname_limit(&identity.uid, &advanced);
                    false
                }
                Err(provider_err) => {
                    warn!(uid = %identity.uid, error = %provider_err, "provider rename failed");
                    return Err(ServiceError::NicknameSaveFailed);
                }
            }
        }
    };

    state.cache_nickname(&identity.uid, &nickname);
    state.local().set_last_player_name(&nickname);

    // Historical entries are renamed on both paths; only the snapshot
    // refresh is tied to the profile write landing server-side.
    let renames =
        rename_across_catalog(state, &store, &identity.uid, &nickname, wrote_server).await;

    Ok(NicknameOutcome {
        nickname,
        wrote_server,
        renames,
    })
}

/// Rewrite the player's historical entries in every cataloged game, a few
/// games at a time, refreshing each touched game's snapshot. Per-game
/// failures are collected, never propagated.
async fn rename_across_catalog(
    state: &SharedState,
    store: &Arc<dyn RankStore>,
    uid: &str,
    nickname: &str,
    refresh_snapshots: bool,
) -> Vec<GameRename> {
    let game_ids: Vec<String> = state.config().games.keys().cloned().collect();

    stream::iter(game_ids)
        .map(|game_id| {
            let state = state.clone();
            let store = store.clone();
            let uid = uid.to_owned();
            let nickname = nickname.to_owned();
            async move {
                rename_game_entries(&state, &store, game_id, &uid, &nickname, refresh_snapshots)
                    .await
            }
        })
        .buffer_unordered(RENAME_CONCURRENCY)
        .collect()
        .await
}

async fn rename_game_entries(
    state: &SharedState,
    store: &Arc<dyn RankStore>,
    game_id: String,
    uid: &str,
    nickname: &str,
    refresh_snapshot: bool,
) -> GameRename {
    let entries = match store.entries_by_identity(&game_id, uid).await {
        Ok(entries) => entries,
        Err(err) => {
            warn!(game_id, uid, error = %err, "rename scan failed");
            return GameRename {
                game_id,
                renamed: 0,
                error: Some(err.to_string()),
            };
        }
    };

    let renames: Vec<(String, String)> = entries
        .into_iter()
        .filter(|entry| entry.name != nickname)
        .map(|entry| (entry.id, nickname.to_owned()))
        .collect();

    if renames.is_empty() {
        return GameRename {
            game_id,
            renamed: 0,
            error: None,
        };
    }
    let count = renames.len();

    if let Err(err) = store.rename_entries(&game_id, renames).await {
        warn!(game_id, uid, error = %err, "rename patch failed");
        return GameRename {
            game_id,
            renamed: 0,
            error: Some(err.to_string()),
        };
    }

    if refresh_snapshot {
        snapshot_service::refresh_for_game(state, store, &game_id).await;
    }
    GameRename {
        game_id,
        renamed: count,
        error: None,
    }
}
