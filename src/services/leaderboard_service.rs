//! Read and write paths over the tiered leaderboard stores.
//!
//! Reads are cache-first: the persisted device cache answers immediately when
//! it has rows, then the shared snapshot (bulk reads), then a ranked remote
//! query, then the local fallback history. Reads never fail. Writes prefer
//! the remote tier; once the remote tier is reachable a failed append is
//! surfaced, never silently absorbed into the local tier.

use futures::future::join_all;
use indexmap::IndexMap;
use serde_json::Map;
use tracing::warn;

use crate::{
    dao::{
        identity::PROVIDER_LABEL,
        local,
        models::{NewScoreEntry, ScoreEntryEntity, now_millis},
    },
    error::ServiceError,
    rank::{self, DEFAULT_PLAYER_NAME, TOP_K},
    services::{nickname_service, snapshot_service},
    state::SharedState,
};

/// Which tier ultimately served or absorbed an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreSource {
    Remote,
    Local,
}

/// A score accepted by [`save_score`].
#[derive(Debug, Clone)]
pub struct SavedEntry {
    pub entry: ScoreEntryEntity,
    pub source: ScoreSource,
}

/// Result of a pruning pass over one game.
#[derive(Debug, Clone)]
pub struct PruneOutcome {
    /// The surviving top entries, in ranked order.
    pub kept: Vec<ScoreEntryEntity>,
    pub deleted: usize,
    pub source: ScoreSource,
}

/// Result of the administrative full wipe.
#[derive(Debug, Clone, Copy)]
pub struct ClearOutcome {
    pub remote_cleared: bool,
    pub local_cleared: bool,
}

/// Which tiers fed a bulk read, as a stable wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleMode {
    /// Nothing was requested.
    None,
    /// Every game answered from the persisted device cache.
    LocalCache,
    /// Direct ranked reads served the request without the shared snapshot
    /// contributing anything.
    Bundle,
    /// The shared snapshot served every game.
    BundleTop3Cache,
    /// Device cache plus the shared snapshot, nothing missing.
    BundleTop3LocalCache,
    /// The shared snapshot contributed but some games needed a direct read.
    Top3CacheFallback,
}

impl BundleMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BundleMode::None => "none",
            BundleMode::LocalCache => "local-cache",
            BundleMode::Bundle => "bundle",
            BundleMode::BundleTop3Cache => "bundle(top3-cache)",
            BundleMode::BundleTop3LocalCache => "bundle(top3-cache + local-cache)",
            BundleMode::Top3CacheFallback => "bundle(top3-cache + fallback)",
        }
    }
}

/// Bulk read across several games with its provenance tag.
#[derive(Debug, Clone)]
pub struct BundleOutcome {
    pub games: IndexMap<String, Vec<ScoreEntryEntity>>,
    pub mode: BundleMode,
}

/// Top entries for one game, best available tier. Infallible: an outage
/// degrades to cached or locally recorded rows, worst case an empty list.
///
/// Unless `force_refresh` is set, a non-empty persisted cache answers top-K
/// sized reads without touching the remote tier. Larger limits always bypass
/// the cache, which only ever holds K rows.
pub async fn get_top_scores(
    state: &SharedState,
    game_id: &str,
    limit: Option<usize>,
    force_refresh: bool,
) -> Vec<ScoreEntryEntity> {
    let limit = rank::clamp_limit(limit);

    if !force_refresh && limit <= TOP_K {
        if let Some(cached) = state
            .local()
            .persisted_top(game_id, limit)
            .filter(|cached| !cached.is_empty())
        {
            return cached;
        }
    }

    if let Some(store) = state.ensure_remote().await {
        match store.query_top_by_score(game_id, limit).await {
            Ok(entries) => {
                let (kept, _) = rank::select_top_k(rank::sort_entries(entries), limit);
                // An empty result leaves any stale cache in place.
                if limit <= TOP_K && !kept.is_empty() {
                    state.local().set_persisted_top(game_id, &kept);
                }
                return kept;
            }
            Err(err) => {
                warn!(game_id, error = %err, "remote top query failed; falling back");
            }
        }
    }

    let (kept, _) = rank::select_top_k(
        rank::sort_entries(state.local().game_entries(game_id)),
        limit,
    );
    if limit <= TOP_K && !kept.is_empty() {
        state.local().set_persisted_top(game_id, &kept);
    }
    kept
}

/// Record a score, write-gated when the remote tier is in play.
///
/// A signed-in player's display name always resolves through their stored
/// nickname (then the provider's name); the request's explicit name only
/// applies to anonymous writes, falling back to the name last used on this
/// device, then the placeholder.
pub async fn save_score(
    state: &SharedState,
    game_id: &str,
    name: Option<&str>,
    score: f64,
    extra: Map<String, serde_json::Value>,
) -> Result<SavedEntry, ServiceError> {
    let score = rank::normalize_score(score).ok_or(ServiceError::InvalidScore)?;
    let identity = state.provider().current_identity();

    let display_name = match &identity {
        Some(identity) => nickname_service::preferred_display_name(state, identity).await,
        None => match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(explicit) => rank::sanitize_name(explicit),
            None => state
                .local()
                .last_player_name()
                .map(|n| rank::sanitize_name(&n))
                .unwrap_or_else(|| DEFAULT_PLAYER_NAME.to_owned()),
        },
    };
    state.local().set_last_player_name(&display_name);
    let ts = now_millis();

    if let Some(store) = state.ensure_remote().await {
        if state.config().require_auth_for_write && identity.is_none() {
            return Err(ServiceError::AuthRequired);
        }

        let new_entry = NewScoreEntry {
            game_id: game_id.to_owned(),
            name: display_name.clone(),
            score,
            ts,
            uid: identity.as_ref().map(|i| i.uid.clone()),
            photo_url: identity
                .as_ref()
                .map(|i| i.photo_url.clone())
                .filter(|url| !url.is_empty()),
            provider: identity.as_ref().map(|_| PROVIDER_LABEL.to_owned()),
            extra: extra.clone(),
        };

        // While the remote tier is reachable the write policy stays strict:
        // an append failure surfaces instead of landing local-only data that
        // could never reconcile.
        let key = store.append_entry(new_entry).await?;

        // Keep the collection bounded and the shared snapshot fresh.
        if let Err(err) = prune_game_rankings(state, game_id, None).await {
            warn!(game_id, error = %err, "post-save prune failed");
        }

        let entity = ScoreEntryEntity {
            id: key,
            game_id: game_id.to_owned(),
            name: display_name,
            score,
            ts,
            uid: identity.map(|i| i.uid),
            extra,
        };
        return Ok(SavedEntry {
            entry: entity,
            source: ScoreSource::Remote,
        });
    }

    if state.config().require_auth_for_write {
        return Err(ServiceError::RemoteUnavailable);
    }

    let entity = ScoreEntryEntity {
        id: local::synthetic_entry_id(),
        game_id: game_id.to_owned(),
        name: display_name,
        score,
        ts,
        uid: None,
        extra,
    };
    let kept = state.local().push_entry(entity.clone(), TOP_K);
    state.local().set_persisted_top(game_id, &kept);
    Ok(SavedEntry {
        entry: entity,
        source: ScoreSource::Local,
    })
}

/// Delete everything beyond the top `keep` entries of one game, returning
/// the survivors.
///
/// Remote deletes run in parallel and are not transactional: a save racing
/// this pass can leave more than `keep` rows behind, which the next pass
/// picks up.
pub async fn prune_game_rankings(
    state: &SharedState,
    game_id: &str,
    keep: Option<usize>,
) -> Result<PruneOutcome, ServiceError> {
    let keep = rank::clamp_limit(keep);

    if let Some(store) = state.ensure_remote().await {
        match store.fetch_game_entries(game_id).await {
            Ok(entries) => {
                let (kept, dropped) = rank::select_top_k(rank::sort_entries(entries), keep);

                let results =
                    join_all(dropped.iter().map(|e| store.delete_entry(game_id, &e.id))).await;
                let mut deleted = 0;
                for (entry, result) in dropped.iter().zip(results) {
                    match result {
                        Ok(()) => deleted += 1,
                        Err(err) => {
                            warn!(game_id, key = %entry.id, error = %err, "prune delete failed");
                        }
                    }
                }

                snapshot_service::refresh_for_game(state, &store, game_id).await;

                return Ok(PruneOutcome {
                    kept,
                    deleted,
                    source: ScoreSource::Remote,
                });
            }
            Err(err) => {
                warn!(game_id, error = %err, "remote scan failed; pruning local tier only");
            }
        }
    }

    let before = state.local().game_entries(game_id).len();
    let kept = state.local().prune_game(game_id, keep);
    let deleted = before.saturating_sub(kept.len());
    Ok(PruneOutcome {
        kept,
        deleted,
        source: ScoreSource::Local,
    })
}

/// Top entries for several games in one pass.
///
/// Tier walk per game: persisted device cache (unless forced), then the
/// shared snapshot for whatever is still missing, then a forced single-game
/// read. The mode tag reports which tiers ended up contributing.
pub async fn get_top_scores_bundle(
    state: &SharedState,
    game_ids: &[String],
    limit: Option<usize>,
    force_refresh: bool,
) -> BundleOutcome {
    let limit = rank::clamp_limit(limit);

    let mut resolved: IndexMap<String, Vec<ScoreEntryEntity>> =
        IndexMap::with_capacity(game_ids.len());
    let mut mode = BundleMode::None;
    let mut missing: Vec<String> = Vec::new();

    for game_id in game_ids {
        if !force_refresh && limit <= TOP_K {
            if let Some(cached) = state
                .local()
                .persisted_top(game_id, limit)
                .filter(|cached| !cached.is_empty())
            {
                resolved.insert(game_id.clone(), cached);
                mode = BundleMode::LocalCache;
                continue;
            }
        }
        missing.push(game_id.clone());
    }

    // The snapshot only ever holds K rows, so larger limits skip straight
    // to the direct reads.
    if !missing.is_empty() && limit <= TOP_K {
        if let Some(store) = state.ensure_remote().await {
            match snapshot_service::read_bundle(state, &store).await {
                Ok(decoded) => {
                    let mut snapshot_hit = false;
                    for game_id in &missing {
                        let Some(rows) = decoded.get(game_id).filter(|rows| !rows.is_empty())
                        else {
                            continue;
                        };
                        let (kept, _) = rank::select_top_k(rows.clone(), limit);
                        resolved.insert(game_id.clone(), kept);
                        snapshot_hit = true;
                    }
                    if snapshot_hit {
                        mode = if mode == BundleMode::LocalCache {
                            BundleMode::BundleTop3LocalCache
                        } else {
                            BundleMode::BundleTop3Cache
                        };
                    }
                }
                Err(err) => {
                    warn!(error = %err, "snapshot bundle read failed; falling back");
                }
            }
        }
    }

    let still_missing: Vec<String> = missing
        .into_iter()
        .filter(|game_id| !resolved.contains_key(game_id))
        .collect();
    if !still_missing.is_empty() {
        let fetched = join_all(
            still_missing
                .iter()
                .map(|game_id| get_top_scores(state, game_id, Some(limit), true)),
        )
        .await;
        for (game_id, rows) in still_missing.into_iter().zip(fetched) {
            resolved.insert(game_id, rows);
        }
        mode = match mode {
            BundleMode::BundleTop3Cache | BundleMode::BundleTop3LocalCache => {
                BundleMode::Top3CacheFallback
            }
            _ => BundleMode::Bundle,
        };
    }

    // Answer in request order regardless of which tier resolved each game.
    let mut games = IndexMap::with_capacity(game_ids.len());
    for game_id in game_ids {
        let rows = resolved.shift_remove(game_id).unwrap_or_default();
        games.insert(game_id.clone(), rows);
    }
    BundleOutcome { games, mode }
}

/// Administrative wipe of every tier, plus the in-process celebration locks.
/// A remote failure is reported in the outcome instead of aborting the
/// local wipe.
pub async fn clear_all_rankings(state: &SharedState) -> ClearOutcome {
    let remote_cleared = match state.ensure_remote().await {
        Some(store) => match store.clear_rankings().await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "remote wipe failed; clearing local tiers anyway");
                false
            }
        },
        None => false,
    };

    state.local().clear_all();
    state.reset_celebrations();

    ClearOutcome {
        remote_cleared,
        local_cleared: true,
    }
}
