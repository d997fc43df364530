//! Remote leaderboard store abstraction and its backends.

#[cfg(feature = "memory-store")]
pub mod memory;
#[cfg(feature = "rest-store")]
pub mod rest;

use std::collections::HashMap;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::dao::models::{
    NewScoreEntry, ProfileUpdateEntity, ScoreEntryEntity, SnapshotNodeEntity, UserProfileEntity,
};
use crate::dao::storage::StorageResult;
use crate::rank;

/// Abstraction over the authoritative remote store for leaderboard data.
///
/// Per-game ranked collections, the shared top-3 snapshot namespace, and
/// per-identity profile nodes all live behind this trait. Every method may
/// fail with an unavailability error; read callers are expected to fall
/// through to a lower tier, write callers to surface the failure.
pub trait RankStore: Send + Sync {
    /// Append a record under the game's collection; the store assigns a
    /// unique, creation-ordered key and returns it.
    fn append_entry(&self, entry: NewScoreEntry) -> BoxFuture<'static, StorageResult<String>>;
    /// Up to `limit` records with the largest score values. The store only
    /// guarantees ordering by the field value; callers re-sort through the
    /// shared ordering law to get the tie-break right.
    fn query_top_by_score(
        &self,
        game_id: &str,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntryEntity>>>;
    /// Full scan of one game's collection (used by pruning).
    fn fetch_game_entries(
        &self,
        game_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntryEntity>>>;
    /// Records written by one identity within one game.
    fn entries_by_identity(
        &self,
        game_id: &str,
        uid: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntryEntity>>>;
    /// Idempotent delete; removing a missing key is not an error.
    fn delete_entry(&self, game_id: &str, key: &str) -> BoxFuture<'static, StorageResult<()>>;
    /// Atomic multi-field patch renaming entries in place: `(key, new_name)`.
    fn rename_entries(
        &self,
        game_id: &str,
        renames: Vec<(String, String)>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Unconditionally replace the shared snapshot node for one game.
    fn write_snapshot(
        &self,
        game_id: &str,
        node: SnapshotNodeEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Whole snapshot namespace in one round trip, children left untyped so
    /// a malformed game node cannot fail the bundle.
    fn read_snapshot_bundle(&self) -> BoxFuture<'static, StorageResult<HashMap<String, Value>>>;
    /// Per-identity profile node (default when absent).
    fn read_profile(&self, uid: &str) -> BoxFuture<'static, StorageResult<UserProfileEntity>>;
    /// Atomic multi-field update of a profile node.
    fn update_profile(
        &self,
        uid: &str,
        update: ProfileUpdateEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Administrative wipe of the ranking and snapshot namespaces.
    fn clear_rankings(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Cheap connectivity probe.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Leniently decode one stored child into a canonical entry.
///
/// Children with a missing or non-numeric score are skipped (returns
/// `None`) rather than failing the surrounding scan; names are sanitized on
/// the way in. Shared by every backend so malformed historical data behaves
/// identically everywhere.
pub fn entry_from_child(game_id: &str, key: &str, value: &Value) -> Option<ScoreEntryEntity> {
    let map = value.as_object()?;
    let score = rank::score_from_value(map.get("score"))?;
    let name = rank::sanitize_name(map.get("name").and_then(Value::as_str).unwrap_or(""));
    let ts = map.get("ts").and_then(Value::as_u64).unwrap_or(0);
    let uid = map
        .get("uid")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .filter(|uid| !uid.is_empty());

    let mut extra = serde_json::Map::new();
    for (field, raw) in map {
        if !matches!(field.as_str(), "score" | "name" | "ts" | "uid" | "gameId") {
            extra.insert(field.clone(), raw.clone());
        }
    }

    Some(ScoreEntryEntity {
        id: key.to_owned(),
        game_id: game_id.to_owned(),
        name,
        score,
        ts,
        uid,
        extra,
    })
}
