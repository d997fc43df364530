//! In-memory [`RankStore`] backend.
//!
//! Used by local development (`STORE_BACKEND=memory`) and by the integration
//! tests. Keys are creation-ordered like the hosted store's push ids, and an
//! offline toggle lets tests exercise the unavailability paths.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

use crate::dao::{
    models::{
        NewScoreEntry, ProfileUpdateEntity, ScoreEntryEntity, SnapshotNodeEntity,
        UserProfileEntity,
    },
    rank_store::RankStore,
    storage::{StorageError, StorageResult},
};

#[derive(Debug, Error)]
#[error("backend is offline")]
struct Offline;

#[derive(Default)]
struct Inner {
    entries: DashMap<String, BTreeMap<String, ScoreEntryEntity>>,
    snapshots: DashMap<String, SnapshotNodeEntity>,
    profiles: DashMap<String, UserProfileEntity>,
    counter: AtomicU64,
    offline: AtomicBool,
    profile_writes_offline: AtomicBool,
}

/// Process-local store keeping everything in concurrent maps.
#[derive(Clone, Default)]
pub struct MemoryRankStore {
    inner: Arc<Inner>,
}

impl MemoryRankStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: while offline every operation fails as unavailable.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Reject profile writes only, leaving the ranking collections reachable.
    pub fn set_profile_writes_offline(&self, offline: bool) {
        self.inner
            .profile_writes_offline
            .store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> StorageResult<()> {
        if self.inner.offline.load(Ordering::SeqCst) {
            Err(StorageError::unavailable("memory store offline".into(), Offline))
        } else {
            Ok(())
        }
    }

    /// Fixed-width key that sorts by creation order, mirroring remote push ids.
    fn next_key(&self, ts: u64) -> String {
        let seq = self.inner.counter.fetch_add(1, Ordering::SeqCst);
        format!("{ts:013x}{:04x}{:04x}", seq & 0xffff, rand::random::<u16>())
    }

    fn game_entries(&self, game_id: &str) -> Vec<ScoreEntryEntity> {
        self.inner
            .entries
            .get(game_id)
            .map(|game| game.values().cloned().collect())
            .unwrap_or_default()
    }
}

impl RankStore for MemoryRankStore {
    fn append_entry(&self, entry: NewScoreEntry) -> BoxFuture<'static, StorageResult<String>> {
        let this = self.clone();
        Box::pin(async move {
            this.check_online()?;
            let key = this.next_key(entry.ts);
            let game_id = entry.game_id.clone();
            let entity = entry.into_entity(key.clone());
            this.inner
                .entries
                .entry(game_id)
                .or_default()
                .insert(key.clone(), entity);
            Ok(key)
        })
    }

    fn query_top_by_score(
        &self,
        game_id: &str,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntryEntity>>> {
        let this = self.clone();
        let game_id = game_id.to_owned();
        Box::pin(async move {
            this.check_online()?;
            let mut entries = this.game_entries(&game_id);
            // Order by the raw field value only; tie-breaking is the caller's job.
            entries.sort_by(|a, b| {
                a.score
                    .partial_cmp(&b.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            let skip = entries.len().saturating_sub(limit);
            Ok(entries.split_off(skip))
        })
    }

    fn fetch_game_entries(
        &self,
        game_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntryEntity>>> {
        let this = self.clone();
        let game_id = game_id.to_owned();
        Box::pin(async move {
            this.check_online()?;
            Ok(this.game_entries(&game_id))
        })
    }

    fn entries_by_identity(
        &self,
        game_id: &str,
        uid: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntryEntity>>> {
        let this = self.clone();
        let game_id = game_id.to_owned();
        let uid = uid.to_owned();
        Box::pin(async move {
            this.check_online()?;
            Ok(this
                .game_entries(&game_id)
                .into_iter()
                .filter(|entry| entry.uid.as_deref() == Some(uid.as_str()))
                .collect())
        })
    }

    fn delete_entry(&self, game_id: &str, key: &str) -> BoxFuture<'static, StorageResult<()>> {
        let this = self.clone();
        let game_id = game_id.to_owned();
        let key = key.to_owned();
        Box::pin(async move {
            this.check_online()?;
            if let Some(mut game) = this.inner.entries.get_mut(&game_id) {
                game.remove(&key);
            }
            Ok(())
        })
    }

    fn rename_entries(
        &self,
        game_id: &str,
        renames: Vec<(String, String)>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let this = self.clone();
        let game_id = game_id.to_owned();
        Box::pin(async move {
            this.check_online()?;
            if let Some(mut game) = this.inner.entries.get_mut(&game_id) {
                for (key, name) in renames {
                    if let Some(entry) = game.get_mut(&key) {
                        entry.name = name;
                    }
                }
            }
            Ok(())
        })
    }

    fn write_snapshot(
        &self,
        game_id: &str,
        node: SnapshotNodeEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let this = self.clone();
        let game_id = game_id.to_owned();
        Box::pin(async move {
            this.check_online()?;
            this.inner.snapshots.insert(game_id, node);
            Ok(())
        })
    }

    fn read_snapshot_bundle(&self) -> BoxFuture<'static, StorageResult<HashMap<String, Value>>> {
        let this = self.clone();
        Box::pin(async move {
            this.check_online()?;
            let mut bundle = HashMap::new();
            for node in this.inner.snapshots.iter() {
                match serde_json::to_value(node.value()) {
                    Ok(value) => {
                        bundle.insert(node.key().clone(), value);
                    }
                    Err(err) => {
                        return Err(StorageError::unavailable(
                            "failed to encode snapshot node".into(),
                            err,
                        ));
                    }
                }
            }
            Ok(bundle)
        })
    }

    fn read_profile(&self, uid: &str) -> BoxFuture<'static, StorageResult<UserProfileEntity>> {
        let this = self.clone();
        let uid = uid.to_owned();
        Box::pin(async move {
            this.check_online()?;
            Ok(this
                .inner
                .profiles
                .get(&uid)
                .map(|profile| profile.clone())
                .unwrap_or_default())
        })
    }

    fn update_profile(
        &self,
        uid: &str,
        update: ProfileUpdateEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let this = self.clone();
        let uid = uid.to_owned();
        Box::pin(async move {
            this.check_online()?;
            if this.inner.profile_writes_offline.load(Ordering::SeqCst) {
                return Err(StorageError::unavailable(
                    "profile node rejected the write".into(),
                    Offline,
                ));
            }
            let mut profile = this.inner.profiles.entry(uid).or_default();
            profile.nickname = Some(update.nickname);
            profile.updated_at = Some(update.updated_at);
            profile.email = Some(update.email);
            if let Some(limit) = update.nickname_limit {
                profile.nickname_limit = Some(limit);
            }
            Ok(())
        })
    }

    fn clear_rankings(&self) -> BoxFuture<'static, StorageResult<()>> {
        let this = self.clone();
        Box::pin(async move {
            this.check_online()?;
            this.inner.entries.clear();
            this.inner.snapshots.clear();
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let this = self.clone();
        Box::pin(async move { this.check_online() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn new_entry(game: &str, score: f64, ts: u64, uid: Option<&str>) -> NewScoreEntry {
        NewScoreEntry {
            game_id: game.into(),
            name: "Player".into(),
            score,
            ts,
            uid: uid.map(str::to_owned),
            photo_url: None,
            provider: None,
            extra: Map::new(),
        }
    }

    #[tokio::test]
    async fn append_assigns_creation_ordered_keys() {
        let store = MemoryRankStore::new();
        let k1 = store.append_entry(new_entry("snake", 1.0, 100, None)).await.unwrap();
        let k2 = store.append_entry(new_entry("snake", 2.0, 100, None)).await.unwrap();
        assert!(k1 < k2);
        assert_eq!(store.fetch_game_entries("snake").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn query_top_returns_largest_scores() {
        let store = MemoryRankStore::new();
        for score in [5.0, 1.0, 9.0, 3.0] {
            store.append_entry(new_entry("jump", score, 1, None)).await.unwrap();
        }
        let top = store.query_top_by_score("jump", 2).await.unwrap();
        let scores: Vec<_> = top.iter().map(|e| e.score).collect();
        assert!(scores.contains(&9.0) && scores.contains(&5.0));
    }

    #[tokio::test]
    async fn entries_by_identity_filters_on_uid() {
        let store = MemoryRankStore::new();
        store.append_entry(new_entry("snake", 1.0, 1, Some("u1"))).await.unwrap();
        store.append_entry(new_entry("snake", 2.0, 2, Some("u2"))).await.unwrap();
        store.append_entry(new_entry("snake", 3.0, 3, None)).await.unwrap();
        let mine = store.entries_by_identity("snake", "u1").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].score, 1.0);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryRankStore::new();
        let key = store.append_entry(new_entry("snake", 1.0, 1, None)).await.unwrap();
        store.delete_entry("snake", &key).await.unwrap();
        store.delete_entry("snake", &key).await.unwrap();
        assert!(store.fetch_game_entries("snake").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn offline_toggle_fails_every_operation() {
        let store = MemoryRankStore::new();
        store.set_offline(true);
        assert!(store.health_check().await.is_err());
        assert!(store.append_entry(new_entry("snake", 1.0, 1, None)).await.is_err());
        store.set_offline(false);
        assert!(store.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn profile_write_toggle_leaves_rankings_reachable() {
        let store = MemoryRankStore::new();
        store.set_profile_writes_offline(true);
        let update = ProfileUpdateEntity {
            nickname: "Neo".into(),
            updated_at: 1,
            email: String::new(),
            nickname_limit: None,
        };
        assert!(store.update_profile("u1", update).await.is_err());
        assert!(store.append_entry(new_entry("snake", 1.0, 1, None)).await.is_ok());
        assert!(store.read_profile("u1").await.is_ok());
    }

    #[tokio::test]
    async fn profile_update_merges_fields() {
        let store = MemoryRankStore::new();
        store
            .update_profile(
                "u1",
                ProfileUpdateEntity {
                    nickname: "Neo".into(),
                    updated_at: 5,
                    email: "neo@example.com".into(),
                    nickname_limit: None,
                },
            )
            .await
            .unwrap();
        let profile = store.read_profile("u1").await.unwrap();
        assert_eq!(profile.nickname.as_deref(), Some("Neo"));
        assert_eq!(profile.updated_at, Some(5));
    }
}
