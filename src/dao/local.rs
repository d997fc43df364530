//! Device-local JSON stores: the offline fallback rankings, the persisted
//! top-3 cache, the auth rendering snapshot, and the local nickname ledger.
//!
//! All reads are defensive: a missing, unreadable, or malformed file
//! degrades to an empty default so a corrupted cache can never break a read
//! path. Writes are best-effort and logged. Access is synchronous
//! read-modify-write without locking; concurrent processes sharing one data
//! directory can race, which is an accepted limitation of this tier.

use std::{
    collections::HashMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};
use tracing::warn;
use uuid::Uuid;

use crate::{
    dao::models::{
        AuthCacheEntity, NicknameLimitEntity, PersistedTopEntity, ScoreEntryEntity, now_millis,
    },
    rank::{self, TOP_K},
};

const RANKINGS_FILE: &str = "local_rankings.json";
const TOP_CACHE_FILE: &str = "top_scores_cache.json";
const AUTH_CACHE_FILE: &str = "auth_cache.json";
const NICKNAME_LIMITS_FILE: &str = "nickname_limits.json";
const PLAYER_NAME_FILE: &str = "player_name.json";

/// Handle over the per-device data directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    /// Open (and create if needed) the data directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if let Err(err) = fs::create_dir_all(&dir) {
            warn!(dir = %dir.display(), error = %err, "failed to create local data directory");
        }
        Self { dir }
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    fn read_json<T>(&self, file: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        read_or_default(&self.path(file))
    }

    fn write_json<T>(&self, file: &str, value: &T)
    where
        T: Serialize,
    {
        let path = self.path(file);
        let payload = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to serialize local store file");
                return;
            }
        };
        if let Err(err) = fs::write(&path, payload) {
            warn!(path = %path.display(), error = %err, "failed to write local store file");
        }
    }

    fn remove(&self, file: &str) {
        let path = self.path(file);
        if let Err(err) = fs::remove_file(&path) {
            if err.kind() != ErrorKind::NotFound {
                warn!(path = %path.display(), error = %err, "failed to remove local store file");
            }
        }
    }

    // --- full per-game fallback history ---

    /// All locally recorded entries for one game, unsorted.
    pub fn game_entries(&self, game_id: &str) -> Vec<ScoreEntryEntity> {
        let mut store: HashMap<String, Vec<ScoreEntryEntity>> = self.read_json(RANKINGS_FILE);
        store.remove(game_id).unwrap_or_default()
    }

    /// Append an entry and keep only the local top-`keep`; returns the kept list.
    pub fn push_entry(&self, entry: ScoreEntryEntity, keep: usize) -> Vec<ScoreEntryEntity> {
        let mut store: HashMap<String, Vec<ScoreEntryEntity>> = self.read_json(RANKINGS_FILE);
        let game_id = entry.game_id.clone();
        let mut entries = store.remove(&game_id).unwrap_or_default();
        entries.push(entry);
        let (kept, _) = rank::select_top_k(rank::sort_entries(entries), keep);
        store.insert(game_id, kept.clone());
        self.write_json(RANKINGS_FILE, &store);
        kept
    }

    /// Re-sort and truncate one game's local list; returns the kept entries.
    pub fn prune_game(&self, game_id: &str, keep: usize) -> Vec<ScoreEntryEntity> {
        let mut store: HashMap<String, Vec<ScoreEntryEntity>> = self.read_json(RANKINGS_FILE);
        let entries = store.remove(game_id).unwrap_or_default();
        let (kept, _) = rank::select_top_k(rank::sort_entries(entries), keep);
        store.insert(game_id.to_owned(), kept.clone());
        self.write_json(RANKINGS_FILE, &store);
        kept
    }

    // --- persisted top-3 cache ---

    /// Cached top rows for a game, re-sorted and truncated to `limit`.
    ///
    /// `None` means the cache has no record for this game at all.
    pub fn persisted_top(&self, game_id: &str, limit: usize) -> Option<Vec<ScoreEntryEntity>> {
        let mut cache: HashMap<String, PersistedTopEntity> = self.read_json(TOP_CACHE_FILE);
        let node = cache.remove(game_id)?;
        let (kept, _) = rank::select_top_k(rank::sort_entries(node.rows), limit);
        Some(kept)
    }

    /// Replace the cached top rows for a game (capped at the shared top-K).
    pub fn set_persisted_top(&self, game_id: &str, rows: &[ScoreEntryEntity]) {
        let mut cache: HashMap<String, PersistedTopEntity> = self.read_json(TOP_CACHE_FILE);
        let (kept, _) = rank::select_top_k(rank::sort_entries(rows.to_vec()), TOP_K);
        cache.insert(
            game_id.to_owned(),
            PersistedTopEntity {
                ts: now_millis(),
                rows: kept,
            },
        );
        self.write_json(TOP_CACHE_FILE, &cache);
    }

    /// Evict one game's cached top list, or every list when `game_id` is
    /// `None`.
    pub fn clear_persisted_top(&self, game_id: Option<&str>) {
        match game_id {
            Some(game_id) => {
                let mut cache: HashMap<String, PersistedTopEntity> =
                    self.read_json(TOP_CACHE_FILE);
                if cache.remove(game_id).is_some() {
                    self.write_json(TOP_CACHE_FILE, &cache);
                }
            }
            None => self.remove(TOP_CACHE_FILE),
        }
    }

    // --- auth rendering snapshot ---

    /// Last-known identity snapshot, for rendering only.
    pub fn auth_cache(&self) -> Option<AuthCacheEntity> {
        read_or_default::<Option<AuthCacheEntity>>(&self.path(AUTH_CACHE_FILE))
    }

    /// Persist or clear the identity snapshot.
    pub fn set_auth_cache(&self, snapshot: Option<&AuthCacheEntity>) {
        match snapshot {
            Some(value) => self.write_json(AUTH_CACHE_FILE, value),
            None => self.remove(AUTH_CACHE_FILE),
        }
    }

    // --- local nickname-limit ledger ---

    /// Stored limiter state for one identity (default when absent).
    pub fn nickname_limit(&self, uid: &str) -> NicknameLimitEntity {
        let mut ledger: HashMap<String, NicknameLimitEntity> = self.read_json(NICKNAME_LIMITS_FILE);
        ledger.remove(uid).unwrap_or_default()
    }

    /// Advance the stored limiter state for one identity.
    pub fn set_nickname_limit(&self, uid: &str, meta: &NicknameLimitEntity) {
        let mut ledger: HashMap<String, NicknameLimitEntity> = self.read_json(NICKNAME_LIMITS_FILE);
        ledger.insert(uid.to_owned(), meta.clone());
        self.write_json(NICKNAME_LIMITS_FILE, &ledger);
    }

    // --- last-used player name ---

    /// Remember the display name last used for a score write.
    pub fn set_last_player_name(&self, name: &str) {
        self.write_json(PLAYER_NAME_FILE, &name);
    }

    /// Display name last used for a score write, if any.
    pub fn last_player_name(&self) -> Option<String> {
        read_or_default::<Option<String>>(&self.path(PLAYER_NAME_FILE))
    }

    /// Wipe every local tier (fallback history, caches, ledger, name).
    pub fn clear_all(&self) {
        for file in [
            RANKINGS_FILE,
            TOP_CACHE_FILE,
            AUTH_CACHE_FILE,
            NICKNAME_LIMITS_FILE,
            PLAYER_NAME_FILE,
        ] {
            self.remove(file);
        }
    }
}

fn read_or_default<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return T::default(),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to read local store file");
            return T::default();
        }
    };

    match serde_json::from_str(&contents) {
        Ok(value) => value,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "malformed local store file; ignoring");
            T::default()
        }
    }
}

/// Synthetic key for entries created outside the remote store.
pub fn synthetic_entry_id() -> String {
    format!("local_{}", Uuid::new_v4().simple())
}
