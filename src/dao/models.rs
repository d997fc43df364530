use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// One leaderboard record shared across every store tier.
///
/// The wire shape (camelCase, millisecond timestamps) matches what the
/// hosted realtime database already contains, so the REST backend can read
/// historical data untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntryEntity {
    /// Store-assigned key. Remote keys are creation-ordered; local fallback
    /// entries carry a synthetic UUID.
    pub id: String,
    /// Game this record belongs to.
    pub game_id: String,
    /// Display name, already sanitized (1-12 chars).
    pub name: String,
    /// Score rounded to 2 decimal places.
    pub score: f64,
    /// Creation time in unix milliseconds; tie-break only, never a ranking key.
    pub ts: u64,
    /// Writing identity's stable id, present only for authenticated writes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    /// Caller-supplied extra fields carried through verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload for a record about to be appended (the store assigns the key).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScoreEntry {
    pub game_id: String,
    pub name: String,
    pub score: f64,
    pub ts: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "photoURL")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NewScoreEntry {
    /// Attach the store-generated key, yielding the canonical entity.
    pub fn into_entity(self, id: String) -> ScoreEntryEntity {
        ScoreEntryEntity {
            id,
            game_id: self.game_id,
            name: self.name,
            score: self.score,
            ts: self.ts,
            uid: self.uid,
            extra: self.extra,
        }
    }
}

/// One row inside the shared top-3 snapshot node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRowEntity {
    pub name: String,
    pub score: f64,
    #[serde(default)]
    pub ts: u64,
    /// Key of the originating entry when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Shared snapshot node for one game: last computed top-3 plus write time.
///
/// A derived cache, not a source of truth; writes are last-writer-wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotNodeEntity {
    pub updated_at: u64,
    #[serde(default)]
    pub rows: Vec<SnapshotRowEntity>,
}

/// Per-identity nickname rate-limit state, advanced as a single logical value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NicknameLimitEntity {
    /// Calendar day bucket (`YYYY-MM-DD`); a stale bucket means the count resets.
    #[serde(default)]
    pub day_key: String,
    /// Accepted changes inside the current bucket.
    #[serde(default)]
    pub day_count: u32,
    /// Unix milliseconds of the most recent accepted change, 0 when never.
    #[serde(default)]
    pub last_change_at: u64,
}

/// Per-identity profile node stored under the profile namespace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname_limit: Option<NicknameLimitEntity>,
}

/// Atomic multi-field profile update applied in one patch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateEntity {
    pub nickname: String,
    pub updated_at: u64,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname_limit: Option<NicknameLimitEntity>,
}

/// Last-known identity persisted purely as a rendering shortcut.
///
/// Never consulted for authorization; the write-gate always re-resolves the
/// identity from the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthCacheEntity {
    pub uid: String,
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, rename = "photoURL")]
    pub photo_url: String,
    /// When this snapshot was taken (unix milliseconds).
    pub ts: u64,
}

/// Per-game persisted top-3 snapshot kept on the device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedTopEntity {
    /// When the rows were captured (unix milliseconds).
    pub ts: u64,
    #[serde(default)]
    pub rows: Vec<ScoreEntryEntity>,
}

/// Current unix time in milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
