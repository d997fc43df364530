//! Path layout and wire shapes of the hosted realtime database.

use serde::Deserialize;

/// Namespace holding the full per-game ranking collections.
pub const RANKINGS_NS: &str = "leaderboards";
/// Namespace holding the shared per-game top-3 snapshot nodes.
pub const SNAPSHOT_NS: &str = "leaderboards_top3";
/// Namespace holding per-identity profile nodes.
pub const PROFILES_NS: &str = "userProfiles";

/// Response to appending a child: the store-assigned push key.
#[derive(Debug, Deserialize)]
pub struct PushResponse {
    pub name: String,
}

pub fn game_path(game_id: &str) -> String {
    format!("{RANKINGS_NS}/{game_id}")
}

pub fn entry_path(game_id: &str, key: &str) -> String {
    format!("{RANKINGS_NS}/{game_id}/{key}")
}

pub fn snapshot_path(game_id: &str) -> String {
    format!("{SNAPSHOT_NS}/{game_id}")
}

pub fn profile_path(uid: &str) -> String {
    format!("{PROFILES_NS}/{uid}")
}
