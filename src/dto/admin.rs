use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dto::leaderboard::ScoreRow;

/// Query parameters for the admin prune.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PruneQuery {
    /// Entries to keep; absent or zero falls back to the top-3 default.
    pub keep: Option<usize>,
}

/// Response to the admin prune.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PruneResponse {
    pub game_id: String,
    /// Surviving entries, in ranked order.
    pub kept: Vec<ScoreRow>,
    pub deleted: usize,
    /// Which tier was pruned ("remote" or "local").
    pub source: String,
}

/// Response to the full wipe.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClearResponse {
    pub remote_cleared: bool,
    pub local_cleared: bool,
}
