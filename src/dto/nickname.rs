use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::dto::validation::validate_nickname;

/// Payload for a nickname change.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct NicknameRequest {
    #[validate(custom(function = validate_nickname))]
    pub nickname: String,
}

/// Response to an accepted nickname change.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NicknameResponse {
    /// Nickname as stored (trimmed, possibly truncated).
    pub nickname: String,
    /// False when the change landed on the identity provider profile only.
    pub wrote_server: bool,
    /// Historical leaderboard entries renamed across the catalog.
    pub renamed_entries: usize,
    /// Per-game outcome of the rename fan-out. A failed game does not
    /// invalidate the nickname change.
    pub renames: Vec<RenameReport>,
}

/// One game's share of the rename fan-out.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenameReport {
    pub game_id: String,
    pub renamed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
