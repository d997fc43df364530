use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::{
    dao::models::ScoreEntryEntity,
    services::leaderboard_service::{BundleOutcome, SavedEntry, ScoreSource},
};

/// One ranked row as rendered to clients.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRow {
    pub id: String,
    pub name: String,
    pub score: f64,
    pub ts: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

impl From<ScoreEntryEntity> for ScoreRow {
    fn from(entry: ScoreEntryEntity) -> Self {
        Self {
            id: entry.id,
            name: entry.name,
            score: entry.score,
            ts: entry.ts,
            uid: entry.uid,
        }
    }
}

/// Query parameters for the single-game top read.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopScoresQuery {
    /// Row cap; absent or zero falls back to the top-3 default.
    pub limit: Option<usize>,
    /// Bypass the persisted device cache and re-query the remote tier.
    #[serde(default)]
    pub force_refresh: bool,
}

/// Response to the single-game top read.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopScoresResponse {
    pub game_id: String,
    pub rows: Vec<ScoreRow>,
}

/// Query parameters for the bulk read.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BundleQuery {
    /// Comma-separated game ids; absent means the whole catalog.
    pub games: Option<String>,
    pub limit: Option<usize>,
    /// Bypass the persisted device cache for every requested game.
    #[serde(default)]
    pub force_refresh: bool,
}

/// Response to the bulk read: rows per game plus the provenance tag.
#[derive(Debug, Serialize, ToSchema)]
pub struct BundleResponse {
    /// Which tiers produced the rows (e.g. "bundle", "local-cache").
    pub mode: String,
    #[schema(value_type = Object)]
    pub games: IndexMap<String, Vec<ScoreRow>>,
}

impl From<BundleOutcome> for BundleResponse {
    fn from(outcome: BundleOutcome) -> Self {
        Self {
            mode: outcome.mode.as_str().to_owned(),
            games: outcome
                .games
                .into_iter()
                .map(|(game_id, rows)| (game_id, rows.into_iter().map(ScoreRow::from).collect()))
                .collect(),
        }
    }
}

/// Payload recording one finished run.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SaveScoreRequest {
    /// Display name for anonymous writes; signed-in sessions always use
    /// their stored nickname.
    #[serde(default)]
    pub name: Option<String>,
    pub score: f64,
    /// Extra game-specific fields stored verbatim alongside the entry.
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

/// Response to an accepted score write.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveScoreResponse {
    pub id: String,
    pub game_id: String,
    pub name: String,
    pub score: f64,
    pub ts: u64,
    /// Which tier absorbed the write ("remote" or "local").
    pub source: String,
}

impl From<SavedEntry> for SaveScoreResponse {
    fn from(saved: SavedEntry) -> Self {
        Self {
            id: saved.entry.id,
            game_id: saved.entry.game_id,
            name: saved.entry.name,
            score: saved.entry.score,
            ts: saved.entry.ts,
            source: source_tag(saved.source).to_owned(),
        }
    }
}

/// Wire label for the tier that handled a write or prune.
pub fn source_tag(source: ScoreSource) -> &'static str {
    match source {
        ScoreSource::Remote => "remote",
        ScoreSource::Local => "local",
    }
}
