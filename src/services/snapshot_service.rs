//! Maintenance of the shared per-game top-3 snapshot nodes.
//!
//! Snapshots are a derived cache rebuilt after every successful remote
//! write; readers treat them as the cheap bulk path and never as a source
//! of truth. Parsing is lenient because historical nodes were written by
//! several client generations.

use std::{collections::HashMap, sync::Arc};

use serde_json::Value;
use tracing::warn;

use crate::{
    dao::{
        models::{ScoreEntryEntity, SnapshotNodeEntity, SnapshotRowEntity, now_millis},
        rank_store::RankStore,
        storage::StorageResult,
    },
    rank::{self, TOP_K},
    state::SharedState,
};

/// Recompute and overwrite one game's snapshot node from the authoritative
/// ranking collection. Best-effort: failures are logged, never propagated,
/// because a stale snapshot only degrades the bulk read path.
pub async fn refresh_for_game(state: &SharedState, store: &Arc<dyn RankStore>, game_id: &str) {
    let entries = match store.query_top_by_score(game_id, TOP_K).await {
        Ok(entries) => entries,
        Err(err) => {
            warn!(game_id, error = %err, "snapshot refresh: top query failed");
            return;
        }
    };

    let (kept, _) = rank::select_top_k(rank::sort_entries(entries), TOP_K);
    state.local().set_persisted_top(game_id, &kept);

    let node = SnapshotNodeEntity {
        updated_at: now_millis(),
        rows: kept
            .iter()
            .map(|entry| SnapshotRowEntity {
                name: entry.name.clone(),
                score: entry.score,
                ts: entry.ts,
                id: Some(entry.id.clone()),
            })
            .collect(),
    };

    if let Err(err) = store.write_snapshot(game_id, node).await {
        warn!(game_id, error = %err, "snapshot refresh: write failed");
    }
}

/// Leniently decode one snapshot node into ranked entries.
///
/// Rows without a numeric score are skipped; rows without an id get a
/// synthetic `cache_{idx}` one so downstream consumers always see a key.
pub fn parse_snapshot_node(game_id: &str, value: &Value) -> Vec<ScoreEntryEntity> {
    let rows = value
        .get("rows")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let entries = rows
        .iter()
        .enumerate()
        .filter_map(|(idx, row)| {
            let score = rank::score_from_value(row.get("score"))?;
            let name = rank::sanitize_name(row.get("name").and_then(Value::as_str).unwrap_or(""));
            let ts = row.get("ts").and_then(Value::as_u64).unwrap_or(0);
            let id = row
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .unwrap_or_else(|| format!("cache_{idx}"));
            Some(ScoreEntryEntity {
                id,
                game_id: game_id.to_owned(),
                name,
                score,
                ts,
                uid: None,
                extra: Default::default(),
            })
        })
        .collect();

    rank::sort_entries(entries)
}

/// Fetch the whole snapshot namespace and decode it per game, refreshing
/// the device-local persisted cache for every node that parses.
pub async fn read_bundle(
    state: &SharedState,
    store: &Arc<dyn RankStore>,
) -> StorageResult<HashMap<String, Vec<ScoreEntryEntity>>> {
    let bundle = store.read_snapshot_bundle().await?;

    let mut decoded = HashMap::with_capacity(bundle.len());
    for (game_id, node) in &bundle {
        let entries = parse_snapshot_node(game_id, node);
        if !entries.is_empty() {
            state.local().set_persisted_top(game_id, &entries);
        }
        decoded.insert(game_id.clone(), entries);
    }

    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_rows_and_synthesizes_missing_ids() {
        let node = json!({
            "updatedAt": 1000,
            "rows": [
                {"name": "Ann", "score": 30.0, "ts": 5, "id": "k1"},
                {"name": "Bob", "score": 50.0, "ts": 7},
            ]
        });
        let entries = parse_snapshot_node("snake", &node);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "Bob");
        assert_eq!(entries[0].id, "cache_1");
        assert_eq!(entries[1].id, "k1");
    }

    #[test]
    fn skips_rows_without_numeric_scores() {
        let node = json!({"rows": [{"name": "x"}, {"name": "y", "score": "junk"}, {"score": 2}]});
        let entries = parse_snapshot_node("snake", &node);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Player");
    }

    #[test]
    fn tolerates_malformed_nodes() {
        assert!(parse_snapshot_node("snake", &json!(null)).is_empty());
        assert!(parse_snapshot_node("snake", &json!("junk")).is_empty());
        assert!(parse_snapshot_node("snake", &json!({"rows": "junk"})).is_empty());
    }
}
