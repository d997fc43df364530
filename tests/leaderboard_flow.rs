//! End-to-end service flows over the in-memory backend.
#![cfg(feature = "memory-store")]

use std::sync::Arc;

use hof_back::{
    config::AppConfig,
    dao::{
        identity::{FixedIdentityProvider, Identity, IdentityProvider, NullIdentityProvider},
        rank_store::{RankStore, memory::MemoryRankStore},
    },
    error::ServiceError,
    services::{celebration_service, leaderboard_service, nickname_service},
    state::{AppState, SharedState},
};

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.data_dir = std::env::temp_dir().join(format!(
        "hof-flow-{}",
        uuid::Uuid::new_v4().simple()
    ));
    config
}

fn player(uid: &str, name: &str) -> Identity {
    Identity {
        uid: uid.to_owned(),
        display_name: name.to_owned(),
        email: format!("{uid}@example.com"),
        photo_url: String::new(),
    }
}

async fn state_with_store(
    config: AppConfig,
    provider: Arc<dyn IdentityProvider>,
) -> (SharedState, MemoryRankStore) {
    let state = AppState::new(config, provider);
    let store = MemoryRankStore::new();
    state.install_rank_store(Arc::new(store.clone())).await;
    (state, store)
}

#[tokio::test]
async fn save_and_read_keeps_top_three_sorted() {
    let provider = Arc::new(FixedIdentityProvider::signed_in(player("u1", "Ann")));
    let (state, store) = state_with_store(test_config(), provider).await;

    for score in [10.0, 40.0, 20.0, 30.0] {
        leaderboard_service::save_score(&state, "snake", None, score, Default::default())
            .await
            .unwrap();
    }

    // cached read and forced remote read agree
    for force in [false, true] {
        let rows = leaderboard_service::get_top_scores(&state, "snake", None, force).await;
        let scores: Vec<_> = rows.iter().map(|r| r.score).collect();
        assert_eq!(scores, [40.0, 30.0, 20.0]);
    }

    // each save prunes, so the backing collection stays bounded too
    assert_eq!(store.fetch_game_entries("snake").await.unwrap().len(), 3);
}

#[tokio::test]
async fn anonymous_write_is_gated_while_remote_is_up() {
    let provider = Arc::new(NullIdentityProvider::new());
    let (state, _store) = state_with_store(test_config(), provider).await;

    let err = leaderboard_service::save_score(&state, "snake", None, 12.0, Default::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AuthRequired));
}

#[tokio::test]
async fn non_finite_scores_are_rejected() {
    let provider = Arc::new(FixedIdentityProvider::signed_in(player("u1", "Ann")));
    let (state, _store) = state_with_store(test_config(), provider).await;

    let err = leaderboard_service::save_score(&state, "snake", None, f64::NAN, Default::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidScore));
}

#[tokio::test]
async fn explicit_names_only_apply_to_anonymous_writes() {
    let provider = Arc::new(FixedIdentityProvider::signed_in(player("u1", "Ann")));
    let (state, _store) = state_with_store(test_config(), provider).await;

    let saved =
        leaderboard_service::save_score(&state, "snake", Some("Ignored"), 5.0, Default::default())
            .await
            .unwrap();
    assert_eq!(saved.entry.name, "Ann");
}

#[tokio::test]
async fn anonymous_write_lands_locally_when_allowed() {
    let mut config = test_config();
    config.require_auth_for_write = false;
    let state = AppState::new(config, Arc::new(NullIdentityProvider::new()));
    state.mark_remote_disabled();

    let saved = leaderboard_service::save_score(&state, "snake", Some("Zed"), 15.5, Default::default())
        .await
        .unwrap();
    assert_eq!(saved.source, leaderboard_service::ScoreSource::Local);
    assert!(saved.entry.id.starts_with("local_"));

    let rows = leaderboard_service::get_top_scores(&state, "snake", None, false).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Zed");
}

#[tokio::test]
async fn append_failure_is_surfaced_not_absorbed() {
    let mut config = test_config();
    config.require_auth_for_write = false;
    let provider = Arc::new(NullIdentityProvider::new());
    let (state, store) = state_with_store(config, provider).await;

    store.set_offline(true);
    let err = leaderboard_service::save_score(&state, "snake", Some("Zed"), 1.0, Default::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Storage(_)));

    // no silent local fallback while the remote tier is installed
    assert!(state.local().game_entries("snake").is_empty());
}

#[tokio::test]
async fn reads_survive_a_remote_outage_through_the_cache() {
    let provider = Arc::new(FixedIdentityProvider::signed_in(player("u1", "Ann")));
    let (state, store) = state_with_store(test_config(), provider).await;

    leaderboard_service::save_score(&state, "jump", None, 88.0, Default::default())
        .await
        .unwrap();
    let live = leaderboard_service::get_top_scores(&state, "jump", None, true).await;
    assert_eq!(live.len(), 1);

    store.set_offline(true);
    let cached = leaderboard_service::get_top_scores(&state, "jump", None, false).await;
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].score, 88.0);
}

#[tokio::test]
async fn empty_remote_reads_keep_the_stale_cache() {
    let provider = Arc::new(FixedIdentityProvider::signed_in(player("u1", "Ann")));
    let (state, store) = state_with_store(test_config(), provider).await;

    leaderboard_service::save_score(&state, "jump", None, 88.0, Default::default())
        .await
        .unwrap();
    let primed = leaderboard_service::get_top_scores(&state, "jump", None, true).await;
    assert_eq!(primed.len(), 1);

    // wipe the remote collection behind the service's back
    for entry in store.fetch_game_entries("jump").await.unwrap() {
        store.delete_entry("jump", &entry.id).await.unwrap();
    }

    let live = leaderboard_service::get_top_scores(&state, "jump", None, true).await;
    assert!(live.is_empty());

    // the stale rows still answer cached reads
    let cached = leaderboard_service::get_top_scores(&state, "jump", None, false).await;
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].score, 88.0);
}

#[tokio::test]
async fn bundle_mode_tracks_the_serving_tiers() {
    let provider = Arc::new(FixedIdentityProvider::signed_in(player("u1", "Ann")));
    let (state, _store) = state_with_store(test_config(), provider).await;

    leaderboard_service::save_score(&state, "snake", None, 50.0, Default::default())
        .await
        .unwrap();

    let snake = vec!["snake".to_owned()];
    let outcome = leaderboard_service::get_top_scores_bundle(&state, &snake, None, false).await;
    assert_eq!(outcome.mode.as_str(), "local-cache");
    assert_eq!(outcome.games["snake"].len(), 1);

    // evicted from the device cache, the shared snapshot answers
    state.local().clear_persisted_top(Some("snake"));
    let outcome = leaderboard_service::get_top_scores_bundle(&state, &snake, None, false).await;
    assert_eq!(outcome.mode.as_str(), "bundle(top3-cache)");
    assert_eq!(outcome.games["snake"].len(), 1);

    // forced read: snapshot covers snake, tetris needs a direct query
    let pair = vec!["snake".to_owned(), "tetris".to_owned()];
    let outcome = leaderboard_service::get_top_scores_bundle(&state, &pair, None, true).await;
    assert_eq!(outcome.mode.as_str(), "bundle(top3-cache + fallback)");
    assert_eq!(outcome.games["snake"].len(), 1);
    assert!(outcome.games["tetris"].is_empty());

    // cache hit plus snapshot hit, nothing missing
    leaderboard_service::save_score(&state, "jump", None, 7.0, Default::default())
        .await
        .unwrap();
    state.local().clear_persisted_top(Some("jump"));
    let mixed = vec!["snake".to_owned(), "jump".to_owned()];
    let outcome = leaderboard_service::get_top_scores_bundle(&state, &mixed, None, false).await;
    assert_eq!(outcome.mode.as_str(), "bundle(top3-cache + local-cache)");
}

#[tokio::test]
async fn oversize_bundle_reads_skip_the_snapshot() {
    let provider = Arc::new(FixedIdentityProvider::signed_in(player("u1", "Ann")));
    let (state, store) = state_with_store(test_config(), provider).await;

    // grow past the snapshot size behind the service's back
    for (score, ts) in [(1.0, 1), (2.0, 2), (3.0, 3), (4.0, 4), (5.0, 5)] {
        store
            .append_entry(hof_back::dao::models::NewScoreEntry {
                game_id: "snake".into(),
                name: "Ann".into(),
                score,
                ts,
                uid: Some("u1".into()),
                photo_url: None,
                provider: None,
                extra: Default::default(),
            })
            .await
            .unwrap();
    }
    let remote = state.rank_store().await.unwrap();
    hof_back::services::snapshot_service::refresh_for_game(&state, &remote, "snake").await;

    // the snapshot holds three rows; a larger limit must go direct
    let outcome =
        leaderboard_service::get_top_scores_bundle(&state, &["snake".to_owned()], Some(5), true)
            .await;
    assert_eq!(outcome.mode.as_str(), "bundle");
    assert_eq!(outcome.games["snake"].len(), 5);
}

#[tokio::test]
async fn bundle_without_snapshot_reports_direct_reads() {
    let provider = Arc::new(FixedIdentityProvider::signed_in(player("u1", "Ann")));
    let (state, _store) = state_with_store(test_config(), provider).await;

    let outcome =
        leaderboard_service::get_top_scores_bundle(&state, &["tetris".to_owned()], None, false)
            .await;
    assert_eq!(outcome.mode.as_str(), "bundle");
    assert!(outcome.games["tetris"].is_empty());

    let outcome = leaderboard_service::get_top_scores_bundle(&state, &[], None, false).await;
    assert_eq!(outcome.mode.as_str(), "none");
    assert!(outcome.games.is_empty());
}

#[tokio::test]
async fn celebration_fires_once_per_score() {
    let provider = Arc::new(FixedIdentityProvider::signed_in(player("u1", "Ann")));
    let (state, _store) = state_with_store(test_config(), provider).await;

    let first = celebration_service::check_and_celebrate(&state, "snake", 42.0)
        .await
        .unwrap();
    assert!(first.celebrate);
    assert!(first.saved);

    let repeat = celebration_service::check_and_celebrate(&state, "snake", 42.0)
        .await
        .unwrap();
    assert!(!repeat.celebrate);
}

#[tokio::test]
async fn celebration_requires_strictly_beating_third_place() {
    let provider = Arc::new(FixedIdentityProvider::signed_in(player("u1", "Ann")));
    let (state, _store) = state_with_store(test_config(), provider).await;

    for score in [30.0, 20.0, 10.0] {
        leaderboard_service::save_score(&state, "snake", None, score, Default::default())
            .await
            .unwrap();
    }

    let tie = celebration_service::check_and_celebrate(&state, "snake", 10.0)
        .await
        .unwrap();
    assert!(!tie.celebrate);

    let beats = celebration_service::check_and_celebrate(&state, "snake", 10.5)
        .await
        .unwrap();
    assert!(beats.celebrate);
}

#[tokio::test]
async fn celebration_skips_signed_out_sessions() {
    let (state, _store) =
        state_with_store(test_config(), Arc::new(NullIdentityProvider::new())).await;

    let outcome = celebration_service::check_and_celebrate(&state, "snake", 99.0)
        .await
        .unwrap();
    assert!(!outcome.celebrate);
    assert!(!outcome.saved);
}

#[tokio::test]
async fn celebration_rejects_unknown_games() {
    let provider = Arc::new(FixedIdentityProvider::signed_in(player("u1", "Ann")));
    let (state, _store) = state_with_store(test_config(), provider).await;

    let err = celebration_service::check_and_celebrate(&state, "nonsense", 1.0)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn nickname_change_renames_history_and_cools_down() {
    let provider = Arc::new(FixedIdentityProvider::signed_in(player("u1", "Ann")));
    let (state, store) = state_with_store(test_config(), provider).await;

    leaderboard_service::save_score(&state, "snake", None, 10.0, Default::default())
        .await
        .unwrap();
    leaderboard_service::save_score(&state, "jump", None, 20.0, Default::default())
        .await
        .unwrap();

    let outcome = nickname_service::set_nickname(&state, "  Neo  ").await.unwrap();
    assert_eq!(outcome.nickname, "Neo");
    assert!(outcome.wrote_server);
    assert_eq!(outcome.renamed_entries(), 2);
    assert!(outcome.renames.iter().all(|r| r.error.is_none()));

    for game in ["snake", "jump"] {
        let entries = store.fetch_game_entries(game).await.unwrap();
        assert!(entries.iter().all(|e| e.name == "Neo"));
    }

    // a second change inside the cooldown window is refused
    let err = nickname_service::set_nickname(&state, "Trinity").await.unwrap_err();
    assert!(matches!(err, ServiceError::NicknameCooldown { .. }));
}

#[tokio::test]
async fn repeating_the_same_nickname_consumes_no_quota() {
    let provider = Arc::new(FixedIdentityProvider::signed_in(player("u1", "Ann")));
    let (state, _store) = state_with_store(test_config(), provider).await;

    nickname_service::set_nickname(&state, "Neo").await.unwrap();
    let repeat = nickname_service::set_nickname(&state, "Neo").await.unwrap();
    assert!(!repeat.wrote_server);
    assert_eq!(repeat.renamed_entries(), 0);
}

#[tokio::test]
async fn matching_the_provider_name_consumes_no_quota() {
    let provider = Arc::new(FixedIdentityProvider::signed_in(player("u1", "Ann")));
    let (state, _store) = state_with_store(test_config(), provider).await;

    // no stored nickname yet: "Ann" is already the rendered name
    let noop = nickname_service::set_nickname(&state, "Ann").await.unwrap();
    assert!(!noop.wrote_server);
    assert_eq!(noop.renamed_entries(), 0);

    // neither cooldown nor quota was charged by the no-op
    let outcome = nickname_service::set_nickname(&state, "Neo").await.unwrap();
    assert!(outcome.wrote_server);
}

#[tokio::test]
async fn degraded_nickname_change_still_renames_history() {
    let provider = Arc::new(FixedIdentityProvider::signed_in(player("u1", "Ann")));
    let (state, store) = state_with_store(test_config(), provider).await;

    leaderboard_service::save_score(&state, "snake", None, 10.0, Default::default())
        .await
        .unwrap();
    leaderboard_service::save_score(&state, "jump", None, 20.0, Default::default())
        .await
        .unwrap();

    // profile write rejected: the change lands on the provider instead,
    // but historical entries are renamed all the same
    store.set_profile_writes_offline(true);
    let outcome = nickname_service::set_nickname(&state, "Neo").await.unwrap();
    assert!(!outcome.wrote_server);
    assert_eq!(outcome.renamed_entries(), 2);

    for game in ["snake", "jump"] {
        let entries = store.fetch_game_entries(game).await.unwrap();
        assert!(entries.iter().all(|e| e.name == "Neo"));
    }
}

#[tokio::test]
async fn nickname_daily_quota_is_enforced() {
    let mut config = test_config();
    config.nickname_cooldown_ms = 0;
    let provider = Arc::new(FixedIdentityProvider::signed_in(player("u1", "Ann")));
    let (state, _store) = state_with_store(config, provider).await;

    nickname_service::set_nickname(&state, "First").await.unwrap();
    nickname_service::set_nickname(&state, "Second").await.unwrap();
    let err = nickname_service::set_nickname(&state, "Third").await.unwrap_err();
    assert!(matches!(err, ServiceError::NicknameDailyLimit { limit: 2 }));
}

#[tokio::test]
async fn nickname_requires_a_session() {
    let (state, _store) =
        state_with_store(test_config(), Arc::new(NullIdentityProvider::new())).await;

    let err = nickname_service::set_nickname(&state, "Neo").await.unwrap_err();
    assert!(matches!(err, ServiceError::AuthRequired));
}

#[tokio::test]
async fn saved_scores_pick_up_the_stored_nickname() {
    let provider = Arc::new(FixedIdentityProvider::signed_in(player("u1", "Ann")));
    let (state, _store) = state_with_store(test_config(), provider).await;

    nickname_service::set_nickname(&state, "Neo").await.unwrap();
    let saved = leaderboard_service::save_score(&state, "snake", None, 5.0, Default::default())
        .await
        .unwrap();
    assert_eq!(saved.entry.name, "Neo");
}

#[tokio::test]
async fn prune_bounds_an_overgrown_collection() {
    let provider = Arc::new(FixedIdentityProvider::signed_in(player("u1", "Ann")));
    let (state, store) = state_with_store(test_config(), provider).await;

    // grow the collection past the cap behind the service's back
    for (score, ts) in [(1.0, 1), (5.0, 2), (3.0, 3), (4.0, 4), (2.0, 5)] {
        store
            .append_entry(hof_back::dao::models::NewScoreEntry {
                game_id: "snake".into(),
                name: "Ann".into(),
                score,
                ts,
                uid: Some("u1".into()),
                photo_url: None,
                provider: None,
                extra: Default::default(),
            })
            .await
            .unwrap();
    }

    let outcome = leaderboard_service::prune_game_rankings(&state, "snake", None)
        .await
        .unwrap();
    let kept: Vec<_> = outcome.kept.iter().map(|e| e.score).collect();
    assert_eq!(kept, [5.0, 4.0, 3.0]);
    assert_eq!(outcome.deleted, 2);

    let remaining = store.fetch_game_entries("snake").await.unwrap();
    assert_eq!(remaining.len(), 3);
}

#[tokio::test]
async fn clear_all_wipes_every_tier() {
    let provider = Arc::new(FixedIdentityProvider::signed_in(player("u1", "Ann")));
    let (state, store) = state_with_store(test_config(), provider).await;

    leaderboard_service::save_score(&state, "snake", None, 42.0, Default::default())
        .await
        .unwrap();
    assert!(celebration_service::check_and_celebrate(&state, "snake", 50.0)
        .await
        .unwrap()
        .celebrate);

    let outcome = leaderboard_service::clear_all_rankings(&state).await;
    assert!(outcome.remote_cleared);
    assert!(outcome.local_cleared);

    assert!(store.fetch_game_entries("snake").await.unwrap().is_empty());
    assert!(leaderboard_service::get_top_scores(&state, "snake", None, false)
        .await
        .is_empty());

    // celebration locks reset with the wipe
    assert!(celebration_service::check_and_celebrate(&state, "snake", 50.0)
        .await
        .unwrap()
        .celebrate);
}
