mod auth;

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::sync::{RwLock, watch};
use tokio::time::timeout;

use crate::{
    config::AppConfig,
    dao::{identity::IdentityProvider, local::LocalStore, rank_store::RankStore},
};

pub use self::auth::AuthHub;

pub type SharedState = Arc<AppState>;

/// Longest a read or write path will wait for the remote bootstrap before
/// proceeding with whatever tier is available.
pub const REMOTE_BOOTSTRAP_WAIT: Duration = Duration::from_millis(1200);

/// Lifecycle of the remote leaderboard tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemotePhase {
    /// Nothing attempted yet.
    Uninitialized,
    /// The supervisor is connecting (or reconnecting after an outage).
    Connecting,
    /// A store is installed and was healthy at last check.
    Ready,
    /// No remote backend is configured for this process at all.
    Disabled,
}

/// Central application state shared by every handler and background task.
pub struct AppState {
    config: AppConfig,
    rank_store: RwLock<Option<Arc<dyn RankStore>>>,
    remote_phase: watch::Sender<RemotePhase>,
    provider: Arc<dyn IdentityProvider>,
    auth: AuthHub,
    local: LocalStore,
    /// Celebration session locks: one celebration per (game, score) pair.
    celebrated: DashMap<(String, i64), ()>,
    /// Read-through cache of stored nicknames, keyed by uid.
    nickname_cache: DashMap<String, String>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The remote tier starts uninitialized; the storage supervisor (or
    /// [`AppState::mark_remote_disabled`]) moves it along.
    pub fn new(config: AppConfig, provider: Arc<dyn IdentityProvider>) -> SharedState {
        let local = LocalStore::new(config.data_dir.clone());
        let (remote_phase, _rx) = watch::channel(RemotePhase::Uninitialized);
        Arc::new(Self {
            config,
            rank_store: RwLock::new(None),
            remote_phase,
            provider,
            auth: AuthHub::new(),
            local,
            celebrated: DashMap::new(),
            nickname_cache: DashMap::new(),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.provider
    }

    pub fn auth(&self) -> &AuthHub {
        &self.auth
    }

    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    /// Obtain a handle to the current remote store, if one is installed.
    pub async fn rank_store(&self) -> Option<Arc<dyn RankStore>> {
        let guard = self.rank_store.read().await;
        guard.as_ref().cloned()
    }

    /// Install a remote store and mark the tier ready.
    pub async fn install_rank_store(&self, store: Arc<dyn RankStore>) {
        {
            let mut guard = self.rank_store.write().await;
            *guard = Some(store);
        }
        self.set_remote_phase(RemotePhase::Ready);
    }

    /// Drop the remote store after a failed health check; the supervisor
    /// keeps reconnecting.
    pub async fn clear_rank_store(&self) {
        {
            let mut guard = self.rank_store.write().await;
            guard.take();
        }
        self.set_remote_phase(RemotePhase::Connecting);
    }

    /// Record that this process has no remote backend configured, which
    /// unlocks the pure-local write paths.
    pub fn mark_remote_disabled(&self) {
        self.set_remote_phase(RemotePhase::Disabled);
    }

    pub fn set_remote_phase(&self, phase: RemotePhase) {
        let _ = self.remote_phase.send(phase);
    }

    pub fn remote_phase(&self) -> RemotePhase {
        *self.remote_phase.borrow()
    }

    /// Subscribe to remote tier lifecycle updates.
    pub fn remote_phase_watcher(&self) -> watch::Receiver<RemotePhase> {
        self.remote_phase.subscribe()
    }

    /// Resolve the remote store, waiting out an in-flight bootstrap.
    ///
    /// Waits at most [`REMOTE_BOOTSTRAP_WAIT`] while the tier is still
    /// uninitialized or connecting, then answers with whatever is installed.
    /// Never errors: callers decide what an absent remote means for them.
    pub async fn ensure_remote(&self) -> Option<Arc<dyn RankStore>> {
        if matches!(
            self.remote_phase(),
            RemotePhase::Ready | RemotePhase::Disabled
        ) {
            return self.rank_store().await;
        }

        let mut rx = self.remote_phase_watcher();
        let _ = timeout(REMOTE_BOOTSTRAP_WAIT, async {
            while matches!(
                *rx.borrow_and_update(),
                RemotePhase::Uninitialized | RemotePhase::Connecting
            ) {
                if rx.changed().await.is_err() {
                    break;
                }
            }
        })
        .await;

        self.rank_store().await
    }

    /// Take the one-shot celebration lock for a (game, score) pair.
    ///
    /// Returns `true` the first time a pair is seen in this session; repeat
    /// attempts for the same pair are rejected so a celebration cannot fire
    /// twice for one run.
    pub fn celebration_guard(&self, game_id: &str, score: f64) -> bool {
        let key = (game_id.to_owned(), (score * 100.0).round() as i64);
        if self.celebrated.contains_key(&key) {
            return false;
        }
        self.celebrated.insert(key, ());
        true
    }

    /// Forget every celebration lock (used by the admin wipe).
    pub fn reset_celebrations(&self) {
        self.celebrated.clear();
    }

    /// Cached stored-nickname lookup by uid.
    pub fn cached_nickname(&self, uid: &str) -> Option<String> {
        self.nickname_cache.get(uid).map(|name| name.clone())
    }

    /// Record a stored nickname in the read-through cache.
    pub fn cache_nickname(&self, uid: &str, name: &str) {
        self.nickname_cache.insert(uid.to_owned(), name.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::identity::NullIdentityProvider;

    fn scratch_state() -> SharedState {
        let mut config = AppConfig::default();
        config.data_dir = std::env::temp_dir().join(format!(
            "hof-state-{}",
            uuid::Uuid::new_v4().simple()
        ));
        AppState::new(config, Arc::new(NullIdentityProvider::new()))
    }

    #[tokio::test]
    async fn ensure_remote_short_circuits_when_disabled() {
        let state = scratch_state();
        state.mark_remote_disabled();
        let started = std::time::Instant::now();
        assert!(state.ensure_remote().await.is_none());
        assert!(started.elapsed() < REMOTE_BOOTSTRAP_WAIT);
    }

    #[cfg(feature = "memory-store")]
    #[tokio::test]
    async fn ensure_remote_waits_for_install() {
        let state = scratch_state();
        state.set_remote_phase(RemotePhase::Connecting);

        let installer = state.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            installer
                .install_rank_store(Arc::new(
                    crate::dao::rank_store::memory::MemoryRankStore::new(),
                ))
                .await;
        });

        assert!(state.ensure_remote().await.is_some());
    }

    #[tokio::test]
    async fn celebration_guard_is_single_shot_per_pair() {
        let state = scratch_state();
        assert!(state.celebration_guard("snake", 42.5));
        assert!(!state.celebration_guard("snake", 42.5));
        assert!(state.celebration_guard("snake", 43.0));
        assert!(state.celebration_guard("jump", 42.5));
        state.reset_celebrations();
        assert!(state.celebration_guard("snake", 42.5));
    }
}
