//! Background supervisor owning the remote leaderboard connection.
//!
//! Connects with exponential backoff, installs the store into the shared
//! state, then polls its health. A failing store is retried in place a few
//! times before the connection is dropped and rebuilt from scratch; while no
//! store is installed the application serves from the lower tiers.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{rank_store::RankStore, storage::StorageError},
    state::{RemotePhase, SharedState},
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_HEALTH_RETRIES: u32 = 3;

/// Drive the remote connection lifecycle forever.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn RankStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;
    state.set_remote_phase(RemotePhase::Connecting);

    loop {
        match connect().await {
            Ok(store) => {
                state.install_rank_store(store.clone()).await;
                info!("remote leaderboard connected");
                delay = INITIAL_DELAY;

                loop {
                    sleep(HEALTH_POLL_INTERVAL).await;
                    if store.health_check().await.is_ok() {
                        continue;
                    }

                    let mut attempt = 0;
                    let mut retry_delay = INITIAL_DELAY;
                    let mut recovered = false;

                    while attempt < MAX_HEALTH_RETRIES {
                        match store.health_check().await {
                            Ok(()) => {
                                info!("remote leaderboard healthy again");
                                recovered = true;
                                break;
                            }
                            Err(err) => {
                                if attempt == 0 {
                                    warn!(
                                        attempt, error = %err,
                                        "remote health check failed; serving from lower tiers"
                                    );
                                    state.clear_rank_store().await;
                                } else {
                                    warn!(attempt, error = %err, "remote health retry failed");
                                }
                                attempt += 1;
                                sleep(retry_delay).await;
                                retry_delay = (retry_delay * 2).min(MAX_DELAY);
                            }
                        }
                    }

                    if recovered {
                        state.install_rank_store(store.clone()).await;
                    } else {
                        warn!("exhausted remote health retries; reconnecting from scratch");
                        break;
                    }
                }

                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
            Err(err) => {
                warn!(error = %err, "remote connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}
