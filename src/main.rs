//! Hall of Fame Back binary entrypoint wiring the HTTP surface, the remote
//! leaderboard supervisor, and the identity provider.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hof_back::{
    config::AppConfig,
    dao::identity::{FixedIdentityProvider, Identity, IdentityProvider, NullIdentityProvider},
    routes,
    services::{auth_service, remote_supervisor},
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let provider = build_identity_provider();
    let app_state = AppState::new(config, provider);

    auth_service::spawn_auth_forwarder(app_state.clone());
    spawn_remote_backend(app_state.clone());

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Start the backend selected by `STORE_BACKEND` ("rest", "memory" or
/// "none"); anything unrecognized runs local-only.
fn spawn_remote_backend(state: SharedState) {
    let backend = env::var("STORE_BACKEND").unwrap_or_else(|_| "rest".into());
    match backend.as_str() {
        #[cfg(feature = "rest-store")]
        "rest" => {
            use hof_back::dao::rank_store::{
                RankStore,
                rest::{RestConfig, RestRankStore},
            };

            tokio::spawn(remote_supervisor::run(state, || async {
                let config = RestConfig::from_env()?;
                let store = RestRankStore::connect(config).await?;
                Ok(Arc::new(store) as Arc<dyn RankStore>)
            }));
        }
        #[cfg(feature = "memory-store")]
        "memory" => {
            use hof_back::dao::rank_store::{RankStore, memory::MemoryRankStore};

            info!("using in-memory leaderboard store");
            tokio::spawn(remote_supervisor::run(state, || async {
                Ok(Arc::new(MemoryRankStore::new()) as Arc<dyn RankStore>)
            }));
        }
        "none" => {
            info!("remote leaderboard disabled; running local-only");
            state.mark_remote_disabled();
        }
        other => {
            warn!(backend = other, "unknown STORE_BACKEND; running local-only");
            state.mark_remote_disabled();
        }
    }
}

/// Pick the identity provider: a fixed development identity when
/// `HOF_FIXED_IDENTITY_UID` is set, otherwise the signed-out null provider.
fn build_identity_provider() -> Arc<dyn IdentityProvider> {
    match env::var("HOF_FIXED_IDENTITY_UID") {
        Ok(uid) if !uid.is_empty() => {
            let identity = Identity {
                uid,
                display_name: env::var("HOF_FIXED_IDENTITY_NAME")
                    .unwrap_or_else(|_| "Player".into()),
                email: env::var("HOF_FIXED_IDENTITY_EMAIL").unwrap_or_default(),
                photo_url: String::new(),
            };
            info!(uid = %identity.uid, "using fixed identity provider");
            Arc::new(FixedIdentityProvider::signed_in(identity))
        }
        _ => Arc::new(NullIdentityProvider::new()),
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
