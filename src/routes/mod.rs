use axum::Router;

use crate::state::SharedState;

pub mod admin;
pub mod auth;
pub mod celebration;
pub mod docs;
pub mod health;
pub mod leaderboard;
pub mod nickname;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(leaderboard::router())
        .merge(celebration::router())
        .merge(nickname::router())
        .merge(auth::router())
        .merge(admin::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
