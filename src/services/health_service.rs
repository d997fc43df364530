use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with the current tier availability while logging connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    if let Some(store) = state.rank_store().await {
        if let Err(err) = store.health_check().await {
            warn!(error = %err, "remote health check failed");
        }
    }

    HealthResponse::from_phase(state.remote_phase())
}
