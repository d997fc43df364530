use serde::Serialize;
use utoipa::ToSchema;

use crate::state::RemotePhase;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall status ("ok" or "degraded").
    pub status: String,
    /// Remote tier phase ("ready", "connecting", "disabled", "uninitialized").
    pub remote: String,
}

impl HealthResponse {
    /// Derive the payload from the remote tier phase. A disabled remote is
    /// "ok": the deployment runs local-only on purpose.
    pub fn from_phase(phase: RemotePhase) -> Self {
        let (status, remote) = match phase {
            RemotePhase::Ready => ("ok", "ready"),
            RemotePhase::Disabled => ("ok", "disabled"),
            RemotePhase::Connecting => ("degraded", "connecting"),
            RemotePhase::Uninitialized => ("degraded", "uninitialized"),
        };
        Self {
            status: status.to_owned(),
            remote: remote.to_owned(),
        }
    }
}
