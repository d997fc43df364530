//! Interactive sign-in gating and session fan-out.
//!
//! Sign-in is refused up front in contexts where the provider's flow is
//! known to break: embedded in-app browsers, `file://` pages, and insecure
//! non-localhost origins. Session changes are mirrored into the local
//! rendering cache and the process-wide [`crate::state::AuthHub`].

use tracing::warn;

use crate::{
    dao::{
        identity::{Identity, ProviderError},
        models::{AuthCacheEntity, now_millis},
    },
    error::ServiceError,
    services::browser,
    state::SharedState,
};

/// Request context relevant to the sign-in gate, extracted from headers.
#[derive(Debug, Clone, Default)]
pub struct ClientContext {
    pub user_agent: String,
    /// Scheme of the calling page's origin.
    pub scheme: String,
    /// Host (and optional port) of the calling page's origin.
    pub host: String,
    /// Full URL to reopen in a real browser when one was provided.
    pub target_url: Option<String>,
}

/// Latest session information for rendering.
#[derive(Debug, Clone)]
pub struct SessionView {
    /// Live session, when one exists.
    pub identity: Option<Identity>,
    /// Stored nickname of the live session.
    pub nickname: Option<String>,
    /// Last-known identity snapshot, rendering only, never authorization.
    pub cached: Option<AuthCacheEntity>,
}

/// Run the interactive sign-in flow for the given calling context.
pub async fn sign_in(state: &SharedState, ctx: &ClientContext) -> Result<Identity, ServiceError> {
    if let Some(label) = browser::detect_embedded_browser(&ctx.user_agent) {
        let redirect = ctx
            .target_url
            .as_deref()
            .and_then(|target| browser::external_browser_url(target, &ctx.user_agent));
        return Err(ServiceError::AuthEmbeddedBrowserBlocked {
            browser: label.to_owned(),
            redirect,
        });
    }

    if ctx.scheme == "file" {
        return Err(ServiceError::AuthUnsupportedContext);
    }
    if ctx.scheme == "http" && !is_local_host(&ctx.host) {
        return Err(ServiceError::AuthInsecureContext);
    }

    match state.provider().sign_in().await {
        Ok(identity) => {
            remember_session(state, &identity);
            Ok(identity)
        }
        Err(err) => Err(map_provider_error(err)),
    }
}

/// Terminate the current session. A provider that is not configured at all
/// counts as already signed out.
pub async fn sign_out(state: &SharedState) -> Result<(), ServiceError> {
    match state.provider().sign_out().await {
        Ok(()) | Err(ProviderError::Unavailable) => {}
        Err(err) => return Err(ServiceError::SignInFailed(err.to_string())),
    }

    state.local().set_auth_cache(None);
    state.auth().publish(None);
    Ok(())
}

/// Session view for `GET /auth/me`: the live identity when present, the
/// cached snapshot otherwise.
pub async fn current_session(state: &SharedState) -> SessionView {
    let identity = state.provider().current_identity();

    let nickname = match &identity {
        Some(identity) => {
            super::nickname_service::server_nickname(state, &identity.uid).await
        }
        None => None,
    };

    let cached = if identity.is_none() {
        state.local().auth_cache()
    } else {
        None
    };

    SessionView {
        identity,
        nickname,
        cached,
    }
}

/// Mirror provider session changes into the hub and the rendering cache
/// for the lifetime of the process.
pub fn spawn_auth_forwarder(state: SharedState) {
    tokio::spawn(async move {
        let mut rx = state.provider().subscribe();
        loop {
            let identity = rx.borrow_and_update().clone();
            if let Some(ref identity) = identity {
                remember_session(&state, identity);
            } else {
                state.auth().publish(None);
            }
            if rx.changed().await.is_err() {
                warn!("identity provider feed closed");
                break;
            }
        }
    });
}

fn remember_session(state: &SharedState, identity: &Identity) {
    state.local().set_auth_cache(Some(&AuthCacheEntity {
        uid: identity.uid.clone(),
        display_name: identity.display_name.clone(),
        email: identity.email.clone(),
        photo_url: identity.photo_url.clone(),
        ts: now_millis(),
    }));
    state.auth().publish(Some(identity.clone()));
}

fn map_provider_error(err: ProviderError) -> ServiceError {
    match err {
        ProviderError::Unavailable => ServiceError::RemoteUnavailable,
        ProviderError::EmbeddedBrowserRejected => ServiceError::AuthEmbeddedBrowserBlocked {
            browser: "unknown".to_owned(),
            redirect: None,
        },
        ProviderError::StorageUnavailable => ServiceError::AuthStorageUnavailable,
        ProviderError::Interaction(message) => ServiceError::SignInFailed(message),
    }
}

fn is_local_host(host: &str) -> bool {
    let bare = if let Some(rest) = host.strip_prefix('[') {
        rest.split(']').next().unwrap_or(rest)
    } else {
        host.rsplit_once(':').map_or(host, |(h, _)| h)
    };
    matches!(bare, "localhost" | "127.0.0.1" | "::1" | "")
}
