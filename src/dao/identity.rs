use std::sync::{PoisonError, RwLock};

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::sync::watch;

/// Provider label recorded on entries written by a signed-in session.
pub const PROVIDER_LABEL: &str = "google";

/// Resolved identity as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Stable provider-assigned id.
    pub uid: String,
    /// Provider-given display name (a stored nickname overrides it at read time).
    pub display_name: String,
    pub email: String,
    pub photo_url: String,
}

/// Failures reported by an identity provider integration.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider integration is not configured or not reachable.
    #[error("identity provider unavailable")]
    Unavailable,
    /// The provider's policy rejected the calling embedded browser.
    #[error("identity provider rejected the embedded browser")]
    EmbeddedBrowserRejected,
    /// No persistence mode could be established for the session.
    #[error("no auth persistence mode could be established")]
    StorageUnavailable,
    /// The interactive flow failed for another reason.
    #[error("interactive sign-in failed: {0}")]
    Interaction(String),
}

/// Capability contract for the external identity provider.
///
/// Write-gating always goes through [`IdentityProvider::current_identity`],
/// never through any cached snapshot.
pub trait IdentityProvider: Send + Sync {
    /// Run the interactive sign-in flow.
    fn sign_in(&self) -> BoxFuture<'static, Result<Identity, ProviderError>>;
    /// Terminate the current session.
    fn sign_out(&self) -> BoxFuture<'static, Result<(), ProviderError>>;
    /// Identity of the current session, if any.
    fn current_identity(&self) -> Option<Identity>;
    /// Change feed delivering the latest known identity immediately.
    fn subscribe(&self) -> watch::Receiver<Option<Identity>>;
    /// Low-privilege profile update used when the profile store is not writable.
    fn update_display_name(&self, name: String) -> BoxFuture<'static, Result<(), ProviderError>>;
}

/// Provider used when no identity integration is configured: everyone is
/// signed out and interactive flows fail fast.
pub struct NullIdentityProvider {
    tx: watch::Sender<Option<Identity>>,
}

impl NullIdentityProvider {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }
}

impl Default for NullIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for NullIdentityProvider {
    fn sign_in(&self) -> BoxFuture<'static, Result<Identity, ProviderError>> {
        Box::pin(async { Err(ProviderError::Unavailable) })
    }

    fn sign_out(&self) -> BoxFuture<'static, Result<(), ProviderError>> {
        Box::pin(async { Ok(()) })
    }

    fn current_identity(&self) -> Option<Identity> {
        None
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.tx.subscribe()
    }

    fn update_display_name(&self, _name: String) -> BoxFuture<'static, Result<(), ProviderError>> {
        Box::pin(async { Err(ProviderError::Unavailable) })
    }
}

/// In-process provider holding one configured identity.
///
/// Intended for local development and tests where the real interactive
/// provider is out of reach; `sign_in` activates the configured identity.
pub struct FixedIdentityProvider {
    profile: RwLock<Identity>,
    signed_in: RwLock<bool>,
    tx: watch::Sender<Option<Identity>>,
}

impl FixedIdentityProvider {
    /// Create a provider that starts signed out.
    pub fn signed_out(profile: Identity) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            profile: RwLock::new(profile),
            signed_in: RwLock::new(false),
            tx,
        }
    }

    /// Create a provider with an already-active session.
    pub fn signed_in(profile: Identity) -> Self {
        let (tx, _rx) = watch::channel(Some(profile.clone()));
        Self {
            profile: RwLock::new(profile),
            signed_in: RwLock::new(true),
            tx,
        }
    }

    fn broadcast(&self) {
        let _ = self.tx.send(self.current_identity());
    }
}

impl IdentityProvider for FixedIdentityProvider {
    fn sign_in(&self) -> BoxFuture<'static, Result<Identity, ProviderError>> {
        *self.signed_in.write().unwrap_or_else(PoisonError::into_inner) = true;
        self.broadcast();
        let identity = self.profile.read().unwrap_or_else(PoisonError::into_inner).clone();
        Box::pin(async move { Ok(identity) })
    }

    fn sign_out(&self) -> BoxFuture<'static, Result<(), ProviderError>> {
        *self.signed_in.write().unwrap_or_else(PoisonError::into_inner) = false;
        self.broadcast();
        Box::pin(async { Ok(()) })
    }

    fn current_identity(&self) -> Option<Identity> {
        let signed_in = *self.signed_in.read().unwrap_or_else(PoisonError::into_inner);
        signed_in.then(|| self.profile.read().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.tx.subscribe()
    }

    fn update_display_name(&self, name: String) -> BoxFuture<'static, Result<(), ProviderError>> {
        {
            let mut profile = self.profile.write().unwrap_or_else(PoisonError::into_inner);
            profile.display_name = name;
        }
        self.broadcast();
        Box::pin(async { Ok(()) })
    }
}
