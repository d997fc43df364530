//! Process-wide auth fan-out.
//!
//! The identity provider resolves sessions asynchronously at startup; the
//! hub records the latest answer and lets callers wait (briefly) for the
//! first one instead of treating "not yet resolved" as "signed out".

use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use tokio::sync::watch;
use tokio::time::timeout;

use crate::dao::identity::Identity;

/// Latest identity known to the process plus a "first answer arrived" flag.
pub struct AuthHub {
    tx: watch::Sender<Option<Identity>>,
    known: AtomicBool,
}

impl AuthHub {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            tx,
            known: AtomicBool::new(false),
        }
    }

    /// Record a provider answer and wake waiters.
    pub fn publish(&self, identity: Option<Identity>) {
        self.known.store(true, Ordering::SeqCst);
        let _ = self.tx.send(identity);
    }

    /// Latest published identity (None both before the first answer and when
    /// signed out; use [`AuthHub::wait_known`] to distinguish).
    pub fn current(&self) -> Option<Identity> {
        self.tx.borrow().clone()
    }

    /// Change feed over published identities.
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.tx.subscribe()
    }

    /// Whether the provider has answered at least once.
    pub fn is_known(&self) -> bool {
        self.known.load(Ordering::SeqCst)
    }

    /// Wait until the first provider answer lands, bounded by `limit`.
    ///
    /// Returns the identity known at that point; an elapsed wait is not an
    /// error, the caller just proceeds with the unresolved (None) view.
    pub async fn wait_known(&self, limit: Duration) -> Option<Identity> {
        if self.is_known() {
            return self.current();
        }
        let mut rx = self.subscribe();
        let _ = timeout(limit, rx.changed()).await;
        self.current()
    }
}

impl Default for AuthHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(uid: &str) -> Identity {
        Identity {
            uid: uid.into(),
            display_name: "Ann".into(),
            email: String::new(),
            photo_url: String::new(),
        }
    }

    #[tokio::test]
    async fn wait_known_returns_after_first_publish() {
        let hub = std::sync::Arc::new(AuthHub::new());
        assert!(!hub.is_known());

        let publisher = hub.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            publisher.publish(Some(identity("u1")));
        });

        let resolved = hub.wait_known(Duration::from_millis(500)).await;
        assert_eq!(resolved.map(|i| i.uid), Some("u1".to_owned()));
        assert!(hub.is_known());
    }

    #[tokio::test]
    async fn wait_known_gives_up_after_timeout() {
        let hub = AuthHub::new();
        let resolved = hub.wait_known(Duration::from_millis(20)).await;
        assert!(resolved.is_none());
        assert!(!hub.is_known());
    }
}
