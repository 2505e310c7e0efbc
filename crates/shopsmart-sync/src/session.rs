//! Session context
//!
//! The authenticated identity and readiness flag, published as immutable
//! [`Session`] snapshots:
//! - one [`SessionWriter`], owned by the authentication bootstrap
//! - any number of [`SessionReader`]s, injected into consumers
//!
//! Readiness is monotone. Identity may be reassigned once after readiness.

use crate::error::SessionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::watch;

/// Opaque identifier of the authenticated session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap a provider-issued identifier
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable session snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    identity: Option<UserId>,
    ready: bool,
}

impl Session {
    /// Process-start state: no identity, not ready
    #[inline]
    #[must_use]
    pub fn pending() -> Self {
        Self::default()
    }

    /// Ready session with an identity
    #[inline]
    #[must_use]
    pub fn authenticated(identity: UserId) -> Self {
        Self {
            identity: Some(identity),
            ready: true,
        }
    }

    /// Ready session whose authentication failed
    #[inline]
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self {
            identity: None,
            ready: true,
        }
    }

    /// Current identity, if any
    #[inline]
    #[must_use]
    pub fn identity(&self) -> Option<&UserId> {
        self.identity.as_ref()
    }

    /// Check readiness
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Ready and carrying an identity
    #[inline]
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.ready && self.identity.is_some()
    }
}

/// Create the writer/reader pair for a process
#[must_use]
pub fn session_channel() -> (SessionWriter, SessionReader) {
    let (tx, rx) = watch::channel(Session::pending());
    (
        SessionWriter {
            tx,
            reassigned: false,
        },
        SessionReader { rx },
    )
}

/// Single write entry point for the session
#[derive(Debug)]
pub struct SessionWriter {
    tx: watch::Sender<Session>,
    reassigned: bool,
}

impl SessionWriter {
    /// Transition to ready. Allowed exactly once.
    ///
    /// # Errors
    /// - `SessionError::AlreadyReady` on a second call
    pub fn mark_ready(&mut self, identity: Option<UserId>) -> Result<(), SessionError> {
        if self.tx.borrow().ready {
            return Err(SessionError::AlreadyReady);
        }
        tracing::info!(
            identity = identity.as_ref().map_or("<none>", UserId::as_str),
            "session ready"
        );
        self.tx.send_replace(Session {
            identity,
            ready: true,
        });
        Ok(())
    }

    /// Replace the identity after upstream re-authentication. Allowed once.
    ///
    /// # Errors
    /// - `SessionError::NotReady` before [`Self::mark_ready`]
    /// - `SessionError::IdentityAlreadyReassigned` on a second reassignment
    pub fn reassign_identity(&mut self, identity: UserId) -> Result<(), SessionError> {
        if !self.tx.borrow().ready {
            return Err(SessionError::NotReady);
        }
        if self.reassigned {
            return Err(SessionError::IdentityAlreadyReassigned);
        }
        if self.tx.borrow().identity.as_ref() == Some(&identity) {
            return Ok(());
        }
        tracing::info!(identity = %identity, "session identity reassigned");
        self.reassigned = true;
        self.tx.send_replace(Session::authenticated(identity));
        Ok(())
    }

    /// Reader for injection into consumers
    #[inline]
    #[must_use]
    pub fn reader(&self) -> SessionReader {
        SessionReader {
            rx: self.tx.subscribe(),
        }
    }

    /// Current snapshot
    #[inline]
    #[must_use]
    pub fn current(&self) -> Session {
        self.tx.borrow().clone()
    }
}

/// Read-only view of the session
#[derive(Debug, Clone)]
pub struct SessionReader {
    rx: watch::Receiver<Session>,
}

impl SessionReader {
    /// Reader over a session that never changes
    #[must_use]
    pub fn fixed(session: Session) -> Self {
        let (_tx, rx) = watch::channel(session);
        Self { rx }
    }

    /// Current snapshot
    #[inline]
    #[must_use]
    pub fn current(&self) -> Session {
        self.rx.borrow().clone()
    }

    /// Wait until the session is ready.
    ///
    /// # Errors
    /// - `SessionError::NotReady` if the writer went away before readiness
    pub async fn wait_ready(&mut self) -> Result<Session, SessionError> {
        self.rx
            .wait_for(Session::is_ready)
            .await
            .map(|session| session.clone())
            .map_err(|_| SessionError::NotReady)
    }

    /// Wait for the next published snapshot. `None` once the writer is gone.
    pub async fn changed(&mut self) -> Option<Session> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}
