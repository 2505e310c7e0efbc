//! Authentication bootstrap
//!
//! Drives the session to readiness exactly once:
//! 1. Reuse an existing session if the provider has one
//! 2. Otherwise exchange the bootstrap token, if supplied
//! 3. Otherwise create an anonymous session
//!
//! Every path ends with `ready = true`, including failures, so consumers
//! never wait forever. Failures are reported through the notifier.

use crate::error::{AuthError, SessionError};
use crate::notify::{Notification, Notifier};
use crate::session::{SessionWriter, UserId};
use async_trait::async_trait;
use parking_lot::Mutex;

/// Upstream identity provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Session already established with the provider, if any
    async fn current_user(&self) -> Option<UserId>;

    /// Exchange a bootstrap token for a session
    async fn sign_in_with_token(&self, token: &str) -> Result<UserId, AuthError>;

    /// Create an anonymous session
    async fn sign_in_anonymously(&self) -> Result<UserId, AuthError>;
}

/// How the session became ready
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// Provider already had a session
    Existing(UserId),
    /// Bootstrap token exchanged
    TokenExchanged(UserId),
    /// Anonymous session created
    Anonymous(UserId),
    /// Authentication failed; ready without identity
    Failed(AuthError),
}

impl BootstrapOutcome {
    /// Identity established, if any
    #[must_use]
    pub fn identity(&self) -> Option<&UserId> {
        match self {
            Self::Existing(id) | Self::TokenExchanged(id) | Self::Anonymous(id) => Some(id),
            Self::Failed(_) => None,
        }
    }
}

/// Bring the session to readiness.
///
/// # Errors
/// - `SessionError::AlreadyReady` if the session was bootstrapped before
pub async fn bootstrap(
    provider: &dyn AuthProvider,
    token: Option<&str>,
    writer: &mut SessionWriter,
    notifier: &dyn Notifier,
) -> Result<BootstrapOutcome, SessionError> {
    if writer.current().is_ready() {
        return Err(SessionError::AlreadyReady);
    }

    let outcome = if let Some(user) = provider.current_user().await {
        BootstrapOutcome::Existing(user)
    } else {
        let attempt = match token {
            Some(token) => provider
                .sign_in_with_token(token)
                .await
                .map(BootstrapOutcome::TokenExchanged),
            None => provider
                .sign_in_anonymously()
                .await
                .map(BootstrapOutcome::Anonymous),
        };
        attempt.unwrap_or_else(|e| {
            tracing::error!("authentication error: {e}");
            notifier.notify(Notification::error(format!("Authentication error: {e}")));
            BootstrapOutcome::Failed(e)
        })
    };

    writer.mark_ready(outcome.identity().cloned())?;
    Ok(outcome)
}

/// Provider that issues local identities.
///
/// Accepts any token from its allow-list; anonymous sign-in can be disabled
/// to exercise the failure path.
#[derive(Debug, Default)]
pub struct LocalAuthProvider {
    existing: Mutex<Option<UserId>>,
    accepted_tokens: Vec<String>,
    anonymous_disabled: bool,
}

impl LocalAuthProvider {
    /// Provider with no session and anonymous sign-in enabled
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing session
    #[must_use]
    pub fn with_existing(self, user: UserId) -> Self {
        *self.existing.lock() = Some(user);
        self
    }

    /// Accept a bootstrap token
    #[must_use]
    pub fn accepting_token(mut self, token: impl Into<String>) -> Self {
        self.accepted_tokens.push(token.into());
        self
    }

    /// Refuse anonymous sign-in
    #[inline]
    #[must_use]
    pub fn without_anonymous(mut self) -> Self {
        self.anonymous_disabled = true;
        self
    }

    fn establish(&self, prefix: &str) -> UserId {
        let user = UserId::new(format!("{prefix}-{}", ulid::Ulid::new()));
        *self.existing.lock() = Some(user.clone());
        user
    }
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    async fn current_user(&self) -> Option<UserId> {
        self.existing.lock().clone()
    }

    async fn sign_in_with_token(&self, token: &str) -> Result<UserId, AuthError> {
        if self.accepted_tokens.iter().any(|t| t == token) {
            Ok(self.establish("token"))
        } else {
            Err(AuthError::TokenRejected("invalid custom token".into()))
        }
    }

    async fn sign_in_anonymously(&self) -> Result<UserId, AuthError> {
        if self.anonymous_disabled {
            return Err(AuthError::AnonymousDisabled);
        }
        Ok(self.establish("anon"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotificationCenter;
    use crate::session::session_channel;

    #[tokio::test]
    async fn existing_session_skips_sign_in() {
        let mut provider = MockAuthProvider::new();
        provider
            .expect_current_user()
            .returning(|| Some(UserId::new("returning")));
        provider.expect_sign_in_with_token().never();
        provider.expect_sign_in_anonymously().never();

        let (mut writer, reader) = session_channel();
        let notifier = NotificationCenter::default();
        let outcome = bootstrap(&provider, Some("tok"), &mut writer, &notifier)
            .await
            .unwrap();

        assert_eq!(outcome, BootstrapOutcome::Existing(UserId::new("returning")));
        assert!(reader.current().is_authenticated());
    }

    #[tokio::test]
    async fn token_is_exchanged_when_present() {
        let mut provider = MockAuthProvider::new();
        provider.expect_current_user().returning(|| None);
        provider
            .expect_sign_in_with_token()
            .withf(|token| token == "bootstrap-token")
            .times(1)
            .returning(|_| Ok(UserId::new("from-token")));
        provider.expect_sign_in_anonymously().never();

        let (mut writer, reader) = session_channel();
        let notifier = NotificationCenter::default();
        bootstrap(&provider, Some("bootstrap-token"), &mut writer, &notifier)
            .await
            .unwrap();

        assert_eq!(reader.current().identity(), Some(&UserId::new("from-token")));
    }

    #[tokio::test]
    async fn anonymous_without_token() {
        let provider = LocalAuthProvider::new();
        let (mut writer, reader) = session_channel();
        let notifier = NotificationCenter::default();

        let outcome = bootstrap(&provider, None, &mut writer, &notifier)
            .await
            .unwrap();

        assert!(matches!(outcome, BootstrapOutcome::Anonymous(_)));
        assert!(reader.current().is_authenticated());
        assert!(notifier.current().is_none());
    }

    #[tokio::test]
    async fn failure_still_converges_to_ready() {
        let provider = LocalAuthProvider::new().without_anonymous();
        let (mut writer, reader) = session_channel();
        let notifier = NotificationCenter::default();

        let outcome = bootstrap(&provider, None, &mut writer, &notifier)
            .await
            .unwrap();

        assert_eq!(outcome, BootstrapOutcome::Failed(AuthError::AnonymousDisabled));
        let session = reader.current();
        assert!(session.is_ready());
        assert!(session.identity().is_none());
        let shown = notifier.current().unwrap();
        assert!(shown.is_error());
        assert_eq!(shown.message, "Authentication error: anonymous sign-in disabled");
    }

    #[tokio::test]
    async fn rejected_token_converges_to_ready() {
        let provider = LocalAuthProvider::new().accepting_token("good");
        let (mut writer, reader) = session_channel();
        let notifier = NotificationCenter::default();

        let outcome = bootstrap(&provider, Some("bad"), &mut writer, &notifier)
            .await
            .unwrap();

        assert!(matches!(outcome, BootstrapOutcome::Failed(AuthError::TokenRejected(_))));
        assert!(reader.current().is_ready());
    }

    #[tokio::test]
    async fn second_bootstrap_is_refused() {
        let provider = LocalAuthProvider::new();
        let (mut writer, _reader) = session_channel();
        let notifier = NotificationCenter::default();

        bootstrap(&provider, None, &mut writer, &notifier).await.unwrap();
        let again = bootstrap(&provider, None, &mut writer, &notifier).await;
        assert_eq!(again, Err(SessionError::AlreadyReady));
    }
}
