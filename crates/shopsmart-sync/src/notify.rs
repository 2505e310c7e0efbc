//! Notification boundary
//!
//! Every mutation outcome produces exactly one [`Notification`]. The
//! [`NotificationCenter`] shows the latest one and auto-dismisses it after a
//! fixed interval unless a newer notification superseded it first.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Default auto-dismiss interval
pub const DEFAULT_DISMISS_AFTER: Duration = Duration::from_millis(5000);

/// Outcome class of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Operation succeeded
    Success,
    /// Operation failed
    Error,
}

/// User-facing outcome message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Human-readable text
    pub message: String,
    /// Success or error
    pub kind: NotificationKind,
}

impl Notification {
    /// Success notification
    #[inline]
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NotificationKind::Success,
        }
    }

    /// Error notification
    #[inline]
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NotificationKind::Error,
        }
    }

    /// Check if this reports a failure
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.kind == NotificationKind::Error
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Sink for outcome notifications
pub trait Notifier: Send + Sync {
    /// Publish a notification
    fn notify(&self, notification: Notification);
}

/// Notification currently on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveNotification {
    /// Monotone sequence number; newer notifications supersede older ones
    pub seq: u64,
    /// The notification
    pub notification: Notification,
}

/// Shows the latest notification and dismisses it on a timer
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    tx: watch::Sender<Option<ActiveNotification>>,
    next_seq: Arc<AtomicU64>,
    dismiss_after: Duration,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(DEFAULT_DISMISS_AFTER)
    }
}

impl NotificationCenter {
    /// Create center with an auto-dismiss interval
    #[must_use]
    pub fn new(dismiss_after: Duration) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            tx,
            next_seq: Arc::new(AtomicU64::new(0)),
            dismiss_after,
        }
    }

    /// Notification on screen, if any
    #[must_use]
    pub fn current(&self) -> Option<Notification> {
        self.tx.borrow().as_ref().map(|a| a.notification.clone())
    }

    /// Watch the on-screen notification
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<ActiveNotification>> {
        self.tx.subscribe()
    }

    /// Close the on-screen notification now
    pub fn dismiss(&self) {
        self.tx.send_replace(None);
    }

    /// Auto-dismiss interval
    #[inline]
    #[must_use]
    pub fn dismiss_after(&self) -> Duration {
        self.dismiss_after
    }

    fn schedule_dismiss(&self, seq: u64) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(seq, "no runtime, notification stays until superseded");
            return;
        };
        let tx = self.tx.clone();
        let after = self.dismiss_after;
        runtime.spawn(async move {
            tokio::time::sleep(after).await;
            // Only clear our own notification, never a newer one
            tx.send_if_modified(|current| match current {
                Some(active) if active.seq == seq => {
                    *current = None;
                    true
                }
                _ => false,
            });
        });
    }
}

impl Notifier for NotificationCenter {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => {
                tracing::info!(message = %notification.message, "notification");
            }
            NotificationKind::Error => {
                tracing::warn!(message = %notification.message, "notification");
            }
        }
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.tx.send_replace(Some(ActiveNotification { seq, notification }));
        self.schedule_dismiss(seq);
    }
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, notification: Notification) {
        (**self).notify(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn auto_dismisses_after_interval() {
        let center = NotificationCenter::default();
        center.notify(Notification::success("Equipment added successfully!"));
        assert_eq!(
            center.current(),
            Some(Notification::success("Equipment added successfully!"))
        );

        tokio::time::sleep(Duration::from_millis(4999)).await;
        assert!(center.current().is_some());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(center.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn newer_notification_supersedes_timer() {
        let center = NotificationCenter::default();
        center.notify(Notification::success("first"));

        tokio::time::sleep(Duration::from_millis(3000)).await;
        center.notify(Notification::error("second"));

        // First timer fires here but must not clear the second notification
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(center.current(), Some(Notification::error("second")));

        tokio::time::sleep(Duration::from_millis(2600)).await;
        assert!(center.current().is_none());
    }

    #[tokio::test]
    async fn manual_dismiss() {
        let center = NotificationCenter::default();
        center.notify(Notification::error("boom"));
        center.dismiss();
        assert!(center.current().is_none());
    }

    #[test]
    fn works_without_runtime() {
        let center = NotificationCenter::default();
        center.notify(Notification::success("saved"));
        assert_eq!(center.current().map(|n| n.message), Some("saved".to_string()));
    }

    #[test]
    fn kind_serializes_lowercase() {
        let json = serde_json::to_string(&Notification::error("x")).unwrap();
        assert_eq!(json, r#"{"message":"x","kind":"error"}"#);
    }
}
