//! Transient user notifications.
//!
//! Every user-facing outcome (import summaries, refusals, save/load results,
//! scanner failures) goes through one broadcast channel. Subscribers such as a
//! terminal or a UI shell receive each [`Notification`] and drop it once it
//! has expired.

use chrono::{DateTime, Utc};
use futures::stream::Stream;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub issued_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            issued_at: Utc::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message)
    }

    /// Whether `ttl` has elapsed since the notification was issued.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => now - self.issued_at >= ttl,
            Err(_) => false,
        }
    }
}

/// Global notification bus
pub static NOTIFIER: Lazy<Notifier> = Lazy::new(Notifier::new);

/// Broadcasts notifications to all subscribers
pub struct Notifier {
    sender: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Publish a notification to all subscribers
    pub fn publish(&self, notification: Notification) {
        let prefix = match notification.level {
            NotificationLevel::Info => "   ",
            NotificationLevel::Success => "   ✓",
            NotificationLevel::Warning => "   ⚠️",
            NotificationLevel::Error => "   ❌",
        };
        eprintln!("{} {}", prefix, notification.message);

        // No subscribers is fine
        let _ = self.sender.send(notification);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Subscription as a stream; lagged entries are skipped.
    pub fn subscribe_stream(&self) -> impl Stream<Item = Notification> {
        BroadcastStream::new(self.sender.subscribe()).filter_map(|result| result.ok())
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

pub fn notify_info(msg: impl Into<String>) {
    NOTIFIER.publish(Notification::info(msg));
}

pub fn notify_success(msg: impl Into<String>) {
    NOTIFIER.publish(Notification::success(msg));
}

pub fn notify_warning(msg: impl Into<String>) {
    NOTIFIER.publish(Notification::warning(msg));
}

pub fn notify_error(msg: impl Into<String>) {
    NOTIFIER.publish(Notification::error(msg));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;

    #[test]
    fn test_expiry() {
        let notification = Notification::info("hello");
        let ttl = Duration::from_secs(5);

        assert!(!notification.is_expired(notification.issued_at, ttl));
        assert!(notification.is_expired(
            notification.issued_at + chrono::Duration::seconds(5),
            ttl
        ));
    }

    #[tokio::test]
    async fn test_subscribers_receive_published_notifications() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();

        notifier.publish(Notification::success("saved"));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.level, NotificationLevel::Success);
        assert_eq!(received.message, "saved");
    }

    #[tokio::test]
    async fn test_stream_subscription() {
        let notifier = Notifier::new();
        let stream = notifier.subscribe_stream();
        tokio::pin!(stream);

        notifier.publish(Notification::error("boom"));

        let received = stream.next().await.unwrap();
        assert_eq!(received.message, "boom");
    }

    #[test]
    fn test_serialized_level_is_lowercase() {
        let json = serde_json::to_value(Notification::warning("w")).unwrap();
        assert_eq!(json["level"], "warning");
        assert!(json.get("issuedAt").is_some());
    }
}
