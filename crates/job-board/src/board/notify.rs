//! Notification trigger contract.
//!
//! Services publish [`Notification`]s after their primary write has committed. Publishing
//! failures are logged by the caller and never surface as operation errors.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::domain::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "user_id", rename_all = "snake_case")]
pub enum Recipient {
    User(UserId),
    AllUsers,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: Recipient,
    pub subject: String,
    pub body: String,
}

/// Outbound delivery hook (e-mail or similar adapters).
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
    #[error("notification queue closed")]
    QueueClosed,
}

/// Publisher that records deliveries in the service log instead of a mail transport.
#[derive(Debug, Clone)]
pub struct TracingNotifier {
    sender: String,
}

impl TracingNotifier {
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
        }
    }
}

impl NotificationPublisher for TracingNotifier {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        match &notification.recipient {
            Recipient::User(user) => info!(
                from = %self.sender,
                to = %user,
                subject = %notification.subject,
                "notification delivered"
            ),
            Recipient::AllUsers => info!(
                from = %self.sender,
                to = "all_users",
                subject = %notification.subject,
                "broadcast notification delivered"
            ),
        }
        Ok(())
    }
}

/// Decouples publishing from delivery: `publish` only enqueues, and a background task
/// drains the queue into the wrapped publisher.
#[derive(Debug, Clone)]
pub struct QueuedNotifier {
    queue: mpsc::UnboundedSender<Notification>,
}

impl QueuedNotifier {
    /// Spawn the delivery task on the current tokio runtime.
    pub fn spawn<P>(delivery: Arc<P>) -> (Self, JoinHandle<()>)
    where
        P: NotificationPublisher + 'static,
    {
        let (queue, mut inbox) = mpsc::unbounded_channel::<Notification>();
        let handle = tokio::spawn(async move {
            while let Some(notification) = inbox.recv().await {
                let subject = notification.subject.clone();
                if let Err(error) = delivery.publish(notification) {
                    warn!(%error, %subject, "notification delivery failed");
                }
            }
        });
        (Self { queue }, handle)
    }
}

impl NotificationPublisher for QueuedNotifier {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        self.queue
            .send(notification)
            .map_err(|_| NotificationError::QueueClosed)
    }
}

/// Publish and absorb any failure; notification is a side effect of the primary write.
pub(crate) fn dispatch<N: NotificationPublisher + ?Sized>(publisher: &N, notification: Notification) {
    let subject = notification.subject.clone();
    if let Err(error) = publisher.publish(notification) {
        warn!(%error, %subject, "notification dispatch failed");
    }
}
