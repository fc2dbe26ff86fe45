use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// Kind of transient notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

/// A single toast notification
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub kind: NotificationKind,
    pub created_at: Instant,
}

/// Auto-dismiss delay
pub const AUTO_DISMISS: Duration = Duration::from_secs(3);

#[derive(Debug, Default)]
struct Queue {
    next_id: u64,
    items: Vec<Notification>,
}

impl Queue {
    fn prune(&mut self, now: Instant) {
        self.items
            .retain(|n| now.saturating_duration_since(n.created_at) < AUTO_DISMISS);
    }
}

/// Queue of toasts shared by every component of one application session
#[derive(Debug, Default)]
pub struct Notifications {
    queue: Mutex<Queue>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a toast, dropping any that have already expired
    pub async fn push(&self, kind: NotificationKind, message: impl Into<String>) -> u64 {
        self.push_at(kind, message.into(), Instant::now()).await
    }

    async fn push_at(&self, kind: NotificationKind, message: String, now: Instant) -> u64 {
        let mut queue = self.queue.lock().await;
        queue.prune(now);
        queue.next_id += 1;
        let id = queue.next_id;

        match kind {
            NotificationKind::Error => tracing::warn!(id, message = %message, "Notification"),
            _ => tracing::debug!(id, message = %message, "Notification"),
        }

        queue.items.push(Notification {
            id,
            message,
            kind,
            created_at: now,
        });
        id
    }

    pub async fn success(&self, message: impl Into<String>) -> u64 {
        self.push(NotificationKind::Success, message).await
    }

    pub async fn error(&self, message: impl Into<String>) -> u64 {
        self.push(NotificationKind::Error, message).await
    }

    pub async fn info(&self, message: impl Into<String>) -> u64 {
        self.push(NotificationKind::Info, message).await
    }

    pub async fn dismiss(&self, id: u64) -> bool {
        let mut queue = self.queue.lock().await;
        let before = queue.items.len();
        queue.items.retain(|n| n.id != id);
        queue.items.len() != before
    }

    /// Notifications still on screen, oldest first; expired ones are dropped
    pub async fn active(&self) -> Vec<Notification> {
        self.active_at(Instant::now()).await
    }

    async fn active_at(&self, now: Instant) -> Vec<Notification> {
        let mut queue = self.queue.lock().await;
        queue.prune(now);
        queue.items.clone()
    }

    /// Most recent notification still held
    pub async fn latest(&self) -> Option<Notification> {
        self.queue.lock().await.items.last().cloned()
    }
}
