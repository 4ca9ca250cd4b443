use serde::Serialize;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// How long a notification stays visible unless it is closed earlier
pub const NOTIFICATION_DURATION: Duration = Duration::from_millis(3000);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Success,
    Error,
}

/// Transient user facing message
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub status: NotificationStatus,
    pub title: String,
    pub description: String,
    pub duration_ms: u64,
    pub closable: bool,
    #[serde(skip)]
    created_at: Instant,
}

impl Notification {
    pub fn new(
        status: NotificationStatus,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            status,
            title: title.into(),
            description: description.into(),
            duration_ms: NOTIFICATION_DURATION.as_millis() as u64,
            closable: true,
            created_at: Instant::now(),
        }
    }

    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NotificationStatus::Success, title, description)
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NotificationStatus::Error, title, description)
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) >= Duration::from_millis(self.duration_ms)
    }
}

/// Notifications that are currently shown, oldest first
#[derive(Debug, Default)]
pub struct Notifications {
    items: Vec<Notification>,
}

impl Notifications {
    pub fn push(&mut self, notification: Notification) {
        log::debug!(
            "notification {:?}: {} - {}",
            notification.status,
            notification.title,
            notification.description
        );
        self.items.push(notification);
    }

    /// Close a notification early, returns false if it is already gone
    pub fn dismiss(&mut self, id: Uuid) -> bool {
        let len = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != len
    }

    /// Drop expired notifications and return the remaining ones
    pub fn active(&mut self, now: Instant) -> &[Notification] {
        self.items.retain(|n| !n.is_expired(now));
        &self.items
    }

    #[cfg(test)]
    pub fn last(&self) -> Option<&Notification> {
        self.items.last()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
