//! Notification surfaces: where posted notifications become visible.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Metadata of the named delivery channel notifications are posted on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// A rendered notification as handed to the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub channel_id: String,
    pub title: String,
    pub body: String,
    pub subtitle: String,
}

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Unknown notification channel: {0}")]
    UnknownChannel(String),

    #[error("Notification surface unavailable: {0}")]
    Unavailable(String),
}

/// The user-visible notification area.
///
/// Posting under an id that already holds a notification replaces it.
#[async_trait]
pub trait NotificationSurface: Send + Sync {
    /// Create `spec` on the surface. Returns `false` when it already existed.
    fn create_channel(&self, spec: &ChannelSpec) -> Result<bool, SurfaceError>;

    async fn post(&self, id: u32, notification: Notification) -> Result<(), SurfaceError>;

    /// Currently visible notifications, ordered by id.
    fn visible(&self) -> Vec<(u32, Notification)>;
}

#[derive(Default)]
struct SurfaceState {
    channels: HashMap<String, ChannelSpec>,
    slots: BTreeMap<u32, Notification>,
    posts: usize,
}

/// In-process surface keeping one slot per notification id.
#[derive(Default)]
pub struct MemorySurface {
    state: Mutex<SurfaceState>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of successful posts, replacements included.
    pub fn post_count(&self) -> usize {
        self.lock().posts
    }

    pub fn channel_count(&self) -> usize {
        self.lock().channels.len()
    }

    pub fn channel(&self, id: &str) -> Option<ChannelSpec> {
        self.lock().channels.get(id).cloned()
    }

    pub fn visible_for(&self, id: u32) -> Option<Notification> {
        self.lock().slots.get(&id).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `notification` in its slot. Returns whether a previous one was replaced.
    fn store(&self, id: u32, notification: Notification) -> Result<bool, SurfaceError> {
        let mut state = self.lock();
        if !state.channels.contains_key(&notification.channel_id) {
            return Err(SurfaceError::UnknownChannel(notification.channel_id));
        }
        state.posts += 1;
        Ok(state.slots.insert(id, notification).is_some())
    }
}

#[async_trait]
impl NotificationSurface for MemorySurface {
    fn create_channel(&self, spec: &ChannelSpec) -> Result<bool, SurfaceError> {
        let mut state = self.lock();
        if state.channels.contains_key(&spec.id) {
            return Ok(false);
        }
        state.channels.insert(spec.id.clone(), spec.clone());
        Ok(true)
    }

    async fn post(&self, id: u32, notification: Notification) -> Result<(), SurfaceError> {
        self.store(id, notification).map(|_| ())
    }

    fn visible(&self) -> Vec<(u32, Notification)> {
        self.lock()
            .slots
            .iter()
            .map(|(id, n)| (*id, n.clone()))
            .collect()
    }
}

/// Surface that prints each posted notification as a card on the terminal.
#[derive(Default)]
pub struct ConsoleSurface {
    inner: MemorySurface,
}

impl ConsoleSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationSurface for ConsoleSurface {
    fn create_channel(&self, spec: &ChannelSpec) -> Result<bool, SurfaceError> {
        self.inner.create_channel(spec)
    }

    async fn post(&self, id: u32, notification: Notification) -> Result<(), SurfaceError> {
        let replaced = self.inner.store(id, notification.clone())?;
        crate::cli_style::print_notification(id, &notification, replaced);
        Ok(())
    }

    fn visible(&self) -> Vec<(u32, Notification)> {
        self.inner.visible()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> ChannelSpec {
        ChannelSpec {
            id: "guide".to_string(),
            name: "Guide".to_string(),
            description: "Guide notifications".to_string(),
        }
    }

    fn notification(title: &str) -> Notification {
        Notification {
            channel_id: "guide".to_string(),
            title: title.to_string(),
            body: "body".to_string(),
            subtitle: "10:00:00".to_string(),
        }
    }

    #[test]
    fn test_create_channel_is_idempotent() {
        let surface = MemorySurface::new();
        assert!(surface.create_channel(&channel()).unwrap());
        assert!(!surface.create_channel(&channel()).unwrap());
        assert_eq!(surface.channel_count(), 1);
        assert_eq!(surface.channel("guide"), Some(channel()));
    }

    #[tokio::test]
    async fn test_post_requires_channel() {
        let surface = MemorySurface::new();
        let result = surface.post(1, notification("A")).await;
        assert!(matches!(result, Err(SurfaceError::UnknownChannel(id)) if id == "guide"));
        assert_eq!(surface.post_count(), 0);
        assert!(surface.visible().is_empty());
    }

    #[tokio::test]
    async fn test_same_id_replaces_previous() {
        let surface = MemorySurface::new();
        surface.create_channel(&channel()).unwrap();

        surface.post(7, notification("A")).await.unwrap();
        surface.post(7, notification("B")).await.unwrap();

        assert_eq!(surface.post_count(), 2);
        let visible = surface.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].0, 7);
        assert_eq!(visible[0].1.title, "B");
    }

    #[tokio::test]
    async fn test_distinct_ids_coexist() {
        let surface = MemorySurface::new();
        surface.create_channel(&channel()).unwrap();

        surface.post(2, notification("two")).await.unwrap();
        surface.post(1, notification("one")).await.unwrap();

        let ids: Vec<u32> = surface.visible().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(surface.visible_for(2).unwrap().title, "two");
    }
}
