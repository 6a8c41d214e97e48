use super::permission::PermissionState;
use super::surface::{ChannelSpec, Notification, NotificationSurface, SurfaceError};
use crate::content::ContentItem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Notification permission not granted")]
    PermissionDenied,

    #[error("Notification channel '{0}' has not been established")]
    ChannelNotEstablished(String),

    #[error("Notification surface fault: {0}")]
    Surface(String),
}

impl From<SurfaceError> for DeliveryError {
    fn from(err: SurfaceError) -> Self {
        match err {
            SurfaceError::UnknownChannel(id) => DeliveryError::ChannelNotEstablished(id),
            other => DeliveryError::Surface(other.to_string()),
        }
    }
}

/// Turns a selected item into a user-visible notification.
///
/// Every delivery goes to the same notification id, so a newer notification
/// replaces the previous one instead of stacking.
pub struct DeliverySink {
    surface: Arc<dyn NotificationSurface>,
    channel: ChannelSpec,
    notification_id: u32,
    established: AtomicBool,
}

impl DeliverySink {
    pub fn new(
        surface: Arc<dyn NotificationSurface>,
        channel: ChannelSpec,
        notification_id: u32,
    ) -> Self {
        Self {
            surface,
            channel,
            notification_id,
            established: AtomicBool::new(false),
        }
    }

    pub fn channel(&self) -> &ChannelSpec {
        &self.channel
    }

    pub fn notification_id(&self) -> u32 {
        self.notification_id
    }

    pub fn is_established(&self) -> bool {
        self.established.load(Ordering::SeqCst)
    }

    /// Create the delivery channel. Safe to call any number of times.
    pub fn establish_channel(&self) -> Result<(), DeliveryError> {
        let created = self.surface.create_channel(&self.channel)?;
        if created {
            info!(channel = %self.channel.id, "Notification channel created");
        } else {
            debug!(channel = %self.channel.id, "Notification channel already exists");
        }
        self.established.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Post `item` under the fixed notification id.
    ///
    /// Without permission nothing is posted and `PermissionDenied` is returned.
    pub async fn deliver(
        &self,
        item: &ContentItem,
        permission: PermissionState,
    ) -> Result<(), DeliveryError> {
        if !permission.granted {
            debug!(title = %item.title, "Skipping notification, permission not granted");
            return Err(DeliveryError::PermissionDenied);
        }
        if !self.is_established() {
            return Err(DeliveryError::ChannelNotEstablished(
                self.channel.id.clone(),
            ));
        }

        let notification = Notification {
            channel_id: self.channel.id.clone(),
            title: item.title.clone(),
            body: item.description.clone(),
            subtitle: item.captured_at.clone(),
        };
        self.surface
            .post(self.notification_id, notification)
            .await?;
        debug!(id = self.notification_id, title = %item.title, "Notification posted");
        Ok(())
    }
}
