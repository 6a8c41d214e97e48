//! Notification delivery: channel setup, permission gating, posting.

mod permission;
mod sink;
mod surface;

pub use permission::{InteractivePermission, PermissionProvider, PermissionState, StaticPermission};
pub use sink::{DeliveryError, DeliverySink};
pub use surface::{
    ChannelSpec, ConsoleSurface, MemorySurface, Notification, NotificationSurface, SurfaceError,
};
