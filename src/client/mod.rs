//! Client side of the notification flow.
//!
//! [`NotificationController`] drives permission, subscription and test sends against
//! a [`PushPlatform`], the seam behind which the browser's Notification, service
//! worker and PushManager APIs live. [`NotificationPanel`] adds the page behavior on
//! top: a loading guard, which action is offered, and the status line.

pub mod controller;
pub mod panel;
pub mod platform;

pub use controller::{ControllerError, NotificationController};
pub use panel::{NotificationPanel, PanelAction};
pub use platform::{PlatformError, PushPlatform, SubscribeOptions};
