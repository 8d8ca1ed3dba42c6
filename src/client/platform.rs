use async_trait::async_trait;
use thiserror::Error;

use crate::models::{PermissionState, PushSubscriptionRecord};

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("No active service worker registration")]
    NoServiceWorker,

    #[error("Push subscription rejected: {0}")]
    SubscriptionRejected(String),

    #[error("Permission prompt failed: {0}")]
    Prompt(String),
}

/// Options passed to the push manager when subscribing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeOptions {
    pub user_visible_only: bool,
    /// Decoded VAPID public key.
    pub application_server_key: Vec<u8>,
}

/// The browser capabilities the controller depends on.
#[async_trait]
pub trait PushPlatform: Send + Sync {
    fn supports_service_worker(&self) -> bool;

    fn supports_push_manager(&self) -> bool;

    /// Current notification permission, without prompting.
    fn permission(&self) -> PermissionState;

    /// Shows the permission dialog and resolves once the user answers.
    async fn request_permission(&self) -> Result<PermissionState, PlatformError>;

    /// Waits for the active service worker registration and subscribes through its
    /// push manager.
    async fn subscribe(&self, options: SubscribeOptions) -> Result<PushSubscriptionRecord, PlatformError>;
}
