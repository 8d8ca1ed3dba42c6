// src/client/controller.rs
use base64::{
    Engine, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use thiserror::Error;
use tracing;

use crate::{
    client::platform::{PlatformError, PushPlatform, SubscribeOptions},
    models::{ApiResponse, PermissionState, PushSubscriptionRecord, SendNotificationRequest},
};

pub const SUBSCRIBE_PATH: &str = "/api/notifications/subscribe";
pub const SEND_PATH: &str = "/api/notifications/send";

pub const TEST_TITLE: &str = "Test Notification";
pub const TEST_BODY: &str = "This is a test notification from Todo House!";
pub const TEST_TAG: &str = "test";

// Keys are usually shared unpadded, but a padded copy should decode too.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Push notifications are not supported")]
    Unsupported,

    #[error("Notification permission not granted")]
    PermissionNotGranted,

    #[error("VAPID public key not configured")]
    MissingPublicKey,

    #[error("VAPID public key is not valid base64url: {0}")]
    InvalidPublicKey(String),

    #[error("No subscription available")]
    NoSubscription,

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("Failed to send notification")]
    Dispatch { reason: String },
}

/// Decodes a base64url VAPID key into the bytes the push manager expects.
pub fn url_base64_to_bytes(key: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_LENIENT.decode(key.trim())
}

/// Client-side state for one page session.
///
/// Tracks the permission, the held subscription and whether the platform can do push
/// at all. Every operation takes `&mut self`, so a controller never runs two
/// operations at once.
pub struct NotificationController<P> {
    platform: P,
    http: reqwest::Client,
    base_url: String,
    public_key: Option<String>,
    supported: bool,
    permission: PermissionState,
    subscription: Option<PushSubscriptionRecord>,
}

impl<P: PushPlatform> NotificationController<P> {
    /// Probes the platform and reads the current permission.
    pub fn new(platform: P, base_url: impl Into<String>, public_key: Option<String>) -> Self {
        Self::with_client(platform, reqwest::Client::new(), base_url, public_key)
    }

    pub fn with_client(
        platform: P,
        http: reqwest::Client,
        base_url: impl Into<String>,
        public_key: Option<String>,
    ) -> Self {
        let supported = platform.supports_service_worker() && platform.supports_push_manager();
        let permission = platform.permission();
        let base_url = base_url.into().trim_end_matches('/').to_string();

        tracing::debug!("Push support: {}, permission: {}", supported, permission);

        Self {
            platform,
            http,
            base_url,
            public_key: public_key.filter(|k| !k.trim().is_empty()),
            supported,
            permission,
            subscription: None,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.supported
    }

    pub fn permission(&self) -> PermissionState {
        self.permission
    }

    pub fn subscription(&self) -> Option<&PushSubscriptionRecord> {
        self.subscription.as_ref()
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Asks the user for notification permission.
    ///
    /// A denial is final for the session: later calls return `Denied` without
    /// prompting again, as browsers do.
    pub async fn request_permission(&mut self) -> Result<PermissionState, ControllerError> {
        if !self.supported {
            return Err(ControllerError::Unsupported);
        }

        if self.permission == PermissionState::Denied {
            return Ok(PermissionState::Denied);
        }

        let permission = self.platform.request_permission().await?;
        self.permission = permission;

        tracing::info!("Notification permission: {}", permission);
        Ok(permission)
    }

    /// Creates a push subscription and registers it with the server.
    ///
    /// Registration is best-effort: a failed POST is logged and the subscription
    /// is still returned.
    pub async fn subscribe(&mut self) -> Result<PushSubscriptionRecord, ControllerError> {
        if !self.supported || !self.permission.is_granted() {
            return Err(ControllerError::PermissionNotGranted);
        }

        let public_key = self.public_key.as_deref().ok_or(ControllerError::MissingPublicKey)?;
        let application_server_key =
            url_base64_to_bytes(public_key).map_err(|e| ControllerError::InvalidPublicKey(e.to_string()))?;

        let subscription = self
            .platform
            .subscribe(SubscribeOptions {
                user_visible_only: true,
                application_server_key,
            })
            .await?;

        self.subscription = Some(subscription.clone());
        self.register(&subscription).await;

        Ok(subscription)
    }

    async fn register(&self, subscription: &PushSubscriptionRecord) {
        let url = format!("{}{}", self.base_url, SUBSCRIBE_PATH);

        match self.http.post(&url).json(subscription).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!("Subscription registered with server");
            }
            Ok(response) => {
                tracing::warn!("Subscription registration returned HTTP {}", response.status());
            }
            Err(e) => {
                tracing::warn!("Subscription registration failed: {}", e);
            }
        }
    }

    /// Asks the server to push a fixed test notification to the held subscription.
    pub async fn send_test_notification(&self) -> Result<ApiResponse, ControllerError> {
        let subscription = self.subscription.as_ref().ok_or(ControllerError::NoSubscription)?;

        let request = SendNotificationRequest {
            subscription: Some(serde_json::to_value(subscription).map_err(|e| dispatch_error(e.to_string()))?),
            title: Some(TEST_TITLE.to_string()),
            body: Some(TEST_BODY.to_string()),
            tag: Some(TEST_TAG.to_string()),
        };

        let url = format!("{}{}", self.base_url, SEND_PATH);
        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| dispatch_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(dispatch_error(format!("server returned HTTP {}", response.status())));
        }

        response
            .json::<ApiResponse>()
            .await
            .map_err(|e| dispatch_error(e.to_string()))
    }
}

fn dispatch_error(reason: String) -> ControllerError {
    tracing::error!("Test notification failed: {}", reason);
    ControllerError::Dispatch { reason }
}
