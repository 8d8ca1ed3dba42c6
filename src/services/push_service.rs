// src/services/push_service.rs
use async_trait::async_trait;
use thiserror::Error;
use tracing;

use crate::{
    models::subscription::PushSubscriptionRecord,
    utils::vapid::{self, VapidCredentials},
};

/// Time the push service keeps an undelivered message, in seconds.
pub const DEFAULT_TTL: u32 = 86400;

#[derive(Debug, Error)]
pub enum PushError {
    #[error("Subscription is missing its p256dh/auth keys")]
    MissingSubscriptionKeys,

    #[error("Invalid VAPID credentials: {0}")]
    InvalidCredentials(String),

    #[error("Failed to sign VAPID JWT: {0}")]
    Signing(String),

    #[error("Failed to build web push message: {0}")]
    Message(String),

    #[error("Web push HTTP request failed: {0}")]
    Transport(String),

    #[error("Subscription expired (410 Gone)")]
    SubscriptionExpired,

    #[error("Push service rejected message (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Signs, encrypts and transmits one push message.
#[async_trait]
pub trait PushService: Send + Sync {
    async fn sign_and_send(
        &self,
        subscription: &PushSubscriptionRecord,
        payload: &[u8],
        credentials: &VapidCredentials,
    ) -> Result<(), PushError>;
}

/// Delivers through the subscription's push service.
///
/// `web-push` handles VAPID signing and RFC 8291 aes128gcm encryption; the HTTP
/// request itself goes out through `reqwest` so the client's connection pool is
/// reused across calls.
pub struct WebPushService {
    client: reqwest::Client,
    ttl: u32,
}

impl WebPushService {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            ttl: DEFAULT_TTL,
        }
    }
}

#[async_trait]
impl PushService for WebPushService {
    async fn sign_and_send(
        &self,
        subscription: &PushSubscriptionRecord,
        payload: &[u8],
        credentials: &VapidCredentials,
    ) -> Result<(), PushError> {
        use web_push::{ContentEncoding, SubscriptionInfo, VapidSignatureBuilder, WebPushMessageBuilder};

        let (p256dh, auth) = match (&subscription.keys.p256dh, &subscription.keys.auth) {
            (Some(p256dh), Some(auth)) if !p256dh.is_empty() && !auth.is_empty() => (p256dh, auth),
            _ => return Err(PushError::MissingSubscriptionKeys),
        };

        // web-push asserts on the key length instead of returning an error
        vapid::validate_private_key(&credentials.private_key)
            .map_err(|e| PushError::InvalidCredentials(e.to_string()))?;

        let sub_info = SubscriptionInfo::new(&subscription.endpoint, p256dh, auth);

        let mut sig_builder = VapidSignatureBuilder::from_base64(&credentials.private_key, &sub_info)
            .map_err(|e| PushError::InvalidCredentials(e.to_string()))?;
        sig_builder.add_claim("sub", credentials.subject.as_str());
        let signature = sig_builder.build().map_err(|e| PushError::Signing(e.to_string()))?;

        let mut builder = WebPushMessageBuilder::new(&sub_info);
        builder.set_payload(ContentEncoding::Aes128Gcm, payload);
        builder.set_vapid_signature(signature);
        builder.set_ttl(self.ttl);

        let message = builder.build().map_err(|e| PushError::Message(e.to_string()))?;

        let mut request = self
            .client
            .post(message.endpoint.to_string())
            .header("TTL", message.ttl.to_string());

        if let Some(urgency) = message.urgency {
            request = request.header("Urgency", urgency.to_string());
        }

        if let Some(topic) = message.topic {
            request = request.header("Topic", topic);
        }

        if let Some(push_payload) = message.payload {
            request = request
                .header("Content-Encoding", push_payload.content_encoding.to_str())
                .header("Content-Type", "application/octet-stream");

            for (key, value) in &push_payload.crypto_headers {
                request = request.header(*key, value.as_str());
            }

            request = request.body(push_payload.content);
        }

        tracing::info!("Sending web push to endpoint: {}", subscription.endpoint);

        let response = request
            .send()
            .await
            .map_err(|e| PushError::Transport(e.to_string()))?;
        let status = response.status().as_u16();

        match status {
            200..=299 => {
                tracing::debug!("Web push accepted (HTTP {})", status);
                Ok(())
            }
            410 => Err(PushError::SubscriptionExpired),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(PushError::Rejected { status, body })
            }
        }
    }
}

// Mock service for development and testing
#[derive(Debug)]
pub struct MockPushService;

#[async_trait]
impl PushService for MockPushService {
    async fn sign_and_send(
        &self,
        subscription: &PushSubscriptionRecord,
        payload: &[u8],
        _credentials: &VapidCredentials,
    ) -> Result<(), PushError> {
        tracing::info!(
            "[MOCK] Would send web push to {}: {}",
            subscription.endpoint,
            String::from_utf8_lossy(payload)
        );
        Ok(())
    }
}
