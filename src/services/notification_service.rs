// src/services/notification_service.rs
use std::sync::Arc;

use thiserror::Error;
use tracing;

use crate::{
    models::{notification::NotificationPayload, subscription::PushSubscriptionRecord},
    services::push_service::{PushError, PushService},
    state::{AppConfig, ConfigError},
    utils::vapid::VapidCredentials,
};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to encode payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error(transparent)]
    Push(#[from] PushError),
}

/// Sends one notification to one subscription with the configured VAPID identity.
pub struct NotificationDispatcher {
    config: Arc<AppConfig>,
    push_service: Arc<dyn PushService>,
}

impl NotificationDispatcher {
    pub fn new(config: Arc<AppConfig>, push_service: Arc<dyn PushService>) -> Self {
        Self { config, push_service }
    }

    /// Loads credentials before touching the network; missing keys fail here.
    pub async fn dispatch(
        &self,
        subscription: &PushSubscriptionRecord,
        payload: &NotificationPayload,
    ) -> Result<(), DispatchError> {
        let credentials = VapidCredentials::from_config(&self.config)?;
        let body = payload.to_json_bytes()?;

        tracing::debug!("Dispatching '{}' to {}", payload.title, subscription.endpoint);

        self.push_service
            .sign_and_send(subscription, &body, &credentials)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::DEFAULT_VAPID_SUBJECT;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingPushService {
        sent: Mutex<Vec<(String, Vec<u8>, String)>>,
    }

    #[async_trait]
    impl PushService for RecordingPushService {
        async fn sign_and_send(
            &self,
            subscription: &PushSubscriptionRecord,
            payload: &[u8],
            credentials: &VapidCredentials,
        ) -> Result<(), PushError> {
            self.sent.lock().unwrap().push((
                subscription.endpoint.clone(),
                payload.to_vec(),
                credentials.subject.clone(),
            ));
            Ok(())
        }
    }

    fn config(with_keys: bool) -> Arc<AppConfig> {
        Arc::new(AppConfig {
            vapid_public_key: with_keys.then(|| "pub".to_string()),
            vapid_private_key: with_keys.then(|| "priv".to_string()),
            vapid_subject: DEFAULT_VAPID_SUBJECT.to_string(),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            mock_push: false,
        })
    }

    #[tokio::test]
    async fn test_dispatch_forwards_json_payload() {
        let push = Arc::new(RecordingPushService::default());
        let dispatcher = NotificationDispatcher::new(config(true), push.clone());
        let subscription = PushSubscriptionRecord::new("https://example", "k", "a");

        dispatcher
            .dispatch(&subscription, &NotificationPayload::default())
            .await
            .unwrap();

        let sent = push.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "https://example");
        let payload: NotificationPayload = serde_json::from_slice(&sent[0].1).unwrap();
        assert_eq!(payload, NotificationPayload::default());
        assert_eq!(sent[0].2, DEFAULT_VAPID_SUBJECT);
    }

    #[tokio::test]
    async fn test_missing_keys_never_reach_push_service() {
        let push = Arc::new(RecordingPushService::default());
        let dispatcher = NotificationDispatcher::new(config(false), push.clone());
        let subscription = PushSubscriptionRecord::new("https://example", "k", "a");

        let result = dispatcher.dispatch(&subscription, &NotificationPayload::default()).await;

        assert!(matches!(result, Err(DispatchError::Config(ConfigError::MissingVapidKeys))));
        assert!(push.sent.lock().unwrap().is_empty());
    }
}
