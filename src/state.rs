// src/state.rs
use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;

use crate::services::{
    notification_service::NotificationDispatcher,
    push_service::{MockPushService, PushService, WebPushService},
    subscription_service::{LoggingSubscriptionRegistry, SubscriptionRegistry},
};

pub const DEFAULT_VAPID_SUBJECT: &str = "mailto:admin@todohouse.app";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("VAPID keys not configured")]
    MissingVapidKeys,

    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Process configuration, read once at startup.
///
/// # Environment Variables
///
/// - `VAPID_PUBLIC_KEY` - public signing key, handed to browsers
/// - `VAPID_PRIVATE_KEY` - private signing key
/// - `VAPID_EMAIL` - contact subject (default: `mailto:admin@todohouse.app`)
/// - `BIND_ADDR` - listen address (default: `0.0.0.0:3000`)
/// - `PUSH_MOCK` - `true` to log notifications instead of sending them
#[derive(Clone)]
pub struct AppConfig {
    pub vapid_public_key: Option<String>,
    pub vapid_private_key: Option<String>,
    pub vapid_subject: String,
    pub bind_addr: SocketAddr,
    pub mock_push: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("vapid_public_key", &self.vapid_public_key)
            .field("vapid_private_key", &self.vapid_private_key.as_ref().map(|_| "[REDACTED]"))
            .field("vapid_subject", &self.vapid_subject)
            .field("bind_addr", &self.bind_addr)
            .field("mock_push", &self.mock_push)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset. Missing VAPID keys are not an error here;
    /// they only fail the dispatch path.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bind_addr = match get("BIND_ADDR") {
            Some(raw) => raw
                .parse()
                .map_err(|e: std::net::AddrParseError| ConfigError::InvalidEnvVar("BIND_ADDR".to_string(), e.to_string()))?,
            None => DEFAULT_BIND_ADDR
                .parse()
                .map_err(|e: std::net::AddrParseError| ConfigError::InvalidEnvVar("BIND_ADDR".to_string(), e.to_string()))?,
        };

        let mock_push = match get("PUSH_MOCK").as_deref() {
            None | Some("false") | Some("0") => false,
            Some("true") | Some("1") => true,
            Some(other) => {
                return Err(ConfigError::InvalidEnvVar(
                    "PUSH_MOCK".to_string(),
                    format!("expected true or false, got '{}'", other),
                ));
            }
        };

        Ok(Self {
            vapid_public_key: get("VAPID_PUBLIC_KEY"),
            vapid_private_key: get("VAPID_PRIVATE_KEY"),
            vapid_subject: get("VAPID_EMAIL").unwrap_or_else(|| DEFAULT_VAPID_SUBJECT.to_string()),
            bind_addr,
            mock_push,
        })
    }
}

pub struct AppState {
    pub dispatcher: NotificationDispatcher,
    pub subscription_registry: Arc<dyn SubscriptionRegistry>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let push_service: Arc<dyn PushService> = if config.mock_push {
            tracing::warn!("PUSH_MOCK set, using mock push service");
            Arc::new(MockPushService)
        } else {
            Arc::new(WebPushService::new(reqwest::Client::new()))
        };

        Self::with_services(config, push_service, Arc::new(LoggingSubscriptionRegistry))
    }

    pub fn with_services(
        config: AppConfig,
        push_service: Arc<dyn PushService>,
        subscription_registry: Arc<dyn SubscriptionRegistry>,
    ) -> Self {
        let dispatcher = NotificationDispatcher::new(Arc::new(config), push_service);

        Self {
            dispatcher,
            subscription_registry,
        }
    }
}
