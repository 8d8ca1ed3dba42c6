// src/services/subscription_service.rs
use async_trait::async_trait;
use tracing;

use crate::errors::ApiError;

/// Receives subscriptions posted by clients.
///
/// A store keyed by subscription endpoint would plug in here. The only implementation
/// today logs what it receives and keeps nothing.
#[async_trait]
pub trait SubscriptionRegistry: Send + Sync {
    async fn register(&self, subscription: &serde_json::Value) -> Result<(), ApiError>;
}

#[derive(Debug, Default)]
pub struct LoggingSubscriptionRegistry;

#[async_trait]
impl SubscriptionRegistry for LoggingSubscriptionRegistry {
    async fn register(&self, subscription: &serde_json::Value) -> Result<(), ApiError> {
        tracing::info!("New push subscription: {}", subscription);
        Ok(())
    }
}
