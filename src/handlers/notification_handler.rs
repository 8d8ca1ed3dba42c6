// src/handlers/notification_handler.rs
use std::sync::Arc;

use axum::{Json, body::Bytes, extract::State};
use serde_json::Value;
use tracing;

use crate::{
    errors::{ApiError, ApiResult},
    models::{ApiResponse, NotificationPayload, PushSubscriptionRecord},
    state::AppState,
};

/// `POST /api/notifications/subscribe`
///
/// Any JSON document is accepted; only an unparseable body fails.
pub async fn subscribe(State(state): State<Arc<AppState>>, body: Bytes) -> ApiResult<Json<ApiResponse>> {
    let subscription: Value = serde_json::from_slice(&body).map_err(|e| {
        tracing::error!("Error saving subscription: {}", e);
        ApiError::save_failed(e.to_string())
    })?;

    state
        .subscription_registry
        .register(&subscription)
        .await
        .inspect_err(|e| tracing::error!("Error saving subscription: {}", e))?;

    Ok(Json(ApiResponse::success("Subscription saved successfully")))
}

/// `POST /api/notifications/send`
pub async fn send(State(state): State<Arc<AppState>>, body: Bytes) -> ApiResult<Json<ApiResponse>> {
    let request: Value = serde_json::from_slice(&body).map_err(|e| {
        tracing::error!("Error sending notification: {}", e);
        ApiError::send_failed(e.to_string())
    })?;

    // Non-object bodies have no fields, so they land on the missing-subscription path
    let subscription = parse_subscription(request.get("subscription"))?;
    let payload = NotificationPayload::from_request(&request);

    state
        .dispatcher
        .dispatch(&subscription, &payload)
        .await
        .map_err(|e| {
            tracing::error!("Error sending notification: {}", e);
            ApiError::from(e)
        })?;

    Ok(Json(ApiResponse::success("Notification sent successfully")))
}

/// Absent, null, false, zero and empty-string subscriptions count as missing.
fn parse_subscription(value: Option<&Value>) -> ApiResult<PushSubscriptionRecord> {
    let value = match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => return Err(ApiError::MissingSubscription),
        Some(Value::String(s)) if s.is_empty() => return Err(ApiError::MissingSubscription),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => return Err(ApiError::MissingSubscription),
        Some(value) => value,
    };

    serde_json::from_value(value.clone()).map_err(|e| {
        tracing::warn!("Rejecting malformed subscription: {}", e);
        ApiError::invalid_subscription(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        routes,
        services::{
            push_service::{PushError, PushService},
            subscription_service::LoggingSubscriptionRegistry,
        },
        state::{AppConfig, DEFAULT_VAPID_SUBJECT},
        utils::vapid::VapidCredentials,
    };
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::json;
    use std::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Default)]
    struct RecordingPushService {
        sent: Mutex<Vec<(PushSubscriptionRecord, NotificationPayload)>>,
        fail: bool,
    }

    #[async_trait]
    impl PushService for RecordingPushService {
        async fn sign_and_send(
            &self,
            subscription: &PushSubscriptionRecord,
            payload: &[u8],
            _credentials: &VapidCredentials,
        ) -> Result<(), PushError> {
            if self.fail {
                return Err(PushError::Rejected { status: 404, body: "not found".to_string() });
            }
            let payload = serde_json::from_slice(payload).unwrap();
            self.sent.lock().unwrap().push((subscription.clone(), payload));
            Ok(())
        }
    }

    fn config(with_keys: bool) -> AppConfig {
        AppConfig {
            vapid_public_key: with_keys.then(|| "pub".to_string()),
            vapid_private_key: with_keys.then(|| "priv".to_string()),
            vapid_subject: DEFAULT_VAPID_SUBJECT.to_string(),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            mock_push: false,
        }
    }

    fn app(config: AppConfig, push: Arc<RecordingPushService>) -> axum::Router {
        let state = AppState::with_services(config, push, Arc::new(LoggingSubscriptionRegistry));
        routes::router(Arc::new(state))
    }

    async fn post(app: axum::Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_subscribe_acknowledges_any_json() {
        let push = Arc::new(RecordingPushService::default());
        let (status, body) = post(app(config(true), push), "/api/notifications/subscribe", r#"{"anything":1}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "message": "Subscription saved successfully"}));
    }

    #[tokio::test]
    async fn test_subscribe_twice_gives_same_response() {
        let push = Arc::new(RecordingPushService::default());
        let app = app(config(true), push);
        let subscription = r#"{"endpoint":"https://example","keys":{"p256dh":"k","auth":"a"}}"#;

        let first = post(app.clone(), "/api/notifications/subscribe", subscription).await;
        let second = post(app, "/api/notifications/subscribe", subscription).await;

        assert_eq!(first, second);
        assert_eq!(first.0, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_subscribe_rejects_malformed_json() {
        let push = Arc::new(RecordingPushService::default());
        let (status, body) = post(app(config(true), push), "/api/notifications/subscribe", "{not json").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"success": false, "error": "Failed to save subscription"}));
    }

    #[tokio::test]
    async fn test_send_applies_defaults() {
        let push = Arc::new(RecordingPushService::default());
        let (status, body) = post(
            app(config(true), push.clone()),
            "/api/notifications/send",
            r#"{"subscription":{"endpoint":"https://example","keys":{}}}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "message": "Notification sent successfully"}));

        let sent = push.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0.endpoint, "https://example");
        assert_eq!(
            sent[0].1,
            NotificationPayload::new("Todo House Notification", "You have a new notification!", "todo-house")
        );
    }

    #[tokio::test]
    async fn test_send_uses_given_fields() {
        let push = Arc::new(RecordingPushService::default());
        let request = json!({
            "subscription": {"endpoint": "https://example", "keys": {"p256dh": "k", "auth": "a"}},
            "title": "Test Notification",
            "body": "This is a test notification from Todo House!",
            "tag": "test"
        });
        let (status, _) = post(app(config(true), push.clone()), "/api/notifications/send", &request.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        let sent = push.sent.lock().unwrap();
        assert_eq!(
            sent[0].1,
            NotificationPayload::new("Test Notification", "This is a test notification from Todo House!", "test")
        );
    }

    #[tokio::test]
    async fn test_send_without_subscription_is_bad_request() {
        for body in [r#"{}"#, r#"{"subscription":null}"#, r#"{"subscription":""}"#, r#"{"subscription":false}"#] {
            let push = Arc::new(RecordingPushService::default());
            let (status, response) = post(app(config(true), push.clone()), "/api/notifications/send", body).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
            assert_eq!(response, json!({"success": false, "error": "No subscription provided"}));
            assert!(push.sent.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_send_checks_subscription_before_other_fields() {
        for body in [r#"{"title":5}"#, r#"{"subscription":null,"tag":false}"#, "5", r#""x""#, "[]"] {
            let push = Arc::new(RecordingPushService::default());
            let (status, response) = post(app(config(true), push.clone()), "/api/notifications/send", body).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
            assert_eq!(response, json!({"success": false, "error": "No subscription provided"}));
            assert!(push.sent.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_send_non_string_fields_fall_back_to_defaults() {
        let push = Arc::new(RecordingPushService::default());
        let request = json!({
            "subscription": {"endpoint": "https://example"},
            "title": 5,
            "body": false,
            "tag": {"nested": true}
        });
        let (status, _) = post(app(config(true), push.clone()), "/api/notifications/send", &request.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(push.sent.lock().unwrap()[0].1, NotificationPayload::default());
    }

    #[tokio::test]
    async fn test_send_accepts_fractional_expiration_time() {
        let push = Arc::new(RecordingPushService::default());
        let request = json!({
            "subscription": {
                "endpoint": "https://e",
                "expirationTime": 1700000000000.5,
                "keys": {"p256dh": "k", "auth": "a"}
            }
        });
        let (status, _) = post(app(config(true), push.clone()), "/api/notifications/send", &request.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(push.sent.lock().unwrap()[0].0.endpoint, "https://e");
    }

    #[tokio::test]
    async fn test_send_with_malformed_subscription_is_bad_request() {
        for body in [r#"{"subscription":"https://example"}"#, r#"{"subscription":{"keys":{}}}"#, r#"{"subscription":[1]}"#] {
            let push = Arc::new(RecordingPushService::default());
            let (status, response) = post(app(config(true), push.clone()), "/api/notifications/send", body).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
            assert_eq!(response["success"], json!(false));
            assert!(push.sent.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_send_without_vapid_keys_fails() {
        let push = Arc::new(RecordingPushService::default());
        let (status, body) = post(
            app(config(false), push.clone()),
            "/api/notifications/send",
            r#"{"subscription":{"endpoint":"https://example","keys":{}}}"#,
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"success": false, "error": "Failed to send notification"}));
        assert!(push.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_delivery_failure_is_generic() {
        let push = Arc::new(RecordingPushService { fail: true, ..Default::default() });
        let (status, body) = post(
            app(config(true), push),
            "/api/notifications/send",
            r#"{"subscription":{"endpoint":"https://example"}}"#,
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"success": false, "error": "Failed to send notification"}));
    }

    #[tokio::test]
    async fn test_send_malformed_json_fails() {
        let push = Arc::new(RecordingPushService::default());
        let (status, body) = post(app(config(true), push), "/api/notifications/send", "nope").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], json!("Failed to send notification"));
    }

    #[tokio::test]
    async fn test_health() {
        let push = Arc::new(RecordingPushService::default());
        let response = app(config(false), push)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
