// src/routes.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{
    handlers::{health_handler, notification_handler},
    state::AppState,
};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler::health))
        .route("/api/notifications/subscribe", post(notification_handler::subscribe))
        .route("/api/notifications/send", post(notification_handler::send))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
