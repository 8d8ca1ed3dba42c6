use serde::{Deserialize, Serialize};

pub const DEFAULT_TITLE: &str = "Todo House Notification";
pub const DEFAULT_BODY: &str = "You have a new notification!";
pub const DEFAULT_TAG: &str = "todo-house";

/// The JSON document delivered to the service worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub tag: String,
}

impl NotificationPayload {
    pub fn new(title: &str, body: &str, tag: &str) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
            tag: tag.to_string(),
        }
    }

    /// Builds a payload, falling back to the defaults for absent or empty fields.
    pub fn with_defaults(title: Option<String>, body: Option<String>, tag: Option<String>) -> Self {
        fn or_default(value: Option<String>, default: &str) -> String {
            value.filter(|v| !v.is_empty()).unwrap_or_else(|| default.to_string())
        }

        Self {
            title: or_default(title, DEFAULT_TITLE),
            body: or_default(body, DEFAULT_BODY),
            tag: or_default(tag, DEFAULT_TAG),
        }
    }

    /// Reads title/body/tag from a request body. Anything that is not a non-empty
    /// string falls back to the default.
    pub fn from_request(request: &serde_json::Value) -> Self {
        let field = |name: &str| request.get(name).and_then(serde_json::Value::as_str).map(str::to_string);
        Self::with_defaults(field("title"), field("body"), field("tag"))
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

impl Default for NotificationPayload {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE, DEFAULT_BODY, DEFAULT_TAG)
    }
}

/// Body of `POST /api/notifications/send`, as the client sends it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendNotificationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// Response envelope shared by both notification routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn success(message: &str) -> Self {
        Self {
            success: true,
            message: Some(message.to_string()),
            error: None,
        }
    }

    pub fn failure(error: &str) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.to_string()),
        }
    }
}
