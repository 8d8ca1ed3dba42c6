// src/client/panel.rs
use crate::{
    client::{
        controller::{ControllerError, NotificationController},
        platform::PushPlatform,
    },
    models::PermissionState,
};

/// The single action the panel offers at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    EnableNotifications { enabled: bool },
    SendTest { enabled: bool },
}

pub struct NotificationPanel<P> {
    controller: NotificationController<P>,
    loading: bool,
    message: String,
}

impl<P: PushPlatform> NotificationPanel<P> {
    pub fn new(controller: NotificationController<P>) -> Self {
        Self {
            controller,
            loading: false,
            message: String::new(),
        }
    }

    pub fn controller(&self) -> &NotificationController<P> {
        &self.controller
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Latest status line; empty when there is nothing to show.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn action(&self) -> PanelAction {
        let subscribed = self.controller.subscription().is_some();
        if !self.controller.permission().is_granted() || !subscribed {
            PanelAction::EnableNotifications {
                enabled: self.controller.is_supported() && !self.loading,
            }
        } else {
            PanelAction::SendTest { enabled: !self.loading }
        }
    }

    pub fn can_enable(&self) -> bool {
        matches!(self.action(), PanelAction::EnableNotifications { enabled: true })
    }

    pub fn can_send_test(&self) -> bool {
        matches!(self.action(), PanelAction::SendTest { enabled: true })
    }

    pub fn action_label(&self) -> &'static str {
        match (self.action(), self.loading) {
            (PanelAction::EnableNotifications { .. }, true) => "Enabling...",
            (PanelAction::EnableNotifications { .. }, false) => "Enable Notifications",
            (PanelAction::SendTest { .. }, true) => "Sending...",
            (PanelAction::SendTest { .. }, false) => "Send Test Notification",
        }
    }

    pub fn support_label(&self) -> &'static str {
        if self.controller.is_supported() { "✅ Supported" } else { "❌ Not Supported" }
    }

    pub fn permission_label(&self) -> &'static str {
        match self.controller.permission() {
            PermissionState::Granted => "✅ Granted",
            PermissionState::Denied => "❌ Denied",
            PermissionState::Default => "⏳ Default",
        }
    }

    pub fn subscription_label(&self) -> &'static str {
        if self.controller.subscription().is_some() { "✅ Active" } else { "❌ Not Active" }
    }

    /// Requests permission and, once granted, subscribes.
    ///
    /// Ignored while another action is in flight.
    pub async fn enable_notifications(&mut self) {
        if self.loading {
            return;
        }
        self.loading = true;

        let result = self.try_enable().await;
        self.message = match result {
            Ok(true) => "✅ Notifications enabled successfully!".to_string(),
            Ok(false) => "❌ Notification permission denied".to_string(),
            Err(e) => error_message(&e),
        };

        self.loading = false;
    }

    async fn try_enable(&mut self) -> Result<bool, ControllerError> {
        let permission = self.controller.request_permission().await?;
        if !permission.is_granted() {
            return Ok(false);
        }
        self.controller.subscribe().await?;
        Ok(true)
    }

    pub async fn send_test(&mut self) {
        if self.loading {
            return;
        }
        self.loading = true;

        self.message = match self.controller.send_test_notification().await {
            Ok(_) => "🚀 Test notification sent!".to_string(),
            Err(e) => error_message(&e),
        };

        self.loading = false;
    }
}

fn error_message(error: &ControllerError) -> String {
    format!("❌ Error: {}", error)
}
