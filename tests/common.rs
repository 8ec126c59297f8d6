use async_trait::async_trait;
use notification_bridge::domain::{
    DeviceToken, Notification, NotificationEvent, NotificationResponse, PushKitToken, Registered, RegisteredPushKit,
    RegistrationError,
};
use notification_bridge::services::{HostCallbacks, TokenSync};
use serde_json::{Value, json};
use std::sync::Once;
use tokio::sync::Mutex;

static INIT: Once = Once::new();

#[allow(dead_code)]
pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("notification_bridge=debug".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().init();
    });
}

#[allow(dead_code)]
pub fn notification_json() -> Value {
    json!({
        "identifier": "msg-42",
        "title": "New message",
        "body": "Are we still on for tonight?",
        "sound": "default",
        "badge": 3,
        "payload": { "threadId": "t-7", "attachments": [] }
    })
}

/// Records every event it receives, in order.
#[derive(Debug, Default)]
#[allow(dead_code)]
pub struct RecordingCallbacks {
    pub events: Mutex<Vec<NotificationEvent>>,
}

#[async_trait]
impl HostCallbacks for RecordingCallbacks {
    async fn on_registered(&self, event: &Registered) -> anyhow::Result<()> {
        self.events.lock().await.push(event.clone().into());
        Ok(())
    }

    async fn on_registration_failed(&self, error: &RegistrationError) -> anyhow::Result<()> {
        self.events.lock().await.push(error.clone().into());
        Ok(())
    }

    async fn on_pushkit_registered(&self, event: &RegisteredPushKit) -> anyhow::Result<()> {
        self.events.lock().await.push(event.clone().into());
        Ok(())
    }

    async fn on_notification_opened(&self, response: &NotificationResponse) -> anyhow::Result<()> {
        self.events.lock().await.push(response.clone().into());
        Ok(())
    }

    async fn on_notification_received(&self, notification: &Notification) -> anyhow::Result<()> {
        self.events.lock().await.push(NotificationEvent::NotificationReceived(notification.clone()));
        Ok(())
    }
}

/// Token sync double that keeps device and PushKit tokens apart.
#[derive(Debug, Default)]
#[allow(dead_code)]
pub struct RecordingSync {
    pub device_tokens: Mutex<Vec<String>>,
    pub pushkit_tokens: Mutex<Vec<String>>,
}

#[async_trait]
impl TokenSync for RecordingSync {
    async fn sync_device_token(&self, token: &DeviceToken) -> anyhow::Result<()> {
        self.device_tokens.lock().await.push(token.as_str().to_owned());
        Ok(())
    }

    async fn sync_pushkit_token(&self, token: &PushKitToken) -> anyhow::Result<()> {
        self.pushkit_tokens.lock().await.push(token.as_str().to_owned());
        Ok(())
    }
}
