use crate::adapters::ndjson::EventCodec;
use crate::domain::{
    Notification, NotificationEvent, NotificationResponse, Registered, RegisteredPushKit, RegistrationError,
};
use crate::services::callbacks::HostCallbacks;
use async_trait::async_trait;
use std::fmt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

/// Host callbacks that write every event back out as newline-delimited JSON.
pub struct EventWriter<W> {
    out: Mutex<W>,
}

impl<W> fmt::Debug for EventWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventWriter").finish_non_exhaustive()
    }
}

impl<W: AsyncWrite + Unpin + Send> EventWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    async fn write(&self, event: NotificationEvent) -> anyhow::Result<()> {
        let line = EventCodec::encode(&event)?;
        let mut out = self.out.lock().await;
        out.write_all(line.as_bytes()).await?;
        out.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> HostCallbacks for EventWriter<W> {
    async fn on_registered(&self, event: &Registered) -> anyhow::Result<()> {
        tracing::info!(is_refresh = ?event.is_refresh, "Device token requires backend sync");
        self.write(event.clone().into()).await
    }

    async fn on_registration_failed(&self, error: &RegistrationError) -> anyhow::Result<()> {
        self.write(error.clone().into()).await
    }

    async fn on_pushkit_registered(&self, event: &RegisteredPushKit) -> anyhow::Result<()> {
        tracing::info!("PushKit token requires backend sync");
        self.write(event.clone().into()).await
    }

    async fn on_notification_opened(&self, response: &NotificationResponse) -> anyhow::Result<()> {
        tracing::debug!(identifier = %response.identifier, action = response.is_action_selection(), "Notification opened");
        self.write(response.clone().into()).await
    }

    async fn on_notification_received(&self, notification: &Notification) -> anyhow::Result<()> {
        self.write(NotificationEvent::NotificationReceived(notification.clone())).await
    }
}
