use crate::domain::{
    DeviceToken, Notification, NotificationEvent, NotificationResponse, PushKitToken, Registered, RegisteredPushKit,
    RegistrationError,
};
use crate::services::bus::Delivery;
use async_trait::async_trait;
use futures::{FutureExt, Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::watch;

/// Host-side handlers, one per event kind. Unimplemented handlers ignore the event.
#[async_trait]
pub trait HostCallbacks: Send + Sync + std::fmt::Debug {
    async fn on_registered(&self, _event: &Registered) -> anyhow::Result<()> {
        Ok(())
    }

    async fn on_registration_failed(&self, _error: &RegistrationError) -> anyhow::Result<()> {
        Ok(())
    }

    async fn on_pushkit_registered(&self, _event: &RegisteredPushKit) -> anyhow::Result<()> {
        Ok(())
    }

    async fn on_notification_opened(&self, _response: &NotificationResponse) -> anyhow::Result<()> {
        Ok(())
    }

    async fn on_notification_received(&self, _notification: &Notification) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Routes one event to the matching handler.
///
/// # Errors
/// Returns whatever the handler returns.
pub async fn dispatch(callbacks: &dyn HostCallbacks, event: &NotificationEvent) -> anyhow::Result<()> {
    match event {
        NotificationEvent::RemoteNotificationsRegistered(e) => callbacks.on_registered(e).await,
        NotificationEvent::RemoteNotificationsRegistrationFailed(e) => callbacks.on_registration_failed(e).await,
        NotificationEvent::PushKitRegistered(e) => callbacks.on_pushkit_registered(e).await,
        NotificationEvent::NotificationOpened(e) => callbacks.on_notification_opened(e).await,
        NotificationEvent::NotificationReceived(e) => callbacks.on_notification_received(e).await,
    }
}

/// Delivers events from `deliveries` to `callbacks` until the stream ends or shutdown is signalled.
///
/// On shutdown, events already buffered in the subscription are still delivered; nothing new is awaited.
/// Returns the number of events handed to callbacks.
pub async fn run_callbacks<S>(
    mut deliveries: S,
    callbacks: Arc<dyn HostCallbacks>,
    mut shutdown: watch::Receiver<bool>,
) -> usize
where
    S: Stream<Item = Delivery> + Unpin + Send,
{
    let mut delivered = 0;

    while !*shutdown.borrow() {
        tokio::select! {
            item = deliveries.next() => {
                let Some(delivery) = item else { return finish(delivered) };
                delivered += deliver(callbacks.as_ref(), delivery).await;
            }
            _ = shutdown.changed() => break,
        }
    }

    let mut drained = 0;
    while let Some(Some(delivery)) = deliveries.next().now_or_never() {
        drained += deliver(callbacks.as_ref(), delivery).await;
    }
    if drained > 0 {
        tracing::info!(drained, "Delivered buffered events after shutdown signal");
    }
    finish(delivered + drained)
}

async fn deliver(callbacks: &dyn HostCallbacks, delivery: Delivery) -> usize {
    match delivery {
        Delivery::Event(event) => {
            if let Err(e) = dispatch(callbacks, &event).await {
                tracing::error!(error = %e, event = %event.kind(), "Host callback failed");
            }
            1
        }
        Delivery::Lagged(skipped) => {
            tracing::warn!(skipped, "Callback worker lagged behind, events dropped");
            0
        }
    }
}

fn finish(delivered: usize) -> usize {
    tracing::info!(delivered, "Callback worker shutting down...");
    delivered
}

/// Backend sync seam. The two token kinds go to separate endpoints.
#[async_trait]
pub trait TokenSync: Send + Sync + std::fmt::Debug {
    async fn sync_device_token(&self, token: &DeviceToken) -> anyhow::Result<()>;

    async fn sync_pushkit_token(&self, token: &PushKitToken) -> anyhow::Result<()>;
}

/// Syncs every delivered token, refreshed or not.
#[derive(Debug)]
pub struct SyncingCallbacks<T> {
    sync: T,
}

impl<T: TokenSync> SyncingCallbacks<T> {
    pub const fn new(sync: T) -> Self {
        Self { sync }
    }

    pub const fn inner(&self) -> &T {
        &self.sync
    }
}

#[async_trait]
impl<T: TokenSync> HostCallbacks for SyncingCallbacks<T> {
    async fn on_registered(&self, event: &Registered) -> anyhow::Result<()> {
        if event.is_refresh == Some(true) {
            tracing::info!("Syncing provider-refreshed device token");
        }
        self.sync.sync_device_token(&event.device_token).await
    }

    async fn on_registration_failed(&self, error: &RegistrationError) -> anyhow::Result<()> {
        tracing::warn!(domain = %error.domain, code = %error.code, "Device token unavailable, nothing to sync");
        Ok(())
    }

    async fn on_pushkit_registered(&self, event: &RegisteredPushKit) -> anyhow::Result<()> {
        self.sync.sync_pushkit_token(&event.push_kit_token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::bus::EventBus;
    use tokio::sync::Mutex;

    #[derive(Debug, Default)]
    struct RecordingSync {
        device: Mutex<Vec<String>>,
        pushkit: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TokenSync for RecordingSync {
        async fn sync_device_token(&self, token: &DeviceToken) -> anyhow::Result<()> {
            self.device.lock().await.push(token.to_string());
            Ok(())
        }

        async fn sync_pushkit_token(&self, token: &PushKitToken) -> anyhow::Result<()> {
            self.pushkit.lock().await.push(token.to_string());
            Ok(())
        }
    }

    #[derive(Debug)]
    struct FailingCallbacks;

    #[async_trait]
    impl HostCallbacks for FailingCallbacks {
        async fn on_registered(&self, _event: &Registered) -> anyhow::Result<()> {
            anyhow::bail!("backend unavailable")
        }
    }

    #[tokio::test]
    async fn test_every_registration_is_synced() {
        let callbacks = SyncingCallbacks::new(RecordingSync::default());

        for event in [Registered::new("a"), Registered::with_refresh("b", false), Registered::with_refresh("c", true)] {
            dispatch(&callbacks, &event.into()).await.unwrap();
        }
        dispatch(&callbacks, &RegisteredPushKit::new("voip").into()).await.unwrap();

        assert_eq!(*callbacks.inner().device.lock().await, vec!["a", "b", "c"]);
        assert_eq!(*callbacks.inner().pushkit.lock().await, vec!["voip"]);
    }

    #[tokio::test]
    async fn test_worker_drains_until_bus_closes() {
        let bus = EventBus::new(8);
        let sub = bus.subscribe();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        bus.publish(Registered::new("a"));
        bus.publish(RegistrationError::new("1", "d", "x"));
        drop(bus);

        let delivered = run_callbacks(sub, Arc::new(FailingCallbacks), shutdown_rx).await;
        assert_eq!(delivered, 2);
    }

    #[tokio::test]
    async fn test_worker_stops_on_shutdown() {
        let bus = EventBus::new(8);
        let sub = bus.subscribe();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker = tokio::spawn(run_callbacks(sub, Arc::new(FailingCallbacks), shutdown_rx));
        shutdown_tx.send(true).unwrap();

        assert_eq!(worker.await.unwrap(), 0);
        drop(bus);
    }

    #[tokio::test]
    async fn test_worker_delivers_buffered_events_on_shutdown() {
        let bus = EventBus::new(8);
        let sub = bus.subscribe_queued();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        for token in ["a", "b", "c"] {
            bus.send(Registered::new(token)).await;
        }
        shutdown_tx.send(true).unwrap();

        let callbacks = Arc::new(SyncingCallbacks::new(RecordingSync::default()));
        let delivered = run_callbacks(sub, Arc::clone(&callbacks) as Arc<dyn HostCallbacks>, shutdown_rx).await;

        // The bus is still open, so the worker must not wait for more.
        assert_eq!(delivered, 3);
        assert_eq!(*callbacks.inner().device.lock().await, vec!["a", "b", "c"]);
        drop(bus);
    }
}
