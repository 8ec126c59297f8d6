use crate::domain::{NotificationEvent, Platform};
use crate::error::{Error, Result};
use crate::services::bus::EventBus;
use crate::services::inbound::{InboundHandler, InboundOutcome, RemoteMessage};
use futures::{Stream, StreamExt};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub published: usize,
    pub claimed: usize,
    pub dropped: usize,
    pub rejected: usize,
}

/// What happened to a single ingested item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingested {
    Published,
    Claimed,
    Dropped,
}

/// What an item asks [`Ingest`] to do once its contract checks pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Admitted {
    Publish(NotificationEvent),
    Claimed,
    Dropped,
}

/// Anything that can be fed through [`Ingest`].
pub trait Ingestible {
    /// # Errors
    /// Returns an error if the item breaks its contract.
    fn admit(self, ingest: &Ingest) -> Result<Admitted>;
}

impl Ingestible for NotificationEvent {
    fn admit(self, ingest: &Ingest) -> Result<Admitted> {
        ingest.check_event(&self)?;
        Ok(Admitted::Publish(self))
    }
}

impl Ingestible for RemoteMessage {
    fn admit(self, ingest: &Ingest) -> Result<Admitted> {
        Ok(match ingest.inbound.classify(&self) {
            InboundOutcome::Delivered(notification) => {
                Admitted::Publish(NotificationEvent::NotificationReceived(notification))
            }
            InboundOutcome::Claimed => Admitted::Claimed,
            InboundOutcome::Dropped => Admitted::Dropped,
        })
    }
}

/// Checks incoming items against their contracts and publishes the ones that hold.
#[derive(Debug, Clone)]
pub struct Ingest {
    platform: Platform,
    bus: EventBus,
    inbound: InboundHandler,
    strict: bool,
}

impl Ingest {
    #[must_use]
    pub fn new(platform: Platform, bus: EventBus) -> Self {
        let inbound = InboundHandler::new(bus.clone());
        Self { platform, bus, inbound, strict: false }
    }

    #[must_use]
    pub fn with_inbound(mut self, inbound: InboundHandler) -> Self {
        self.inbound = inbound;
        self
    }

    /// In strict mode the first rejected item aborts [`Ingest::run`].
    #[must_use]
    pub const fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Checks a bridge event against its contract without publishing it.
    ///
    /// # Errors
    /// Returns `Error::InvalidToken` for empty or oversize tokens, and `Error::Contract`
    /// when a platform reports a field it cannot know.
    pub fn check_event(&self, event: &NotificationEvent) -> Result<()> {
        event.validate().map_err(Error::InvalidToken)?;

        if let NotificationEvent::RemoteNotificationsRegistered(registered) = event
            && registered.is_refresh.is_some()
            && !self.platform.reports_refresh()
        {
            return Err(Error::Contract(format!("isRefresh is not reported on {:?}", self.platform)));
        }
        Ok(())
    }

    /// Validates and publishes a bridge event.
    ///
    /// # Errors
    /// See [`Ingest::check_event`].
    pub async fn ingest_event(&self, event: NotificationEvent) -> Result<Ingested> {
        self.ingest(event).await
    }

    /// Admits one item and publishes what it carries, waiting for queued subscribers to make room.
    ///
    /// # Errors
    /// Returns an error if the item breaks its contract. Nothing is published in that case.
    pub async fn ingest<T: Ingestible>(&self, item: T) -> Result<Ingested> {
        match item.admit(self)? {
            Admitted::Publish(event) => {
                self.bus.send(event).await;
                Ok(Ingested::Published)
            }
            Admitted::Claimed => Ok(Ingested::Claimed),
            Admitted::Dropped => Ok(Ingested::Dropped),
        }
    }

    /// Drains `items`, ingesting each one until the stream ends or shutdown is signalled.
    ///
    /// # Errors
    /// In strict mode, returns the first decode or contract error. Otherwise errors are logged and counted.
    pub async fn run<T, S>(&self, items: S, mut shutdown: watch::Receiver<bool>) -> Result<IngestStats>
    where
        T: Ingestible,
        S: Stream<Item = (usize, Result<T>)>,
    {
        let mut items = std::pin::pin!(items);
        let mut stats = IngestStats::default();

        while !*shutdown.borrow() {
            let next = tokio::select! {
                next = items.next() => next,
                _ = shutdown.changed() => break,
            };
            let Some((line, item)) = next else { break };

            let outcome = match item {
                Ok(item) => self.ingest(item).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(Ingested::Published) => stats.published += 1,
                Ok(Ingested::Claimed) => stats.claimed += 1,
                Ok(Ingested::Dropped) => stats.dropped += 1,
                Err(e) if self.strict => return Err(e),
                Err(e) => {
                    tracing::warn!(line, error = %e, "Skipping invalid input");
                    stats.rejected += 1;
                }
            }
        }

        tracing::info!(
            published = stats.published,
            claimed = stats.claimed,
            dropped = stats.dropped,
            rejected = stats.rejected,
            "Ingest finished"
        );
        Ok(stats)
    }
}
