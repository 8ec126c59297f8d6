use crate::domain::{Notification, NotificationEvent};
use crate::services::bus::EventBus;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// A data message as handed over by the platform messaging service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct RemoteMessage {
    pub data: HashMap<String, String>,
}

impl RemoteMessage {
    #[must_use]
    pub const fn new(data: HashMap<String, String>) -> Self {
        Self { data }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RemoteMessage {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { data: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("message carries neither a title nor a body")]
pub struct InvalidNotification;

impl TryFrom<&RemoteMessage> for Notification {
    type Error = InvalidNotification;

    fn try_from(message: &RemoteMessage) -> Result<Self, Self::Error> {
        let displayable = ["title", "body"].iter().any(|key| message.get(key).is_some_and(|v| !v.trim().is_empty()));
        if !displayable {
            return Err(InvalidNotification);
        }

        let payload: Map<String, Value> =
            message.data.iter().map(|(k, v)| (k.clone(), Value::String(v.clone()))).collect();
        Ok(Self::from_map(payload))
    }
}

/// Takes ownership of pushes that belong to a third-party SDK before notification parsing.
pub trait PushInterceptor: Send + Sync + fmt::Debug {
    fn claims(&self, message: &RemoteMessage) -> bool;

    fn handle(&self, message: &RemoteMessage);
}

/// Claims messages whose `receiver` key names a given SDK.
#[derive(Debug, Clone)]
pub struct ReceiverInterceptor {
    receiver: String,
}

impl ReceiverInterceptor {
    pub fn new(receiver: impl Into<String>) -> Self {
        Self { receiver: receiver.into() }
    }
}

impl PushInterceptor for ReceiverInterceptor {
    fn claims(&self, message: &RemoteMessage) -> bool {
        message.get("receiver") == Some(self.receiver.as_str())
    }

    fn handle(&self, message: &RemoteMessage) {
        tracing::debug!(receiver = %self.receiver, keys = message.data.len(), "Push claimed by interceptor");
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundOutcome {
    Claimed,
    Delivered(Notification),
    Dropped,
}

#[derive(Debug, Clone)]
pub struct InboundHandler {
    bus: EventBus,
    interceptors: Vec<Arc<dyn PushInterceptor>>,
}

impl InboundHandler {
    #[must_use]
    pub const fn new(bus: EventBus) -> Self {
        Self { bus, interceptors: Vec::new() }
    }

    #[must_use]
    pub fn with_interceptor(mut self, interceptor: Arc<dyn PushInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Classifies a message and publishes it when it turns out to be a displayable notification.
    pub fn on_message_received(&self, message: &RemoteMessage) -> InboundOutcome {
        let outcome = self.classify(message);
        if let InboundOutcome::Delivered(notification) = &outcome {
            self.bus.publish(NotificationEvent::NotificationReceived(notification.clone()));
        }
        outcome
    }

    /// Hands claimed messages to their interceptor and parses the rest. Publishes nothing.
    #[tracing::instrument(skip_all, fields(keys = message.data.len()))]
    pub fn classify(&self, message: &RemoteMessage) -> InboundOutcome {
        if let Some(interceptor) = self.interceptors.iter().find(|i| i.claims(message)) {
            interceptor.handle(message);
            return InboundOutcome::Claimed;
        }

        match Notification::try_from(message) {
            Ok(notification) => InboundOutcome::Delivered(notification),
            Err(e) => {
                // A data push, but not one this layer knows how to surface.
                tracing::debug!(reason = %e, "Remote message handling aborted");
                InboundOutcome::Dropped
            }
        }
    }
}
