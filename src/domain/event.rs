use super::notification::{Notification, NotificationResponse};
use super::registration::{Registered, RegisteredPushKit, RegistrationError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Envelope for everything the native runtime hands to the host.
///
/// Serialized as `{"event": "<name>", "payload": {...}}`. The tag lives on the
/// envelope only; each payload keeps its own contract shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum NotificationEvent {
    RemoteNotificationsRegistered(Registered),
    RemoteNotificationsRegistrationFailed(RegistrationError),
    PushKitRegistered(RegisteredPushKit),
    NotificationOpened(NotificationResponse),
    NotificationReceived(Notification),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Registered,
    RegistrationFailed,
    PushKitRegistered,
    NotificationOpened,
    NotificationReceived,
}

impl EventKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Registered => "remoteNotificationsRegistered",
            Self::RegistrationFailed => "remoteNotificationsRegistrationFailed",
            Self::PushKitRegistered => "pushKitRegistered",
            Self::NotificationOpened => "notificationOpened",
            Self::NotificationReceived => "notificationReceived",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl NotificationEvent {
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::RemoteNotificationsRegistered(_) => EventKind::Registered,
            Self::RemoteNotificationsRegistrationFailed(_) => EventKind::RegistrationFailed,
            Self::PushKitRegistered(_) => EventKind::PushKitRegistered,
            Self::NotificationOpened(_) => EventKind::NotificationOpened,
            Self::NotificationReceived(_) => EventKind::NotificationReceived,
        }
    }

    /// Validates token-carrying payloads. Other events have nothing to check beyond their shape.
    ///
    /// # Errors
    /// Returns an error if a carried token is empty or excessively large.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::RemoteNotificationsRegistered(registered) => registered.validate(),
            Self::PushKitRegistered(pushkit) => pushkit.validate(),
            Self::RemoteNotificationsRegistrationFailed(_)
            | Self::NotificationOpened(_)
            | Self::NotificationReceived(_) => Ok(()),
        }
    }
}

impl From<Registered> for NotificationEvent {
    fn from(value: Registered) -> Self {
        Self::RemoteNotificationsRegistered(value)
    }
}

impl From<RegistrationError> for NotificationEvent {
    fn from(value: RegistrationError) -> Self {
        Self::RemoteNotificationsRegistrationFailed(value)
    }
}

impl From<RegisteredPushKit> for NotificationEvent {
    fn from(value: RegisteredPushKit) -> Self {
        Self::PushKitRegistered(value)
    }
}

impl From<NotificationResponse> for NotificationEvent {
    fn from(value: NotificationResponse) -> Self {
        Self::NotificationOpened(value)
    }
}
