pub mod event;
pub mod notification;
pub mod registration;

pub use event::{EventKind, NotificationEvent};
pub use notification::{Notification, NotificationActionResponse, NotificationResponse};
pub use registration::{
    DeviceToken, ErrorKey, Platform, PushKitToken, Registered, RegisteredPushKit, RegistrationError, TokenSource,
};
