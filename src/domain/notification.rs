use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A delivered notification. The payload shape belongs to the native runtime and is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Notification(Map<String, Value>);

impl Notification {
    #[must_use]
    pub const fn from_map(payload: Map<String, Value>) -> Self {
        Self(payload)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        self.str_field("identifier")
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.str_field("title")
    }

    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.str_field("body")
    }

    #[must_use]
    pub const fn payload(&self) -> &Map<String, Value> {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }
}

/// The action a user picked on a notification. Opaque like [`Notification`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationActionResponse(Map<String, Value>);

impl NotificationActionResponse {
    #[must_use]
    pub const fn from_map(payload: Map<String, Value>) -> Self {
        Self(payload)
    }

    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        self.0.get("identifier").and_then(Value::as_str)
    }

    /// Text typed by the user for text-input actions.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.0.get("text").and_then(Value::as_str)
    }

    #[must_use]
    pub const fn payload(&self) -> &Map<String, Value> {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NotificationResponse {
    pub identifier: String,
    pub notification: Notification,
    /// Present only when the user picked an explicit action rather than tapping the notification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<NotificationActionResponse>,
}

impl NotificationResponse {
    pub fn new(identifier: impl Into<String>, notification: Notification) -> Self {
        Self { identifier: identifier.into(), notification, action: None }
    }

    #[must_use]
    pub fn with_action(mut self, action: NotificationActionResponse) -> Self {
        self.action = Some(action);
        self
    }

    #[must_use]
    pub const fn is_action_selection(&self) -> bool {
        self.action.is_some()
    }
}
