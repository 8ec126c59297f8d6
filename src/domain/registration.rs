use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_TOKEN_LEN: usize = 4096;

fn validate_token(token: &str) -> Result<(), String> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return Err("Token cannot be empty".into());
    }
    if trimmed.chars().count() > MAX_TOKEN_LEN {
        return Err(format!("Token is too long (max {MAX_TOKEN_LEN} characters)"));
    }
    Ok(())
}

/// Registration token issued by the platform messaging service (FCM/APNs).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceToken(String);

/// Token issued by the VoIP/PushKit channel. Lives in its own namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PushKitToken(String);

macro_rules! token_newtype {
    ($name:ident) => {
        impl $name {
            pub fn new(token: impl Into<String>) -> Self {
                Self(token.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(token: String) -> Self {
                Self(token)
            }
        }

        impl From<&str> for $name {
            fn from(token: &str) -> Self {
                Self(token.to_owned())
            }
        }
    };
}

token_newtype!(DeviceToken);
token_newtype!(PushKitToken);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    /// Whether the platform tells refresh-initiated token issuance apart from app-initiated issuance.
    #[must_use]
    pub const fn reports_refresh(self) -> bool {
        matches!(self, Self::Android)
    }
}

/// Why the native runtime handed over a registration token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenSource {
    AppInit,
    ManualRefresh,
    ProviderRefresh,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Registered {
    pub device_token: DeviceToken,
    /// Only set on platforms that report refresh-initiated issuance. Absent means "not applicable", not `false`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_refresh: Option<bool>,
}

impl Registered {
    pub fn new(device_token: impl Into<DeviceToken>) -> Self {
        Self { device_token: device_token.into(), is_refresh: None }
    }

    pub fn with_refresh(device_token: impl Into<DeviceToken>, is_refresh: bool) -> Self {
        Self { device_token: device_token.into(), is_refresh: Some(is_refresh) }
    }

    /// Builds the event the way `platform` reports it for a token obtained through `source`.
    pub fn from_source(device_token: impl Into<DeviceToken>, platform: Platform, source: TokenSource) -> Self {
        let is_refresh = platform.reports_refresh().then_some(source == TokenSource::ProviderRefresh);
        Self { device_token: device_token.into(), is_refresh }
    }

    /// Validates the token payload.
    ///
    /// # Errors
    /// Returns an error if the token is empty or excessively large.
    pub fn validate(&self) -> Result<(), String> {
        validate_token(self.device_token.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisteredPushKit {
    pub push_kit_token: PushKitToken,
}

impl RegisteredPushKit {
    pub fn new(push_kit_token: impl Into<PushKitToken>) -> Self {
        Self { push_kit_token: push_kit_token.into() }
    }

    /// Validates the token payload.
    ///
    /// # Errors
    /// Returns an error if the token is empty or excessively large.
    pub fn validate(&self) -> Result<(), String> {
        validate_token(self.push_kit_token.as_str())
    }
}

/// Composite `(domain, code)` key identifying a registration failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorKey<'a> {
    pub domain: &'a str,
    pub code: &'a str,
}

/// Failure to obtain a registration token, as reported by the platform.
///
/// `localized_description` is for display only. Match on [`RegistrationError::key`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[error("{domain} ({code}): {localized_description}")]
pub struct RegistrationError {
    pub code: String,
    pub domain: String,
    pub localized_description: String,
}

impl RegistrationError {
    pub fn new(code: impl Into<String>, domain: impl Into<String>, localized_description: impl Into<String>) -> Self {
        Self { code: code.into(), domain: domain.into(), localized_description: localized_description.into() }
    }

    #[must_use]
    pub fn key(&self) -> ErrorKey<'_> {
        ErrorKey { domain: &self.domain, code: &self.code }
    }

    #[must_use]
    pub fn matches(&self, domain: &str, code: &str) -> bool {
        self.key() == ErrorKey { domain, code }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registered_omits_absent_refresh() {
        let value = serde_json::to_value(Registered::new("tok")).unwrap();
        assert_eq!(value, json!({ "deviceToken": "tok" }));
    }

    #[test]
    fn test_registered_keeps_false_refresh() {
        let value = serde_json::to_value(Registered::with_refresh("tok", false)).unwrap();
        assert_eq!(value, json!({ "deviceToken": "tok", "isRefresh": false }));
    }

    #[test]
    fn test_from_source_android() {
        let refreshed = Registered::from_source("a", Platform::Android, TokenSource::ProviderRefresh);
        assert_eq!(refreshed.is_refresh, Some(true));

        let init = Registered::from_source("a", Platform::Android, TokenSource::AppInit);
        assert_eq!(init.is_refresh, Some(false));

        let manual = Registered::from_source("a", Platform::Android, TokenSource::ManualRefresh);
        assert_eq!(manual.is_refresh, Some(false));
    }

    #[test]
    fn test_from_source_ios_never_reports_refresh() {
        for source in [TokenSource::AppInit, TokenSource::ManualRefresh, TokenSource::ProviderRefresh] {
            assert_eq!(Registered::from_source("a", Platform::Ios, source).is_refresh, None);
        }
    }

    #[test]
    fn test_validate_token_empty() {
        let res = Registered::new("   ").validate();
        assert_eq!(res.unwrap_err(), "Token cannot be empty");
    }

    #[test]
    fn test_validate_token_too_long() {
        let res = RegisteredPushKit::new("A".repeat(4097)).validate();
        assert_eq!(res.unwrap_err(), "Token is too long (max 4096 characters)");
    }

    #[test]
    fn test_validate_token_success() {
        assert!(Registered::new("valid_fcm_token_123").validate().is_ok());
        assert!(RegisteredPushKit::new("A".repeat(4096)).validate().is_ok());
    }

    #[test]
    fn test_validate_token_length_counts_characters() {
        // Two bytes per character: 8192 bytes but only 4096 characters.
        assert!(Registered::new("é".repeat(4096)).validate().is_ok());

        let res = Registered::new("é".repeat(4097)).validate();
        assert_eq!(res.unwrap_err(), "Token is too long (max 4096 characters)");
    }

    #[test]
    fn test_registration_error_key() {
        let err = RegistrationError::new("3010", "NSCocoaErrorDomain", "remote notifications are not supported");
        assert!(err.matches("NSCocoaErrorDomain", "3010"));
        assert!(!err.matches("NSCocoaErrorDomain", "3000"));
        assert_eq!(err.key(), ErrorKey { domain: "NSCocoaErrorDomain", code: "3010" });
    }

    #[test]
    fn test_registration_error_display() {
        let err = RegistrationError::new("1", "d", "boom");
        assert_eq!(err.to_string(), "d (1): boom");
    }
}
