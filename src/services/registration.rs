use crate::domain::{DeviceToken, Platform, PushKitToken, Registered, RegisteredPushKit, RegistrationError, TokenSource};
use crate::error::{Error, Result};
use crate::services::bus::EventBus;

/// Turns native token callbacks into registration events.
#[derive(Clone, Debug)]
pub struct RegistrationService {
    platform: Platform,
    bus: EventBus,
}

impl RegistrationService {
    #[must_use]
    pub const fn new(platform: Platform, bus: EventBus) -> Self {
        Self { platform, bus }
    }

    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// Handles a registration token handed over by the platform messaging service.
    ///
    /// # Errors
    /// Returns `Error::InvalidToken` if the token is empty or too long. Nothing is published in that case.
    #[tracing::instrument(skip(self, token), fields(platform = ?self.platform))]
    pub fn on_new_token(&self, token: impl Into<DeviceToken>, source: TokenSource) -> Result<Registered> {
        let registered = Registered::from_source(token, self.platform, source);
        registered.validate().map_err(Error::InvalidToken)?;

        if source == TokenSource::ProviderRefresh {
            tracing::info!("Registration token refreshed by provider");
        } else {
            tracing::debug!("Registration token received");
        }

        self.bus.publish(registered.clone());
        Ok(registered)
    }

    /// Handles a token from the PushKit channel.
    ///
    /// # Errors
    /// Returns `Error::InvalidToken` if the token is empty or too long.
    #[tracing::instrument(skip_all)]
    pub fn on_pushkit_token(&self, token: impl Into<PushKitToken>) -> Result<RegisteredPushKit> {
        let registered = RegisteredPushKit::new(token);
        registered.validate().map_err(Error::InvalidToken)?;

        tracing::debug!("PushKit token received");
        self.bus.publish(registered.clone());
        Ok(registered)
    }

    /// Forwards a registration failure to the host unchanged.
    pub fn on_registration_failed(&self, error: RegistrationError) {
        tracing::warn!(domain = %error.domain, code = %error.code, "Push registration failed");
        self.bus.publish(error);
    }
}
