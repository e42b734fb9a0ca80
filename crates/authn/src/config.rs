//! Token service configuration.
//!
//! This module provides [`TokenConfig`], the configuration surface consumed
//! by [`TokenService`](crate::token::TokenService): signing key material and
//! rotation state plus default token lifetimes per type.
//!
//! Configuration is loaded once at process start. Each service process holds
//! its own copy; propagating a key rotation to all processes is a deployment
//! concern, not handled here.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    error::{AuthError, Result},
    keyring::{KeyRegistry, SigningKey},
    validation::validate_kid,
};

/// Default access token lifetime (30 minutes).
pub const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(30 * 60);

/// Default refresh token lifetime (7 days).
pub const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Configuration for [`TokenService`](crate::token::TokenService).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use gravity_common_authn::{config::TokenConfig, keyring::SigningKey};
///
/// let config = TokenConfig::builder()
///     .with_active_key(SigningKey::generate("key-2024-002"))
///     .with_retired_key(SigningKey::generate("key-2024-001"))
///     .with_access_ttl(Duration::from_secs(15 * 60))
///     .build()?;
/// # Ok::<(), gravity_common_authn::error::AuthError>(())
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Key used to sign newly minted tokens.
    pub(crate) active_key: SigningKey,

    /// Keys kept verifiable for tokens minted before rotation.
    #[serde(default)]
    pub(crate) retired_keys: Vec<SigningKey>,

    /// Default lifetime for access tokens.
    #[serde(with = "humantime_serde", default = "default_access_ttl")]
    pub(crate) access_ttl: Duration,

    /// Default lifetime for refresh tokens.
    #[serde(with = "humantime_serde", default = "default_refresh_ttl")]
    pub(crate) refresh_ttl: Duration,
}

fn default_access_ttl() -> Duration {
    DEFAULT_ACCESS_TTL
}

fn default_refresh_ttl() -> Duration {
    DEFAULT_REFRESH_TTL
}

impl TokenConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> TokenConfigBuilder {
        TokenConfigBuilder::default()
    }

    /// Returns the active signing key.
    #[must_use]
    pub fn active_key(&self) -> &SigningKey {
        &self.active_key
    }

    /// Returns the retired signing keys.
    #[must_use]
    pub fn retired_keys(&self) -> &[SigningKey] {
        &self.retired_keys
    }

    /// Returns the default access token lifetime.
    #[must_use]
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Returns the default refresh token lifetime.
    #[must_use]
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Validates the configuration.
    ///
    /// Called by [`TokenService::new`](crate::token::TokenService::new) so
    /// that configurations arriving through deserialization rather than the
    /// builder get the same checks.
    ///
    /// # Errors
    ///
    /// Returns an error if a key is unusable (empty secret, invalid `kid`)
    /// or a default lifetime is zero.
    pub(crate) fn validate(&self) -> Result<()> {
        for key in std::iter::once(&self.active_key).chain(&self.retired_keys) {
            validate_kid(&key.kid)
                .map_err(|_| AuthError::invalid_config(format!("invalid kid '{}'", key.kid)))?;
            if key.secret.is_empty() {
                return Err(AuthError::invalid_config(format!(
                    "key '{}' has empty secret material",
                    key.kid
                )));
            }
        }
        if self.access_ttl.is_zero() {
            return Err(AuthError::invalid_config("access_ttl must be non-zero"));
        }
        if self.refresh_ttl.is_zero() {
            return Err(AuthError::invalid_config("refresh_ttl must be non-zero"));
        }
        Ok(())
    }

    /// Builds the initial registry snapshot from the configured keys.
    pub(crate) fn build_registry(&self) -> Result<KeyRegistry> {
        KeyRegistry::new(self.active_key.clone(), self.retired_keys.clone())
    }
}

/// Builder for [`TokenConfig`].
#[derive(Debug, Default)]
pub struct TokenConfigBuilder {
    active_key: Option<SigningKey>,
    retired_keys: Vec<SigningKey>,
    access_ttl: Option<Duration>,
    refresh_ttl: Option<Duration>,
}

impl TokenConfigBuilder {
    /// Sets the active signing key.
    #[must_use]
    pub fn with_active_key(mut self, key: SigningKey) -> Self {
        self.active_key = Some(key);
        self
    }

    /// Adds a retired key kept verifiable for outstanding tokens.
    #[must_use]
    pub fn with_retired_key(mut self, key: SigningKey) -> Self {
        self.retired_keys.push(key);
        self
    }

    /// Sets the default access token lifetime.
    ///
    /// Default: 30 minutes.
    #[must_use]
    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = Some(ttl);
        self
    }

    /// Sets the default refresh token lifetime.
    ///
    /// Default: 7 days.
    #[must_use]
    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = Some(ttl);
        self
    }

    /// Builds the configuration, validating all settings.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NoActiveKey`] if no active key was provided,
    /// or [`AuthError::InvalidConfig`] for unusable keys or zero lifetimes.
    pub fn build(self) -> Result<TokenConfig> {
        let active_key = self.active_key.ok_or(AuthError::NoActiveKey)?;

        let config = TokenConfig {
            active_key,
            retired_keys: self.retired_keys,
            access_ttl: self.access_ttl.unwrap_or(DEFAULT_ACCESS_TTL),
            refresh_ttl: self.refresh_ttl.unwrap_or(DEFAULT_REFRESH_TTL),
        };
        config.validate()?;
        Ok(config)
    }
}
