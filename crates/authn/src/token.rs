//! Token minting and verification.
//!
//! [`TokenService`] is the entry point of this crate: it mints signed,
//! time-bounded access and refresh tokens and verifies presented tokens
//! against the process-wide key registry.
//!
//! # Verification pipeline
//!
//! ```text
//! token arrives → decode header (kid, alg)
//!               → validate kid format and algorithm allow-list
//!               → resolve kid in the registry snapshot (active or retired)
//!               → verify signature with the resolved key's algorithm
//!               → check expiry (zero leeway)
//!               → claims
//! ```
//!
//! Each stage has its own error kind so callers can distinguish malformed
//! input, unknown keys, tampering, and plain expiry (see
//! [`AuthError`](crate::error::AuthError)).
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use gravity_common_authn::{
//!     claims::TokenType,
//!     config::TokenConfig,
//!     keyring::SigningKey,
//!     token::TokenService,
//! };
//!
//! let config = TokenConfig::builder()
//!     .with_active_key(SigningKey::generate("key-2024-001"))
//!     .build()?;
//! let service = TokenService::new(config)?;
//!
//! let token = service.mint("user:8412", TokenType::Access, BTreeMap::new(), None)?;
//! let claims = service.verify(&token)?;
//! assert_eq!(claims.sub, "user:8412");
//! # Ok::<(), gravity_common_authn::error::AuthError>(())
//! ```

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use jsonwebtoken::{Header, Validation, decode, decode_header, encode};
use rand::{RngCore, rngs::OsRng};

use crate::{
    claims::{TokenClaims, TokenPair, TokenType},
    config::TokenConfig,
    error::{AuthError, Result},
    keyring::{KeyRing, SigningKey},
    refresh::RefreshLog,
    validation::{validate_algorithm, validate_kid},
};

/// Byte length of generated JTI values before encoding.
const JTI_LEN: usize = 16;

/// Mints and verifies signed access/refresh tokens.
///
/// The service is stateless per call: all state is the read-mostly key
/// registry and the configured lifetimes. It is `Send + Sync`; share one
/// instance behind an [`Arc`] across request-handling threads. `mint` and
/// `verify` never block on I/O — signing and verification are pure
/// computation over in-memory key material.
pub struct TokenService {
    /// Process-wide key registry.
    keys: Arc<KeyRing>,
    /// Default access token lifetime.
    access_ttl: Duration,
    /// Default refresh token lifetime.
    refresh_ttl: Duration,
    /// Single-use refresh enforcement hook, if configured.
    refresh_log: Option<Arc<dyn RefreshLog>>,
}

impl TokenService {
    /// Creates a service from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidConfig`] or [`AuthError::KeyConflict`]
    /// if the configuration does not validate.
    pub fn new(config: TokenConfig) -> Result<Self> {
        config.validate()?;
        let registry = config.build_registry()?;
        Ok(Self {
            keys: Arc::new(KeyRing::new(registry)),
            access_ttl: config.access_ttl(),
            refresh_ttl: config.refresh_ttl(),
            refresh_log: None,
        })
    }

    /// Creates a service over an externally managed key ring, with default
    /// lifetimes.
    ///
    /// Use this when the host owns rotation scheduling and shares one ring
    /// across several services.
    #[must_use]
    pub fn with_key_ring(keys: Arc<KeyRing>) -> Self {
        Self {
            keys,
            access_ttl: crate::config::DEFAULT_ACCESS_TTL,
            refresh_ttl: crate::config::DEFAULT_REFRESH_TTL,
            refresh_log: None,
        }
    }

    /// Enables single-use refresh rotation through the given log.
    ///
    /// Without a log, a refresh token remains exchangeable until its
    /// natural expiry.
    #[must_use]
    pub fn with_refresh_log(mut self, log: Arc<dyn RefreshLog>) -> Self {
        self.refresh_log = Some(log);
        self
    }

    /// Returns the key ring backing this service.
    #[must_use]
    pub fn key_ring(&self) -> &Arc<KeyRing> {
        &self.keys
    }

    /// Rotates the active signing key.
    ///
    /// Tokens signed with the previous key keep verifying until their
    /// natural expiry or until the key is purged from the ring.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::KeyConflict`] if the `kid` already exists.
    pub fn rotate(&self, new_key: SigningKey) -> Result<()> {
        self.keys.rotate(new_key)
    }

    /// Mints a signed token.
    ///
    /// `issued_at` is the current time; `expires_at` is `issued_at` plus
    /// `ttl_override` when given, else the type's configured default.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NoActiveKey`] if the registry holds no active
    /// key, or [`AuthError::InvalidTokenFormat`] if claim serialization
    /// fails (non-serializable custom values).
    #[tracing::instrument(skip(self, custom))]
    pub fn mint(
        &self,
        subject: &str,
        token_type: TokenType,
        custom: BTreeMap<String, serde_json::Value>,
        ttl_override: Option<Duration>,
    ) -> Result<String> {
        let snapshot = self.keys.snapshot();
        let key = snapshot.active().ok_or(AuthError::NoActiveKey)?;

        let ttl = ttl_override.unwrap_or(match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        });

        let iat = Utc::now().timestamp() as u64;
        let claims = TokenClaims {
            sub: subject.to_owned(),
            iat,
            exp: iat.saturating_add(ttl.as_secs()),
            token_type,
            jti: new_jti(),
            custom,
        };

        let mut header = Header::new(key.algorithm.to_jwt());
        header.kid = Some(key.kid.clone());

        let token = encode(&header, &claims, &key.encoding_key())?;
        tracing::debug!(kid = %key.kid, "token minted");
        Ok(token)
    }

    /// Mints an access/refresh pair for the same subject and claims.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`mint`](Self::mint).
    pub fn issue_pair(
        &self,
        subject: &str,
        custom: BTreeMap<String, serde_json::Value>,
    ) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.mint(subject, TokenType::Access, custom.clone(), None)?,
            refresh_token: self.mint(subject, TokenType::Refresh, custom, None)?,
        })
    }

    /// Verifies a presented token and returns its claims.
    ///
    /// Signature comparison happens inside `jsonwebtoken` in constant
    /// time; the expiry check uses zero leeway, so a token is rejected
    /// from the instant `expires_at` is reached.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidTokenFormat`] — structure does not parse
    /// - [`AuthError::UnsupportedAlgorithm`] — header algorithm outside the allow-list
    /// - [`AuthError::KeyNotFound`] — `kid` absent from the registry (rotated-and-purged or forged)
    /// - [`AuthError::InvalidSignature`] — header, claims, or signature tampered with
    /// - [`AuthError::TokenExpired`] — current time ≥ `expires_at`
    #[tracing::instrument(skip(self, token))]
    pub fn verify(&self, token: &str) -> Result<TokenClaims> {
        let header = decode_header(token).map_err(AuthError::from)?;

        let kid = header
            .kid
            .ok_or_else(|| AuthError::invalid_token_format("token header missing 'kid' field"))?;
        validate_kid(&kid)?;
        validate_algorithm(&format!("{:?}", header.alg))?;

        let snapshot = self.keys.snapshot();
        let key = snapshot.find(&kid).ok_or_else(|| AuthError::key_not_found(&kid))?;

        // The algorithm used for verification is the one recorded on the
        // resolved key; a header claiming a different member of the HMAC
        // family fails with UnsupportedAlgorithm inside the decoder.
        let mut validation = Validation::new(key.algorithm.to_jwt());
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        let token_data =
            decode::<TokenClaims>(token, &key.decoding_key(), &validation).map_err(|e| {
                let err = AuthError::from(e);
                if matches!(err, AuthError::InvalidSignature) {
                    tracing::warn!(kid = %kid, "signature verification failed");
                }
                err
            })?;
        let claims = token_data.claims;

        // Expiry is checked after the signature so that a tampered exp is
        // reported as tampering, not expiry. Zero leeway, inclusive bound.
        let now = Utc::now().timestamp() as u64;
        if now >= claims.exp {
            return Err(AuthError::token_expired());
        }

        Ok(claims)
    }

    /// Exchanges a refresh token for a new access/refresh pair.
    ///
    /// The new pair carries the same subject and custom claims. Under
    /// single-use rotation (a [`RefreshLog`] is configured) the presented
    /// token's JTI is consumed first; presenting it again fails with
    /// [`AuthError::RefreshReused`]. Without a log, the old token stays
    /// valid until its natural expiry.
    ///
    /// # Errors
    ///
    /// All of [`verify`](Self::verify)'s failure modes, plus
    /// [`AuthError::WrongTokenType`] when the token is not a refresh
    /// token and [`AuthError::RefreshReused`] on reuse.
    #[tracing::instrument(skip(self, refresh_token))]
    pub fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let claims = self.verify(refresh_token)?;

        if claims.token_type != TokenType::Refresh {
            return Err(AuthError::wrong_token_type(TokenType::Refresh, claims.token_type));
        }

        if let Some(log) = &self.refresh_log {
            let now = Utc::now().timestamp() as u64;
            log.consume(&claims.jti, claims.expires_in(now))?;
            tracing::debug!(jti = %claims.jti, "refresh token consumed");
        }

        self.issue_pair(&claims.sub, claims.custom)
    }
}

/// Generates a random URL-safe token id.
fn new_jti() -> String {
    let mut bytes = [0u8; JTI_LEN];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
