//! # Gravity Common Authentication
//!
//! Shared token issuance and verification for Gravity services.
//!
//! This crate provides:
//! - **Token minting**: signed, time-bounded access and refresh tokens
//! - **Token verification**: signature, expiry, and structure checks
//! - **Key rotation**: a `kid`-addressed registry where retired keys keep
//!   verifying outstanding tokens until purged
//!
//! ## Features
//!
//! - Only symmetric HMAC algorithms (HS256, HS384, HS512) are supported;
//!   `"none"` and asymmetric algorithms are explicitly rejected
//! - Rotation publishes an immutable registry snapshot atomically, so
//!   concurrent verifiers never observe a partially rotated registry
//! - Single-use refresh rotation via the [`RefreshLog`] hook
//!
//! ## Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use gravity_common_authn::{SigningKey, TokenConfig, TokenService, TokenType};
//!
//! # fn example() -> Result<(), gravity_common_authn::AuthError> {
//! let config = TokenConfig::builder()
//!     .with_active_key(SigningKey::generate("key-2024-001"))
//!     .build()?;
//! let service = TokenService::new(config)?;
//!
//! // Mint a pair at login
//! let pair = service.issue_pair("user:8412", BTreeMap::new())?;
//!
//! // Verify the access token on each request
//! let claims = service.verify(&pair.access_token)?;
//! assert_eq!(claims.sub, "user:8412");
//!
//! // Exchange the refresh token for a fresh pair
//! let new_pair = service.refresh(&pair.refresh_token)?;
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Token claims and token-pair types.
pub mod claims;
/// Token service configuration.
pub mod config;
/// Authentication error types.
pub mod error;
/// Signing keys and the process-wide key registry.
pub mod keyring;
/// Single-use refresh token tracking.
pub mod refresh;
/// Shared test utilities.
#[cfg(feature = "testutil")]
pub mod testutil;
/// Token minting and verification.
pub mod token;
/// Token header validation.
pub mod validation;

// Re-export key types for convenience
pub use claims::{TokenClaims, TokenPair, TokenType};
pub use config::{DEFAULT_ACCESS_TTL, DEFAULT_REFRESH_TTL, TokenConfig};
pub use error::{AuthError, Result};
pub use keyring::{KeyRegistry, KeyRing, KeyStatus, SigningAlgorithm, SigningKey};
pub use refresh::{InMemoryRefreshLog, RefreshLog};
pub use token::TokenService;
pub use validation::{ACCEPTED_ALGORITHMS, FORBIDDEN_ALGORITHMS, validate_algorithm};
