//! Authentication error types.
//!
//! This module defines errors that can occur during token minting,
//! verification, and signing-key management.

use thiserror::Error;

use crate::claims::TokenType;

/// Token service errors.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]` — new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    /// No active signing key is configured.
    ///
    /// Fatal at service startup: minting is impossible without an active
    /// key. Must not be caught-and-ignored.
    #[error("No active signing key configured")]
    NoActiveKey,

    /// Configuration rejected during validation.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// What was rejected.
        message: String,
    },

    /// Malformed token - cannot be parsed.
    ///
    /// Always distinct from a verification failure: the input never made it
    /// to signature or expiry checks.
    #[error("Invalid token format: {message}")]
    InvalidTokenFormat {
        /// Parse failure detail.
        message: String,
    },

    /// Algorithm not in the allowed list.
    #[error("Unsupported algorithm: {message}")]
    UnsupportedAlgorithm {
        /// Rejection detail.
        message: String,
    },

    /// Token references a key absent from the registry.
    ///
    /// Covers keys rotated out and purged as well as forged key ids.
    /// Treated as a verification failure, not a configuration bug.
    #[error("Signing key not found: {kid}")]
    KeyNotFound {
        /// Key ID that was not found.
        kid: String,
    },

    /// A key with this id already exists in the registry.
    #[error("Signing key already exists: {kid}")]
    KeyConflict {
        /// Conflicting key ID.
        kid: String,
    },

    /// Signature verification failed.
    ///
    /// Rejects tampering with claims, header, or signature. Callers may
    /// treat this as an attack signal.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// Token type does not match the operation.
    #[error("Wrong token type: expected {expected}, got {actual}")]
    WrongTokenType {
        /// Type the operation requires.
        expected: TokenType,
        /// Type the token carries.
        actual: TokenType,
    },

    /// Refresh token presented more than once under single-use rotation.
    #[error("Refresh token already consumed: {jti}")]
    RefreshReused {
        /// JTI of the reused token.
        jti: String,
    },
}

impl AuthError {
    /// Creates a new `InvalidConfig` error.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig { message: message.into() }
    }

    /// Creates a new `InvalidTokenFormat` error.
    #[must_use]
    pub fn invalid_token_format(message: impl Into<String>) -> Self {
        Self::InvalidTokenFormat { message: message.into() }
    }

    /// Creates a new `UnsupportedAlgorithm` error.
    #[must_use]
    pub fn unsupported_algorithm(message: impl Into<String>) -> Self {
        Self::UnsupportedAlgorithm { message: message.into() }
    }

    /// Creates a new `KeyNotFound` error.
    #[must_use]
    pub fn key_not_found(kid: impl Into<String>) -> Self {
        Self::KeyNotFound { kid: kid.into() }
    }

    /// Creates a new `KeyConflict` error.
    #[must_use]
    pub fn key_conflict(kid: impl Into<String>) -> Self {
        Self::KeyConflict { kid: kid.into() }
    }

    /// Creates a new `InvalidSignature` error.
    #[must_use]
    pub fn invalid_signature() -> Self {
        Self::InvalidSignature
    }

    /// Creates a new `TokenExpired` error.
    #[must_use]
    pub fn token_expired() -> Self {
        Self::TokenExpired
    }

    /// Creates a new `WrongTokenType` error.
    #[must_use]
    pub fn wrong_token_type(expected: TokenType, actual: TokenType) -> Self {
        Self::WrongTokenType { expected, actual }
    }

    /// Creates a new `RefreshReused` error.
    #[must_use]
    pub fn refresh_reused(jti: impl Into<String>) -> Self {
        Self::RefreshReused { jti: jti.into() }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidToken => AuthError::invalid_token_format("Invalid token structure"),
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidAlgorithm => {
                AuthError::unsupported_algorithm("Algorithm does not match the signing key")
            },
            ErrorKind::InvalidAlgorithmName => {
                AuthError::unsupported_algorithm("Unknown algorithm name in header")
            },
            ErrorKind::Base64(e) => {
                AuthError::invalid_token_format(format!("Invalid base64: {}", e))
            },
            ErrorKind::Json(e) => AuthError::invalid_token_format(format!("Invalid JSON: {}", e)),
            ErrorKind::Utf8(e) => AuthError::invalid_token_format(format!("Invalid UTF-8: {}", e)),
            _ => AuthError::invalid_token_format(format!("Token error: {}", err)),
        }
    }
}

/// Result type alias for token service operations.
pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::NoActiveKey;
        assert_eq!(err.to_string(), "No active signing key configured");

        let err = AuthError::invalid_token_format("three parts expected");
        assert_eq!(err.to_string(), "Invalid token format: three parts expected");

        let err = AuthError::key_not_found("key-2024-001");
        assert_eq!(err.to_string(), "Signing key not found: key-2024-001");

        let err = AuthError::token_expired();
        assert_eq!(err.to_string(), "Token expired");
    }

    #[test]
    fn test_wrong_token_type_display() {
        let err = AuthError::wrong_token_type(TokenType::Refresh, TokenType::Access);
        assert_eq!(err.to_string(), "Wrong token type: expected refresh, got access");
    }

    #[test]
    fn test_refresh_reused_display() {
        let err = AuthError::refresh_reused("jti-001");
        assert_eq!(err.to_string(), "Refresh token already consumed: jti-001");
    }

    #[test]
    fn test_error_from_jsonwebtoken_expired() {
        let jwt_err =
            jsonwebtoken::errors::Error::from(jsonwebtoken::errors::ErrorKind::ExpiredSignature);
        let auth_err: AuthError = jwt_err.into();

        assert!(matches!(auth_err, AuthError::TokenExpired));
    }

    #[test]
    fn test_error_from_jsonwebtoken_signature() {
        let jwt_err =
            jsonwebtoken::errors::Error::from(jsonwebtoken::errors::ErrorKind::InvalidSignature);
        let auth_err: AuthError = jwt_err.into();

        assert!(matches!(auth_err, AuthError::InvalidSignature));
    }

    #[test]
    fn test_error_from_jsonwebtoken_algorithm_mismatch() {
        let jwt_err =
            jsonwebtoken::errors::Error::from(jsonwebtoken::errors::ErrorKind::InvalidAlgorithm);
        let auth_err: AuthError = jwt_err.into();

        assert!(matches!(auth_err, AuthError::UnsupportedAlgorithm { .. }));
    }

    #[test]
    fn test_error_from_jsonwebtoken_malformed() {
        let jwt_err =
            jsonwebtoken::errors::Error::from(jsonwebtoken::errors::ErrorKind::InvalidToken);
        let auth_err: AuthError = jwt_err.into();

        assert!(matches!(auth_err, AuthError::InvalidTokenFormat { .. }));
    }
}
