//! Credential hashing error types.
//!
//! Verification failure ("wrong password") is not an error — it is the
//! `Ok(false)` return of [`verify`](crate::hasher::CredentialHasher::verify).
//! The variants here cover corrupt records, unknown algorithms, and bad
//! configuration, which callers must not conflate with a mismatch.

use thiserror::Error;

/// Credential hashing and verification errors.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]` — new variants may be added in
/// future minor releases without a semver-breaking change. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CredentialError {
    /// Stored credential cannot be parsed.
    ///
    /// Distinct from a verification failure: the record is corrupt, not
    /// merely mismatched.
    #[error("Malformed stored credential: {message}")]
    MalformedCredential {
        /// Parse failure detail.
        message: String,
    },

    /// Stored credential carries an algorithm tag outside the supported set.
    ///
    /// Unknown tags are rejected explicitly rather than falling through to
    /// a guessed verifier.
    #[error("Unsupported hash algorithm: {algorithm}")]
    UnsupportedAlgorithm {
        /// The unrecognized algorithm tag.
        algorithm: String,
    },

    /// Cost parameters rejected during configuration.
    ///
    /// Fatal at service startup, must not be caught-and-ignored.
    #[error("Invalid hash parameters: {message}")]
    InvalidParams {
        /// What was rejected.
        message: String,
    },

    /// Hashing itself failed (salt generation, internal errors).
    #[error("Hashing failed: {message}")]
    HashingFailed {
        /// Failure detail.
        message: String,
    },
}

impl CredentialError {
    /// Creates a new `MalformedCredential` error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedCredential { message: message.into() }
    }

    /// Creates a new `UnsupportedAlgorithm` error.
    #[must_use]
    pub fn unsupported_algorithm(algorithm: impl Into<String>) -> Self {
        Self::UnsupportedAlgorithm { algorithm: algorithm.into() }
    }

    /// Creates a new `InvalidParams` error.
    #[must_use]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams { message: message.into() }
    }

    /// Creates a new `HashingFailed` error.
    #[must_use]
    pub fn hashing_failed(message: impl Into<String>) -> Self {
        Self::HashingFailed { message: message.into() }
    }
}

/// Result type alias for credential operations.
pub type Result<T> = std::result::Result<T, CredentialError>;
