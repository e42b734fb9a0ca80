//! Token header validation.
//!
//! This module provides security checks applied to a token's header before
//! any key lookup or signature work happens.
//!
//! # Security
//!
//! - Strict algorithm checks to prevent algorithm substitution attacks
//! - Only the HMAC family this service mints with is accepted
//! - `"none"` and all asymmetric algorithms are always rejected
//! - Key ids are validated before registry lookup, rejecting injection
//!   attempts (path separators, NUL bytes, oversized values)

use crate::error::AuthError;

/// Forbidden algorithms that are never accepted for security reasons.
///
/// `none` means no signature at all (trivially bypassable) and is called
/// out separately from merely-unsupported algorithms so that rejections
/// carry an explicit security message.
pub const FORBIDDEN_ALGORITHMS: &[&str] = &["none"];

/// Accepted token algorithms.
///
/// The verification pipeline only handles the symmetric HMAC family; the
/// algorithm actually used for signature verification always comes from
/// the resolved [`SigningKey`](crate::keyring::SigningKey), so a header
/// claiming a different member of this list still fails verification.
/// Per RFC 8725 Section 3.1, algorithms that are not fully implemented
/// must be rejected here rather than produce confusing errors later.
pub const ACCEPTED_ALGORITHMS: &[&str] = &["HS256", "HS384", "HS512"];

/// Maximum accepted `kid` length.
pub const MAX_KID_LEN: usize = 128;

/// Validate a token algorithm against security policies.
///
/// # Errors
///
/// Returns [`AuthError::UnsupportedAlgorithm`] if the algorithm is
/// `"none"` or not in [`ACCEPTED_ALGORITHMS`].
///
/// # Examples
///
/// ```
/// use gravity_common_authn::validation::validate_algorithm;
///
/// assert!(validate_algorithm("HS256").is_ok());
/// assert!(validate_algorithm("RS256").is_err());
/// assert!(validate_algorithm("none").is_err());
/// ```
pub fn validate_algorithm(alg: &str) -> Result<(), AuthError> {
    if FORBIDDEN_ALGORITHMS.contains(&alg) {
        return Err(AuthError::unsupported_algorithm(format!(
            "Algorithm '{}' is not allowed for security reasons",
            alg
        )));
    }

    if !ACCEPTED_ALGORITHMS.contains(&alg) {
        return Err(AuthError::unsupported_algorithm(format!(
            "Algorithm '{}' is not in accepted list (only HMAC-SHA2 is supported)",
            alg
        )));
    }

    Ok(())
}

/// Validate a `kid` header value before registry lookup.
///
/// Accepts 1–[`MAX_KID_LEN`] characters from `[A-Za-z0-9._-]`. Anything
/// else — including path separators and control characters — is rejected
/// before the value reaches the key registry.
///
/// # Errors
///
/// Returns [`AuthError::InvalidTokenFormat`] for empty, oversized, or
/// out-of-charset key ids.
pub fn validate_kid(kid: &str) -> Result<(), AuthError> {
    if kid.is_empty() {
        return Err(AuthError::invalid_token_format("kid must not be empty"));
    }
    if kid.len() > MAX_KID_LEN {
        return Err(AuthError::invalid_token_format(format!(
            "kid exceeds {} characters",
            MAX_KID_LEN
        )));
    }
    if !kid.bytes().all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-')) {
        return Err(AuthError::invalid_token_format("kid contains invalid characters"));
    }
    Ok(())
}
