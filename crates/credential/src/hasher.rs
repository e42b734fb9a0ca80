//! Password hashing and upgrade-safe verification.
//!
//! Stored credentials are PHC strings — one self-describing value embedding
//! the algorithm tag, cost parameters, salt, and digest — so the verifier
//! selects the correct algorithm from the record itself, without external
//! lookup:
//!
//! ```text
//! $argon2id$v=19$m=19456,t=2,p=1$MDEyMzQ1Njc4OWFiY2RlZg$kzlBFs...
//! ```
//!
//! Verification dispatches over a fixed, closed set of supported tags;
//! unknown tags are rejected explicitly rather than falling through.
//! Hashing always uses the configured algorithm (Argon2id by default) and
//! cost, while [`needs_upgrade`](CredentialHasher::needs_upgrade) lets a
//! caller re-hash and persist on the next successful login instead of
//! forcing a mass migration.

use std::fmt;

use argon2::{
    Argon2, Params, PasswordHasher as _, PasswordVerifier as _, Version,
    password_hash::{self, PasswordHash, SaltString},
};
use rand::rngs::OsRng;
use scrypt::Scrypt;
use serde::{Deserialize, Serialize};

use crate::{
    config::HasherConfig,
    error::{CredentialError, Result},
};

/// Algorithm tags accepted by verification.
///
/// `argon2id` is the current hashing algorithm; the others are verify-only
/// legacy formats kept so existing records keep working until re-hashed.
pub const SUPPORTED_ALGORITHMS: &[&str] = &["argon2id", "argon2i", "argon2d", "scrypt"];

/// A stored credential in self-describing PHC string form.
///
/// Created by [`CredentialHasher::hash`] and replaced — never edited — on
/// password change or hash upgrade. Suitable for storage in a single
/// database column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HashedCredential(String);

impl HashedCredential {
    /// Parses and validates a stored credential string.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::MalformedCredential`] if the value is not
    /// a PHC string, or [`CredentialError::UnsupportedAlgorithm`] if its
    /// tag is outside [`SUPPORTED_ALGORITHMS`].
    pub fn parse(stored: impl Into<String>) -> Result<Self> {
        let stored = stored.into();
        let parsed = PasswordHash::new(&stored)
            .map_err(|e| CredentialError::malformed(e.to_string()))?;
        let algorithm = parsed.algorithm.as_str();
        if !SUPPORTED_ALGORITHMS.contains(&algorithm) {
            return Err(CredentialError::unsupported_algorithm(algorithm));
        }
        Ok(Self(stored))
    }

    /// Returns the PHC string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HashedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for HashedCredential {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<HashedCredential> for String {
    fn from(credential: HashedCredential) -> Self {
        credential.0
    }
}

impl TryFrom<String> for HashedCredential {
    type Error = CredentialError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

/// Hashes plaintext secrets and verifies them against stored hashes.
///
/// Stateless per call: all state is the configured algorithm defaults.
/// The hasher is `Send + Sync`; share one instance across request-handling
/// threads.
///
/// # Blocking
///
/// `hash` and `verify` are intentionally CPU-expensive (cost-parameterized).
/// Callers inside a cooperative scheduler should dispatch them off the
/// main execution path (e.g. `tokio::task::spawn_blocking`) to avoid
/// starving other concurrent work.
pub struct CredentialHasher {
    /// Argon2id instance carrying the configured cost parameters.
    argon2: Argon2<'static>,
    /// The configuration the instance was built from, kept for
    /// `needs_upgrade` comparisons.
    config: HasherConfig,
}

impl CredentialHasher {
    /// Creates a hasher from validated cost parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::InvalidParams`] if the configuration is
    /// outside Argon2's accepted ranges.
    ///
    /// # Example
    ///
    /// ```
    /// use gravity_common_credential::{config::HasherConfig, hasher::CredentialHasher};
    ///
    /// let hasher = CredentialHasher::new(HasherConfig::default())?;
    /// let stored = hasher.hash("correct horse battery staple")?;
    /// assert!(hasher.verify("correct horse battery staple", stored.as_str())?);
    /// # Ok::<(), gravity_common_credential::error::CredentialError>(())
    /// ```
    pub fn new(config: HasherConfig) -> Result<Self> {
        let params = config.params()?;
        let argon2 = Argon2::new(config.algorithm().to_argon2(), Version::V0x13, params);
        Ok(Self { argon2, config })
    }

    /// Returns the configured cost parameters.
    #[must_use]
    pub fn config(&self) -> &HasherConfig {
        &self.config
    }

    /// Hashes a plaintext secret with the current algorithm and cost.
    ///
    /// A fresh random salt is generated per call. The plaintext is not
    /// logged and not retained beyond this call.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::HashingFailed`] on internal hashing
    /// errors.
    #[tracing::instrument(skip_all)]
    pub fn hash(&self, plaintext: &str) -> Result<HashedCredential> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| CredentialError::hashing_failed(e.to_string()))?;
        Ok(HashedCredential(hash.to_string()))
    }

    /// Verifies a plaintext secret against a stored hash.
    ///
    /// The stored value's algorithm tag selects the verifier; the digest is
    /// re-derived with the embedded salt and parameters and compared in
    /// constant time.
    ///
    /// Returns `Ok(false)` for a wrong plaintext — callers must not
    /// conflate that with the error cases below.
    ///
    /// # Errors
    ///
    /// - [`CredentialError::MalformedCredential`] — `stored` does not parse
    /// - [`CredentialError::UnsupportedAlgorithm`] — tag outside [`SUPPORTED_ALGORITHMS`]
    #[tracing::instrument(skip_all)]
    pub fn verify(&self, plaintext: &str, stored: &str) -> Result<bool> {
        let parsed =
            PasswordHash::new(stored).map_err(|e| CredentialError::malformed(e.to_string()))?;

        let outcome = match parsed.algorithm.as_str() {
            // The argon2 verifier reads the variant and parameters from the
            // hash itself, so one verifier covers the whole family.
            "argon2id" | "argon2i" | "argon2d" => {
                Argon2::default().verify_password(plaintext.as_bytes(), &parsed)
            },
            "scrypt" => Scrypt.verify_password(plaintext.as_bytes(), &parsed),
            other => return Err(CredentialError::unsupported_algorithm(other)),
        };

        match outcome {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(CredentialError::malformed(e.to_string())),
        }
    }

    /// Reports whether a stored hash should be re-hashed under the current
    /// algorithm and cost.
    ///
    /// True when the stored tag differs from the configured algorithm, the
    /// Argon2 version is stale, or the cost parameters differ from this
    /// hasher's configuration. The caller re-hashes on the next successful
    /// login and persists the replacement.
    ///
    /// # Errors
    ///
    /// Same parse failures as [`verify`](Self::verify).
    pub fn needs_upgrade(&self, stored: &str) -> Result<bool> {
        let parsed =
            PasswordHash::new(stored).map_err(|e| CredentialError::malformed(e.to_string()))?;

        let algorithm = parsed.algorithm.as_str();
        if !SUPPORTED_ALGORITHMS.contains(&algorithm) {
            return Err(CredentialError::unsupported_algorithm(algorithm));
        }
        if algorithm != self.config.algorithm().ident() {
            return Ok(true);
        }

        if parsed.version != Some(u32::from(Version::V0x13)) {
            return Ok(true);
        }
        let params =
            Params::try_from(&parsed).map_err(|e| CredentialError::malformed(e.to_string()))?;
        Ok(params.m_cost() != self.config.memory_kib()
            || params.t_cost() != self.config.iterations()
            || params.p_cost() != self.config.parallelism())
    }
}
