//! Signing keys and the process-wide key registry.
//!
//! Keys move through a two-state lifecycle; rotation never invalidates
//! tokens signed by the previous key before their natural expiry:
//!
//! ```text
//! ┌─────────────┐  rotate   ┌─────────────┐  purge (after grace
//! │   Active    │──────────►│   Retired   │──────────────────────► gone
//! │ (signs and  │           │ (verifies   │   period ≥ longest
//! │  verifies)  │           │  only)      │   token TTL in use)
//! └─────────────┘           └─────────────┘
//! ```
//!
//! The registry is an immutable snapshot replaced atomically on rotation:
//! concurrent verifiers always observe either the old or the new complete
//! registry, never one with the new key inserted but the old key already
//! removed.

use std::{collections::HashMap, fmt, sync::Arc};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use parking_lot::RwLock;
use rand::{RngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{AuthError, Result};

/// Byte length of generated HMAC secrets.
pub const GENERATED_SECRET_LEN: usize = 32;

/// Signing algorithm for token signatures.
///
/// Only symmetric HMAC algorithms are supported — the secret never leaves
/// process configuration, so there is no key-distribution problem asymmetric
/// signatures would solve here. The variant names match the JWT `alg`
/// header values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    /// HMAC with SHA-256.
    HS256,
    /// HMAC with SHA-384.
    HS384,
    /// HMAC with SHA-512.
    HS512,
}

impl SigningAlgorithm {
    /// Returns the JWT `alg` header value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SigningAlgorithm::HS256 => "HS256",
            SigningAlgorithm::HS384 => "HS384",
            SigningAlgorithm::HS512 => "HS512",
        }
    }

    /// Converts to the `jsonwebtoken` algorithm variant.
    #[must_use]
    pub(crate) fn to_jwt(self) -> Algorithm {
        match self {
            SigningAlgorithm::HS256 => Algorithm::HS256,
            SigningAlgorithm::HS384 => Algorithm::HS384,
            SigningAlgorithm::HS512 => Algorithm::HS512,
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a signing key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStatus {
    /// The key signs new tokens and verifies outstanding ones.
    Active,
    /// The key only verifies tokens minted before rotation.
    Retired,
}

/// Base64url (no padding) serde for secret material.
mod serde_secret {
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use zeroize::Zeroizing;

    pub fn serialize<S: Serializer>(
        secret: &Zeroizing<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&URL_SAFE_NO_PAD.encode(secret.as_slice()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Zeroizing<Vec<u8>>, D::Error> {
        let encoded = Zeroizing::new(String::deserialize(deserializer)?);
        URL_SAFE_NO_PAD
            .decode(encoded.as_bytes())
            .map(Zeroizing::new)
            .map_err(|e| D::Error::custom(format!("invalid base64 secret: {e}")))
    }
}

/// Symmetric signing key held in process configuration.
///
/// The secret material is wrapped in [`Zeroizing`] so it is scrubbed from
/// memory on drop, and serialized as base64url in configuration.
///
/// # Example
///
/// ```
/// use gravity_common_authn::keyring::{KeyStatus, SigningKey};
///
/// let key = SigningKey::builder()
///     .kid("key-2024-001")
///     .secret(b"0123456789abcdef0123456789abcdef".to_vec())
///     .build();
///
/// assert_eq!(key.status, KeyStatus::Active);
/// assert!(key.retired_at.is_none());
/// ```
#[derive(Clone, Serialize, Deserialize, bon::Builder)]
pub struct SigningKey {
    /// Key ID (matches the token `kid` header).
    ///
    /// This uniquely identifies the key and is used for lookup during
    /// verification. The `kid` in the token header must match this value.
    #[builder(into)]
    pub kid: String,

    /// Raw HMAC secret.
    #[builder(into)]
    #[serde(with = "serde_secret")]
    pub secret: Zeroizing<Vec<u8>>,

    /// Signature algorithm this key is used with.
    ///
    /// Verification always uses the algorithm recorded here, never the one
    /// an attacker places in the token header.
    #[builder(default = SigningAlgorithm::HS256)]
    #[serde(default = "default_algorithm")]
    pub algorithm: SigningAlgorithm,

    /// Lifecycle state.
    #[builder(default = KeyStatus::Active)]
    #[serde(default = "default_status")]
    pub status: KeyStatus,

    /// When the key was created.
    #[builder(default = Utc::now())]
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    /// When the key was retired by rotation, if it has been.
    #[serde(default)]
    pub retired_at: Option<DateTime<Utc>>,
}

fn default_algorithm() -> SigningAlgorithm {
    SigningAlgorithm::HS256
}

fn default_status() -> KeyStatus {
    KeyStatus::Active
}

impl SigningKey {
    /// Generates a fresh active HS256 key with random secret material.
    ///
    /// Used by the rotation protocol: generate a key with a fresh `kid`,
    /// then pass it to [`KeyRing::rotate`].
    #[must_use]
    pub fn generate(kid: impl Into<String>) -> Self {
        let mut secret = Zeroizing::new(vec![0u8; GENERATED_SECRET_LEN]);
        OsRng.fill_bytes(&mut secret);
        SigningKey::builder().kid(kid).secret(secret).build()
    }

    pub(crate) fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(&self.secret)
    }

    pub(crate) fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(&self.secret)
    }
}

impl fmt::Debug for SigningKey {
    /// Redacts the secret material.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("status", &self.status)
            .field("created_at", &self.created_at)
            .field("retired_at", &self.retired_at)
            .finish()
    }
}

/// Immutable registry snapshot: at most one active key plus the retired
/// keys kept verifiable.
///
/// Snapshots are never edited in place — [`KeyRing`] publishes a complete
/// new snapshot on every rotation or purge.
#[derive(Debug, Clone)]
pub struct KeyRegistry {
    active: Option<SigningKey>,
    retired: HashMap<String, SigningKey>,
}

impl KeyRegistry {
    /// Builds a snapshot from an active key and previously retired keys.
    ///
    /// Status fields are normalized from list position: the first argument
    /// becomes the single active key, every entry of `retired` is marked
    /// retired. This keeps the at-most-one-active invariant true by
    /// construction.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::KeyConflict`] if two keys share a `kid`.
    pub fn new(active: SigningKey, retired: Vec<SigningKey>) -> Result<Self> {
        let mut retired_map = HashMap::with_capacity(retired.len());
        for mut key in retired {
            if key.kid == active.kid || retired_map.contains_key(&key.kid) {
                return Err(AuthError::key_conflict(key.kid));
            }
            key.status = KeyStatus::Retired;
            retired_map.insert(key.kid.clone(), key);
        }
        let mut active = active;
        active.status = KeyStatus::Active;
        Ok(Self { active: Some(active), retired: retired_map })
    }

    /// Builds an empty snapshot with no active key.
    ///
    /// Minting against an empty registry fails with
    /// [`AuthError::NoActiveKey`].
    #[must_use]
    pub fn empty() -> Self {
        Self { active: None, retired: HashMap::new() }
    }

    /// Returns the active key, if one is configured.
    #[must_use]
    pub fn active(&self) -> Option<&SigningKey> {
        self.active.as_ref()
    }

    /// Resolves a key by id, active or retired.
    #[must_use]
    pub fn find(&self, kid: &str) -> Option<&SigningKey> {
        match &self.active {
            Some(key) if key.kid == kid => Some(key),
            _ => self.retired.get(kid),
        }
    }

    /// Key ids of the retired keys, in no particular order.
    #[must_use]
    pub fn retired_kids(&self) -> Vec<&str> {
        self.retired.keys().map(String::as_str).collect()
    }
}

/// Process-wide key registry handle with atomic snapshot replacement.
///
/// Reads are a short lock acquisition plus an `Arc` clone; verification
/// then proceeds lock-free against the immutable snapshot. Rotation and
/// purge build a new snapshot and swap the reference under the write lock.
///
/// # Thread Safety
///
/// `KeyRing` is `Send + Sync` and intended to be shared behind an
/// [`Arc`] across request-handling threads.
pub struct KeyRing {
    current: RwLock<Arc<KeyRegistry>>,
}

impl KeyRing {
    /// Creates a ring from an initial snapshot.
    #[must_use]
    pub fn new(registry: KeyRegistry) -> Self {
        Self { current: RwLock::new(Arc::new(registry)) }
    }

    /// Returns the current immutable snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<KeyRegistry> {
        self.current.read().clone()
    }

    /// Rotates the active key.
    ///
    /// The new key becomes active and the previous active key (if any)
    /// moves to retired, where it keeps verifying outstanding tokens until
    /// purged. Both changes land in one snapshot swap, so no verifier can
    /// observe an intermediate state.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::KeyConflict`] if a key with the same `kid`
    /// already exists in the registry.
    #[tracing::instrument(skip(self, new_key), fields(kid = %new_key.kid))]
    pub fn rotate(&self, mut new_key: SigningKey) -> Result<()> {
        let mut current = self.current.write();

        if current.find(&new_key.kid).is_some() {
            return Err(AuthError::key_conflict(new_key.kid));
        }

        let mut retired = current.retired.clone();
        if let Some(previous) = current.active.clone() {
            let mut previous = previous;
            previous.status = KeyStatus::Retired;
            previous.retired_at = Some(Utc::now());
            tracing::debug!(retired_kid = %previous.kid, "previous active key retired");
            retired.insert(previous.kid.clone(), previous);
        }

        new_key.status = KeyStatus::Active;
        new_key.retired_at = None;
        *current = Arc::new(KeyRegistry { active: Some(new_key), retired });
        Ok(())
    }

    /// Removes a retired key from the registry.
    ///
    /// # Operational hazard
    ///
    /// Purging a retired key before the grace period (≥ the longest token
    /// TTL in use) has elapsed makes still-valid tokens signed with it fail
    /// verification with [`AuthError::KeyNotFound`]. This is surfaced to
    /// callers, not silently handled.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidConfig`] when `kid` names the active
    /// key, or [`AuthError::KeyNotFound`] when it names no key at all.
    #[tracing::instrument(skip(self))]
    pub fn purge(&self, kid: &str) -> Result<()> {
        let mut current = self.current.write();

        if current.active.as_ref().is_some_and(|key| key.kid == kid) {
            return Err(AuthError::invalid_config(format!(
                "active key '{kid}' cannot be purged; rotate first"
            )));
        }
        if !current.retired.contains_key(kid) {
            return Err(AuthError::key_not_found(kid));
        }

        let mut retired = current.retired.clone();
        retired.remove(kid);
        tracing::warn!(kid, "retired signing key purged; outstanding tokens under it will fail");
        *current = Arc::new(KeyRegistry { active: current.active.clone(), retired });
        Ok(())
    }
}

impl fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("KeyRing")
            .field("active", &snapshot.active().map(|k| k.kid.as_str()))
            .field("retired", &snapshot.retired_kids())
            .finish()
    }
}

/// Decodes a configured base64url secret into raw bytes.
///
/// Convenience for callers that hold key material as text outside the
/// serde path (environment variables, secret managers).
///
/// # Errors
///
/// Returns [`AuthError::InvalidConfig`] if the input is not valid
/// base64url.
pub fn decode_secret(encoded: &str) -> Result<Zeroizing<Vec<u8>>> {
    URL_SAFE_NO_PAD
        .decode(encoded.as_bytes())
        .map(Zeroizing::new)
        .map_err(|e| AuthError::invalid_config(format!("invalid base64 secret: {e}")))
}
