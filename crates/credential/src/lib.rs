//! # Gravity Common Credentials
//!
//! Password hashing with upgrade-safe verification for Gravity services.
//!
//! This crate provides:
//! - **Hashing**: Argon2id with configurable cost parameters and a fresh
//!   random salt per call
//! - **Verification**: tag-dispatched over a closed set of supported
//!   algorithms, constant-time comparison
//! - **Upgrade detection**: stored hashes under legacy algorithms or stale
//!   cost parameters report [`needs_upgrade`], so callers re-hash on the
//!   next successful login instead of running a mass migration
//!
//! ## Example
//!
//! ```
//! use gravity_common_credential::{CredentialHasher, HasherConfig};
//!
//! # fn example() -> Result<(), gravity_common_credential::CredentialError> {
//! let hasher = CredentialHasher::new(HasherConfig::default())?;
//!
//! // At account creation
//! let stored = hasher.hash("correct horse battery staple")?;
//!
//! // At login
//! if hasher.verify("correct horse battery staple", stored.as_str())? {
//!     if hasher.needs_upgrade(stored.as_str())? {
//!         let replacement = hasher.hash("correct horse battery staple")?;
//!         // persist `replacement` over `stored`
//!         # let _ = replacement;
//!     }
//! }
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Blocking
//!
//! Hashing is intentionally CPU-expensive. In async services, run `hash`
//! and `verify` via `spawn_blocking` (or an equivalent off-scheduler
//! dispatch) rather than on the executor's worker threads.
//!
//! [`needs_upgrade`]: CredentialHasher::needs_upgrade

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Credential hasher configuration.
pub mod config;
/// Credential hashing error types.
pub mod error;
/// Password hashing and upgrade-safe verification.
pub mod hasher;

// Re-export key types for convenience
pub use config::{
    DEFAULT_ITERATIONS, DEFAULT_MEMORY_KIB, DEFAULT_PARALLELISM, HashAlgorithm, HasherConfig,
};
pub use error::{CredentialError, Result};
pub use hasher::{CredentialHasher, HashedCredential, SUPPORTED_ALGORITHMS};
