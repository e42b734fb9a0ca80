//! Credential hasher configuration.
//!
//! Cost parameters control the work factor of the current hashing
//! algorithm (Argon2id). They are loaded once at process start; changing
//! them does not invalidate stored hashes — old records verify with their
//! embedded parameters and report
//! [`needs_upgrade`](crate::hasher::CredentialHasher::needs_upgrade).

use argon2::Params;
use serde::{Deserialize, Serialize};

use crate::error::{CredentialError, Result};

/// Default memory cost in KiB (the `argon2` crate's default, 19 MiB).
pub const DEFAULT_MEMORY_KIB: u32 = Params::DEFAULT_M_COST;

/// Default iteration count.
pub const DEFAULT_ITERATIONS: u32 = Params::DEFAULT_T_COST;

/// Default parallelism degree.
pub const DEFAULT_PARALLELISM: u32 = Params::DEFAULT_P_COST;

/// Hashing algorithm used for newly created hashes.
///
/// Only the Argon2 family can be configured for hashing; legacy formats
/// (scrypt) are verify-only. Argon2id is the default and the right choice
/// unless a deployment has a specific side-channel threat model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// Hybrid variant, resistant to both side-channel and GPU attacks.
    #[default]
    Argon2id,
    /// Data-independent variant.
    Argon2i,
    /// Data-dependent variant.
    Argon2d,
}

impl HashAlgorithm {
    /// Returns the PHC algorithm tag.
    #[must_use]
    pub fn ident(&self) -> &'static str {
        match self {
            HashAlgorithm::Argon2id => "argon2id",
            HashAlgorithm::Argon2i => "argon2i",
            HashAlgorithm::Argon2d => "argon2d",
        }
    }

    pub(crate) fn to_argon2(self) -> argon2::Algorithm {
        match self {
            HashAlgorithm::Argon2id => argon2::Algorithm::Argon2id,
            HashAlgorithm::Argon2i => argon2::Algorithm::Argon2i,
            HashAlgorithm::Argon2d => argon2::Algorithm::Argon2d,
        }
    }
}

/// Cost parameters for [`CredentialHasher`](crate::hasher::CredentialHasher).
///
/// # Example
///
/// ```
/// use gravity_common_credential::config::HasherConfig;
///
/// let config = HasherConfig::new()
///     .with_memory_kib(64 * 1024)
///     .with_iterations(3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HasherConfig {
    /// Algorithm applied to newly created hashes.
    #[serde(default)]
    pub(crate) algorithm: HashAlgorithm,

    /// Memory cost in KiB.
    #[serde(default = "default_memory_kib")]
    pub(crate) memory_kib: u32,

    /// Number of iterations (time cost).
    #[serde(default = "default_iterations")]
    pub(crate) iterations: u32,

    /// Degree of parallelism.
    #[serde(default = "default_parallelism")]
    pub(crate) parallelism: u32,
}

fn default_memory_kib() -> u32 {
    DEFAULT_MEMORY_KIB
}

fn default_iterations() -> u32 {
    DEFAULT_ITERATIONS
}

fn default_parallelism() -> u32 {
    DEFAULT_PARALLELISM
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            memory_kib: DEFAULT_MEMORY_KIB,
            iterations: DEFAULT_ITERATIONS,
            parallelism: DEFAULT_PARALLELISM,
        }
    }
}

impl HasherConfig {
    /// Creates a configuration with the library defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the algorithm for newly created hashes.
    ///
    /// Default: Argon2id.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Sets the memory cost in KiB.
    #[must_use]
    pub fn with_memory_kib(mut self, memory_kib: u32) -> Self {
        self.memory_kib = memory_kib;
        self
    }

    /// Sets the iteration count.
    #[must_use]
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// Sets the parallelism degree.
    #[must_use]
    pub fn with_parallelism(mut self, parallelism: u32) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Returns the algorithm for newly created hashes.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Returns the memory cost in KiB.
    #[must_use]
    pub fn memory_kib(&self) -> u32 {
        self.memory_kib
    }

    /// Returns the iteration count.
    #[must_use]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Returns the parallelism degree.
    #[must_use]
    pub fn parallelism(&self) -> u32 {
        self.parallelism
    }

    /// Validates the configuration into Argon2 parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::InvalidParams`] if the parameters are
    /// outside the algorithm's accepted ranges.
    pub(crate) fn params(&self) -> Result<Params> {
        Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| CredentialError::invalid_params(e.to_string()))
    }
}
