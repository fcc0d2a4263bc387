//! Password hashing using Argon2id
//!
//! Wraps Argon2id with OWASP-recommended parameters. Hashes are PHC
//! strings, self-describing for verification.
//!
//! # Example
//!
//! ```rust
//! use trailhead_service::auth::password::PasswordHasher;
//!
//! let hasher = PasswordHasher::default();
//! let hash = hasher.hash("correct horse battery").unwrap();
//! assert!(hasher.verify("correct horse battery", &hash).unwrap());
//! assert!(!hasher.verify("wrong", &hash).unwrap());
//! ```

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as Argon2Hasher, PasswordVerifier,
        SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

use crate::error::AppError;

/// Argon2id parameters.
#[derive(Debug, Clone)]
pub struct PasswordConfig {
    /// Memory cost in KiB
    pub memory_cost_kib: u32,
    /// Number of iterations
    pub time_cost: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        // OWASP-recommended minimums for Argon2id
        Self {
            memory_cost_kib: 19_456,
            time_cost: 2,
            parallelism: 1,
        }
    }
}

/// Password hasher using Argon2id.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(PasswordConfig::default())
    }
}

impl PasswordHasher {
    /// Create a hasher with custom parameters.
    ///
    /// # Panics
    ///
    /// Panics if the parameters are outside Argon2's accepted ranges;
    /// configurations are validated at startup, not per request.
    #[must_use]
    pub fn new(config: PasswordConfig) -> Self {
        let params = Params::new(
            config.memory_cost_kib,
            config.time_cost,
            config.parallelism,
            None,
        )
        .expect("Invalid Argon2 parameters");

        Self { params }
    }

    /// Hash a password into a PHC string.
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))?;
        Ok(hash.to_string())
    }

    /// Verify a password against a stored hash (constant-time).
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash format: {e}")))?;
        let argon2 = Argon2::default();
        match argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::Internal(format!(
                "Password verification failed: {e}"
            ))),
        }
    }
}
