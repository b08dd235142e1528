//! Password hashing and verification using Argon2id

use crate::{config::SecurityConfig, error::AppError};
use argon2::{Algorithm, Argon2, Params, Version};
use password_hash::{
    rand_core::OsRng, Error as HashError, PasswordHash, PasswordHasher as _, PasswordVerifier,
    SaltString,
};

/// Password hasher with a fixed work factor
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Create hasher with explicit Argon2 cost parameters
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, AppError> {
        let params = Params::new(memory_kib, iterations, parallelism, None).map_err(|e| {
            AppError::Config(format!("Invalid Argon2 params: {}", e))
        })?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        Ok(Self { argon2 })
    }

    /// Create hasher from the security section of the config
    pub fn from_config(config: &SecurityConfig) -> Result<Self, AppError> {
        Self::new(
            config.password_hash_memory_kib,
            config.password_hash_iterations,
            config.password_hash_parallelism,
        )
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to hash password");
                AppError::internal_error("Failed to hash password")
            })?
            .to_string();

        Ok(password_hash)
    }

    /// Verify a password against a stored hash.
    ///
    /// A mismatch is `Ok(false)`; only an unparseable stored hash is an error.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            tracing::error!(error = %e, "Stored password hash is malformed");
            AppError::internal_error("Stored password hash is malformed")
        })?;

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(HashError::Password) => Ok(false),
            Err(e) => {
                tracing::error!(error = %e, "Password verification failed");
                Err(AppError::internal_error("Password verification failed"))
            }
        }
    }
}
