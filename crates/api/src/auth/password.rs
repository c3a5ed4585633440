//! Argon2id password hashing and verification.
//!
//! Hashes use the Argon2id variant with a random salt from [`OsRng`], stored
//! in PHC string format so parameters and salt travel with the hash.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use autoservice_core::error::CoreError;
use autoservice_core::ports::PasswordHashing;

/// Hash a plaintext password using Argon2id with a random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default(); // Argon2id with default params
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored PHC-formatted hash.
///
/// Returns `Ok(false)` on mismatch; malformed hashes are errors.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// [`PasswordHashing`] adapter over [`hash_password`] and [`verify_password`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

impl PasswordHashing for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, CoreError> {
        hash_password(plaintext).map_err(|e| CoreError::Internal(format!("Password hashing error: {e}")))
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, CoreError> {
        verify_password(plaintext, hash)
            .map_err(|e| CoreError::Internal(format!("Password verification error: {e}")))
    }
}
