//! Credential store
//!
//! Passwords are hashed with Argon2id using the argon2 crate defaults and a
//! fresh random salt per call. The stored value is a PHC string that carries
//! the algorithm, parameters and salt alongside the digest.

use anyhow::{Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a plaintext password into a PHC string.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("{}", e))
        .context("Password hashing failed")?;

    Ok(hash.to_string())
}

/// Check a plaintext password against a stored PHC string.
///
/// A mismatch is `Ok(false)`. Only a stored hash that cannot be parsed, or an
/// internal argon2 failure, is an error. The digest comparison inside argon2
/// is constant-time.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| anyhow::anyhow!("{}", e))
        .context("Stored password hash is not a valid PHC string")?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("{}", e)).context("Password verification error"),
    }
}
