//! Argon2id hashing for the `passwordhash` column.
//!
//! The auth service owns the real credential; the role tables keep their own
//! hash column, so sign-up fills it with a PHC string (algorithm, params and
//! salt embedded) rather than anything reversible.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHasher, SaltString};

/// Hash a plaintext password with a random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}
