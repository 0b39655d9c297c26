//! Password hashing.
//!
//! Argon2id with per-password salts in PHC string format; verification never
//! reveals whether the email or the password was wrong.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Hash a password for storage.
///
/// # Errors
///
/// Returns the underlying `password_hash` error when hashing fails.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC hash. An unparsable hash verifies
/// as false rather than erroring.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_round_trip() {
        let hash = hash_password("pass123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("pass123", &hash));
        assert!(!verify_password("pass124", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("pass123").unwrap();
        let b = hash_password("pass123").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_garbage_hash_verifies_false() {
        assert!(!verify_password("pass123", "not-a-phc-string"));
        assert!(!verify_password("pass123", ""));
    }
}
