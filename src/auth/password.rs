use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

/// Hash a plaintext password for storage. A fresh salt is drawn per call, so
/// the same password never hashes to the same string twice.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    match Argon2::default().hash_password(plain.as_bytes(), &salt) {
        Ok(hash) => Ok(hash.to_string()),
        Err(e) => {
            error!(error = %e, "password hashing failed");
            Err(anyhow::anyhow!("password hashing failed"))
        }
    }
}

/// Check a plaintext password against a stored hash. A stored hash that no
/// longer parses fails the check instead of erroring, which keeps the login
/// path's single constant-shape failure.
pub fn verify_password(plain: &str, stored_hash: &str) -> bool {
    let parsed = match PasswordHash::new(stored_hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            error!(error = %e, "stored password hash is not a valid argon2 hash");
            return false;
        }
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_the_password_it_hashed() {
        let hash = hash_password("open sesame").expect("hash");
        assert!(verify_password("open sesame", &hash));
    }

    #[test]
    fn rejects_a_different_password() {
        let hash = hash_password("open sesame").expect("hash");
        assert!(!verify_password("open sesam", &hash));
    }

    #[test]
    fn two_hashes_of_one_password_differ_but_both_verify() {
        let a = hash_password("swordfish").expect("hash");
        let b = hash_password("swordfish").expect("hash");
        assert_ne!(a, b);
        assert!(verify_password("swordfish", &a));
        assert!(verify_password("swordfish", &b));
    }

    #[test]
    fn malformed_stored_hash_fails_closed() {
        assert!(!verify_password("anything", "plainly-not-a-hash"));
        assert!(!verify_password("anything", ""));
    }
}
