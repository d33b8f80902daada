/// Password Hashing and Verification
///
/// bcrypt with a configurable cost. Both functions are CPU-bound; async
/// callers run them on the blocking pool.

use bcrypt::{hash, verify};

use crate::error::AppError;

/// Hash a password using bcrypt
///
/// # Errors
/// Returns error if the cost is outside bcrypt's 4..=31 range
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its hash
///
/// The comparison inside bcrypt is constant-time with respect to the stored hash.
///
/// # Errors
/// Returns error if the stored hash is not a valid bcrypt string
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    verify(password, hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[test]
    fn test_hash_password() {
        let password = "pw123";
        let hash = hash_password(password, TEST_COST).expect("Failed to hash password");

        assert_ne!(password, hash);
        assert!(hash.starts_with("$2"));
    }

    #[test]
    fn test_same_password_gets_different_salts() {
        let a = hash_password("pw123", TEST_COST).unwrap();
        let b = hash_password("pw123", TEST_COST).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("pw123", TEST_COST).unwrap();

        assert!(verify_password("pw123", &hash).expect("Failed to verify password"));
        assert!(!verify_password("pw124", &hash).expect("Failed to verify password"));
    }

    #[test]
    fn test_invalid_cost() {
        assert!(hash_password("pw123", 3).is_err());
    }

    #[test]
    fn test_corrupt_hash() {
        assert!(verify_password("pw123", "not-a-bcrypt-hash").is_err());
    }
}
