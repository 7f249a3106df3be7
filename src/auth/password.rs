//! Password hashing and verification using bcrypt.

use super::error::AuthError;

/// One-way password hashing with a fixed cost factor.
///
/// Hashing salts internally, so equal plaintexts produce distinct digests.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Lower the cost factor for tests; production uses the default.
    #[must_use]
    pub const fn with_cost(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a plaintext password into a bcrypt digest string.
    pub fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        bcrypt::hash(plaintext, self.cost).map_err(|e| AuthError::Crypto(format!("hash: {e}")))
    }

    /// Verify a plaintext against a stored digest.
    ///
    /// Returns `false` on mismatch and on a malformed digest; never errors.
    #[must_use]
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        bcrypt::verify(plaintext, digest).unwrap_or(false)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        // Minimum bcrypt cost keeps the test suite fast.
        PasswordHasher::with_cost(4)
    }

    #[test]
    fn correct_password_matches() {
        let hash = hasher().hash("hunter2").unwrap();
        assert!(hasher().verify("hunter2", &hash));
    }

    #[test]
    fn wrong_password_does_not_match() {
        let hash = hasher().hash("hunter2").unwrap();
        assert!(!hasher().verify("wrong", &hash));
    }

    #[test]
    fn digest_is_salted() {
        let first = hasher().hash("hunter2").unwrap();
        let second = hasher().hash("hunter2").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn digest_never_equals_plaintext() {
        let hash = hasher().hash("hunter2").unwrap();
        assert_ne!(hash, "hunter2");
    }

    #[test]
    fn malformed_digest_returns_false() {
        assert!(!hasher().verify("hunter2", "not-a-bcrypt-digest"));
        assert!(!hasher().verify("hunter2", ""));
    }
}
