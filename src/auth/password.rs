/// Hash a plaintext password for storage.
pub fn hash(plaintext: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(plaintext, cost)
}

/// Verify plaintext against a stored hash - constant-time via bcrypt.
/// A malformed hash counts as a mismatch.
pub fn verify(plaintext: &str, stored: &str) -> bool {
    bcrypt::verify(plaintext, stored).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum cost bcrypt accepts; keeps the tests fast.
    const COST: u32 = 4;

    #[test]
    fn hash_then_verify() {
        let stored = hash("hunter2", COST).unwrap();
        assert_ne!(stored, "hunter2");
        assert!(verify("hunter2", &stored));
        assert!(!verify("hunter3", &stored));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify("hunter2", "hunter2"));
    }
}
