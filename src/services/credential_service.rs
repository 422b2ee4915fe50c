use bcrypt::{hash, verify};

/// Password hashing with bcrypt. Plaintext never leaves this module.
#[derive(Debug, Clone, Copy)]
pub struct CredentialService {
    cost: u32,
}

impl Default for CredentialService {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl CredentialService {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, password: &str) -> Result<String, String> {
        hash(password, self.cost).map_err(|e| format!("Failed to hash password: {}", e))
    }

    /// A malformed stored hash counts as a mismatch.
    pub fn verify(&self, password: &str, stored_hash: &str) -> bool {
        match verify(password, stored_hash) {
            Ok(valid) => valid,
            Err(e) => {
                log::warn!("⚠️  Password verification error: {}", e);
                false
            }
        }
    }

    /// Spends the same work as a real check for logins with an unknown username.
    pub fn burn(&self, password: &str) {
        let _ = hash(password, self.cost);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let credentials = CredentialService::new(4);
        let hashed = credentials.hash("pw1").unwrap();

        assert_ne!(hashed, "pw1");
        assert!(credentials.verify("pw1", &hashed));
        assert!(!credentials.verify("pw2", &hashed));
    }

    #[test]
    fn test_hashes_are_salted() {
        let credentials = CredentialService::new(4);
        assert_ne!(credentials.hash("same").unwrap(), credentials.hash("same").unwrap());
    }

    #[test]
    fn test_malformed_hash_is_a_mismatch() {
        let credentials = CredentialService::new(4);
        assert!(!credentials.verify("pw1", "not-a-bcrypt-hash"));
        assert!(!credentials.verify("pw1", ""));
    }
}
