//! Salted room passwords. Plaintext is dropped at hashing time and never
//! appears in views or logs.

use rand::Rng;
use sha2::{Digest, Sha256};

/// A salted SHA-256 digest of a room password.
#[derive(Debug, Clone)]
pub struct PasswordHash {
    salt: String,
    digest: String,
}

impl PasswordHash {
    pub fn new(password: &str) -> Self {
        let mut salt = [0u8; 16];
        rand::rng().fill(&mut salt[..]);
        let salt = hex::encode(salt);
        let digest = Self::digest(&salt, password);
        Self { salt, digest }
    }

    pub fn verify(&self, attempt: &str) -> bool {
        Self::digest(&self.salt, attempt) == self.digest
    }

    fn digest(salt: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }
}
