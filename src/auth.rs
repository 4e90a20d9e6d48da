//! Credential hashing and signed session claims used by the backend.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Result, ServiceError};
use crate::models::{Role, UserId};

/// What a session token asserts about its bearer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub user_id: UserId,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    nonce: String,
}

pub struct TokenSigner {
    secret: Vec<u8>,
}

impl TokenSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    fn sign(&self, payload: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.secret);
        hasher.update(payload);
        hex::encode(hasher.finalize())
    }

    /// Token layout: `hex(json claim).hex(sha256(secret || json claim))`.
    pub fn issue(&self, user_id: UserId, role: Role) -> Result<String> {
        let claim = Claim {
            user_id,
            role,
            issued_at: Utc::now(),
            nonce: random_hex(8),
        };
        let payload = serde_json::to_vec(&claim)?;
        Ok(format!("{}.{}", hex::encode(&payload), self.sign(&payload)))
    }

    pub fn verify(&self, token: &str) -> Result<Claim> {
        let (payload_hex, signature) = token
            .split_once('.')
            .ok_or(ServiceError::Unauthenticated)?;
        let payload = hex::decode(payload_hex).map_err(|_| ServiceError::Unauthenticated)?;
        if self.sign(&payload) != signature {
            return Err(ServiceError::Unauthenticated);
        }
        serde_json::from_slice(&payload).map_err(|_| ServiceError::Unauthenticated)
    }
}

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill(bytes.as_mut_slice());
    hex::encode(bytes)
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Salted SHA-256, stored as `salt$digest`.
pub fn hash_password(password: &str) -> String {
    let salt = random_hex(16);
    format!("{}${}", salt, digest(&salt, password))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, expected)) => digest(salt, password) == expected,
        None => false,
    }
}
