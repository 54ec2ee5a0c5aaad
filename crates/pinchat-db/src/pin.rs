//! PIN credential hashing.
//!
//! The default [`Sha256PinHasher`] stores an unsalted hex SHA-256 digest of
//! the UTF-8 PIN. That is deterministic and weak against precomputed tables;
//! deployments that can afford it should select [`Argon2PinHasher`], which
//! stores a salted PHC string instead. The two formats are not
//! interchangeable: a credential written by one never verifies under the
//! other.

use std::str::FromStr;

use anyhow::Result;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand_core::OsRng;
use sha2::{Digest, Sha256};

pub trait PinHasher: Send + Sync {
    fn hash(&self, pin: &str) -> Result<String>;
    fn verify(&self, pin: &str, stored: &str) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256PinHasher;

impl PinHasher for Sha256PinHasher {
    fn hash(&self, pin: &str) -> Result<String> {
        Ok(hex::encode(Sha256::digest(pin.as_bytes())))
    }

    fn verify(&self, pin: &str, stored: &str) -> bool {
        hex::encode(Sha256::digest(pin.as_bytes())) == stored
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2PinHasher;

impl PinHasher for Argon2PinHasher {
    fn hash(&self, pin: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(pin.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("argon2 hashing failed: {}", e))?;
        Ok(hash.to_string())
    }

    fn verify(&self, pin: &str, stored: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored) else {
            return false;
        };
        Argon2::default()
            .verify_password(pin.as_bytes(), &parsed)
            .is_ok()
    }
}

/// Hash scheme selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PinHashScheme {
    #[default]
    Sha256,
    Argon2,
}

impl PinHashScheme {
    pub fn hasher(self) -> Box<dyn PinHasher> {
        match self {
            Self::Sha256 => Box::new(Sha256PinHasher),
            Self::Argon2 => Box::new(Argon2PinHasher),
        }
    }
}

impl FromStr for PinHashScheme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" => Ok(Self::Sha256),
            "argon2" => Ok(Self::Argon2),
            other => anyhow::bail!("unknown PIN hash scheme '{}'", other),
        }
    }
}
