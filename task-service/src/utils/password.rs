//! Argon2id password hashing.
//!
//! Hashes are self-describing strings of the form
//! `$argon2id$v=19$m=<memory>,t=<time>,p=<parallelism>$<salt>$<digest>`, with salt and digest in
//! standard base64 without padding. Everything needed to verify travels with the hash, so cost
//! parameters can change without invalidating stored credentials.

use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use serde::Deserialize;
use subtle::ConstantTimeEq;

use crate::services::AuthError;

const ALGORITHM_TAG: &str = "argon2id";
const ARGON2_VERSION: u32 = 0x13;
const SALT_LEN: usize = 16;

/// Newtype for password to prevent accidental logging
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Newtype for an encoded password hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHashString(String);

impl PasswordHashString {
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Argon2id cost parameters used when producing new hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PasswordConfig {
    pub time_cost: u32,
    pub memory_cost_kib: u32,
    pub parallelism: u32,
    pub key_length: usize,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            time_cost: 1,
            memory_cost_kib: 64 * 1024,
            parallelism: 4,
            key_length: 32,
        }
    }
}

impl PasswordConfig {
    /// Argon2 parameters for this configuration, or `InvalidParams` if Argon2 refuses them.
    pub fn params(&self) -> Result<Params, AuthError> {
        Params::new(
            self.memory_cost_kib,
            self.time_cost,
            self.parallelism,
            Some(self.key_length),
        )
        .map_err(|e| AuthError::InvalidParams(e.to_string()))
    }
}

/// Hash a password with Argon2id and a fresh 16-byte salt.
///
/// `None` uses [`PasswordConfig::default`].
pub fn hash_password(
    password: &Password,
    config: Option<&PasswordConfig>,
) -> Result<PasswordHashString, AuthError> {
    if password.is_empty() {
        return Err(AuthError::EmptyPassword);
    }

    let config = config.copied().unwrap_or_default();
    let params = config.params()?;

    let mut salt = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| AuthError::CryptoFailure(e.to_string()))?;

    let mut digest = vec![0u8; config.key_length];
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password_into(password.as_str().as_bytes(), &salt, &mut digest)
        .map_err(|e| AuthError::InvalidParams(e.to_string()))?;

    Ok(PasswordHashString::new(format!(
        "${}$v={}$m={},t={},p={}${}${}",
        ALGORITHM_TAG,
        ARGON2_VERSION,
        config.memory_cost_kib,
        config.time_cost,
        config.parallelism,
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(&digest),
    )))
}

/// Verify a password against an encoded hash using constant-time comparison
///
/// Returns `Ok(false)` on mismatch. Errors only when the stored hash cannot be parsed.
pub fn verify_password(
    password: &Password,
    password_hash: &PasswordHashString,
) -> Result<bool, AuthError> {
    let parsed = ParsedHash::parse(password_hash.as_str())?;

    let params = Params::new(
        parsed.memory_cost_kib,
        parsed.time_cost,
        parsed.parallelism,
        Some(parsed.digest.len()),
    )
    .map_err(|_| AuthError::InvalidHashFormat)?;

    let mut computed = vec![0u8; parsed.digest.len()];
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password_into(password.as_str().as_bytes(), &parsed.salt, &mut computed)
        .map_err(|_| AuthError::InvalidHashFormat)?;

    Ok(computed.ct_eq(&parsed.digest).into())
}

/// [`hash_password`] on the blocking pool.
pub async fn hash_password_blocking(
    password: Password,
    config: PasswordConfig,
) -> Result<PasswordHashString, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&password, Some(&config)))
        .await
        .map_err(|e| AuthError::Internal(anyhow::anyhow!("hashing task failed: {}", e).into()))?
}

/// [`verify_password`] on the blocking pool.
pub async fn verify_password_blocking(
    password: Password,
    password_hash: PasswordHashString,
) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .map_err(|e| AuthError::Internal(anyhow::anyhow!("verification task failed: {}", e).into()))?
}

struct ParsedHash {
    memory_cost_kib: u32,
    time_cost: u32,
    parallelism: u32,
    salt: Vec<u8>,
    digest: Vec<u8>,
}

impl ParsedHash {
    fn parse(encoded: &str) -> Result<Self, AuthError> {
        let fields: Vec<&str> = encoded.split('$').collect();
        let [leading, algorithm, version, params, salt, digest] = fields.as_slice() else {
            return Err(AuthError::InvalidHashFormat);
        };

        if !leading.is_empty() || *algorithm != ALGORITHM_TAG {
            return Err(AuthError::InvalidHashFormat);
        }

        let version: u32 = version
            .strip_prefix("v=")
            .and_then(|v| v.parse().ok())
            .ok_or(AuthError::InvalidHashFormat)?;
        if version != ARGON2_VERSION {
            return Err(AuthError::IncompatibleVersion(version));
        }

        let (mut memory, mut time, mut lanes) = (None, None, None);
        for pair in params.split(',') {
            let (key, value) = pair.split_once('=').ok_or(AuthError::InvalidHashFormat)?;
            let value: u32 = value.parse().map_err(|_| AuthError::InvalidHashFormat)?;
            let slot = match key {
                "m" => &mut memory,
                "t" => &mut time,
                "p" => &mut lanes,
                _ => return Err(AuthError::InvalidHashFormat),
            };
            if slot.replace(value).is_some() {
                return Err(AuthError::InvalidHashFormat);
            }
        }

        let salt = STANDARD_NO_PAD
            .decode(salt)
            .map_err(|_| AuthError::InvalidHashFormat)?;
        let digest = STANDARD_NO_PAD
            .decode(digest)
            .map_err(|_| AuthError::InvalidHashFormat)?;
        if salt.is_empty() || digest.is_empty() {
            return Err(AuthError::InvalidHashFormat);
        }

        Ok(Self {
            memory_cost_kib: memory.ok_or(AuthError::InvalidHashFormat)?,
            time_cost: time.ok_or(AuthError::InvalidHashFormat)?,
            parallelism: lanes.ok_or(AuthError::InvalidHashFormat)?,
            salt,
            digest,
        })
    }
}
