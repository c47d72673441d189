//! PBKDF2-HMAC-SHA256 password hashing.
//!
//! Encoded form: `pbkdf2-sha256$<iterations>$<salt>$<hash>` with unpadded
//! standard base64 for salt and hash.

use std::num::NonZeroU32;
use std::sync::OnceLock;

use anyhow::{anyhow, Result};
use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};

use crate::errors::AppError;

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;
const ITERATIONS: NonZeroU32 = match NonZeroU32::new(100_000) {
    Some(n) => n,
    None => panic!("iteration count must be non-zero"),
};

pub fn hash_password(password: &str) -> Result<String> {
    let mut salt = [0u8; SALT_LEN];
    SystemRandom::new()
        .fill(&mut salt)
        .map_err(|_| anyhow!("system RNG unavailable"))?;

    let mut hash = [0u8; HASH_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        ITERATIONS,
        &salt,
        password.as_bytes(),
        &mut hash,
    );

    Ok(format!(
        "{SCHEME}${}${}${}",
        ITERATIONS,
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(hash)
    ))
}

/// Constant-time check of `password` against an encoded hash.
/// Malformed hashes never verify.
pub fn verify_password(password: &str, encoded: &str) -> bool {
    let mut parts = encoded.split('$');
    let (Some(SCHEME), Some(iterations), Some(salt), Some(hash), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };

    let Some(iterations) = iterations.parse::<u32>().ok().and_then(NonZeroU32::new) else {
        return false;
    };
    let (Ok(salt), Ok(hash)) = (STANDARD_NO_PAD.decode(salt), STANDARD_NO_PAD.decode(hash)) else {
        return false;
    };

    pbkdf2::verify(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        &salt,
        password.as_bytes(),
        &hash,
    )
    .is_ok()
}

/// Hashes on the blocking pool; PBKDF2 is CPU-bound.
pub async fn hash(password: String) -> Result<String, AppError> {
    let encoded = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(anyhow::Error::from)??;
    Ok(encoded)
}

/// Verifies on the blocking pool. `None` checks against a throwaway hash so
/// unknown accounts cost the same as wrong passwords.
pub async fn verify(password: String, encoded: Option<String>) -> Result<bool, AppError> {
    let matched = tokio::task::spawn_blocking(move || match encoded {
        Some(encoded) => verify_password(&password, &encoded),
        None => {
            verify_password(&password, dummy_hash());
            false
        }
    })
    .await
    .map_err(anyhow::Error::from)?;
    Ok(matched)
}

fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| hash_password("gamevault-dummy-password").unwrap_or_default())
}
