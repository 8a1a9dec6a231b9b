// ── Password codec ──
//
// Salted PBKDF2 hashing and the packed `hash::salt` on-disk format.
// The salt handled everywhere outside this module is the base64
// *string*; its UTF-8 bytes feed the KDF, which keeps the stored format
// bit-compatible with existing credential files.
//
// Hashing is CPU-bound; route handlers run it under `spawn_blocking`.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha512;
use subtle::ConstantTimeEq;
use thiserror::Error;

const ITERATIONS: u32 = 10_000;
const DERIVED_KEY_LEN: usize = 512;
const SALT_LEN: usize = 128;
const SEPARATOR: &str = "::";

#[derive(Debug, Error)]
pub enum PasswordError {
    /// The stored packed string does not decompose into `hash::salt`.
    #[error("malformed packed credential")]
    MalformedCredential,
}

/// Generate a fresh salt: base64 of 128 random bytes.
pub fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    BASE64.encode(bytes)
}

/// PBKDF2-HMAC-SHA512, 10,000 iterations, 512-byte derived key,
/// base64-encoded.
pub fn hash(password: &str, salt_b64: &str) -> String {
    let mut key = vec![0u8; DERIVED_KEY_LEN];
    pbkdf2_hmac::<Sha512>(
        password.as_bytes(),
        salt_b64.as_bytes(),
        ITERATIONS,
        &mut key,
    );
    BASE64.encode(key)
}

/// Pack a hash and its salt into the on-disk string.
pub fn pack(hash_b64: &str, salt_b64: &str) -> String {
    format!("{hash_b64}{SEPARATOR}{salt_b64}")
}

/// The salt component of a packed credential.
pub fn extract_salt(packed: &str) -> Result<&str, PasswordError> {
    match packed.split_once(SEPARATOR) {
        Some((hash_b64, salt_b64)) if !hash_b64.is_empty() && !salt_b64.is_empty() => Ok(salt_b64),
        _ => Err(PasswordError::MalformedCredential),
    }
}

/// Salt a fresh password and return the packed credential for storage.
pub fn pack_new(password: &str) -> String {
    let salt = generate_salt();
    pack(&hash(password, &salt), &salt)
}

/// Recompute with the stored salt and compare constant-time over the
/// packed bytes.
pub fn verify(packed: &str, password: &str) -> Result<bool, PasswordError> {
    let salt = extract_salt(packed)?;
    let candidate = pack(&hash(password, salt), salt);
    Ok(candidate.as_bytes().ct_eq(packed.as_bytes()).into())
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn salt_is_128_random_bytes_base64() {
        let salt = generate_salt();
        let decoded = BASE64.decode(&salt).unwrap();
        assert_eq!(decoded.len(), SALT_LEN);
        assert_ne!(generate_salt(), salt);
    }

    #[test]
    fn extract_salt_round_trips() {
        let packed = pack("aGFzaA==", "c2FsdA==");
        assert_eq!(extract_salt(&packed).unwrap(), "c2FsdA==");
    }

    #[test]
    fn extract_salt_rejects_malformed_strings() {
        for bad in ["", "no-separator", "::salt-only", "hash-only::"] {
            assert!(extract_salt(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn hashing_is_deterministic_per_salt() {
        let salt = generate_salt();
        assert_eq!(hash("hunter2", &salt), hash("hunter2", &salt));
        assert_ne!(hash("hunter2", &salt), hash("hunter3", &salt));
        assert_ne!(hash("hunter2", &salt), hash("hunter2", &generate_salt()));
    }

    #[test]
    fn derived_key_is_512_bytes() {
        let digest = hash("hunter2", &generate_salt());
        assert_eq!(BASE64.decode(digest).unwrap().len(), DERIVED_KEY_LEN);
    }

    #[test]
    fn verify_accepts_the_original_password_only() {
        let packed = pack_new("hunter2");
        assert!(verify(&packed, "hunter2").unwrap());
        assert!(!verify(&packed, "hunter3").unwrap());
        assert!(!verify(&packed, "").unwrap());
    }
}
