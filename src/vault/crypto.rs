//! PBKDF2-HMAC-SHA256 key derivation + AES-256-GCM authenticated encryption
//! for wallet private keys. A 12-byte random nonce is prepended to every
//! ciphertext so the same key can wrap any number of secrets without nonce
//! reuse.

use aes_gcm::aead::{Aead, KeyInit, generic_array::GenericArray};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use pbkdf2::pbkdf2_hmac;
use rand::Rng;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::errors::CoreError;

pub const KEY_LENGTH: usize = 32;
pub const IV_LENGTH: usize = 12;
pub const SALT_LENGTH: usize = 32;
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 600_000;

/// A derived symmetric key. Zeroed on drop so it never lingers in memory
/// past `Vault::lock`.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct DerivedKey(pub [u8; KEY_LENGTH]);

pub fn derive_key(password: &str, salt: &[u8], iterations: u32) -> DerivedKey {
    let mut key = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    DerivedKey(key)
}

pub fn random_salt() -> [u8; SALT_LENGTH] {
    rand::rng().random()
}

/// Encrypts `plaintext` with AES-256-GCM under `key`. Format: a fresh random
/// 12-byte nonce, followed by the ciphertext with its 16-byte auth tag
/// already appended by the `aes-gcm` crate.
pub fn encrypt(plaintext: &[u8], key: &DerivedKey) -> Result<Vec<u8>, CoreError> {
    let cipher_key = GenericArray::from_slice(&key.0);
    let cipher = Aes256Gcm::new(cipher_key);

    let iv: [u8; IV_LENGTH] = rand::rng().random();
    let nonce = Nonce::from_slice(&iv);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| CoreError::CorruptVault(format!("encryption failed: {e}")))?;

    let mut out = Vec::with_capacity(IV_LENGTH + ciphertext.len());
    out.extend_from_slice(&iv);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypts data produced by [`encrypt`]. An authentication-tag mismatch
/// (wrong password, or corruption) yields [`CoreError::InvalidPassword`] —
/// the cipher's tag is the vault's only integrity check; there is no
/// separate MAC.
pub fn decrypt(data: &[u8], key: &DerivedKey) -> Result<Vec<u8>, CoreError> {
    if data.len() < IV_LENGTH + 16 {
        return Err(CoreError::CorruptVault("ciphertext too short".into()));
    }

    let cipher_key = GenericArray::from_slice(&key.0);
    let cipher = Aes256Gcm::new(cipher_key);

    let nonce = Nonce::from_slice(&data[..IV_LENGTH]);
    let ciphertext = &data[IV_LENGTH..];

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CoreError::InvalidPassword)
}

pub fn encode_b64(data: &[u8]) -> String {
    B64.encode(data)
}

pub fn decode_b64(s: &str) -> Result<Vec<u8>, CoreError> {
    B64.decode(s)
        .map_err(|e| CoreError::CorruptVault(format!("invalid base64: {e}")))
}

/// Zeroes a secret buffer in place. Used by `Vault::lock` for every wallet's
/// in-memory secret material.
pub fn zero_secret(buf: &mut [u8]) {
    buf.zeroize();
}
