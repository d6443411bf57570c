//! Wallet record types held inside the vault, plus the signature-scheme
//! abstraction that keeps address derivation a parameter rather than a
//! hardcoded curve — grounded in the teacher's `Venue` trait split
//! (`venues/mod.rs`), which keeps execution details behind a trait so the
//! router never hardcodes a single chain's primitives.

use ed25519_dalek::Signer as _;
use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// The role a wallet plays in a session, used by the orchestrator's presets
/// and by the treasury mover's protected-wallet guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletType {
    Sniper,
    Treasury,
    Burner,
}

/// Derives a public address from raw secret-key bytes and signs payloads on
/// its behalf. A parameter of the vault rather than a hardcoded curve, so
/// the same encrypted-blob format serves any Solana-family signature scheme.
pub trait KeypairScheme: Send + Sync {
    /// Validates `secret` is well-formed for this scheme and derives its
    /// base58 address.
    fn derive_address(&self, secret: &[u8]) -> Result<String, String>;

    /// Generates a fresh `(secret, address)` pair.
    fn generate(&self) -> (Vec<u8>, String);

    /// Signs `message` with `secret`, returning the raw signature bytes.
    fn sign(&self, secret: &[u8], message: &[u8]) -> Result<Vec<u8>, String>;
}

/// Ed25519 keypair scheme, the default for Solana-family chains.
/// Address derivation and generation are stubbed behind this trait boundary
/// so a different chain's scheme can be swapped in without touching vault
/// storage or the crypto layer.
pub struct Ed25519Scheme;

impl KeypairScheme for Ed25519Scheme {
    fn derive_address(&self, secret: &[u8]) -> Result<String, String> {
        let signing_key = signing_key_from_secret(secret)?;
        Ok(bs58_encode(signing_key.verifying_key().as_bytes()))
    }

    fn generate(&self) -> (Vec<u8>, String) {
        let signing_key = SigningKey::generate(&mut rand::rng());
        let address = bs58_encode(signing_key.verifying_key().as_bytes());
        (signing_key.to_bytes().to_vec(), address)
    }

    fn sign(&self, secret: &[u8], message: &[u8]) -> Result<Vec<u8>, String> {
        let signing_key = signing_key_from_secret(secret)?;
        Ok(signing_key.sign(message).to_bytes().to_vec())
    }
}

fn signing_key_from_secret(secret: &[u8]) -> Result<SigningKey, String> {
    let bytes: [u8; 32] = secret
        .get(..32)
        .ok_or_else(|| format!("expected at least 32 bytes of ed25519 secret, got {}", secret.len()))?
        .try_into()
        .expect("slice is exactly 32 bytes");
    Ok(SigningKey::from_bytes(&bytes))
}

/// Minimal base58 encoder (Bitcoin alphabet), so address display doesn't
/// depend on a dedicated `bs58` crate for what is otherwise a single
/// function's worth of use.
fn bs58_encode(bytes: &[u8]) -> String {
    const ALPHABET: &[u8] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
    let mut digits: Vec<u8> = vec![0];
    for &byte in bytes {
        let mut carry = byte as u32;
        for digit in digits.iter_mut() {
            carry += (*digit as u32) << 8;
            *digit = (carry % 58) as u8;
            carry /= 58;
        }
        while carry > 0 {
            digits.push((carry % 58) as u8);
            carry /= 58;
        }
    }
    let leading_zeros = bytes.iter().take_while(|&&b| b == 0).count();
    let mut out: Vec<u8> = std::iter::repeat(ALPHABET[0])
        .take(leading_zeros)
        .collect();
    out.extend(digits.iter().rev().map(|&d| ALPHABET[d as usize]));
    String::from_utf8(out).expect("alphabet is ASCII")
}

/// A single wallet entry as persisted in the encrypted vault blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletRecord {
    pub name: String,
    pub address: String,
    pub wallet_type: WalletType,
    /// base64 of the AES-256-GCM ciphertext for this wallet's secret key,
    /// encrypted under the vault's derived key.
    pub encrypted_secret: String,
}

/// A wallet unlocked in memory. The raw secret is zeroed on drop so it never
/// outlives the scope that needed it — `Vault::lock` drops every one of
/// these explicitly rather than waiting on scope exit.
pub struct UnlockedWallet {
    pub name: String,
    pub address: String,
    pub wallet_type: WalletType,
    secret: Vec<u8>,
}

impl UnlockedWallet {
    pub fn new(name: String, address: String, wallet_type: WalletType, secret: Vec<u8>) -> Self {
        Self {
            name,
            address,
            wallet_type,
            secret,
        }
    }

    /// Exposes the secret only to the caller signing a transaction. Callers
    /// must not persist or log this value.
    pub fn secret_bytes(&self) -> &[u8] {
        &self.secret
    }
}

impl Drop for UnlockedWallet {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

impl std::fmt::Debug for UnlockedWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnlockedWallet")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("wallet_type", &self.wallet_type)
            .field("secret", &"<redacted>")
            .finish()
    }
}
